use {
    crate::op::AccessInfo,
    std::{fmt, ops::Range, sync::Arc},
    syncval_catalog::{Catalog, RuleId, Violation},
    syncval_core::{
        CapabilityContext, Field, Func, Location, QueueId, ResourceId, Struct, SyncScope,
    },
};

/// Kind of finding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HazardKind {
    /// Read not ordered after a prior write.
    ReadAfterWrite,

    /// Write not ordered after a prior read.
    WriteAfterRead,

    /// Write not ordered after a prior write.
    WriteAfterWrite,

    /// Layout transition expecting a layout the range isn't in.
    LayoutTransition,

    /// Queue family ownership transfer not completed.
    OwnershipTransfer,

    /// Barrier or submission that is malformed on its own.
    StructuralBarrierError,
}

/// Memory hazard found against one prior access, before classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Detected {
    pub kind: HazardKind,
    pub violation: Violation,
    pub prior: Option<AccessInfo>,
    pub uncovered: SyncScope,
}

/// Finding with its resolved rule identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hazard {
    /// Kind of finding.
    pub kind: HazardKind,

    /// Catalog key of the finding.
    pub violation: Violation,

    /// Rule identifier.
    pub rule: RuleId,

    /// Prior and incoming accesses happened on different queues.
    pub racing: bool,

    /// Call site the rule was resolved for.
    pub location: Location,

    /// Affected resource.
    pub resource: Option<ResourceId>,

    /// Affected range in the resource's linear index space.
    pub range: Option<Range<u64>>,

    /// Access or layout change conflicted with.
    pub prior: Option<AccessInfo>,

    /// Access, barrier or submission that conflicts.
    pub incoming: Option<AccessInfo>,

    /// Part of the incoming scope left unordered.
    pub uncovered: Option<SyncScope>,
}

impl Hazard {
    /// Check if `other` is the same finding on an adjacent range.
    fn extends(&self, other: &Hazard) -> bool {
        match (&self.range, &other.range) {
            (Some(range), Some(next)) => {
                range.end == next.start
                    && self.kind == other.kind
                    && self.rule == other.rule
                    && self.resource == other.resource
                    && self.prior == other.prior
                    && self.incoming == other.incoming
            }
            _ => false,
        }
    }
}

impl fmt::Display for Hazard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?} at {}", self.rule, self.kind, self.location)?;
        if let Some(resource) = self.resource {
            write!(f, " on {}", resource)?;
        }
        if let Some(ref range) = self.range {
            write!(f, " [{}..{})", range.start, range.end)?;
        }
        if let Some(ref prior) = self.prior {
            write!(f, ", prior {:?} {} on queue {}", prior.scope.access, prior.tag, prior.queue)?;
        }
        if let Some(ref uncovered) = self.uncovered {
            write!(f, ", unordered {:?} {:?}", uncovered.stages, uncovered.access)?;
        }
        Ok(())
    }
}

/// Merge adjacent ranges of the same finding.
pub(crate) fn coalesce(hazards: &mut Vec<Hazard>) {
    let mut merged: Vec<Hazard> = Vec::with_capacity(hazards.len());
    for hazard in hazards.drain(..) {
        if let Some(found) = merged.iter_mut().rev().find(|found| found.extends(&hazard)) {
            if let (Some(range), Some(next)) = (&mut found.range, &hazard.range) {
                range.end = next.end;
            }
            continue;
        }
        merged.push(hazard);
    }
    *hazards = merged;
}

/// Resolves findings to rule identifiers.
#[derive(Clone, Debug)]
pub struct Classifier {
    catalog: Arc<Catalog>,
    capabilities: Arc<CapabilityContext>,
    racing_rule_ids: bool,
}

impl Classifier {
    /// Create classifier.
    /// With `racing_rule_ids` cross-queue memory hazards get the racing identifiers.
    pub fn new(
        catalog: Arc<Catalog>,
        capabilities: Arc<CapabilityContext>,
        racing_rule_ids: bool,
    ) -> Self {
        Classifier {
            catalog,
            capabilities,
            racing_rule_ids,
        }
    }

    /// Device capabilities.
    pub fn capabilities(&self) -> &CapabilityContext {
        &self.capabilities
    }

    /// Diagnostics catalog.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Rule identifier of the violation at the call site.
    pub fn identify(&self, violation: Violation, location: &Location) -> RuleId {
        self.catalog
            .identify(violation, location, &self.capabilities)
    }

    /// Finding about a malformed barrier or submission.
    pub fn structural(
        &self,
        violation: Violation,
        location: Location,
        resource: Option<ResourceId>,
    ) -> Hazard {
        Hazard {
            kind: HazardKind::StructuralBarrierError,
            violation,
            rule: self.identify(violation, &location),
            racing: false,
            location,
            resource,
            range: None,
            prior: None,
            incoming: None,
            uncovered: None,
        }
    }

    pub(crate) fn classify(
        &self,
        detected: Detected,
        resource: ResourceId,
        range: Range<u64>,
        incoming: &AccessInfo,
    ) -> Hazard {
        let racing = detected.prior.map_or(false, |prior| {
            prior.queue != incoming.queue
                && prior.queue != QueueId::RECORDING
                && incoming.queue != QueueId::RECORDING
        });

        let violation = match detected.violation {
            Violation::Hazard(class) if racing && self.racing_rule_ids => {
                Violation::Hazard(class.racing())
            }
            violation => violation,
        };

        let location = incoming.origin.location.unwrap_or_else(|| match detected.kind {
            HazardKind::LayoutTransition => Location::new(Func::CmdPipelineBarrier2)
                .with_struct(Struct::ImageMemoryBarrier2)
                .with_field(Field::OldLayout),
            _ => Location::new(Func::QueueSubmit2),
        });

        let hazard = Hazard {
            kind: detected.kind,
            violation,
            rule: self.identify(violation, &location),
            racing,
            location,
            resource: Some(resource),
            range: Some(range),
            prior: detected.prior,
            incoming: Some(*incoming),
            uncovered: Some(detected.uncovered),
        };
        log::trace!("{}", hazard);
        hazard
    }
}
