use {
    crate::{
        barrier::{Barrier, BarrierKind, Dependency},
        transfer::{check_transfer, ownership_role},
    },
    smallvec::SmallVec,
    syncval_catalog::{ImageError, SubmitError, Violation},
    syncval_core::{
        access, stage, stage_feature,
        vk::{self, PipelineStageFlags2 as Stages},
        AccessScope, EngineFault, Field, Location, QueueId, ResourceId, SyncScope, Tag,
    },
    syncval_resource::{
        BarrierOp, BarrierTarget, Classifier, Hazard, LayoutTransition, Origin, Ownership,
        Registry,
    },
    thread_profiler::profile_scope,
};

/// Side of a dependency a stage mask belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageSide {
    /// First synchronization scope.
    Src,

    /// Second synchronization scope.
    Dst,
}

/// Where and when a dependency executes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BarrierContext {
    /// Queue executing the barriers.
    pub queue: QueueId,

    /// Family of the recording command pool, if known.
    pub family: Option<u32>,

    /// Tag of the command.
    pub tag: Tag,

    /// Command is recorded inside a render pass instance.
    pub in_render_pass: bool,

    /// Only accesses before this tag on `queue` are in the first scope.
    pub before: Option<Tag>,

    /// Command buffer the barriers come from.
    pub origin: Origin,
}

impl BarrierContext {
    /// Context of a command outside of render passes.
    pub fn new(queue: QueueId, family: Option<u32>, tag: Tag) -> Self {
        BarrierContext {
            queue,
            family,
            tag,
            in_render_pass: false,
            before: None,
            origin: Origin::default(),
        }
    }
}

/// Findings and ordering edges of one dependency.
#[derive(Clone, Debug, Default)]
pub struct Analysis {
    /// Structural findings.
    pub hazards: Vec<Hazard>,

    /// One edge per barrier, in declaration order.
    pub edges: Vec<BarrierOp>,
}

/// Validates and resolves barriers against the device capabilities.
#[derive(Clone, Copy, Debug)]
pub struct Analyzer<'a> {
    classifier: &'a Classifier,
    registry: &'a Registry,
}

impl<'a> Analyzer<'a> {
    /// Create analyzer.
    pub fn new(classifier: &'a Classifier, registry: &'a Registry) -> Self {
        Analyzer {
            classifier,
            registry,
        }
    }

    /// Validate every barrier of the dependency and resolve it to an ordering edge.
    /// Malformed barriers are still resolved.
    pub fn analyze(
        &self,
        dependency: &Dependency,
        context: &BarrierContext,
    ) -> Result<Analysis, EngineFault> {
        profile_scope!("analyze");

        let hazards = self.validate(dependency, context)?;
        let edges = dependency
            .barriers
            .iter()
            .zip(dependency.locations())
            .map(|(barrier, location)| self.resolve(barrier, location, context))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Analysis { hazards, edges })
    }

    /// Structural findings of the dependency.
    pub fn validate(
        &self,
        dependency: &Dependency,
        context: &BarrierContext,
    ) -> Result<Vec<Hazard>, EngineFault> {
        let mut hazards = Vec::new();
        let shared = dependency.shares_stage_masks();

        if shared {
            let mut seen: SmallVec<[(Stages, Stages); 2]> = SmallVec::new();
            for barrier in &dependency.barriers {
                let masks = (barrier.src.stages, barrier.dst.stages);
                if seen.contains(&masks) {
                    continue;
                }
                seen.push(masks);
                hazards.extend(self.validate_stage_mask(
                    masks.0,
                    StageSide::Src,
                    dependency.call_location(Field::SrcStageMask),
                    context.family,
                )?);
                hazards.extend(self.validate_stage_mask(
                    masks.1,
                    StageSide::Dst,
                    dependency.call_location(Field::DstStageMask),
                    context.family,
                )?);
            }
        }

        for (barrier, location) in dependency.barriers.iter().zip(dependency.locations()) {
            if !shared {
                hazards.extend(self.validate_stage_mask(
                    barrier.src.stages,
                    StageSide::Src,
                    location.with_field(Field::SrcStageMask),
                    context.family,
                )?);
                hazards.extend(self.validate_stage_mask(
                    barrier.dst.stages,
                    StageSide::Dst,
                    location.with_field(Field::DstStageMask),
                    context.family,
                )?);
            }
            hazards.extend(self.validate_access(
                &barrier.src,
                location.with_field(Field::SrcAccessMask),
                context.family,
            )?);
            hazards.extend(self.validate_access(
                &barrier.dst,
                location.with_field(Field::DstAccessMask),
                context.family,
            )?);

            if let Some(resource) = barrier.resource() {
                let info = self.registry.info(resource)?;
                if let Some(error) = check_transfer(
                    barrier.src.queue_family,
                    barrier.dst.queue_family,
                    info.sharing(),
                    self.classifier.capabilities(),
                ) {
                    hazards.push(self.classifier.structural(
                        Violation::QueueTransfer(error),
                        location.with_field(Field::SrcQueueFamilyIndex),
                        Some(resource),
                    ));
                }
            }

            if let BarrierKind::Image {
                resource,
                old_layout,
                new_layout,
                ..
            } = barrier.kind
            {
                if context.in_render_pass && old_layout != new_layout {
                    hazards.push(self.classifier.structural(
                        Violation::Image(ImageError::RenderPassLayoutChange),
                        location.with_field(Field::OldLayout),
                        Some(resource),
                    ));
                }
            }
        }

        Ok(hazards)
    }

    /// Findings about a single stage mask.
    ///
    /// The `NONE` stage is illegal in first scopes of legacy entry points,
    /// and in second scopes too unless `synchronization2` is enabled.
    pub fn validate_stage_mask(
        &self,
        stages: Stages,
        side: StageSide,
        location: Location,
        family: Option<u32>,
    ) -> Result<Vec<Hazard>, EngineFault> {
        let capabilities = self.classifier.capabilities();
        let mut hazards = Vec::new();

        if stages.is_empty() {
            if !location.is_sync2() && (side == StageSide::Src || !capabilities.synchronization2())
            {
                hazards.push(self.classifier.structural(
                    Violation::StageFeature(Stages::NONE),
                    location,
                    None,
                ));
            }
            return Ok(hazards);
        }

        for bit in stage::single_stages(stages) {
            match stage_feature(bit) {
                Some((feature, _)) if !capabilities.enabled(feature) => {
                    hazards.push(self.classifier.structural(
                        Violation::StageFeature(bit),
                        location,
                        None,
                    ));
                }
                _ => {}
            }
        }

        if let Some(family) = family {
            hazards.extend(self.validate_queue_capability(stages, location, family)?);
        }

        Ok(hazards)
    }

    /// Finding about stages the queue family can't execute.
    pub fn validate_queue_capability(
        &self,
        stages: Stages,
        location: Location,
        family: u32,
    ) -> Result<Option<Hazard>, EngineFault> {
        let flags = self.classifier.capabilities().family_flags(family)?;
        let unsupported = stages & !stage::queue_allowed_stages(flags);
        if unsupported.is_empty() {
            Ok(None)
        } else {
            Ok(Some(self.classifier.structural(
                Violation::QueueCapability(unsupported),
                location,
                None,
            )))
        }
    }

    /// Findings about access bits no stage of the scope performs.
    pub fn validate_access(
        &self,
        scope: &SyncScope,
        location: Location,
        family: Option<u32>,
    ) -> Result<Vec<Hazard>, EngineFault> {
        let stages = stage::access_stages(scope.stages, self.supported(family)?);
        let unsupported = access::unsupported_bits(scope.access, stages);
        Ok(access::single_accesses(unsupported)
            .map(|bit| {
                self.classifier
                    .structural(Violation::AccessStage(bit), location, None)
            })
            .collect())
    }

    /// Finding about the host stage where only device stages are allowed.
    pub fn validate_host_stage(&self, stages: Stages, location: Location) -> Option<Hazard> {
        if stages.contains(Stages::HOST) {
            Some(self.classifier.structural(
                Violation::Submit(SubmitError::HostStageMask),
                location,
                None,
            ))
        } else {
            None
        }
    }

    fn supported(&self, family: Option<u32>) -> Result<Stages, EngineFault> {
        let capabilities = self.classifier.capabilities();
        match family {
            Some(family) => capabilities.supported_stages(family),
            None => Ok(capabilities.device_stages()),
        }
    }

    fn ownership(
        &self,
        barrier: &Barrier,
        resource: ResourceId,
        family: Option<u32>,
    ) -> Result<Ownership, EngineFault> {
        let info = self.registry.info(resource)?;
        let capabilities = self.classifier.capabilities();
        let (src_family, dst_family) = (barrier.src.queue_family, barrier.dst.queue_family);
        if check_transfer(src_family, dst_family, info.sharing(), capabilities).is_some() {
            return Ok(Ownership::None);
        }
        Ok(ownership_role(
            src_family,
            dst_family,
            info.sharing(),
            family,
            capabilities,
        ))
    }

    /// Resolve barrier declared at `location` to an ordering edge.
    pub fn resolve(
        &self,
        barrier: &Barrier,
        location: Location,
        context: &BarrierContext,
    ) -> Result<BarrierOp, EngineFault> {
        let supported = self.supported(context.family)?;

        let (target, layout, ownership, location) = match barrier.kind {
            BarrierKind::Memory => (BarrierTarget::Global, None, Ownership::None, location),
            BarrierKind::Buffer { resource, range } => (
                BarrierTarget::Resource {
                    resource,
                    range: range.into(),
                },
                None,
                self.ownership(barrier, resource, context.family)?,
                location,
            ),
            BarrierKind::Image {
                resource,
                range,
                old_layout,
                new_layout,
            } => (
                BarrierTarget::Resource {
                    resource,
                    range: range.into(),
                },
                Some(LayoutTransition {
                    old: old_layout,
                    new: new_layout,
                }),
                self.ownership(barrier, resource, context.family)?,
                location.with_field(Field::OldLayout),
            ),
        };

        let op = BarrierOp {
            target,
            src_exec: stage::src_execution(barrier.src.stages, supported),
            src_access: AccessScope::new(
                stage::access_stages(barrier.src.stages, supported),
                barrier.src.access,
            ),
            dst_exec: stage::dst_execution(barrier.dst.stages, supported),
            dst_access: AccessScope::new(
                stage::access_stages(barrier.dst.stages, supported),
                barrier.dst.access,
            ),
            layout,
            ownership,
            tag: context.tag,
            queue: context.queue,
            family: context.family.unwrap_or(vk::QUEUE_FAMILY_IGNORED),
            before: context.before,
            origin: Origin {
                location: Some(location),
                ..context.origin
            },
        };
        log::debug!(
            "Resolved barrier at {}: {:?} -> {:?}, {:?}",
            location,
            op.src_exec,
            op.dst_exec,
            op.ownership
        );
        Ok(op)
    }
}
