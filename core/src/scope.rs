use {
    crate::{
        access,
        single_bits,
        vk::{self, AccessFlags2 as Access, PipelineStageFlags2 as Stages},
    },
    smallvec::SmallVec,
    std::fmt,
};

/// Stage, access and queue family triple.
/// Describes one access or one side of a dependency.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SyncScope {
    /// Pipeline stages.
    pub stages: Stages,

    /// Memory access types.
    pub access: Access,

    /// Queue family index or `vk::QUEUE_FAMILY_IGNORED`.
    pub queue_family: u32,
}

impl SyncScope {
    /// Create scope that ignores queue families.
    pub fn new(stages: Stages, access: Access) -> Self {
        SyncScope {
            stages,
            access,
            queue_family: vk::QUEUE_FAMILY_IGNORED,
        }
    }

    /// Scope with queue family set.
    pub fn with_family(mut self, queue_family: u32) -> Self {
        self.queue_family = queue_family;
        self
    }

    /// Check if scope contains any write access.
    pub fn is_write(&self) -> bool {
        access::is_write(self.access)
    }

    /// Check if scope contains no memory access, only execution.
    pub fn is_execution_only(&self) -> bool {
        self.access.is_empty()
    }

    /// Decompose into single stage and single access pairs.
    ///
    /// Each access bit pairs with the stages of this scope able to perform it.
    /// An access bit no stage supports pairs with every stage.
    /// Stage bits must already be concrete.
    pub fn usages(&self) -> SmallVec<[Usage; 4]> {
        let mut usages = SmallVec::new();
        for access_bit in single_bits(access::expand(self.access).as_raw()).map(Access::from_raw) {
            let supported = access::supported_stages(access_bit);
            let stages = if supported.intersects(self.stages) {
                supported & self.stages
            } else {
                self.stages
            };
            for stage in single_bits(stages.as_raw()).map(Stages::from_raw) {
                usages.push(Usage {
                    stage,
                    access: access_bit,
                });
            }
        }
        usages
    }
}

/// Single stage bit paired with single access bit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Usage {
    /// Stage performing the access.
    pub stage: Stages,

    /// Access performed.
    pub access: Access,
}

impl Usage {
    /// Create usage.
    pub fn new(stage: Stages, access: Access) -> Self {
        Usage { stage, access }
    }

    /// Check if usage writes memory.
    pub fn is_write(&self) -> bool {
        self.access.intersects(access::write_bits())
    }
}

impl fmt::Display for Usage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}:{:?}", self.stage, self.access)
    }
}

/// Memory scope as a union of stage by access rectangles.
///
/// Two barriers with disjoint scopes never combine into pairs
/// that neither of them declared.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct AccessScope {
    rects: SmallVec<[(Stages, Access); 2]>,
}

impl AccessScope {
    /// Scope that contains nothing.
    pub fn empty() -> Self {
        AccessScope::default()
    }

    /// Scope of every access at concrete `stages`.
    pub fn all_at(stages: Stages) -> Self {
        AccessScope::new(stages, access::read_bits() | access::write_bits())
    }

    /// Single rectangle scope. `access` is expanded.
    pub fn new(stages: Stages, access: Access) -> Self {
        let mut scope = AccessScope::empty();
        scope.add(stages, access);
        scope
    }

    /// Check if scope is empty.
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Check if scope contains the usage.
    pub fn contains(&self, usage: Usage) -> bool {
        self.rects
            .iter()
            .any(|&(stages, access)| stages.contains(usage.stage) && access.contains(usage.access))
    }

    /// Add a rectangle to the union.
    pub fn add(&mut self, stages: Stages, access: Access) {
        let access = access::expand(access);
        if stages.is_empty() || access.is_empty() {
            return;
        }
        if self
            .rects
            .iter()
            .any(|&(s, a)| s.contains(stages) && a.contains(access))
        {
            return;
        }
        self.rects
            .retain(|&mut (s, a)| !(stages.contains(s) && access.contains(a)));
        if let Some(rect) = self.rects.iter_mut().find(|rect| rect.0 == stages) {
            rect.1 |= access;
        } else if let Some(rect) = self.rects.iter_mut().find(|rect| rect.1 == access) {
            rect.0 |= stages;
        } else {
            self.rects.push((stages, access));
        }
    }

    /// Extend with every rectangle of `other`.
    pub fn union(&mut self, other: &AccessScope) {
        for &(stages, access) in &other.rects {
            self.add(stages, access);
        }
    }

    /// Rectangles of the union.
    pub fn rects(&self) -> &[(Stages, Access)] {
        &self.rects
    }
}
