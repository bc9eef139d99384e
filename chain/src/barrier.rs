use {
    syncval_core::{vk, Field, Func, Location, ResourceId, Struct, SyncScope},
    syncval_resource::{BufferRange, ImageSubresourceRange},
};

/// What a barrier applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BarrierKind {
    /// Global memory barrier.
    Memory,

    /// Buffer memory barrier.
    Buffer {
        /// Buffer.
        resource: ResourceId,

        /// Byte range.
        range: BufferRange,
    },

    /// Image memory barrier.
    Image {
        /// Image.
        resource: ResourceId,

        /// Subresources.
        range: ImageSubresourceRange,

        /// Layout the subresources are declared to be in.
        old_layout: vk::ImageLayout,

        /// Layout after the barrier.
        new_layout: vk::ImageLayout,
    },
}

/// Single barrier as declared by the application.
///
/// `src.queue_family` and `dst.queue_family` carry the
/// source and destination queue family indices of the barrier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Barrier {
    /// First synchronization scope.
    pub src: SyncScope,

    /// Second synchronization scope.
    pub dst: SyncScope,

    /// Target.
    pub kind: BarrierKind,
}

impl Barrier {
    /// Global memory barrier.
    pub fn memory(src: SyncScope, dst: SyncScope) -> Self {
        Barrier {
            src,
            dst,
            kind: BarrierKind::Memory,
        }
    }

    /// Buffer memory barrier.
    pub fn buffer(src: SyncScope, dst: SyncScope, resource: ResourceId, range: BufferRange) -> Self {
        Barrier {
            src,
            dst,
            kind: BarrierKind::Buffer { resource, range },
        }
    }

    /// Image memory barrier.
    pub fn image(
        src: SyncScope,
        dst: SyncScope,
        resource: ResourceId,
        range: ImageSubresourceRange,
        old_layout: vk::ImageLayout,
        new_layout: vk::ImageLayout,
    ) -> Self {
        Barrier {
            src,
            dst,
            kind: BarrierKind::Image {
                resource,
                range,
                old_layout,
                new_layout,
            },
        }
    }

    /// Barrier with queue family indices set.
    pub fn with_families(mut self, src_family: u32, dst_family: u32) -> Self {
        self.src.queue_family = src_family;
        self.dst.queue_family = dst_family;
        self
    }

    /// Resource the barrier targets, `None` for global barriers.
    pub fn resource(&self) -> Option<ResourceId> {
        match self.kind {
            BarrierKind::Memory => None,
            BarrierKind::Buffer { resource, .. } | BarrierKind::Image { resource, .. } => {
                Some(resource)
            }
        }
    }

    fn member(&self, sync2: bool) -> (Struct, Field) {
        match (self.kind, sync2) {
            (BarrierKind::Memory, false) => (Struct::MemoryBarrier, Field::PMemoryBarriers),
            (BarrierKind::Memory, true) => (Struct::MemoryBarrier2, Field::PMemoryBarriers),
            (BarrierKind::Buffer { .. }, false) => {
                (Struct::BufferMemoryBarrier, Field::PBufferMemoryBarriers)
            }
            (BarrierKind::Buffer { .. }, true) => {
                (Struct::BufferMemoryBarrier2, Field::PBufferMemoryBarriers)
            }
            (BarrierKind::Image { .. }, false) => {
                (Struct::ImageMemoryBarrier, Field::PImageMemoryBarriers)
            }
            (BarrierKind::Image { .. }, true) => {
                (Struct::ImageMemoryBarrier2, Field::PImageMemoryBarriers)
            }
        }
    }
}

/// Barriers declared together by one command or one subpass dependency.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dependency {
    /// Entry point declaring the barriers.
    pub function: Func,

    /// Index into `pDependencies` of the render pass, for subpass dependencies.
    pub subpass_dependency: Option<u32>,

    /// Barriers in declaration order.
    pub barriers: Vec<Barrier>,
}

impl Dependency {
    /// Dependency declared by a command.
    pub fn new(function: Func) -> Self {
        Dependency {
            function,
            subpass_dependency: None,
            barriers: Vec::new(),
        }
    }

    /// Dependency declared by `pDependencies[index]` of a render pass.
    pub fn subpass(function: Func, index: u32) -> Self {
        Dependency {
            function,
            subpass_dependency: Some(index),
            barriers: Vec::new(),
        }
    }

    /// Add barrier.
    pub fn with_barrier(mut self, barrier: Barrier) -> Self {
        self.barriers.push(barrier);
        self
    }

    /// Add barrier.
    pub fn push(&mut self, barrier: Barrier) {
        self.barriers.push(barrier);
    }

    /// Check if stage masks are parameters of the command
    /// shared by all its barriers.
    pub fn shares_stage_masks(&self) -> bool {
        self.subpass_dependency.is_none() && !self.function.is_sync2()
    }

    /// Location of a parameter of the command itself.
    pub fn call_location(&self, field: Field) -> Location {
        Location::new(self.function).with_field(field)
    }

    /// Location of each barrier structure, in declaration order.
    pub fn locations(&self) -> Vec<Location> {
        if let Some(index) = self.subpass_dependency {
            let structure = match self.function {
                Func::CreateRenderPass2 | Func::CmdBeginRenderPass2 | Func::CmdNextSubpass2
                | Func::CmdEndRenderPass2 => Struct::SubpassDependency2,
                _ => Struct::SubpassDependency,
            };
            let location = Location::new(self.function)
                .with_struct(structure)
                .with_parent(Field::PDependencies, index);
            return vec![location; self.barriers.len()];
        }

        let sync2 = self.function.is_sync2();
        let mut counts = [0u32; 3];
        self.barriers
            .iter()
            .map(|barrier| {
                let (structure, parent) = barrier.member(sync2);
                let slot = match barrier.kind {
                    BarrierKind::Memory => 0,
                    BarrierKind::Buffer { .. } => 1,
                    BarrierKind::Image { .. } => 2,
                };
                let index = counts[slot];
                counts[slot] += 1;
                Location::new(self.function)
                    .with_struct(structure)
                    .with_parent(parent, index)
            })
            .collect()
    }
}
