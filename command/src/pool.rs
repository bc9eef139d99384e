//! Command pools.

use {
    crate::buffer::{CommandBuffer, Level},
    fnv::FnvHashSet,
    syncval_core::{CommandBufferId, CommandPoolId},
    syncval_resource::Tracker,
};

/// Command pool of a queue family.
/// Knows command buffers allocated from it.
#[derive(Clone, Debug)]
pub struct CommandPool {
    id: CommandPoolId,
    family: u32,
    individual_reset: bool,
    buffers: FnvHashSet<CommandBufferId>,
}

impl CommandPool {
    /// Create command pool associated with the family.
    /// Command buffers allocated from the pool could be submitted to the queues of the family.
    pub fn new(id: CommandPoolId, family: u32, individual_reset: bool) -> Self {
        CommandPool {
            id,
            family,
            individual_reset,
            buffers: FnvHashSet::default(),
        }
    }

    /// Id of the pool.
    pub fn id(&self) -> CommandPoolId {
        self.id
    }

    /// Queue family of the pool.
    pub fn family(&self) -> u32 {
        self.family
    }

    /// Check if buffers could be reset one by one.
    pub fn individual_reset(&self) -> bool {
        self.individual_reset
    }

    /// Allocate command buffer recording into `tracker`.
    pub fn allocate(&mut self, id: CommandBufferId, level: Level, tracker: Tracker) -> CommandBuffer {
        self.buffers.insert(id);
        CommandBuffer::new(id, self.id, self.family, level, self.individual_reset, tracker)
    }

    /// Free command buffer.
    /// Returns `false` if it wasn't allocated from this pool.
    pub fn free(&mut self, id: CommandBufferId) -> bool {
        self.buffers.remove(&id)
    }

    /// Check if the command buffer was allocated from this pool.
    pub fn owns(&self, id: CommandBufferId) -> bool {
        self.buffers.contains(&id)
    }

    /// Command buffers allocated from this pool, in id order.
    /// Resetting the pool resets every one of them.
    pub fn buffers(&self) -> Vec<CommandBufferId> {
        let mut buffers: Vec<_> = self.buffers.iter().cloned().collect();
        buffers.sort();
        buffers
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        std::sync::Arc,
        syncval_catalog::Catalog,
        syncval_core::{vk::QueueFlags, CapabilityContext, DeviceCapabilities},
        syncval_resource::{Classifier, Registry, TrackerMode},
    };

    fn tracker() -> Tracker {
        Tracker::new(
            Arc::new(Registry::new(1)),
            Classifier::new(
                Arc::new(Catalog::new()),
                Arc::new(CapabilityContext::new(
                    DeviceCapabilities::empty(),
                    vec![QueueFlags::GRAPHICS],
                )),
                false,
            ),
            TrackerMode::Recording,
            1,
        )
    }

    #[test]
    fn allocation_is_tracked() {
        let mut pool = CommandPool::new(CommandPoolId(3), 0, false);
        let buffer = pool.allocate(CommandBufferId(7), Level::Primary, tracker());
        pool.allocate(CommandBufferId(5), Level::Secondary, tracker());
        assert_eq!(buffer.pool(), CommandPoolId(3));
        assert_eq!(pool.buffers(), vec![CommandBufferId(5), CommandBufferId(7)]);
        assert!(pool.free(CommandBufferId(7)));
        assert!(!pool.free(CommandBufferId(7)));
        assert!(!pool.owns(CommandBufferId(7)));
    }

    #[test]
    fn individual_reset_follows_pool() {
        let mut pool = CommandPool::new(CommandPoolId(1), 0, false);
        let mut buffer = pool.allocate(CommandBufferId(1), Level::Primary, tracker());
        assert!(buffer.reset().is_err());
        buffer.begin(Default::default()).unwrap();
        buffer.end().unwrap();
        assert!(buffer.begin(Default::default()).is_err());
        buffer.mark_reset();
        assert!(buffer.begin(Default::default()).is_ok());
    }
}
