use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde-1", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name(pub u64);

        impl $name {
            /// Get raw value of the id.
            pub fn index(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", $prefix, self.0)
            }
        }
    };
}

define_id! {
    /// Handle of a buffer or image known to the validator.
    /// Owned by the application, the validator only references it.
    ResourceId, "resource"
}

define_id! {
    /// Device memory allocation resources are bound to.
    MemoryId, "memory"
}

define_id! {
    /// Command buffer handle.
    CommandBufferId, "cmd"
}

define_id! {
    /// Command pool handle.
    CommandPoolId, "pool"
}

define_id! {
    /// Binary semaphore handle.
    SemaphoreId, "semaphore"
}

define_id! {
    /// Event handle.
    EventId, "event"
}

define_id! {
    /// Fence handle.
    FenceId, "fence"
}

define_id! {
    /// Render pass handle.
    RenderPassId, "render-pass"
}

/// Queue handle.
///
/// Two values are reserved for pseudo-queues:
/// the host and the command buffer being recorded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde-1", derive(serde::Serialize, serde::Deserialize))]
pub struct QueueId(pub u32);

impl QueueId {
    /// Host pseudo-queue. Mapped memory accesses happen here.
    pub const HOST: QueueId = QueueId(u32::max_value());

    /// Pseudo-queue of a command buffer while it is recorded.
    pub const RECORDING: QueueId = QueueId(u32::max_value() - 1);

    /// Get raw value of the id.
    pub fn index(&self) -> u32 {
        self.0
    }

    /// Check if this is the host pseudo-queue.
    pub fn is_host(&self) -> bool {
        *self == Self::HOST
    }
}

impl fmt::Display for QueueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            QueueId::HOST => write!(f, "host"),
            QueueId::RECORDING => write!(f, "recording"),
            QueueId(index) => write!(f, "queue#{}", index),
        }
    }
}
