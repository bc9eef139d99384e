use {
    crate::range::SubresourceRange,
    syncval_core::{
        vk::{self, PipelineStageFlags2 as Stages},
        AccessScope, CommandBufferId, CommandPoolId, Location, QueueId, ResourceId, SyncScope,
        Tag,
    },
};

/// Command buffer, pool and call site an access came from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Origin {
    /// Recording command buffer.
    pub command_buffer: Option<CommandBufferId>,

    /// Pool the command buffer was allocated from.
    pub pool: Option<CommandPoolId>,

    /// Call site.
    pub location: Option<Location>,
}

impl Origin {
    /// Origin with only a call site.
    pub fn at(location: Location) -> Self {
        Origin {
            location: Some(location),
            ..Origin::default()
        }
    }

    /// Attribute to a command buffer of a pool.
    pub fn with_command_buffer(mut self, command_buffer: CommandBufferId, pool: CommandPoolId) -> Self {
        self.command_buffer = Some(command_buffer);
        self.pool = Some(pool);
        self
    }
}

/// Single access performed by a command or by the host.
///
/// `scope.queue_family` is the family of the performing queue
/// or `vk::QUEUE_FAMILY_IGNORED` when unknown.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AccessInfo {
    /// Stages and access types. Stages must be concrete.
    pub scope: SyncScope,

    /// When it happened.
    pub tag: Tag,

    /// Queue it happened on.
    pub queue: QueueId,

    /// Where it came from.
    pub origin: Origin,
}

impl AccessInfo {
    /// Check if the access writes.
    pub fn is_write(&self) -> bool {
        self.scope.is_write()
    }
}

/// What a barrier applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BarrierTarget {
    /// Every resource.
    Global,

    /// Range of one resource.
    Resource {
        /// Resource.
        resource: ResourceId,

        /// Range.
        range: SubresourceRange,
    },
}

/// Image layout transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LayoutTransition {
    /// Layout the range is expected to be in. `UNDEFINED` matches anything.
    pub old: vk::ImageLayout,

    /// Layout after the transition.
    pub new: vk::ImageLayout,
}

/// Role of a barrier in a queue family ownership transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Ownership {
    /// Not a transfer.
    None,

    /// Release half, executed on the source family.
    Release {
        /// Source family.
        src_family: u32,

        /// Destination family.
        dst_family: u32,
    },

    /// Acquire half, executed on the destination family.
    Acquire {
        /// Source family.
        src_family: u32,

        /// Destination family.
        dst_family: u32,
    },
}

/// Barrier in terms of resolved scopes.
///
/// Execution scopes are concrete and already extended
/// to logically earlier and later stages.
/// Access scopes use exact stages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BarrierOp {
    /// Affected resource range.
    pub target: BarrierTarget,

    /// First execution scope.
    pub src_exec: Stages,

    /// First access scope.
    pub src_access: AccessScope,

    /// Second execution scope.
    pub dst_exec: Stages,

    /// Second access scope.
    pub dst_access: AccessScope,

    /// Layout transition of an image barrier.
    pub layout: Option<LayoutTransition>,

    /// Ownership transfer role.
    pub ownership: Ownership,

    /// When the barrier executes.
    pub tag: Tag,

    /// Queue executing the barrier.
    pub queue: QueueId,

    /// Family of that queue.
    pub family: u32,

    /// Only accesses ordered on `queue` before this tag are in the first scope.
    /// Set by event waits to the tag of the matching set.
    pub before: Option<Tag>,

    /// Where it came from.
    pub origin: Origin,
}

/// Execution and memory dependency between two queues, or a queue and the host.
///
/// Everything `src_queue` did up to `src_tag` becomes ordered before
/// `dst_exec` on `dst_queue`, and available to `dst_memory`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueueSync {
    /// Signalling side.
    pub src_queue: QueueId,

    /// Last tag covered on the signalling side.
    pub src_tag: Tag,

    /// Waiting side.
    pub dst_queue: QueueId,

    /// Tag of the wait.
    pub dst_tag: Tag,

    /// Stages of `dst_queue` ordered after the signal.
    pub dst_exec: Stages,

    /// Accesses of `dst_queue` the signalled writes are visible to.
    pub dst_memory: AccessScope,
}
