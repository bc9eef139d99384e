use {
    crate::id::{
        CommandBufferId, CommandPoolId, EventId, FenceId, QueueId, RenderPassId, ResourceId,
        SemaphoreId,
    },
    failure::Fail,
    std::ops::Range,
};

/// Misuse of the validator by the interception layer.
///
/// Unlike hazards these are not findings about the application's command stream.
/// They never corrupt state of unrelated resources.
#[derive(Clone, Debug, PartialEq, Eq, Fail)]
pub enum EngineFault {
    /// Resource handle was never registered.
    #[fail(display = "Unknown resource {}", _0)]
    UnknownResource(ResourceId),

    /// Resource handle registered twice.
    #[fail(display = "Resource {} is already registered", _0)]
    DuplicateResource(ResourceId),

    /// Buffer range used with an image or the other way around.
    #[fail(display = "Range kind doesn't match resource {}", _0)]
    WrongResourceKind(ResourceId),

    /// Image range names aspects the image doesn't have.
    #[fail(display = "Aspects {:?} are not part of image {}", aspects, resource)]
    InvalidAspects {
        /// Image.
        resource: ResourceId,

        /// Aspects requested.
        aspects: crate::vk::ImageAspectFlags,
    },

    /// Offset plus size overflows.
    #[fail(display = "Range arithmetic overflow: offset {} size {}", offset, size)]
    RangeOverflow {
        /// Range start.
        offset: u64,

        /// Range size.
        size: u64,
    },

    /// Range exceeds resource extent.
    #[fail(display = "Range {:?} is out of bounds of resource {}", range, resource)]
    OutOfBounds {
        /// Resource.
        resource: ResourceId,

        /// Offending range.
        range: Range<u64>,
    },

    /// Capability context was not supplied.
    #[fail(display = "Capability context is missing")]
    MissingCapabilities,

    /// Queue was never registered.
    #[fail(display = "Unknown queue {}", _0)]
    UnknownQueue(QueueId),

    /// Queue family index exceeds family count.
    #[fail(display = "Unknown queue family {}", _0)]
    UnknownQueueFamily(u32),

    /// Command buffer was never allocated.
    #[fail(display = "Unknown command buffer {}", _0)]
    UnknownCommandBuffer(CommandBufferId),

    /// Command pool was never created.
    #[fail(display = "Unknown command pool {}", _0)]
    UnknownCommandPool(CommandPoolId),

    /// Render pass was never created.
    #[fail(display = "Unknown render pass {}", _0)]
    UnknownRenderPass(RenderPassId),

    /// Semaphore was never created.
    #[fail(display = "Unknown semaphore {}", _0)]
    UnknownSemaphore(SemaphoreId),

    /// Event was never created.
    #[fail(display = "Unknown event {}", _0)]
    UnknownEvent(EventId),

    /// Fence was never created.
    #[fail(display = "Unknown fence {}", _0)]
    UnknownFence(FenceId),

    /// Command buffer is in the wrong lifecycle state.
    #[fail(
        display = "Command buffer {} is {}, operation requires it to be {}",
        command_buffer, state, expected
    )]
    InvalidState {
        /// Command buffer.
        command_buffer: CommandBufferId,

        /// Current state.
        state: &'static str,

        /// State required.
        expected: &'static str,
    },

    /// Render pass command outside of a render pass or past the last subpass.
    #[fail(display = "Command buffer {}: {}", command_buffer, reason)]
    RenderPassState {
        /// Command buffer.
        command_buffer: CommandBufferId,

        /// What went wrong.
        reason: &'static str,
    },
}
