//! Rule tables.
//!
//! Each table lists entries in lookup order, the first match wins.

use {
    crate::rule::{Entry, Key},
    syncval_core::{Field, Func, Struct},
};

macro_rules! stage_mask_errors {
    ($sync2:literal, $legacy:literal, $timestamp:literal) => {
        &[
            Entry::new(
                Key::structure(Struct::BufferMemoryBarrier2).field(Field::DstStageMask),
                concat!("VUID-VkBufferMemoryBarrier2-dstStageMask-", $sync2),
            ),
            Entry::new(
                Key::structure(Struct::BufferMemoryBarrier2).field(Field::SrcStageMask),
                concat!("VUID-VkBufferMemoryBarrier2-srcStageMask-", $sync2),
            ),
            Entry::new(
                Key::func(Func::CmdPipelineBarrier).field(Field::DstStageMask),
                concat!("VUID-vkCmdPipelineBarrier-dstStageMask-", $legacy),
            ),
            Entry::new(
                Key::func(Func::CmdPipelineBarrier).field(Field::SrcStageMask),
                concat!("VUID-vkCmdPipelineBarrier-srcStageMask-", $legacy),
            ),
            Entry::new(
                Key::func(Func::CmdResetEvent2).field(Field::StageMask),
                concat!("VUID-vkCmdResetEvent2-stageMask-", $sync2),
            ),
            Entry::new(
                Key::func(Func::CmdResetEvent).field(Field::StageMask),
                concat!("VUID-vkCmdResetEvent-stageMask-", $legacy),
            ),
            Entry::new(
                Key::func(Func::CmdSetEvent).field(Field::StageMask),
                concat!("VUID-vkCmdSetEvent-stageMask-", $legacy),
            ),
            Entry::new(
                Key::func(Func::CmdWaitEvents).field(Field::DstStageMask),
                concat!("VUID-vkCmdWaitEvents-dstStageMask-", $legacy),
            ),
            Entry::new(
                Key::func(Func::CmdWaitEvents).field(Field::SrcStageMask),
                concat!("VUID-vkCmdWaitEvents-srcStageMask-", $legacy),
            ),
            Entry::new(
                Key::func(Func::CmdWriteTimestamp2).field(Field::Stage),
                concat!("VUID-vkCmdWriteTimestamp2-stage-", $sync2),
            ),
            Entry::new(
                Key::func(Func::CmdWriteTimestamp).field(Field::PipelineStage),
                concat!("VUID-vkCmdWriteTimestamp-", $timestamp),
            ),
            Entry::new(
                Key::structure(Struct::ImageMemoryBarrier2).field(Field::DstStageMask),
                concat!("VUID-VkImageMemoryBarrier2-dstStageMask-", $sync2),
            ),
            Entry::new(
                Key::structure(Struct::ImageMemoryBarrier2).field(Field::SrcStageMask),
                concat!("VUID-VkImageMemoryBarrier2-srcStageMask-", $sync2),
            ),
            Entry::new(
                Key::structure(Struct::MemoryBarrier2).field(Field::DstStageMask),
                concat!("VUID-VkMemoryBarrier2-dstStageMask-", $sync2),
            ),
            Entry::new(
                Key::structure(Struct::MemoryBarrier2).field(Field::SrcStageMask),
                concat!("VUID-VkMemoryBarrier2-srcStageMask-", $sync2),
            ),
            Entry::new(
                Key::structure(Struct::SemaphoreSubmitInfo).field(Field::StageMask),
                concat!("VUID-VkSemaphoreSubmitInfo-stageMask-", $sync2),
            ),
            Entry::new(
                Key::structure(Struct::SubmitInfo).field(Field::PWaitDstStageMask),
                concat!("VUID-VkSubmitInfo-pWaitDstStageMask-", $legacy),
            ),
            Entry::new(
                Key::structure(Struct::SubpassDependency).field(Field::SrcStageMask),
                concat!("VUID-VkSubpassDependency-srcStageMask-", $legacy),
            ),
            Entry::new(
                Key::structure(Struct::SubpassDependency).field(Field::DstStageMask),
                concat!("VUID-VkSubpassDependency-dstStageMask-", $legacy),
            ),
            Entry::new(
                Key::structure(Struct::SubpassDependency2).field(Field::SrcStageMask),
                concat!("VUID-VkSubpassDependency2-srcStageMask-", $legacy),
            ),
            Entry::new(
                Key::structure(Struct::SubpassDependency2).field(Field::DstStageMask),
                concat!("VUID-VkSubpassDependency2-dstStageMask-", $legacy),
            ),
        ]
    };
}

macro_rules! none_stage_errors {
    ($number:literal, $timestamp:literal) => {
        &[
            Entry::new(
                Key::func(Func::CmdPipelineBarrier).field(Field::SrcStageMask),
                concat!("VUID-vkCmdPipelineBarrier-srcStageMask-", $number),
            ),
            Entry::new(
                Key::func(Func::CmdPipelineBarrier).field(Field::DstStageMask),
                concat!("VUID-vkCmdPipelineBarrier-dstStageMask-", $number),
            ),
            Entry::new(
                Key::func(Func::CmdResetEvent).field(Field::StageMask),
                concat!("VUID-vkCmdResetEvent-stageMask-", $number),
            ),
            Entry::new(
                Key::func(Func::CmdSetEvent).field(Field::StageMask),
                concat!("VUID-vkCmdSetEvent-stageMask-", $number),
            ),
            Entry::new(
                Key::func(Func::CmdWaitEvents).field(Field::SrcStageMask),
                concat!("VUID-vkCmdWaitEvents-srcStageMask-", $number),
            ),
            Entry::new(
                Key::func(Func::CmdWaitEvents).field(Field::DstStageMask),
                concat!("VUID-vkCmdWaitEvents-dstStageMask-", $number),
            ),
            Entry::new(
                Key::func(Func::CmdWriteTimestamp).field(Field::PipelineStage),
                concat!("VUID-vkCmdWriteTimestamp-", $timestamp),
            ),
            Entry::new(
                Key::structure(Struct::SubmitInfo).field(Field::PWaitDstStageMask),
                concat!("VUID-VkSubmitInfo-pWaitDstStageMask-", $number),
            ),
            Entry::new(
                Key::structure(Struct::SubpassDependency).field(Field::SrcStageMask),
                concat!("VUID-VkSubpassDependency-srcStageMask-", $number),
            ),
            Entry::new(
                Key::structure(Struct::SubpassDependency).field(Field::DstStageMask),
                concat!("VUID-VkSubpassDependency-dstStageMask-", $number),
            ),
            Entry::new(
                Key::structure(Struct::SubpassDependency2).field(Field::SrcStageMask),
                concat!("VUID-VkSubpassDependency2-srcStageMask-", $number),
            ),
            Entry::new(
                Key::structure(Struct::SubpassDependency2).field(Field::DstStageMask),
                concat!("VUID-VkSubpassDependency2-dstStageMask-", $number),
            ),
        ]
    };
}

macro_rules! access_mask_errors {
    ($number:literal) => {
        &[
            Entry::new(
                Key::structure(Struct::MemoryBarrier2).field(Field::SrcAccessMask),
                concat!("VUID-VkMemoryBarrier2-srcAccessMask-", $number),
            ),
            Entry::new(
                Key::structure(Struct::MemoryBarrier2).field(Field::DstAccessMask),
                concat!("VUID-VkMemoryBarrier2-dstAccessMask-", $number),
            ),
            Entry::new(
                Key::structure(Struct::BufferMemoryBarrier2).field(Field::SrcAccessMask),
                concat!("VUID-VkBufferMemoryBarrier2-srcAccessMask-", $number),
            ),
            Entry::new(
                Key::structure(Struct::BufferMemoryBarrier2).field(Field::DstAccessMask),
                concat!("VUID-VkBufferMemoryBarrier2-dstAccessMask-", $number),
            ),
            Entry::new(
                Key::structure(Struct::ImageMemoryBarrier2).field(Field::SrcAccessMask),
                concat!("VUID-VkImageMemoryBarrier2-srcAccessMask-", $number),
            ),
            Entry::new(
                Key::structure(Struct::ImageMemoryBarrier2).field(Field::DstAccessMask),
                concat!("VUID-VkImageMemoryBarrier2-dstAccessMask-", $number),
            ),
        ]
    };
}

pub(crate) const CONDITIONAL_RENDERING: &[Entry] =
    stage_mask_errors!("03931", "04092", "pipelineStage-04077");
pub(crate) const FRAGMENT_DENSITY_PROCESS: &[Entry] =
    stage_mask_errors!("03932", "04093", "pipelineStage-04078");
pub(crate) const GEOMETRY_SHADER: &[Entry] =
    stage_mask_errors!("03929", "04090", "pipelineStage-04075");
pub(crate) const MESH_SHADER: &[Entry] =
    stage_mask_errors!("03934", "04095", "pipelineStage-04080");
pub(crate) const TASK_SHADER: &[Entry] =
    stage_mask_errors!("03935", "04096", "pipelineStage-04080");
pub(crate) const TESSELLATION_CONTROL_SHADER: &[Entry] =
    stage_mask_errors!("03930", "04091", "pipelineStage-04076");
pub(crate) const TESSELLATION_EVALUATION_SHADER: &[Entry] =
    stage_mask_errors!("03930", "04091", "pipelineStage-04076");
pub(crate) const TRANSFORM_FEEDBACK: &[Entry] =
    stage_mask_errors!("03933", "04094", "pipelineStage-04079");

/// `NONE` stage when `synchronization2` is enabled.
pub(crate) const NONE_WITH_SYNC2: &[Entry] = none_stage_errors!("03937", "synchronization2-06489");

/// `NONE` stage when `synchronization2` is disabled.
pub(crate) const NONE_WITHOUT_SYNC2: &[Entry] = none_stage_errors!("04996", "pipelineStage-06490");

/// Shading rate attachment stage, `attachmentFragmentShadingRate` only.
pub(crate) const SHADING_RATE_KHR: &[Entry] =
    stage_mask_errors!("07317", "07319", "fragmentShadingRate-07315");

/// Shading rate attachment stage, `VK_NV_shading_rate_image` enabled.
pub(crate) const SHADING_RATE_KHR_AND_NV: &[Entry] =
    stage_mask_errors!("07316", "07318", "shadingRateImage-07314");

pub(crate) const INDIRECT_COMMAND_READ: &[Entry] = access_mask_errors!("03900");
pub(crate) const INDEX_READ: &[Entry] = access_mask_errors!("03901");
pub(crate) const VERTEX_ATTRIBUTE_READ: &[Entry] = access_mask_errors!("03902");
pub(crate) const INPUT_ATTACHMENT_READ: &[Entry] = access_mask_errors!("03903");
pub(crate) const UNIFORM_READ: &[Entry] = access_mask_errors!("03904");
pub(crate) const SHADER_SAMPLED_READ: &[Entry] = access_mask_errors!("03905");
pub(crate) const SHADER_STORAGE_READ: &[Entry] = access_mask_errors!("03906");
pub(crate) const SHADER_STORAGE_WRITE: &[Entry] = access_mask_errors!("03907");
pub(crate) const SHADER_READ: &[Entry] = access_mask_errors!("03908");
pub(crate) const SHADER_WRITE: &[Entry] = access_mask_errors!("03909");
pub(crate) const COLOR_ATTACHMENT_READ: &[Entry] = access_mask_errors!("03910");
pub(crate) const COLOR_ATTACHMENT_WRITE: &[Entry] = access_mask_errors!("03911");
pub(crate) const DEPTH_STENCIL_ATTACHMENT_READ: &[Entry] = access_mask_errors!("03912");
pub(crate) const DEPTH_STENCIL_ATTACHMENT_WRITE: &[Entry] = access_mask_errors!("03913");
pub(crate) const TRANSFER_READ: &[Entry] = access_mask_errors!("03914");
pub(crate) const TRANSFER_WRITE: &[Entry] = access_mask_errors!("03915");
pub(crate) const HOST_READ: &[Entry] = access_mask_errors!("03916");
pub(crate) const HOST_WRITE: &[Entry] = access_mask_errors!("03917");
pub(crate) const CONDITIONAL_RENDERING_READ: &[Entry] = access_mask_errors!("03918");
pub(crate) const FRAGMENT_DENSITY_MAP_READ: &[Entry] = access_mask_errors!("03919");
pub(crate) const TRANSFORM_FEEDBACK_WRITE: &[Entry] = access_mask_errors!("03920");
pub(crate) const TRANSFORM_FEEDBACK_COUNTER_READ: &[Entry] = access_mask_errors!("04747");
pub(crate) const TRANSFORM_FEEDBACK_COUNTER_WRITE: &[Entry] = access_mask_errors!("03920");
pub(crate) const FRAGMENT_SHADING_RATE_ATTACHMENT_READ: &[Entry] = access_mask_errors!("03922");
pub(crate) const ACCELERATION_STRUCTURE_READ: &[Entry] = access_mask_errors!("03927");
pub(crate) const ACCELERATION_STRUCTURE_WRITE: &[Entry] = access_mask_errors!("03928");
pub(crate) const DESCRIPTOR_BUFFER_READ: &[Entry] = access_mask_errors!("08118");

/// Legacy entry points and render pass dependencies, for any access bit.
pub(crate) const FINE_SYNC_COMMON: &[Entry] = &[
    Entry::new(
        Key::func(Func::CmdPipelineBarrier).field(Field::SrcAccessMask),
        "VUID-vkCmdPipelineBarrier-srcAccessMask-02815",
    ),
    Entry::new(
        Key::func(Func::CmdPipelineBarrier).field(Field::DstAccessMask),
        "VUID-vkCmdPipelineBarrier-dstAccessMask-02816",
    ),
    Entry::new(
        Key::func(Func::CmdWaitEvents).field(Field::SrcAccessMask),
        "VUID-vkCmdWaitEvents-srcAccessMask-02815",
    ),
    Entry::new(
        Key::func(Func::CmdWaitEvents).field(Field::DstAccessMask),
        "VUID-vkCmdWaitEvents-dstAccessMask-02816",
    ),
    Entry::new(
        Key::structure(Struct::SubpassDependency).field(Field::SrcAccessMask),
        "VUID-VkSubpassDependency-srcAccessMask-00868",
    ),
    Entry::new(
        Key::structure(Struct::SubpassDependency).field(Field::DstAccessMask),
        "VUID-VkSubpassDependency-dstAccessMask-00869",
    ),
    Entry::new(
        Key::structure(Struct::SubpassDependency2).field(Field::SrcAccessMask),
        "VUID-VkSubpassDependency2-srcAccessMask-03088",
    ),
    Entry::new(
        Key::structure(Struct::SubpassDependency2).field(Field::DstAccessMask),
        "VUID-VkSubpassDependency2-dstAccessMask-03089",
    ),
];

pub(crate) const QUEUE_CAPABILITY: &[Entry] = &[
    Entry::new(
        Key::structure(Struct::SubmitInfo).field(Field::PWaitDstStageMask),
        "VUID-vkQueueSubmit-pWaitDstStageMask-00066",
    ),
    Entry::new(
        Key::structure(Struct::SubpassDependency).field(Field::SrcStageMask),
        "VUID-vkCmdBeginRenderPass-srcStageMask-06451",
    ),
    Entry::new(
        Key::structure(Struct::SubpassDependency).field(Field::DstStageMask),
        "VUID-vkCmdBeginRenderPass-dstStageMask-06452",
    ),
    Entry::new(
        Key::func(Func::CmdSetEvent).field(Field::StageMask),
        "VUID-vkCmdSetEvent-stageMask-06457",
    ),
    Entry::new(
        Key::func(Func::CmdResetEvent).field(Field::StageMask),
        "VUID-vkCmdResetEvent-stageMask-06458",
    ),
    Entry::new(
        Key::func(Func::CmdWaitEvents).field(Field::SrcStageMask),
        "VUID-vkCmdWaitEvents-srcStageMask-06459",
    ),
    Entry::new(
        Key::func(Func::CmdWaitEvents).field(Field::DstStageMask),
        "VUID-vkCmdWaitEvents-dstStageMask-06460",
    ),
    Entry::new(
        Key::func(Func::CmdPipelineBarrier).field(Field::SrcStageMask),
        "VUID-vkCmdPipelineBarrier-srcStageMask-06461",
    ),
    Entry::new(
        Key::func(Func::CmdPipelineBarrier).field(Field::DstStageMask),
        "VUID-vkCmdPipelineBarrier-dstStageMask-06462",
    ),
    Entry::new(
        Key::func(Func::CmdWriteTimestamp).field(Field::PipelineStage),
        "VUID-vkCmdWriteTimestamp-pipelineStage-04074",
    ),
    Entry::new(
        Key::structure(Struct::SubpassDependency2).field(Field::SrcStageMask),
        "VUID-vkCmdBeginRenderPass2-srcStageMask-06453",
    ),
    Entry::new(
        Key::structure(Struct::SubpassDependency2).field(Field::DstStageMask),
        "VUID-vkCmdBeginRenderPass2-dstStageMask-06454",
    ),
    Entry::new(
        Key::func(Func::CmdSetEvent2).field(Field::SrcStageMask),
        "VUID-vkCmdSetEvent2-srcStageMask-03827",
    ),
    Entry::new(
        Key::func(Func::CmdSetEvent2).field(Field::DstStageMask),
        "VUID-vkCmdSetEvent2-dstStageMask-03828",
    ),
    Entry::new(
        Key::func(Func::CmdPipelineBarrier2).field(Field::SrcStageMask),
        "VUID-vkCmdPipelineBarrier2-srcStageMask-03849",
    ),
    Entry::new(
        Key::func(Func::CmdPipelineBarrier2).field(Field::DstStageMask),
        "VUID-vkCmdPipelineBarrier2-dstStageMask-03850",
    ),
    Entry::new(
        Key::func(Func::CmdWaitEvents2).field(Field::SrcStageMask),
        "VUID-vkCmdWaitEvents2-srcStageMask-03842",
    ),
    Entry::new(
        Key::func(Func::CmdWaitEvents2).field(Field::DstStageMask),
        "VUID-vkCmdWaitEvents2-dstStageMask-03843",
    ),
    Entry::new(
        Key::func(Func::CmdWriteTimestamp2).field(Field::Stage),
        "VUID-vkCmdWriteTimestamp2-stage-03860",
    ),
    Entry::new(
        Key::func(Func::QueueSubmit2).parent_field(Field::PSignalSemaphoreInfos),
        "VUID-vkQueueSubmit2-stageMask-03869",
    ),
    Entry::new(
        Key::func(Func::QueueSubmit2).parent_field(Field::PWaitSemaphoreInfos),
        "VUID-vkQueueSubmit2-stageMask-03870",
    ),
];

pub(crate) const SRC_OR_DST_MUST_BE_IGNORE: &[Entry] = &[
    Entry::new(
        Key::structure(Struct::BufferMemoryBarrier),
        "VUID-VkBufferMemoryBarrier-synchronization2-03853",
    ),
    Entry::new(
        Key::structure(Struct::ImageMemoryBarrier),
        "VUID-VkImageMemoryBarrier-synchronization2-03857",
    ),
];

pub(crate) const SPECIAL_OR_IGNORE_ONLY: &[Entry] = &[
    Entry::new(
        Key::structure(Struct::BufferMemoryBarrier2),
        "VUID-VkBufferMemoryBarrier2-buffer-04088",
    ),
    Entry::new(
        Key::structure(Struct::BufferMemoryBarrier),
        "VUID-VkBufferMemoryBarrier-buffer-04088",
    ),
    Entry::new(
        Key::structure(Struct::ImageMemoryBarrier2),
        "VUID-VkImageMemoryBarrier2-image-04071",
    ),
    Entry::new(
        Key::structure(Struct::ImageMemoryBarrier),
        "VUID-VkImageMemoryBarrier-image-04071",
    ),
];

pub(crate) const SRC_AND_DST_VALID_OR_SPECIAL: &[Entry] = &[
    Entry::new(
        Key::structure(Struct::BufferMemoryBarrier2),
        "VUID-VkBufferMemoryBarrier2-buffer-04089",
    ),
    Entry::new(
        Key::structure(Struct::BufferMemoryBarrier),
        "VUID-VkBufferMemoryBarrier-buffer-04089",
    ),
    Entry::new(
        Key::structure(Struct::ImageMemoryBarrier2),
        "VUID-VkImageMemoryBarrier2-image-04072",
    ),
    Entry::new(
        Key::structure(Struct::ImageMemoryBarrier),
        "VUID-VkImageMemoryBarrier-image-04072",
    ),
];

pub(crate) const SRC_AND_DST_MUST_BE_IGNORE: &[Entry] = &[
    Entry::new(
        Key::structure(Struct::BufferMemoryBarrier),
        "VUID-VkBufferMemoryBarrier-synchronization2-03852",
    ),
    Entry::new(
        Key::structure(Struct::ImageMemoryBarrier),
        "VUID-VkImageMemoryBarrier-synchronization2-03856",
    ),
];

pub(crate) const SRC_AND_DST_BOTH_VALID: &[Entry] = &[
    Entry::new(
        Key::structure(Struct::BufferMemoryBarrier2),
        "VUID-VkBufferMemoryBarrier2-buffer-04086",
    ),
    Entry::new(
        Key::structure(Struct::BufferMemoryBarrier),
        "VUID-VkBufferMemoryBarrier-buffer-04086",
    ),
    Entry::new(
        Key::structure(Struct::ImageMemoryBarrier2),
        "VUID-VkImageMemoryBarrier2-image-04069",
    ),
    Entry::new(
        Key::structure(Struct::ImageMemoryBarrier),
        "VUID-VkImageMemoryBarrier-image-04069",
    ),
];

pub(crate) const CONFLICTING_LAYOUT: &[Entry] = &[
    Entry::new(
        Key::structure(Struct::ImageMemoryBarrier),
        "VUID-VkImageMemoryBarrier-oldLayout-01197",
    ),
    Entry::new(
        Key::structure(Struct::ImageMemoryBarrier2),
        "VUID-VkImageMemoryBarrier2-oldLayout-01197",
    ),
    Entry::new(
        Key::func(Func::CmdBeginRenderPass),
        "VUID-vkCmdBeginRenderPass-initialLayout-00900",
    ),
    Entry::new(
        Key::func(Func::CmdBeginRenderPass2),
        "VUID-vkCmdBeginRenderPass2-initialLayout-03094",
    ),
];

pub(crate) const RENDER_PASS_LAYOUT_CHANGE: &[Entry] = &[
    Entry::new(
        Key::func(Func::CmdPipelineBarrier),
        "VUID-vkCmdPipelineBarrier-oldLayout-01181",
    ),
    Entry::new(
        Key::func(Func::CmdPipelineBarrier2),
        "VUID-vkCmdPipelineBarrier2-oldLayout-01181",
    ),
];

pub(crate) const BINARY_CANNOT_BE_SIGNALLED: &[Entry] = &[
    Entry::new(
        Key::func(Func::QueueSubmit),
        "VUID-vkQueueSubmit-pWaitSemaphores-03238",
    ),
    Entry::new(
        Key::func(Func::QueueSubmit2),
        "VUID-vkQueueSubmit2-semaphore-03873",
    ),
];

pub(crate) const SEM_ALREADY_SIGNALLED: &[Entry] = &[
    Entry::new(
        Key::func(Func::QueueSubmit),
        "VUID-vkQueueSubmit-pSignalSemaphores-00067",
    ),
    Entry::new(
        Key::func(Func::QueueSubmit2),
        "VUID-vkQueueSubmit2-semaphore-03868",
    ),
];

pub(crate) const OTHER_QUEUE_WAITING: &[Entry] = &[
    Entry::new(
        Key::func(Func::QueueSubmit),
        "VUID-vkQueueSubmit-pWaitSemaphores-00068",
    ),
    Entry::new(
        Key::func(Func::QueueSubmit2),
        "VUID-vkQueueSubmit2-semaphore-03871",
    ),
];

pub(crate) const CMD_NOT_SIMULTANEOUS: &[Entry] = &[
    Entry::new(
        Key::func(Func::QueueSubmit),
        "VUID-vkQueueSubmit-pCommandBuffers-00071",
    ),
    Entry::new(
        Key::func(Func::QueueSubmit2),
        "VUID-vkQueueSubmit2-commandBuffer-03875",
    ),
];

pub(crate) const REUSED_ONE_TIME_CMD: &[Entry] = &[
    Entry::new(
        Key::func(Func::QueueSubmit),
        "VUID-vkQueueSubmit-pCommandBuffers-00072",
    ),
    Entry::new(
        Key::func(Func::QueueSubmit2),
        "VUID-vkQueueSubmit2-commandBuffer-03876",
    ),
];

pub(crate) const SECONDARY_CMD_NOT_SIMULTANEOUS: &[Entry] = &[
    Entry::new(
        Key::func(Func::CmdExecuteCommands),
        "VUID-vkCmdExecuteCommands-pCommandBuffers-00093",
    ),
    Entry::new(
        Key::func(Func::QueueSubmit),
        "VUID-vkQueueSubmit-pCommandBuffers-00073",
    ),
    Entry::new(
        Key::func(Func::QueueSubmit2),
        "VUID-vkQueueSubmit2-commandBuffer-03877",
    ),
];

pub(crate) const CMD_WRONG_QUEUE_FAMILY: &[Entry] = &[
    Entry::new(
        Key::func(Func::QueueSubmit),
        "VUID-vkQueueSubmit-pCommandBuffers-00074",
    ),
    Entry::new(
        Key::func(Func::QueueSubmit2),
        "VUID-vkQueueSubmit2-commandBuffer-03878",
    ),
];

pub(crate) const SECONDARY_CMD_IN_SUBMIT: &[Entry] = &[
    Entry::new(
        Key::func(Func::QueueSubmit),
        "VUID-VkSubmitInfo-pCommandBuffers-00075",
    ),
    Entry::new(
        Key::func(Func::QueueSubmit2),
        "VUID-VkCommandBufferSubmitInfo-commandBuffer-03890",
    ),
];

pub(crate) const HOST_STAGE_MASK: &[Entry] = &[
    Entry::new(
        Key::structure(Struct::SubmitInfo),
        "VUID-VkSubmitInfo-pWaitDstStageMask-00078",
    ),
    Entry::new(
        Key::func(Func::CmdSetEvent),
        "VUID-vkCmdSetEvent-stageMask-01149",
    ),
    Entry::new(
        Key::func(Func::CmdResetEvent),
        "VUID-vkCmdResetEvent-stageMask-01153",
    ),
    Entry::new(
        Key::func(Func::CmdResetEvent2),
        "VUID-vkCmdResetEvent2-stageMask-03830",
    ),
];
