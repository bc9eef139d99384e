use std::fmt;

macro_rules! named_enum {
    ($(#[$meta:meta])* $name:ident { $($(#[$vmeta:meta])* $variant:ident => $text:expr,)* }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde-1", derive(serde::Serialize, serde::Deserialize))]
        pub enum $name {
            $($(#[$vmeta])* $variant,)*
        }

        impl $name {
            /// Name as it appears in the API.
            pub fn name(&self) -> &'static str {
                match *self {
                    $($name::$variant => $text,)*
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

named_enum! {
    /// API entry point.
    #[allow(missing_docs)]
    Func {
        CmdPipelineBarrier => "vkCmdPipelineBarrier",
        CmdPipelineBarrier2 => "vkCmdPipelineBarrier2",
        CmdSetEvent => "vkCmdSetEvent",
        CmdSetEvent2 => "vkCmdSetEvent2",
        CmdResetEvent => "vkCmdResetEvent",
        CmdResetEvent2 => "vkCmdResetEvent2",
        CmdWaitEvents => "vkCmdWaitEvents",
        CmdWaitEvents2 => "vkCmdWaitEvents2",
        CmdWriteTimestamp => "vkCmdWriteTimestamp",
        CmdWriteTimestamp2 => "vkCmdWriteTimestamp2",
        CmdBeginRenderPass => "vkCmdBeginRenderPass",
        CmdBeginRenderPass2 => "vkCmdBeginRenderPass2",
        CmdNextSubpass => "vkCmdNextSubpass",
        CmdNextSubpass2 => "vkCmdNextSubpass2",
        CmdEndRenderPass => "vkCmdEndRenderPass",
        CmdEndRenderPass2 => "vkCmdEndRenderPass2",
        CmdExecuteCommands => "vkCmdExecuteCommands",
        CmdCopyBuffer => "vkCmdCopyBuffer",
        CmdCopyImage => "vkCmdCopyImage",
        CmdCopyBufferToImage => "vkCmdCopyBufferToImage",
        CmdCopyImageToBuffer => "vkCmdCopyImageToBuffer",
        CmdBlitImage => "vkCmdBlitImage",
        CmdResolveImage => "vkCmdResolveImage",
        CmdClearColorImage => "vkCmdClearColorImage",
        CmdFillBuffer => "vkCmdFillBuffer",
        CmdUpdateBuffer => "vkCmdUpdateBuffer",
        CmdDraw => "vkCmdDraw",
        CmdDrawIndexed => "vkCmdDrawIndexed",
        CmdDrawIndirect => "vkCmdDrawIndirect",
        CmdDispatch => "vkCmdDispatch",
        CmdDispatchIndirect => "vkCmdDispatchIndirect",
        CreateRenderPass => "vkCreateRenderPass",
        CreateRenderPass2 => "vkCreateRenderPass2",
        QueueSubmit => "vkQueueSubmit",
        QueueSubmit2 => "vkQueueSubmit2",
        MapMemory => "vkMapMemory",
        WaitForFences => "vkWaitForFences",
        QueueWaitIdle => "vkQueueWaitIdle",
        DeviceWaitIdle => "vkDeviceWaitIdle",
    }
}

named_enum! {
    /// API structure.
    #[allow(missing_docs)]
    Struct {
        MemoryBarrier => "VkMemoryBarrier",
        MemoryBarrier2 => "VkMemoryBarrier2",
        BufferMemoryBarrier => "VkBufferMemoryBarrier",
        BufferMemoryBarrier2 => "VkBufferMemoryBarrier2",
        ImageMemoryBarrier => "VkImageMemoryBarrier",
        ImageMemoryBarrier2 => "VkImageMemoryBarrier2",
        DependencyInfo => "VkDependencyInfo",
        SubpassDependency => "VkSubpassDependency",
        SubpassDependency2 => "VkSubpassDependency2",
        AttachmentDescription => "VkAttachmentDescription",
        SubmitInfo => "VkSubmitInfo",
        SubmitInfo2 => "VkSubmitInfo2",
        SemaphoreSubmitInfo => "VkSemaphoreSubmitInfo",
        CommandBufferSubmitInfo => "VkCommandBufferSubmitInfo",
        RenderPassBeginInfo => "VkRenderPassBeginInfo",
    }
}

named_enum! {
    /// Structure member or function parameter.
    #[allow(missing_docs)]
    Field {
        SrcStageMask => "srcStageMask",
        DstStageMask => "dstStageMask",
        SrcAccessMask => "srcAccessMask",
        DstAccessMask => "dstAccessMask",
        StageMask => "stageMask",
        PipelineStage => "pipelineStage",
        Stage => "stage",
        OldLayout => "oldLayout",
        NewLayout => "newLayout",
        InitialLayout => "initialLayout",
        SrcQueueFamilyIndex => "srcQueueFamilyIndex",
        DstQueueFamilyIndex => "dstQueueFamilyIndex",
        PMemoryBarriers => "pMemoryBarriers",
        PBufferMemoryBarriers => "pBufferMemoryBarriers",
        PImageMemoryBarriers => "pImageMemoryBarriers",
        PDependencies => "pDependencies",
        PWaitDstStageMask => "pWaitDstStageMask",
        PWaitSemaphores => "pWaitSemaphores",
        PSignalSemaphores => "pSignalSemaphores",
        PWaitSemaphoreInfos => "pWaitSemaphoreInfos",
        PSignalSemaphoreInfos => "pSignalSemaphoreInfos",
        PCommandBuffers => "pCommandBuffers",
        PCommandBufferInfos => "pCommandBufferInfos",
        CommandBuffer => "commandBuffer",
        Semaphore => "semaphore",
        Buffer => "buffer",
        Image => "image",
    }
}

impl Func {
    /// Check if entry point comes from `synchronization2`.
    pub fn is_sync2(&self) -> bool {
        match *self {
            Func::CmdPipelineBarrier2
            | Func::CmdSetEvent2
            | Func::CmdResetEvent2
            | Func::CmdWaitEvents2
            | Func::CmdWriteTimestamp2
            | Func::QueueSubmit2 => true,
            _ => false,
        }
    }
}

impl Struct {
    /// Check if structure comes from `synchronization2`.
    pub fn is_sync2(&self) -> bool {
        match *self {
            Struct::MemoryBarrier2
            | Struct::BufferMemoryBarrier2
            | Struct::ImageMemoryBarrier2
            | Struct::DependencyInfo
            | Struct::SubmitInfo2
            | Struct::SemaphoreSubmitInfo
            | Struct::CommandBufferSubmitInfo => true,
            _ => false,
        }
    }
}

/// Call-site context of a finding.
///
/// `parent` is the array member the structure was reached through,
/// e.g. `pImageMemoryBarriers` for `VkImageMemoryBarrier2::oldLayout`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-1", derive(serde::Serialize, serde::Deserialize))]
pub struct Location {
    /// Entry point.
    pub function: Func,

    /// Structure, if the value lives inside one.
    pub structure: Option<Struct>,

    /// Member or parameter.
    pub field: Option<Field>,

    /// Array member leading to the structure.
    pub parent: Option<Field>,

    /// Index into `parent`.
    pub index: Option<u32>,
}

impl Location {
    /// Location of the entry point itself.
    pub fn new(function: Func) -> Self {
        Location {
            function,
            structure: None,
            field: None,
            parent: None,
            index: None,
        }
    }

    /// Location with structure.
    pub fn with_struct(mut self, structure: Struct) -> Self {
        self.structure = Some(structure);
        self
    }

    /// Location with field.
    pub fn with_field(mut self, field: Field) -> Self {
        self.field = Some(field);
        self
    }

    /// Location reached through `parent[index]`.
    pub fn with_parent(mut self, parent: Field, index: u32) -> Self {
        self.parent = Some(parent);
        self.index = Some(index);
        self
    }

    /// Check if call site uses `synchronization2` structures or entry points.
    pub fn is_sync2(&self) -> bool {
        match self.structure {
            Some(structure) => structure.is_sync2(),
            None => self.function.is_sync2(),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}()", self.function)?;
        if let Some(parent) = self.parent {
            write!(f, " {}[{}]", parent, self.index.unwrap_or(0))?;
        }
        if let Some(structure) = self.structure {
            write!(f, " {}", structure)?;
        }
        if let Some(field) = self.field {
            write!(f, ".{}", field)?;
        }
        Ok(())
    }
}
