use syncval_core::vk;

/// Illegal combination of source and destination queue family indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum QueueError {
    /// Exclusive resource, legacy barrier: exactly one index is ignored.
    SrcOrDstMustBeIgnore,

    /// Concurrent resource: only special or ignored indices allowed.
    SpecialOrIgnoreOnly,

    /// Exclusive resource: index is neither a valid family, ignored nor special.
    SrcAndDstValidOrSpecial,

    /// Concurrent resource without external memory: both must be ignored.
    SrcAndDstMustBeIgnore,

    /// Exclusive resource: both indices are special.
    SrcAndDstBothValid,
}

impl QueueError {
    /// Human readable summary.
    pub fn summary(&self) -> &'static str {
        match *self {
            QueueError::SrcOrDstMustBeIgnore => {
                "Source or destination queue family must be ignored."
            }
            QueueError::SpecialOrIgnoreOnly => {
                "Source or destination queue family must be special or ignored."
            }
            QueueError::SrcAndDstValidOrSpecial => {
                "Source and destination queue family must be valid, ignored, or special."
            }
            QueueError::SrcAndDstMustBeIgnore => {
                "Source and destination queue family must both be ignored."
            }
            QueueError::SrcAndDstBothValid => {
                "Source and destination queue family must both be valid."
            }
        }
    }
}

/// Image barrier and render pass layout errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ImageError {
    /// Old layout doesn't match the layout the subresource is in.
    ConflictingLayout,

    /// Layout change inside a render pass instance.
    RenderPassLayoutChange,
}

/// Queue submission errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SubmitError {
    /// Wait on a binary semaphore that has no pending signal.
    BinaryCannotBeSignalled,

    /// Signal of a binary semaphore that is already signalled.
    SemAlreadySignalled,

    /// Wait on a binary semaphore another queue already waits on.
    OtherQueueWaiting,

    /// Host stage in a wait stage mask or an event stage mask.
    HostStageMask,

    /// Command buffer without simultaneous use is pending or listed twice.
    CmdNotSimultaneous,

    /// One-time submit command buffer is submitted again.
    ReusedOneTimeCmd,

    /// Secondary command buffer without simultaneous use is already pending
    /// through another primary.
    SecondaryCmdNotSimultaneous,

    /// Command buffer allocated from a pool of another queue family.
    CmdWrongQueueFamily,

    /// Secondary command buffer submitted directly.
    SecondaryCmdInSubmit,
}

/// Memory hazards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HazardClass {
    /// Read not ordered after a write.
    ReadAfterWrite,

    /// Write not ordered after a read.
    WriteAfterRead,

    /// Write not ordered after a write.
    WriteAfterWrite,

    /// Read on one queue racing a write on another.
    ReadRacingWrite,

    /// Write on one queue racing a read on another.
    WriteRacingRead,

    /// Writes racing on different queues.
    WriteRacingWrite,
}

impl HazardClass {
    /// Racing counterpart of the class.
    pub fn racing(self) -> HazardClass {
        match self {
            HazardClass::ReadAfterWrite => HazardClass::ReadRacingWrite,
            HazardClass::WriteAfterRead => HazardClass::WriteRacingRead,
            HazardClass::WriteAfterWrite => HazardClass::WriteRacingWrite,
            racing => racing,
        }
    }
}

/// Queue family ownership transfer errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OwnershipError {
    /// Access to a released range before the matching acquire.
    MissingAcquire,

    /// Acquire with no matching release.
    MissingRelease,
}

/// Kind of finding, the first half of a catalog lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Violation {
    /// Stage bit gated by a disabled feature, or the `NONE` stage where it is illegal.
    StageFeature(vk::PipelineStageFlags2),

    /// Access bit no stage of the mask can perform.
    AccessStage(vk::AccessFlags2),

    /// Stage bit the queue family can't execute.
    QueueCapability(vk::PipelineStageFlags2),

    /// Queue family indices of a barrier.
    QueueTransfer(QueueError),

    /// Image layout error.
    Image(ImageError),

    /// Submission error.
    Submit(SubmitError),

    /// Memory hazard.
    Hazard(HazardClass),

    /// Ownership transfer error.
    Ownership(OwnershipError),
}
