use syncval_core::{QueueId, Tag};

/// Point in a queue timeline where a fence is signalled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FenceEpoch {
    /// Queue that signals fence.
    pub queue: QueueId,

    /// Last tag of the submission.
    pub tag: Tag,
}

/// State of a fence as the host sees it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FenceState {
    /// Not signalled and not pending.
    Unsignaled,

    /// Signalled and waited.
    Signaled,

    /// Pending signal by a submission.
    Submitted(FenceEpoch),
}

/// Fence tracked by the simulator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fence {
    state: FenceState,
}

impl Fence {
    /// Create new fence in signaled or unsignaled state.
    pub fn new(signaled: bool) -> Self {
        Fence {
            state: if signaled {
                FenceState::Signaled
            } else {
                FenceState::Unsignaled
            },
        }
    }

    /// Current state.
    pub fn state(&self) -> FenceState {
        self.state
    }

    /// Check if fence was submitted.
    pub fn is_submitted(&self) -> bool {
        match self.state {
            FenceState::Submitted(_) => true,
            _ => false,
        }
    }

    /// Check if fence is signaled.
    pub fn is_signaled(&self) -> bool {
        self.state == FenceState::Signaled
    }

    /// Becomes `Submitted` after.
    pub(crate) fn mark_submitted(&mut self, epoch: FenceEpoch) {
        if self.state != FenceState::Unsignaled {
            log::warn!(
                "Fence submitted to {} while {:?}, it must be unsignaled",
                epoch.queue,
                self.state
            );
        }
        self.state = FenceState::Submitted(epoch);
    }

    /// Host observed the signal.
    /// Returns the epoch whose work is now complete, if a submission was pending.
    pub(crate) fn complete(&mut self) -> Option<FenceEpoch> {
        match self.state {
            FenceState::Submitted(epoch) => {
                self.state = FenceState::Signaled;
                Some(epoch)
            }
            FenceState::Signaled => None,
            FenceState::Unsignaled => {
                log::warn!("Wait on a fence that is never signalled orders nothing");
                None
            }
        }
    }

    /// Fence is reset by the host.
    pub(crate) fn reset(&mut self) {
        if let FenceState::Submitted(epoch) = self.state {
            log::warn!(
                "Fence reset while pending on {} {}, the submission is not known to be complete",
                epoch.queue,
                epoch.tag
            );
        }
        self.state = FenceState::Unsignaled;
    }

    /// Drop pending submission.
    pub(crate) fn clear(&mut self) {
        if self.is_submitted() {
            self.state = FenceState::Unsignaled;
        }
    }
}
