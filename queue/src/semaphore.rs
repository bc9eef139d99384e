use {
    syncval_catalog::SubmitError,
    syncval_core::{QueueId, Tag},
};

/// Semaphore signal operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Signal {
    /// Signalling queue.
    pub queue: QueueId,

    /// Tag of the signal. Work on `queue` up to it is in the first scope.
    pub tag: Tag,
}

/// Binary semaphore.
///
/// At most one signal is pending at a time and each signal is consumed by one wait.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Semaphore {
    pending: Option<Signal>,
    waiter: Option<QueueId>,
}

impl Semaphore {
    /// Create unsignalled semaphore.
    pub fn new() -> Self {
        Semaphore::default()
    }

    /// Signal not consumed yet.
    pub fn pending(&self) -> Option<Signal> {
        self.pending
    }

    /// Queue that consumed the last signal.
    pub fn waiter(&self) -> Option<QueueId> {
        self.waiter
    }

    /// Signal the semaphore.
    /// The previous signal must have been consumed.
    pub(crate) fn signal(&mut self, signal: Signal) -> Result<(), SubmitError> {
        if self.pending.is_some() {
            return Err(SubmitError::SemAlreadySignalled);
        }
        self.pending = Some(signal);
        self.waiter = None;
        Ok(())
    }

    /// Consume pending signal by a wait on `queue`.
    pub(crate) fn wait(&mut self, queue: QueueId) -> Result<Signal, SubmitError> {
        match self.pending.take() {
            Some(signal) => {
                self.waiter = Some(queue);
                Ok(signal)
            }
            None => match self.waiter {
                Some(waiter) if waiter != queue => Err(SubmitError::OtherQueueWaiting),
                _ => Err(SubmitError::BinaryCannotBeSignalled),
            },
        }
    }

    /// Drop pending signal and waiter.
    pub(crate) fn clear(&mut self) {
        *self = Semaphore::default();
    }
}
