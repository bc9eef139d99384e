use {
    smallvec::SmallVec,
    std::sync::Arc,
    syncval_command::Recorded,
    syncval_core::{vk::PipelineStageFlags2 as Stages, Func, SemaphoreId},
    syncval_resource::Hazard,
};

/// Semaphore with the stages of a wait or signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SemaphoreOp {
    /// Semaphore.
    pub semaphore: SemaphoreId,

    /// Second scope of a wait, first scope of a signal.
    pub stages: Stages,
}

/// Batch of a queue submission.
///
/// Waits happen before the command buffers execute and signals after.
#[derive(Clone, Debug, Default)]
pub struct Batch {
    /// Semaphores with stage mask to wait on.
    pub waits: SmallVec<[SemaphoreOp; 2]>,

    /// Command buffers in submission order.
    pub submits: Vec<Arc<Recorded>>,

    /// Semaphores to signal.
    pub signals: SmallVec<[SemaphoreOp; 2]>,
}

impl Batch {
    /// Create new empty batch.
    pub fn new() -> Self {
        Batch::default()
    }

    /// Add wait to the batch.
    pub fn wait(mut self, semaphore: SemaphoreId, stages: Stages) -> Self {
        self.waits.push(SemaphoreOp { semaphore, stages });
        self
    }

    /// Add command buffers to the batch.
    pub fn submits<I>(mut self, submits: I) -> Self
    where
        I: IntoIterator<Item = Arc<Recorded>>,
    {
        self.submits.extend(submits);
        self
    }

    /// Add signal covering all commands to the batch.
    pub fn signal(self, semaphore: SemaphoreId) -> Self {
        self.signal_at(semaphore, Stages::ALL_COMMANDS)
    }

    /// Add signal with explicit stage mask to the batch.
    pub fn signal_at(mut self, semaphore: SemaphoreId, stages: Stages) -> Self {
        self.signals.push(SemaphoreOp { semaphore, stages });
        self
    }

    /// Number of tags the batch replay spans, waits and signal included.
    pub(crate) fn tags(&self) -> u64 {
        self.submits.iter().map(|recorded| recorded.tags()).sum::<u64>() + 2
    }
}

/// Findings of one ingestion call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubmitResult {
    /// Memory hazards and structural findings.
    pub hazards: Vec<Hazard>,

    /// Semaphore and wait mask findings.
    pub submit_errors: Vec<Hazard>,
}

impl SubmitResult {
    /// Result with hazards only.
    pub fn hazards(hazards: Vec<Hazard>) -> Self {
        SubmitResult {
            hazards,
            submit_errors: Vec::new(),
        }
    }

    /// Check if nothing was found.
    pub fn is_clean(&self) -> bool {
        self.hazards.is_empty() && self.submit_errors.is_empty()
    }

    /// Total number of findings.
    pub fn len(&self) -> usize {
        self.hazards.len() + self.submit_errors.len()
    }

    /// Check if nothing was found.
    pub fn is_empty(&self) -> bool {
        self.is_clean()
    }

    /// Append findings of another call.
    pub fn extend(&mut self, other: SubmitResult) {
        self.hazards.extend(other.hazards);
        self.submit_errors.extend(other.submit_errors);
    }

    /// Keep at most `max` findings, hazards first.
    pub fn truncate(&mut self, max: usize) {
        self.hazards.truncate(max);
        let left = max - self.hazards.len();
        self.submit_errors.truncate(left);
    }
}

/// Check that `function` submits batches.
pub(crate) fn is_submit(function: Func) -> bool {
    function == Func::QueueSubmit || function == Func::QueueSubmit2
}
