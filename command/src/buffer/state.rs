/// Lifecycle state of a command buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum State {
    /// All buffers start here.
    /// Resetting also moves buffer to this state.
    Initial,

    /// Commands could be recorded.
    Recording,

    /// Recording finished, buffer could be submitted or executed.
    Executable,

    /// One-shot buffers move here after submission.
    /// Only reset moves buffer out of this state.
    Invalid,
}

impl State {
    /// Name of the state used in faults.
    pub fn name(&self) -> &'static str {
        match self {
            State::Initial => "initial",
            State::Recording => "recording",
            State::Executable => "executable",
            State::Invalid => "invalid",
        }
    }
}

impl Default for State {
    fn default() -> Self {
        State::Initial
    }
}

/// Command buffer level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Level {
    /// Command buffers of this level can be submitted to the queues.
    Primary,

    /// Command buffers of this level can be executed as part of the primary buffers.
    Secondary,
}

/// How often recorded commands may be submitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Usage {
    /// Buffer moves to invalid state after submission.
    /// Resubmitting requires reset and rerecording commands.
    OneShot,

    /// Buffer stays executable after submission.
    MultiShot,

    /// Buffer stays executable and may be pending or executed more than once at a time.
    Simultaneous,
}

impl Usage {
    /// Check if the buffer may be pending more than once.
    pub fn is_simultaneous(&self) -> bool {
        *self == Usage::Simultaneous
    }
}

impl Default for Usage {
    fn default() -> Self {
        Usage::MultiShot
    }
}
