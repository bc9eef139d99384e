//! Queue submission simulator.
//!
//! Queues replay recorded command buffers in submission order.
//! Binary semaphores order queues, fences and idle waits order queues before the host.

#![forbid(overflowing_literals)]
#![warn(missing_copy_implementations)]
#![warn(missing_debug_implementations)]
#![warn(missing_docs)]
#![deny(path_statements)]
#![deny(trivial_bounds)]
#![deny(type_alias_bounds)]
#![deny(unconditional_recursion)]
#![deny(while_true)]
#![deny(bad_style)]
#![deny(future_incompatible)]
#![warn(rust_2018_compatibility)]
#![warn(rust_2018_idioms)]

mod fence;
mod queue;
mod semaphore;
mod simulator;
mod submission;

pub use crate::{
    fence::{Fence, FenceEpoch, FenceState},
    queue::Queue,
    semaphore::{Semaphore, Signal},
    simulator::{command_buffer_location, Simulator, SimulatorSnapshot},
    submission::{Batch, SemaphoreOp, SubmitResult},
};
