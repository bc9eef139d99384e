//! Command buffer recording model.
//!
//! Command buffers record the accesses, barriers and event operations of their commands
//! and report hazards found within the recording.
//! Render passes add the implicit synchronization of subpasses and attachments.

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

mod buffer;
mod event;
mod pool;
mod recorded;
mod render_pass;

pub use crate::{
    buffer::{CommandBuffer, Level, State, Usage},
    event::Events,
    pool::CommandPool,
    recorded::{Command, Rebase, Recorded},
    render_pass::{
        AttachmentDescription, AttachmentReference, AttachmentTransition, Boundary, RenderPass,
        SubpassDependency, SubpassDescription,
    },
};
