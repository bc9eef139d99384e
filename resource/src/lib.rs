//! Resource access tracking.
//!
//! Keeps per-range access history of buffers and images
//! and reports every access that isn't ordered after a conflicting one.

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

mod hazard;
mod op;
mod range;
mod registry;
mod state;
mod tracker;

pub use crate::{
    hazard::{Classifier, Hazard, HazardKind},
    op::{AccessInfo, BarrierOp, BarrierTarget, LayoutTransition, Origin, Ownership, QueueSync},
    range::{BufferRange, ImageSubresourceRange, LinearRanges, SubresourceRange},
    registry::{
        Alias, BufferInfo, ImageInfo, MemoryBinding, Registry, ResourceInfo, ResourceKind,
    },
    state::{AccessRecord, AccessState, LayoutState, PendingRelease, QueueScope},
    tracker::{Tracker, TrackerMode, TrackerSnapshot},
};
