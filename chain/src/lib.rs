//! Barrier and dependency analysis.
//!
//! Turns pipeline barriers, event dependencies and subpass dependencies
//! into ordering edges the tracker applies, and reports barriers
//! that are malformed regardless of timing.

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

mod analyzer;
mod barrier;
mod transfer;

pub use crate::{
    analyzer::{Analysis, Analyzer, BarrierContext, StageSide},
    barrier::{Barrier, BarrierKind, Dependency},
    transfer::{check_transfer, ownership_role},
};

/// Barrier resolved to scopes the tracker orders accesses with.
pub type OrderingEdge = syncval_resource::BarrierOp;
