//! Synchronization validation for Vulkan command streams.
//!
//! Ingests the synchronization-relevant calls of a logical device
//! and reports memory hazards, layout and ownership conflicts and malformed barriers,
//! each classified with its Vulkan rule identifier.

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

#[doc(inline)]
pub use syncval_catalog as catalog;

#[doc(inline)]
pub use syncval_chain as chain;

#[doc(inline)]
pub use syncval_command as command;

#[doc(inline)]
pub use syncval_queue as queue;

#[doc(inline)]
pub use syncval_resource as resource;

pub use syncval_core::*;

mod config;
mod validator;

pub use crate::{
    config::Config,
    validator::{Submission, Validator},
};

#[cfg(test)]
mod properties;

#[cfg(test)]
mod scenarios;
