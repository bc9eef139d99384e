//! Shared vocabulary of the synchronization validator.
//!
//! Identifiers, execution tags, stage and access bitset expansion,
//! synchronization scopes, the device capability snapshot and call-site locations.

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

pub use ash::vk;

pub mod access;
mod capability;
mod error;
mod id;
mod location;
mod scope;
pub mod stage;
mod tag;

pub use crate::{
    capability::{stage_feature, CapabilityContext, DeviceCapabilities},
    error::EngineFault,
    id::{
        CommandBufferId, CommandPoolId, EventId, FenceId, MemoryId, QueueId, RenderPassId,
        ResourceId, SemaphoreId,
    },
    location::{Field, Func, Location, Struct},
    scope::{AccessScope, SyncScope, Usage},
    tag::{Tag, TagSource},
};

/// Iterate over single set bits of the raw mask, lowest first.
pub(crate) fn single_bits(mut raw: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        if raw == 0 {
            None
        } else {
            let bit = raw & raw.wrapping_neg();
            raw &= !bit;
            Some(bit)
        }
    })
}
