//! Queue family ownership transfer shapes.

use {
    syncval_catalog::QueueError,
    syncval_core::{vk, CapabilityContext, DeviceCapabilities},
    syncval_resource::Ownership,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FamilyClass {
    Ignored,
    Special,
    Valid,
    Invalid,
}

fn class(family: u32, capabilities: &CapabilityContext) -> FamilyClass {
    match family {
        vk::QUEUE_FAMILY_IGNORED => FamilyClass::Ignored,
        vk::QUEUE_FAMILY_EXTERNAL | vk::QUEUE_FAMILY_FOREIGN_EXT => FamilyClass::Special,
        family if capabilities.is_valid_family(family) => FamilyClass::Valid,
        _ => FamilyClass::Invalid,
    }
}

/// Check the pair of queue family indices of a buffer or image barrier.
/// Returns the error for shapes that are illegal for the sharing mode.
pub fn check_transfer(
    src_family: u32,
    dst_family: u32,
    sharing: vk::SharingMode,
    capabilities: &CapabilityContext,
) -> Option<QueueError> {
    let src = class(src_family, capabilities);
    let dst = class(dst_family, capabilities);
    let external = capabilities.enabled(DeviceCapabilities::EXTERNAL_MEMORY);
    let sync2 = capabilities.synchronization2();

    if sharing == vk::SharingMode::CONCURRENT {
        if src == FamilyClass::Ignored && dst == FamilyClass::Ignored {
            return None;
        }
        if !external && !sync2 {
            return Some(QueueError::SrcAndDstMustBeIgnore);
        }
        let special_or_ignored =
            |class: FamilyClass| class == FamilyClass::Ignored || class == FamilyClass::Special;
        if !special_or_ignored(src) || !special_or_ignored(dst) {
            return Some(QueueError::SpecialOrIgnoreOnly);
        }
        return None;
    }

    if src_family == dst_family {
        return None;
    }

    match (src, dst) {
        (FamilyClass::Ignored, _) | (_, FamilyClass::Ignored) => {
            if sync2 {
                None
            } else {
                Some(QueueError::SrcOrDstMustBeIgnore)
            }
        }
        (FamilyClass::Special, FamilyClass::Special) => Some(QueueError::SrcAndDstBothValid),
        (FamilyClass::Valid, FamilyClass::Valid) => None,
        (FamilyClass::Valid, FamilyClass::Special) | (FamilyClass::Special, FamilyClass::Valid)
            if external =>
        {
            None
        }
        _ if external => Some(QueueError::SrcAndDstValidOrSpecial),
        _ => Some(QueueError::SrcAndDstBothValid),
    }
}

/// Role of a well-formed barrier in an ownership transfer,
/// as seen from a queue of `family`.
///
/// Concurrent resources never transfer ownership.
/// With an unknown recording family the role can't be decided and the barrier
/// is treated as a plain barrier.
pub fn ownership_role(
    src_family: u32,
    dst_family: u32,
    sharing: vk::SharingMode,
    family: Option<u32>,
    capabilities: &CapabilityContext,
) -> Ownership {
    if sharing == vk::SharingMode::CONCURRENT || src_family == dst_family {
        return Ownership::None;
    }
    let src = class(src_family, capabilities);
    let dst = class(dst_family, capabilities);
    if src == FamilyClass::Ignored || dst == FamilyClass::Ignored {
        return Ownership::None;
    }

    let release = Ownership::Release {
        src_family,
        dst_family,
    };
    let acquire = Ownership::Acquire {
        src_family,
        dst_family,
    };
    match family {
        Some(family) if family == src_family => release,
        Some(family) if family == dst_family => acquire,
        _ if dst == FamilyClass::Special => release,
        _ if src == FamilyClass::Special => acquire,
        _ => {
            log::debug!(
                "Transfer {} -> {} recorded for family {:?}, treated as plain barrier",
                src_family,
                dst_family,
                family
            );
            Ownership::None
        }
    }
}
