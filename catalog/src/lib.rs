//! Diagnostics catalog.
//!
//! Maps a finding and its call site to a stable rule identifier.
//! Tables are immutable and every lookup takes the capability context explicitly.

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

mod catalog;
mod rule;
mod tables;
mod violation;

pub use crate::{
    catalog::{shared, Alias, Catalog},
    rule::{find, Entry, Key, RuleId},
    violation::{HazardClass, ImageError, OwnershipError, QueueError, SubmitError, Violation},
};

#[cfg(test)]
mod tests {
    use {
        super::*,
        syncval_core::{
            vk::{AccessFlags2 as Access, PipelineStageFlags2 as Stages, QueueFlags},
            CapabilityContext, DeviceCapabilities, Field, Func, Location, Struct,
        },
    };

    fn context(capabilities: DeviceCapabilities) -> CapabilityContext {
        CapabilityContext::new(capabilities, vec![QueueFlags::GRAPHICS])
    }

    fn legacy_src() -> Location {
        Location::new(Func::CmdPipelineBarrier).with_field(Field::SrcStageMask)
    }

    #[test]
    fn none_stage_depends_on_sync2() {
        let catalog = Catalog::new();
        let violation = Violation::StageFeature(Stages::NONE);
        assert_eq!(
            catalog
                .identify(violation, &legacy_src(), &context(DeviceCapabilities::empty()))
                .as_str(),
            "VUID-vkCmdPipelineBarrier-srcStageMask-04996"
        );
        assert_eq!(
            catalog
                .identify(
                    violation,
                    &legacy_src(),
                    &context(DeviceCapabilities::SYNCHRONIZATION_2)
                )
                .as_str(),
            "VUID-vkCmdPipelineBarrier-srcStageMask-03937"
        );
    }

    #[test]
    fn shading_rate_prefers_nv_table() {
        let catalog = Catalog::new();
        let violation = Violation::StageFeature(Stages::FRAGMENT_SHADING_RATE_ATTACHMENT_KHR);
        let location = Location::new(Func::CmdPipelineBarrier2)
            .with_struct(Struct::MemoryBarrier2)
            .with_field(Field::DstStageMask);
        assert_eq!(
            catalog
                .identify(violation, &location, &context(DeviceCapabilities::empty()))
                .as_str(),
            "VUID-VkMemoryBarrier2-dstStageMask-07317"
        );
        assert_eq!(
            catalog
                .identify(
                    violation,
                    &location,
                    &context(
                        DeviceCapabilities::ATTACHMENT_FRAGMENT_SHADING_RATE
                            | DeviceCapabilities::SHADING_RATE_IMAGE_NV
                    )
                )
                .as_str(),
            "VUID-VkMemoryBarrier2-dstStageMask-07316"
        );
    }

    #[test]
    fn feature_stage_by_location() {
        let catalog = Catalog::new();
        let location = Location::new(Func::CmdWriteTimestamp).with_field(Field::PipelineStage);
        assert_eq!(
            catalog
                .identify(
                    Violation::StageFeature(Stages::GEOMETRY_SHADER),
                    &location,
                    &context(DeviceCapabilities::empty())
                )
                .as_str(),
            "VUID-vkCmdWriteTimestamp-pipelineStage-04075"
        );
    }

    #[test]
    fn access_falls_back_to_fine_sync() {
        let catalog = Catalog::new();
        let location = Location::new(Func::CmdPipelineBarrier).with_field(Field::DstAccessMask);
        assert_eq!(
            catalog
                .identify(
                    Violation::AccessStage(Access::TRANSFER_WRITE),
                    &location,
                    &context(DeviceCapabilities::empty())
                )
                .as_str(),
            "VUID-vkCmdPipelineBarrier-dstAccessMask-02816"
        );

        let location = Location::new(Func::CmdPipelineBarrier2)
            .with_struct(Struct::BufferMemoryBarrier2)
            .with_field(Field::SrcAccessMask);
        assert_eq!(
            catalog
                .identify(
                    Violation::AccessStage(Access::TRANSFER_WRITE),
                    &location,
                    &context(DeviceCapabilities::empty())
                )
                .as_str(),
            "VUID-VkBufferMemoryBarrier2-srcAccessMask-03915"
        );
    }

    #[test]
    fn queue_transfer_by_structure() {
        let catalog = Catalog::new();
        let location = Location::new(Func::CmdPipelineBarrier2)
            .with_struct(Struct::ImageMemoryBarrier2)
            .with_field(Field::SrcQueueFamilyIndex);
        let rule = catalog.identify(
            Violation::QueueTransfer(QueueError::SrcAndDstBothValid),
            &location,
            &context(DeviceCapabilities::SYNCHRONIZATION_2),
        );
        assert_eq!(rule.as_str(), "VUID-VkImageMemoryBarrier2-image-04069");
    }

    #[test]
    fn unmatched_location_is_unclassified() {
        let catalog = Catalog::new();
        let rule = catalog.identify(
            Violation::QueueTransfer(QueueError::SrcOrDstMustBeIgnore),
            &Location::new(Func::CmdPipelineBarrier2).with_struct(Struct::BufferMemoryBarrier2),
            &context(DeviceCapabilities::SYNCHRONIZATION_2),
        );
        assert_eq!(rule, RuleId::UNCLASSIFIED);
        assert!(!rule.is_classified());
    }

    #[test]
    fn hazards_ignore_location() {
        let rule = shared().identify(
            Violation::Hazard(HazardClass::WriteAfterWrite.racing()),
            &Location::new(Func::QueueSubmit),
            &context(DeviceCapabilities::empty()),
        );
        assert_eq!(rule.as_str(), "SYNC-HAZARD-WRITE-RACING-WRITE");
    }

    #[test]
    fn command_buffer_submit_rules_follow_entry_point() {
        let catalog = Catalog::new();
        let legacy = Location::new(Func::QueueSubmit)
            .with_struct(Struct::SubmitInfo)
            .with_field(Field::PCommandBuffers);
        let sync2 = Location::new(Func::QueueSubmit2)
            .with_struct(Struct::CommandBufferSubmitInfo)
            .with_field(Field::CommandBuffer);
        let caps = context(DeviceCapabilities::SYNCHRONIZATION_2);

        let cases = [
            (
                SubmitError::ReusedOneTimeCmd,
                "VUID-vkQueueSubmit-pCommandBuffers-00072",
                "VUID-vkQueueSubmit2-commandBuffer-03876",
            ),
            (
                SubmitError::CmdNotSimultaneous,
                "VUID-vkQueueSubmit-pCommandBuffers-00071",
                "VUID-vkQueueSubmit2-commandBuffer-03875",
            ),
            (
                SubmitError::SecondaryCmdNotSimultaneous,
                "VUID-vkQueueSubmit-pCommandBuffers-00073",
                "VUID-vkQueueSubmit2-commandBuffer-03877",
            ),
            (
                SubmitError::CmdWrongQueueFamily,
                "VUID-vkQueueSubmit-pCommandBuffers-00074",
                "VUID-vkQueueSubmit2-commandBuffer-03878",
            ),
            (
                SubmitError::SecondaryCmdInSubmit,
                "VUID-VkSubmitInfo-pCommandBuffers-00075",
                "VUID-VkCommandBufferSubmitInfo-commandBuffer-03890",
            ),
        ];
        for &(error, old, new) in &cases {
            let violation = Violation::Submit(error);
            assert_eq!(catalog.identify(violation, &legacy, &caps).as_str(), old);
            assert_eq!(catalog.identify(violation, &sync2, &caps).as_str(), new);
            assert!(!catalog.describe(violation).is_empty());
        }
    }

    #[test]
    fn aliases_are_reported() {
        let aliases = Catalog::new().aliased_rule_ids();
        let find = |rule: &str| aliases.iter().find(|alias| alias.rule.as_str() == rule);

        let tessellation = find("VUID-vkCmdPipelineBarrier-srcStageMask-04091")
            .expect("tessellation stages share identifiers");
        assert_eq!(tessellation.keys.len(), 2);

        assert!(find("VUID-vkCmdWriteTimestamp-pipelineStage-04080").is_some());
        assert!(find("VUID-VkMemoryBarrier2-srcAccessMask-03920").is_some());
        assert!(find("VUID-vkCmdPipelineBarrier-srcStageMask-04090").is_none());
    }
}
