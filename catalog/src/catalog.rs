use {
    crate::{
        rule::{find, Entry, RuleId},
        tables,
        violation::{HazardClass, ImageError, OwnershipError, QueueError, SubmitError, Violation},
    },
    fnv::FnvHashMap,
    std::collections::BTreeSet,
    syncval_core::{
        access::DESCRIPTOR_BUFFER_READ,
        stage_feature,
        vk::{AccessFlags2 as Access, PipelineStageFlags2 as Stages},
        CapabilityContext, DeviceCapabilities, Location,
    },
};

/// Rule identifier shared by distinct table keys.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Alias {
    /// Shared identifier.
    pub rule: RuleId,

    /// Keys of the tables sharing it.
    pub keys: Vec<String>,
}

/// Immutable mapping from findings to rule identifiers.
///
/// Built once and queried read-only.
/// Capability-dependent choices read the context passed to each lookup.
#[derive(Debug)]
pub struct Catalog {
    stage_features: FnvHashMap<Stages, &'static [Entry]>,
    access_masks: FnvHashMap<Access, &'static [Entry]>,
    queue_errors: FnvHashMap<QueueError, &'static [Entry]>,
    image_errors: FnvHashMap<ImageError, &'static [Entry]>,
    submit_errors: FnvHashMap<SubmitError, &'static [Entry]>,
}

impl Default for Catalog {
    fn default() -> Self {
        Catalog::new()
    }
}

impl Catalog {
    /// Build catalog from the rule tables.
    pub fn new() -> Self {
        let stage_features = [
            (Stages::CONDITIONAL_RENDERING_EXT, tables::CONDITIONAL_RENDERING),
            (Stages::FRAGMENT_DENSITY_PROCESS_EXT, tables::FRAGMENT_DENSITY_PROCESS),
            (Stages::GEOMETRY_SHADER, tables::GEOMETRY_SHADER),
            (Stages::MESH_SHADER_EXT, tables::MESH_SHADER),
            (Stages::TASK_SHADER_EXT, tables::TASK_SHADER),
            (Stages::TESSELLATION_CONTROL_SHADER, tables::TESSELLATION_CONTROL_SHADER),
            (Stages::TESSELLATION_EVALUATION_SHADER, tables::TESSELLATION_EVALUATION_SHADER),
            (Stages::TRANSFORM_FEEDBACK_EXT, tables::TRANSFORM_FEEDBACK),
        ]
        .iter()
        .cloned()
        .collect();

        let access_masks = [
            (Access::INDIRECT_COMMAND_READ, tables::INDIRECT_COMMAND_READ),
            (Access::INDEX_READ, tables::INDEX_READ),
            (Access::VERTEX_ATTRIBUTE_READ, tables::VERTEX_ATTRIBUTE_READ),
            (Access::INPUT_ATTACHMENT_READ, tables::INPUT_ATTACHMENT_READ),
            (Access::UNIFORM_READ, tables::UNIFORM_READ),
            (Access::SHADER_SAMPLED_READ, tables::SHADER_SAMPLED_READ),
            (Access::SHADER_STORAGE_READ, tables::SHADER_STORAGE_READ),
            (Access::SHADER_STORAGE_WRITE, tables::SHADER_STORAGE_WRITE),
            (Access::SHADER_READ, tables::SHADER_READ),
            (Access::SHADER_WRITE, tables::SHADER_WRITE),
            (Access::COLOR_ATTACHMENT_READ, tables::COLOR_ATTACHMENT_READ),
            (Access::COLOR_ATTACHMENT_WRITE, tables::COLOR_ATTACHMENT_WRITE),
            (Access::DEPTH_STENCIL_ATTACHMENT_READ, tables::DEPTH_STENCIL_ATTACHMENT_READ),
            (Access::DEPTH_STENCIL_ATTACHMENT_WRITE, tables::DEPTH_STENCIL_ATTACHMENT_WRITE),
            (Access::TRANSFER_READ, tables::TRANSFER_READ),
            (Access::TRANSFER_WRITE, tables::TRANSFER_WRITE),
            (Access::HOST_READ, tables::HOST_READ),
            (Access::HOST_WRITE, tables::HOST_WRITE),
            (Access::CONDITIONAL_RENDERING_READ_EXT, tables::CONDITIONAL_RENDERING_READ),
            (Access::FRAGMENT_DENSITY_MAP_READ_EXT, tables::FRAGMENT_DENSITY_MAP_READ),
            (Access::TRANSFORM_FEEDBACK_WRITE_EXT, tables::TRANSFORM_FEEDBACK_WRITE),
            (Access::TRANSFORM_FEEDBACK_COUNTER_READ_EXT, tables::TRANSFORM_FEEDBACK_COUNTER_READ),
            (Access::TRANSFORM_FEEDBACK_COUNTER_WRITE_EXT, tables::TRANSFORM_FEEDBACK_COUNTER_WRITE),
            (
                Access::FRAGMENT_SHADING_RATE_ATTACHMENT_READ_KHR,
                tables::FRAGMENT_SHADING_RATE_ATTACHMENT_READ,
            ),
            (Access::ACCELERATION_STRUCTURE_READ_KHR, tables::ACCELERATION_STRUCTURE_READ),
            (Access::ACCELERATION_STRUCTURE_WRITE_KHR, tables::ACCELERATION_STRUCTURE_WRITE),
            (DESCRIPTOR_BUFFER_READ, tables::DESCRIPTOR_BUFFER_READ),
        ]
        .iter()
        .cloned()
        .collect();

        let queue_errors = [
            (QueueError::SrcOrDstMustBeIgnore, tables::SRC_OR_DST_MUST_BE_IGNORE),
            (QueueError::SpecialOrIgnoreOnly, tables::SPECIAL_OR_IGNORE_ONLY),
            (QueueError::SrcAndDstValidOrSpecial, tables::SRC_AND_DST_VALID_OR_SPECIAL),
            (QueueError::SrcAndDstMustBeIgnore, tables::SRC_AND_DST_MUST_BE_IGNORE),
            (QueueError::SrcAndDstBothValid, tables::SRC_AND_DST_BOTH_VALID),
        ]
        .iter()
        .cloned()
        .collect();

        let image_errors = [
            (ImageError::ConflictingLayout, tables::CONFLICTING_LAYOUT),
            (ImageError::RenderPassLayoutChange, tables::RENDER_PASS_LAYOUT_CHANGE),
        ]
        .iter()
        .cloned()
        .collect();

        let submit_errors = [
            (SubmitError::BinaryCannotBeSignalled, tables::BINARY_CANNOT_BE_SIGNALLED),
            (SubmitError::SemAlreadySignalled, tables::SEM_ALREADY_SIGNALLED),
            (SubmitError::OtherQueueWaiting, tables::OTHER_QUEUE_WAITING),
            (SubmitError::HostStageMask, tables::HOST_STAGE_MASK),
            (SubmitError::CmdNotSimultaneous, tables::CMD_NOT_SIMULTANEOUS),
            (SubmitError::ReusedOneTimeCmd, tables::REUSED_ONE_TIME_CMD),
            (
                SubmitError::SecondaryCmdNotSimultaneous,
                tables::SECONDARY_CMD_NOT_SIMULTANEOUS,
            ),
            (SubmitError::CmdWrongQueueFamily, tables::CMD_WRONG_QUEUE_FAMILY),
            (SubmitError::SecondaryCmdInSubmit, tables::SECONDARY_CMD_IN_SUBMIT),
        ]
        .iter()
        .cloned()
        .collect();

        Catalog {
            stage_features,
            access_masks,
            queue_errors,
            image_errors,
            submit_errors,
        }
    }

    /// Rule identifier for the violation at the call site.
    ///
    /// Returns `RuleId::UNCLASSIFIED` if no entry matches.
    pub fn identify(
        &self,
        violation: Violation,
        location: &Location,
        capabilities: &CapabilityContext,
    ) -> RuleId {
        let rule = match violation {
            Violation::StageFeature(Stages::NONE) => {
                let table = if capabilities.synchronization2() {
                    tables::NONE_WITH_SYNC2
                } else {
                    tables::NONE_WITHOUT_SYNC2
                };
                find(table, location)
            }
            Violation::StageFeature(Stages::FRAGMENT_SHADING_RATE_ATTACHMENT_KHR) => {
                let table = if capabilities.enabled(DeviceCapabilities::SHADING_RATE_IMAGE_NV) {
                    tables::SHADING_RATE_KHR_AND_NV
                } else {
                    tables::SHADING_RATE_KHR
                };
                find(table, location)
            }
            Violation::StageFeature(stage) => lookup(&self.stage_features, &stage, location),
            Violation::AccessStage(access) => lookup(&self.access_masks, &access, location)
                .or_else(|| find(tables::FINE_SYNC_COMMON, location)),
            Violation::QueueCapability(_) => find(tables::QUEUE_CAPABILITY, location),
            Violation::QueueTransfer(error) => lookup(&self.queue_errors, &error, location),
            Violation::Image(error) => lookup(&self.image_errors, &error, location),
            Violation::Submit(error) => lookup(&self.submit_errors, &error, location),
            Violation::Hazard(class) => Some(hazard_rule(class)),
            Violation::Ownership(error) => Some(ownership_rule(error)),
        };

        rule.unwrap_or_else(|| {
            log::error!("No rule for {:?} at {}", violation, location);
            RuleId::UNCLASSIFIED
        })
    }

    /// Human readable text for the violation.
    pub fn describe(&self, violation: Violation) -> String {
        match violation {
            Violation::StageFeature(Stages::NONE) => {
                "NONE stage is not allowed in this stage mask".to_owned()
            }
            Violation::StageFeature(stage) => match stage_feature(stage) {
                Some((_, feature)) => {
                    format!("{:?} requires the {} feature to be enabled", stage, feature)
                }
                None => format!("{:?} is not enabled on the device", stage),
            },
            Violation::AccessStage(access) => format!(
                "{:?} is not supported by any stage of the stage mask",
                access
            ),
            Violation::QueueCapability(stage) => format!(
                "{:?} is not supported by the queue family of the command buffer",
                stage
            ),
            Violation::QueueTransfer(error) => error.summary().to_owned(),
            Violation::Image(ImageError::ConflictingLayout) => {
                "Old layout doesn't match the current layout of the subresource".to_owned()
            }
            Violation::Image(ImageError::RenderPassLayoutChange) => {
                "Image layout can't change inside a render pass instance".to_owned()
            }
            Violation::Submit(SubmitError::BinaryCannotBeSignalled) => {
                "Binary semaphore is waited on without a pending signal".to_owned()
            }
            Violation::Submit(SubmitError::SemAlreadySignalled) => {
                "Binary semaphore is signalled while a signal is already pending".to_owned()
            }
            Violation::Submit(SubmitError::OtherQueueWaiting) => {
                "Another queue already waits on the semaphore".to_owned()
            }
            Violation::Submit(SubmitError::HostStageMask) => {
                "HOST stage is not allowed in this stage mask".to_owned()
            }
            Violation::Submit(SubmitError::CmdNotSimultaneous) => {
                "Command buffer is pending without simultaneous use".to_owned()
            }
            Violation::Submit(SubmitError::ReusedOneTimeCmd) => {
                "One-time submit command buffer is submitted again".to_owned()
            }
            Violation::Submit(SubmitError::SecondaryCmdNotSimultaneous) => {
                "Secondary command buffer without simultaneous use is executed more than once".to_owned()
            }
            Violation::Submit(SubmitError::CmdWrongQueueFamily) => {
                "Command buffer was allocated for another queue family".to_owned()
            }
            Violation::Submit(SubmitError::SecondaryCmdInSubmit) => {
                "Secondary command buffer can't be submitted to a queue".to_owned()
            }
            Violation::Hazard(class) => format!("{:?} hazard", class),
            Violation::Ownership(OwnershipError::MissingAcquire) => {
                "Range is accessed after a queue family release without the matching acquire"
                    .to_owned()
            }
            Violation::Ownership(OwnershipError::MissingRelease) => {
                "Queue family acquire has no matching release".to_owned()
            }
        }
    }

    /// Identifiers that appear under more than one key of the
    /// stage and access tables.
    pub fn aliased_rule_ids(&self) -> Vec<Alias> {
        let mut by_rule: FnvHashMap<RuleId, BTreeSet<String>> = FnvHashMap::default();
        let mut collect = |key: String, entries: &[Entry]| {
            for entry in entries {
                by_rule.entry(entry.rule).or_default().insert(key.clone());
            }
        };

        for (stage, entries) in &self.stage_features {
            collect(format!("{:?}", stage), entries);
        }
        collect("NONE with synchronization2".to_owned(), tables::NONE_WITH_SYNC2);
        collect("NONE without synchronization2".to_owned(), tables::NONE_WITHOUT_SYNC2);
        collect("shading rate KHR".to_owned(), tables::SHADING_RATE_KHR);
        collect("shading rate KHR and NV".to_owned(), tables::SHADING_RATE_KHR_AND_NV);
        for (access, entries) in &self.access_masks {
            collect(format!("{:?}", access), entries);
        }

        let mut aliases: Vec<_> = by_rule
            .into_iter()
            .filter(|(_, keys)| keys.len() > 1)
            .map(|(rule, keys)| Alias {
                rule,
                keys: keys.into_iter().collect(),
            })
            .collect();
        aliases.sort_by_key(|alias| alias.rule);
        aliases
    }
}

fn lookup<K>(map: &FnvHashMap<K, &'static [Entry]>, key: &K, location: &Location) -> Option<RuleId>
where
    K: std::hash::Hash + Eq,
{
    map.get(key).and_then(|entries| find(entries, location))
}

fn hazard_rule(class: HazardClass) -> RuleId {
    RuleId::new(match class {
        HazardClass::ReadAfterWrite => "SYNC-HAZARD-READ-AFTER-WRITE",
        HazardClass::WriteAfterRead => "SYNC-HAZARD-WRITE-AFTER-READ",
        HazardClass::WriteAfterWrite => "SYNC-HAZARD-WRITE-AFTER-WRITE",
        HazardClass::ReadRacingWrite => "SYNC-HAZARD-READ-RACING-WRITE",
        HazardClass::WriteRacingRead => "SYNC-HAZARD-WRITE-RACING-READ",
        HazardClass::WriteRacingWrite => "SYNC-HAZARD-WRITE-RACING-WRITE",
    })
}

fn ownership_rule(error: OwnershipError) -> RuleId {
    RuleId::new(match error {
        OwnershipError::MissingAcquire => "UNASSIGNED-SyncVal-ownership-transfer-missing-acquire",
        OwnershipError::MissingRelease => "UNASSIGNED-SyncVal-ownership-transfer-missing-release",
    })
}

lazy_static::lazy_static! {
    static ref SHARED: Catalog = Catalog::new();
}

/// Shared catalog instance.
pub fn shared() -> &'static Catalog {
    &SHARED
}
