use crate::{
    error::EngineFault,
    stage,
    vk::{PipelineStageFlags2 as Stages, QueueFlags},
};

bitflags::bitflags! {
    /// Optional device features and extensions that change validation outcomes.
    #[derive(Default)]
    #[cfg_attr(feature = "serde-1", derive(serde::Serialize, serde::Deserialize))]
    pub struct DeviceCapabilities: u32 {
        /// `synchronization2` feature.
        const SYNCHRONIZATION_2 = 1 << 0;
        /// `geometryShader` feature.
        const GEOMETRY_SHADER = 1 << 1;
        /// `tessellationShader` feature.
        const TESSELLATION_SHADER = 1 << 2;
        /// `conditionalRendering` feature.
        const CONDITIONAL_RENDERING = 1 << 3;
        /// `fragmentDensityMap` feature.
        const FRAGMENT_DENSITY_MAP = 1 << 4;
        /// `transformFeedback` feature.
        const TRANSFORM_FEEDBACK = 1 << 5;
        /// `meshShader` feature.
        const MESH_SHADER = 1 << 6;
        /// `taskShader` feature.
        const TASK_SHADER = 1 << 7;
        /// `attachmentFragmentShadingRate` feature.
        const ATTACHMENT_FRAGMENT_SHADING_RATE = 1 << 8;
        /// `shadingRateImage` feature of `VK_NV_shading_rate_image`.
        const SHADING_RATE_IMAGE_NV = 1 << 9;
        /// External memory, allows special queue families on concurrent resources.
        const EXTERNAL_MEMORY = 1 << 10;
    }
}

/// Feature gating a stage bit and its name.
/// `None` for stages every device supports.
pub fn stage_feature(stage: Stages) -> Option<(DeviceCapabilities, &'static str)> {
    let feature = match stage {
        Stages::GEOMETRY_SHADER => (DeviceCapabilities::GEOMETRY_SHADER, "geometryShader"),
        Stages::TESSELLATION_CONTROL_SHADER | Stages::TESSELLATION_EVALUATION_SHADER => (
            DeviceCapabilities::TESSELLATION_SHADER,
            "tessellationShader",
        ),
        Stages::CONDITIONAL_RENDERING_EXT => (
            DeviceCapabilities::CONDITIONAL_RENDERING,
            "conditionalRendering",
        ),
        Stages::FRAGMENT_DENSITY_PROCESS_EXT => (
            DeviceCapabilities::FRAGMENT_DENSITY_MAP,
            "fragmentDensity",
        ),
        Stages::TRANSFORM_FEEDBACK_EXT => {
            (DeviceCapabilities::TRANSFORM_FEEDBACK, "transformFeedback")
        }
        Stages::MESH_SHADER_EXT => (DeviceCapabilities::MESH_SHADER, "meshShader"),
        Stages::TASK_SHADER_EXT => (DeviceCapabilities::TASK_SHADER, "taskShader"),
        Stages::FRAGMENT_SHADING_RATE_ATTACHMENT_KHR => (
            DeviceCapabilities::ATTACHMENT_FRAGMENT_SHADING_RATE
                | DeviceCapabilities::SHADING_RATE_IMAGE_NV,
            "shadingRate",
        ),
        _ => return None,
    };
    Some(feature)
}

/// Read-only snapshot of device capabilities and queue families.
/// Supplied once per logical device.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CapabilityContext {
    capabilities: DeviceCapabilities,
    families: Vec<QueueFlags>,
}

impl CapabilityContext {
    /// Create context from enabled capabilities and the flags of each queue family.
    pub fn new(capabilities: DeviceCapabilities, families: Vec<QueueFlags>) -> Self {
        CapabilityContext {
            capabilities,
            families,
        }
    }

    /// Enabled capabilities.
    pub fn capabilities(&self) -> DeviceCapabilities {
        self.capabilities
    }

    /// Check if any of `capability` is enabled.
    pub fn enabled(&self, capability: DeviceCapabilities) -> bool {
        self.capabilities.intersects(capability)
    }

    /// Check if `synchronization2` is enabled.
    pub fn synchronization2(&self) -> bool {
        self.enabled(DeviceCapabilities::SYNCHRONIZATION_2)
    }

    /// Number of queue families.
    pub fn family_count(&self) -> u32 {
        self.families.len() as u32
    }

    /// Check if `family` indexes an existing queue family.
    pub fn is_valid_family(&self, family: u32) -> bool {
        (family as usize) < self.families.len()
    }

    /// Flags of the queue family.
    pub fn family_flags(&self, family: u32) -> Result<QueueFlags, EngineFault> {
        self.families
            .get(family as usize)
            .copied()
            .ok_or(EngineFault::UnknownQueueFamily(family))
    }

    /// Stages enabled on the device.
    /// Feature-gated stages whose feature is disabled are removed from `stages`.
    pub fn enabled_stages(&self, stages: Stages) -> Stages {
        crate::single_bits(stages.as_raw())
            .map(Stages::from_raw)
            .filter(|&bit| match stage_feature(bit) {
                Some((feature, _)) => self.enabled(feature),
                None => true,
            })
            .fold(Stages::empty(), |acc, bit| acc | bit)
    }

    /// Concrete stages available to queues of the family.
    /// This is what `ALL_COMMANDS` expands to.
    pub fn supported_stages(&self, family: u32) -> Result<Stages, EngineFault> {
        let flags = self.family_flags(family)?;
        Ok(self.enabled_stages(stage::queue_stages(flags)))
    }

    /// Concrete stages available to any queue of the device.
    pub fn device_stages(&self) -> Stages {
        let all = self
            .families
            .iter()
            .fold(Stages::empty(), |acc, &flags| acc | stage::queue_stages(flags));
        self.enabled_stages(all) | Stages::HOST
    }
}
