//! Memory access masks.

use crate::{
    stage::{shader_stages, transfer_stages},
    vk::{AccessFlags2 as Access, PipelineStageFlags2 as Stages},
};

/// Descriptor buffer reads from `VK_EXT_descriptor_buffer`.
pub const DESCRIPTOR_BUFFER_READ: Access = Access::from_raw(0x0000_0200_0000_0000);

/// Iterate over single access bits, lowest first.
pub fn single_accesses(access: Access) -> impl Iterator<Item = Access> {
    crate::single_bits(access.as_raw()).map(Access::from_raw)
}

/// Every concrete read access bit.
pub fn read_bits() -> Access {
    Access::INDIRECT_COMMAND_READ
        | Access::INDEX_READ
        | Access::VERTEX_ATTRIBUTE_READ
        | Access::UNIFORM_READ
        | Access::INPUT_ATTACHMENT_READ
        | Access::SHADER_SAMPLED_READ
        | Access::SHADER_STORAGE_READ
        | Access::COLOR_ATTACHMENT_READ
        | Access::DEPTH_STENCIL_ATTACHMENT_READ
        | Access::TRANSFER_READ
        | Access::HOST_READ
        | Access::TRANSFORM_FEEDBACK_COUNTER_READ_EXT
        | Access::CONDITIONAL_RENDERING_READ_EXT
        | Access::FRAGMENT_SHADING_RATE_ATTACHMENT_READ_KHR
        | Access::FRAGMENT_DENSITY_MAP_READ_EXT
        | Access::ACCELERATION_STRUCTURE_READ_KHR
        | DESCRIPTOR_BUFFER_READ
}

/// Every concrete write access bit.
pub fn write_bits() -> Access {
    Access::SHADER_STORAGE_WRITE
        | Access::COLOR_ATTACHMENT_WRITE
        | Access::DEPTH_STENCIL_ATTACHMENT_WRITE
        | Access::TRANSFER_WRITE
        | Access::HOST_WRITE
        | Access::TRANSFORM_FEEDBACK_WRITE_EXT
        | Access::TRANSFORM_FEEDBACK_COUNTER_WRITE_EXT
        | Access::ACCELERATION_STRUCTURE_WRITE_KHR
}

/// Replace alias bits (`MEMORY_*`, `SHADER_*`) with concrete bits.
pub fn expand(access: Access) -> Access {
    let mut expanded = access
        & !(Access::MEMORY_READ | Access::MEMORY_WRITE | Access::SHADER_READ | Access::SHADER_WRITE);
    if access.contains(Access::MEMORY_READ) {
        expanded |= read_bits();
    }
    if access.contains(Access::MEMORY_WRITE) {
        expanded |= write_bits();
    }
    if access.contains(Access::SHADER_READ) {
        expanded |= Access::SHADER_SAMPLED_READ | Access::SHADER_STORAGE_READ;
    }
    if access.contains(Access::SHADER_WRITE) {
        expanded |= Access::SHADER_STORAGE_WRITE;
    }
    expanded
}

/// Check if mask contains any write.
pub fn is_write(access: Access) -> bool {
    expand(access).intersects(write_bits())
}

/// Check if mask contains any read.
pub fn is_read(access: Access) -> bool {
    expand(access).intersects(read_bits())
}

/// Single access bits paired with the stages able to perform them.
fn supported_table() -> [(Access, Stages); 29] {
    let shaders = shader_stages();
    let fragment_tests = Stages::EARLY_FRAGMENT_TESTS | Stages::LATE_FRAGMENT_TESTS;
    [
        (
            Access::INDIRECT_COMMAND_READ,
            Stages::DRAW_INDIRECT | Stages::ACCELERATION_STRUCTURE_BUILD_KHR,
        ),
        (Access::INDEX_READ, Stages::INDEX_INPUT),
        (Access::VERTEX_ATTRIBUTE_READ, Stages::VERTEX_ATTRIBUTE_INPUT),
        (Access::UNIFORM_READ, shaders),
        (Access::INPUT_ATTACHMENT_READ, Stages::FRAGMENT_SHADER),
        (Access::SHADER_READ, shaders | Stages::ACCELERATION_STRUCTURE_BUILD_KHR),
        (Access::SHADER_WRITE, shaders),
        (Access::SHADER_SAMPLED_READ, shaders),
        (Access::SHADER_STORAGE_READ, shaders),
        (Access::SHADER_STORAGE_WRITE, shaders),
        (Access::COLOR_ATTACHMENT_READ, Stages::COLOR_ATTACHMENT_OUTPUT),
        (Access::COLOR_ATTACHMENT_WRITE, Stages::COLOR_ATTACHMENT_OUTPUT),
        (Access::DEPTH_STENCIL_ATTACHMENT_READ, fragment_tests),
        (Access::DEPTH_STENCIL_ATTACHMENT_WRITE, fragment_tests),
        (
            Access::TRANSFER_READ,
            transfer_stages() | Stages::ACCELERATION_STRUCTURE_BUILD_KHR,
        ),
        (
            Access::TRANSFER_WRITE,
            transfer_stages() | Stages::ACCELERATION_STRUCTURE_BUILD_KHR,
        ),
        (Access::HOST_READ, Stages::HOST),
        (Access::HOST_WRITE, Stages::HOST),
        (Access::MEMORY_READ, Stages::from_raw(!0)),
        (Access::MEMORY_WRITE, Stages::from_raw(!0)),
        (Access::TRANSFORM_FEEDBACK_WRITE_EXT, Stages::TRANSFORM_FEEDBACK_EXT),
        (
            Access::TRANSFORM_FEEDBACK_COUNTER_READ_EXT,
            Stages::TRANSFORM_FEEDBACK_EXT | Stages::DRAW_INDIRECT,
        ),
        (
            Access::TRANSFORM_FEEDBACK_COUNTER_WRITE_EXT,
            Stages::TRANSFORM_FEEDBACK_EXT,
        ),
        (
            Access::CONDITIONAL_RENDERING_READ_EXT,
            Stages::CONDITIONAL_RENDERING_EXT,
        ),
        (
            Access::FRAGMENT_SHADING_RATE_ATTACHMENT_READ_KHR,
            Stages::FRAGMENT_SHADING_RATE_ATTACHMENT_KHR,
        ),
        (
            Access::FRAGMENT_DENSITY_MAP_READ_EXT,
            Stages::FRAGMENT_DENSITY_PROCESS_EXT,
        ),
        (
            Access::ACCELERATION_STRUCTURE_READ_KHR,
            shaders | Stages::ACCELERATION_STRUCTURE_BUILD_KHR,
        ),
        (
            Access::ACCELERATION_STRUCTURE_WRITE_KHR,
            Stages::ACCELERATION_STRUCTURE_BUILD_KHR,
        ),
        (DESCRIPTOR_BUFFER_READ, shaders),
    ]
}

/// Stages that can perform any access of `access`.
/// Unknown bits are treated as performable by every stage.
pub fn supported_stages(access: Access) -> Stages {
    let mut known = Access::empty();
    let mut stages = Stages::empty();
    for &(bit, supported) in supported_table().iter() {
        if access.intersects(bit) {
            known |= bit;
            stages |= supported;
        }
    }
    if !(access & !known).is_empty() {
        stages = Stages::from_raw(!0);
    }
    stages
}

/// Access bits of `access` that no stage of `stages` can perform.
pub fn unsupported_bits(access: Access, stages: Stages) -> Access {
    crate::single_bits(access.as_raw())
        .map(Access::from_raw)
        .filter(|&bit| !supported_stages(bit).intersects(stages))
        .fold(Access::empty(), |acc, bit| acc | bit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_write_is_write() {
        assert!(is_write(Access::MEMORY_WRITE));
        assert!(!is_write(Access::MEMORY_READ));
        assert!(is_read(Access::MEMORY_READ));
        assert!(expand(Access::SHADER_WRITE).contains(Access::SHADER_STORAGE_WRITE));
    }

    #[test]
    fn transfer_write_needs_transfer_stage() {
        assert_eq!(
            unsupported_bits(Access::TRANSFER_WRITE, Stages::FRAGMENT_SHADER),
            Access::TRANSFER_WRITE
        );
        assert!(unsupported_bits(Access::TRANSFER_WRITE, Stages::COPY).is_empty());
        assert!(unsupported_bits(Access::MEMORY_WRITE, Stages::FRAGMENT_SHADER).is_empty());
    }
}
