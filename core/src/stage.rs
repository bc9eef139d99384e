//! Pipeline stage masks.
//!
//! Alias bits (`ALL_COMMANDS`, `ALL_GRAPHICS`, `ALL_TRANSFER`, `VERTEX_INPUT`,
//! `PRE_RASTERIZATION_SHADERS`) expand to concrete stages here.
//! Legacy `TOP_OF_PIPE` and `BOTTOM_OF_PIPE` mean different things
//! in first and second synchronization scopes.

use crate::vk::{PipelineStageFlags2 as Stages, QueueFlags};

/// Logically ordered stages of primitive shading.
const PRIMITIVE_ORDER: &[Stages] = &[
    Stages::CONDITIONAL_RENDERING_EXT,
    Stages::DRAW_INDIRECT,
    Stages::INDEX_INPUT,
    Stages::VERTEX_ATTRIBUTE_INPUT,
    Stages::VERTEX_SHADER,
    Stages::TESSELLATION_CONTROL_SHADER,
    Stages::TESSELLATION_EVALUATION_SHADER,
    Stages::GEOMETRY_SHADER,
    Stages::TRANSFORM_FEEDBACK_EXT,
    Stages::FRAGMENT_SHADING_RATE_ATTACHMENT_KHR,
    Stages::FRAGMENT_DENSITY_PROCESS_EXT,
    Stages::EARLY_FRAGMENT_TESTS,
    Stages::FRAGMENT_SHADER,
    Stages::LATE_FRAGMENT_TESTS,
    Stages::COLOR_ATTACHMENT_OUTPUT,
];

/// Logically ordered stages of mesh shading.
const MESH_ORDER: &[Stages] = &[
    Stages::CONDITIONAL_RENDERING_EXT,
    Stages::DRAW_INDIRECT,
    Stages::TASK_SHADER_EXT,
    Stages::MESH_SHADER_EXT,
    Stages::FRAGMENT_SHADING_RATE_ATTACHMENT_KHR,
    Stages::FRAGMENT_DENSITY_PROCESS_EXT,
    Stages::EARLY_FRAGMENT_TESTS,
    Stages::FRAGMENT_SHADER,
    Stages::LATE_FRAGMENT_TESTS,
    Stages::COLOR_ATTACHMENT_OUTPUT,
];

const COMPUTE_ORDER: &[Stages] = &[
    Stages::CONDITIONAL_RENDERING_EXT,
    Stages::DRAW_INDIRECT,
    Stages::COMPUTE_SHADER,
];

const RAY_TRACING_ORDER: &[Stages] = &[Stages::DRAW_INDIRECT, Stages::RAY_TRACING_SHADER_KHR];

const ORDERS: &[&[Stages]] = &[PRIMITIVE_ORDER, MESH_ORDER, COMPUTE_ORDER, RAY_TRACING_ORDER];

/// Iterate over single stage bits, lowest first.
pub fn single_stages(stages: Stages) -> impl Iterator<Item = Stages> {
    crate::single_bits(stages.as_raw()).map(Stages::from_raw)
}

/// Bits that stand for sets of other bits.
pub fn alias_stages() -> Stages {
    Stages::ALL_COMMANDS
        | Stages::ALL_GRAPHICS
        | Stages::ALL_TRANSFER
        | Stages::VERTEX_INPUT
        | Stages::PRE_RASTERIZATION_SHADERS
}

/// Stages that execute shaders.
pub fn shader_stages() -> Stages {
    Stages::VERTEX_SHADER
        | Stages::TESSELLATION_CONTROL_SHADER
        | Stages::TESSELLATION_EVALUATION_SHADER
        | Stages::GEOMETRY_SHADER
        | Stages::FRAGMENT_SHADER
        | Stages::COMPUTE_SHADER
        | Stages::TASK_SHADER_EXT
        | Stages::MESH_SHADER_EXT
        | Stages::RAY_TRACING_SHADER_KHR
}

/// Concrete stages of `ALL_TRANSFER`.
pub fn transfer_stages() -> Stages {
    Stages::COPY | Stages::RESOLVE | Stages::BLIT | Stages::CLEAR
}

/// Concrete stages of `PRE_RASTERIZATION_SHADERS`.
pub fn pre_rasterization_stages() -> Stages {
    Stages::VERTEX_SHADER
        | Stages::TESSELLATION_CONTROL_SHADER
        | Stages::TESSELLATION_EVALUATION_SHADER
        | Stages::GEOMETRY_SHADER
        | Stages::TASK_SHADER_EXT
        | Stages::MESH_SHADER_EXT
}

/// Concrete stages of `ALL_GRAPHICS`.
pub fn graphics_stages() -> Stages {
    PRIMITIVE_ORDER
        .iter()
        .chain(MESH_ORDER.iter())
        .fold(Stages::empty(), |acc, &stage| acc | stage)
}

/// Concrete stages commands of a queue with `flags` can execute.
pub fn queue_stages(flags: QueueFlags) -> Stages {
    let mut stages = Stages::empty();
    if flags.intersects(QueueFlags::GRAPHICS | QueueFlags::COMPUTE | QueueFlags::TRANSFER) {
        stages |= transfer_stages();
    }
    if flags.intersects(QueueFlags::GRAPHICS | QueueFlags::COMPUTE) {
        stages |= Stages::DRAW_INDIRECT
            | Stages::CONDITIONAL_RENDERING_EXT
            | Stages::COMPUTE_SHADER
            | Stages::ACCELERATION_STRUCTURE_BUILD_KHR
            | Stages::RAY_TRACING_SHADER_KHR;
    }
    if flags.contains(QueueFlags::GRAPHICS) {
        stages |= graphics_stages();
    }
    stages
}

/// Stage bits, alias bits included, that may appear in masks
/// recorded for a queue with `flags`.
pub fn queue_allowed_stages(flags: QueueFlags) -> Stages {
    let mut stages = queue_stages(flags)
        | Stages::TOP_OF_PIPE
        | Stages::BOTTOM_OF_PIPE
        | Stages::HOST
        | Stages::ALL_COMMANDS
        | Stages::ALL_TRANSFER;
    if flags.contains(QueueFlags::GRAPHICS) {
        stages |= Stages::ALL_GRAPHICS | Stages::VERTEX_INPUT | Stages::PRE_RASTERIZATION_SHADERS;
    }
    stages
}

/// Replace alias bits with concrete stages.
/// `ALL_COMMANDS` and `ALL_GRAPHICS` are limited to `supported`.
pub fn expand(stages: Stages, supported: Stages) -> Stages {
    let mut expanded = stages & !alias_stages();
    if stages.contains(Stages::ALL_COMMANDS) {
        expanded |= supported;
    }
    if stages.contains(Stages::ALL_GRAPHICS) {
        expanded |= graphics_stages() & supported;
    }
    if stages.contains(Stages::ALL_TRANSFER) {
        expanded |= transfer_stages();
    }
    if stages.contains(Stages::VERTEX_INPUT) {
        expanded |= Stages::INDEX_INPUT | Stages::VERTEX_ATTRIBUTE_INPUT;
    }
    if stages.contains(Stages::PRE_RASTERIZATION_SHADERS) {
        expanded |= pre_rasterization_stages();
    }
    expanded
}

/// Add every stage logically earlier than any stage in `stages`.
pub fn with_earlier(stages: Stages) -> Stages {
    let mut result = stages;
    for order in ORDERS {
        if let Some(last) = order.iter().rposition(|&stage| stages.contains(stage)) {
            result |= order[..last].iter().fold(Stages::empty(), |acc, &s| acc | s);
        }
    }
    result
}

/// Add every stage logically later than any stage in `stages`.
pub fn with_later(stages: Stages) -> Stages {
    let mut result = stages;
    for order in ORDERS {
        if let Some(first) = order.iter().position(|&stage| stages.contains(stage)) {
            result |= order[first + 1..]
                .iter()
                .fold(Stages::empty(), |acc, &s| acc | s);
        }
    }
    result
}

/// Execution scope of a first synchronization scope.
/// `BOTTOM_OF_PIPE` means all commands, `TOP_OF_PIPE` means nothing.
pub fn src_execution(stages: Stages, supported: Stages) -> Stages {
    let mut exact = stages & !(Stages::TOP_OF_PIPE | Stages::BOTTOM_OF_PIPE);
    if stages.contains(Stages::BOTTOM_OF_PIPE) {
        exact |= Stages::ALL_COMMANDS;
    }
    with_earlier(expand(exact, supported))
}

/// Execution scope of a second synchronization scope.
/// `TOP_OF_PIPE` means all commands, `BOTTOM_OF_PIPE` means nothing.
pub fn dst_execution(stages: Stages, supported: Stages) -> Stages {
    let mut exact = stages & !(Stages::TOP_OF_PIPE | Stages::BOTTOM_OF_PIPE);
    if stages.contains(Stages::TOP_OF_PIPE) {
        exact |= Stages::ALL_COMMANDS;
    }
    with_later(expand(exact, supported))
}

/// Stages whose memory accesses belong to a memory access scope.
/// Unlike execution scopes these never extend to earlier or later stages.
pub fn access_stages(stages: Stages, supported: Stages) -> Stages {
    expand(
        stages & !(Stages::TOP_OF_PIPE | Stages::BOTTOM_OF_PIPE),
        supported,
    )
}
