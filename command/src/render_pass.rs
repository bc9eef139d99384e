//! Render pass model.
//!
//! Attachments change layout at subpass boundaries and at the end of the render pass instance.
//! These transitions, load and store operations are ordered by subpass dependencies,
//! including the implicit external ones.

use {
    syncval_chain::{Analyzer, Barrier, BarrierContext, Dependency, StageSide},
    syncval_core::{
        vk::{self, AccessFlags2 as Access, PipelineStageFlags2 as Stages},
        EngineFault, Field, Func, QueueId, SyncScope, Tag,
    },
    syncval_resource::Hazard,
};

/// Accesses attachments receive inside a render pass instance.
pub(crate) fn attachment_access() -> Access {
    Access::INPUT_ATTACHMENT_READ
        | Access::COLOR_ATTACHMENT_READ
        | Access::COLOR_ATTACHMENT_WRITE
        | Access::DEPTH_STENCIL_ATTACHMENT_READ
        | Access::DEPTH_STENCIL_ATTACHMENT_WRITE
}

/// Stages rasterization order applies to.
pub(crate) fn attachment_stages() -> Stages {
    Stages::COLOR_ATTACHMENT_OUTPUT
        | Stages::EARLY_FRAGMENT_TESTS
        | Stages::LATE_FRAGMENT_TESTS
}

fn implicit_into() -> (SyncScope, SyncScope) {
    (
        SyncScope::new(Stages::TOP_OF_PIPE, Access::NONE),
        SyncScope::new(Stages::ALL_COMMANDS, attachment_access()),
    )
}

fn implicit_out_of() -> (SyncScope, SyncScope) {
    (
        SyncScope::new(Stages::ALL_COMMANDS, attachment_access()),
        SyncScope::new(Stages::BOTTOM_OF_PIPE, Access::NONE),
    )
}

fn is_depth_stencil(aspects: vk::ImageAspectFlags) -> bool {
    aspects.intersects(vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL)
}

/// Attachment of a render pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttachmentDescription {
    /// Layout the attachment is expected to be in when the render pass instance begins.
    pub initial_layout: vk::ImageLayout,

    /// Layout the attachment is transitioned to when the render pass instance ends.
    pub final_layout: vk::ImageLayout,

    /// Operation on the first use.
    pub load_op: vk::AttachmentLoadOp,

    /// Operation on the last use.
    pub store_op: vk::AttachmentStoreOp,
}

impl AttachmentDescription {
    /// Attachment that is loaded and stored.
    pub fn new(initial_layout: vk::ImageLayout, final_layout: vk::ImageLayout) -> Self {
        AttachmentDescription {
            initial_layout,
            final_layout,
            load_op: vk::AttachmentLoadOp::LOAD,
            store_op: vk::AttachmentStoreOp::STORE,
        }
    }

    /// Replace load and store operations.
    pub fn with_ops(mut self, load_op: vk::AttachmentLoadOp, store_op: vk::AttachmentStoreOp) -> Self {
        self.load_op = load_op;
        self.store_op = store_op;
        self
    }

    /// Access performed by the load operation on an attachment with `aspects`.
    pub fn load_access(&self, aspects: vk::ImageAspectFlags) -> Option<SyncScope> {
        let depth_stencil = is_depth_stencil(aspects);
        let stages = if depth_stencil {
            Stages::EARLY_FRAGMENT_TESTS
        } else {
            Stages::COLOR_ATTACHMENT_OUTPUT
        };
        let access = match (self.load_op, depth_stencil) {
            (vk::AttachmentLoadOp::LOAD, false) => Access::COLOR_ATTACHMENT_READ,
            (vk::AttachmentLoadOp::LOAD, true) => Access::DEPTH_STENCIL_ATTACHMENT_READ,
            (vk::AttachmentLoadOp::CLEAR, false) | (vk::AttachmentLoadOp::DONT_CARE, false) => {
                Access::COLOR_ATTACHMENT_WRITE
            }
            (vk::AttachmentLoadOp::CLEAR, true) | (vk::AttachmentLoadOp::DONT_CARE, true) => {
                Access::DEPTH_STENCIL_ATTACHMENT_WRITE
            }
            _ => return None,
        };
        Some(SyncScope::new(stages, access))
    }

    /// Access performed by the store operation on an attachment with `aspects`.
    pub fn store_access(&self, aspects: vk::ImageAspectFlags) -> Option<SyncScope> {
        match self.store_op {
            vk::AttachmentStoreOp::STORE | vk::AttachmentStoreOp::DONT_CARE => {}
            _ => return None,
        }
        Some(if is_depth_stencil(aspects) {
            SyncScope::new(
                Stages::LATE_FRAGMENT_TESTS,
                Access::DEPTH_STENCIL_ATTACHMENT_WRITE,
            )
        } else {
            SyncScope::new(Stages::COLOR_ATTACHMENT_OUTPUT, Access::COLOR_ATTACHMENT_WRITE)
        })
    }
}

/// Use of an attachment by a subpass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttachmentReference {
    /// Attachment index or `vk::ATTACHMENT_UNUSED`.
    pub attachment: u32,

    /// Layout during the subpass.
    pub layout: vk::ImageLayout,
}

/// Attachments used by a subpass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubpassDescription {
    /// Input attachments.
    pub input: Vec<AttachmentReference>,

    /// Color attachments.
    pub color: Vec<AttachmentReference>,

    /// Resolve attachments.
    pub resolve: Vec<AttachmentReference>,

    /// Depth-stencil attachment.
    pub depth_stencil: Option<AttachmentReference>,
}

impl SubpassDescription {
    fn references(&self) -> impl Iterator<Item = &AttachmentReference> {
        self.input
            .iter()
            .chain(&self.color)
            .chain(&self.resolve)
            .chain(&self.depth_stencil)
            .filter(|reference| reference.attachment != vk::ATTACHMENT_UNUSED)
    }
}

/// Dependency between subpasses, or between a subpass and commands outside the instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubpassDependency {
    /// Source subpass or `vk::SUBPASS_EXTERNAL`.
    pub src_subpass: u32,

    /// Destination subpass or `vk::SUBPASS_EXTERNAL`.
    pub dst_subpass: u32,

    /// First synchronization scope.
    pub src: SyncScope,

    /// Second synchronization scope.
    pub dst: SyncScope,
}

/// Layout transition of an attachment at a subpass boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttachmentTransition {
    /// Attachment index.
    pub attachment: usize,

    /// First synchronization scope.
    pub src: SyncScope,

    /// Second synchronization scope.
    pub dst: SyncScope,

    /// Layout after the transition.
    pub new_layout: vk::ImageLayout,
}

/// Synchronization happening when a subpass begins or the render pass instance ends.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Boundary {
    /// Subpass dependencies with their index in `pDependencies`.
    pub dependencies: Vec<(u32, SubpassDependency)>,

    /// Attachment layout transitions.
    pub transitions: Vec<AttachmentTransition>,
}

/// Render pass as declared at creation.
#[derive(Clone, Debug)]
pub struct RenderPass {
    function: Func,
    attachments: Vec<AttachmentDescription>,
    subpasses: Vec<SubpassDescription>,
    dependencies: Vec<SubpassDependency>,
    first_use: Vec<Option<u32>>,
    last_use: Vec<Option<u32>>,
}

impl RenderPass {
    /// Render pass created by `function`.
    pub fn new(
        function: Func,
        attachments: Vec<AttachmentDescription>,
        subpasses: Vec<SubpassDescription>,
        dependencies: Vec<SubpassDependency>,
    ) -> Self {
        let mut first_use = vec![None; attachments.len()];
        let mut last_use = vec![None; attachments.len()];
        for (index, subpass) in subpasses.iter().enumerate() {
            for reference in subpass.references() {
                let attachment = reference.attachment as usize;
                if attachment >= attachments.len() {
                    log::warn!("Subpass {} references unknown attachment {}", index, attachment);
                    continue;
                }
                first_use[attachment] = first_use[attachment].or(Some(index as u32));
                last_use[attachment] = Some(index as u32);
            }
        }

        RenderPass {
            function,
            attachments,
            subpasses,
            dependencies,
            first_use,
            last_use,
        }
    }

    /// Entry point that created the render pass.
    pub fn function(&self) -> Func {
        self.function
    }

    /// Attachment descriptions.
    pub fn attachments(&self) -> &[AttachmentDescription] {
        &self.attachments
    }

    /// Subpass descriptions.
    pub fn subpasses(&self) -> &[SubpassDescription] {
        &self.subpasses
    }

    /// Subpass dependencies.
    pub fn dependencies(&self) -> &[SubpassDependency] {
        &self.dependencies
    }

    /// Number of subpasses.
    pub fn subpass_count(&self) -> u32 {
        self.subpasses.len() as u32
    }

    /// First subpass using the attachment.
    pub fn first_use(&self, attachment: usize) -> Option<u32> {
        self.first_use.get(attachment).cloned().and_then(|use_| use_)
    }

    /// Last subpass using the attachment.
    pub fn last_use(&self, attachment: usize) -> Option<u32> {
        self.last_use.get(attachment).cloned().and_then(|use_| use_)
    }

    /// Layout of the attachment during the subpass, `None` if the subpass doesn't use it.
    pub fn layout_in(&self, attachment: usize, subpass: u32) -> Option<vk::ImageLayout> {
        self.subpasses
            .get(subpass as usize)?
            .references()
            .find(|reference| reference.attachment as usize == attachment)
            .map(|reference| reference.layout)
    }

    /// `pDependencies[index]` as a dependency declared by `function`.
    pub fn dependency(&self, function: Func, index: u32) -> Option<Dependency> {
        let dependency = self.dependencies.get(index as usize)?;
        Some(
            Dependency::subpass(function, index)
                .with_barrier(Barrier::memory(dependency.src, dependency.dst)),
        )
    }

    /// Structural findings about the subpass dependencies.
    pub fn validate(&self, analyzer: &Analyzer<'_>) -> Result<Vec<Hazard>, EngineFault> {
        let context = BarrierContext::new(QueueId::RECORDING, None, Tag::ZERO);
        let mut hazards = Vec::new();
        for index in 0..self.dependencies.len() as u32 {
            if let Some(dependency) = self.dependency(self.function, index) {
                hazards.extend(analyzer.validate(&dependency, &context)?);
            }
        }
        Ok(hazards)
    }

    /// Findings about dependency stages the queue family the instance begins on can't execute.
    pub fn validate_queue(
        &self,
        analyzer: &Analyzer<'_>,
        family: u32,
    ) -> Result<Vec<Hazard>, EngineFault> {
        let mut hazards = Vec::new();
        for index in 0..self.dependencies.len() as u32 {
            let dependency = match self.dependency(self.function, index) {
                Some(dependency) => dependency,
                None => continue,
            };
            for (barrier, location) in dependency.barriers.iter().zip(dependency.locations()) {
                for &(stages, side) in &[
                    (barrier.src.stages, StageSide::Src),
                    (barrier.dst.stages, StageSide::Dst),
                ] {
                    let field = match side {
                        StageSide::Src => Field::SrcStageMask,
                        StageSide::Dst => Field::DstStageMask,
                    };
                    hazards.extend(analyzer.validate_queue_capability(
                        stages,
                        location.with_field(field),
                        family,
                    )?);
                }
            }
        }
        Ok(hazards)
    }

    fn dependencies_into(&self, into: u32) -> Vec<(u32, SubpassDependency)> {
        self.dependencies
            .iter()
            .enumerate()
            .filter(|(_, dependency)| {
                dependency.dst_subpass == into && dependency.src_subpass != dependency.dst_subpass
            })
            .map(|(index, dependency)| (index as u32, *dependency))
            .collect()
    }

    /// Synchronization when subpass `subpass` begins,
    /// with attachments currently in `layouts`.
    pub fn enter(&self, subpass: u32, layouts: &[vk::ImageLayout]) -> Boundary {
        let dependencies = self.dependencies_into(subpass);
        let union = union_of(&dependencies);
        let external = dependencies
            .iter()
            .any(|(_, dependency)| dependency.src_subpass == vk::SUBPASS_EXTERNAL);

        let transitions = layouts
            .iter()
            .enumerate()
            .filter_map(|(attachment, &layout)| {
                let new_layout = self.layout_in(attachment, subpass)?;
                if new_layout == layout {
                    return None;
                }
                let (src, dst) = if self.first_use(attachment) == Some(subpass) && !external {
                    implicit_into()
                } else {
                    union
                };
                Some(AttachmentTransition {
                    attachment,
                    src,
                    dst,
                    new_layout,
                })
            })
            .collect();

        Boundary {
            dependencies,
            transitions,
        }
    }

    /// Synchronization when the render pass instance ends,
    /// with attachments currently in `layouts`.
    pub fn exit(&self, layouts: &[vk::ImageLayout]) -> Boundary {
        let dependencies = self.dependencies_into(vk::SUBPASS_EXTERNAL);
        let union = union_of(&dependencies);

        let transitions = layouts
            .iter()
            .enumerate()
            .filter_map(|(attachment, &layout)| {
                let new_layout = self.attachments.get(attachment)?.final_layout;
                if new_layout == layout || new_layout == vk::ImageLayout::UNDEFINED {
                    return None;
                }
                let last_use = self.last_use(attachment);
                let explicit = dependencies
                    .iter()
                    .any(|(_, dependency)| Some(dependency.src_subpass) == last_use);
                let (src, dst) = if explicit { union } else { implicit_out_of() };
                Some(AttachmentTransition {
                    attachment,
                    src,
                    dst,
                    new_layout,
                })
            })
            .collect();

        Boundary {
            dependencies,
            transitions,
        }
    }
}

fn union_of(dependencies: &[(u32, SubpassDependency)]) -> (SyncScope, SyncScope) {
    dependencies.iter().fold(
        (
            SyncScope::new(Stages::NONE, Access::NONE),
            SyncScope::new(Stages::NONE, Access::NONE),
        ),
        |(mut src, mut dst), (_, dependency)| {
            src.stages |= dependency.src.stages;
            src.access |= dependency.src.access;
            dst.stages |= dependency.dst.stages;
            dst.access |= dependency.dst.access;
            (src, dst)
        },
    )
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        std::sync::Arc,
        syncval_catalog::Catalog,
        syncval_core::{vk::QueueFlags, CapabilityContext, DeviceCapabilities},
        syncval_resource::{Classifier, Registry},
    };

    fn color(attachment: u32) -> AttachmentReference {
        AttachmentReference {
            attachment,
            layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        }
    }

    fn two_subpasses(dependencies: Vec<SubpassDependency>) -> RenderPass {
        RenderPass::new(
            Func::CreateRenderPass,
            vec![
                AttachmentDescription::new(
                    vk::ImageLayout::UNDEFINED,
                    vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                ),
                AttachmentDescription::new(
                    vk::ImageLayout::UNDEFINED,
                    vk::ImageLayout::PRESENT_SRC_KHR,
                ),
            ],
            vec![
                SubpassDescription {
                    color: vec![color(0)],
                    ..SubpassDescription::default()
                },
                SubpassDescription {
                    input: vec![AttachmentReference {
                        attachment: 0,
                        layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                    }],
                    color: vec![color(1)],
                    ..SubpassDescription::default()
                },
            ],
            dependencies,
        )
    }

    fn color_to_input() -> SubpassDependency {
        SubpassDependency {
            src_subpass: 0,
            dst_subpass: 1,
            src: SyncScope::new(Stages::COLOR_ATTACHMENT_OUTPUT, Access::COLOR_ATTACHMENT_WRITE),
            dst: SyncScope::new(Stages::FRAGMENT_SHADER, Access::INPUT_ATTACHMENT_READ),
        }
    }

    #[test]
    fn uses_are_tracked_per_attachment() {
        let render_pass = two_subpasses(vec![]);
        assert_eq!(render_pass.first_use(0), Some(0));
        assert_eq!(render_pass.last_use(0), Some(1));
        assert_eq!(render_pass.first_use(1), Some(1));
        assert_eq!(render_pass.first_use(2), None);
        assert_eq!(
            render_pass.layout_in(0, 1),
            Some(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
        );
        assert_eq!(render_pass.layout_in(1, 0), None);
    }

    #[test]
    fn first_use_without_external_dependency_is_implicit() {
        let render_pass = two_subpasses(vec![color_to_input()]);
        let layouts = [vk::ImageLayout::UNDEFINED; 2];
        let boundary = render_pass.enter(0, &layouts);
        assert!(boundary.dependencies.is_empty());
        assert_eq!(boundary.transitions.len(), 1);
        assert_eq!(boundary.transitions[0].src.stages, Stages::TOP_OF_PIPE);
        assert_eq!(boundary.transitions[0].dst.stages, Stages::ALL_COMMANDS);
    }

    #[test]
    fn later_transitions_use_incoming_dependencies() {
        let render_pass = two_subpasses(vec![color_to_input()]);
        let layouts = [
            vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            vk::ImageLayout::UNDEFINED,
        ];
        let boundary = render_pass.enter(1, &layouts);
        assert_eq!(boundary.dependencies, vec![(0, color_to_input())]);
        assert_eq!(boundary.transitions.len(), 2);

        let input = &boundary.transitions[0];
        assert_eq!(input.attachment, 0);
        assert_eq!(input.src.stages, Stages::COLOR_ATTACHMENT_OUTPUT);
        assert_eq!(input.new_layout, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL);

        let first = &boundary.transitions[1];
        assert_eq!(first.attachment, 1);
        assert_eq!(first.src.stages, Stages::TOP_OF_PIPE);
    }

    #[test]
    fn final_transitions() {
        let render_pass = two_subpasses(vec![]);
        let layouts = [
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        ];
        let boundary = render_pass.exit(&layouts);
        assert_eq!(boundary.transitions.len(), 1);
        assert_eq!(boundary.transitions[0].attachment, 1);
        assert_eq!(boundary.transitions[0].dst.stages, Stages::BOTTOM_OF_PIPE);
    }

    #[test]
    fn load_and_store_accesses() {
        let cleared = AttachmentDescription::new(
            vk::ImageLayout::UNDEFINED,
            vk::ImageLayout::GENERAL,
        )
        .with_ops(vk::AttachmentLoadOp::CLEAR, vk::AttachmentStoreOp::STORE);
        assert_eq!(
            cleared.load_access(vk::ImageAspectFlags::DEPTH),
            Some(SyncScope::new(
                Stages::EARLY_FRAGMENT_TESTS,
                Access::DEPTH_STENCIL_ATTACHMENT_WRITE
            ))
        );
        assert_eq!(
            cleared.store_access(vk::ImageAspectFlags::COLOR),
            Some(SyncScope::new(
                Stages::COLOR_ATTACHMENT_OUTPUT,
                Access::COLOR_ATTACHMENT_WRITE
            ))
        );
        let loaded = AttachmentDescription::new(
            vk::ImageLayout::GENERAL,
            vk::ImageLayout::GENERAL,
        );
        assert_eq!(
            loaded.load_access(vk::ImageAspectFlags::COLOR).map(|scope| scope.access),
            Some(Access::COLOR_ATTACHMENT_READ)
        );
    }

    #[test]
    fn dependency_findings() {
        let classifier = Classifier::new(
            Arc::new(Catalog::new()),
            Arc::new(CapabilityContext::new(
                DeviceCapabilities::empty(),
                vec![QueueFlags::GRAPHICS, QueueFlags::TRANSFER],
            )),
            false,
        );
        let registry = Registry::new(1);
        let analyzer = Analyzer::new(&classifier, &registry);

        let render_pass = two_subpasses(vec![SubpassDependency {
            src: SyncScope::new(Stages::GEOMETRY_SHADER, Access::NONE),
            ..color_to_input()
        }]);
        let hazards = render_pass.validate(&analyzer).unwrap();
        assert_eq!(hazards.len(), 1);
        assert_eq!(
            hazards[0].rule.as_str(),
            "VUID-VkSubpassDependency-srcStageMask-04090"
        );

        let hazards = render_pass.validate_queue(&analyzer, 1).unwrap();
        assert_eq!(hazards.len(), 2);
        assert_eq!(
            hazards[0].rule.as_str(),
            "VUID-vkCmdBeginRenderPass-srcStageMask-06451"
        );
    }
}
