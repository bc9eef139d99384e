//! Command buffer recording.
//!
//! Every command is checked against the history of the command buffer alone.
//! The recorded commands are kept to be replayed on submission
//! against the device-wide history.

mod state;

pub use self::state::{Level, State, Usage};

use {
    crate::{
        event::Events,
        recorded::{Command, Rebase, Recorded},
        render_pass::{attachment_access, attachment_stages, Boundary, RenderPass},
    },
    smallvec::SmallVec,
    std::sync::Arc,
    syncval_catalog::{SubmitError, Violation},
    syncval_chain::{Analyzer, Barrier, BarrierContext, Dependency, StageSide},
    syncval_core::{
        vk::{self, PipelineStageFlags2 as Stages},
        AccessScope, CommandBufferId, CommandPoolId, EngineFault, EventId, Field, Func, Location,
        QueueId, ResourceId, SyncScope, Tag,
    },
    syncval_resource::{
        AccessInfo, BarrierOp, BarrierTarget, Hazard, ImageSubresourceRange, Origin, Ownership,
        SubresourceRange, Tracker,
    },
    thread_profiler::profile_scope,
};

/// Render pass instance being recorded.
#[derive(Debug)]
struct ActiveRenderPass {
    render_pass: Arc<RenderPass>,
    attachments: Vec<(ResourceId, ImageSubresourceRange)>,
    layouts: Vec<vk::ImageLayout>,
    subpass: u32,
}

/// Command buffer with its recording.
#[derive(derivative::Derivative)]
#[derivative(Debug)]
pub struct CommandBuffer {
    id: CommandBufferId,
    pool: CommandPoolId,
    family: u32,
    level: Level,
    usage: Usage,
    individual_reset: bool,
    state: State,
    #[derivative(Debug = "ignore")]
    tracker: Tracker,
    events: Events,
    commands: Vec<Command>,
    secondaries: SmallVec<[CommandBufferId; 4]>,
    next_tag: Tag,
    render_pass: Option<ActiveRenderPass>,
    recorded: Option<Arc<Recorded>>,
}

impl CommandBuffer {
    /// Command buffer in initial state.
    /// `tracker` must be a recording tracker.
    pub(crate) fn new(
        id: CommandBufferId,
        pool: CommandPoolId,
        family: u32,
        level: Level,
        individual_reset: bool,
        tracker: Tracker,
    ) -> Self {
        CommandBuffer {
            id,
            pool,
            family,
            level,
            usage: Usage::default(),
            individual_reset,
            state: State::Initial,
            tracker,
            events: Events::new(),
            commands: Vec::new(),
            secondaries: SmallVec::new(),
            next_tag: Tag::ZERO,
            render_pass: None,
            recorded: None,
        }
    }

    /// Id of the command buffer.
    pub fn id(&self) -> CommandBufferId {
        self.id
    }

    /// Pool the command buffer was allocated from.
    pub fn pool(&self) -> CommandPoolId {
        self.pool
    }

    /// Queue family of the pool.
    pub fn family(&self) -> u32 {
        self.family
    }

    /// Level of the command buffer.
    pub fn level(&self) -> Level {
        self.level
    }

    /// Usage given when recording began.
    pub fn usage(&self) -> Usage {
        self.usage
    }

    /// Lifecycle state.
    pub fn state(&self) -> State {
        self.state
    }

    /// Check if a render pass instance is being recorded.
    pub fn in_render_pass(&self) -> bool {
        self.render_pass.is_some()
    }

    fn invalid_state(&self, expected: &'static str) -> EngineFault {
        EngineFault::InvalidState {
            command_buffer: self.id,
            state: self.state.name(),
            expected,
        }
    }

    fn render_pass_fault(&self, reason: &'static str) -> EngineFault {
        EngineFault::RenderPassState {
            command_buffer: self.id,
            reason,
        }
    }

    fn assert_recording(&self) -> Result<(), EngineFault> {
        if self.state == State::Recording {
            Ok(())
        } else {
            Err(self.invalid_state(State::Recording.name()))
        }
    }

    /// Begin recording.
    /// Executable and invalid buffers are implicitly reset if their pool allows it.
    pub fn begin(&mut self, usage: Usage) -> Result<(), EngineFault> {
        match self.state {
            State::Initial => {}
            State::Executable | State::Invalid if self.individual_reset => self.mark_reset(),
            _ => return Err(self.invalid_state(State::Initial.name())),
        }
        self.usage = usage;
        self.state = State::Recording;
        Ok(())
    }

    /// Finish recording.
    pub fn end(&mut self) -> Result<(), EngineFault> {
        self.assert_recording()?;
        if self.render_pass.is_some() {
            return Err(self.render_pass_fault("render pass instance is not ended"));
        }

        let commands = std::mem::replace(&mut self.commands, Vec::new());
        log::trace!("{} recorded {} commands", self.id, commands.len());
        self.recorded = Some(Arc::new(Recorded::new(
            self.id,
            self.pool,
            self.family,
            commands,
            std::mem::replace(&mut self.secondaries, SmallVec::new()),
            self.next_tag.0,
        )));
        self.state = State::Executable;
        Ok(())
    }

    /// Reset the command buffer on its own.
    pub fn reset(&mut self) -> Result<(), EngineFault> {
        if !self.individual_reset {
            return Err(self.invalid_state("allocated from a pool with individual reset"));
        }
        self.mark_reset();
        Ok(())
    }

    /// Drop recording and move to initial state.
    /// Called when the command buffer or its whole pool is reset.
    pub fn mark_reset(&mut self) {
        self.tracker.reset();
        self.events.clear();
        self.commands.clear();
        self.secondaries.clear();
        self.next_tag = Tag::ZERO;
        self.render_pass = None;
        self.recorded = None;
        self.state = State::Initial;
    }

    /// Recording to submit or execute.
    pub fn recorded(&self) -> Result<Arc<Recorded>, EngineFault> {
        match (self.state, &self.recorded) {
            (State::Executable, Some(recorded)) => Ok(recorded.clone()),
            _ => Err(self.invalid_state(State::Executable.name())),
        }
    }

    /// Command buffer was submitted.
    /// One-shot buffers become invalid.
    pub fn mark_submitted(&mut self) -> Result<(), EngineFault> {
        if self.state != State::Executable {
            return Err(self.invalid_state(State::Executable.name()));
        }
        if self.usage == Usage::OneShot {
            self.state = State::Invalid;
        }
        Ok(())
    }

    fn next_tag(&mut self) -> Tag {
        let tag = self.next_tag;
        self.next_tag = tag.next();
        tag
    }

    fn origin(&self, location: Option<Location>) -> Origin {
        Origin {
            location,
            ..Origin::default()
        }
        .with_command_buffer(self.id, self.pool)
    }

    fn context(&self, tag: Tag) -> BarrierContext {
        BarrierContext {
            in_render_pass: self.render_pass.is_some(),
            origin: self.origin(None),
            ..BarrierContext::new(QueueId::RECORDING, Some(self.family), tag)
        }
    }

    fn analyzer(&self) -> Analyzer<'_> {
        Analyzer::new(self.tracker.classifier(), self.tracker.registry())
    }

    fn apply(&mut self, ops: Vec<BarrierOp>) -> Result<Vec<Hazard>, EngineFault> {
        if ops.is_empty() {
            return Ok(Vec::new());
        }
        let hazards = self.tracker.apply_barriers(&ops)?;
        self.commands.push(Command::Barriers(ops));
        Ok(hazards)
    }

    /// Record memory access of a command.
    pub fn record_access(
        &mut self,
        function: Func,
        resource: ResourceId,
        range: SubresourceRange,
        scope: SyncScope,
    ) -> Result<Vec<Hazard>, EngineFault> {
        profile_scope!("record_access");
        self.assert_recording()?;

        let location = Location::new(function);
        let mut hazards = self.raster_order(resource, scope, location)?;
        let access = AccessInfo {
            scope: scope.with_family(self.family),
            tag: self.next_tag(),
            queue: QueueId::RECORDING,
            origin: self.origin(Some(location)),
        };
        hazards.extend(self.tracker.record(resource, &range, &access)?);
        self.commands.push(Command::Access {
            resource,
            range,
            access,
        });
        Ok(hazards)
    }

    /// Attachment accesses inside a render pass instance happen in rasterization order.
    fn raster_order(
        &mut self,
        resource: ResourceId,
        scope: SyncScope,
        location: Location,
    ) -> Result<Vec<Hazard>, EngineFault> {
        let range = match self.render_pass {
            Some(ref active) if scope.stages.intersects(attachment_stages()) => {
                match active.attachments.iter().find(|(id, _)| *id == resource) {
                    Some(&(_, range)) => range,
                    None => return Ok(Vec::new()),
                }
            }
            _ => return Ok(Vec::new()),
        };
        let ordered = AccessScope::new(attachment_stages(), attachment_access());
        let op = BarrierOp {
            target: BarrierTarget::Resource {
                resource,
                range: range.into(),
            },
            src_exec: attachment_stages(),
            src_access: ordered.clone(),
            dst_exec: attachment_stages(),
            dst_access: ordered,
            layout: None,
            ownership: Ownership::None,
            tag: self.next_tag(),
            queue: QueueId::RECORDING,
            family: self.family,
            before: None,
            origin: self.origin(Some(location)),
        };
        self.apply(vec![op])
    }

    /// `vkCmdPipelineBarrier` and `vkCmdPipelineBarrier2`.
    pub fn pipeline_barrier(&mut self, dependency: &Dependency) -> Result<Vec<Hazard>, EngineFault> {
        profile_scope!("pipeline_barrier");
        self.assert_recording()?;

        let tag = self.next_tag();
        let analysis = self.analyzer().analyze(dependency, &self.context(tag))?;
        let mut hazards = analysis.hazards;
        hazards.extend(self.apply(analysis.edges)?);
        Ok(hazards)
    }

    fn signal(&mut self, event: EventId) {
        let tag = self.next_tag();
        self.events.set(event, QueueId::RECORDING, tag);
        self.commands.push(Command::SetEvent { event, tag });
    }

    /// `vkCmdSetEvent`.
    pub fn set_event(&mut self, event: EventId, stages: Stages) -> Result<Vec<Hazard>, EngineFault> {
        self.assert_recording()?;

        let location = Location::new(Func::CmdSetEvent).with_field(Field::StageMask);
        let analyzer = self.analyzer();
        let mut hazards =
            analyzer.validate_stage_mask(stages, StageSide::Src, location, Some(self.family))?;
        hazards.extend(analyzer.validate_host_stage(stages, location));
        self.signal(event);
        Ok(hazards)
    }

    /// `vkCmdSetEvent2`.
    pub fn set_event2(
        &mut self,
        event: EventId,
        dependency: &Dependency,
    ) -> Result<Vec<Hazard>, EngineFault> {
        self.assert_recording()?;

        let hazards = self
            .analyzer()
            .validate(dependency, &self.context(self.next_tag))?;
        self.signal(event);
        Ok(hazards)
    }

    /// `vkCmdResetEvent` and `vkCmdResetEvent2`.
    pub fn reset_event(
        &mut self,
        function: Func,
        event: EventId,
        stages: Stages,
    ) -> Result<Vec<Hazard>, EngineFault> {
        self.assert_recording()?;

        let location = Location::new(function).with_field(Field::StageMask);
        let analyzer = self.analyzer();
        let mut hazards =
            analyzer.validate_stage_mask(stages, StageSide::Src, location, Some(self.family))?;
        hazards.extend(analyzer.validate_host_stage(stages, location));

        self.next_tag();
        self.events.reset(event);
        self.commands.push(Command::ResetEvent { event });
        Ok(hazards)
    }

    /// `vkCmdWaitEvents` and `vkCmdWaitEvents2`.
    ///
    /// Only accesses preceding the earliest set of the events are in the first scope.
    pub fn wait_events(
        &mut self,
        events: &[EventId],
        dependency: &Dependency,
    ) -> Result<Vec<Hazard>, EngineFault> {
        profile_scope!("wait_events");
        self.assert_recording()?;

        let tag = self.next_tag();
        let analysis = self.analyzer().analyze(dependency, &self.context(tag))?;
        let mut hazards = analysis.hazards;

        let bound = self
            .events
            .wait_bound(events, QueueId::RECORDING)
            .unwrap_or(Tag::ZERO);
        let bounded: Vec<BarrierOp> = analysis
            .edges
            .iter()
            .map(|op| BarrierOp {
                before: Some(bound),
                ..op.clone()
            })
            .collect();
        hazards.extend(self.tracker.apply_barriers(&bounded)?);
        self.commands.push(Command::WaitEvents {
            events: events.iter().cloned().collect::<SmallVec<_>>(),
            barriers: analysis.edges,
        });
        Ok(hazards)
    }

    /// `vkCmdWriteTimestamp` and `vkCmdWriteTimestamp2`.
    pub fn write_timestamp(&mut self, function: Func, stage: Stages) -> Result<Vec<Hazard>, EngineFault> {
        self.assert_recording()?;

        let field = if function.is_sync2() {
            Field::Stage
        } else {
            Field::PipelineStage
        };
        let location = Location::new(function).with_field(field);
        self.next_tag();
        self.analyzer()
            .validate_stage_mask(stage, StageSide::Src, location, Some(self.family))
    }

    /// `vkCmdBeginRenderPass` and `vkCmdBeginRenderPass2`.
    ///
    /// `attachments` are the images of the framebuffer, one per attachment description.
    pub fn begin_render_pass(
        &mut self,
        function: Func,
        render_pass: Arc<RenderPass>,
        attachments: Vec<(ResourceId, ImageSubresourceRange)>,
    ) -> Result<Vec<Hazard>, EngineFault> {
        profile_scope!("begin_render_pass");
        self.assert_recording()?;

        if self.level != Level::Primary {
            return Err(self.render_pass_fault("render pass instance begun in a secondary command buffer"));
        }
        if self.render_pass.is_some() {
            return Err(self.render_pass_fault("render pass instance is already active"));
        }
        if attachments.len() != render_pass.attachments().len() {
            return Err(self.render_pass_fault("framebuffer doesn't match render pass attachments"));
        }
        if render_pass.subpass_count() == 0 {
            return Err(self.render_pass_fault("render pass has no subpasses"));
        }

        let mut hazards = render_pass.validate_queue(&self.analyzer(), self.family)?;
        let layouts = render_pass
            .attachments()
            .iter()
            .map(|attachment| attachment.initial_layout)
            .collect();
        self.render_pass = Some(ActiveRenderPass {
            render_pass,
            attachments,
            layouts,
            subpass: 0,
        });
        hazards.extend(self.enter_subpass(function, 0)?);
        Ok(hazards)
    }

    /// `vkCmdNextSubpass` and `vkCmdNextSubpass2`.
    pub fn next_subpass(&mut self, function: Func) -> Result<Vec<Hazard>, EngineFault> {
        self.assert_recording()?;

        let (subpass, count) = match self.render_pass {
            Some(ref active) => (active.subpass, active.render_pass.subpass_count()),
            None => return Err(self.render_pass_fault("no active render pass instance")),
        };
        if subpass + 1 >= count {
            return Err(self.render_pass_fault("no subpass after the last one"));
        }

        let mut hazards = self.leave_subpass(function, subpass)?;
        if let Some(ref mut active) = self.render_pass {
            active.subpass = subpass + 1;
        }
        hazards.extend(self.enter_subpass(function, subpass + 1)?);
        Ok(hazards)
    }

    /// `vkCmdEndRenderPass` and `vkCmdEndRenderPass2`.
    pub fn end_render_pass(&mut self, function: Func) -> Result<Vec<Hazard>, EngineFault> {
        self.assert_recording()?;

        let (subpass, count) = match self.render_pass {
            Some(ref active) => (active.subpass, active.render_pass.subpass_count()),
            None => return Err(self.render_pass_fault("no active render pass instance")),
        };
        if subpass + 1 != count {
            return Err(self.render_pass_fault("render pass instance ended before its last subpass"));
        }

        let mut hazards = self.leave_subpass(function, subpass)?;
        let boundary = match self.render_pass {
            Some(ref active) => active.render_pass.exit(&active.layouts),
            None => Boundary::default(),
        };
        hazards.extend(self.cross_boundary(function, &boundary)?);
        self.render_pass = None;
        Ok(hazards)
    }

    fn enter_subpass(&mut self, function: Func, subpass: u32) -> Result<Vec<Hazard>, EngineFault> {
        let (boundary, loads) = match self.render_pass {
            Some(ref active) => {
                let loads: Vec<_> = active
                    .attachments
                    .iter()
                    .enumerate()
                    .filter(|&(index, _)| active.render_pass.first_use(index) == Some(subpass))
                    .filter_map(|(index, &(resource, range))| {
                        let scope = active.render_pass.attachments()[index].load_access(range.aspects)?;
                        Some((resource, range, scope))
                    })
                    .collect();
                (active.render_pass.enter(subpass, &active.layouts), loads)
            }
            None => return Ok(Vec::new()),
        };

        let mut hazards = self.cross_boundary(function, &boundary)?;
        for (resource, range, scope) in loads {
            hazards.extend(self.record_access(function, resource, range.into(), scope)?);
        }
        Ok(hazards)
    }

    fn leave_subpass(&mut self, function: Func, subpass: u32) -> Result<Vec<Hazard>, EngineFault> {
        let stores: Vec<_> = match self.render_pass {
            Some(ref active) => active
                .attachments
                .iter()
                .enumerate()
                .filter(|&(index, _)| active.render_pass.last_use(index) == Some(subpass))
                .filter_map(|(index, &(resource, range))| {
                    let scope = active.render_pass.attachments()[index].store_access(range.aspects)?;
                    Some((resource, range, scope))
                })
                .collect(),
            None => return Ok(Vec::new()),
        };

        let mut hazards = Vec::new();
        for (resource, range, scope) in stores {
            hazards.extend(self.record_access(function, resource, range.into(), scope)?);
        }
        Ok(hazards)
    }

    /// Apply subpass dependencies and layout transitions of a boundary as one command.
    fn cross_boundary(&mut self, function: Func, boundary: &Boundary) -> Result<Vec<Hazard>, EngineFault> {
        let tag = self.next_tag();
        let context = self.context(tag);
        let analyzer = self.analyzer();

        let active = match self.render_pass {
            Some(ref active) => active,
            None => return Ok(Vec::new()),
        };

        let mut ops = Vec::new();
        for &(index, _) in &boundary.dependencies {
            if let Some(dependency) = active.render_pass.dependency(active.render_pass.function(), index) {
                for (barrier, location) in dependency.barriers.iter().zip(dependency.locations()) {
                    ops.push(analyzer.resolve(barrier, location, &context)?);
                }
            }
        }

        let location = Location::new(function);
        let mut layouts = Vec::with_capacity(boundary.transitions.len());
        for transition in &boundary.transitions {
            let (resource, range) = active.attachments[transition.attachment];
            let barrier = Barrier::image(
                transition.src,
                transition.dst,
                resource,
                range,
                active.layouts[transition.attachment],
                transition.new_layout,
            );
            ops.push(analyzer.resolve(&barrier, location, &context)?);
            layouts.push((transition.attachment, transition.new_layout));
        }

        if let Some(ref mut active) = self.render_pass {
            for (attachment, layout) in layouts {
                active.layouts[attachment] = layout;
            }
        }
        self.apply(ops)
    }

    /// `vkCmdExecuteCommands`.
    ///
    /// Secondary recordings are replayed into this command buffer
    /// and become part of its recording.
    /// A secondary without simultaneous use executed again is reported and skipped.
    pub fn execute_commands(&mut self, secondaries: &[&CommandBuffer]) -> Result<Vec<Hazard>, EngineFault> {
        profile_scope!("execute_commands");
        self.assert_recording()?;

        if self.level != Level::Primary {
            return Err(EngineFault::InvalidState {
                command_buffer: self.id,
                state: "secondary",
                expected: "primary",
            });
        }

        let mut recordings = Vec::with_capacity(secondaries.len());
        for secondary in secondaries {
            if secondary.level != Level::Secondary {
                return Err(EngineFault::InvalidState {
                    command_buffer: secondary.id,
                    state: "primary",
                    expected: "secondary",
                });
            }
            recordings.push((secondary.id, secondary.usage, secondary.recorded()?));
        }

        let mut hazards = Vec::new();
        for (index, (id, usage, recorded)) in recordings.into_iter().enumerate() {
            if !usage.is_simultaneous() {
                if self.secondaries.contains(&id) {
                    log::warn!("{} executes {} more than once", self.id, id);
                    let location = Location::new(Func::CmdExecuteCommands)
                        .with_parent(Field::PCommandBuffers, index as u32);
                    hazards.push(self.tracker.classifier().structural(
                        Violation::Submit(SubmitError::SecondaryCmdNotSimultaneous),
                        location,
                        None,
                    ));
                    continue;
                }
                self.secondaries.push(id);
            }

            let rebase = Rebase {
                queue: QueueId::RECORDING,
                base: self.next_tag,
            };
            self.next_tag = self.next_tag.offset(recorded.tags());

            hazards.extend(recorded.replay(&self.tracker, &mut self.events, rebase)?);
            self.commands
                .extend(recorded.commands().iter().map(|command| command.rebased(&rebase)));
        }
        Ok(hazards)
    }
}
