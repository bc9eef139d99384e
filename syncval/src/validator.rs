//! Validator of one logical device.

use {
    crate::config::Config,
    fnv::{FnvHashMap, FnvHashSet},
    parking_lot::{Mutex, RwLock},
    std::sync::Arc,
    syncval_catalog::{Catalog, SubmitError, Violation},
    syncval_chain::{Analyzer, Dependency},
    syncval_command::{CommandBuffer, CommandPool, Level, RenderPass, State, Usage},
    syncval_core::{
        vk::{AccessFlags2 as Access, PipelineStageFlags2 as Stages},
        CapabilityContext, CommandBufferId, CommandPoolId, EngineFault, EventId, FenceId, Func,
        QueueId, RenderPassId, ResourceId, SemaphoreId, SyncScope,
    },
    syncval_queue::{
        command_buffer_location, Batch, SemaphoreOp, Simulator, SimulatorSnapshot, SubmitResult,
    },
    syncval_resource::{
        BufferInfo, Classifier, Hazard, ImageInfo, ImageSubresourceRange, MemoryBinding,
        Registry, SubresourceRange, Tracker, TrackerMode,
    },
    thread_profiler::profile_scope,
};

/// Lock shards of a command buffer's own tracker.
const RECORDING_SHARDS: usize = 4;

/// Batch of a queue submission naming command buffers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Submission {
    /// Semaphores with stage mask to wait on.
    pub waits: Vec<SemaphoreOp>,

    /// Primary command buffers in submission order.
    pub command_buffers: Vec<CommandBufferId>,

    /// Semaphores to signal.
    pub signals: Vec<SemaphoreOp>,
}

impl Submission {
    /// Create new empty submission.
    pub fn new() -> Self {
        Submission::default()
    }

    /// Add wait to the submission.
    pub fn wait(mut self, semaphore: SemaphoreId, stages: Stages) -> Self {
        self.waits.push(SemaphoreOp { semaphore, stages });
        self
    }

    /// Add command buffers to the submission.
    pub fn submits<I>(mut self, command_buffers: I) -> Self
    where
        I: IntoIterator<Item = CommandBufferId>,
    {
        self.command_buffers.extend(command_buffers);
        self
    }

    /// Add signal covering all commands.
    pub fn signal(self, semaphore: SemaphoreId) -> Self {
        self.signal_at(semaphore, Stages::ALL_COMMANDS)
    }

    /// Add signal with explicit stage mask.
    pub fn signal_at(mut self, semaphore: SemaphoreId, stages: Stages) -> Self {
        self.signals.push(SemaphoreOp { semaphore, stages });
        self
    }
}

/// Command buffers already accepted by one submit call.
#[derive(Debug, Default)]
struct Accepted {
    primaries: FnvHashSet<CommandBufferId>,
    secondaries: FnvHashSet<CommandBufferId>,
}

impl Accepted {
    /// Lifecycle finding of submitting `buffer` once more, if any.
    /// Unrecorded buffers are faults.
    fn check(&self, buffer: &CommandBuffer, family: u32) -> Result<Option<SubmitError>, EngineFault> {
        if buffer.level() != Level::Primary {
            return Ok(Some(SubmitError::SecondaryCmdInSubmit));
        }
        if buffer.state() == State::Invalid {
            return Ok(Some(SubmitError::ReusedOneTimeCmd));
        }
        let recorded = buffer.recorded()?;
        if self.primaries.contains(&buffer.id()) {
            match buffer.usage() {
                Usage::OneShot => return Ok(Some(SubmitError::ReusedOneTimeCmd)),
                Usage::MultiShot => return Ok(Some(SubmitError::CmdNotSimultaneous)),
                Usage::Simultaneous => {}
            }
        }
        if buffer.family() != family {
            return Ok(Some(SubmitError::CmdWrongQueueFamily));
        }
        if recorded
            .secondaries()
            .iter()
            .any(|secondary| self.secondaries.contains(secondary))
        {
            return Ok(Some(SubmitError::SecondaryCmdNotSimultaneous));
        }
        Ok(None)
    }

    fn insert(&mut self, buffer: &CommandBuffer) -> Result<(), EngineFault> {
        self.primaries.insert(buffer.id());
        self.secondaries
            .extend(buffer.recorded()?.secondaries().iter().copied());
        Ok(())
    }
}

fn logged<T>(result: Result<T, EngineFault>) -> Result<T, EngineFault> {
    if let Err(ref fault) = result {
        log::error!("{}", fault);
    }
    result
}

/// Synchronization validator of a logical device.
///
/// Every ingestion call returns the findings it produced.
/// Calls for different command buffers and different queues may come from different threads.
#[derive(derivative::Derivative)]
#[derivative(Debug)]
pub struct Validator {
    config: Config,
    classifier: Classifier,
    registry: Arc<Registry>,
    simulator: Simulator,
    pools: RwLock<FnvHashMap<CommandPoolId, Arc<Mutex<CommandPool>>>>,
    #[derivative(Debug = "ignore")]
    buffers: RwLock<FnvHashMap<CommandBufferId, Arc<Mutex<CommandBuffer>>>>,
    render_passes: RwLock<FnvHashMap<RenderPassId, Arc<RenderPass>>>,
    events: RwLock<FnvHashSet<EventId>>,
}

impl Validator {
    /// Create validator for a device with the capabilities.
    pub fn new(capabilities: CapabilityContext, config: Config) -> Self {
        let shard_count = config.shard_count.max(1);
        let classifier = Classifier::new(
            Arc::new(Catalog::new()),
            Arc::new(capabilities),
            config.racing_rule_ids,
        );
        let registry = Arc::new(Registry::new(shard_count));
        let tracker = Tracker::new(
            registry.clone(),
            classifier.clone(),
            TrackerMode::Device,
            shard_count,
        );
        log::debug!(
            "Validator for {} queue families, {:?}",
            classifier.capabilities().family_count(),
            classifier.capabilities().capabilities()
        );

        Validator {
            config,
            classifier,
            registry,
            simulator: Simulator::new(Arc::new(tracker)),
            pools: RwLock::new(FnvHashMap::default()),
            buffers: RwLock::new(FnvHashMap::default()),
            render_passes: RwLock::new(FnvHashMap::default()),
            events: RwLock::new(FnvHashSet::default()),
        }
    }

    /// Configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Capabilities of the device.
    pub fn capabilities(&self) -> &CapabilityContext {
        self.classifier.capabilities()
    }

    /// Diagnostics catalog.
    pub fn catalog(&self) -> &Catalog {
        self.classifier.catalog()
    }

    /// Device-wide history.
    pub fn tracker(&self) -> &Tracker {
        self.simulator.tracker()
    }

    /// Submission simulator.
    pub fn simulator(&self) -> &Simulator {
        &self.simulator
    }

    fn finish(&self, mut result: SubmitResult) -> SubmitResult {
        if self.config.log_hazards {
            for hazard in result.hazards.iter().chain(&result.submit_errors) {
                log::warn!("{}", hazard);
            }
        }
        if let Some(max) = self.config.max_hazards_per_call {
            if result.len() > max {
                log::warn!(
                    "{} findings past the limit of {} are not returned",
                    result.len() - max,
                    max
                );
                if !self.config.log_hazards {
                    let kept_hazards = max.min(result.hazards.len());
                    let kept_errors = (max - kept_hazards).min(result.submit_errors.len());
                    for hazard in result.hazards[kept_hazards..]
                        .iter()
                        .chain(&result.submit_errors[kept_errors..])
                    {
                        log::warn!("{}", hazard);
                    }
                }
                result.truncate(max);
            }
        }
        result
    }

    fn hazards(&self, hazards: Result<Vec<Hazard>, EngineFault>) -> Result<SubmitResult, EngineFault> {
        Ok(self.finish(SubmitResult::hazards(logged(hazards)?)))
    }

    /// Register buffer.
    pub fn register_buffer(&self, id: ResourceId, info: BufferInfo) -> Result<(), EngineFault> {
        logged(self.registry.register_buffer(id, info))
    }

    /// Register image.
    pub fn register_image(&self, id: ResourceId, info: ImageInfo) -> Result<(), EngineFault> {
        logged(self.registry.register_image(id, info))
    }

    /// Bind resource to device memory.
    /// Resources bound to overlapping memory are checked against each other's history.
    pub fn bind_memory(&self, id: ResourceId, binding: MemoryBinding) -> Result<(), EngineFault> {
        logged(self.registry.bind_memory(id, binding))
    }

    /// Resource is destroyed. Its history is dropped.
    pub fn destroy_resource(&self, id: ResourceId) -> Result<(), EngineFault> {
        logged(self.registry.unregister(id))?;
        self.simulator.tracker().forget(id);
        Ok(())
    }

    /// Register queue of the family.
    pub fn add_queue(&self, id: QueueId, family: u32) -> Result<(), EngineFault> {
        logged(self.simulator.add_queue(id, family))
    }

    /// Create binary semaphore.
    pub fn create_semaphore(&self, id: SemaphoreId) {
        self.simulator.create_semaphore(id);
    }

    /// Destroy semaphore.
    pub fn destroy_semaphore(&self, id: SemaphoreId) -> Result<(), EngineFault> {
        logged(self.simulator.destroy_semaphore(id))
    }

    /// Create fence.
    pub fn create_fence(&self, id: FenceId, signaled: bool) {
        self.simulator.create_fence(id, signaled);
    }

    /// Destroy fence.
    pub fn destroy_fence(&self, id: FenceId) -> Result<(), EngineFault> {
        logged(self.simulator.destroy_fence(id))
    }

    /// Create event.
    pub fn create_event(&self, id: EventId) {
        self.events.write().insert(id);
    }

    /// Destroy event.
    pub fn destroy_event(&self, id: EventId) -> Result<(), EngineFault> {
        if self.events.write().remove(&id) {
            self.simulator.host_event(id);
            Ok(())
        } else {
            logged(Err(EngineFault::UnknownEvent(id)))
        }
    }

    fn check_events(&self, events: &[EventId]) -> Result<(), EngineFault> {
        let known = self.events.read();
        match events.iter().find(|event| !known.contains(event)) {
            Some(&event) => logged(Err(EngineFault::UnknownEvent(event))),
            None => Ok(()),
        }
    }

    /// Create command pool of the queue family.
    pub fn create_command_pool(
        &self,
        id: CommandPoolId,
        family: u32,
        individual_reset: bool,
    ) -> Result<(), EngineFault> {
        logged(self.capabilities().family_flags(family))?;
        self.pools.write().insert(
            id,
            Arc::new(Mutex::new(CommandPool::new(id, family, individual_reset))),
        );
        Ok(())
    }

    fn pool(&self, id: CommandPoolId) -> Result<Arc<Mutex<CommandPool>>, EngineFault> {
        logged(
            self.pools
                .read()
                .get(&id)
                .cloned()
                .ok_or(EngineFault::UnknownCommandPool(id)),
        )
    }

    /// Reset command pool.
    /// Command buffers go back to the initial state and their accesses leave the history.
    pub fn reset_command_pool(&self, id: CommandPoolId) -> Result<(), EngineFault> {
        let pool = self.pool(id)?;
        let ids = pool.lock().buffers();
        for buffer_id in ids {
            if let Some(buffer) = self.buffers.read().get(&buffer_id).cloned() {
                buffer.lock().mark_reset();
            }
        }
        self.simulator.tracker().forget_pool(id);
        Ok(())
    }

    /// Destroy command pool with its command buffers.
    pub fn destroy_command_pool(&self, id: CommandPoolId) -> Result<(), EngineFault> {
        let pool = logged(
            self.pools
                .write()
                .remove(&id)
                .ok_or(EngineFault::UnknownCommandPool(id)),
        )?;
        let ids = pool.lock().buffers();
        let mut buffers = self.buffers.write();
        for buffer_id in ids {
            buffers.remove(&buffer_id);
        }
        drop(buffers);
        self.simulator.tracker().forget_pool(id);
        Ok(())
    }

    /// Allocate command buffer from the pool.
    pub fn allocate_command_buffer(
        &self,
        pool: CommandPoolId,
        id: CommandBufferId,
        level: Level,
    ) -> Result<(), EngineFault> {
        let pool = self.pool(pool)?;
        let tracker = Tracker::new(
            self.registry.clone(),
            self.classifier.clone(),
            TrackerMode::Recording,
            RECORDING_SHARDS,
        );
        let buffer = pool.lock().allocate(id, level, tracker);
        self.buffers
            .write()
            .insert(id, Arc::new(Mutex::new(buffer)));
        Ok(())
    }

    /// Free command buffer.
    pub fn free_command_buffer(&self, id: CommandBufferId) -> Result<(), EngineFault> {
        let buffer = logged(
            self.buffers
                .write()
                .remove(&id)
                .ok_or(EngineFault::UnknownCommandBuffer(id)),
        )?;
        let pool = buffer.lock().pool();
        if let Ok(pool) = self.pool(pool) {
            pool.lock().free(id);
        }
        Ok(())
    }

    fn command_buffer(&self, id: CommandBufferId) -> Result<Arc<Mutex<CommandBuffer>>, EngineFault> {
        logged(
            self.buffers
                .read()
                .get(&id)
                .cloned()
                .ok_or(EngineFault::UnknownCommandBuffer(id)),
        )
    }

    fn record<F>(&self, id: CommandBufferId, f: F) -> Result<SubmitResult, EngineFault>
    where
        F: FnOnce(&mut CommandBuffer) -> Result<Vec<Hazard>, EngineFault>,
    {
        let buffer = self.command_buffer(id)?;
        let hazards = f(&mut buffer.lock());
        self.hazards(hazards)
    }

    /// `vkBeginCommandBuffer`.
    pub fn begin_command_buffer(&self, id: CommandBufferId, usage: Usage) -> Result<(), EngineFault> {
        logged(self.command_buffer(id)?.lock().begin(usage))
    }

    /// `vkEndCommandBuffer`.
    pub fn end_command_buffer(&self, id: CommandBufferId) -> Result<(), EngineFault> {
        logged(self.command_buffer(id)?.lock().end())
    }

    /// `vkResetCommandBuffer`.
    pub fn reset_command_buffer(&self, id: CommandBufferId) -> Result<(), EngineFault> {
        logged(self.command_buffer(id)?.lock().reset())
    }

    /// Memory access of a command.
    pub fn record_access(
        &self,
        command_buffer: CommandBufferId,
        function: Func,
        resource: ResourceId,
        range: SubresourceRange,
        scope: SyncScope,
    ) -> Result<SubmitResult, EngineFault> {
        self.record(command_buffer, |buffer| {
            buffer.record_access(function, resource, range, scope)
        })
    }

    /// `vkCmdPipelineBarrier` and `vkCmdPipelineBarrier2`.
    pub fn pipeline_barrier(
        &self,
        command_buffer: CommandBufferId,
        dependency: &Dependency,
    ) -> Result<SubmitResult, EngineFault> {
        self.record(command_buffer, |buffer| buffer.pipeline_barrier(dependency))
    }

    /// `vkCmdSetEvent`.
    pub fn set_event(
        &self,
        command_buffer: CommandBufferId,
        event: EventId,
        stages: Stages,
    ) -> Result<SubmitResult, EngineFault> {
        self.check_events(&[event])?;
        self.record(command_buffer, |buffer| buffer.set_event(event, stages))
    }

    /// `vkCmdSetEvent2`.
    pub fn set_event2(
        &self,
        command_buffer: CommandBufferId,
        event: EventId,
        dependency: &Dependency,
    ) -> Result<SubmitResult, EngineFault> {
        self.check_events(&[event])?;
        self.record(command_buffer, |buffer| buffer.set_event2(event, dependency))
    }

    /// `vkCmdResetEvent` and `vkCmdResetEvent2`.
    pub fn reset_event(
        &self,
        command_buffer: CommandBufferId,
        function: Func,
        event: EventId,
        stages: Stages,
    ) -> Result<SubmitResult, EngineFault> {
        self.check_events(&[event])?;
        self.record(command_buffer, |buffer| buffer.reset_event(function, event, stages))
    }

    /// `vkCmdWaitEvents` and `vkCmdWaitEvents2`.
    pub fn wait_events(
        &self,
        command_buffer: CommandBufferId,
        events: &[EventId],
        dependency: &Dependency,
    ) -> Result<SubmitResult, EngineFault> {
        self.check_events(events)?;
        self.record(command_buffer, |buffer| buffer.wait_events(events, dependency))
    }

    /// `vkCmdWriteTimestamp` and `vkCmdWriteTimestamp2`.
    pub fn write_timestamp(
        &self,
        command_buffer: CommandBufferId,
        function: Func,
        stage: Stages,
    ) -> Result<SubmitResult, EngineFault> {
        self.record(command_buffer, |buffer| buffer.write_timestamp(function, stage))
    }

    /// Create render pass.
    /// Findings are about its subpass dependencies.
    pub fn create_render_pass(
        &self,
        id: RenderPassId,
        render_pass: RenderPass,
    ) -> Result<SubmitResult, EngineFault> {
        let analyzer = Analyzer::new(&self.classifier, &self.registry);
        let hazards = render_pass.validate(&analyzer);
        let result = self.hazards(hazards)?;
        self.render_passes
            .write()
            .insert(id, Arc::new(render_pass));
        Ok(result)
    }

    /// Destroy render pass.
    pub fn destroy_render_pass(&self, id: RenderPassId) -> Result<(), EngineFault> {
        logged(
            self.render_passes
                .write()
                .remove(&id)
                .map(|_| ())
                .ok_or(EngineFault::UnknownRenderPass(id)),
        )
    }

    /// `vkCmdBeginRenderPass` and `vkCmdBeginRenderPass2`.
    /// `attachments` are the framebuffer attachments in render pass order.
    pub fn begin_render_pass(
        &self,
        command_buffer: CommandBufferId,
        function: Func,
        render_pass: RenderPassId,
        attachments: Vec<(ResourceId, ImageSubresourceRange)>,
    ) -> Result<SubmitResult, EngineFault> {
        let render_pass = logged(
            self.render_passes
                .read()
                .get(&render_pass)
                .cloned()
                .ok_or(EngineFault::UnknownRenderPass(render_pass)),
        )?;
        self.record(command_buffer, |buffer| {
            buffer.begin_render_pass(function, render_pass, attachments)
        })
    }

    /// `vkCmdNextSubpass` and `vkCmdNextSubpass2`.
    pub fn next_subpass(
        &self,
        command_buffer: CommandBufferId,
        function: Func,
    ) -> Result<SubmitResult, EngineFault> {
        self.record(command_buffer, |buffer| buffer.next_subpass(function))
    }

    /// `vkCmdEndRenderPass` and `vkCmdEndRenderPass2`.
    pub fn end_render_pass(
        &self,
        command_buffer: CommandBufferId,
        function: Func,
    ) -> Result<SubmitResult, EngineFault> {
        self.record(command_buffer, |buffer| buffer.end_render_pass(function))
    }

    /// `vkCmdExecuteCommands`.
    pub fn execute_commands(
        &self,
        command_buffer: CommandBufferId,
        secondaries: &[CommandBufferId],
    ) -> Result<SubmitResult, EngineFault> {
        if secondaries.contains(&command_buffer) {
            return logged(Err(EngineFault::InvalidState {
                command_buffer,
                state: "primary",
                expected: "secondary",
            }));
        }

        let mut ids: Vec<_> = secondaries
            .iter()
            .copied()
            .chain(Some(command_buffer))
            .collect();
        ids.sort_unstable();
        ids.dedup();
        let buffers = ids
            .iter()
            .map(|&id| self.command_buffer(id))
            .collect::<Result<Vec<_>, _>>()?;

        // Locks are taken in id order.
        let mut guards: Vec<_> = buffers.iter().map(|buffer| buffer.lock()).collect();
        let (mut primary, others): (Vec<_>, Vec<_>) = guards
            .iter_mut()
            .partition(|guard| guard.id() == command_buffer);
        let refs: Vec<&CommandBuffer> = secondaries
            .iter()
            .filter_map(|id| others.iter().find(|guard| guard.id() == *id))
            .map(|guard| &***guard)
            .collect();

        let hazards = match primary.pop() {
            Some(primary) => primary.execute_commands(&refs),
            None => Err(EngineFault::UnknownCommandBuffer(command_buffer)),
        };
        self.hazards(hazards)
    }

    /// `vkQueueSubmit` and `vkQueueSubmit2`.
    ///
    /// Command buffers that can't be submitted are reported and left out.
    /// Faults are raised before any state changes.
    pub fn submit(
        &self,
        queue: QueueId,
        function: Func,
        submissions: &[Submission],
        fence: Option<FenceId>,
    ) -> Result<SubmitResult, EngineFault> {
        profile_scope!("validator_submit");

        let family = logged(self.simulator.queue(queue))?.lock().family();
        let mut errors = Vec::new();
        let mut accepted = Accepted::default();
        let mut batches = Vec::with_capacity(submissions.len());
        let mut submitted = Vec::new();
        for submission in submissions {
            let mut batch = Batch::new();
            batch.waits.extend(submission.waits.iter().copied());
            batch.signals.extend(submission.signals.iter().copied());
            for (index, &id) in submission.command_buffers.iter().enumerate() {
                let buffer = self.command_buffer(id)?;
                let guard = buffer.lock();
                if let Some(error) = logged(accepted.check(&guard, family))? {
                    log::warn!("{} is left out of the submission: {:?}", id, error);
                    errors.push(self.classifier.structural(
                        Violation::Submit(error),
                        command_buffer_location(function, index),
                        None,
                    ));
                    continue;
                }
                logged(accepted.insert(&guard))?;
                batch.submits.push(logged(guard.recorded())?);
                drop(guard);
                submitted.push(buffer);
            }
            batches.push(batch);
        }

        let mut result = logged(self.simulator.submit(queue, function, &batches, fence))?;
        result.submit_errors.splice(0..0, errors);
        for buffer in submitted {
            if let Err(fault) = buffer.lock().mark_submitted() {
                log::error!("{}", fault);
            }
        }
        Ok(self.finish(result))
    }

    /// Host access to mapped memory.
    pub fn host_access(
        &self,
        resource: ResourceId,
        range: SubresourceRange,
        access: Access,
    ) -> Result<SubmitResult, EngineFault> {
        self.hazards(self.simulator.host_access(resource, &range, access))
    }

    /// `vkSetEvent` and `vkResetEvent`.
    pub fn host_event(&self, event: EventId) -> Result<(), EngineFault> {
        self.check_events(&[event])?;
        self.simulator.host_event(event);
        Ok(())
    }

    /// `vkWaitForFences`.
    pub fn wait_for_fences(&self, fences: &[FenceId], wait_all: bool) -> Result<(), EngineFault> {
        logged(self.simulator.wait_for_fences(fences, wait_all))
    }

    /// `vkResetFences`.
    pub fn reset_fences(&self, fences: &[FenceId]) -> Result<(), EngineFault> {
        logged(self.simulator.reset_fences(fences))
    }

    /// `vkQueueWaitIdle`.
    pub fn queue_wait_idle(&self, queue: QueueId) -> Result<(), EngineFault> {
        logged(self.simulator.queue_wait_idle(queue))
    }

    /// `vkDeviceWaitIdle`.
    pub fn device_wait_idle(&self) {
        self.simulator.device_wait_idle();
    }

    /// Copy device-wide state.
    pub fn snapshot(&self) -> SimulatorSnapshot {
        self.simulator.snapshot()
    }

    /// Replace device-wide state with the snapshot.
    pub fn restore(&self, snapshot: &SimulatorSnapshot) {
        self.simulator.restore(snapshot);
    }

    /// Forget device-wide history.
    /// Recorded command buffers stay executable.
    pub fn reset(&self) {
        self.simulator.reset();
    }
}
