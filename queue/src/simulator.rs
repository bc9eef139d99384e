//! Queue submission simulator.
//!
//! Replays recorded command buffers in submission order against the device-wide history.
//! Semaphores, fences and idle waits are turned into ordering between queues and the host.

use {
    crate::{
        fence::{Fence, FenceEpoch},
        queue::Queue,
        semaphore::{Semaphore, Signal},
        submission::{is_submit, Batch, SubmitResult},
    },
    fnv::{FnvHashMap, FnvHashSet},
    parking_lot::{Mutex, RwLock},
    smallvec::SmallVec,
    std::sync::Arc,
    syncval_catalog::{SubmitError, Violation},
    syncval_chain::{Analyzer, StageSide},
    syncval_command::{Command, Rebase},
    syncval_core::{
        stage,
        vk::{AccessFlags2 as Access, PipelineStageFlags2 as Stages},
        AccessScope, EngineFault, EventId, FenceId, Field, Func, Location, QueueId, ResourceId,
        SemaphoreId, Struct, SyncScope, Tag, TagSource,
    },
    syncval_resource::{
        AccessInfo, Hazard, Origin, QueueSync, SubresourceRange, Tracker, TrackerMode,
        TrackerSnapshot,
    },
    thread_profiler::profile_scope,
};

/// Copy of the simulator state.
#[derive(Clone, Debug)]
pub struct SimulatorSnapshot {
    tracker: TrackerSnapshot,
    next_tag: Tag,
    queues: Vec<Queue>,
    semaphores: FnvHashMap<SemaphoreId, Semaphore>,
    fences: FnvHashMap<FenceId, Fence>,
}

/// Device-wide replay of submissions.
#[derive(Debug)]
pub struct Simulator {
    tracker: Arc<Tracker>,
    tags: TagSource,
    queues: RwLock<FnvHashMap<QueueId, Arc<Mutex<Queue>>>>,
    semaphores: Mutex<FnvHashMap<SemaphoreId, Semaphore>>,
    fences: Mutex<FnvHashMap<FenceId, Fence>>,
}

fn wait_location(function: Func, index: usize) -> Location {
    match function {
        Func::QueueSubmit2 => Location::new(function)
            .with_parent(Field::PWaitSemaphoreInfos, index as u32)
            .with_struct(Struct::SemaphoreSubmitInfo)
            .with_field(Field::StageMask),
        _ => Location::new(function)
            .with_struct(Struct::SubmitInfo)
            .with_field(Field::PWaitDstStageMask),
    }
}

fn wait_semaphore_location(function: Func, index: usize) -> Location {
    match function {
        Func::QueueSubmit2 => Location::new(function)
            .with_parent(Field::PWaitSemaphoreInfos, index as u32)
            .with_struct(Struct::SemaphoreSubmitInfo)
            .with_field(Field::Semaphore),
        _ => Location::new(function).with_parent(Field::PWaitSemaphores, index as u32),
    }
}

fn signal_location(function: Func, index: usize) -> Location {
    match function {
        Func::QueueSubmit2 => Location::new(function)
            .with_parent(Field::PSignalSemaphoreInfos, index as u32)
            .with_struct(Struct::SemaphoreSubmitInfo)
            .with_field(Field::StageMask),
        _ => Location::new(function).with_parent(Field::PSignalSemaphores, index as u32),
    }
}

/// Location of the command buffer at `index` in a batch.
pub fn command_buffer_location(function: Func, index: usize) -> Location {
    match function {
        Func::QueueSubmit2 => Location::new(function)
            .with_parent(Field::PCommandBufferInfos, index as u32)
            .with_struct(Struct::CommandBufferSubmitInfo)
            .with_field(Field::CommandBuffer),
        _ => Location::new(function)
            .with_struct(Struct::SubmitInfo)
            .with_parent(Field::PCommandBuffers, index as u32),
    }
}

/// Findings of a batch that don't depend on the history.
#[derive(Debug, Default)]
struct Checked {
    errors: Vec<Hazard>,
    replayed: SmallVec<[bool; 8]>,
}

fn host_scope() -> (Stages, AccessScope) {
    (Stages::HOST, AccessScope::all_at(Stages::HOST))
}

impl Simulator {
    /// Create simulator over a device tracker.
    pub fn new(tracker: Arc<Tracker>) -> Self {
        debug_assert_eq!(tracker.mode(), TrackerMode::Device);
        Simulator {
            tracker,
            tags: TagSource::new(),
            queues: RwLock::new(FnvHashMap::default()),
            semaphores: Mutex::new(FnvHashMap::default()),
            fences: Mutex::new(FnvHashMap::default()),
        }
    }

    /// Device-wide history.
    pub fn tracker(&self) -> &Arc<Tracker> {
        &self.tracker
    }

    /// Source of replay tags.
    pub fn tags(&self) -> &TagSource {
        &self.tags
    }

    /// Register queue of the family.
    pub fn add_queue(&self, id: QueueId, family: u32) -> Result<(), EngineFault> {
        self.tracker
            .classifier()
            .capabilities()
            .family_flags(family)?;
        let previous = self
            .queues
            .write()
            .insert(id, Arc::new(Mutex::new(Queue::new(id, family))));
        if previous.is_some() {
            log::warn!("{} registered again, its history is dropped", id);
        }
        Ok(())
    }

    /// Registered queue.
    pub fn queue(&self, id: QueueId) -> Result<Arc<Mutex<Queue>>, EngineFault> {
        self.queues
            .read()
            .get(&id)
            .cloned()
            .ok_or(EngineFault::UnknownQueue(id))
    }

    /// Create unsignalled binary semaphore.
    pub fn create_semaphore(&self, id: SemaphoreId) {
        self.semaphores.lock().insert(id, Semaphore::new());
    }

    /// Destroy semaphore.
    pub fn destroy_semaphore(&self, id: SemaphoreId) -> Result<(), EngineFault> {
        self.semaphores
            .lock()
            .remove(&id)
            .map(|_| ())
            .ok_or(EngineFault::UnknownSemaphore(id))
    }

    /// State of the semaphore.
    pub fn semaphore(&self, id: SemaphoreId) -> Result<Semaphore, EngineFault> {
        self.semaphores
            .lock()
            .get(&id)
            .copied()
            .ok_or(EngineFault::UnknownSemaphore(id))
    }

    /// Create fence.
    pub fn create_fence(&self, id: FenceId, signaled: bool) {
        self.fences.lock().insert(id, Fence::new(signaled));
    }

    /// Destroy fence.
    pub fn destroy_fence(&self, id: FenceId) -> Result<(), EngineFault> {
        self.fences
            .lock()
            .remove(&id)
            .map(|_| ())
            .ok_or(EngineFault::UnknownFence(id))
    }

    /// State of the fence.
    pub fn fence(&self, id: FenceId) -> Result<Fence, EngineFault> {
        self.fences
            .lock()
            .get(&id)
            .copied()
            .ok_or(EngineFault::UnknownFence(id))
    }

    fn check_known(&self, batches: &[Batch], fence: Option<FenceId>) -> Result<(), EngineFault> {
        {
            let semaphores = self.semaphores.lock();
            for op in batches
                .iter()
                .flat_map(|batch| batch.waits.iter().chain(&batch.signals))
            {
                if !semaphores.contains_key(&op.semaphore) {
                    return Err(EngineFault::UnknownSemaphore(op.semaphore));
                }
            }
        }
        if let Some(fence) = fence {
            if !self.fences.lock().contains_key(&fence) {
                return Err(EngineFault::UnknownFence(fence));
            }
        }
        Ok(())
    }

    /// Submit batches to the queue.
    ///
    /// Every batch is replayed in order. Waits without a pending signal are reported
    /// and leave the batch unordered with other queues.
    /// Command buffers recorded for another queue family are reported and not replayed.
    ///
    /// Faults are raised before any state changes.
    pub fn submit(
        &self,
        queue: QueueId,
        function: Func,
        batches: &[Batch],
        fence: Option<FenceId>,
    ) -> Result<SubmitResult, EngineFault> {
        profile_scope!("submit");
        debug_assert!(is_submit(function), "{} doesn't submit", function);

        let shared = self.queue(queue)?;
        self.check_known(batches, fence)?;

        let mut guard = shared.lock();
        let family = guard.family();
        let supported = self
            .tracker
            .classifier()
            .capabilities()
            .supported_stages(family)?;
        let checked = batches
            .iter()
            .map(|batch| self.check_batch(queue, function, family, batch))
            .collect::<Result<Vec<_>, _>>()?;

        let mut result = SubmitResult::default();
        let mut touched = FnvHashSet::default();
        let start = self.tags.next();
        self.tracker.apply_queue_sync(&QueueSync {
            src_queue: QueueId::HOST,
            src_tag: start,
            dst_queue: queue,
            dst_tag: start,
            dst_exec: supported,
            dst_memory: AccessScope::all_at(supported),
        });

        let mut last = start;
        for (batch, checked) in batches.iter().zip(checked) {
            result.submit_errors.extend(checked.errors);
            let wait_tag = self.tags.reserve(batch.tags());
            for (index, wait) in batch.waits.iter().enumerate() {
                let dst_exec = stage::dst_execution(wait.stages, supported);
                result.submit_errors.extend(self.wait(
                    wait.semaphore,
                    wait_semaphore_location(function, index),
                    queue,
                    wait_tag,
                    dst_exec,
                ));
            }

            let mut base = wait_tag.next();
            for (recorded, replayed) in batch.submits.iter().zip(checked.replayed) {
                if !replayed {
                    continue;
                }
                log::trace!(
                    "Replay {} on {} from {}",
                    recorded.command_buffer(),
                    queue,
                    base
                );
                let rebase = Rebase { queue, base };
                match recorded.replay(&self.tracker, guard.events_mut(), rebase) {
                    Ok(hazards) => result.hazards.extend(hazards),
                    Err(fault) => log::error!(
                        "Replay of {} on {} stopped: {}",
                        recorded.command_buffer(),
                        queue,
                        fault
                    ),
                }
                touched.extend(recorded.commands().iter().filter_map(|command| match command {
                    Command::SetEvent { event, .. } | Command::ResetEvent { event } => Some(*event),
                    _ => None,
                }));
                base = base.offset(recorded.tags());
            }

            let signal_tag = base;
            for (index, op) in batch.signals.iter().enumerate() {
                result.submit_errors.extend(self.signal(
                    op.semaphore,
                    signal_location(function, index),
                    queue,
                    signal_tag,
                ));
            }
            last = signal_tag;
        }

        guard.mark_submitted(last);
        drop(guard);

        if let Some(fence) = fence {
            if let Some(fence) = self.fences.lock().get_mut(&fence) {
                fence.mark_submitted(FenceEpoch { queue, tag: last });
            }
        }

        self.forget_events(queue, &touched);
        Ok(result)
    }

    fn analyzer(&self) -> Analyzer<'_> {
        Analyzer::new(self.tracker.classifier(), self.tracker.registry())
    }

    /// Validate stage masks and command buffers of the batch.
    /// Every resource the batch touches must be known.
    fn check_batch(
        &self,
        queue: QueueId,
        function: Func,
        family: u32,
        batch: &Batch,
    ) -> Result<Checked, EngineFault> {
        let analyzer = self.analyzer();
        let mut checked = Checked::default();
        for (index, wait) in batch.waits.iter().enumerate() {
            let location = wait_location(function, index);
            checked.errors.extend(analyzer.validate_stage_mask(
                wait.stages,
                StageSide::Dst,
                location,
                Some(family),
            )?);
            if function == Func::QueueSubmit {
                checked
                    .errors
                    .extend(analyzer.validate_host_stage(wait.stages, location));
            }
        }
        if function == Func::QueueSubmit2 {
            for (index, signal) in batch.signals.iter().enumerate() {
                checked.errors.extend(analyzer.validate_stage_mask(
                    signal.stages,
                    StageSide::Src,
                    signal_location(function, index),
                    Some(family),
                )?);
            }
        }

        let registry = self.tracker.registry();
        for (index, recorded) in batch.submits.iter().enumerate() {
            for (resource, range) in recorded.resources() {
                registry.info(resource)?.linearize(&range)?;
            }
            let matches = recorded.family() == family;
            if !matches {
                log::warn!(
                    "{} recorded for family {} is submitted to {} of family {}",
                    recorded.command_buffer(),
                    recorded.family(),
                    queue,
                    family
                );
                checked.errors.push(self.tracker.classifier().structural(
                    Violation::Submit(SubmitError::CmdWrongQueueFamily),
                    command_buffer_location(function, index),
                    None,
                ));
            }
            checked.replayed.push(matches);
        }
        Ok(checked)
    }

    /// Consume the pending signal and order the batch after it.
    fn wait(
        &self,
        semaphore: SemaphoreId,
        location: Location,
        queue: QueueId,
        tag: Tag,
        dst_exec: Stages,
    ) -> Option<Hazard> {
        let waited = self.semaphores.lock().get_mut(&semaphore)?.wait(queue);
        match waited {
            Ok(Signal {
                queue: src_queue,
                tag: src_tag,
            }) => {
                log::debug!(
                    "{} waits {} signalled by {} {}",
                    queue,
                    semaphore,
                    src_queue,
                    src_tag
                );
                self.tracker.apply_queue_sync(&QueueSync {
                    src_queue,
                    src_tag,
                    dst_queue: queue,
                    dst_tag: tag,
                    dst_exec,
                    dst_memory: AccessScope::all_at(dst_exec),
                });
                None
            }
            Err(error) => {
                log::warn!(
                    "{} waits {} with no pending signal, the batch is unordered with other queues",
                    queue,
                    semaphore
                );
                Some(self.tracker.classifier().structural(
                    Violation::Submit(error),
                    location,
                    None,
                ))
            }
        }
    }

    fn signal(
        &self,
        semaphore: SemaphoreId,
        location: Location,
        queue: QueueId,
        tag: Tag,
    ) -> Option<Hazard> {
        let error = self
            .semaphores
            .lock()
            .get_mut(&semaphore)?
            .signal(Signal { queue, tag })
            .err()?;
        Some(self.tracker.classifier().structural(
            Violation::Submit(error),
            location,
            None,
        ))
    }

    /// Events set or reset on `queue` are no longer set on any other queue.
    fn forget_events(&self, queue: QueueId, events: &FnvHashSet<EventId>) {
        if events.is_empty() {
            return;
        }
        for (id, other) in self.queues.read().iter() {
            if *id == queue {
                continue;
            }
            let mut other = other.lock();
            for event in events {
                other.events_mut().reset(*event);
            }
        }
    }

    /// Event is set or reset by the host.
    /// Device sets preceding it no longer bound waits.
    pub fn host_event(&self, event: EventId) {
        for queue in self.queues.read().values() {
            queue.lock().events_mut().reset(event);
        }
    }

    /// Everything `queue` did up to `tag` is complete and visible to the host.
    fn host_wait(&self, queue: QueueId, tag: Tag) {
        let (dst_exec, dst_memory) = host_scope();
        self.tracker.apply_queue_sync(&QueueSync {
            src_queue: queue,
            src_tag: tag,
            dst_queue: QueueId::HOST,
            dst_tag: self.tags.next(),
            dst_exec,
            dst_memory,
        });
    }

    /// Host waits for fences.
    ///
    /// Without `wait_all` a wait on several fences doesn't tell which one signalled
    /// and orders nothing.
    pub fn wait_for_fences(&self, fences: &[FenceId], wait_all: bool) -> Result<(), EngineFault> {
        let mut table = self.fences.lock();
        for id in fences {
            if !table.contains_key(id) {
                return Err(EngineFault::UnknownFence(*id));
            }
        }
        if !wait_all && fences.len() > 1 {
            log::debug!("Wait for any of {} fences orders nothing", fences.len());
            return Ok(());
        }

        let mut completed = Vec::new();
        for id in fences {
            if let Some(epoch) = table.get_mut(id).and_then(Fence::complete) {
                completed.push(epoch);
            }
        }
        drop(table);

        for epoch in completed {
            self.host_wait(epoch.queue, epoch.tag);
        }
        Ok(())
    }

    /// Host resets fences.
    pub fn reset_fences(&self, fences: &[FenceId]) -> Result<(), EngineFault> {
        let mut table = self.fences.lock();
        for id in fences {
            table
                .get_mut(id)
                .ok_or(EngineFault::UnknownFence(*id))?
                .reset();
        }
        Ok(())
    }

    /// Host waits for the queue to go idle.
    pub fn queue_wait_idle(&self, queue: QueueId) -> Result<(), EngineFault> {
        let last = self.queue(queue)?.lock().last();
        if let Some(last) = last {
            self.host_wait(queue, last);
        }
        Ok(())
    }

    /// Host waits for every queue to go idle.
    pub fn device_wait_idle(&self) {
        let queues: Vec<_> = self
            .queues
            .read()
            .values()
            .map(|queue| {
                let queue = queue.lock();
                (queue.id(), queue.last())
            })
            .collect();
        for (queue, last) in queues {
            if let Some(last) = last {
                self.host_wait(queue, last);
            }
        }
    }

    /// Host access to mapped memory of the resource.
    pub fn host_access(
        &self,
        resource: ResourceId,
        range: &SubresourceRange,
        access: Access,
    ) -> Result<Vec<Hazard>, EngineFault> {
        let info = AccessInfo {
            scope: SyncScope::new(Stages::HOST, access),
            tag: self.tags.next(),
            queue: QueueId::HOST,
            origin: Origin::at(Location::new(Func::MapMemory)),
        };
        self.tracker.record(resource, range, &info)
    }

    /// Copy current state.
    pub fn snapshot(&self) -> SimulatorSnapshot {
        let mut queues: Vec<_> = self
            .queues
            .read()
            .values()
            .map(|queue| queue.lock().clone())
            .collect();
        queues.sort_by_key(Queue::id);
        SimulatorSnapshot {
            tracker: self.tracker.snapshot(),
            next_tag: self.tags.peek(),
            queues,
            semaphores: self.semaphores.lock().clone(),
            fences: self.fences.lock().clone(),
        }
    }

    /// Replace current state with the snapshot.
    /// Queues registered since the snapshot are kept idle.
    pub fn restore(&self, snapshot: &SimulatorSnapshot) {
        self.tracker.restore(&snapshot.tracker);
        self.tags.restart(snapshot.next_tag);
        let queues = self.queues.read();
        for (id, queue) in queues.iter() {
            let mut queue = queue.lock();
            match snapshot.queues.iter().find(|saved| saved.id() == *id) {
                Some(saved) => *queue = saved.clone(),
                None => queue.clear(),
            }
        }
        *self.semaphores.lock() = snapshot.semaphores.clone();
        *self.fences.lock() = snapshot.fences.clone();
    }

    /// Forget all history.
    /// Queues, semaphores and fences stay registered without pending operations.
    pub fn reset(&self) {
        self.tracker.reset();
        self.tags.restart(Tag::ZERO);
        for queue in self.queues.read().values() {
            queue.lock().clear();
        }
        for semaphore in self.semaphores.lock().values_mut() {
            semaphore.clear();
        }
        for fence in self.fences.lock().values_mut() {
            fence.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::fence::FenceState,
        syncval_catalog::Catalog,
        syncval_command::{CommandPool, Level, Recorded, Usage},
        syncval_core::{
            vk::{self, QueueFlags},
            CapabilityContext, CommandBufferId, CommandPoolId, DeviceCapabilities,
        },
        syncval_resource::{BufferInfo, BufferRange, Classifier, HazardKind, Registry},
    };

    const BUFFER: ResourceId = ResourceId(1);
    const GRAPHICS: QueueId = QueueId(0);
    const COMPUTE: QueueId = QueueId(1);
    const TRANSFER: QueueId = QueueId(2);

    struct Setup {
        registry: Arc<Registry>,
        classifier: Classifier,
        pool: CommandPool,
        simulator: Simulator,
        next_buffer: u64,
    }

    impl Setup {
        fn new() -> Self {
            let registry = Arc::new(Registry::new(2));
            registry
                .register_buffer(
                    BUFFER,
                    BufferInfo {
                        size: 256,
                        sharing: vk::SharingMode::EXCLUSIVE,
                    },
                )
                .unwrap();
            let classifier = Classifier::new(
                Arc::new(Catalog::new()),
                Arc::new(CapabilityContext::new(
                    DeviceCapabilities::SYNCHRONIZATION_2,
                    vec![
                        QueueFlags::GRAPHICS | QueueFlags::COMPUTE | QueueFlags::TRANSFER,
                        QueueFlags::TRANSFER,
                    ],
                )),
                false,
            );
            let tracker = Tracker::new(
                registry.clone(),
                classifier.clone(),
                TrackerMode::Device,
                2,
            );
            let simulator = Simulator::new(Arc::new(tracker));
            simulator.add_queue(GRAPHICS, 0).unwrap();
            simulator.add_queue(COMPUTE, 0).unwrap();
            simulator.add_queue(TRANSFER, 1).unwrap();
            Setup {
                registry,
                classifier,
                pool: CommandPool::new(CommandPoolId(1), 0, true),
                simulator,
                next_buffer: 1,
            }
        }

        /// Command buffer performing the accesses to the whole buffer in order.
        fn record(&mut self, accesses: &[SyncScope]) -> Arc<Recorded> {
            let tracker = Tracker::new(
                self.registry.clone(),
                self.classifier.clone(),
                TrackerMode::Recording,
                2,
            );
            let id = CommandBufferId(self.next_buffer);
            self.next_buffer += 1;
            let mut buffer = self.pool.allocate(id, Level::Primary, tracker);
            buffer.begin(Usage::MultiShot).unwrap();
            for &access in accesses {
                buffer
                    .record_access(Func::CmdCopyBuffer, BUFFER, whole(), access)
                    .unwrap();
            }
            buffer.end().unwrap();
            buffer.recorded().unwrap()
        }

        fn submit(&self, queue: QueueId, batch: Batch) -> SubmitResult {
            self.simulator
                .submit(queue, Func::QueueSubmit2, &[batch], None)
                .unwrap()
        }
    }

    fn whole() -> SubresourceRange {
        BufferRange::whole().into()
    }

    fn write() -> SyncScope {
        SyncScope::new(Stages::COPY, Access::TRANSFER_WRITE)
    }

    fn read() -> SyncScope {
        SyncScope::new(Stages::COPY, Access::TRANSFER_READ)
    }

    fn rules(hazards: &[Hazard]) -> Vec<&'static str> {
        hazards.iter().map(|hazard| hazard.rule.as_str()).collect()
    }

    #[test]
    fn unordered_queues_race() {
        let mut setup = Setup::new();
        let first = setup.record(&[write()]);
        let second = setup.record(&[write()]);

        assert!(setup.submit(GRAPHICS, Batch::new().submits(Some(first))).is_clean());
        let result = setup.submit(COMPUTE, Batch::new().submits(Some(second)));
        assert!(result.submit_errors.is_empty());
        assert_eq!(result.hazards.len(), 1);
        assert_eq!(result.hazards[0].kind, HazardKind::WriteAfterWrite);
        assert!(result.hazards[0].racing);
        assert_eq!(result.hazards[0].prior.unwrap().queue, GRAPHICS);
        assert_eq!(result.hazards[0].range, Some(0..256));
    }

    #[test]
    fn semaphore_orders_queues() {
        let mut setup = Setup::new();
        setup.simulator.create_semaphore(SemaphoreId(1));
        let first = setup.record(&[write()]);
        let second = setup.record(&[write()]);

        let signal = Batch::new().submits(Some(first)).signal(SemaphoreId(1));
        assert!(setup.submit(GRAPHICS, signal).is_clean());
        assert!(setup
            .simulator
            .semaphore(SemaphoreId(1))
            .unwrap()
            .pending()
            .is_some());

        let wait = Batch::new()
            .wait(SemaphoreId(1), Stages::COPY)
            .submits(Some(second));
        assert!(setup.submit(COMPUTE, wait).is_clean());
        assert_eq!(
            setup.simulator.semaphore(SemaphoreId(1)).unwrap().waiter(),
            Some(COMPUTE)
        );
    }

    #[test]
    fn wait_without_signal_orders_nothing() {
        let mut setup = Setup::new();
        setup.simulator.create_semaphore(SemaphoreId(1));
        let first = setup.record(&[write()]);
        let second = setup.record(&[write()]);

        assert!(setup.submit(GRAPHICS, Batch::new().submits(Some(first))).is_clean());
        let wait = Batch::new()
            .wait(SemaphoreId(1), Stages::ALL_COMMANDS)
            .submits(Some(second));
        let result = setup.submit(COMPUTE, wait);
        assert_eq!(
            rules(&result.submit_errors),
            vec!["VUID-vkQueueSubmit2-semaphore-03873"]
        );
        assert_eq!(result.hazards.len(), 1);
        assert_eq!(result.hazards[0].kind, HazardKind::WriteAfterWrite);
    }

    #[test]
    fn double_signal() {
        let setup = Setup::new();
        setup.simulator.create_semaphore(SemaphoreId(1));
        let signal = || Batch::new().signal(SemaphoreId(1));

        let result = setup
            .simulator
            .submit(GRAPHICS, Func::QueueSubmit, &[signal(), signal()], None)
            .unwrap();
        assert_eq!(
            rules(&result.submit_errors),
            vec!["VUID-vkQueueSubmit-pSignalSemaphores-00067"]
        );
    }

    #[test]
    fn second_waiter() {
        let setup = Setup::new();
        setup.simulator.create_semaphore(SemaphoreId(1));
        assert!(setup
            .submit(GRAPHICS, Batch::new().signal(SemaphoreId(1)))
            .is_clean());
        let wait = || Batch::new().wait(SemaphoreId(1), Stages::ALL_COMMANDS);
        assert!(setup.submit(COMPUTE, wait()).is_clean());
        let result = setup.submit(GRAPHICS, wait());
        assert_eq!(
            rules(&result.submit_errors),
            vec!["VUID-vkQueueSubmit2-semaphore-03871"]
        );
    }

    #[test]
    fn wait_masks_are_validated() {
        let setup = Setup::new();
        setup.simulator.create_semaphore(SemaphoreId(1));
        let signal = Batch::new().signal(SemaphoreId(1));

        let host = Batch::new().wait(SemaphoreId(1), Stages::HOST);
        let result = setup
            .simulator
            .submit(GRAPHICS, Func::QueueSubmit, &[signal, host], None)
            .unwrap();
        assert_eq!(
            rules(&result.submit_errors),
            vec!["VUID-VkSubmitInfo-pWaitDstStageMask-00078"]
        );

        assert!(setup
            .submit(GRAPHICS, Batch::new().signal(SemaphoreId(1)))
            .is_clean());
        let fragment = Batch::new().wait(SemaphoreId(1), Stages::FRAGMENT_SHADER);
        let result = setup.submit(TRANSFER, fragment);
        assert_eq!(
            rules(&result.submit_errors),
            vec!["VUID-vkQueueSubmit2-stageMask-03870"]
        );
    }

    #[test]
    fn host_write_is_visible_to_later_submission() {
        let mut setup = Setup::new();
        let reader = setup.record(&[read()]);
        assert!(setup
            .simulator
            .host_access(BUFFER, &whole(), Access::HOST_WRITE)
            .unwrap()
            .is_empty());
        assert!(setup.submit(GRAPHICS, Batch::new().submits(Some(reader))).is_clean());
    }

    #[test]
    fn fence_orders_queue_before_host() {
        let mut setup = Setup::new();
        setup.simulator.create_fence(FenceId(1), false);
        let writer = setup.record(&[write()]);
        setup
            .simulator
            .submit(
                GRAPHICS,
                Func::QueueSubmit2,
                &[Batch::new().submits(Some(writer))],
                Some(FenceId(1)),
            )
            .unwrap();
        assert!(setup.simulator.fence(FenceId(1)).unwrap().is_submitted());

        let snapshot = setup.simulator.snapshot();
        let hazards = setup
            .simulator
            .host_access(BUFFER, &whole(), Access::HOST_READ)
            .unwrap();
        assert_eq!(hazards.len(), 1);
        assert_eq!(hazards[0].kind, HazardKind::ReadAfterWrite);

        setup.simulator.restore(&snapshot);
        setup.simulator.wait_for_fences(&[FenceId(1)], true).unwrap();
        assert_eq!(
            setup.simulator.fence(FenceId(1)).unwrap().state(),
            FenceState::Signaled
        );
        assert!(setup
            .simulator
            .host_access(BUFFER, &whole(), Access::HOST_READ)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn idle_queue_is_ordered_before_host() {
        let mut setup = Setup::new();
        let writer = setup.record(&[write()]);
        setup.submit(COMPUTE, Batch::new().submits(Some(writer)));
        setup.simulator.queue_wait_idle(COMPUTE).unwrap();
        assert!(setup
            .simulator
            .host_access(BUFFER, &whole(), Access::HOST_WRITE)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn recording_hazards_are_not_repeated() {
        let mut setup = Setup::new();
        let twice = setup.record(&[write(), write()]);

        assert!(setup
            .submit(GRAPHICS, Batch::new().submits(Some(twice.clone())))
            .is_clean());
        let result = setup.submit(GRAPHICS, Batch::new().submits(Some(twice)));
        assert_eq!(result.hazards.len(), 1);
        assert!(!result.hazards[0].racing);
    }

    #[test]
    fn reset_replays_identically() {
        let mut setup = Setup::new();
        let first = setup.record(&[write()]);
        let second = setup.record(&[read()]);
        let run = |setup: &Setup| {
            let mut result = setup.submit(GRAPHICS, Batch::new().submits(Some(first.clone())));
            result.extend(setup.submit(COMPUTE, Batch::new().submits(Some(second.clone()))));
            result
        };

        let once = run(&setup);
        assert_eq!(once.hazards.len(), 1);
        setup.simulator.reset();
        assert_eq!(setup.simulator.tracker().tracked(), 0);
        assert_eq!(run(&setup), once);
    }

    #[test]
    fn foreign_family_is_reported_and_skipped() {
        let mut setup = Setup::new();
        let writer = setup.record(&[write()]);
        let result = setup.submit(TRANSFER, Batch::new().submits(Some(writer.clone())));
        assert_eq!(
            rules(&result.submit_errors),
            vec!["VUID-vkQueueSubmit2-commandBuffer-03878"]
        );
        assert!(result.hazards.is_empty());
        assert_eq!(setup.simulator.tracker().tracked(), 0);

        let result = setup
            .simulator
            .submit(
                TRANSFER,
                Func::QueueSubmit,
                &[Batch::new().submits(Some(writer))],
                None,
            )
            .unwrap();
        assert_eq!(
            rules(&result.submit_errors),
            vec!["VUID-vkQueueSubmit-pCommandBuffers-00074"]
        );
    }

    #[test]
    fn faulting_batch_changes_nothing() {
        const STALE: ResourceId = ResourceId(2);

        let mut setup = Setup::new();
        setup.simulator.create_semaphore(SemaphoreId(1));
        setup.simulator.create_fence(FenceId(1), false);
        let writer = setup.record(&[write()]);
        setup
            .registry
            .register_buffer(
                STALE,
                BufferInfo {
                    size: 64,
                    sharing: vk::SharingMode::EXCLUSIVE,
                },
            )
            .unwrap();
        let stale = {
            let tracker = Tracker::new(
                setup.registry.clone(),
                setup.classifier.clone(),
                TrackerMode::Recording,
                2,
            );
            let mut buffer = setup
                .pool
                .allocate(CommandBufferId(99), Level::Primary, tracker);
            buffer.begin(Usage::MultiShot).unwrap();
            buffer
                .record_access(Func::CmdFillBuffer, STALE, whole(), write())
                .unwrap();
            buffer.end().unwrap();
            buffer.recorded().unwrap()
        };
        setup.registry.unregister(STALE).unwrap();

        let batches = [
            Batch::new()
                .submits(Some(writer.clone()))
                .signal(SemaphoreId(1)),
            Batch::new().submits(Some(stale)),
        ];
        let fault = setup
            .simulator
            .submit(GRAPHICS, Func::QueueSubmit2, &batches, Some(FenceId(1)))
            .unwrap_err();
        assert_eq!(fault, EngineFault::UnknownResource(STALE));

        assert_eq!(setup.simulator.tracker().tracked(), 0);
        assert!(setup
            .simulator
            .semaphore(SemaphoreId(1))
            .unwrap()
            .pending()
            .is_none());
        assert!(!setup.simulator.fence(FenceId(1)).unwrap().is_submitted());
        assert_eq!(setup.simulator.queue(GRAPHICS).unwrap().lock().last(), None);
        assert!(setup
            .submit(COMPUTE, Batch::new().submits(Some(writer)))
            .is_clean());
    }

    #[test]
    fn unknown_handles_are_faults() {
        let setup = Setup::new();
        assert_eq!(
            setup
                .simulator
                .submit(QueueId(9), Func::QueueSubmit, &[], None)
                .unwrap_err(),
            EngineFault::UnknownQueue(QueueId(9))
        );
        assert_eq!(
            setup
                .simulator
                .submit(
                    GRAPHICS,
                    Func::QueueSubmit,
                    &[Batch::new().wait(SemaphoreId(4), Stages::ALL_COMMANDS)],
                    None
                )
                .unwrap_err(),
            EngineFault::UnknownSemaphore(SemaphoreId(4))
        );
        assert_eq!(
            setup.simulator.wait_for_fences(&[FenceId(3)], true),
            Err(EngineFault::UnknownFence(FenceId(3)))
        );
    }
}
