use {
    crate::{
        hazard::{coalesce, Classifier, Hazard},
        op::{AccessInfo, BarrierOp, BarrierTarget, Ownership, QueueSync},
        range::{LinearRanges, SubresourceRange},
        registry::{Registry, ResourceInfo, Shards},
        state::AccessState,
    },
    parking_lot::Mutex,
    rangemap::RangeMap,
    smallvec::smallvec,
    std::{ops::Range, sync::Arc},
    syncval_core::{
        vk::{self, AccessFlags2 as Access, PipelineStageFlags2 as Stages},
        AccessScope, CommandPoolId, EngineFault, ResourceId, SyncScope,
    },
    thread_profiler::profile_scope,
};

/// How a tracker treats ranges it has no history for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackerMode {
    /// Device-wide history.
    /// Untouched images are in their creation layout and ownership transfers are checked.
    Device,

    /// History of a single command buffer recording.
    /// Layouts start unknown and ownership is left to replay.
    Recording,
}

/// Range map of one resource.
#[derive(Debug)]
struct ResourceTrack {
    info: Arc<ResourceInfo>,
    map: RangeMap<u64, AccessState>,
}

/// Copy of a tracker's state.
#[derive(Clone, Debug, Default)]
pub struct TrackerSnapshot {
    resources: Vec<(ResourceId, RangeMap<u64, AccessState>)>,
}

impl TrackerSnapshot {
    /// Number of resources with history.
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Check if no resource has history.
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// Per-resource access history with hazard detection.
///
/// Each resource is locked separately so unrelated resources are processed in parallel.
/// Operations spanning resources lock them one at a time in id order.
#[derive(Debug)]
pub struct Tracker {
    registry: Arc<Registry>,
    classifier: Classifier,
    mode: TrackerMode,
    resources: Shards<Arc<Mutex<ResourceTrack>>>,
}

fn segments(
    map: &RangeMap<u64, AccessState>,
    range: &Range<u64>,
    initial: &AccessState,
) -> Vec<(Range<u64>, AccessState)> {
    let mut segments: Vec<_> = map
        .overlapping(range)
        .map(|(segment, state)| {
            (
                segment.start.max(range.start)..segment.end.min(range.end),
                state.clone(),
            )
        })
        .collect();
    segments.extend(map.gaps(range).map(|gap| (gap, initial.clone())));
    segments.sort_by_key(|(segment, _)| segment.start);
    segments
}

/// Access the layout transition or ownership operation of a barrier performs.
fn barrier_access(op: &BarrierOp) -> AccessInfo {
    AccessInfo {
        scope: SyncScope::new(op.dst_exec, Access::MEMORY_WRITE).with_family(op.family),
        tag: op.tag,
        queue: op.queue,
        origin: op.origin,
    }
}

/// Barrier as it acts on ordering.
/// Release ignores its second scope, acquire its first.
fn effective_op(op: &BarrierOp) -> BarrierOp {
    match op.ownership {
        Ownership::None => op.clone(),
        Ownership::Release { .. } => BarrierOp {
            dst_exec: Stages::empty(),
            dst_access: AccessScope::empty(),
            ..op.clone()
        },
        Ownership::Acquire { .. } => BarrierOp {
            src_exec: Stages::from_raw(!0),
            src_access: AccessScope::empty(),
            ..op.clone()
        },
    }
}

impl Tracker {
    /// Create empty tracker over the registry.
    pub fn new(
        registry: Arc<Registry>,
        classifier: Classifier,
        mode: TrackerMode,
        shard_count: usize,
    ) -> Self {
        Tracker {
            registry,
            classifier,
            mode,
            resources: Shards::new(shard_count),
        }
    }

    /// Resources the tracker resolves ids against.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Classifier of findings.
    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Tracker mode.
    pub fn mode(&self) -> TrackerMode {
        self.mode
    }

    fn track(&self, id: ResourceId) -> Result<Arc<Mutex<ResourceTrack>>, EngineFault> {
        if let Some(track) = self.resources.get(id) {
            return Ok(track);
        }
        let info = self.registry.info(id)?;
        Ok(self.resources.get_or_insert_with(id, || {
            Arc::new(Mutex::new(ResourceTrack {
                info,
                map: RangeMap::new(),
            }))
        }))
    }

    fn initial(&self, info: &ResourceInfo) -> AccessState {
        match self.mode {
            TrackerMode::Device => AccessState::with_layout(info.initial_layout()),
            TrackerMode::Recording => AccessState::default(),
        }
    }

    /// Check `access` to the range against history and record it.
    pub fn record(
        &self,
        resource: ResourceId,
        range: &SubresourceRange,
        access: &AccessInfo,
    ) -> Result<Vec<Hazard>, EngineFault> {
        profile_scope!("record");

        let track = self.track(resource)?;
        let mut guard = track.lock();
        let ranges = guard.info.linearize(range)?;
        let initial = self.initial(&guard.info);

        let mut hazards = Vec::new();
        for range in &ranges {
            for (segment, mut state) in segments(&guard.map, range, &initial) {
                for detected in state.detect(access) {
                    hazards.push(
                        self.classifier
                            .classify(detected, resource, segment.clone(), access),
                    );
                }
                if self.mode == TrackerMode::Device {
                    if let Some(detected) = state.detect_missing_acquire(access) {
                        hazards.push(
                            self.classifier
                                .classify(detected, resource, segment.clone(), access),
                        );
                    }
                }
                state.record(access);
                guard.map.insert(segment, state);
            }
        }
        drop(guard);

        hazards.extend(self.alias_hazards(resource, &ranges, access)?);
        coalesce(&mut hazards);
        Ok(hazards)
    }

    /// Hazards of `access` against history of resources sharing memory with `resource`.
    /// Alias history is not changed.
    fn alias_hazards(
        &self,
        resource: ResourceId,
        ranges: &LinearRanges,
        access: &AccessInfo,
    ) -> Result<Vec<Hazard>, EngineFault> {
        let mut hazards: Vec<Hazard> = Vec::new();
        for alias in self.registry.aliases(resource)? {
            let track = match self.resources.get(alias.resource) {
                Some(track) => track,
                None => continue,
            };
            let guard = track.lock();
            let initial = self.initial(&guard.info);
            for range in ranges {
                let (own, other) = match alias.map(range) {
                    Some(mapped) => mapped,
                    None => continue,
                };
                for (_, state) in segments(&guard.map, &other, &initial) {
                    for detected in state.detect(access) {
                        let hazard = self
                            .classifier
                            .classify(detected, resource, own.clone(), access);
                        if !hazards.contains(&hazard) {
                            log::debug!(
                                "{} conflicts through memory shared with {}",
                                resource,
                                alias.resource
                            );
                            hazards.push(hazard);
                        }
                    }
                }
            }
        }
        Ok(hazards)
    }

    /// Apply the barriers of one command.
    ///
    /// All barriers are evaluated against the state before the command,
    /// so barriers of one command never chain with each other.
    pub fn apply_barriers(&self, ops: &[BarrierOp]) -> Result<Vec<Hazard>, EngineFault> {
        profile_scope!("apply_barriers");

        let mut ids: Vec<ResourceId> = ops
            .iter()
            .filter_map(|op| match op.target {
                BarrierTarget::Resource { resource, .. } => Some(resource),
                BarrierTarget::Global => None,
            })
            .collect();
        if ops.iter().any(|op| op.target == BarrierTarget::Global) {
            ids.extend(self.resources.sorted().into_iter().map(|(id, _)| id));
        }
        ids.sort();
        ids.dedup();

        let effective: Vec<BarrierOp> = ops.iter().map(effective_op).collect();
        let mut hazards = Vec::new();
        for id in ids {
            self.apply_to_resource(id, ops, &effective, &mut hazards)?;
        }

        coalesce(&mut hazards);
        Ok(hazards)
    }

    fn apply_to_resource(
        &self,
        id: ResourceId,
        ops: &[BarrierOp],
        effective: &[BarrierOp],
        hazards: &mut Vec<Hazard>,
    ) -> Result<(), EngineFault> {
        let track = self.track(id)?;
        let mut guard = track.lock();
        let initial = self.initial(&guard.info);
        let extent = guard.info.extent();

        let mut targets: Vec<(usize, LinearRanges)> = Vec::new();
        for (index, op) in ops.iter().enumerate() {
            let ranges = match op.target {
                BarrierTarget::Global if extent > 0 => smallvec![0..extent],
                BarrierTarget::Resource { resource, ref range } if resource == id => {
                    guard.info.linearize(range)?
                }
                _ => continue,
            };
            targets.push((index, ranges));
        }

        let mut effects = Vec::new();
        for &(index, ref ranges) in &targets {
            let op = &ops[index];
            let incoming = barrier_access(op);
            for range in ranges {
                for (segment, state) in segments(&guard.map, range, &initial) {
                    let detected = match op.ownership {
                        Ownership::Acquire {
                            src_family,
                            dst_family,
                        } => {
                            if self.mode == TrackerMode::Device {
                                state
                                    .detect_missing_release(src_family, dst_family, &incoming)
                                    .into_iter()
                                    .collect()
                            } else {
                                smallvec![]
                            }
                        }
                        _ => state.detect_transition(op, &incoming),
                    };
                    for detected in detected {
                        hazards.push(self.classifier.classify(
                            detected,
                            id,
                            segment.clone(),
                            &incoming,
                        ));
                    }
                    for (key, memory) in state.barrier_effects(&effective[index]) {
                        effects.push((segment.clone(), key, memory, index));
                    }
                }
            }
        }

        for (range, key, memory, index) in effects {
            for (segment, mut state) in segments(&guard.map, &range, &initial) {
                state.apply_effect(key, memory, &effective[index]);
                guard.map.insert(segment, state);
            }
        }

        for &(index, ref ranges) in &targets {
            let op = &ops[index];
            if op.layout.is_none() && op.ownership == Ownership::None {
                continue;
            }
            let incoming = barrier_access(op);
            for range in ranges {
                for (segment, mut state) in segments(&guard.map, range, &initial) {
                    match op.ownership {
                        Ownership::None => state.transition(op, &incoming),
                        Ownership::Release {
                            src_family,
                            dst_family,
                        } => {
                            state.transition(&effective[index], &incoming);
                            if self.mode == TrackerMode::Device {
                                state.release(src_family, dst_family, &incoming);
                            }
                        }
                        Ownership::Acquire {
                            src_family,
                            dst_family,
                        } => {
                            if let Some(transition) = op.layout {
                                state.set_layout(transition.new, &incoming);
                            }
                            state.complete_acquire(src_family, dst_family);
                        }
                    }
                    guard.map.insert(segment, state);
                }
            }
        }

        Ok(())
    }

    /// Import ordering across queues, or between a queue and the host.
    pub fn apply_queue_sync(&self, sync: &QueueSync) {
        profile_scope!("apply_queue_sync");

        for (_, track) in self.resources.sorted() {
            let mut guard = track.lock();
            let updated: Vec<_> = guard
                .map
                .iter()
                .map(|(range, state)| {
                    let mut state = state.clone();
                    state.sync_queues(sync);
                    (range.clone(), state)
                })
                .collect();
            for (range, state) in updated {
                guard.map.insert(range, state);
            }
        }
    }

    /// Drop accesses recorded from command buffers of the pool.
    pub fn forget_pool(&self, pool: CommandPoolId) {
        for (_, track) in self.resources.sorted() {
            let mut guard = track.lock();
            let updated: Vec<_> = guard
                .map
                .iter()
                .map(|(range, state)| {
                    let mut state = state.clone();
                    state.forget_pool(pool);
                    (range.clone(), state)
                })
                .collect();
            for (range, state) in updated {
                guard.map.insert(range, state);
            }
        }
    }

    /// Drop history of a destroyed resource.
    pub fn forget(&self, resource: ResourceId) {
        self.resources.remove(resource);
    }

    /// Last known layouts of the range.
    /// `None` where the layout is unknown.
    pub fn layouts(
        &self,
        resource: ResourceId,
        range: &SubresourceRange,
    ) -> Result<Vec<(Range<u64>, Option<vk::ImageLayout>)>, EngineFault> {
        Ok(self
            .states(resource, range)?
            .into_iter()
            .map(|(range, state)| (range, state.layout()))
            .collect())
    }

    /// Per-range states covering the range.
    pub fn states(
        &self,
        resource: ResourceId,
        range: &SubresourceRange,
    ) -> Result<Vec<(Range<u64>, AccessState)>, EngineFault> {
        let track = self.track(resource)?;
        let guard = track.lock();
        let initial = self.initial(&guard.info);
        let mut states = Vec::new();
        for range in &guard.info.linearize(range)? {
            states.extend(segments(&guard.map, range, &initial));
        }
        Ok(states)
    }

    /// Copy current state.
    pub fn snapshot(&self) -> TrackerSnapshot {
        TrackerSnapshot {
            resources: self
                .resources
                .sorted()
                .into_iter()
                .map(|(id, track)| (id, track.lock().map.clone()))
                .collect(),
        }
    }

    /// Replace current state with the snapshot.
    /// Resources unregistered since the snapshot are skipped.
    pub fn restore(&self, snapshot: &TrackerSnapshot) {
        self.resources.clear();
        for (id, map) in &snapshot.resources {
            match self.registry.info(*id) {
                Ok(info) => self.resources.insert(
                    *id,
                    Arc::new(Mutex::new(ResourceTrack {
                        info,
                        map: map.clone(),
                    })),
                ),
                Err(_) => log::debug!("Skip restoring {}, it is no longer registered", id),
            }
        }
    }

    /// Forget all history.
    pub fn reset(&self) {
        self.resources.clear();
    }

    /// Number of resources with history.
    pub fn tracked(&self) -> usize {
        self.resources.len()
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            hazard::HazardKind,
            op::{LayoutTransition, Origin},
            range::{BufferRange, ImageSubresourceRange},
            registry::{BufferInfo, ImageInfo, MemoryBinding},
        },
        syncval_catalog::Catalog,
        syncval_core::{CapabilityContext, DeviceCapabilities, MemoryId, QueueId, Tag},
    };

    const BUFFER: ResourceId = ResourceId(1);
    const IMAGE: ResourceId = ResourceId(2);

    fn tracker(mode: TrackerMode) -> Tracker {
        let registry = Arc::new(Registry::new(4));
        registry
            .register_buffer(
                BUFFER,
                BufferInfo {
                    size: 256,
                    sharing: vk::SharingMode::EXCLUSIVE,
                },
            )
            .unwrap();
        registry
            .register_image(
                IMAGE,
                ImageInfo {
                    aspects: vk::ImageAspectFlags::COLOR,
                    mip_levels: 2,
                    array_layers: 1,
                    initial_layout: vk::ImageLayout::UNDEFINED,
                    sharing: vk::SharingMode::EXCLUSIVE,
                },
            )
            .unwrap();
        let classifier = Classifier::new(
            Arc::new(Catalog::new()),
            Arc::new(CapabilityContext::new(
                DeviceCapabilities::SYNCHRONIZATION_2,
                vec![vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE],
            )),
            false,
        );
        Tracker::new(registry, classifier, mode, 4)
    }

    fn write(tag: u64) -> AccessInfo {
        AccessInfo {
            scope: SyncScope::new(Stages::COPY, Access::TRANSFER_WRITE).with_family(0),
            tag: Tag(tag),
            queue: QueueId(0),
            origin: Origin::default(),
        }
    }

    fn bytes(offset: u64, size: u64) -> SubresourceRange {
        BufferRange::new(offset, size).into()
    }

    fn transition(old: vk::ImageLayout, new: vk::ImageLayout, tag: u64) -> BarrierOp {
        BarrierOp {
            target: BarrierTarget::Resource {
                resource: IMAGE,
                range: ImageSubresourceRange::whole(vk::ImageAspectFlags::COLOR).into(),
            },
            src_exec: Stages::COPY,
            src_access: AccessScope::new(Stages::COPY, Access::TRANSFER_WRITE),
            dst_exec: Stages::FRAGMENT_SHADER,
            dst_access: AccessScope::new(Stages::FRAGMENT_SHADER, Access::SHADER_SAMPLED_READ),
            layout: Some(LayoutTransition { old, new }),
            ownership: Ownership::None,
            tag: Tag(tag),
            queue: QueueId(0),
            family: 0,
            before: None,
            origin: Origin::default(),
        }
    }

    #[test]
    fn overlapping_writes_report_intersection() {
        let tracker = tracker(TrackerMode::Device);
        assert!(tracker.record(BUFFER, &bytes(0, 64), &write(1)).unwrap().is_empty());
        let hazards = tracker.record(BUFFER, &bytes(32, 64), &write(2)).unwrap();
        assert_eq!(hazards.len(), 1);
        assert_eq!(hazards[0].kind, HazardKind::WriteAfterWrite);
        assert_eq!(hazards[0].range, Some(32..64));
        assert_eq!(hazards[0].rule.as_str(), "SYNC-HAZARD-WRITE-AFTER-WRITE");
    }

    #[test]
    fn disjoint_ranges_are_independent() {
        let tracker = tracker(TrackerMode::Device);
        tracker.record(BUFFER, &bytes(0, 64), &write(1)).unwrap();
        assert!(tracker
            .record(BUFFER, &bytes(64, 64), &write(2))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn aliased_buffers_share_history() {
        const ALIAS: ResourceId = ResourceId(3);

        let tracker = tracker(TrackerMode::Device);
        let registry = tracker.registry();
        registry
            .register_buffer(
                ALIAS,
                BufferInfo {
                    size: 128,
                    sharing: vk::SharingMode::EXCLUSIVE,
                },
            )
            .unwrap();
        let binding = |offset, size| MemoryBinding {
            memory: MemoryId(1),
            offset,
            size,
        };
        registry.bind_memory(BUFFER, binding(0, 256)).unwrap();
        registry.bind_memory(ALIAS, binding(128, 128)).unwrap();

        assert!(tracker.record(BUFFER, &bytes(192, 16), &write(1)).unwrap().is_empty());
        let hazards = tracker.record(ALIAS, &bytes(64, 16), &write(2)).unwrap();
        assert_eq!(hazards.len(), 1);
        assert_eq!(hazards[0].kind, HazardKind::WriteAfterWrite);
        assert_eq!(hazards[0].resource, Some(ALIAS));
        assert_eq!(hazards[0].range, Some(64..80));
        assert!(tracker.record(ALIAS, &bytes(0, 16), &write(3)).unwrap().is_empty());

        let hazards = tracker.record(BUFFER, &bytes(128, 16), &write(4)).unwrap();
        assert_eq!(hazards.len(), 1);
        assert_eq!(hazards[0].range, Some(128..144));
    }

    #[test]
    fn conflicting_old_layout() {
        let tracker = tracker(TrackerMode::Device);
        let hazards = tracker
            .apply_barriers(&[transition(
                vk::ImageLayout::UNDEFINED,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                1,
            )])
            .unwrap();
        assert!(hazards.is_empty());

        let hazards = tracker
            .apply_barriers(&[transition(
                vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                vk::ImageLayout::GENERAL,
                2,
            )])
            .unwrap();
        let layout: Vec<_> = hazards
            .iter()
            .filter(|hazard| hazard.kind == HazardKind::LayoutTransition)
            .collect();
        assert_eq!(layout.len(), 1);
        assert_eq!(
            layout[0].rule.as_str(),
            "VUID-VkImageMemoryBarrier2-oldLayout-01197"
        );
    }

    #[test]
    fn recording_mode_starts_with_unknown_layout() {
        let tracker = tracker(TrackerMode::Recording);
        let hazards = tracker
            .apply_barriers(&[transition(
                vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                vk::ImageLayout::GENERAL,
                1,
            )])
            .unwrap();
        assert!(hazards.is_empty());
        let range = ImageSubresourceRange::whole(vk::ImageAspectFlags::COLOR).into();
        let layouts = tracker.layouts(IMAGE, &range).unwrap();
        assert_eq!(layouts, vec![(0..2, Some(vk::ImageLayout::GENERAL))]);
    }

    #[test]
    fn transition_is_visible_to_second_scope() {
        let tracker = tracker(TrackerMode::Device);
        tracker
            .apply_barriers(&[transition(
                vk::ImageLayout::UNDEFINED,
                vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                1,
            )])
            .unwrap();
        let read = AccessInfo {
            scope: SyncScope::new(Stages::FRAGMENT_SHADER, Access::SHADER_SAMPLED_READ),
            tag: Tag(2),
            queue: QueueId(0),
            origin: Origin::default(),
        };
        let range = ImageSubresourceRange::whole(vk::ImageAspectFlags::COLOR).into();
        assert!(tracker.record(IMAGE, &range, &read).unwrap().is_empty());
    }

    #[test]
    fn global_barrier_orders_every_resource() {
        let tracker = tracker(TrackerMode::Device);
        tracker.record(BUFFER, &bytes(0, 256), &write(1)).unwrap();
        let global = BarrierOp {
            target: BarrierTarget::Global,
            layout: None,
            dst_exec: Stages::COPY,
            dst_access: AccessScope::new(Stages::COPY, Access::TRANSFER_WRITE),
            ..transition(vk::ImageLayout::UNDEFINED, vk::ImageLayout::UNDEFINED, 2)
        };
        assert!(tracker.apply_barriers(&[global]).unwrap().is_empty());
        assert!(tracker
            .record(BUFFER, &bytes(0, 256), &write(3))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn release_requires_acquire() {
        let tracker = tracker(TrackerMode::Device);
        let release = BarrierOp {
            target: BarrierTarget::Resource {
                resource: BUFFER,
                range: bytes(0, 256),
            },
            layout: None,
            ownership: Ownership::Release {
                src_family: 0,
                dst_family: 1,
            },
            ..transition(vk::ImageLayout::UNDEFINED, vk::ImageLayout::UNDEFINED, 1)
        };
        assert!(tracker.apply_barriers(&[release]).unwrap().is_empty());

        let mut read = write(2);
        read.scope = SyncScope::new(Stages::COPY, Access::TRANSFER_READ).with_family(1);
        read.queue = QueueId(1);
        let hazards = tracker.record(BUFFER, &bytes(0, 256), &read).unwrap();
        assert!(hazards
            .iter()
            .any(|hazard| hazard.kind == HazardKind::OwnershipTransfer));
    }

    #[test]
    fn snapshot_restores_history() {
        let tracker = tracker(TrackerMode::Device);
        tracker.record(BUFFER, &bytes(0, 64), &write(1)).unwrap();
        let snapshot = tracker.snapshot();
        tracker.reset();
        assert_eq!(tracker.tracked(), 0);
        tracker.restore(&snapshot);
        assert_eq!(
            tracker.record(BUFFER, &bytes(0, 64), &write(2)).unwrap().len(),
            1
        );
    }

    #[test]
    fn unknown_resource_is_a_fault() {
        let tracker = tracker(TrackerMode::Device);
        assert_eq!(
            tracker.record(ResourceId(99), &bytes(0, 1), &write(1)),
            Err(EngineFault::UnknownResource(ResourceId(99)))
        );
    }
}
