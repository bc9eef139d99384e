use {
    crate::{
        hazard::{Detected, HazardKind},
        op::{AccessInfo, BarrierOp, QueueSync},
    },
    smallvec::{smallvec, SmallVec},
    syncval_catalog::{HazardClass, ImageError, OwnershipError, Violation},
    syncval_core::{
        stage::single_stages,
        vk::{self, AccessFlags2 as Access, PipelineStageFlags2 as Stages},
        AccessScope, CommandPoolId, QueueId, SyncScope, Tag, Usage,
    },
};

/// Ordering one queue has established against one access.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueueScope {
    /// Queue.
    pub queue: QueueId,

    /// Tag since which the queue knows about the access.
    pub since: Tag,

    /// Stages of later commands on `queue` ordered after the access.
    pub chain: Stages,

    /// Accesses on `queue` the write is visible to.
    pub memory: AccessScope,
}

pub(crate) type RecordKey = (Tag, QueueId, Stages, bool);

/// Access remembered for a range.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessRecord {
    info: AccessInfo,
    layout_transition: bool,
    scopes: SmallVec<[QueueScope; 2]>,
}

impl AccessRecord {
    pub(crate) fn new(info: AccessInfo) -> Self {
        AccessRecord {
            info,
            layout_transition: false,
            scopes: smallvec![QueueScope {
                queue: info.queue,
                since: info.tag,
                chain: Stages::empty(),
                memory: AccessScope::empty(),
            }],
        }
    }

    fn transition(info: AccessInfo) -> Self {
        AccessRecord {
            layout_transition: true,
            ..AccessRecord::new(info)
        }
    }

    /// The access.
    pub fn info(&self) -> &AccessInfo {
        &self.info
    }

    /// Ordering per queue.
    pub fn scopes(&self) -> &[QueueScope] {
        &self.scopes
    }

    /// Ordering established on `queue`, if the queue knows about the access.
    pub fn scope_for(&self, queue: QueueId) -> Option<&QueueScope> {
        self.scopes.iter().find(|scope| scope.queue == queue)
    }

    fn scope_entry(&mut self, queue: QueueId, since: Tag) -> &mut QueueScope {
        let index = match self.scopes.iter().position(|scope| scope.queue == queue) {
            Some(index) => index,
            None => {
                self.scopes.push(QueueScope {
                    queue,
                    since,
                    chain: Stages::empty(),
                    memory: AccessScope::empty(),
                });
                self.scopes.len() - 1
            }
        };
        &mut self.scopes[index]
    }

    pub(crate) fn key(&self) -> RecordKey {
        (
            self.info.tag,
            self.info.queue,
            self.info.scope.stages,
            self.info.is_write(),
        )
    }

    fn barrier_entry(&self, op: &BarrierOp) -> Option<&QueueScope> {
        let entry = self.scope_for(op.queue)?;
        match op.before {
            Some(before) if entry.since >= before => None,
            _ => Some(entry),
        }
    }

    /// Check if the access is in the barrier's first execution scope,
    /// directly or through a dependency chain.
    pub(crate) fn exec_in_scope(&self, op: &BarrierOp) -> bool {
        self.barrier_entry(op).map_or(false, |entry| {
            entry.chain.intersects(op.src_exec)
                || (entry.queue == self.info.queue
                    && !self.info.scope.stages.is_empty()
                    && op.src_exec.contains(self.info.scope.stages))
        })
    }

    /// Check if the barrier makes the access available.
    /// Already available writes and layout transitions stay available along the chain.
    pub(crate) fn memory_in_scope(&self, op: &BarrierOp) -> bool {
        self.barrier_entry(op).map_or(false, |entry| {
            if entry.chain.intersects(op.src_exec)
                && (self.layout_transition || !entry.memory.is_empty())
            {
                return true;
            }
            if entry.queue != self.info.queue {
                return false;
            }
            let usages = self.info.scope.usages();
            !usages.is_empty() && usages.iter().all(|&usage| op.src_access.contains(usage))
        })
    }

    /// Check if `usage` on `queue` is ordered after this access.
    pub(crate) fn orders(&self, usage: Usage, queue: QueueId) -> bool {
        match self.scope_for(queue) {
            None => false,
            Some(entry) if self.info.is_write() => entry.memory.contains(usage),
            Some(entry) => entry.chain.contains(usage.stage),
        }
    }

    fn unordered(&self, usages: &[Usage], incoming: &AccessInfo) -> Option<SyncScope> {
        let (stages, access) = usages
            .iter()
            .filter(|&&usage| !self.orders(usage, incoming.queue))
            .fold((Stages::empty(), Access::empty()), |(stages, access), usage| {
                (stages | usage.stage, access | usage.access)
            });
        if access.is_empty() {
            None
        } else {
            Some(SyncScope::new(stages, access).with_family(incoming.scope.queue_family))
        }
    }

    fn apply_barrier(&mut self, op: &BarrierOp, memory: bool) {
        let is_write = self.info.is_write();
        let entry = self.scope_entry(op.queue, op.tag);
        entry.chain |= op.dst_exec;
        if memory && is_write {
            entry.memory.union(&op.dst_access);
        }
    }

    fn sync_queues(&mut self, sync: &QueueSync) {
        let own = self.info.queue == sync.src_queue && self.info.tag <= sync.src_tag;
        let chained = self.scope_for(sync.src_queue).map_or(false, |entry| {
            entry.queue != self.info.queue && entry.since <= sync.src_tag && !entry.chain.is_empty()
        });
        if !own && !chained {
            return;
        }
        let is_write = self.info.is_write();
        let entry = self.scope_entry(sync.dst_queue, sync.dst_tag);
        entry.chain |= sync.dst_exec;
        if is_write {
            entry.memory.union(&sync.dst_memory);
        }
    }

    fn from_pool(&self, pool: CommandPoolId) -> bool {
        self.info.origin.pool == Some(pool)
    }
}

/// Image layout of a range and the access that established it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayoutState {
    /// Current layout.
    pub layout: vk::ImageLayout,

    /// Transition that set it. `None` for the creation layout.
    pub setter: Option<AccessInfo>,
}

/// Release half of an ownership transfer waiting for its acquire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingRelease {
    /// Releasing family.
    pub src_family: u32,

    /// Family that must acquire.
    pub dst_family: u32,

    /// The release barrier.
    pub release: AccessInfo,
}

/// Everything known about a range of a resource.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccessState {
    last_write: Option<AccessRecord>,
    reads: SmallVec<[AccessRecord; 2]>,
    layout: Option<LayoutState>,
    release: Option<PendingRelease>,
}

impl AccessState {
    pub(crate) fn with_layout(layout: Option<vk::ImageLayout>) -> Self {
        AccessState {
            layout: layout.map(|layout| LayoutState {
                layout,
                setter: None,
            }),
            ..AccessState::default()
        }
    }

    /// Last write.
    pub fn last_write(&self) -> Option<&AccessRecord> {
        self.last_write.as_ref()
    }

    /// Reads since the last write, one per stage and queue.
    pub fn reads(&self) -> &[AccessRecord] {
        &self.reads
    }

    /// Last known image layout.
    pub fn layout(&self) -> Option<vk::ImageLayout> {
        self.layout.map(|state| state.layout)
    }

    /// Release waiting for an acquire.
    pub fn pending_release(&self) -> Option<&PendingRelease> {
        self.release.as_ref()
    }

    fn records(&self) -> impl Iterator<Item = &AccessRecord> {
        self.last_write.iter().chain(self.reads.iter())
    }

    fn records_mut(&mut self) -> impl Iterator<Item = &mut AccessRecord> {
        self.last_write.iter_mut().chain(self.reads.iter_mut())
    }

    /// Memory hazards of `incoming` against this range.
    pub(crate) fn detect(&self, incoming: &AccessInfo) -> SmallVec<[Detected; 2]> {
        let mut found = SmallVec::new();
        let (writes, reads): (SmallVec<[Usage; 4]>, SmallVec<[Usage; 4]>) = incoming
            .scope
            .usages()
            .into_iter()
            .partition(|usage| usage.is_write());

        if let Some(ref write) = self.last_write {
            if let Some(uncovered) = write.unordered(&reads, incoming) {
                found.push(memory_hazard(HazardKind::ReadAfterWrite, write, uncovered));
            }
        }

        if writes.is_empty() {
            return found;
        }

        if self.reads.is_empty() {
            if let Some(ref write) = self.last_write {
                if let Some(uncovered) = write.unordered(&writes, incoming) {
                    found.push(memory_hazard(HazardKind::WriteAfterWrite, write, uncovered));
                }
            }
        } else {
            for read in &self.reads {
                if let Some(uncovered) = read.unordered(&writes, incoming) {
                    found.push(memory_hazard(HazardKind::WriteAfterRead, read, uncovered));
                }
            }
        }

        found
    }

    /// Access from another family before a pending release is acquired.
    pub(crate) fn detect_missing_acquire(&self, incoming: &AccessInfo) -> Option<Detected> {
        let release = self.release?;
        if incoming.queue.is_host() || incoming.scope.queue_family == release.src_family {
            return None;
        }
        Some(Detected {
            kind: HazardKind::OwnershipTransfer,
            violation: Violation::Ownership(OwnershipError::MissingAcquire),
            prior: Some(release.release),
            uncovered: incoming.scope,
        })
    }

    /// Acquire without a matching release.
    pub(crate) fn detect_missing_release(
        &self,
        src_family: u32,
        dst_family: u32,
        incoming: &AccessInfo,
    ) -> Option<Detected> {
        match self.release {
            Some(release) if release.src_family == src_family && release.dst_family == dst_family => {
                None
            }
            release => Some(Detected {
                kind: HazardKind::OwnershipTransfer,
                violation: Violation::Ownership(OwnershipError::MissingRelease),
                prior: release.map(|release| release.release),
                uncovered: incoming.scope,
            }),
        }
    }

    /// Layout mismatch and hazards of the barrier's layout transition.
    pub(crate) fn detect_transition(
        &self,
        op: &BarrierOp,
        incoming: &AccessInfo,
    ) -> SmallVec<[Detected; 2]> {
        let mut found = SmallVec::new();
        let transition = match op.layout {
            Some(transition) => transition,
            None => return found,
        };

        if let Some(state) = self.layout {
            if transition.old != vk::ImageLayout::UNDEFINED && transition.old != state.layout {
                found.push(Detected {
                    kind: HazardKind::LayoutTransition,
                    violation: Violation::Image(ImageError::ConflictingLayout),
                    prior: state.setter,
                    uncovered: incoming.scope,
                });
            }
        }

        if transition.old == transition.new {
            return found;
        }

        if let Some(ref write) = self.last_write {
            if !(write.exec_in_scope(op) && write.memory_in_scope(op)) {
                found.push(memory_hazard(
                    HazardKind::WriteAfterWrite,
                    write,
                    incoming.scope,
                ));
            }
        }
        for read in &self.reads {
            if !read.exec_in_scope(op) {
                found.push(memory_hazard(
                    HazardKind::WriteAfterRead,
                    read,
                    incoming.scope,
                ));
            }
        }

        found
    }

    /// Records the barrier covers as `(key, memory)` pairs.
    /// Evaluated against the state before any barrier of the same command.
    pub(crate) fn barrier_effects(&self, op: &BarrierOp) -> SmallVec<[(RecordKey, bool); 2]> {
        self.records()
            .filter_map(|record| {
                let memory = record.memory_in_scope(op);
                if memory || record.exec_in_scope(op) {
                    Some((record.key(), memory))
                } else {
                    None
                }
            })
            .collect()
    }

    pub(crate) fn apply_effect(&mut self, key: RecordKey, memory: bool, op: &BarrierOp) {
        if let Some(record) = self.records_mut().find(|record| record.key() == key) {
            record.apply_barrier(op, memory);
        }
    }

    /// Record a new access.
    pub(crate) fn record(&mut self, info: &AccessInfo) {
        if info.scope.access.is_empty() {
            return;
        }

        if info.is_write() {
            self.last_write = Some(AccessRecord::new(*info));
            self.reads.clear();
            return;
        }

        for stage in single_stages(info.scope.stages) {
            let mut read = *info;
            read.scope.stages = stage;
            let record = AccessRecord::new(read);
            match self
                .reads
                .iter_mut()
                .find(|old| old.info.queue == info.queue && old.info.scope.stages == stage)
            {
                Some(old) => *old = record,
                None => self.reads.push(record),
            }
        }
    }

    /// Perform the layout transition of the barrier.
    /// The transition is a write ordered before the barrier's second scope.
    pub(crate) fn transition(&mut self, op: &BarrierOp, info: &AccessInfo) {
        let transition = match op.layout {
            Some(transition) => transition,
            None => return,
        };

        if transition.old != transition.new {
            let mut record = AccessRecord::transition(*info);
            let entry = record.scope_entry(op.queue, op.tag);
            entry.chain = op.dst_exec;
            entry.memory = op.dst_access.clone();
            self.last_write = Some(record);
            self.reads.clear();
        }

        self.layout = Some(LayoutState {
            layout: transition.new,
            setter: Some(*info),
        });
    }

    /// Set layout without an access, as the acquire half of a transfer does.
    pub(crate) fn set_layout(&mut self, layout: vk::ImageLayout, info: &AccessInfo) {
        self.layout = Some(LayoutState {
            layout,
            setter: Some(*info),
        });
    }

    pub(crate) fn release(&mut self, src_family: u32, dst_family: u32, info: &AccessInfo) {
        self.release = Some(PendingRelease {
            src_family,
            dst_family,
            release: *info,
        });
    }

    pub(crate) fn complete_acquire(&mut self, src_family: u32, dst_family: u32) {
        if let Some(release) = self.release {
            if release.src_family == src_family && release.dst_family == dst_family {
                self.release = None;
            }
        }
    }

    pub(crate) fn sync_queues(&mut self, sync: &QueueSync) {
        for record in self.records_mut() {
            record.sync_queues(sync);
        }
    }

    /// Drop accesses recorded from command buffers of `pool`.
    pub(crate) fn forget_pool(&mut self, pool: CommandPoolId) {
        if self
            .last_write
            .as_ref()
            .map_or(false, |write| write.from_pool(pool))
        {
            self.last_write = None;
        }
        self.reads.retain(|read| !read.from_pool(pool));
    }
}

fn memory_hazard(kind: HazardKind, prior: &AccessRecord, uncovered: SyncScope) -> Detected {
    let class = match kind {
        HazardKind::ReadAfterWrite => HazardClass::ReadAfterWrite,
        HazardKind::WriteAfterRead => HazardClass::WriteAfterRead,
        _ => HazardClass::WriteAfterWrite,
    };
    Detected {
        kind,
        violation: Violation::Hazard(class),
        prior: Some(prior.info),
        uncovered,
    }
}
