use {
    crate::event::Events,
    smallvec::SmallVec,
    syncval_core::{CommandBufferId, CommandPoolId, EngineFault, EventId, QueueId, ResourceId, Tag},
    syncval_resource::{
        AccessInfo, BarrierOp, BarrierTarget, Hazard, HazardKind, SubresourceRange, Tracker,
    },
    thread_profiler::profile_scope,
};

/// Recorded command as it affects synchronization.
///
/// Tags are local to the command buffer and accesses happen on `QueueId::RECORDING`
/// until the command is rebased onto a queue.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Memory access.
    Access {
        /// Accessed resource.
        resource: ResourceId,

        /// Accessed subresources.
        range: SubresourceRange,

        /// The access.
        access: AccessInfo,
    },

    /// Barriers of one command.
    Barriers(Vec<BarrierOp>),

    /// Event set.
    SetEvent {
        /// Event.
        event: EventId,

        /// Tag of the set operation.
        tag: Tag,
    },

    /// Event reset.
    ResetEvent {
        /// Event.
        event: EventId,
    },

    /// Wait on events.
    /// First scopes are bounded when the wait is replayed.
    WaitEvents {
        /// Waited events.
        events: SmallVec<[EventId; 2]>,

        /// Barriers of the wait.
        barriers: Vec<BarrierOp>,
    },
}

/// Placement of recorded commands on a queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rebase {
    /// Queue executing the commands.
    pub queue: QueueId,

    /// Tag of the first command.
    pub base: Tag,
}

impl Rebase {
    /// Global tag of a local tag.
    pub fn tag(&self, tag: Tag) -> Tag {
        self.base.offset(tag.0)
    }

    fn access(&self, access: &AccessInfo) -> AccessInfo {
        AccessInfo {
            tag: self.tag(access.tag),
            queue: self.queue,
            ..*access
        }
    }

    fn barrier(&self, op: &BarrierOp) -> BarrierOp {
        BarrierOp {
            tag: self.tag(op.tag),
            queue: self.queue,
            before: op.before.map(|before| self.tag(before)),
            ..op.clone()
        }
    }

    /// Check if the hazard is between two commands placed by this rebase.
    /// Those were reported when the commands were recorded.
    /// Ownership transfers are checked only on replay and never repeat.
    pub fn repeats_recording(&self, hazard: &Hazard) -> bool {
        hazard.kind != HazardKind::OwnershipTransfer
            && hazard.prior.map_or(false, |prior| {
                prior.queue == self.queue && prior.tag >= self.base
            })
    }
}

impl Command {
    /// Same command placed by `rebase`.
    pub fn rebased(&self, rebase: &Rebase) -> Command {
        match self {
            Command::Access {
                resource,
                range,
                access,
            } => Command::Access {
                resource: *resource,
                range: *range,
                access: rebase.access(access),
            },
            Command::Barriers(ops) => {
                Command::Barriers(ops.iter().map(|op| rebase.barrier(op)).collect())
            }
            Command::SetEvent { event, tag } => Command::SetEvent {
                event: *event,
                tag: rebase.tag(*tag),
            },
            Command::ResetEvent { event } => Command::ResetEvent { event: *event },
            Command::WaitEvents { events, barriers } => Command::WaitEvents {
                events: events.clone(),
                barriers: barriers.iter().map(|op| rebase.barrier(op)).collect(),
            },
        }
    }
}

/// Finished recording of a command buffer.
#[derive(Clone, Debug)]
pub struct Recorded {
    command_buffer: CommandBufferId,
    pool: CommandPoolId,
    family: u32,
    commands: Vec<Command>,
    secondaries: SmallVec<[CommandBufferId; 4]>,
    tags: u64,
}

impl Recorded {
    pub(crate) fn new(
        command_buffer: CommandBufferId,
        pool: CommandPoolId,
        family: u32,
        commands: Vec<Command>,
        secondaries: SmallVec<[CommandBufferId; 4]>,
        tags: u64,
    ) -> Self {
        Recorded {
            command_buffer,
            pool,
            family,
            commands,
            secondaries,
            tags,
        }
    }

    /// Recorded command buffer.
    pub fn command_buffer(&self) -> CommandBufferId {
        self.command_buffer
    }

    /// Pool of the command buffer.
    pub fn pool(&self) -> CommandPoolId {
        self.pool
    }

    /// Queue family of the pool.
    pub fn family(&self) -> u32 {
        self.family
    }

    /// Commands in recording order.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Number of tags the commands span.
    pub fn tags(&self) -> u64 {
        self.tags
    }

    /// Executed secondary command buffers recorded without simultaneous use.
    pub fn secondaries(&self) -> &[CommandBufferId] {
        &self.secondaries
    }

    /// Resources and ranges the commands access or put barriers on.
    pub fn resources(&self) -> impl Iterator<Item = (ResourceId, SubresourceRange)> + '_ {
        self.commands.iter().flat_map(|command| {
            let resources: SmallVec<[_; 4]> = match command {
                Command::Access {
                    resource, range, ..
                } => std::iter::once((*resource, *range)).collect(),
                Command::Barriers(ops) | Command::WaitEvents { barriers: ops, .. } => ops
                    .iter()
                    .filter_map(|op| match op.target {
                        BarrierTarget::Resource { resource, range } => Some((resource, range)),
                        BarrierTarget::Global => None,
                    })
                    .collect(),
                Command::SetEvent { .. } | Command::ResetEvent { .. } => SmallVec::new(),
            };
            resources
        })
    }

    /// Replay commands placed by `rebase` into the tracker.
    ///
    /// Hazards between two replayed commands are left out.
    pub fn replay(
        &self,
        tracker: &Tracker,
        events: &mut Events,
        rebase: Rebase,
    ) -> Result<Vec<Hazard>, EngineFault> {
        profile_scope!("replay");

        let mut hazards = Vec::new();
        for command in &self.commands {
            match command.rebased(&rebase) {
                Command::Access {
                    resource,
                    range,
                    access,
                } => hazards.extend(tracker.record(resource, &range, &access)?),
                Command::Barriers(ops) => hazards.extend(tracker.apply_barriers(&ops)?),
                Command::SetEvent { event, tag } => events.set(event, rebase.queue, tag),
                Command::ResetEvent { event } => events.reset(event),
                Command::WaitEvents {
                    events: waited,
                    mut barriers,
                } => {
                    let bound = match events.wait_bound(&waited, rebase.queue) {
                        Some(bound) => bound,
                        None => {
                            if rebase.queue != QueueId::RECORDING {
                                log::warn!(
                                    "{} waits on events {:?} not set on queue {}, nothing is ordered",
                                    self.command_buffer,
                                    waited,
                                    rebase.queue
                                );
                            }
                            Tag::ZERO
                        }
                    };
                    for op in &mut barriers {
                        op.before = Some(bound);
                    }
                    hazards.extend(tracker.apply_barriers(&barriers)?);
                }
            }
        }

        hazards.retain(|hazard| !rebase.repeats_recording(hazard));
        Ok(hazards)
    }
}
