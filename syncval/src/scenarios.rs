use {
    crate::{
        chain::{Barrier, Dependency},
        command::{Level, Usage},
        queue::SubmitResult,
        resource::{
            BufferInfo, BufferRange, HazardKind, ImageInfo, ImageSubresourceRange, MemoryBinding,
        },
        vk::{self, AccessFlags2 as Access, PipelineStageFlags2 as Stages, QueueFlags},
        CapabilityContext, CommandBufferId, CommandPoolId, Config, DeviceCapabilities, EngineFault,
        Func, MemoryId, QueueId, ResourceId, SemaphoreId, Submission, SyncScope, Validator,
    },
    std::{sync::Arc, thread},
};

pub(super) const BUFFER: ResourceId = ResourceId(1);
pub(super) const IMAGE: ResourceId = ResourceId(2);
pub(super) const GRAPHICS: QueueId = QueueId(0);
pub(super) const COMPUTE: QueueId = QueueId(1);
pub(super) const TRANSFER: QueueId = QueueId(2);
pub(super) const UNIVERSAL_POOL: CommandPoolId = CommandPoolId(1);
pub(super) const TRANSFER_POOL: CommandPoolId = CommandPoolId(2);

/// Device with a universal family of two queues and a transfer-only family of one.
pub(super) struct Setup {
    pub validator: Validator,
    next_buffer: u64,
}

impl Setup {
    pub fn new() -> Self {
        Setup::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let _ = simple_logger::init();
        let validator = Validator::new(
            CapabilityContext::new(
                DeviceCapabilities::SYNCHRONIZATION_2,
                vec![
                    QueueFlags::GRAPHICS | QueueFlags::COMPUTE | QueueFlags::TRANSFER,
                    QueueFlags::TRANSFER,
                ],
            ),
            config,
        );
        validator
            .register_buffer(
                BUFFER,
                BufferInfo {
                    size: 256,
                    sharing: vk::SharingMode::EXCLUSIVE,
                },
            )
            .unwrap();
        validator
            .register_image(
                IMAGE,
                ImageInfo {
                    aspects: vk::ImageAspectFlags::COLOR,
                    mip_levels: 1,
                    array_layers: 1,
                    initial_layout: vk::ImageLayout::UNDEFINED,
                    sharing: vk::SharingMode::EXCLUSIVE,
                },
            )
            .unwrap();
        validator.add_queue(GRAPHICS, 0).unwrap();
        validator.add_queue(COMPUTE, 0).unwrap();
        validator.add_queue(TRANSFER, 1).unwrap();
        validator
            .create_command_pool(UNIVERSAL_POOL, 0, true)
            .unwrap();
        validator.create_command_pool(TRANSFER_POOL, 1, true).unwrap();
        Setup {
            validator,
            next_buffer: 1,
        }
    }

    /// Allocate and begin a primary command buffer.
    pub fn begin(&mut self, pool: CommandPoolId) -> CommandBufferId {
        self.begin_with(pool, Level::Primary, Usage::MultiShot)
    }

    pub fn begin_with(&mut self, pool: CommandPoolId, level: Level, usage: Usage) -> CommandBufferId {
        let id = CommandBufferId(self.next_buffer);
        self.next_buffer += 1;
        self.validator
            .allocate_command_buffer(pool, id, level)
            .unwrap();
        self.validator.begin_command_buffer(id, usage).unwrap();
        id
    }

    /// Command buffer of `level` and `usage` filling one byte range.
    pub fn fill(&mut self, level: Level, usage: Usage, offset: u64, size: u64) -> CommandBufferId {
        let id = self.begin_with(UNIVERSAL_POOL, level, usage);
        assert!(self
            .validator
            .record_access(
                id,
                Func::CmdFillBuffer,
                BUFFER,
                BufferRange::new(offset, size).into(),
                write(),
            )
            .unwrap()
            .is_clean());
        self.validator.end_command_buffer(id).unwrap();
        id
    }

    /// Command buffer of the universal family writing each byte range in order.
    pub fn writes(&mut self, ranges: &[(u64, u64)]) -> CommandBufferId {
        let id = self.begin(UNIVERSAL_POOL);
        for &(offset, size) in ranges {
            assert!(self
                .validator
                .record_access(
                    id,
                    Func::CmdFillBuffer,
                    BUFFER,
                    BufferRange::new(offset, size).into(),
                    write(),
                )
                .unwrap()
                .is_clean());
        }
        self.validator.end_command_buffer(id).unwrap();
        id
    }

    pub fn submit(&self, queue: QueueId, command_buffers: &[CommandBufferId]) -> SubmitResult {
        self.validator
            .submit(
                queue,
                Func::QueueSubmit2,
                &[Submission::new().submits(command_buffers.iter().copied())],
                None,
            )
            .unwrap()
    }
}

pub(super) fn write() -> SyncScope {
    SyncScope::new(Stages::COPY, Access::TRANSFER_WRITE)
}

pub(super) fn read() -> SyncScope {
    SyncScope::new(Stages::COPY, Access::TRANSFER_READ)
}

fn color() -> ImageSubresourceRange {
    ImageSubresourceRange::whole(vk::ImageAspectFlags::COLOR)
}

fn rules(result: &SubmitResult) -> Vec<&'static str> {
    result
        .submit_errors
        .iter()
        .map(|hazard| hazard.rule.as_str())
        .collect()
}

#[test]
fn overlapping_writes() {
    let mut setup = Setup::new();
    let first = setup.writes(&[(0, 64)]);
    let second = setup.writes(&[(32, 64)]);

    let result = setup.submit(GRAPHICS, &[first, second]);
    assert!(result.submit_errors.is_empty());
    assert_eq!(result.hazards.len(), 1);
    let hazard = &result.hazards[0];
    assert_eq!(hazard.kind, HazardKind::WriteAfterWrite);
    assert_eq!(hazard.resource, Some(BUFFER));
    assert_eq!(hazard.range, Some(32..64));
    assert!(!hazard.racing);
    assert_eq!(hazard.rule.as_str(), "SYNC-HAZARD-WRITE-AFTER-WRITE");
}

#[test]
fn full_barrier_orders_writes() {
    let mut setup = Setup::new();
    let id = setup.begin(UNIVERSAL_POOL);
    let validator = &setup.validator;
    let whole = || BufferRange::whole().into();

    assert!(validator
        .record_access(id, Func::CmdFillBuffer, BUFFER, whole(), write())
        .unwrap()
        .is_clean());
    let barrier = Dependency::new(Func::CmdPipelineBarrier2)
        .with_barrier(Barrier::memory(write(), write()));
    assert!(validator.pipeline_barrier(id, &barrier).unwrap().is_clean());
    assert!(validator
        .record_access(id, Func::CmdCopyBuffer, BUFFER, whole(), write())
        .unwrap()
        .is_clean());
    validator.end_command_buffer(id).unwrap();

    assert!(setup.submit(GRAPHICS, &[id]).is_clean());
}

#[test]
fn old_layout_mismatch() {
    let mut setup = Setup::new();
    let transition = |old, new| {
        Dependency::new(Func::CmdPipelineBarrier2).with_barrier(Barrier::image(
            write(),
            write(),
            IMAGE,
            color(),
            old,
            new,
        ))
    };

    let first = setup.begin(UNIVERSAL_POOL);
    assert!(setup
        .validator
        .pipeline_barrier(
            first,
            &transition(
                vk::ImageLayout::UNDEFINED,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL
            )
        )
        .unwrap()
        .is_clean());
    setup.validator.end_command_buffer(first).unwrap();

    let second = setup.begin(UNIVERSAL_POOL);
    assert!(setup
        .validator
        .pipeline_barrier(
            second,
            &transition(
                vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                vk::ImageLayout::GENERAL
            )
        )
        .unwrap()
        .is_clean());
    setup.validator.end_command_buffer(second).unwrap();

    let result = setup.submit(GRAPHICS, &[first, second]);
    let layouts: Vec<_> = result
        .hazards
        .iter()
        .filter(|hazard| hazard.kind == HazardKind::LayoutTransition)
        .collect();
    assert_eq!(layouts.len(), 1);
    assert_eq!(layouts[0].resource, Some(IMAGE));
    assert_eq!(
        layouts[0].rule.as_str(),
        "VUID-VkImageMemoryBarrier2-oldLayout-01197"
    );
}

#[test]
fn access_before_acquire() {
    let mut setup = Setup::new();
    setup.validator.create_semaphore(SemaphoreId(1));

    let release = setup.begin(UNIVERSAL_POOL);
    let barrier = Dependency::new(Func::CmdPipelineBarrier2).with_barrier(
        Barrier::buffer(
            write(),
            SyncScope::new(Stages::NONE, Access::NONE),
            BUFFER,
            BufferRange::whole(),
        )
        .with_families(0, 1),
    );
    assert!(setup
        .validator
        .pipeline_barrier(release, &barrier)
        .unwrap()
        .is_clean());
    setup.validator.end_command_buffer(release).unwrap();

    let access = setup.begin(TRANSFER_POOL);
    assert!(setup
        .validator
        .record_access(
            access,
            Func::CmdCopyBuffer,
            BUFFER,
            BufferRange::whole().into(),
            read(),
        )
        .unwrap()
        .is_clean());
    setup.validator.end_command_buffer(access).unwrap();

    let signal = Submission::new()
        .submits(Some(release))
        .signal(SemaphoreId(1));
    assert!(setup
        .validator
        .submit(GRAPHICS, Func::QueueSubmit2, &[signal], None)
        .unwrap()
        .is_clean());

    let wait = Submission::new()
        .wait(SemaphoreId(1), Stages::COPY)
        .submits(Some(access));
    let result = setup
        .validator
        .submit(TRANSFER, Func::QueueSubmit2, &[wait], None)
        .unwrap();
    assert!(result.submit_errors.is_empty());
    assert!(result
        .hazards
        .iter()
        .any(|hazard| hazard.kind == HazardKind::OwnershipTransfer
            && hazard.resource == Some(BUFFER)));
}

/// Each queue gets its own submit call and nothing orders one after the other.
#[test]
fn separate_submits_to_two_queues_race() {
    let mut setup = Setup::new();
    let first = setup.writes(&[(0, 256)]);
    let second = setup.writes(&[(0, 256)]);

    assert!(setup.submit(GRAPHICS, &[first]).is_clean());
    let result = setup.submit(COMPUTE, &[second]);
    assert_eq!(result.hazards.len(), 1);
    assert_eq!(result.hazards[0].kind, HazardKind::WriteAfterWrite);
    assert!(result.hazards[0].racing);
    assert_eq!(result.hazards[0].prior.unwrap().queue, GRAPHICS);
    assert_eq!(result.hazards[0].incoming.unwrap().queue, COMPUTE);
}

#[test]
fn findings_past_limit_are_dropped() {
    let mut setup = Setup::with_config(Config::default().with_max_hazards_per_call(1));
    let first = setup.writes(&[(0, 16), (64, 16)]);
    let second = setup.writes(&[(0, 16), (64, 16)]);

    let result = setup.submit(GRAPHICS, &[first, second]);
    assert_eq!(result.len(), 1);
}

#[test]
fn command_buffer_in_use_is_rejected() {
    let mut setup = Setup::new();
    let id = setup.writes(&[(0, 16)]);
    assert!(setup.validator.execute_commands(id, &[id]).is_err());
    assert!(setup
        .validator
        .submit(
            GRAPHICS,
            Func::QueueSubmit2,
            &[Submission::new().submits(Some(CommandBufferId(99)))],
            None,
        )
        .is_err());
}

#[test]
fn reset_pool_forgets_recording() {
    let mut setup = Setup::new();
    let first = setup.writes(&[(0, 256)]);
    assert!(setup.submit(GRAPHICS, &[first]).is_clean());

    setup.validator.reset_command_pool(UNIVERSAL_POOL).unwrap();
    assert!(setup.validator.end_command_buffer(first).is_err());

    let second = setup.writes(&[(0, 256)]);
    assert!(setup.submit(COMPUTE, &[second]).is_clean());
}

#[test]
fn one_shot_resubmit_is_reported() {
    let mut setup = Setup::new();
    let once = setup.fill(Level::Primary, Usage::OneShot, 0, 16);
    assert!(setup.submit(GRAPHICS, &[once]).is_clean());

    let result = setup.submit(GRAPHICS, &[once]);
    assert!(result.hazards.is_empty());
    assert_eq!(rules(&result), vec!["VUID-vkQueueSubmit2-commandBuffer-03876"]);

    let result = setup
        .validator
        .submit(
            GRAPHICS,
            Func::QueueSubmit,
            &[Submission::new().submits(Some(once))],
            None,
        )
        .unwrap();
    assert_eq!(rules(&result), vec!["VUID-vkQueueSubmit-pCommandBuffers-00072"]);

    let twice = setup.fill(Level::Primary, Usage::OneShot, 64, 16);
    let result = setup.submit(GRAPHICS, &[twice, twice]);
    assert!(result.hazards.is_empty());
    assert_eq!(rules(&result), vec!["VUID-vkQueueSubmit2-commandBuffer-03876"]);
    assert_eq!(
        result.submit_errors[0].location.to_string(),
        "vkQueueSubmit2() pCommandBufferInfos[1] VkCommandBufferSubmitInfo.commandBuffer"
    );
}

#[test]
fn repeated_primary_needs_simultaneous_use() {
    let mut setup = Setup::new();
    let multi = setup.fill(Level::Primary, Usage::MultiShot, 0, 16);
    let result = setup.submit(GRAPHICS, &[multi, multi]);
    assert!(result.hazards.is_empty());
    assert_eq!(rules(&result), vec!["VUID-vkQueueSubmit2-commandBuffer-03875"]);

    let simultaneous = setup.fill(Level::Primary, Usage::Simultaneous, 64, 16);
    let result = setup.submit(GRAPHICS, &[simultaneous, simultaneous]);
    assert!(result.submit_errors.is_empty());
    assert_eq!(result.hazards.len(), 1);
    assert_eq!(result.hazards[0].kind, HazardKind::WriteAfterWrite);
}

#[test]
fn submit_lifecycle_findings() {
    let mut setup = Setup::new();
    let secondary = setup.fill(Level::Secondary, Usage::MultiShot, 0, 16);
    let result = setup.submit(GRAPHICS, &[secondary]);
    assert_eq!(
        rules(&result),
        vec!["VUID-VkCommandBufferSubmitInfo-commandBuffer-03890"]
    );

    let transfer = setup.begin(TRANSFER_POOL);
    setup.validator.end_command_buffer(transfer).unwrap();
    let result = setup.submit(GRAPHICS, &[transfer]);
    assert_eq!(rules(&result), vec!["VUID-vkQueueSubmit2-commandBuffer-03878"]);

    let first = setup.begin(UNIVERSAL_POOL);
    let second = setup.begin(UNIVERSAL_POOL);
    for &primary in &[first, second] {
        assert!(setup
            .validator
            .execute_commands(primary, &[secondary])
            .unwrap()
            .is_clean());
        setup.validator.end_command_buffer(primary).unwrap();
    }
    let result = setup.submit(GRAPHICS, &[first, second]);
    assert!(result.hazards.is_empty());
    assert_eq!(rules(&result), vec!["VUID-vkQueueSubmit2-commandBuffer-03877"]);

    let recording = setup.begin(UNIVERSAL_POOL);
    match setup.validator.submit(
        GRAPHICS,
        Func::QueueSubmit2,
        &[Submission::new().submits(Some(recording))],
        None,
    ) {
        Err(EngineFault::InvalidState { command_buffer, .. }) => {
            assert_eq!(command_buffer, recording)
        }
        other => panic!("Unexpected {:?}", other),
    }
}

#[test]
fn repeated_secondary_is_reported() {
    let mut setup = Setup::new();
    let secondary = setup.begin_with(UNIVERSAL_POOL, Level::Secondary, Usage::MultiShot);
    setup
        .validator
        .record_access(
            secondary,
            Func::CmdCopyBuffer,
            BUFFER,
            BufferRange::whole().into(),
            read(),
        )
        .unwrap();
    setup.validator.end_command_buffer(secondary).unwrap();

    let primary = setup.begin(UNIVERSAL_POOL);
    let result = setup
        .validator
        .execute_commands(primary, &[secondary, secondary])
        .unwrap();
    assert_eq!(result.hazards.len(), 1);
    assert_eq!(
        result.hazards[0].rule.as_str(),
        "VUID-vkCmdExecuteCommands-pCommandBuffers-00093"
    );
    setup.validator.end_command_buffer(primary).unwrap();
    assert!(setup.submit(GRAPHICS, &[primary]).is_clean());
}

#[test]
fn faulting_submit_keeps_buffers_executable() {
    const STALE: ResourceId = ResourceId(3);

    let mut setup = Setup::new();
    setup.validator.create_semaphore(SemaphoreId(1));
    setup
        .validator
        .register_buffer(
            STALE,
            BufferInfo {
                size: 64,
                sharing: vk::SharingMode::EXCLUSIVE,
            },
        )
        .unwrap();
    let once = setup.fill(Level::Primary, Usage::OneShot, 0, 16);
    let stale = setup.begin(UNIVERSAL_POOL);
    setup
        .validator
        .record_access(
            stale,
            Func::CmdFillBuffer,
            STALE,
            BufferRange::whole().into(),
            write(),
        )
        .unwrap();
    setup.validator.end_command_buffer(stale).unwrap();
    setup.validator.destroy_resource(STALE).unwrap();

    let submissions = [
        Submission::new().submits(Some(once)).signal(SemaphoreId(1)),
        Submission::new().submits(Some(stale)),
    ];
    assert_eq!(
        setup
            .validator
            .submit(GRAPHICS, Func::QueueSubmit2, &submissions, None)
            .unwrap_err(),
        EngineFault::UnknownResource(STALE)
    );

    assert!(setup.submit(COMPUTE, &[once]).is_clean());
    assert!(setup
        .validator
        .simulator()
        .semaphore(SemaphoreId(1))
        .unwrap()
        .pending()
        .is_none());
}

#[test]
fn opposite_secondary_orders_do_not_block() {
    const ROUNDS: u64 = 64;

    let mut setup = Setup::new();
    let mut secondaries = Vec::new();
    for _ in 0..2 {
        let id = setup.begin_with(UNIVERSAL_POOL, Level::Secondary, Usage::MultiShot);
        setup
            .validator
            .record_access(
                id,
                Func::CmdCopyBuffer,
                BUFFER,
                BufferRange::whole().into(),
                read(),
            )
            .unwrap();
        setup.validator.end_command_buffer(id).unwrap();
        secondaries.push(id);
    }
    let validator = Arc::new(setup.validator);

    let handles: Vec<_> = (0..2u64)
        .map(|worker| {
            let validator = validator.clone();
            let mut order = secondaries.clone();
            if worker == 1 {
                order.reverse();
            }
            thread::spawn(move || {
                for round in 0..ROUNDS {
                    let id = CommandBufferId(1000 * (worker + 1) + round);
                    validator
                        .allocate_command_buffer(UNIVERSAL_POOL, id, Level::Primary)
                        .unwrap();
                    validator.begin_command_buffer(id, Usage::OneShot).unwrap();
                    assert!(validator.execute_commands(id, &order).unwrap().is_clean());
                    validator.end_command_buffer(id).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn threads_on_distinct_resources_stay_clean() {
    const THREADS: u64 = 4;
    const ROUNDS: u64 = 16;

    let validator = Arc::new(Setup::new().validator);
    for worker in 0..THREADS {
        validator
            .register_buffer(
                ResourceId(10 + worker),
                BufferInfo {
                    size: 16 * ROUNDS,
                    sharing: vk::SharingMode::EXCLUSIVE,
                },
            )
            .unwrap();
    }

    let handles: Vec<_> = (0..THREADS)
        .map(|worker| {
            let validator = validator.clone();
            thread::spawn(move || {
                let resource = ResourceId(10 + worker);
                let queue = if worker % 2 == 0 { GRAPHICS } else { COMPUTE };
                for round in 0..ROUNDS {
                    let id = CommandBufferId(1000 * (worker + 1) + round);
                    validator
                        .allocate_command_buffer(UNIVERSAL_POOL, id, Level::Primary)
                        .unwrap();
                    validator.begin_command_buffer(id, Usage::OneShot).unwrap();
                    assert!(validator
                        .record_access(
                            id,
                            Func::CmdFillBuffer,
                            resource,
                            BufferRange::new(round * 16, 16).into(),
                            write(),
                        )
                        .unwrap()
                        .is_clean());
                    validator.end_command_buffer(id).unwrap();
                    let result = validator
                        .submit(
                            queue,
                            Func::QueueSubmit2,
                            &[Submission::new().submits(Some(id))],
                            None,
                        )
                        .unwrap();
                    assert!(result.is_clean(), "{:?}", result);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(validator.tracker().tracked(), THREADS as usize);
}

#[test]
fn aliased_buffers_race_across_queues() {
    const ALIAS: ResourceId = ResourceId(4);

    let mut setup = Setup::new();
    let validator = &setup.validator;
    validator
        .register_buffer(
            ALIAS,
            BufferInfo {
                size: 256,
                sharing: vk::SharingMode::EXCLUSIVE,
            },
        )
        .unwrap();
    for &id in &[BUFFER, ALIAS] {
        validator
            .bind_memory(
                id,
                MemoryBinding {
                    memory: MemoryId(1),
                    offset: 0,
                    size: 256,
                },
            )
            .unwrap();
    }

    let first = setup.writes(&[(0, 64)]);
    let second = setup.begin(UNIVERSAL_POOL);
    assert!(setup
        .validator
        .record_access(
            second,
            Func::CmdFillBuffer,
            ALIAS,
            BufferRange::new(32, 64).into(),
            write(),
        )
        .unwrap()
        .is_clean());
    setup.validator.end_command_buffer(second).unwrap();

    assert!(setup.submit(GRAPHICS, &[first]).is_clean());
    let result = setup.submit(COMPUTE, &[second]);
    assert_eq!(result.hazards.len(), 1);
    let hazard = &result.hazards[0];
    assert_eq!(hazard.kind, HazardKind::WriteAfterWrite);
    assert_eq!(hazard.resource, Some(ALIAS));
    assert_eq!(hazard.range, Some(32..64));
    assert!(hazard.racing);
}
