use {
    crate::{
        chain::{Barrier, Dependency},
        resource::BufferRange,
        scenarios::{read, write, Setup, BUFFER, COMPUTE, GRAPHICS, UNIVERSAL_POOL},
        vk::{AccessFlags2 as Access, PipelineStageFlags2 as Stages},
        Func, SemaphoreId, Submission, SyncScope,
    },
    rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng},
};

#[test]
fn disjoint_ranges_never_conflict() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..8 {
        let mut setup = Setup::new();
        let mut chunks: Vec<u64> = (0..16).collect();
        chunks.shuffle(&mut rng);

        for chunk in chunks {
            let id = setup.writes(&[(chunk * 16, 16)]);
            let queue = if rng.gen() { GRAPHICS } else { COMPUTE };
            assert!(setup.submit(queue, &[id]).is_clean());
        }
    }
}

#[test]
fn covering_barrier_orders_any_pair() {
    let scopes = [
        write(),
        read(),
        SyncScope::new(Stages::COMPUTE_SHADER, Access::SHADER_STORAGE_WRITE),
        SyncScope::new(Stages::COMPUTE_SHADER, Access::SHADER_STORAGE_READ),
        SyncScope::new(Stages::VERTEX_ATTRIBUTE_INPUT, Access::VERTEX_ATTRIBUTE_READ),
    ];

    for &prior in &scopes {
        for &incoming in &scopes {
            let mut setup = Setup::new();
            let id = setup.begin(UNIVERSAL_POOL);
            let validator = &setup.validator;
            let whole = || BufferRange::whole().into();

            assert!(validator
                .record_access(id, Func::CmdDispatch, BUFFER, whole(), prior)
                .unwrap()
                .is_clean());
            let barrier = Dependency::new(Func::CmdPipelineBarrier2).with_barrier(
                Barrier::buffer(prior, incoming, BUFFER, BufferRange::whole()),
            );
            assert!(validator.pipeline_barrier(id, &barrier).unwrap().is_clean());
            assert!(
                validator
                    .record_access(id, Func::CmdDispatch, BUFFER, whole(), incoming)
                    .unwrap()
                    .is_clean(),
                "{:?} -> {:?}",
                prior,
                incoming
            );
            validator.end_command_buffer(id).unwrap();
            assert!(setup.submit(GRAPHICS, &[id]).is_clean());
        }
    }
}

#[test]
fn unmatched_wait_orders_nothing() {
    let unsynchronized = {
        let mut setup = Setup::new();
        let first = setup.writes(&[(0, 256)]);
        let second = setup.writes(&[(0, 256)]);
        assert!(setup.submit(GRAPHICS, &[first]).is_clean());
        setup.submit(COMPUTE, &[second]).hazards
    };

    let mut setup = Setup::new();
    setup.validator.create_semaphore(SemaphoreId(1));
    let first = setup.writes(&[(0, 256)]);
    let second = setup.writes(&[(0, 256)]);
    assert!(setup.submit(GRAPHICS, &[first]).is_clean());
    let wait = Submission::new()
        .wait(SemaphoreId(1), Stages::COPY)
        .submits(Some(second));
    let result = setup
        .validator
        .submit(COMPUTE, Func::QueueSubmit2, &[wait], None)
        .unwrap();

    assert_eq!(result.submit_errors.len(), 1);
    assert!(!unsynchronized.is_empty());
    assert_eq!(result.hazards.len(), unsynchronized.len());
    for (waited, plain) in result.hazards.iter().zip(&unsynchronized) {
        assert_eq!(waited.kind, plain.kind);
        assert_eq!(waited.range, plain.range);
    }
}

#[test]
fn reset_replays_identically() {
    let mut setup = Setup::new();
    let first = setup.writes(&[(0, 64), (128, 64)]);
    let second = setup.writes(&[(32, 128)]);

    let run = |setup: &Setup| {
        let graphics = setup.submit(GRAPHICS, &[first]);
        let compute = setup.submit(COMPUTE, &[second]);
        setup.validator.device_wait_idle();
        (graphics, compute)
    };

    let before = run(&setup);
    assert!(!before.1.is_clean());
    setup.validator.reset();
    assert_eq!(run(&setup), before);
}
