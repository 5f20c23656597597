//! Benchmarks for full-history replay
//!
//! Run with: cargo bench --bench replay
//!
//! Every sync replays both logs from the start, so the cost of a sync grows with the number
//! of turns played. These benchmarks measure that growth.

// Allow benchmark-specific patterns
#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing
)]

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use lockstep_duel::checksum::trajectory_checksum;
use lockstep_duel::replay::reconstruct_trajectory;
use lockstep_duel::{
    compute_shots, replay_both, ArenaConfig, DesyncDetection, MoveLog, PlayerMove, ScriptedPeer,
    SessionBuilder, Side, TurnState,
};
use std::hint::black_box;

const LOG_LENGTHS: [usize; 4] = [10, 100, 1_000, 10_000];

/// A deterministic mix of thrusts and shots that never hits.
fn bench_log(seed: u32, turns: usize) -> MoveLog {
    let mut log = MoveLog::new(seed);
    for i in 0..turns {
        let angle = i as f64 * 0.37;
        let mv = if i % 3 == 0 {
            // Far corner; the classic arena keeps bodies at least a radius from it
            PlayerMove::shoot(0.0, 0.0)
        } else {
            PlayerMove::accelerate(angle.cos(), angle.sin())
        };
        log.push(mv).unwrap();
    }
    log
}

fn bench_reconstruct_trajectory(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconstruct_trajectory");
    let arena = ArenaConfig::default();

    for &turns in &LOG_LENGTHS {
        let log = bench_log(1, turns);
        group.bench_with_input(BenchmarkId::from_parameter(turns), &log, |b, log| {
            b.iter(|| reconstruct_trajectory(black_box(log), Side::A, &arena));
        });
    }
    group.finish();
}

fn bench_compute_shots(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_shots");
    let arena = ArenaConfig::default();

    for &turns in &LOG_LENGTHS {
        let own = bench_log(1, turns);
        let opponent = bench_log(2, turns);
        group.bench_with_input(
            BenchmarkId::from_parameter(turns),
            &(own, opponent),
            |b, (own, opponent)| {
                b.iter(|| compute_shots(black_box(own), black_box(opponent), Side::A, &arena));
            },
        );
    }
    group.finish();
}

fn bench_replay_both(c: &mut Criterion) {
    let mut group = c.benchmark_group("replay_both");
    let arena = ArenaConfig::default();

    for &turns in &LOG_LENGTHS {
        let a = bench_log(1, turns);
        let b_log = bench_log(2, turns);
        group.bench_with_input(
            BenchmarkId::from_parameter(turns),
            &(a, b_log),
            |b, (a, b_log)| {
                b.iter(|| replay_both(black_box(a), black_box(b_log), &arena).unwrap());
            },
        );
    }
    group.finish();
}

fn bench_trajectory_checksum(c: &mut Criterion) {
    let arena = ArenaConfig::default();
    let (positions, _) = reconstruct_trajectory(&bench_log(1, 1_000), Side::A, &arena);

    c.bench_function("trajectory_checksum_1000", |b| {
        b.iter(|| trajectory_checksum(black_box(&positions)).unwrap());
    });
}

/// One whole sync, with and without the replay self-check
fn bench_session_sync(c: &mut Criterion) {
    let mut group = c.benchmark_group("session_sync_after_100_turns");

    for (name, mode) in [("desync_on", DesyncDetection::On), ("desync_off", DesyncDetection::Off)] {
        group.bench_function(name, |b| {
            b.iter_batched(
                || {
                    let mut session = SessionBuilder::new()
                        .with_seeds(1, 2)
                        .with_peer(Box::new(ScriptedPeer::default()))
                        .with_desync_detection(mode)
                        .start_session()
                        .unwrap();
                    for _ in 0..100 {
                        session.request_transition(TurnState::Accelerate);
                        session.confirm(PlayerMove::accelerate(0.0, 1.0)).unwrap();
                    }
                    session
                },
                |mut session| {
                    session.request_transition(TurnState::Accelerate);
                    black_box(session.confirm(PlayerMove::accelerate(1.0, 0.0)))
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_reconstruct_trajectory,
    bench_compute_shots,
    bench_replay_both,
    bench_trajectory_checksum,
    bench_session_sync
);
criterion_main!(benches);
