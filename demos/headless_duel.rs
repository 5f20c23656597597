//! Plays a full duel between two random peers without a renderer.
//!
//! Both sides run their own session: side A drives the match, side B replays it from A's
//! moves, and after every turn B's checksums are verified against A's. At the end a referee
//! audits the two logs with `verify_match`.
//!
//! Run with: cargo run --example headless_duel -- --seed-a 1 --seed-b 2

#![allow(clippy::print_stdout)]

use std::sync::Arc;

use clap::Parser;
use lockstep_duel::prelude::*;
use lockstep_duel::telemetry::{
    CollectingObserver, CompositeObserver, TracingObserver, ViolationObserver,
};
use lockstep_duel::verify_match;

#[derive(Parser)]
struct Opt {
    /// Seed of side A; drawn from entropy when omitted
    #[arg(long)]
    seed_a: Option<u32>,
    /// Seed of side B; drawn from entropy when omitted
    #[arg(long)]
    seed_b: Option<u32>,
    /// Seed of the policy that plays side A
    #[arg(long, default_value_t = 3)]
    local_seed: u32,
    /// Seed of the policy that plays side B
    #[arg(long, default_value_t = 4)]
    peer_seed: u32,
    /// Stop after this many turns without a winner
    #[arg(short, long, default_value_t = 200)]
    max_turns: u32,
    /// Use the 400x300 arena
    #[arg(long)]
    compact: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // configure logging: output session logs to standard out
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_max_level(tracing::Level::INFO)
            .finish(),
    )?;

    let opt = Opt::parse();
    let arena = if opt.compact {
        ArenaConfig::compact()
    } else {
        ArenaConfig::classic()
    };
    let seed_a = opt.seed_a.unwrap_or_else(lockstep_duel::rng::random_seed);
    let seed_b = opt.seed_b.unwrap_or_else(lockstep_duel::rng::random_seed);
    let history = opt.max_turns as usize + 1;

    // Violations are logged and also counted for the summary
    let collected = Arc::new(CollectingObserver::new());
    let children: Vec<Arc<dyn ViolationObserver>> =
        vec![Arc::new(TracingObserver::new()), collected.clone()];
    let observer: Arc<dyn ViolationObserver> =
        Arc::new(CompositeObserver::from_observers(children));

    let mut side_a = SessionBuilder::new()
        .with_seeds(seed_a, seed_b)
        .with_arena(arena)
        .with_peer(Box::new(RandomPeer::new(opt.peer_seed)))
        .with_violation_observer(observer.clone())
        .with_checksum_history(history)?
        .start_session()?;
    let mut policy = RandomPeer::new(opt.local_seed);

    println!("seeds: A={seed_a} B={seed_b}, arena {}x{}", arena.width, arena.height);

    while side_a.state() != TurnState::GameOver && side_a.turn() < Turn::new(opt.max_turns) {
        let view = PeerView {
            side: Side::A,
            own_log: side_a.log(Side::A),
            opponent_log: side_a.log(Side::B),
            last_shot: side_a.shots(Side::A).last().copied(),
            arena: side_a.arena(),
        };
        let mv = policy.produce_next_move(&view);
        let aiming = match mv {
            PlayerMove::Accelerate { .. } => TurnState::Accelerate,
            PlayerMove::Shoot { .. } => TurnState::Shoot,
        };
        side_a.request_transition(aiming);
        let Some(report) = side_a.confirm(mv) else {
            break;
        };
        println!(
            "turn {:>3}: A {:<40} B {:<40} A@{} B@{}",
            report.turn.as_u32(),
            format!("{:?}", report.local_move),
            format!("{:?}", report.peer_move),
            side_a.body(Side::A).position,
            side_a.body(Side::B).position,
        );
    }

    // Side B's view of the same match, fed A's moves as they would arrive over the wire
    let mut side_b = SessionBuilder::new()
        .with_seeds(seed_a, seed_b)
        .with_arena(arena)
        .with_local_side(Side::B)
        .with_peer(Box::new(ScriptedPeer::from_log(side_a.log(Side::A))))
        .with_violation_observer(observer)
        .with_checksum_history(history)?
        .start_session()?;
    for mv in side_a.log(Side::B).player_moves() {
        let aiming = match mv {
            PlayerMove::Accelerate { .. } => TurnState::Accelerate,
            PlayerMove::Shoot { .. } => TurnState::Shoot,
        };
        side_b.request_transition(aiming);
        if let Some(report) = side_b.confirm(mv) {
            side_a.verify_remote_checksums(report.turn, report.checksums)?;
        }
    }

    let verdict = verify_match(side_a.log(Side::A), side_a.log(Side::B), &arena)?;
    let a_bytes = side_a.log(Side::A).encode()?;
    let b_bytes = side_a.log(Side::B).encode()?;

    match side_a.winner() {
        Some(winner) => println!("winner: {winner} after {} turns", side_a.turn()),
        None => println!("no winner after {} turns", side_a.turn()),
    }
    println!(
        "both peers agree: {}, referee agrees: {}",
        side_b.winner() == side_a.winner(),
        verdict.winner == side_a.winner()
    );
    println!(
        "wire size: A {} bytes, B {} bytes",
        a_bytes.len(),
        b_bytes.len()
    );
    println!("violations reported: {}", collected.len());
    Ok(())
}
