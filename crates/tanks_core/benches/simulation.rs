//! Simulation benchmarks for tanks_core.
//!
//! Run with: `cargo bench -p tanks_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tanks_core::components::{AiArchetype, PlayerInput};
use tanks_core::grid::TileCoord;
use tanks_core::math::ratio;
use tanks_core::simulation::{GameStatus, Simulation};
use tanks_test_utils::fixtures::{arena_sim, empty_sim, scripted_step};

/// Open 20x20 map with a player in the middle and 40 AI tanks converging
/// on it, all firing.
fn crowded_sim() -> Simulation {
    let mut sim = empty_sim(20, 20);
    let player = sim.spawn_player(TileCoord::new(10, 10));
    sim.set_player_input(
        player,
        PlayerInput {
            direction: None,
            fire: true,
        },
    )
    .expect("player exists");

    let archetypes = [AiArchetype::Standard, AiArchetype::Fast, AiArchetype::Heavy];
    for i in 0..40_u64 {
        let x = i32::try_from(i % 20).unwrap_or(0);
        let y = if i < 20 { 0 } else { 19 };
        let ai = sim.spawn_ai(archetypes[(i % 3) as usize], TileCoord::new(x, y), i);
        sim.set_strategic_target(ai, Some(TileCoord::new(10, 10)))
            .expect("ai exists");
    }
    sim
}

/// Runs simulation benchmarks for the tanks_core crate.
pub fn simulation_benchmark(c: &mut Criterion) {
    c.bench_function("crowded_tick", |b| {
        let mut sim = crowded_sim();
        b.iter(|| {
            if sim.status() != GameStatus::Running {
                sim = crowded_sim();
            }
            black_box(sim.tick(ratio(1, 60)))
        });
    });

    c.bench_function("arena_600_ticks", |b| {
        b.iter(|| {
            let mut sim = arena_sim(1);
            for _ in 0..600 {
                scripted_step(&mut sim);
            }
            black_box(sim.state_hash())
        });
    });

    c.bench_function("state_hash", |b| {
        let sim = crowded_sim();
        b.iter(|| black_box(sim.state_hash()));
    });
}

criterion_group!(benches, simulation_benchmark);
criterion_main!(benches);
