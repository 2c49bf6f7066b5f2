//! Test fixtures and helpers.
//!
//! Pre-built maps, actors and simulations for consistent testing.

use fixed::types::I32F32;
use tanks_core::components::{
    Actor, ActorId, ActorKind, AiArchetype, AiBrain, BaseStats, Controller, CooldownRange,
    Direction, PlayerInput,
};
use tanks_core::config::{EngineConfig, SpawnerConfig};
use tanks_core::grid::{TileCoord, TileGrid};
use tanks_core::math::{ratio, Vec2Fixed};
use tanks_core::movement::pixel_center;
use tanks_core::pickups::{Pickup, PickupEffect};
use tanks_core::rng::SimRng;
use tanks_core::simulation::Simulation;

/// Tile edge used by every fixture map.
pub const TILE: i32 = 50;

/// A small walled arena with a brick-shielded base at the bottom.
pub const ARENA_LAYOUT: &[&str] = &[
    "@@@@@@@@@@@@@",
    "@...........@",
    "@.##.~~~.##.@",
    "@...........@",
    "@.^^.###.^^.@",
    "@...........@",
    "@.##.....##.@",
    "@.....#.....@",
    "@....#B#....@",
    "@@@@@@@@@@@@@",
];

/// Player start in [`ARENA_LAYOUT`].
pub const ARENA_PLAYER_SPAWN: TileCoord = TileCoord::new(4, 7);

/// AI start tiles in [`ARENA_LAYOUT`].
pub const ARENA_AI_SPAWNS: [TileCoord; 3] = [
    TileCoord::new(1, 1),
    TileCoord::new(6, 1),
    TileCoord::new(11, 1),
];

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// An all-open `width` x `height` grid of [`TILE`]-sized tiles.
///
/// # Panics
///
/// Panics if either dimension is negative.
#[must_use]
pub fn open_grid(width: i32, height: i32) -> TileGrid {
    TileGrid::open(width, height, TILE, TILE).expect("fixture grid dimensions are valid")
}

/// The [`ARENA_LAYOUT`] grid.
///
/// # Panics
///
/// Never, the layout is a constant.
#[must_use]
pub fn arena_grid() -> TileGrid {
    TileGrid::from_rows(ARENA_LAYOUT, TILE, TILE).expect("arena layout is valid")
}

/// Player stats used by actor fixtures.
#[must_use]
pub fn player_stats() -> BaseStats {
    EngineConfig::default().player.stats
}

/// A player tank centered on `tile` of a [`TILE`]-sized grid.
#[must_use]
pub fn player_actor(id: ActorId, tile: TileCoord) -> Actor {
    Actor::new(
        id,
        ActorKind::Player,
        tile_center(tile),
        Vec2Fixed::from_ints(TILE, TILE),
        player_stats(),
        Controller::Player(PlayerInput::default()),
        1,
    )
}

/// A standard AI tank centered on `tile`, heading for `target`.
#[must_use]
pub fn ai_actor(id: ActorId, tile: TileCoord, seed: u64, target: Option<TileCoord>) -> Actor {
    let mut brain = AiBrain::new(
        SimRng::new(seed),
        CooldownRange::new(fixed(1), fixed(3)),
    );
    brain.strategic_target = target;
    let mut actor = Actor::new(
        id,
        ActorKind::Ai(AiArchetype::Standard),
        tile_center(tile),
        Vec2Fixed::from_ints(TILE, TILE),
        BaseStats {
            max_health: 30,
            speed: fixed(60),
            attack: fixed(10),
            fire_cooldown: fixed(2),
        },
        Controller::Ai(brain),
        1,
    );
    actor.facing = Direction::Down;
    actor
}

/// Pixel center of `tile` on a [`TILE`]-sized grid.
#[must_use]
pub fn tile_center(tile: TileCoord) -> Vec2Fixed {
    Vec2Fixed::from_ints(tile.x * TILE + TILE / 2, tile.y * TILE + TILE / 2)
}

/// A simulation on an open grid with default config and nothing spawned.
///
/// # Panics
///
/// Panics if either dimension is negative.
#[must_use]
pub fn empty_sim(width: i32, height: i32) -> Simulation {
    Simulation::new(open_grid(width, height), EngineConfig::default())
        .expect("default config is valid")
}

/// The arena with a player, one AI per spawn point, two pickups and a
/// reinforcement spawner, all derived from `seed`.
///
/// # Panics
///
/// Never, every input is a constant.
#[must_use]
pub fn arena_sim(seed: u64) -> Simulation {
    let mut config = EngineConfig::default();
    config.spawner = Some(SpawnerConfig {
        interval: fixed(3),
        max_active: 4,
        spawn_points: ARENA_AI_SPAWNS.to_vec(),
        archetypes: vec![AiArchetype::Fast, AiArchetype::Heavy, AiArchetype::Standard],
        seed,
    });

    let mut sim = Simulation::from_layout(ARENA_LAYOUT, TILE, TILE, config)
        .expect("arena layout is valid");
    sim.spawn_player(ARENA_PLAYER_SPAWN);

    let archetypes = [AiArchetype::Standard, AiArchetype::Fast, AiArchetype::Heavy];
    for (stream, (tile, archetype)) in ARENA_AI_SPAWNS.iter().zip(archetypes).enumerate() {
        sim.spawn_ai(archetype, *tile, SimRng::derive_seed(seed, 1_000 + stream as u64));
    }

    let pickup_size = Vec2Fixed::from_ints(30, 30);
    let grid = sim.grid().clone();
    sim.add_pickup(Pickup::new(
        pixel_center(&grid, TileCoord::new(4, 5)),
        pickup_size,
        PickupEffect::Attack,
    ));
    sim.add_pickup(Pickup::new(
        pixel_center(&grid, TileCoord::new(8, 5)),
        pickup_size,
        PickupEffect::Armor,
    ));
    sim
}

/// Deterministic player input for `tick`: drives a square patrol and fires
/// every half second at 60 ticks per second.
#[must_use]
pub fn scripted_input(tick: u64) -> PlayerInput {
    let direction = match (tick / 45) % 4 {
        0 => Direction::Up,
        1 => Direction::Right,
        2 => Direction::Down,
        _ => Direction::Left,
    };
    PlayerInput {
        direction: Some(direction),
        fire: tick % 30 == 0,
    }
}

/// Feed [`scripted_input`] to the player (if alive) and tick at `1/60` s.
pub fn scripted_step(sim: &mut Simulation) {
    if let Some(player) = sim.player_id() {
        let input = scripted_input(sim.get_tick());
        // The player id came from the simulation, so this cannot fail.
        let _ = sim.set_player_input(player, input);
    }
    sim.tick(ratio(1, 60));
}

#[cfg(test)]
mod tests {
    use super::*;
    use tanks_core::grid::{GridMap, TileKind};

    #[test]
    fn test_arena_layout_shape() {
        let grid = arena_grid();
        assert_eq!(grid.width(), 13);
        assert_eq!(grid.height(), 10);
        assert_eq!(grid.base_tile(), Some(TileCoord::new(6, 8)));
        assert_eq!(grid.tile_kind(4, 7), Some(TileKind::Open));
        for tile in ARENA_AI_SPAWNS {
            assert!(grid.is_walkable(tile.x, tile.y));
        }
    }

    #[test]
    fn test_tile_center_matches_grid() {
        let grid = open_grid(4, 4);
        let tile = TileCoord::new(3, 1);
        assert_eq!(tile_center(tile), pixel_center(&grid, tile));
    }

    #[test]
    fn test_arena_sim_population() {
        let sim = arena_sim(7);
        assert!(sim.player_id().is_some());
        assert_eq!(sim.ai_count(), 3);
        assert_eq!(sim.pickups().len(), 2);
    }
}
