//! AI reinforcement timer.

use crate::components::AiArchetype;
use crate::config::SpawnerConfig;
use crate::grid::TileCoord;
use crate::math::Fixed;
use crate::rng::SimRng;

/// One spawn the simulation should perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnRequest {
    /// Tile to spawn on.
    pub tile: TileCoord,
    /// Archetype to spawn.
    pub archetype: AiArchetype,
    /// Seed for the new tank's generator.
    pub seed: u64,
}

/// Spawns AI tanks on a fixed interval while under the active cap,
/// cycling through spawn points and archetypes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiSpawner {
    config: SpawnerConfig,
    timer: Fixed,
    next_point: usize,
    next_archetype: usize,
    spawned: u64,
}

impl AiSpawner {
    /// New spawner with an empty timer.
    #[must_use]
    pub fn new(config: SpawnerConfig) -> Self {
        Self {
            config,
            timer: Fixed::ZERO,
            next_point: 0,
            next_archetype: 0,
            spawned: 0,
        }
    }

    /// Tanks spawned so far.
    #[must_use]
    pub const fn spawned(&self) -> u64 {
        self.spawned
    }

    /// Advance the timer. Returns a request once the interval has elapsed
    /// and fewer than `max_active` AI tanks are alive; otherwise the timer
    /// holds at the interval until there is room.
    pub fn tick(&mut self, dt: Fixed, alive_ai: usize) -> Option<SpawnRequest> {
        self.timer = (self.timer + dt).min(self.config.interval);
        if self.timer < self.config.interval || alive_ai >= self.config.max_active {
            return None;
        }
        if self.config.spawn_points.is_empty() || self.config.archetypes.is_empty() {
            return None;
        }

        let tile = self.config.spawn_points[self.next_point % self.config.spawn_points.len()];
        let archetype = self.config.archetypes[self.next_archetype % self.config.archetypes.len()];
        self.next_point = (self.next_point + 1) % self.config.spawn_points.len();
        self.next_archetype = (self.next_archetype + 1) % self.config.archetypes.len();
        self.timer = Fixed::ZERO;

        let seed = SimRng::derive_seed(self.config.seed, self.spawned);
        self.spawned += 1;
        Some(SpawnRequest {
            tile,
            archetype,
            seed,
        })
    }
}
