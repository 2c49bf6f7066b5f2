//! Scenario loading and configuration.
//!
//! Scenarios define the initial state of a headless run: the tile layout,
//! engine tuning, tank and pickup placements, and a scripted player input
//! timeline.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tanks_core::components::{AiArchetype, Direction, PlayerInput};
use tanks_core::config::EngineConfig;
use tanks_core::error::GameError;
use tanks_core::grid::{GridMap, TileCoord};
use tanks_core::math::Vec2Fixed;
use tanks_core::movement::pixel_center;
use tanks_core::pickups::{Pickup, PickupEffect};
use tanks_core::rng::SimRng;
use tanks_core::simulation::Simulation;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// The engine rejected the layout or config.
    #[error("Scenario rejected by the simulation: {0}")]
    Game(#[from] GameError),
    /// A placement does not fit the map.
    #[error("Invalid scenario: {0}")]
    Invalid(String),
}

/// An AI tank placed at scenario start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiPlacement {
    /// Archetype.
    pub archetype: AiArchetype,
    /// Spawn tile.
    pub tile: TileCoord,
    /// Generator seed. Derived from the scenario seed when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Strategic target. Defaults to the base tile.
    #[serde(default)]
    pub target: Option<TileCoord>,
}

/// A pickup placed at the center of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickupPlacement {
    /// Tile the pickup sits on.
    pub tile: TileCoord,
    /// Effect on collection.
    pub effect: PickupEffect,
}

/// Player input held for a span of ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSegment {
    /// First tick the input applies to.
    pub start: u64,
    /// Number of ticks it is held.
    pub ticks: u64,
    /// Movement direction, if any.
    #[serde(default)]
    pub direction: Option<Direction>,
    /// Hold the fire button.
    #[serde(default)]
    pub fire: bool,
}

impl InputSegment {
    fn covers(&self, tick: u64) -> bool {
        tick >= self.start && tick - self.start < self.ticks
    }
}

fn default_tile_size() -> (i32, i32) {
    (50, 50)
}

fn default_pickup_size() -> (i32, i32) {
    (30, 30)
}

fn default_tick_rate() -> u32 {
    60
}

fn default_max_ticks() -> u64 {
    3_600
}

/// A complete scenario configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Tile width and height in pixels.
    #[serde(default = "default_tile_size")]
    pub tile_size: (i32, i32),
    /// Map rows (`.` open, `#` brick, `@` steel, `B` base, `~` water, `^` forest).
    pub layout: Vec<String>,
    /// Engine tuning. Missing fields use the engine defaults.
    #[serde(default)]
    pub config: EngineConfig,
    /// Base seed for AI tanks and the reinforcement spawner.
    #[serde(default)]
    pub seed: u64,
    /// Player spawn tile.
    #[serde(default)]
    pub player: Option<TileCoord>,
    /// AI tanks present at start.
    #[serde(default)]
    pub ai: Vec<AiPlacement>,
    /// Pickups present at start.
    #[serde(default)]
    pub pickups: Vec<PickupPlacement>,
    /// Pickup box size in pixels.
    #[serde(default = "default_pickup_size")]
    pub pickup_size: (i32, i32),
    /// Scripted player input. Later segments win where they overlap.
    #[serde(default)]
    pub inputs: Vec<InputSegment>,
    /// Ticks per simulated second.
    #[serde(default = "default_tick_rate")]
    pub tick_rate: u32,
    /// Hard stop if the game has not ended.
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// Serialize back to pretty RON.
    pub fn to_ron_string(&self) -> Result<String, ScenarioError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ScenarioError::Invalid(e.to_string()))
    }

    /// Replace the base seed, including the spawner's.
    pub fn reseed(&mut self, seed: u64) {
        self.seed = seed;
        if let Some(spawner) = self.config.spawner.as_mut() {
            spawner.seed = SimRng::derive_seed(seed, u64::MAX);
        }
    }

    /// Seed used for the AI placement at `index`, if there is one.
    #[must_use]
    pub fn ai_seed(&self, index: usize) -> Option<u64> {
        self.ai
            .get(index)
            .map(|placement| self.placement_seed(index, placement))
    }

    fn placement_seed(&self, index: usize, placement: &AiPlacement) -> u64 {
        placement
            .seed
            .unwrap_or_else(|| SimRng::derive_seed(self.seed, index as u64))
    }

    /// Scripted input for `tick`.
    #[must_use]
    pub fn input_at(&self, tick: u64) -> PlayerInput {
        self.inputs
            .iter()
            .rev()
            .find(|segment| segment.covers(tick))
            .map(|segment| PlayerInput {
                direction: segment.direction,
                fire: segment.fire,
            })
            .unwrap_or_default()
    }

    /// Build the initial simulation.
    pub fn build(&self) -> Result<Simulation, ScenarioError> {
        if self.tick_rate == 0 {
            return Err(ScenarioError::Invalid("tick_rate must be positive".into()));
        }
        let (tile_width, tile_height) = self.tile_size;
        let mut sim = Simulation::from_layout(
            self.layout.as_slice(),
            tile_width,
            tile_height,
            self.config.clone(),
        )?;

        if let Some(tile) = self.player {
            check_walkable(sim.grid(), tile, "player spawn")?;
            sim.spawn_player(tile);
        }

        if let Some(spawner) = &self.config.spawner {
            for &tile in &spawner.spawn_points {
                check_walkable(sim.grid(), tile, "reinforcement spawn point")?;
            }
        }

        for (index, placement) in self.ai.iter().enumerate() {
            check_walkable(sim.grid(), placement.tile, "AI spawn")?;
            let seed = self.placement_seed(index, placement);
            let id = sim.spawn_ai(placement.archetype, placement.tile, seed);
            if placement.target.is_some() {
                sim.set_strategic_target(id, placement.target)?;
            }
        }

        let size = Vec2Fixed::from_ints(self.pickup_size.0, self.pickup_size.1);
        for placement in &self.pickups {
            if !sim.grid().in_bounds(placement.tile.x, placement.tile.y) {
                return Err(ScenarioError::Invalid(format!(
                    "pickup at ({}, {}) is outside the map",
                    placement.tile.x, placement.tile.y
                )));
            }
            let center = pixel_center(sim.grid(), placement.tile);
            sim.add_pickup(Pickup::new(center, size, placement.effect));
        }

        tracing::debug!(
            scenario = %self.name,
            actors = sim.actors().len(),
            pickups = sim.pickups().len(),
            "Scenario built"
        );
        Ok(sim)
    }
}

fn check_walkable<G: GridMap>(grid: &G, tile: TileCoord, what: &str) -> Result<(), ScenarioError> {
    if grid.is_walkable(tile.x, tile.y) {
        Ok(())
    } else {
        Err(ScenarioError::Invalid(format!(
            "{what} at ({}, {}) is not walkable",
            tile.x, tile.y
        )))
    }
}
