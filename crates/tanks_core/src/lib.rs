//! # Tanks Core
//!
//! Deterministic simulation core for a grid-based tank battle.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No system randomness (every AI tank owns a seeded generator)
//! - No floating-point math (uses fixed-point)
//!
//! This separation enables:
//! - Headless scenario runs
//! - Replay and determinism testing
//! - Swapping the front end without touching game rules
//!
//! ## Crate Structure
//!
//! - [`grid`] - Tile map, terrain kinds, brick and base durability
//! - [`components`] - Actor state (stats, health, armor, intent, controller)
//! - [`movement`] - Tile-to-tile and free movement with wall checks
//! - [`ai`] - AI decision making
//! - [`collision`] - Push-apart, projectile hits, terrain impacts
//! - [`modifiers`] - Timed stat modifiers and effective stat computation
//! - [`pickups`] - Pickup effects
//! - [`projectile`] - Reusable projectile pool
//! - [`spawner`] - AI reinforcement timer
//! - [`simulation`] - Core simulation loop
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod ai;
pub mod collision;
pub mod components;
pub mod config;
pub mod error;
pub mod grid;
pub mod math;
pub mod modifiers;
pub mod movement;
pub mod pickups;
pub mod projectile;
pub mod rng;
pub mod simulation;
pub mod spawner;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::ai::AiDecision;
    pub use crate::collision::{ImpactKind, ProjectileHit, TerrainImpact};
    pub use crate::components::*;
    pub use crate::config::{EngineConfig, SpawnerConfig};
    pub use crate::error::{GameError, Result};
    pub use crate::grid::{GridMap, TileCoord, TileGrid, TileKind};
    pub use crate::math::{ratio, Fixed, Rect, Vec2Fixed};
    pub use crate::modifiers::{ModifierKind, ModifierSet};
    pub use crate::pickups::{Pickup, PickupEffect};
    pub use crate::projectile::{ProjectileOwner, ProjectilePool};
    pub use crate::rng::SimRng;
    pub use crate::simulation::{GameStatus, Simulation, TickEvents, TICK_RATE};
}
