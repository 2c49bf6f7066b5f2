//! Pickups (tools) and the effects they trigger.
//!
//! A pickup is an axis-aligned box on the map. The first live actor found
//! overlapping it consumes it. Effects feed the modifier engine; only the
//! armor and grenade effects act on actors directly.

use serde::{Deserialize, Serialize};

use crate::components::{Actor, ActorId};
use crate::config::{EngineConfig, PickupTuning};
use crate::grid::GridMap;
use crate::math::{Rect, Vec2Fixed};
use crate::modifiers::{apply_ai_slow, apply_modifier, ModifierKind};
use crate::movement::terrain_multiplier;

/// Effect of a pickup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PickupEffect {
    /// +armor, capped.
    Armor,
    /// Attack multiplier buff.
    Attack,
    /// Shorter fire cooldown.
    AttackSpeed,
    /// Flat speed bonus.
    Speed,
    /// Slows every AI tank and halves its fire rate.
    SlowAi,
    /// Destroys every non-player tank.
    Grenade,
}

/// A pickup on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pickup {
    /// Center, in pixels.
    pub position: Vec2Fixed,
    /// Box size.
    pub size: Vec2Fixed,
    /// Effect on collection.
    pub effect: PickupEffect,
    /// Cleared once collected.
    pub active: bool,
}

impl Pickup {
    /// New active pickup.
    #[must_use]
    pub const fn new(position: Vec2Fixed, size: Vec2Fixed, effect: PickupEffect) -> Self {
        Self {
            position,
            size,
            effect,
            active: true,
        }
    }

    /// Bounding box.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::from_center(self.position, self.size)
    }
}

/// A pickup collected this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickupCollected {
    /// Index in the simulation's pickup list.
    pub pickup: usize,
    /// Collector.
    pub actor: ActorId,
    /// Effect applied.
    pub effect: PickupEffect,
}

/// Apply `effect` as collected by `actors[collector]`.
pub fn apply_pickup<G: GridMap + ?Sized>(
    effect: PickupEffect,
    collector: usize,
    actors: &mut [Actor],
    grid: &G,
    config: &EngineConfig,
) {
    let tuning: &PickupTuning = &config.pickups;
    let slow = config.slow_terrain_multiplier;

    match effect {
        PickupEffect::Armor => {
            if let Some(actor) = actors.get_mut(collector) {
                let armor = actor.armor.add(tuning.armor_amount);
                tracing::debug!(actor = actor.id, armor, "Armor picked up");
            }
        }
        PickupEffect::Attack | PickupEffect::AttackSpeed | PickupEffect::Speed => {
            let (kind, magnitude, duration) = match effect {
                PickupEffect::Attack => (
                    ModifierKind::AttackMultiplier,
                    tuning.attack_multiplier,
                    tuning.attack_duration,
                ),
                PickupEffect::AttackSpeed => (
                    ModifierKind::FireRateMultiplier,
                    tuning.fire_rate_multiplier,
                    tuning.fire_rate_duration,
                ),
                _ => (
                    ModifierKind::SpeedIncrease,
                    tuning.speed_increase,
                    tuning.speed_duration,
                ),
            };
            if let Some(actor) = actors.get_mut(collector) {
                let terrain = terrain_multiplier(grid, actor.position, slow);
                apply_modifier(actor, kind, magnitude, duration, terrain);
            }
        }
        PickupEffect::SlowAi => {
            for actor in actors.iter_mut().filter(|a| a.kind.is_ai() && !a.destroyed) {
                let terrain = terrain_multiplier(grid, actor.position, slow);
                apply_ai_slow(
                    actor,
                    tuning.slow_speed_factor,
                    tuning.slow_cooldown_factor,
                    tuning.slow_duration,
                    terrain,
                );
            }
        }
        PickupEffect::Grenade => {
            let mut removed = 0_usize;
            for actor in actors.iter_mut().filter(|a| !a.kind.is_player() && !a.destroyed) {
                actor.destroy();
                removed += 1;
            }
            tracing::debug!(removed, "Grenade detonated");
        }
    }
}

/// Hand active pickups to the first live actor overlapping them.
pub fn collect_pickups<G: GridMap + ?Sized>(
    pickups: &mut [Pickup],
    actors: &mut [Actor],
    grid: &G,
    config: &EngineConfig,
) -> Vec<PickupCollected> {
    let mut collected = Vec::new();
    for (index, pickup) in pickups.iter_mut().enumerate() {
        if !pickup.active {
            continue;
        }
        let bounds = pickup.bounds();
        let Some(collector) = actors
            .iter()
            .position(|a| !a.destroyed && a.bounds().intersects(&bounds))
        else {
            continue;
        };

        pickup.active = false;
        let actor = actors[collector].id;
        apply_pickup(pickup.effect, collector, actors, grid, config);
        collected.push(PickupCollected {
            pickup: index,
            actor,
            effect: pickup.effect,
        });
    }
    collected
}
