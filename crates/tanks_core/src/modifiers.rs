//! Time-boxed stat modifiers (buffs and debuffs).
//!
//! Each actor holds at most one [`ActiveModifier`] per [`ModifierKind`].
//! Effective stats are never edited in place: they are recomputed from the
//! base stats, the active set, and the terrain under the actor, so an
//! expiring modifier restores the baseline for its stat automatically.
//!
//! Speed composes in a fixed order:
//!
//! ```text
//! speed = max(0, base * terrain * speed_multiplier + speed_increase)
//! ```
//!
//! The multiplicative terms apply to the base first and the flat bonus is
//! added last, so a slow tile halves the base speed but not a speed pickup.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::components::{Actor, BaseStats, Controller, EffectiveStats};
use crate::math::Fixed;

/// Stat dimension a modifier touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModifierKind {
    /// Multiplies base speed.
    SpeedMultiplier,
    /// Adds pixels per second after all multipliers.
    SpeedIncrease,
    /// Multiplies base attack.
    AttackMultiplier,
    /// Multiplies the fire cooldown (below 1 fires faster).
    FireRateMultiplier,
}

/// One running modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActiveModifier {
    /// Factor or flat amount, depending on the kind.
    pub magnitude: Fixed,
    /// Seconds left before expiry.
    pub remaining: Fixed,
}

/// Active modifiers of one actor, keyed by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModifierSet {
    active: BTreeMap<ModifierKind, ActiveModifier>,
}

impl ModifierSet {
    /// Insert or replace the modifier for `kind`. Returns the replaced one.
    pub fn insert(
        &mut self,
        kind: ModifierKind,
        magnitude: Fixed,
        duration: Fixed,
    ) -> Option<ActiveModifier> {
        self.active.insert(
            kind,
            ActiveModifier {
                magnitude,
                remaining: duration,
            },
        )
    }

    /// Modifier currently active for `kind`.
    #[must_use]
    pub fn get(&self, kind: ModifierKind) -> Option<&ActiveModifier> {
        self.active.get(&kind)
    }

    /// Magnitude for `kind`, if active.
    #[must_use]
    pub fn magnitude(&self, kind: ModifierKind) -> Option<Fixed> {
        self.active.get(&kind).map(|m| m.magnitude)
    }

    /// Whether any modifier of `kind` is active.
    #[must_use]
    pub fn contains(&self, kind: ModifierKind) -> bool {
        self.active.contains_key(&kind)
    }

    /// Number of active modifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Whether no modifier is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Iterate in kind order.
    pub fn iter(&self) -> impl Iterator<Item = (ModifierKind, &ActiveModifier)> {
        self.active.iter().map(|(k, m)| (*k, m))
    }

    /// Count every modifier down by `dt` and drop those that ran out.
    /// Returns the expired kinds in kind order.
    pub fn tick(&mut self, dt: Fixed) -> Vec<ModifierKind> {
        let mut expired = Vec::new();
        for (kind, modifier) in &mut self.active {
            modifier.remaining -= dt;
            if modifier.remaining <= Fixed::ZERO {
                expired.push(*kind);
            }
        }
        for kind in &expired {
            self.active.remove(kind);
        }
        expired
    }
}

/// Compose base stats, active modifiers and the terrain multiplier.
#[must_use]
pub fn compute_effective_stats(
    base: &BaseStats,
    modifiers: &ModifierSet,
    terrain_multiplier: Fixed,
) -> EffectiveStats {
    let speed_multiplier = modifiers
        .magnitude(ModifierKind::SpeedMultiplier)
        .unwrap_or(Fixed::ONE);
    let speed_increase = modifiers
        .magnitude(ModifierKind::SpeedIncrease)
        .unwrap_or(Fixed::ZERO);
    let speed = (base.speed * terrain_multiplier * speed_multiplier + speed_increase).max(Fixed::ZERO);

    let attack = modifiers
        .magnitude(ModifierKind::AttackMultiplier)
        .map_or(base.attack, |m| base.attack * m);

    let fire_cooldown = modifiers
        .magnitude(ModifierKind::FireRateMultiplier)
        .map_or(base.fire_cooldown, |m| base.fire_cooldown * m);

    EffectiveStats {
        speed,
        attack,
        fire_cooldown,
    }
}

/// Recompute an actor's effective stats in place.
pub fn refresh_stats(actor: &mut Actor, terrain_multiplier: Fixed) {
    actor.stats = compute_effective_stats(&actor.base, &actor.modifiers, terrain_multiplier);
}

/// Apply (or replace) a modifier and refresh stats immediately.
///
/// A fire-rate modifier on an AI scales its cooldown distribution instead
/// of a scalar: the unmodified range is saved once, the scaled range is
/// installed, and a new cooldown is drawn so the next shot already uses it.
pub fn apply_modifier(
    actor: &mut Actor,
    kind: ModifierKind,
    magnitude: Fixed,
    duration: Fixed,
    terrain_multiplier: Fixed,
) {
    if actor.destroyed {
        return;
    }

    let replaced = actor.modifiers.insert(kind, magnitude, duration);
    tracing::debug!(
        actor = actor.id,
        ?kind,
        magnitude = %magnitude,
        duration = %duration,
        replaced = replaced.is_some(),
        "Modifier applied"
    );

    if kind == ModifierKind::FireRateMultiplier {
        if let Controller::Ai(brain) = &mut actor.controller {
            let original = *brain
                .saved_cooldown_range
                .get_or_insert(brain.cooldown_range);
            brain.cooldown_range = original.scaled(magnitude);
            brain.redraw_cooldown();
        }
    }

    refresh_stats(actor, terrain_multiplier);
}

/// Apply the AI slow debuff: a speed multiplier and a cooldown multiplier
/// sharing one duration.
pub fn apply_ai_slow(
    actor: &mut Actor,
    speed_factor: Fixed,
    cooldown_factor: Fixed,
    duration: Fixed,
    terrain_multiplier: Fixed,
) {
    apply_modifier(
        actor,
        ModifierKind::SpeedMultiplier,
        speed_factor,
        duration,
        terrain_multiplier,
    );
    apply_modifier(
        actor,
        ModifierKind::FireRateMultiplier,
        cooldown_factor,
        duration,
        terrain_multiplier,
    );
}

/// Advance modifier timers by `dt`, undo expired effects and refresh stats.
/// Returns the kinds that expired this tick.
pub fn tick_modifiers(actor: &mut Actor, dt: Fixed, terrain_multiplier: Fixed) -> Vec<ModifierKind> {
    let expired = actor.modifiers.tick(dt);

    if expired.contains(&ModifierKind::FireRateMultiplier) {
        if let Controller::Ai(brain) = &mut actor.controller {
            if let Some(original) = brain.saved_cooldown_range.take() {
                brain.cooldown_range = original;
                brain.redraw_cooldown();
            }
        }
    }

    for kind in &expired {
        tracing::debug!(actor = actor.id, ?kind, "Modifier expired");
    }

    refresh_stats(actor, terrain_multiplier);
    expired
}
