//! Actor data.
//!
//! A tank is a single [`Actor`] value. Kind-specific state (player input,
//! AI brain) lives in the [`Controller`] variant rather than in a class
//! hierarchy.

use serde::{Deserialize, Serialize};

use crate::grid::TileCoord;
use crate::math::{fixed_decimal, Fixed, Rect, Vec2Fixed};
use crate::modifiers::ModifierSet;
use crate::rng::SimRng;

/// Unique identifier for an actor. Never reused within a simulation.
pub type ActorId = u64;

/// Cardinal facing / movement direction. Screen space: `Up` is negative y.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Direction {
    /// Toward row 0.
    #[default]
    Up,
    /// Toward the last row.
    Down,
    /// Toward column 0.
    Left,
    /// Toward the last column.
    Right,
}

impl Direction {
    /// All directions in neighbor enumeration order.
    pub const ALL: [Self; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    /// Tile offset `(dx, dy)` of one step in this direction.
    #[must_use]
    pub const fn tile_offset(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }

    /// Unit vector in pixel space.
    #[must_use]
    pub fn unit_vector(self) -> Vec2Fixed {
        let (dx, dy) = self.tile_offset();
        Vec2Fixed::from_ints(dx, dy)
    }

    /// Whether movement in this direction runs along the y axis.
    #[must_use]
    pub const fn is_vertical(self) -> bool {
        matches!(self, Self::Up | Self::Down)
    }
}

/// AI tank variants. Each has its own tuning in
/// [`crate::config::ArchetypeTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AiArchetype {
    /// Balanced tank.
    Standard,
    /// Quick, fragile tank.
    Fast,
    /// Slow, armored tank.
    Heavy,
}

/// Type tag for an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ActorKind {
    /// Human-controlled tank.
    Player,
    /// Computer-controlled tank of the given archetype.
    Ai(AiArchetype),
}

impl ActorKind {
    /// Whether this is the player tank.
    #[must_use]
    pub const fn is_player(self) -> bool {
        matches!(self, Self::Player)
    }

    /// Whether this is an AI tank.
    #[must_use]
    pub const fn is_ai(self) -> bool {
        matches!(self, Self::Ai(_))
    }
}

/// Unmodified stats an actor was spawned with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseStats {
    /// Maximum (and starting) health.
    pub max_health: u32,
    /// Pixels per second.
    #[serde(with = "fixed_decimal")]
    pub speed: Fixed,
    /// Damage dealt per projectile.
    #[serde(with = "fixed_decimal")]
    pub attack: Fixed,
    /// Seconds between shots.
    #[serde(with = "fixed_decimal")]
    pub fire_cooldown: Fixed,
}

/// Stats after modifiers and terrain, recomputed every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EffectiveStats {
    /// Pixels per second, never negative.
    pub speed: Fixed,
    /// Damage dealt per projectile.
    pub attack: Fixed,
    /// Seconds between shots.
    pub fire_cooldown: Fixed,
}

impl EffectiveStats {
    /// Projectile damage for the current attack value.
    #[must_use]
    pub fn damage(&self) -> u32 {
        self.attack.max(Fixed::ZERO).saturating_to_num::<u32>()
    }
}

/// Health component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Health {
    /// Current health points.
    pub current: u32,
    /// Maximum health points.
    pub max: u32,
}

impl Health {
    /// Create new health component at full health.
    #[must_use]
    pub const fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    /// Check if entity is dead (health == 0).
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.current == 0
    }

    /// Apply damage, returning actual damage dealt.
    pub fn apply_damage(&mut self, amount: u32) -> u32 {
        let actual = amount.min(self.current);
        self.current = self.current.saturating_sub(actual);
        actual
    }
}

/// Armor counter. Each point absorbs one whole hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Armor {
    /// Points remaining.
    pub current: u32,
    /// Cap.
    pub max: u32,
}

impl Armor {
    /// No armor, with the given cap.
    #[must_use]
    pub const fn empty(max: u32) -> Self {
        Self { current: 0, max }
    }

    /// Add armor up to the cap. Returns the new value.
    pub fn add(&mut self, amount: u32) -> u32 {
        self.current = self.current.saturating_add(amount).min(self.max);
        self.current
    }

    /// Consume one point if any is left.
    pub fn absorb(&mut self) -> bool {
        if self.current == 0 {
            return false;
        }
        self.current -= 1;
        true
    }
}

/// Tile-to-tile movement state.
///
/// While `moving` is set the actor travels along `direction` toward
/// `target`, the pixel center of the next tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MovementIntent {
    /// `MovingToTile` when true, `Idle` otherwise.
    pub moving: bool,
    /// Pixel center of the destination tile.
    pub target: Vec2Fixed,
    /// Axis and sign of travel.
    pub direction: Direction,
}

impl MovementIntent {
    /// Start moving toward `target`.
    pub fn begin(&mut self, direction: Direction, target: Vec2Fixed) {
        self.moving = true;
        self.direction = direction;
        self.target = target;
    }

    /// Return to idle.
    pub fn clear(&mut self) {
        self.moving = false;
    }
}

/// Uniform range AI shot cooldowns are drawn from, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CooldownRange {
    /// Shortest cooldown.
    #[serde(with = "fixed_decimal")]
    pub min: Fixed,
    /// Longest cooldown.
    #[serde(with = "fixed_decimal")]
    pub max: Fixed,
}

impl CooldownRange {
    /// Create a range.
    #[must_use]
    pub const fn new(min: Fixed, max: Fixed) -> Self {
        Self { min, max }
    }

    /// Draw a cooldown.
    pub fn sample(&self, rng: &mut SimRng) -> Fixed {
        rng.range(self.min, self.max)
    }

    /// Both ends multiplied by `factor`.
    #[must_use]
    pub fn scaled(&self, factor: Fixed) -> Self {
        Self::new(self.min * factor, self.max * factor)
    }
}

/// Decision and firing state of an AI tank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiBrain {
    /// Tile the AI is heading for, `None` when it has no goal.
    pub strategic_target: Option<TileCoord>,
    /// Private generator for cooldown draws.
    pub rng: SimRng,
    /// Current cooldown between shots.
    pub shot_cooldown: Fixed,
    /// Distribution `shot_cooldown` is drawn from.
    pub cooldown_range: CooldownRange,
    /// Distribution in force before a fire-rate modifier scaled it.
    pub saved_cooldown_range: Option<CooldownRange>,
}

impl AiBrain {
    /// New brain with no target and a first cooldown already drawn.
    #[must_use]
    pub fn new(mut rng: SimRng, cooldown_range: CooldownRange) -> Self {
        let shot_cooldown = cooldown_range.sample(&mut rng);
        Self {
            strategic_target: None,
            rng,
            shot_cooldown,
            cooldown_range,
            saved_cooldown_range: None,
        }
    }

    /// Draw a fresh cooldown from the current range.
    pub fn redraw_cooldown(&mut self) {
        self.shot_cooldown = self.cooldown_range.sample(&mut self.rng);
    }
}

/// Held state of the player's controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlayerInput {
    /// Direction key held, if any.
    pub direction: Option<Direction>,
    /// Fire key held.
    pub fire: bool,
}

/// Who drives the actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Controller {
    /// Driven by [`PlayerInput`].
    Player(PlayerInput),
    /// Driven by the AI decision policy.
    Ai(AiBrain),
}

/// Result of a hit on an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageOutcome {
    /// Armor took the hit.
    Absorbed,
    /// Health was reduced but the actor survives.
    Damaged(u32),
    /// Health reached zero.
    Destroyed,
}

/// A tank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// Unique id.
    pub id: ActorId,
    /// Player or AI archetype.
    pub kind: ActorKind,
    /// Center of the bounding box, in pixels.
    pub position: Vec2Fixed,
    /// Bounding box size, in pixels.
    pub size: Vec2Fixed,
    /// Direction the turret points.
    pub facing: Direction,
    /// Spawn stats.
    pub base: BaseStats,
    /// Stats after modifiers and terrain.
    pub stats: EffectiveStats,
    /// Hit points.
    pub health: Health,
    /// Armor counter.
    pub armor: Armor,
    /// Tile-to-tile movement state.
    pub intent: MovementIntent,
    /// Active buffs and debuffs.
    pub modifiers: ModifierSet,
    /// Player input or AI brain.
    pub controller: Controller,
    /// Seconds since the last shot.
    pub fire_timer: Fixed,
    /// Terminal once set.
    pub destroyed: bool,
}

impl Actor {
    /// Fresh actor at full health with unmodified stats and no armor.
    #[must_use]
    pub fn new(
        id: ActorId,
        kind: ActorKind,
        position: Vec2Fixed,
        size: Vec2Fixed,
        base: BaseStats,
        controller: Controller,
        armor_cap: u32,
    ) -> Self {
        Self {
            id,
            kind,
            position,
            size,
            facing: Direction::Up,
            base,
            stats: EffectiveStats {
                speed: base.speed,
                attack: base.attack,
                fire_cooldown: base.fire_cooldown,
            },
            health: Health::new(base.max_health),
            armor: Armor::empty(armor_cap),
            intent: MovementIntent::default(),
            modifiers: ModifierSet::default(),
            controller,
            fire_timer: Fixed::ZERO,
            destroyed: false,
        }
    }

    /// Bounding box at the current position.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::from_center(self.position, self.size)
    }

    /// Cooldown the fire timer is compared against.
    #[must_use]
    pub fn current_fire_cooldown(&self) -> Fixed {
        match &self.controller {
            Controller::Ai(brain) => brain.shot_cooldown,
            Controller::Player(_) => self.stats.fire_cooldown,
        }
    }

    /// Whether enough time has passed since the last shot.
    #[must_use]
    pub fn can_fire(&self) -> bool {
        !self.destroyed && self.fire_timer >= self.current_fire_cooldown()
    }

    /// Advance the fire timer, saturating at the cooldown.
    pub fn tick_fire_timer(&mut self, dt: Fixed) {
        let cooldown = self.current_fire_cooldown();
        if self.fire_timer < cooldown {
            self.fire_timer = (self.fire_timer + dt).min(cooldown);
        }
    }

    /// Apply one projectile hit. Armor soaks a whole hit before health is
    /// touched.
    pub fn take_damage(&mut self, amount: u32) -> DamageOutcome {
        if self.destroyed {
            return DamageOutcome::Destroyed;
        }
        if self.armor.absorb() {
            return DamageOutcome::Absorbed;
        }

        let dealt = self.health.apply_damage(amount);
        if self.health.is_dead() {
            self.destroyed = true;
            DamageOutcome::Destroyed
        } else {
            DamageOutcome::Damaged(dealt)
        }
    }

    /// Mark destroyed regardless of health (grenade effect).
    pub fn destroy(&mut self) {
        self.health.current = 0;
        self.destroyed = true;
    }

    /// AI brain, if this actor has one.
    #[must_use]
    pub fn brain(&self) -> Option<&AiBrain> {
        match &self.controller {
            Controller::Ai(brain) => Some(brain),
            Controller::Player(_) => None,
        }
    }

    /// Mutable AI brain, if this actor has one.
    pub fn brain_mut(&mut self) -> Option<&mut AiBrain> {
        match &mut self.controller {
            Controller::Ai(brain) => Some(brain),
            Controller::Player(_) => None,
        }
    }
}
