//! Engine tuning.
//!
//! Every constant the simulation uses lives in [`EngineConfig`]. Values are
//! read from RON with decimal numbers and converted to fixed-point once.
//! Missing fields fall back to the defaults below.

use serde::{Deserialize, Serialize};

use crate::components::{AiArchetype, BaseStats, CooldownRange};
use crate::error::{GameError, Result};
use crate::grid::TileCoord;
use crate::math::{fixed_decimal, ratio, Fixed, Vec2Fixed};

/// Top-level simulation configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Distance (per axis, pixels) at which a tile move snaps to the center.
    #[serde(with = "fixed_decimal")]
    pub arrival_threshold: Fixed,
    /// Pixels shaved off each side of an actor before terrain checks.
    #[serde(with = "fixed_decimal")]
    pub collision_margin: Fixed,
    /// Extra pixels added to every push-apart displacement.
    #[serde(with = "fixed_decimal")]
    pub push_epsilon: Fixed,
    /// Speed factor while standing on slow terrain.
    #[serde(with = "fixed_decimal")]
    pub slow_terrain_multiplier: Fixed,
    /// Maximum armor points.
    pub armor_cap: u32,
    /// Starting durability of brick walls.
    pub brick_durability: u32,
    /// Starting durability of the base.
    pub base_durability: u32,
    /// Projectile tuning.
    pub projectile: ProjectileConfig,
    /// The player tank.
    pub player: TankConfig,
    /// AI tank archetypes.
    pub archetypes: ArchetypeTable,
    /// Spread applied to AI stats at spawn.
    pub jitter: JitterConfig,
    /// Pickup effects.
    pub pickups: PickupTuning,
    /// Optional AI reinforcement spawner.
    pub spawner: Option<SpawnerConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            arrival_threshold: ratio(3, 2),
            collision_margin: Fixed::from_num(2),
            push_epsilon: ratio(1, 10),
            slow_terrain_multiplier: ratio(1, 2),
            armor_cap: 1,
            brick_durability: 3,
            base_durability: 200,
            projectile: ProjectileConfig::default(),
            player: TankConfig::default(),
            archetypes: ArchetypeTable::default(),
            jitter: JitterConfig::default(),
            pickups: PickupTuning::default(),
            spawner: None,
        }
    }
}

impl EngineConfig {
    /// Parse from RON text and validate.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidConfig`] on parse or validation failure.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        let config: Self = ron::from_str(ron).map_err(|e| GameError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check values the simulation cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        let positive = |name: &str, value: Fixed| {
            if value > Fixed::ZERO {
                Ok(())
            } else {
                Err(GameError::InvalidConfig(format!("{name} must be positive, got {value}")))
            }
        };

        positive("arrival_threshold", self.arrival_threshold)?;
        positive("projectile.speed", self.projectile.speed)?;
        positive("projectile.size.x", self.projectile.size.x)?;
        positive("projectile.size.y", self.projectile.size.y)?;
        positive("player.size.x", self.player.size.x)?;
        positive("player.size.y", self.player.size.y)?;

        if self.collision_margin < Fixed::ZERO {
            return Err(GameError::InvalidConfig(
                "collision_margin must not be negative".to_string(),
            ));
        }
        if self.slow_terrain_multiplier < Fixed::ZERO {
            return Err(GameError::InvalidConfig(
                "slow_terrain_multiplier must not be negative".to_string(),
            ));
        }

        for archetype in [AiArchetype::Standard, AiArchetype::Fast, AiArchetype::Heavy] {
            let tuning = self.archetypes.get(archetype);
            if tuning.cooldown.min > tuning.cooldown.max {
                return Err(GameError::InvalidConfig(format!(
                    "{archetype:?} cooldown range is inverted"
                )));
            }
            positive("archetype size", tuning.size.x.min(tuning.size.y))?;
        }

        if let Some(spawner) = &self.spawner {
            positive("spawner.interval", spawner.interval)?;
            if spawner.spawn_points.is_empty() || spawner.archetypes.is_empty() {
                return Err(GameError::InvalidConfig(
                    "spawner needs at least one spawn point and archetype".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// Projectile tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileConfig {
    /// Inert projectiles allocated up front.
    pub pool_capacity: usize,
    /// Pixels per second.
    #[serde(with = "fixed_decimal")]
    pub speed: Fixed,
    /// Bounding box size.
    pub size: Vec2Fixed,
    /// Distance in front of the shooter's center where projectiles appear.
    #[serde(with = "fixed_decimal")]
    pub launch_offset: Fixed,
}

impl Default for ProjectileConfig {
    fn default() -> Self {
        Self {
            pool_capacity: 100,
            speed: Fixed::from_num(200),
            size: Vec2Fixed::from_ints(8, 8),
            launch_offset: Fixed::from_num(25),
        }
    }
}

/// Stats and size of a tank type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TankConfig {
    /// Base stats.
    pub stats: BaseStats,
    /// Bounding box size.
    pub size: Vec2Fixed,
}

impl Default for TankConfig {
    fn default() -> Self {
        Self {
            stats: BaseStats {
                max_health: 100,
                speed: Fixed::from_num(100),
                attack: Fixed::from_num(10),
                fire_cooldown: ratio(1, 2),
            },
            size: Vec2Fixed::from_ints(50, 50),
        }
    }
}

/// Tuning of one AI archetype.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchetypeConfig {
    /// Health before jitter.
    pub max_health: u32,
    /// Speed before jitter.
    #[serde(with = "fixed_decimal")]
    pub speed: Fixed,
    /// Attack before jitter.
    #[serde(with = "fixed_decimal")]
    pub attack: Fixed,
    /// Bounding box size.
    pub size: Vec2Fixed,
    /// Points awarded for destroying one.
    pub score: u32,
    /// Shot cooldown distribution.
    pub cooldown: CooldownRange,
}

impl ArchetypeConfig {
    /// Midpoint of the cooldown range, used as the nominal base cooldown.
    #[must_use]
    pub fn nominal_cooldown(&self) -> Fixed {
        (self.cooldown.min + self.cooldown.max) / Fixed::from_num(2)
    }
}

/// Tuning for every [`AiArchetype`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchetypeTable {
    /// [`AiArchetype::Standard`].
    pub standard: ArchetypeConfig,
    /// [`AiArchetype::Fast`].
    pub fast: ArchetypeConfig,
    /// [`AiArchetype::Heavy`].
    pub heavy: ArchetypeConfig,
}

impl ArchetypeTable {
    /// Tuning for `archetype`.
    #[must_use]
    pub const fn get(&self, archetype: AiArchetype) -> &ArchetypeConfig {
        match archetype {
            AiArchetype::Standard => &self.standard,
            AiArchetype::Fast => &self.fast,
            AiArchetype::Heavy => &self.heavy,
        }
    }
}

impl Default for ArchetypeTable {
    fn default() -> Self {
        let size = Vec2Fixed::from_ints(50, 50);
        Self {
            standard: ArchetypeConfig {
                max_health: 30,
                speed: Fixed::from_num(60),
                attack: Fixed::from_num(10),
                size,
                score: 100,
                cooldown: CooldownRange::new(Fixed::from_num(1), Fixed::from_num(3)),
            },
            fast: ArchetypeConfig {
                max_health: 20,
                speed: Fixed::from_num(90),
                attack: Fixed::from_num(8),
                size,
                score: 200,
                cooldown: CooldownRange::new(ratio(3, 2), ratio(7, 2)),
            },
            heavy: ArchetypeConfig {
                max_health: 60,
                speed: Fixed::from_num(40),
                attack: Fixed::from_num(15),
                size,
                score: 300,
                cooldown: CooldownRange::new(Fixed::from_num(2), Fixed::from_num(4)),
            },
        }
    }
}

/// Relative spread of AI stats at spawn (`0.2` = ±20 %).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JitterConfig {
    /// Health spread.
    #[serde(with = "fixed_decimal")]
    pub health: Fixed,
    /// Speed spread.
    #[serde(with = "fixed_decimal")]
    pub speed: Fixed,
    /// Attack spread.
    #[serde(with = "fixed_decimal")]
    pub attack: Fixed,
}

impl Default for JitterConfig {
    fn default() -> Self {
        Self {
            health: ratio(1, 5),
            speed: ratio(3, 20),
            attack: ratio(1, 4),
        }
    }
}

/// Magnitudes and durations of pickup effects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickupTuning {
    /// Armor points granted.
    pub armor_amount: u32,
    /// Attack multiplier.
    #[serde(with = "fixed_decimal")]
    pub attack_multiplier: Fixed,
    /// Attack buff duration (s).
    #[serde(with = "fixed_decimal")]
    pub attack_duration: Fixed,
    /// Cooldown multiplier of the attack-speed buff.
    #[serde(with = "fixed_decimal")]
    pub fire_rate_multiplier: Fixed,
    /// Attack-speed buff duration (s).
    #[serde(with = "fixed_decimal")]
    pub fire_rate_duration: Fixed,
    /// Flat speed bonus (px/s).
    #[serde(with = "fixed_decimal")]
    pub speed_increase: Fixed,
    /// Speed buff duration (s).
    #[serde(with = "fixed_decimal")]
    pub speed_duration: Fixed,
    /// AI speed factor while slowed.
    #[serde(with = "fixed_decimal")]
    pub slow_speed_factor: Fixed,
    /// AI cooldown factor while slowed.
    #[serde(with = "fixed_decimal")]
    pub slow_cooldown_factor: Fixed,
    /// AI slow duration (s).
    #[serde(with = "fixed_decimal")]
    pub slow_duration: Fixed,
}

impl Default for PickupTuning {
    fn default() -> Self {
        Self {
            armor_amount: 1,
            attack_multiplier: Fixed::from_num(2),
            attack_duration: Fixed::from_num(5),
            fire_rate_multiplier: ratio(2, 3),
            fire_rate_duration: Fixed::from_num(3),
            speed_increase: Fixed::from_num(100),
            speed_duration: Fixed::from_num(5),
            slow_speed_factor: ratio(3, 10),
            slow_cooldown_factor: Fixed::from_num(2),
            slow_duration: Fixed::from_num(10),
        }
    }
}

/// AI reinforcement timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnerConfig {
    /// Seconds between spawn attempts.
    #[serde(with = "fixed_decimal")]
    pub interval: Fixed,
    /// No spawn while this many AI tanks are alive.
    pub max_active: usize,
    /// Tiles cycled through for spawn positions.
    pub spawn_points: Vec<TileCoord>,
    /// Archetypes cycled through.
    pub archetypes: Vec<AiArchetype>,
    /// Seed for spawned tanks' generators.
    #[serde(default)]
    pub seed: u64,
}
