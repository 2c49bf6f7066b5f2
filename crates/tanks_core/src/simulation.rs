//! Core simulation loop.
//!
//! [`Simulation`] owns the grid, every actor, the projectile pool and the
//! pickups, and advances them by a caller-supplied `dt`.
//!
//! # Tick order
//!
//! 1. fire timers and the AI spawner
//! 2. player input (free movement, firing)
//! 3. AI: decide if idle, advance the tile move, fire when ready
//! 4. actor vs actor push-apart
//! 5. pickups
//! 6. projectile flight, then projectile vs actor, then projectile vs terrain
//! 7. modifier timers and stat recomputation (with terrain)
//! 8. cleanup: dead projectiles and destroyed actors are removed, score
//!    and game status are updated
//!
//! Nothing is removed before step 8, so a tick never loses an entity in
//! the middle of collision resolution.
//!
//! # Determinism
//!
//! - No floating-point math (uses fixed-point via [`Fixed`])
//! - Per-actor seeded generators, no global randomness
//! - Actors are stored and processed in ascending id order
//!
//! # Example
//!
//! ```
//! use tanks_core::config::EngineConfig;
//! use tanks_core::grid::TileCoord;
//! use tanks_core::math::ratio;
//! use tanks_core::simulation::Simulation;
//!
//! let layout = ["@@@@@", "@...@", "@...@", "@.B.@", "@@@@@"];
//! let mut sim = Simulation::from_layout(&layout, 50, 50, EngineConfig::default()).unwrap();
//! let player = sim.spawn_player(TileCoord::new(1, 1));
//!
//! let events = sim.tick(ratio(1, 60));
//! assert!(events.deaths.is_empty());
//! assert_eq!(sim.get_tick(), 1);
//! assert!(sim.actor(player).is_some());
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::ai::{apply_decision, decide_next_action, fire_ready, reset_fire_timer};
use crate::collision::{
    resolve_actor_overlaps, resolve_projectile_hits, resolve_projectile_terrain, ProjectileHit,
    TerrainImpact,
};
use crate::components::{
    Actor, ActorId, ActorKind, AiArchetype, AiBrain, BaseStats, Controller, DamageOutcome,
    Direction, PlayerInput,
};
use crate::config::{EngineConfig, ProjectileConfig};
use crate::error::{GameError, Result};
use crate::grid::{GridMap, TileCoord, TileGrid};
use crate::math::{ratio, Fixed, Vec2Fixed};
use crate::modifiers::{apply_modifier, refresh_stats, tick_modifiers, ModifierKind};
use crate::movement::{advance_tile_move, move_player, pixel_center, terrain_multiplier};
use crate::pickups::{apply_pickup, collect_pickups, Pickup, PickupCollected, PickupEffect};
use crate::projectile::{ProjectileOwner, ProjectilePool, ProjectileSpawn};
use crate::rng::SimRng;
use crate::spawner::AiSpawner;

/// Nominal ticks per second for callers that want a fixed step.
pub const TICK_RATE: i32 = 60;

/// `dt` of one tick at [`TICK_RATE`].
#[must_use]
pub fn fixed_step() -> Fixed {
    ratio(1, TICK_RATE)
}

/// Overall game state. Terminal once it leaves `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GameStatus {
    /// Game in progress.
    #[default]
    Running,
    /// The base was destroyed.
    BaseDestroyed,
    /// The player tank was destroyed.
    PlayerDestroyed,
}

/// An actor turned to a new facing. Renderers re-fetch the frame set for
/// `(kind, direction)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacingChange {
    /// Actor that turned.
    pub actor: ActorId,
    /// Its type tag.
    pub kind: ActorKind,
    /// New facing.
    pub direction: Direction,
}

/// A projectile was launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShotFired {
    /// Shooter.
    pub actor: ActorId,
    /// Pool slot.
    pub projectile: usize,
    /// Damage carried.
    pub damage: u32,
}

/// A modifier ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierExpired {
    /// Actor the modifier was on.
    pub actor: ActorId,
    /// Expired kind.
    pub kind: ModifierKind,
}

/// Events generated during a tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickEvents {
    /// Projectile hits on actors.
    pub hits: Vec<ProjectileHit>,
    /// Projectiles stopped by terrain.
    pub impacts: Vec<TerrainImpact>,
    /// Actors removed this tick.
    pub deaths: Vec<ActorId>,
    /// Projectiles launched.
    pub shots: Vec<ShotFired>,
    /// Pickups collected.
    pub pickups: Vec<PickupCollected>,
    /// Facing changes.
    pub facing_changes: Vec<FacingChange>,
    /// Modifiers that ran out.
    pub expired_modifiers: Vec<ModifierExpired>,
    /// Actors spawned by the reinforcement timer.
    pub spawned: Vec<ActorId>,
    /// Actor pairs pushed apart.
    pub pushes: usize,
    /// Set on the tick the game ends.
    pub status_changed: Option<GameStatus>,
}

/// The tank simulation.
#[derive(Debug, Clone)]
pub struct Simulation<G: GridMap = TileGrid> {
    tick: u64,
    config: EngineConfig,
    grid: G,
    /// Ascending id order.
    actors: Vec<Actor>,
    projectiles: ProjectilePool,
    pickups: Vec<Pickup>,
    spawner: Option<AiSpawner>,
    next_id: ActorId,
    score: u64,
    status: GameStatus,
}

impl Simulation<TileGrid> {
    /// Build a simulation on a [`TileGrid`] parsed from layout rows, with
    /// brick and base durability taken from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid layouts, geometry or configuration.
    pub fn from_layout<S: AsRef<str>>(
        rows: &[S],
        tile_width: i32,
        tile_height: i32,
        config: EngineConfig,
    ) -> Result<Self> {
        let grid = TileGrid::from_rows(rows, tile_width, tile_height)?
            .with_durability(config.brick_durability, config.base_durability);
        Self::new(grid, config)
    }
}

impl<G: GridMap> Simulation<G> {
    /// Create a simulation on `grid`.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidGeometry`] if the grid has non-positive
    /// tile dimensions and [`GameError::InvalidConfig`] for a bad config.
    pub fn new(grid: G, config: EngineConfig) -> Result<Self> {
        if grid.tile_width() <= 0 || grid.tile_height() <= 0 {
            return Err(GameError::InvalidGeometry {
                tile_width: grid.tile_width(),
                tile_height: grid.tile_height(),
            });
        }
        config.validate()?;

        let projectiles =
            ProjectilePool::new(config.projectile.pool_capacity, config.projectile.size);
        let spawner = config.spawner.clone().map(AiSpawner::new);
        Ok(Self {
            tick: 0,
            config,
            grid,
            actors: Vec::new(),
            projectiles,
            pickups: Vec::new(),
            spawner,
            next_id: 1,
            score: 0,
            status: GameStatus::Running,
        })
    }

    /// Current tick number.
    #[must_use]
    pub const fn get_tick(&self) -> u64 {
        self.tick
    }

    /// Engine configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The map.
    #[must_use]
    pub const fn grid(&self) -> &G {
        &self.grid
    }

    /// Mutable map access for scripted terrain changes.
    pub fn grid_mut(&mut self) -> &mut G {
        &mut self.grid
    }

    /// Live actors in id order.
    #[must_use]
    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    /// Actor by id.
    #[must_use]
    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.index_of(id).map(|i| &self.actors[i])
    }

    /// Mutable actor by id.
    pub fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.index_of(id).map(|i| &mut self.actors[i])
    }

    /// The projectile pool.
    #[must_use]
    pub const fn projectiles(&self) -> &ProjectilePool {
        &self.projectiles
    }

    /// Pickups placed so far (collected ones stay, inactive).
    #[must_use]
    pub fn pickups(&self) -> &[Pickup] {
        &self.pickups
    }

    /// Score from destroyed AI tanks.
    #[must_use]
    pub const fn score(&self) -> u64 {
        self.score
    }

    /// Game status.
    #[must_use]
    pub const fn status(&self) -> GameStatus {
        self.status
    }

    /// Id of the live player tank, if any.
    #[must_use]
    pub fn player_id(&self) -> Option<ActorId> {
        self.actors.iter().find(|a| a.kind.is_player()).map(|a| a.id)
    }

    /// Number of live AI tanks.
    #[must_use]
    pub fn ai_count(&self) -> usize {
        self.actors.iter().filter(|a| a.kind.is_ai() && !a.destroyed).count()
    }

    fn index_of(&self, id: ActorId) -> Option<usize> {
        self.actors.binary_search_by_key(&id, |a| a.id).ok()
    }

    fn allocate_id(&mut self) -> ActorId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn terrain_at(&self, position: Vec2Fixed) -> Fixed {
        terrain_multiplier(&self.grid, position, self.config.slow_terrain_multiplier)
    }

    fn insert_actor(&mut self, mut actor: Actor) -> ActorId {
        let terrain = self.terrain_at(actor.position);
        refresh_stats(&mut actor, terrain);
        let id = actor.id;
        self.actors.push(actor);
        id
    }

    /// Spawn the player tank centered on `tile`.
    pub fn spawn_player(&mut self, tile: TileCoord) -> ActorId {
        let id = self.allocate_id();
        let tank = &self.config.player;
        let actor = Actor::new(
            id,
            ActorKind::Player,
            pixel_center(&self.grid, tile),
            tank.size,
            tank.stats,
            Controller::Player(PlayerInput::default()),
            self.config.armor_cap,
        );
        tracing::debug!(actor = id, tile_x = tile.x, tile_y = tile.y, "Player spawned");
        self.insert_actor(actor)
    }

    /// Spawn an AI tank centered on `tile`.
    ///
    /// Health, speed and attack are jittered from the archetype values by
    /// the tank's own generator, seeded with `seed`. The strategic target
    /// defaults to the base tile.
    pub fn spawn_ai(&mut self, archetype: AiArchetype, tile: TileCoord, seed: u64) -> ActorId {
        let id = self.allocate_id();
        let tuning = self.config.archetypes.get(archetype).clone();
        let jitter = &self.config.jitter;
        let mut rng = SimRng::new(seed);

        let max_health = rng
            .jitter(Fixed::from_num(tuning.max_health), jitter.health)
            .round()
            .saturating_to_num::<u32>()
            .max(1);
        let speed = rng.jitter(tuning.speed, jitter.speed);
        let attack = rng.jitter(tuning.attack, jitter.attack);

        let base = BaseStats {
            max_health,
            speed,
            attack,
            fire_cooldown: tuning.nominal_cooldown(),
        };
        let mut brain = AiBrain::new(rng, tuning.cooldown);
        brain.strategic_target = self.grid.base_tile();

        let mut actor = Actor::new(
            id,
            ActorKind::Ai(archetype),
            pixel_center(&self.grid, tile),
            tuning.size,
            base,
            Controller::Ai(brain),
            self.config.armor_cap,
        );
        actor.facing = Direction::Down;
        tracing::debug!(actor = id, ?archetype, max_health, "AI spawned");
        self.insert_actor(actor)
    }

    /// Place a pickup. Returns its index.
    pub fn add_pickup(&mut self, pickup: Pickup) -> usize {
        self.pickups.push(pickup);
        self.pickups.len() - 1
    }

    /// Set or clear an AI's strategic target. A target with negative
    /// coordinates means "no target". Any tile move in progress is dropped
    /// so the AI re-decides next tick.
    ///
    /// # Errors
    ///
    /// [`GameError::ActorNotFound`] or [`GameError::NotAiControlled`].
    pub fn set_strategic_target(&mut self, id: ActorId, target: Option<TileCoord>) -> Result<()> {
        let actor = self.actor_mut(id).ok_or(GameError::ActorNotFound(id))?;
        let target = target.filter(|t| t.is_valid());
        let brain = actor.brain_mut().ok_or(GameError::NotAiControlled(id))?;
        brain.strategic_target = target;
        actor.intent.clear();
        Ok(())
    }

    /// Replace the player's held input.
    ///
    /// # Errors
    ///
    /// [`GameError::ActorNotFound`] or [`GameError::NotPlayerControlled`].
    pub fn set_player_input(&mut self, id: ActorId, input: PlayerInput) -> Result<()> {
        let actor = self.actor_mut(id).ok_or(GameError::ActorNotFound(id))?;
        match &mut actor.controller {
            Controller::Player(current) => {
                *current = input;
                Ok(())
            }
            Controller::Ai(_) => Err(GameError::NotPlayerControlled(id)),
        }
    }

    /// Apply (or replace) a modifier on one actor.
    ///
    /// # Errors
    ///
    /// [`GameError::ActorNotFound`] if no live actor has this id.
    pub fn apply_modifier(
        &mut self,
        id: ActorId,
        kind: ModifierKind,
        magnitude: Fixed,
        duration: Fixed,
    ) -> Result<()> {
        let index = self.index_of(id).ok_or(GameError::ActorNotFound(id))?;
        let terrain = self.terrain_at(self.actors[index].position);
        apply_modifier(&mut self.actors[index], kind, magnitude, duration, terrain);
        Ok(())
    }

    /// Trigger a pickup effect as if `id` had collected it.
    ///
    /// # Errors
    ///
    /// [`GameError::ActorNotFound`] if no live actor has this id.
    pub fn apply_pickup_effect(&mut self, id: ActorId, effect: PickupEffect) -> Result<()> {
        let index = self.index_of(id).ok_or(GameError::ActorNotFound(id))?;
        apply_pickup(effect, index, &mut self.actors, &self.grid, &self.config);
        Ok(())
    }

    /// Advance the simulation by `dt` seconds.
    ///
    /// Does nothing once the game has ended.
    pub fn tick(&mut self, dt: Fixed) -> TickEvents {
        let mut events = TickEvents::default();
        if self.status != GameStatus::Running {
            return events;
        }
        if dt < Fixed::ZERO {
            tracing::warn!(dt = %dt, "Negative frame time, skipping tick");
            return events;
        }
        self.tick += 1;

        let facing_before: Vec<(ActorId, Direction)> =
            self.actors.iter().map(|a| (a.id, a.facing)).collect();

        // 1. Timers and reinforcements
        for actor in self.actors.iter_mut().filter(|a| !a.destroyed) {
            actor.tick_fire_timer(dt);
        }
        self.run_spawner(dt, &mut events);

        // 2. Player input
        self.run_players(dt, &mut events);

        // 3. AI decide, move, fire
        self.run_ai(dt, &mut events);

        // 4. Actor vs actor
        events.pushes = resolve_actor_overlaps(
            &self.grid,
            &mut self.actors,
            self.config.collision_margin,
            self.config.push_epsilon,
        );

        // 5. Pickups
        events.pickups =
            collect_pickups(&mut self.pickups, &mut self.actors, &self.grid, &self.config);

        // 6. Projectiles
        self.projectiles.advance(dt);
        events.hits = resolve_projectile_hits(&mut self.projectiles, &mut self.actors);
        events.impacts = resolve_projectile_terrain(&mut self.grid, &mut self.projectiles);

        // 7. Modifiers and stats
        let slow = self.config.slow_terrain_multiplier;
        for actor in self.actors.iter_mut().filter(|a| !a.destroyed) {
            let terrain = terrain_multiplier(&self.grid, actor.position, slow);
            for kind in tick_modifiers(actor, dt, terrain) {
                events.expired_modifiers.push(ModifierExpired {
                    actor: actor.id,
                    kind,
                });
            }
        }

        // 8. Cleanup
        for (id, before) in facing_before {
            if let Some(actor) = self.actor(id) {
                if actor.facing != before {
                    events.facing_changes.push(FacingChange {
                        actor: id,
                        kind: actor.kind,
                        direction: actor.facing,
                    });
                }
            }
        }
        self.cleanup(&mut events);

        events
    }

    fn run_spawner(&mut self, dt: Fixed, events: &mut TickEvents) {
        let alive_ai = self.ai_count();
        let Some(request) = self.spawner.as_mut().and_then(|s| s.tick(dt, alive_ai)) else {
            return;
        };
        let id = self.spawn_ai(request.archetype, request.tile, request.seed);
        events.spawned.push(id);
    }

    fn run_players(&mut self, dt: Fixed, events: &mut TickEvents) {
        let margin = self.config.collision_margin;
        for index in 0..self.actors.len() {
            let actor = &mut self.actors[index];
            let Controller::Player(input) = actor.controller else {
                continue;
            };
            if actor.destroyed {
                continue;
            }
            if let Some(direction) = input.direction {
                move_player(&self.grid, actor, direction, dt, margin);
            }
            if input.fire && actor.can_fire() {
                actor.fire_timer = Fixed::ZERO;
                let shot = launch(&mut self.projectiles, actor, &self.config.projectile);
                events.shots.push(shot);
            }
        }
    }

    fn run_ai(&mut self, dt: Fixed, events: &mut TickEvents) {
        let hostiles: Vec<Vec2Fixed> = self
            .actors
            .iter()
            .filter(|a| a.kind.is_player() && !a.destroyed)
            .map(|a| a.position)
            .collect();
        let threshold = self.config.arrival_threshold;
        let margin = self.config.collision_margin;

        for index in 0..self.actors.len() {
            let actor = &mut self.actors[index];
            if !actor.kind.is_ai() || actor.destroyed {
                continue;
            }

            if !actor.intent.moving {
                let decision = decide_next_action(&self.grid, actor, hostiles.iter().copied());
                apply_decision(actor, decision);
            }
            advance_tile_move(&self.grid, actor, dt, threshold, margin);

            if fire_ready(actor) {
                let shot = launch(&mut self.projectiles, actor, &self.config.projectile);
                reset_fire_timer(actor);
                events.shots.push(shot);
            }
        }
    }

    fn cleanup(&mut self, events: &mut TickEvents) {
        self.projectiles.cleanup();

        for hit in &events.hits {
            if hit.outcome != DamageOutcome::Destroyed {
                continue;
            }
            if let Some(ActorKind::Ai(archetype)) = self.actor(hit.actor).map(|a| a.kind) {
                self.score += u64::from(self.config.archetypes.get(archetype).score);
            }
        }

        let mut player_died = false;
        for actor in self.actors.iter().filter(|a| a.destroyed) {
            events.deaths.push(actor.id);
            if actor.kind.is_player() {
                player_died = true;
                tracing::info!(actor = actor.id, "Player destroyed");
            } else {
                tracing::debug!(actor = actor.id, "Actor destroyed");
            }
        }
        self.actors.retain(|a| !a.destroyed);

        let status = if self.grid.is_base_destroyed() {
            GameStatus::BaseDestroyed
        } else if player_died {
            GameStatus::PlayerDestroyed
        } else {
            GameStatus::Running
        };
        if status != GameStatus::Running {
            tracing::info!(?status, tick = self.tick, score = self.score, "Game over");
            self.status = status;
            events.status_changed = Some(status);
        }
    }
}

impl<G: GridMap + Hash> Simulation<G> {
    /// Hash of the full simulation state, for determinism checks.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.tick.hash(&mut hasher);
        self.status.hash(&mut hasher);
        self.score.hash(&mut hasher);
        self.grid.hash(&mut hasher);

        self.actors.len().hash(&mut hasher);
        for actor in &self.actors {
            actor.id.hash(&mut hasher);
            actor.kind.hash(&mut hasher);
            actor.position.hash(&mut hasher);
            actor.facing.hash(&mut hasher);
            actor.health.hash(&mut hasher);
            actor.armor.hash(&mut hasher);
            actor.intent.moving.hash(&mut hasher);
            actor.intent.target.hash(&mut hasher);
            actor.fire_timer.to_bits().hash(&mut hasher);
            actor.stats.speed.to_bits().hash(&mut hasher);
            for (kind, modifier) in actor.modifiers.iter() {
                kind.hash(&mut hasher);
                modifier.hash(&mut hasher);
            }
            if let Some(brain) = actor.brain() {
                brain.strategic_target.hash(&mut hasher);
                brain.shot_cooldown.to_bits().hash(&mut hasher);
                brain.rng.hash(&mut hasher);
            }
        }

        for (index, projectile) in self.projectiles.iter_alive() {
            index.hash(&mut hasher);
            projectile.position.hash(&mut hasher);
            projectile.damage.hash(&mut hasher);
        }

        for pickup in &self.pickups {
            pickup.active.hash(&mut hasher);
        }

        hasher.finish()
    }
}

/// Fire a projectile from `actor` along its facing.
fn launch(pool: &mut ProjectilePool, actor: &Actor, config: &ProjectileConfig) -> ShotFired {
    let direction = actor.facing.unit_vector();
    let half = if actor.facing.is_vertical() {
        config.size.y / Fixed::from_num(2)
    } else {
        config.size.x / Fixed::from_num(2)
    };
    let offset = config.launch_offset + half;
    let damage = actor.stats.damage();

    let projectile = pool.acquire(ProjectileSpawn {
        position: actor.position + direction.scale(offset),
        direction,
        speed: config.speed,
        damage,
        owner: if actor.kind.is_player() {
            ProjectileOwner::Player
        } else {
            ProjectileOwner::Ai
        },
        shooter: Some(actor.id),
    });
    tracing::debug!(actor = actor.id, projectile, damage, "Shot fired");
    ShotFired {
        actor: actor.id,
        projectile,
        damage,
    }
}
