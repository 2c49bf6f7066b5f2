//! Collision resolution.
//!
//! Three passes, run in this order each tick after all movement:
//!
//! 1. actor vs actor: overlapping tanks are pushed apart along the line
//!    between their centers, each push routed through
//!    [`move_actor`] so nobody is shoved into a wall;
//! 2. projectile vs actor: first overlapping actor takes the hit;
//! 3. projectile vs terrain: bricks chip, the base takes damage, steel
//!    and the map edge absorb the projectile.
//!
//! Each pass is a single sweep. Three or more mutually overlapping tanks
//! may need several ticks to separate.

use serde::{Deserialize, Serialize};

use crate::components::{Actor, ActorId, DamageOutcome};
use crate::grid::{GridMap, TileCoord, TileKind};
use crate::math::{Fixed, Vec2Fixed};
use crate::movement::{move_actor, tile_of};
use crate::projectile::{ProjectileOwner, ProjectilePool};

/// Durability removed from a brick per projectile.
pub const BRICK_DAMAGE_PER_HIT: u32 = 1;

/// A projectile hitting an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectileHit {
    /// Pool slot of the projectile.
    pub projectile: usize,
    /// Actor that was hit.
    pub actor: ActorId,
    /// Projectile damage.
    pub damage: u32,
    /// What the hit did.
    pub outcome: DamageOutcome,
    /// Shooter class.
    pub owner: ProjectileOwner,
    /// Shooter id.
    pub shooter: Option<ActorId>,
}

/// What a projectile struck in the terrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImpactKind {
    /// Destructible wall, chipped by one point.
    Brick {
        /// Whether this hit turned the wall into open ground.
        destroyed: bool,
    },
    /// Indestructible wall.
    Steel,
    /// The base.
    Base {
        /// Damage applied.
        damage: u32,
    },
    /// Left the map.
    OutOfBounds,
}

/// A projectile stopped by terrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerrainImpact {
    /// Pool slot of the projectile.
    pub projectile: usize,
    /// Tile the projectile was in.
    pub tile: TileCoord,
    /// What it hit.
    pub kind: ImpactKind,
}

/// Push vector for actor `a` given the two centers and overlap size.
///
/// Coincident centers fall back to straight up for `a` (down for `b`).
#[must_use]
pub fn push_vector(a: Vec2Fixed, b: Vec2Fixed, overlap: Vec2Fixed, epsilon: Fixed) -> Vec2Fixed {
    let mut direction = (a - b).normalize();
    if direction == Vec2Fixed::ZERO {
        direction = Vec2Fixed::from_ints(0, -1);
    }
    let magnitude = overlap.x.min(overlap.y) / Fixed::from_num(2) + epsilon;
    direction.scale(magnitude)
}

/// Separate overlapping actors, one pass over every unordered pair in
/// index order. Returns the number of pairs pushed.
pub fn resolve_actor_overlaps<G: GridMap + ?Sized>(
    grid: &G,
    actors: &mut [Actor],
    margin: Fixed,
    epsilon: Fixed,
) -> usize {
    let mut pushed = 0;
    for i in 0..actors.len() {
        for j in (i + 1)..actors.len() {
            let (head, tail) = actors.split_at_mut(j);
            let a = &mut head[i];
            let b = &mut tail[0];
            if a.destroyed || b.destroyed {
                continue;
            }
            let Some(overlap) = a.bounds().intersection(&b.bounds()) else {
                continue;
            };

            let push = push_vector(
                a.position,
                b.position,
                Vec2Fixed::new(overlap.width, overlap.height),
                epsilon,
            );
            let a_target = a.position + push;
            let b_target = b.position - push;
            move_actor(grid, a, a_target, margin);
            move_actor(grid, b, b_target, margin);
            tracing::debug!(a = a.id, b = b.id, "Actors pushed apart");
            pushed += 1;
        }
    }
    pushed
}

/// Apply projectile hits to actors.
///
/// Projectiles are checked in activation order and actors in slice order;
/// each projectile hits at most one actor and is deactivated. Any actor can
/// be hit, including the shooter's allies.
pub fn resolve_projectile_hits(pool: &mut ProjectilePool, actors: &mut [Actor]) -> Vec<ProjectileHit> {
    let mut hits = Vec::new();
    let alive: Vec<usize> = pool.iter_alive().map(|(i, _)| i).collect();

    for index in alive {
        let Some(projectile) = pool.get(index).copied() else {
            continue;
        };
        let bounds = projectile.bounds();
        let Some(actor) = actors
            .iter_mut()
            .find(|a| !a.destroyed && a.bounds().intersects(&bounds))
        else {
            continue;
        };

        let outcome = actor.take_damage(projectile.damage);
        pool.deactivate(index);
        tracing::debug!(
            actor = actor.id,
            damage = projectile.damage,
            ?outcome,
            "Projectile hit actor"
        );
        hits.push(ProjectileHit {
            projectile: index,
            actor: actor.id,
            damage: projectile.damage,
            outcome,
            owner: projectile.owner,
            shooter: projectile.shooter,
        });
    }
    hits
}

/// Stop projectiles that entered blocking terrain or left the map, applying
/// tile and base damage.
pub fn resolve_projectile_terrain<G: GridMap + ?Sized>(
    grid: &mut G,
    pool: &mut ProjectilePool,
) -> Vec<TerrainImpact> {
    let mut impacts = Vec::new();
    let alive: Vec<usize> = pool.iter_alive().map(|(i, _)| i).collect();

    for index in alive {
        let Some(projectile) = pool.get(index).copied() else {
            continue;
        };
        let Some(tile) = tile_of(grid, projectile.position) else {
            tracing::warn!("Invalid tile geometry, skipping projectile terrain check");
            return impacts;
        };

        let kind = match grid.tile_kind(tile.x, tile.y) {
            None => ImpactKind::OutOfBounds,
            Some(kind) if !kind.stops_projectiles() => continue,
            Some(TileKind::Brick) => {
                grid.damage_tile(tile.x, tile.y, BRICK_DAMAGE_PER_HIT);
                let destroyed = grid.tile_kind(tile.x, tile.y) != Some(TileKind::Brick);
                ImpactKind::Brick { destroyed }
            }
            Some(TileKind::Base) => {
                grid.damage_base(projectile.damage);
                ImpactKind::Base {
                    damage: projectile.damage,
                }
            }
            Some(_) => ImpactKind::Steel,
        };

        pool.deactivate(index);
        impacts.push(TerrainImpact {
            projectile: index,
            tile,
            kind,
        });
    }
    impacts
}
