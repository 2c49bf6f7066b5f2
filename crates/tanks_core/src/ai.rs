//! AI decision policy.
//!
//! A deliberately simple greedy walker: close the vertical gap to the
//! strategic target first, then the horizontal gap, and when both straight
//! moves are blocked step to any walkable neighbor, preferring one that
//! differs from the current facing. It is not pathfinding and can stall
//! behind concave walls; the unstick step only makes that less likely.

use crate::components::{Actor, Direction};
use crate::grid::{GridMap, TileCoord};
use crate::math::{Fixed, Vec2Fixed};
use crate::movement::{pixel_center, tile_of};

/// What an idle AI does this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiDecision {
    /// Start a tile move.
    Move {
        /// Direction of the step.
        direction: Direction,
        /// Pixel center of the destination tile.
        target_center: Vec2Fixed,
    },
    /// On the target tile: turn toward a hostile without moving.
    Face(Direction),
    /// Nothing to do (moving, no target, or boxed in).
    Idle,
}

/// Cardinal direction that best points from `from` to `to`.
///
/// The dominant axis wins; ties go to the vertical axis.
#[must_use]
pub fn direction_toward(from: Vec2Fixed, to: Vec2Fixed) -> Direction {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    if dy.abs() >= dx.abs() {
        if dy < Fixed::ZERO {
            Direction::Up
        } else {
            Direction::Down
        }
    } else if dx < Fixed::ZERO {
        Direction::Left
    } else {
        Direction::Right
    }
}

fn step(tile: TileCoord, direction: Direction) -> TileCoord {
    let (dx, dy) = direction.tile_offset();
    tile.offset(dx, dy)
}

/// Greedy axis-closing move toward `target`, vertical first.
fn greedy_direction<G: GridMap + ?Sized>(
    grid: &G,
    current: TileCoord,
    target: TileCoord,
) -> Option<Direction> {
    let walkable = |d: Direction| {
        let next = step(current, d);
        grid.is_walkable(next.x, next.y)
    };

    if target.y < current.y && walkable(Direction::Up) {
        Some(Direction::Up)
    } else if target.y > current.y && walkable(Direction::Down) {
        Some(Direction::Down)
    } else if target.x < current.x && walkable(Direction::Left) {
        Some(Direction::Left)
    } else if target.x > current.x && walkable(Direction::Right) {
        Some(Direction::Right)
    } else {
        None
    }
}

/// Any walkable neighbor, preferring one not equal to `facing`.
fn unstick_direction<G: GridMap + ?Sized>(
    grid: &G,
    current: TileCoord,
    facing: Direction,
) -> Option<Direction> {
    let open: Vec<Direction> = Direction::ALL
        .into_iter()
        .filter(|d| {
            let next = step(current, *d);
            grid.is_walkable(next.x, next.y)
        })
        .collect();

    open.iter()
        .copied()
        .find(|d| *d != facing)
        .or_else(|| open.first().copied())
}

/// Choose the next action for an AI actor.
///
/// `hostiles` are the positions of actors this AI would turn toward once it
/// sits on its target tile; the nearest one wins.
pub fn decide_next_action<G, I>(grid: &G, actor: &Actor, hostiles: I) -> AiDecision
where
    G: GridMap + ?Sized,
    I: IntoIterator<Item = Vec2Fixed>,
{
    if actor.destroyed || actor.intent.moving {
        return AiDecision::Idle;
    }
    let Some(target) = actor.brain().and_then(|b| b.strategic_target) else {
        return AiDecision::Idle;
    };
    let Some(current) = tile_of(grid, actor.position) else {
        return AiDecision::Idle;
    };

    if current == target {
        return hostiles
            .into_iter()
            .min_by_key(|p| p.distance_squared(actor.position))
            .map_or(AiDecision::Idle, |p| {
                AiDecision::Face(direction_toward(actor.position, p))
            });
    }

    let direction = greedy_direction(grid, current, target)
        .or_else(|| unstick_direction(grid, current, actor.facing));

    match direction {
        Some(direction) => AiDecision::Move {
            direction,
            target_center: pixel_center(grid, step(current, direction)),
        },
        None => {
            tracing::debug!(actor = actor.id, tile_x = current.x, tile_y = current.y, "AI boxed in");
            AiDecision::Idle
        }
    }
}

/// Write a decision into the actor's movement intent and facing.
pub fn apply_decision(actor: &mut Actor, decision: AiDecision) {
    match decision {
        AiDecision::Move {
            direction,
            target_center,
        } => {
            actor.facing = direction;
            actor.intent.begin(direction, target_center);
        }
        AiDecision::Face(direction) => actor.facing = direction,
        AiDecision::Idle => {}
    }
}

/// Whether an AI's shot timer has reached its drawn cooldown.
#[must_use]
pub fn fire_ready(actor: &Actor) -> bool {
    actor.kind.is_ai() && actor.can_fire()
}

/// Restart an AI's shot timer and draw its next cooldown.
pub fn reset_fire_timer(actor: &mut Actor) {
    actor.fire_timer = Fixed::ZERO;
    if let Some(brain) = actor.brain_mut() {
        brain.redraw_cooldown();
    }
}
