//! Tile-to-tile movement and the shared move-with-collision primitive.
//!
//! An actor in `MovingToTile` travels along one axis toward the pixel
//! center of the neighboring tile. The perpendicular axis is pinned to the
//! target center every tick so partial frames never accumulate diagonal
//! drift. Every position change, including push-apart and free player
//! movement, goes through [`move_actor`], which only commits a position
//! whose (slightly shrunk) bounding box covers walkable tiles exclusively.

use crate::components::{Actor, Direction};
use crate::grid::{GridMap, TileCoord};
use crate::math::{Fixed, Rect, Vec2Fixed};

/// Result of one [`advance_tile_move`] step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileMoveOutcome {
    /// Actor was not moving.
    Idle,
    /// Still on the way.
    Moving,
    /// Snapped to the target center; actor is idle again.
    Arrived,
    /// No progress possible; actor is idle again and will re-decide.
    Blocked,
}

/// Whether the grid has usable tile dimensions; warns when it does not.
fn valid_geometry<G: GridMap + ?Sized>(grid: &G) -> bool {
    let (w, h) = (grid.tile_width(), grid.tile_height());
    if w <= 0 || h <= 0 {
        tracing::warn!(tile_width = w, tile_height = h, "Invalid tile geometry, skipping");
        return false;
    }
    true
}

/// Tile containing a pixel position (floor division).
///
/// `None` when the grid has non-positive tile dimensions.
#[must_use]
pub fn tile_of<G: GridMap + ?Sized>(grid: &G, position: Vec2Fixed) -> Option<TileCoord> {
    let (w, h) = (grid.tile_width(), grid.tile_height());
    if w <= 0 || h <= 0 {
        return None;
    }
    let x = (position.x / Fixed::from_num(w)).floor().saturating_to_num::<i32>();
    let y = (position.y / Fixed::from_num(h)).floor().saturating_to_num::<i32>();
    Some(TileCoord::new(x, y))
}

/// Pixel center of a tile.
#[must_use]
pub fn pixel_center<G: GridMap + ?Sized>(grid: &G, tile: TileCoord) -> Vec2Fixed {
    let w = Fixed::from_num(grid.tile_width());
    let h = Fixed::from_num(grid.tile_height());
    let two = Fixed::from_num(2);
    Vec2Fixed::new(
        Fixed::from_num(tile.x) * w + w / two,
        Fixed::from_num(tile.y) * h + h / two,
    )
}

/// Bounding box used for terrain checks: the actor box shrunk by `margin`
/// on every side.
#[must_use]
pub fn actor_bounds(center: Vec2Fixed, size: Vec2Fixed, margin: Fixed) -> Rect {
    Rect::from_center(center, size).shrink(margin)
}

/// Inclusive tile range `(min, max)` covered by `bounds` along one axis.
fn covered_range(start: Fixed, end: Fixed, tile: i32) -> (i32, i32) {
    let tile = Fixed::from_num(tile);
    let first = (start / tile).floor().saturating_to_num::<i32>();
    // A box ending exactly on a tile edge does not reach into the next tile.
    let last = ((end / tile).ceil().saturating_to_num::<i32>() - 1).max(first);
    (first, last)
}

/// Every tile the bounds overlap, row by row.
#[cfg(test)]
fn covered_tiles<G: GridMap + ?Sized>(grid: &G, bounds: &Rect) -> Vec<TileCoord> {
    if !valid_geometry(grid) {
        return Vec::new();
    }
    let (x0, x1) = covered_range(bounds.left, bounds.right(), grid.tile_width());
    let (y0, y1) = covered_range(bounds.top, bounds.bottom(), grid.tile_height());
    (y0..=y1)
        .flat_map(|y| (x0..=x1).map(move |x| TileCoord::new(x, y)))
        .collect()
}

/// Whether an actor of `size` centered at `center` fits on walkable tiles.
#[must_use]
pub fn can_occupy<G: GridMap + ?Sized>(
    grid: &G,
    center: Vec2Fixed,
    size: Vec2Fixed,
    margin: Fixed,
) -> bool {
    if !valid_geometry(grid) {
        return false;
    }
    let bounds = actor_bounds(center, size, margin);
    let (x0, x1) = covered_range(bounds.left, bounds.right(), grid.tile_width());
    let (y0, y1) = covered_range(bounds.top, bounds.bottom(), grid.tile_height());
    (y0..=y1).all(|y| (x0..=x1).all(|x| grid.is_walkable(x, y)))
}

/// Move an actor to `desired` if every covered tile is walkable.
///
/// Returns `true` when the position was committed. Invalid geometry leaves
/// the actor where it is.
pub fn move_actor<G: GridMap + ?Sized>(
    grid: &G,
    actor: &mut Actor,
    desired: Vec2Fixed,
    margin: Fixed,
) -> bool {
    if can_occupy(grid, desired, actor.size, margin) {
        actor.position = desired;
        true
    } else {
        false
    }
}

/// Speed multiplier of the tile under the actor's center.
#[must_use]
pub fn terrain_multiplier<G: GridMap + ?Sized>(
    grid: &G,
    position: Vec2Fixed,
    slow_multiplier: Fixed,
) -> Fixed {
    tile_of(grid, position)
        .and_then(|t| grid.tile_kind(t.x, t.y))
        .map_or(Fixed::ONE, |kind| {
            if kind.is_slow() {
                slow_multiplier
            } else {
                Fixed::ONE
            }
        })
}

fn within_threshold(a: Vec2Fixed, b: Vec2Fixed, threshold: Fixed) -> bool {
    (a.x - b.x).abs() <= threshold && (a.y - b.y).abs() <= threshold
}

/// Advance an actor one tick toward its movement target.
///
/// Moves `speed * dt` along the intended axis without overshooting,
/// pins the other axis to the target, and snaps to the center once within
/// `arrival_threshold` on both axes.
pub fn advance_tile_move<G: GridMap + ?Sized>(
    grid: &G,
    actor: &mut Actor,
    dt: Fixed,
    arrival_threshold: Fixed,
    margin: Fixed,
) -> TileMoveOutcome {
    if !actor.intent.moving {
        return TileMoveOutcome::Idle;
    }

    let direction = actor.intent.direction;
    let target = actor.intent.target;
    actor.facing = direction;

    if within_threshold(actor.position, target, arrival_threshold) {
        actor.position = target;
        actor.intent.clear();
        return TileMoveOutcome::Arrived;
    }

    let before = actor.position;
    let step = actor.stats.speed * dt;
    let desired = if direction.is_vertical() {
        let dy = (target.y - before.y).clamp(-step, step);
        Vec2Fixed::new(target.x, before.y + dy)
    } else {
        let dx = (target.x - before.x).clamp(-step, step);
        Vec2Fixed::new(before.x + dx, target.y)
    };

    move_actor(grid, actor, desired, margin);

    if actor.position == before {
        tracing::debug!(actor = actor.id, ?direction, "Tile move blocked");
        actor.intent.clear();
        return TileMoveOutcome::Blocked;
    }

    #[cfg(feature = "debug-validation")]
    {
        let axis_gap = |p: Vec2Fixed| {
            if direction.is_vertical() {
                (target.y - p.y).abs()
            } else {
                (target.x - p.x).abs()
            }
        };
        assert!(
            axis_gap(actor.position) <= axis_gap(before),
            "tile move regressed away from its target"
        );
    }

    if within_threshold(actor.position, target, arrival_threshold) {
        actor.position = target;
        actor.intent.clear();
        return TileMoveOutcome::Arrived;
    }

    TileMoveOutcome::Moving
}

/// Free (non tile-locked) player movement for one tick.
///
/// Faces `direction` even when the move is blocked.
pub fn move_player<G: GridMap + ?Sized>(
    grid: &G,
    actor: &mut Actor,
    direction: Direction,
    dt: Fixed,
    margin: Fixed,
) -> bool {
    actor.facing = direction;
    let desired = actor.position + direction.unit_vector().scale(actor.stats.speed * dt);
    move_actor(grid, actor, desired, margin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{
        Actor, ActorKind, Armor, BaseStats, Controller, EffectiveStats, Health, MovementIntent,
        PlayerInput,
    };
    use crate::grid::TileGrid;
    use crate::math::ratio;
    use crate::modifiers::ModifierSet;

    fn actor_at(tile: TileCoord, grid: &TileGrid) -> Actor {
        let base = BaseStats {
            max_health: 100,
            speed: Fixed::from_num(100),
            attack: Fixed::from_num(10),
            fire_cooldown: ratio(1, 2),
        };
        Actor {
            id: 1,
            kind: ActorKind::Player,
            position: pixel_center(grid, tile),
            size: Vec2Fixed::from_ints(50, 50),
            facing: Direction::Up,
            base,
            stats: EffectiveStats {
                speed: base.speed,
                attack: base.attack,
                fire_cooldown: base.fire_cooldown,
            },
            health: Health::new(100),
            armor: Armor::empty(1),
            intent: MovementIntent::default(),
            modifiers: ModifierSet::default(),
            controller: Controller::Player(PlayerInput::default()),
            fire_timer: Fixed::ZERO,
            destroyed: false,
        }
    }

    fn grid() -> TileGrid {
        TileGrid::from_rows(&["@@@@@", "@...@", "@.#.@", "@~..@", "@@@@@"], 50, 50).unwrap()
    }

    const MARGIN: i32 = 2;

    fn margin() -> Fixed {
        Fixed::from_num(MARGIN)
    }

    #[test]
    fn test_tile_of_floors() {
        let g = grid();
        assert_eq!(tile_of(&g, Vec2Fixed::from_ints(75, 125)), Some(TileCoord::new(1, 2)));
        assert_eq!(tile_of(&g, Vec2Fixed::from_ints(-1, 0)), Some(TileCoord::new(-1, 0)));
        assert_eq!(pixel_center(&g, TileCoord::new(1, 2)), Vec2Fixed::from_ints(75, 125));
    }

    #[test]
    fn test_exact_edges_do_not_spill() {
        let g = grid();
        let bounds = Rect::from_center(Vec2Fixed::from_ints(75, 75), Vec2Fixed::from_ints(50, 50));
        assert_eq!(covered_tiles(&g, &bounds), vec![TileCoord::new(1, 1)]);
    }

    #[test]
    fn test_margin_tolerates_boundary_overlap() {
        let g = grid();
        // One pixel into the steel row above: allowed thanks to the margin.
        assert!(can_occupy(&g, Vec2Fixed::from_ints(75, 74), Vec2Fixed::from_ints(50, 50), margin()));
        assert!(!can_occupy(&g, Vec2Fixed::from_ints(75, 70), Vec2Fixed::from_ints(50, 50), margin()));
    }

    #[test]
    fn test_move_to_open_tile_arrives_at_center() {
        let g = grid();
        let mut actor = actor_at(TileCoord::new(1, 1), &g);
        let target = pixel_center(&g, TileCoord::new(2, 1));
        actor.intent.begin(Direction::Right, target);

        let dt = ratio(1, 10);
        let mut outcome = TileMoveOutcome::Moving;
        for _ in 0..10 {
            outcome = advance_tile_move(&g, &mut actor, dt, ratio(3, 2), margin());
            if outcome != TileMoveOutcome::Moving {
                break;
            }
        }
        assert_eq!(outcome, TileMoveOutcome::Arrived);
        assert_eq!(actor.position, target);
        assert!(!actor.intent.moving);
        assert_eq!(actor.facing, Direction::Right);
    }

    #[test]
    fn test_never_overshoots() {
        let g = grid();
        let mut actor = actor_at(TileCoord::new(1, 1), &g);
        actor.stats.speed = Fixed::from_num(10_000);
        let target = pixel_center(&g, TileCoord::new(2, 1));
        actor.intent.begin(Direction::Right, target);

        let outcome = advance_tile_move(&g, &mut actor, ratio(1, 10), ratio(3, 2), margin());
        assert_eq!(outcome, TileMoveOutcome::Arrived);
        assert_eq!(actor.position, target);
    }

    #[test]
    fn test_perpendicular_axis_snaps() {
        let g = grid();
        let mut actor = actor_at(TileCoord::new(1, 1), &g);
        actor.position.y += ratio(7, 10);
        actor.intent.begin(Direction::Right, pixel_center(&g, TileCoord::new(2, 1)));

        advance_tile_move(&g, &mut actor, ratio(1, 10), ratio(3, 2), margin());
        assert_eq!(actor.position.y, Fixed::from_num(75));
    }

    #[test]
    fn test_blocked_move_clears_intent() {
        let g = grid();
        let mut actor = actor_at(TileCoord::new(2, 1), &g);
        // Brick directly below.
        actor.intent.begin(Direction::Down, pixel_center(&g, TileCoord::new(2, 2)));

        let outcome = advance_tile_move(&g, &mut actor, ratio(1, 10), ratio(3, 2), margin());
        assert_eq!(outcome, TileMoveOutcome::Blocked);
        assert!(!actor.intent.moving);
        assert_eq!(actor.position, pixel_center(&g, TileCoord::new(2, 1)));
    }

    #[test]
    fn test_idle_actor_untouched() {
        let g = grid();
        let mut actor = actor_at(TileCoord::new(1, 1), &g);
        let before = actor.position;
        assert_eq!(
            advance_tile_move(&g, &mut actor, Fixed::ONE, ratio(3, 2), margin()),
            TileMoveOutcome::Idle
        );
        assert_eq!(actor.position, before);
    }

    #[test]
    fn test_player_move_blocked_by_wall() {
        let g = grid();
        let mut actor = actor_at(TileCoord::new(1, 1), &g);
        assert!(!move_player(&g, &mut actor, Direction::Up, ratio(1, 10), margin()));
        assert_eq!(actor.facing, Direction::Up);
        assert!(move_player(&g, &mut actor, Direction::Right, ratio(1, 2), margin()));
        assert_eq!(actor.position, Vec2Fixed::from_ints(125, 75));
    }

    #[test]
    fn test_terrain_multiplier() {
        let g = grid();
        let slow = ratio(1, 2);
        assert_eq!(terrain_multiplier(&g, pixel_center(&g, TileCoord::new(1, 3)), slow), slow);
        assert_eq!(terrain_multiplier(&g, pixel_center(&g, TileCoord::new(2, 3)), slow), Fixed::ONE);
    }

    #[test]
    fn test_invalid_geometry_is_skipped() {
        struct Degenerate;
        impl GridMap for Degenerate {
            fn tile_width(&self) -> i32 {
                0
            }
            fn tile_height(&self) -> i32 {
                50
            }
            fn tile_kind(&self, _x: i32, _y: i32) -> Option<crate::grid::TileKind> {
                Some(crate::grid::TileKind::Open)
            }
            fn damage_tile(&mut self, _x: i32, _y: i32, _amount: u32) {}
            fn damage_base(&mut self, _amount: u32) {}
            fn is_base_destroyed(&self) -> bool {
                false
            }
            fn base_tile(&self) -> Option<TileCoord> {
                None
            }
        }

        assert_eq!(tile_of(&Degenerate, Vec2Fixed::ZERO), None);
        assert!(!can_occupy(&Degenerate, Vec2Fixed::ZERO, Vec2Fixed::from_ints(10, 10), margin()));
    }
}
