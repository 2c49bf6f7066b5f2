//! Tile grid the tanks fight on.
//!
//! The simulation only talks to the map through the [`GridMap`] trait:
//! tile size, tile kind, actor walkability, and the two damage paths.
//! [`TileGrid`] is the in-crate implementation, built from a textual
//! layout since procedural generation lives outside the core.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

/// Default durability of a brick wall.
pub const BRICK_DURABILITY: u32 = 3;

/// Default durability of the base.
pub const BASE_DURABILITY: u32 = 200;

/// Integer tile coordinate. May be negative or past the map edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl TileCoord {
    /// Create a tile coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Whether this is a real (non-negative) coordinate.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.x >= 0 && self.y >= 0
    }

    /// Neighbor offset by `(dx, dy)`.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// What occupies a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TileKind {
    /// Open ground.
    #[default]
    Open,
    /// Destructible wall; turns into `Open` when its durability runs out.
    Brick,
    /// Indestructible wall.
    Steel,
    /// The defended base.
    Base,
    /// Slow terrain: walkable, applies the slow-terrain speed multiplier.
    Water,
    /// Walkable cover at full speed.
    Forest,
}

impl TileKind {
    /// Whether actors may occupy this tile.
    #[must_use]
    pub const fn is_walkable(self) -> bool {
        matches!(self, Self::Open | Self::Water | Self::Forest)
    }

    /// Whether actors on this tile get the slow-terrain multiplier.
    #[must_use]
    pub const fn is_slow(self) -> bool {
        matches!(self, Self::Water)
    }

    /// Whether projectiles stop when they enter this tile.
    #[must_use]
    pub const fn stops_projectiles(self) -> bool {
        matches!(self, Self::Brick | Self::Steel | Self::Base)
    }

    /// Parse a single layout glyph.
    #[must_use]
    pub const fn from_glyph(glyph: char) -> Option<Self> {
        match glyph {
            '.' => Some(Self::Open),
            '#' => Some(Self::Brick),
            '@' => Some(Self::Steel),
            'B' => Some(Self::Base),
            '~' => Some(Self::Water),
            '^' => Some(Self::Forest),
            _ => None,
        }
    }

    /// Glyph used in layout text.
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            Self::Open => '.',
            Self::Brick => '#',
            Self::Steel => '@',
            Self::Base => 'B',
            Self::Water => '~',
            Self::Forest => '^',
        }
    }
}

/// Map collaborator consumed by the movement, AI and collision code.
///
/// Coordinates outside the map are never walkable and have no kind.
pub trait GridMap {
    /// Tile width in pixels.
    fn tile_width(&self) -> i32;

    /// Tile height in pixels.
    fn tile_height(&self) -> i32;

    /// Tile kind at `(x, y)`, `None` when out of bounds.
    fn tile_kind(&self, x: i32, y: i32) -> Option<TileKind>;

    /// Whether an actor may occupy `(x, y)`.
    fn is_walkable(&self, x: i32, y: i32) -> bool {
        self.tile_kind(x, y).is_some_and(TileKind::is_walkable)
    }

    /// Apply durability damage to a destructible tile. Other tiles ignore it.
    fn damage_tile(&mut self, x: i32, y: i32, amount: u32);

    /// Apply damage to the base.
    fn damage_base(&mut self, amount: u32);

    /// Whether the base has been destroyed. Terminal once true.
    fn is_base_destroyed(&self) -> bool;

    /// Tile the base occupies, if the map has one.
    fn base_tile(&self) -> Option<TileCoord>;
}

/// Grid of tiles with per-tile durability and a single base.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TileGrid {
    /// Grid width in tiles.
    width: i32,
    /// Grid height in tiles.
    height: i32,
    /// Tile width in pixels.
    tile_width: i32,
    /// Tile height in pixels.
    tile_height: i32,
    /// Tile kinds in row-major order.
    tiles: Vec<TileKind>,
    /// Remaining durability per tile (only meaningful for bricks).
    durability: Vec<u32>,
    /// Remaining base durability.
    base_health: u32,
    /// Set once the base reaches zero durability.
    base_destroyed: bool,
}

impl TileGrid {
    /// Create a grid where every tile is open.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidGeometry`] for non-positive tile sizes and
    /// [`GameError::InvalidLayout`] for an empty map.
    pub fn open(width: i32, height: i32, tile_width: i32, tile_height: i32) -> Result<Self> {
        let row = ".".repeat(usize::try_from(width.max(0)).unwrap_or(0));
        let rows: Vec<String> = (0..height.max(0)).map(|_| row.clone()).collect();
        Self::from_rows(&rows, tile_width, tile_height)
    }

    /// Build a grid from layout rows (see [`TileKind::from_glyph`]).
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidGeometry`] for non-positive tile sizes and
    /// [`GameError::InvalidLayout`] for empty, ragged or unknown layouts.
    pub fn from_rows<S: AsRef<str>>(rows: &[S], tile_width: i32, tile_height: i32) -> Result<Self> {
        if tile_width <= 0 || tile_height <= 0 {
            return Err(GameError::InvalidGeometry {
                tile_width,
                tile_height,
            });
        }

        let width = rows.first().map_or(0, |r| r.as_ref().chars().count());
        if rows.is_empty() || width == 0 {
            return Err(GameError::InvalidLayout("layout has no tiles".to_string()));
        }

        let mut tiles = Vec::with_capacity(width * rows.len());
        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.chars().count() != width {
                return Err(GameError::InvalidLayout(format!(
                    "row {y} has {} tiles, expected {width}",
                    row.chars().count()
                )));
            }
            for (x, glyph) in row.chars().enumerate() {
                let kind = TileKind::from_glyph(glyph).ok_or_else(|| {
                    GameError::InvalidLayout(format!("unknown tile '{glyph}' at ({x}, {y})"))
                })?;
                tiles.push(kind);
            }
        }

        let to_i32 = |n: usize| {
            i32::try_from(n).map_err(|_| GameError::InvalidLayout("layout too large".to_string()))
        };

        let durability = tiles
            .iter()
            .map(|kind| if *kind == TileKind::Brick { BRICK_DURABILITY } else { 0 })
            .collect();

        Ok(Self {
            width: to_i32(width)?,
            height: to_i32(rows.len())?,
            tile_width,
            tile_height,
            tiles,
            durability,
            base_health: BASE_DURABILITY,
            base_destroyed: false,
        })
    }

    /// Override starting durability for bricks and the base.
    #[must_use]
    pub fn with_durability(mut self, brick: u32, base: u32) -> Self {
        for (kind, durability) in self.tiles.iter().zip(self.durability.iter_mut()) {
            if *kind == TileKind::Brick {
                *durability = brick;
            }
        }
        self.base_health = base;
        self
    }

    /// Grid width in tiles.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Grid height in tiles.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// Check if coordinates are within grid bounds.
    #[must_use]
    pub const fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    /// Convert (x, y) coordinates to grid index.
    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if !self.in_bounds(x, y) {
            return None;
        }
        usize::try_from(y * self.width + x).ok()
    }

    /// Overwrite a tile. Returns `false` if out of bounds.
    pub fn set_tile(&mut self, x: i32, y: i32, kind: TileKind) -> bool {
        let Some(index) = self.index(x, y) else {
            return false;
        };
        self.tiles[index] = kind;
        self.durability[index] = if kind == TileKind::Brick { BRICK_DURABILITY } else { 0 };
        true
    }

    /// Remaining durability of a brick, `None` for other tiles.
    #[must_use]
    pub fn tile_durability(&self, x: i32, y: i32) -> Option<u32> {
        let index = self.index(x, y)?;
        (self.tiles[index] == TileKind::Brick).then(|| self.durability[index])
    }

    /// Remaining base durability.
    #[must_use]
    pub const fn base_health(&self) -> u32 {
        self.base_health
    }

    /// Render the layout back to text rows.
    #[must_use]
    pub fn to_rows(&self) -> Vec<String> {
        self.tiles
            .chunks(usize::try_from(self.width).unwrap_or(1).max(1))
            .map(|row| row.iter().map(|t| t.glyph()).collect())
            .collect()
    }
}

impl GridMap for TileGrid {
    fn tile_width(&self) -> i32 {
        self.tile_width
    }

    fn tile_height(&self) -> i32 {
        self.tile_height
    }

    fn tile_kind(&self, x: i32, y: i32) -> Option<TileKind> {
        self.index(x, y).map(|i| self.tiles[i])
    }

    fn damage_tile(&mut self, x: i32, y: i32, amount: u32) {
        let Some(index) = self.index(x, y) else {
            return;
        };
        if self.tiles[index] != TileKind::Brick || self.durability[index] == 0 {
            return;
        }

        self.durability[index] = self.durability[index].saturating_sub(amount);
        if self.durability[index] == 0 {
            self.tiles[index] = TileKind::Open;
            tracing::debug!(tile_x = x, tile_y = y, "Brick destroyed");
        }
    }

    fn damage_base(&mut self, amount: u32) {
        if self.base_destroyed {
            return;
        }
        self.base_health = self.base_health.saturating_sub(amount);
        tracing::debug!(damage = amount, remaining = self.base_health, "Base damaged");
        if self.base_health == 0 {
            self.base_destroyed = true;
            tracing::info!("Base destroyed");
        }
    }

    fn is_base_destroyed(&self) -> bool {
        self.base_destroyed
    }

    fn base_tile(&self) -> Option<TileCoord> {
        let index = self.tiles.iter().position(|t| *t == TileKind::Base)?;
        let index = i32::try_from(index).ok()?;
        Some(TileCoord::new(index % self.width, index / self.width))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_grid() -> TileGrid {
        TileGrid::from_rows(&["@@@@@", "@.#~@", "@^.B@", "@@@@@"], 50, 50).unwrap()
    }

    #[test]
    fn test_parse_layout() {
        let grid = small_grid();
        assert_eq!(grid.width(), 5);
        assert_eq!(grid.height(), 4);
        assert_eq!(grid.tile_kind(2, 1), Some(TileKind::Brick));
        assert_eq!(grid.tile_kind(3, 1), Some(TileKind::Water));
        assert_eq!(grid.tile_kind(1, 2), Some(TileKind::Forest));
        assert_eq!(grid.to_rows()[1], "@.#~@");
    }

    #[test]
    fn test_walkability() {
        let grid = small_grid();
        assert!(grid.is_walkable(1, 1)); // open
        assert!(grid.is_walkable(3, 1)); // water, slow
        assert!(grid.is_walkable(1, 2)); // forest
        assert!(!grid.is_walkable(2, 1)); // brick
        assert!(!grid.is_walkable(0, 0)); // steel
        assert!(!grid.is_walkable(3, 2)); // base
        assert!(!grid.is_walkable(-1, 0));
        assert!(!grid.is_walkable(5, 1));
    }

    #[test]
    fn test_invalid_geometry_rejected() {
        let err = TileGrid::from_rows(&["..."], 0, 50).unwrap_err();
        assert_eq!(
            err,
            GameError::InvalidGeometry {
                tile_width: 0,
                tile_height: 50
            }
        );
    }

    #[test]
    fn test_ragged_layout_rejected() {
        assert!(matches!(
            TileGrid::from_rows(&["...", ".."], 50, 50),
            Err(GameError::InvalidLayout(_))
        ));
        assert!(matches!(
            TileGrid::from_rows(&[".x."], 50, 50),
            Err(GameError::InvalidLayout(_))
        ));
    }

    #[test]
    fn test_brick_breaks_on_third_hit() {
        let mut grid = small_grid();
        grid.damage_tile(2, 1, 1);
        grid.damage_tile(2, 1, 1);
        assert_eq!(grid.tile_kind(2, 1), Some(TileKind::Brick));
        assert_eq!(grid.tile_durability(2, 1), Some(1));

        grid.damage_tile(2, 1, 1);
        assert_eq!(grid.tile_kind(2, 1), Some(TileKind::Open));
        assert!(grid.is_walkable(2, 1));
        assert_eq!(grid.tile_durability(2, 1), None);
    }

    #[test]
    fn test_steel_ignores_damage() {
        let mut grid = small_grid();
        grid.damage_tile(0, 0, 100);
        assert_eq!(grid.tile_kind(0, 0), Some(TileKind::Steel));
    }

    #[test]
    fn test_base_destruction_is_terminal() {
        let mut grid = small_grid().with_durability(3, 20);
        assert_eq!(grid.base_tile(), Some(TileCoord::new(3, 2)));

        grid.damage_base(15);
        assert!(!grid.is_base_destroyed());
        grid.damage_base(15);
        assert!(grid.is_base_destroyed());
        assert_eq!(grid.base_health(), 0);

        grid.damage_base(15);
        assert!(grid.is_base_destroyed());
    }

    #[test]
    fn test_projectile_stopping_tiles() {
        let stopping: Vec<TileKind> = [
            TileKind::Open,
            TileKind::Brick,
            TileKind::Steel,
            TileKind::Base,
            TileKind::Water,
            TileKind::Forest,
        ]
        .into_iter()
        .filter(|kind| kind.stops_projectiles())
        .collect();
        assert_eq!(stopping, vec![TileKind::Brick, TileKind::Steel, TileKind::Base]);
    }

    #[test]
    fn test_open_grid() {
        let grid = TileGrid::open(4, 3, 32, 32).unwrap();
        assert!(grid.is_walkable(3, 2));
        assert_eq!(grid.base_tile(), None);
    }
}
