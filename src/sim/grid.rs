//! Tile grid with bounds-safe lookup.
//!
//! Out-of-range queries return [`TileKind::Solid`] so collision code never
//! branches on bounds and entities cannot leave the level through gaps.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::TILE_SIZE;

/// Tile type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TileKind {
    #[default]
    Air,
    Solid,
    /// One-way platform: supports entities arriving from above, never blocks
    /// horizontal motion or upward motion.
    Platform,
    /// Solid until broken by a head bump from a sufficiently powered player.
    Breakable,
    /// Damages entities standing in it; does not block motion.
    Hazard,
}

impl TileKind {
    /// Whether this tile blocks motion on either axis.
    pub fn is_solid(self) -> bool {
        matches!(self, TileKind::Solid | TileKind::Breakable)
    }

    /// Whether this tile blocks horizontal motion. Platforms never do.
    pub fn blocks_horizontal(self) -> bool {
        self.is_solid()
    }

    /// Whether this tile can support an entity arriving from above.
    pub fn supports_from_above(self) -> bool {
        self.is_solid() || self == TileKind::Platform
    }
}

/// Fixed-size 2D array of tile codes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileGrid {
    width: i32,
    height: i32,
    tiles: Vec<TileKind>,
}

impl TileGrid {
    /// Create an all-air grid. Width and height are in tiles.
    pub fn new(width: i32, height: i32) -> Self {
        assert!(width > 0 && height > 0, "grid dimensions must be positive");
        Self {
            width,
            height,
            tiles: vec![TileKind::Air; (width * height) as usize],
        }
    }

    /// Build a grid from a row-major code list. Rows shorter than `width`
    /// are padded with air; extra codes are ignored.
    pub fn from_codes(width: i32, height: i32, codes: &[TileKind]) -> Self {
        let mut grid = Self::new(width, height);
        for (i, &code) in codes.iter().take(grid.tiles.len()).enumerate() {
            grid.tiles[i] = code;
        }
        grid
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Level width in world pixels.
    pub fn pixel_width(&self) -> f32 {
        self.width as f32 * TILE_SIZE
    }

    /// Level height in world pixels.
    pub fn pixel_height(&self) -> f32 {
        self.height as f32 * TILE_SIZE
    }

    /// Tile at (col, row). Anything outside the grid reads as Solid.
    pub fn get(&self, col: i32, row: i32) -> TileKind {
        if col < 0 || col >= self.width || row < 0 || row >= self.height {
            return TileKind::Solid;
        }
        self.tiles[(row * self.width + col) as usize]
    }

    /// Set the tile at (col, row). Out-of-bounds writes are ignored.
    pub fn set(&mut self, col: i32, row: i32, kind: TileKind) {
        if col < 0 || col >= self.width || row < 0 || row >= self.height {
            return;
        }
        self.tiles[(row * self.width + col) as usize] = kind;
    }

    /// Tile containing a world-space position.
    pub fn at_world(&self, pos: Vec2) -> TileKind {
        self.get(
            (pos.x / TILE_SIZE).floor() as i32,
            (pos.y / TILE_SIZE).floor() as i32,
        )
    }

    /// Column index containing a world-space x coordinate.
    pub fn col_at(x: f32) -> i32 {
        (x / TILE_SIZE).floor() as i32
    }

    /// Row index containing a world-space y coordinate.
    pub fn row_at(y: f32) -> i32 {
        (y / TILE_SIZE).floor() as i32
    }

    /// Fill a horizontal run of tiles (inclusive columns).
    pub fn fill_row(&mut self, row: i32, col_start: i32, col_end: i32, kind: TileKind) {
        for col in col_start..=col_end {
            self.set(col, row, kind);
        }
    }
}
