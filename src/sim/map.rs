//! Static tile grid
//!
//! Tile `(x, y)` is centred on integer coordinates and covers
//! `[x - 0.5, x + 0.5] x [y - 0.5, y + 0.5]`. One cell is one distance unit.

use glam::{IVec2, Vec2};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// One static cell of the map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub coord: IVec2,
    pub solid: bool,
}

impl Tile {
    /// Centre of the tile in grid space
    #[inline]
    pub fn center(&self) -> Vec2 {
        self.coord.as_vec2()
    }
}

/// Procedural generation rule
///
/// A single uniform roll per interior cell decides both wall placement and
/// NPC spawning, so the two thresholds partition `[0, 1)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapGen {
    /// Rolls above this become walls
    pub wall_threshold: f32,
    /// Floor rolls above this get an NPC
    pub spawn_threshold: f32,
}

impl Default for MapGen {
    fn default() -> Self {
        Self {
            wall_threshold: 0.8,
            spawn_threshold: 0.6,
        }
    }
}

/// Fixed-size square grid of tiles, row-major
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileMap {
    side: i32,
    tiles: Vec<Tile>,
}

impl TileMap {
    /// Map of the given side with every cell set by `solid(coord)`
    pub fn from_fn(side: i32, mut solid: impl FnMut(IVec2) -> bool) -> Self {
        let side = side.max(0);
        let mut tiles = Vec::with_capacity((side * side) as usize);
        for y in 0..side {
            for x in 0..side {
                let coord = IVec2::new(x, y);
                tiles.push(Tile {
                    coord,
                    solid: solid(coord),
                });
            }
        }
        Self { side, tiles }
    }

    /// Solid border, open interior
    pub fn bordered(side: i32) -> Self {
        Self::from_fn(side, |c| c.x == 0 || c.y == 0 || c.x == side - 1 || c.y == side - 1)
    }

    /// Parse rows of `#` (wall) and anything else (floor).
    ///
    /// The map is square with side equal to the row count; short rows are
    /// padded with floor.
    pub fn from_rows(rows: &[&str]) -> Self {
        let side = rows.len() as i32;
        Self::from_fn(side, |c| {
            rows[c.y as usize]
                .as_bytes()
                .get(c.x as usize)
                .is_some_and(|&b| b == b'#')
        })
    }

    /// Generate a map and the list of NPC spawn cells
    pub fn generate<R: Rng>(side: i32, rule: &MapGen, rng: &mut R) -> (Self, Vec<IVec2>) {
        let mut spawns = Vec::new();
        let map = Self::from_fn(side, |c| {
            let roll: f32 = rng.random();
            let border = c.x == 0 || c.y == 0 || c.x == side - 1 || c.y == side - 1;
            if border || roll > rule.wall_threshold {
                true
            } else {
                if roll > rule.spawn_threshold {
                    spawns.push(c);
                }
                false
            }
        });
        log::info!(
            "Generated {}x{} map: {} walls, {} spawn points",
            side,
            side,
            map.tiles.iter().filter(|t| t.solid).count(),
            spawns.len()
        );
        (map, spawns)
    }

    /// Side length in cells
    #[inline]
    pub fn side(&self) -> i32 {
        self.side
    }

    #[inline]
    pub fn in_bounds(&self, cell: IVec2) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < self.side && cell.y < self.side
    }

    pub fn tile(&self, cell: IVec2) -> Option<&Tile> {
        if self.in_bounds(cell) {
            self.tiles.get((cell.y * self.side + cell.x) as usize)
        } else {
            None
        }
    }

    /// Out-of-bounds cells read as open floor
    #[inline]
    pub fn is_solid(&self, cell: IVec2) -> bool {
        self.tile(cell).is_some_and(|t| t.solid)
    }

    pub fn set_solid(&mut self, cell: IVec2, solid: bool) {
        if self.in_bounds(cell) {
            let idx = (cell.y * self.side + cell.x) as usize;
            self.tiles[idx].solid = solid;
        }
    }

    /// All tiles, row-major
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }
}

/// Nearest grid cell to a continuous position
#[inline]
pub fn nearest_cell(pos: Vec2) -> IVec2 {
    pos.round().as_ivec2()
}
