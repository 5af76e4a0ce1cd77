//! Deterministic simulation module
//!
//! All movement and collision logic lives here. This module must be pure and
//! deterministic:
//! - One call to `tick` per frame, no suspension inside it
//! - Seeded RNG only (map generation)
//! - Stable iteration order (player first, then NPCs in spawn order)
//! - No rendering or input-polling dependencies

pub mod collision;
pub mod map;
pub mod spatial;
pub mod state;
pub mod tick;
pub mod vector;

pub use collision::{
    Hit, MAX_NPC_SPEED, MAX_TILE_STEP, TileContact, circle_tile_overlap, resolve_actors, resolve_tiles,
};
pub use map::{MapGen, Tile, TileMap, nearest_cell};
pub use spatial::SpatialIndex;
pub use state::{Body, BodyId, BodyTemplate, BodyView, Health, WorldState};
pub use tick::{TickInput, TickReport, Tuning, run_tick, tick};
pub use vector::{approach, approach_scalar, clamp_unit};
