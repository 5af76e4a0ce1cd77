//! Deeper - a tile-grid dungeon crawler simulation
//!
//! Core modules:
//! - `sim`: Deterministic simulation (movement, collisions, world state)
//! - `settings`: JSON-configured world and tuning parameters
//!
//! Input polling and rendering live outside the crate; a frame is
//! `poll input -> sim::tick -> render`.

pub mod settings;
pub mod sim;

pub use settings::{Settings, SettingsError};
pub use sim::{TickInput, TickReport, WorldState, tick};
