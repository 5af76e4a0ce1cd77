//! Simulation settings
//!
//! Loaded from a JSON file; every field is optional and falls back to the
//! default below.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::{BodyTemplate, MapGen, Tuning};

/// Largest body radius the tile resolver supports (half a cell)
pub const MAX_BODY_RADIUS: f32 = 0.5;

/// Largest accepted map side; keeps `side * side` cell counts well inside `i32`
pub const MAX_MAP_SIDE: i32 = 4096;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings from {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid settings: {0}")]
    Invalid(String),
}

/// Everything needed to build and run a world
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Map generation seed
    pub seed: u64,
    /// Map side length in cells
    pub map_side: i32,
    pub map: MapGen,
    pub player: BodyTemplate,
    /// Template for every generated NPC
    pub npc: BodyTemplate,
    pub tuning: Tuning,
    /// Length of a headless run
    pub ticks: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: 1,
            map_side: 64,
            map: MapGen::default(),
            player: BodyTemplate {
                radius: 0.4,
                health: 20,
                damage: 5,
                aggro: false,
            },
            npc: BodyTemplate::default(),
            tuning: Tuning::default(),
            ticks: 600,
        }
    }
}

impl Settings {
    /// Parse and validate settings JSON
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read, parse and validate a settings file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Load from `path` if given, logging and falling back to defaults on error
    pub fn load_or_default(path: Option<&Path>) -> Self {
        match path.map(Self::load) {
            Some(Ok(settings)) => settings,
            Some(Err(err)) => {
                log::warn!("{err}; using default settings");
                Self::default()
            }
            None => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(3..=MAX_MAP_SIDE).contains(&self.map_side) {
            return Err(SettingsError::Invalid(format!(
                "map_side must be within [3, {MAX_MAP_SIDE}], got {}",
                self.map_side
            )));
        }
        for (name, value) in [
            ("map.wall_threshold", self.map.wall_threshold),
            ("map.spawn_threshold", self.map.spawn_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(SettingsError::Invalid(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        for (name, template) in [("player", &self.player), ("npc", &self.npc)] {
            if !(template.radius > 0.0 && template.radius <= MAX_BODY_RADIUS) {
                return Err(SettingsError::Invalid(format!(
                    "{name}.radius must be within (0, {MAX_BODY_RADIUS}], got {}",
                    template.radius
                )));
            }
        }
        for (name, speed) in [
            ("tuning.player_speed", self.tuning.player_speed),
            ("tuning.pursuit_speed", self.tuning.pursuit_speed),
        ] {
            if !speed.is_finite() || speed < 0.0 {
                return Err(SettingsError::Invalid(format!(
                    "{name} must be a non-negative number, got {speed}"
                )));
            }
        }
        Ok(())
    }
}
