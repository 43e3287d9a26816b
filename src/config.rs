//! Simulation settings
//!
//! Tuning constants shared by every system. Stored as RON next to the map
//! and entity definitions; every field has a default so partial files work.

use std::fs;
use std::path::Path;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Error type for settings loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Simulation constants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Grid cell size as a power of two (cell size = 1 << cell_shift)
    pub cell_shift: u32,
    /// Ticks per animation frame
    pub animation_rate: u32,
    /// Downward acceleration per tick
    pub gravity: f32,
    /// Maximum step-up height
    pub step: f32,
    /// Horizontal velocity multiplier applied each tick while grounded
    pub friction: f32,
    /// Ticks a monster waits between idle scans
    pub look_cooldown: u32,
    /// Chance (0..1) that a monster plays its wake sound on spotting a target
    pub wake_sound_chance: f32,
    /// Shortest straight-line walk before a monster re-picks its direction
    pub move_duration_min: u32,
    /// Longest straight-line walk before a monster re-picks its direction
    pub move_duration_max: u32,
    /// UV scale applied to floor and ceiling triangles
    pub texture_scale: f32,
    /// Reach for line interaction
    pub interact_range: f32,
    /// Radians per tick at full turn input
    pub turn_speed: f32,
    /// Armor cap for pickups
    pub max_armor: i32,
    /// Speed of blood particles knocked off a hit
    pub blood_speed: f32,
    /// Particles spawned by a lethal hit
    pub death_effect_count: u32,
    /// Follow camera distance behind its target
    pub camera_distance: f32,
    /// Follow camera height above its target's feet
    pub camera_height: f32,
    /// Follow camera easing factor per tick (0..1)
    pub camera_lerp: f32,
    /// Seed for the simulation RNG (fixed seed = reproducible runs)
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            cell_shift: 3,              // 8 unit cells
            animation_rate: 5,
            gravity: 0.028,
            step: 0.5,
            friction: 0.88,
            look_cooldown: 40,
            wake_sound_chance: 0.5,
            move_duration_min: 16,
            move_duration_max: 48,
            texture_scale: 0.25,
            interact_range: 1.5,
            turn_speed: 0.05,
            max_armor: 200,
            blood_speed: 0.08,
            death_effect_count: 6,
            camera_distance: 4.0,
            camera_height: 1.2,
            camera_lerp: 0.25,
            seed: 0x5EC7_0125,
        }
    }
}

impl SimConfig {
    /// Grid cell edge length in world units.
    pub fn cell_size(&self) -> f32 {
        (1u32 << self.cell_shift) as f32
    }

    /// Parse settings from a RON string.
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = ron::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load settings from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_ron(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cell_shift == 0 || self.cell_shift > 16 {
            return Err(ConfigError::Validation(format!(
                "cell_shift must be in 1..=16, got {}", self.cell_shift)));
        }
        if self.animation_rate == 0 {
            return Err(ConfigError::Validation("animation_rate must be positive".into()));
        }
        if self.move_duration_min > self.move_duration_max {
            return Err(ConfigError::Validation(format!(
                "move_duration_min ({}) exceeds move_duration_max ({})",
                self.move_duration_min, self.move_duration_max)));
        }
        if !(0.0..=1.0).contains(&self.wake_sound_chance) {
            return Err(ConfigError::Validation("wake_sound_chance must be within 0..1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config = SimConfig::from_ron("(cell_shift: 4, seed: 7)").unwrap();
        assert_eq!(config.cell_shift, 4);
        assert_eq!(config.seed, 7);
        assert_eq!(config.animation_rate, SimConfig::default().animation_rate);
        assert_eq!(config.cell_size(), 16.0);
    }

    #[test]
    fn test_rejects_bad_move_duration() {
        let err = SimConfig::from_ron("(move_duration_min: 10, move_duration_max: 2)");
        assert!(matches!(err, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "(animation_rate: 3)").unwrap();
        let config = SimConfig::load(file.path()).unwrap();
        assert_eq!(config.animation_rate, 3);
    }

    #[test]
    fn test_bundled_config_parses() {
        let config = SimConfig::from_ron(include_str!("../assets/config.ron")).unwrap();
        assert_eq!(config.seed, 20250125);
        assert_eq!(config.camera_lerp, SimConfig::default().camera_lerp);
    }
}
