//! # Engine Configuration
//!
//! Startup-time tunables for terrain generation, the worker pool and the render cutoff.
//! The defaults reproduce the stock terrain; a JSON file named by
//! [`CONFIG_ENV_VAR`] can override any subset of fields. Values never change after
//! startup.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::engine_state::voxels::{
    chunk::CHUNK_DIMENSION,
    chunk_spawner::{
        BASE_SEARCH_RADIUS, PROXIMITY_THRESHOLD, SEARCH_RADIUS_CEILING, SEARCH_RADIUS_STEP,
    },
    density::{NOISE_AMPLITUDE, PERLIN_SCALE_FACTOR},
};
use crate::engine_state::rendering::meshing::mesh::culled::{MATERIAL_COUNT, MATERIAL_FREQUENCY};
use crate::engine_state::rendering::render_feeder::RENDER_DISTANCE;
use crate::engine_state::task_management::{WORKER_COUNT, WORKER_INTERVAL_MS};
use crate::error::EngineError;

/// Environment variable naming an optional JSON config override.
pub const CONFIG_ENV_VAR: &str = "VOXEL_TERRAIN_CONFIG";

/// Largest material count whose codes still fit above the three direction bits of a packed face.
pub const MAX_MATERIAL_COUNT: u32 = 1 << 28;

/// All tunables of the terrain viewer.
///
/// Missing fields in an override file fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Voxels along one chunk edge
    pub chunk_dimension: i32,
    /// Number of distinct materials faces are tagged with
    pub material_count: u32,
    /// Background generation threads
    pub worker_count: usize,
    /// Pause between two spawner passes of one worker, in milliseconds
    pub worker_interval_ms: u64,
    /// Kernel radius each worker starts its search with
    pub base_search_radius: i32,
    /// Radius added when a pass spawns nothing
    pub search_radius_step: i32,
    /// Radius beyond which the spawner stops widening
    pub search_radius_ceiling: i32,
    /// Chunks closer than this (in chunk coordinates) are generated regardless of facing
    pub proximity_threshold: f32,
    /// Chunks farther than this from the camera (world units, XZ plane) are not drawn
    pub render_distance: f32,
    /// Frequency applied to world coordinates before sampling the terrain noise
    pub noise_frequency: f64,
    /// Weight of the noise against the vertical falloff
    pub noise_amplitude: f64,
    /// Per-axis frequency of the material noise
    pub material_frequency: [f64; 3],
    /// Seed shared by the terrain and material noise
    pub seed: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            chunk_dimension: CHUNK_DIMENSION,
            material_count: MATERIAL_COUNT,
            worker_count: WORKER_COUNT,
            worker_interval_ms: WORKER_INTERVAL_MS,
            base_search_radius: BASE_SEARCH_RADIUS,
            search_radius_step: SEARCH_RADIUS_STEP,
            search_radius_ceiling: SEARCH_RADIUS_CEILING,
            proximity_threshold: PROXIMITY_THRESHOLD,
            render_distance: RENDER_DISTANCE,
            noise_frequency: PERLIN_SCALE_FACTOR,
            noise_amplitude: NOISE_AMPLITUDE,
            material_frequency: MATERIAL_FREQUENCY,
            seed: 0,
        }
    }
}

impl EngineConfig {
    /// Loads the configuration for this process.
    ///
    /// Reads the file named by [`CONFIG_ENV_VAR`] when the variable is set, otherwise
    /// returns the defaults. The result is always validated.
    ///
    /// # Returns
    /// The validated config, or the read, parse or validation error
    pub fn load() -> Result<Self, EngineError> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::from_file(Path::new(&path)),
            None => {
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    /// Reads and validates a JSON config file.
    ///
    /// # Arguments
    /// * `path` - Location of the JSON document
    pub fn from_file(path: &Path) -> Result<Self, EngineError> {
        let text = std::fs::read_to_string(path).map_err(|source| EngineError::ConfigRead {
            path: PathBuf::from(path),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Parses and validates a JSON config document.
    pub fn from_json(text: &str) -> Result<Self, EngineError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every field against the ranges the engine can run with.
    pub fn validate(&self) -> Result<(), EngineError> {
        let invalid = |message: &str| Err(EngineError::InvalidConfig(message.to_string()));

        if self.chunk_dimension < 1 {
            return invalid("chunk_dimension must be at least 1");
        }
        if self.material_count < 1 || self.material_count > MAX_MATERIAL_COUNT {
            return invalid("material_count must be between 1 and 2^28");
        }
        if self.worker_count < 1 {
            return invalid("worker_count must be at least 1");
        }
        if self.base_search_radius < 0 {
            return invalid("base_search_radius must not be negative");
        }
        if self.search_radius_step < 1 {
            return invalid("search_radius_step must be at least 1");
        }
        if !(self.proximity_threshold >= 0.0) || !(self.render_distance > 0.0) {
            return invalid("proximity_threshold and render_distance must be positive");
        }
        if !(self.noise_frequency > 0.0) || self.material_frequency.iter().any(|f| !(*f > 0.0)) {
            return invalid("noise frequencies must be positive");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_stock_terrain() {
        let config = EngineConfig::default();
        assert_eq!(config.chunk_dimension, 32);
        assert_eq!(config.material_count, 6);
        assert_eq!(config.worker_count, 19);
        assert_eq!(config.worker_interval_ms, 100);
        assert_eq!(config.search_radius_step, 4);
        assert_eq!(config.search_radius_ceiling, 20);
        assert_eq!(config.render_distance, 500.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let config = EngineConfig::from_json(r#"{ "chunk_dimension": 16, "worker_count": 4 }"#)
            .unwrap();
        assert_eq!(config.chunk_dimension, 16);
        assert_eq!(config.worker_count, 4);
        assert_eq!(config.material_count, EngineConfig::default().material_count);
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(matches!(
            EngineConfig::from_json(r#"{ "chunk_dimension": 0 }"#),
            Err(EngineError::InvalidConfig(_))
        ));
        assert!(matches!(
            EngineConfig::from_json(r#"{ "material_count": 0 }"#),
            Err(EngineError::InvalidConfig(_))
        ));
        assert!(matches!(
            EngineConfig::from_json(r#"{ "search_radius_step": 0 }"#),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            EngineConfig::from_json("{ chunk_dimension: "),
            Err(EngineError::ConfigParse(_))
        ));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let result = EngineConfig::from_file(Path::new("/nonexistent/terrain.json"));
        assert!(matches!(result, Err(EngineError::ConfigRead { .. })));
    }
}
