//! Build Configuration
//!
//! Reach, overlap tolerance and the proximity-sweep parameters used when a
//! house re-derives which connectors are still exposed. `Default` is the
//! single source of truth; a JSON file may override any subset of fields.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::game::building::BuildError;
use crate::physics::Layers;

/// Central configuration for the building system.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Maximum distance of the placement ray from the eye (meters)
    pub max_reach: f32,
    /// Ghost bodies are shrunk by this much before overlap checks so that
    /// pieces sharing a face are not reported as overlapping
    pub overlap_skin: f32,
    /// Layers that block a ghost. Connector markers never do; terrain does,
    /// and the skin keeps a piece resting on flat ground placeable.
    pub blocking_layers: Layers,
    /// Edge-connector dedup sweep is centred this far below the connector
    pub edge_sweep_offset: f32,
    /// Radius of the edge-connector dedup sweep
    pub edge_sweep_radius: f32,
    /// Radius of the sphere probing whether a socket is occupied by a body
    pub occupancy_probe_radius: f32,
    /// Merge two houses when their pieces are found covering each other's
    /// connectors. Off by default: houses only ever grow from one seed.
    pub merge_adjacent_houses: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            max_reach: 8.0,
            overlap_skin: 0.05,
            blocking_layers: Layers::all().difference(Layers::CONNECTORS),
            edge_sweep_offset: 0.25,
            edge_sweep_radius: 0.1,
            occupancy_probe_radius: 0.05,
            merge_adjacent_houses: false,
        }
    }
}

impl BuildConfig {
    pub fn from_json_str(json: &str) -> Result<Self, BuildError> {
        let config: BuildConfig = serde_json::from_str(json)?;
        Ok(config.sanitized())
    }

    pub fn load(path: &Path) -> Result<Self, BuildError> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        log::info!("Build config loaded from {}", path.display());
        Ok(config)
    }

    /// Connector layers are never obstacles for a ghost.
    fn sanitized(mut self) -> Self {
        if self.blocking_layers.intersects(Layers::CONNECTORS) {
            log::warn!(
                "Build config: ignoring connector layers in blocking_layers ({:?})",
                self.blocking_layers
            );
            self.blocking_layers.remove(Layers::CONNECTORS);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{ "max_reach": 12.5, "merge_adjacent_houses": true }"#;
        let config = BuildConfig::from_json_str(json).unwrap();
        assert_eq!(config.max_reach, 12.5);
        assert!(config.merge_adjacent_houses);
        assert_eq!(config.overlap_skin, BuildConfig::default().overlap_skin);
    }

    #[test]
    fn test_connector_layers_stripped_from_blocking_mask() {
        let json = r#"{ "blocking_layers": "PIECE | EDGE_CONNECTOR | TERRAIN" }"#;
        let config = BuildConfig::from_json_str(json).unwrap();
        assert_eq!(config.blocking_layers, Layers::PIECE | Layers::TERRAIN);
    }

    #[test]
    fn test_default_blocking_mask_excludes_only_connectors() {
        let mask = BuildConfig::default().blocking_layers;
        assert!(mask.contains(Layers::TERRAIN | Layers::PIECE | Layers::DOOR_DETAIL));
        assert!(!mask.intersects(Layers::CONNECTORS));
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(matches!(BuildConfig::from_json_str("{ max_reach: }"), Err(BuildError::Json(_))));
    }
}
