use serde::Deserialize;
use std::error::Error;
use std::fs;
use std::path::Path;

/// Overworld tunables, loaded once at startup.
#[derive(Clone, Debug, Deserialize)]
pub struct OverworldConfig {
    /// Vertical amplitude of the terrain band, in voxels.
    #[serde(default = "default_terrain_variation")]
    pub terrain_variation: i64,
    /// Lowest chunk row the generator will populate.
    #[serde(default = "default_bottommost_chunk")]
    pub bottommost_chunk: i64,
    #[serde(default = "default_true")]
    pub enable_surface: bool,
    #[serde(default = "default_true")]
    pub enable_carvers: bool,
    #[serde(default = "default_true")]
    pub enable_features: bool,
}

fn default_terrain_variation() -> i64 {
    64
}
fn default_bottommost_chunk() -> i64 {
    -4
}
fn default_true() -> bool {
    true
}

impl Default for OverworldConfig {
    fn default() -> Self {
        Self {
            terrain_variation: default_terrain_variation(),
            bottommost_chunk: default_bottommost_chunk(),
            enable_surface: true,
            enable_carvers: true,
            enable_features: true,
        }
    }
}

impl OverworldConfig {
    pub fn from_toml_str(toml_str: &str) -> Result<Self, Box<dyn Error>> {
        Ok(toml::from_str(toml_str)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let cfg = OverworldConfig::from_toml_str("terrain_variation = 8").unwrap();
        assert_eq!(cfg.terrain_variation, 8);
        assert_eq!(cfg.bottommost_chunk, -4);
        assert!(cfg.enable_surface && cfg.enable_carvers && cfg.enable_features);
    }
}
