//! Deterministic overworld generation: terrain, surface, carvers, features.
#![forbid(unsafe_code)]

pub mod config;
mod metadata;
mod overworld;

pub use config::OverworldConfig;
pub use metadata::{HEIGHT_UNSET, ColumnMetadata};
pub use overworld::{OverworldGenerator, TerrainPalette};
