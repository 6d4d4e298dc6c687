//! Voxel definitions, registry, and texture-atlas slot assignment.
#![forbid(unsafe_code)]

pub mod atlas;
pub mod config;
pub mod registry;
pub mod types;

pub use atlas::VoxelAtlas;
pub use registry::VoxelRegistry;
pub use types::{NULL_VOXEL, VoxelFace, VoxelFacing, VoxelId, VoxelInfo, VoxelShape, VoxelTexture};
