//! Coordinate spaces and dirty-propagation fan-out.
#![forbid(unsafe_code)]

pub mod coord;
pub mod dirty;

pub use coord::{
    CHUNK_AREA, CHUNK_SIZE, CHUNK_SIZE_LOG2, CHUNK_VOLUME, ChunkCoord, LocalCoord, VoxelCoord,
    WorldCoord,
};
pub use dirty::{affected_by_chunk, affected_by_voxel};
