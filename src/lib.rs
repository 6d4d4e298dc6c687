//! Client-side world core: chunk map, dirty tracking, and mesher scheduling.
#![forbid(unsafe_code)]

pub mod mesher;
pub mod session;
pub mod world;

pub use mesher::{
    BufferHandle, ChunkMesh, MeshEvent, MesherConfig, MesherRig, QuadBuffer, QuadUpload,
    UpdateStats,
};
pub use session::{apply_chunk_voxels, apply_set_voxel};
pub use world::{World, WorldEvent};
