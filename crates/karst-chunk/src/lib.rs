//! Dense per-chunk voxel storage and the chunk record.
#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

use karst_voxel::{NULL_VOXEL, VoxelId};
use karst_world::{CHUNK_VOLUME, LocalCoord};

/// Dense voxel grid for one chunk, indexed by [`LocalCoord::to_index`].
/// Always exactly `CHUNK_VOLUME` entries; defaults to all [`NULL_VOXEL`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<VoxelId>", into = "Vec<VoxelId>")]
pub struct VoxelStorage {
    voxels: Box<[VoxelId]>,
}

impl Default for VoxelStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl VoxelStorage {
    pub fn new() -> Self {
        Self {
            voxels: vec![NULL_VOXEL; CHUNK_VOLUME].into_boxed_slice(),
        }
    }

    #[inline]
    pub fn get(&self, lpos: LocalCoord) -> VoxelId {
        self.voxels[lpos.to_index()]
    }

    #[inline]
    pub fn set(&mut self, lpos: LocalCoord, id: VoxelId) {
        self.voxels[lpos.to_index()] = id;
    }

    #[inline]
    pub fn get_index(&self, index: usize) -> VoxelId {
        self.voxels[index]
    }

    #[inline]
    pub fn set_index(&mut self, index: usize, id: VoxelId) {
        self.voxels[index] = id;
    }

    pub fn fill(&mut self, id: VoxelId) {
        self.voxels.fill(id);
    }

    #[inline]
    pub fn has_solid(&self) -> bool {
        self.voxels.iter().any(|&v| v != NULL_VOXEL)
    }

    pub fn as_slice(&self) -> &[VoxelId] {
        &self.voxels
    }
}

impl From<Vec<VoxelId>> for VoxelStorage {
    fn from(mut v: Vec<VoxelId>) -> Self {
        v.resize(CHUNK_VOLUME, NULL_VOXEL);
        Self {
            voxels: v.into_boxed_slice(),
        }
    }
}

impl From<VoxelStorage> for Vec<VoxelId> {
    fn from(s: VoxelStorage) -> Self {
        s.voxels.into_vec()
    }
}

/// Opaque renderable-entity association carried by network packets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// One loaded chunk: its committed voxel grid plus the entity it renders as.
#[derive(Clone, Debug)]
pub struct Chunk {
    pub voxels: VoxelStorage,
    pub entity: EntityId,
}

impl Chunk {
    pub fn new(voxels: VoxelStorage, entity: EntityId) -> Self {
        Self { voxels, entity }
    }
}
