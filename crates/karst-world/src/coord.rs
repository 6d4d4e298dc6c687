use karst_geom::Vec3;
use serde::{Deserialize, Serialize};

pub const CHUNK_SIZE: usize = 16;
pub const CHUNK_SIZE_LOG2: u32 = 4;
pub const CHUNK_AREA: usize = CHUNK_SIZE * CHUNK_SIZE;
pub const CHUNK_VOLUME: usize = CHUNK_SIZE * CHUNK_SIZE * CHUNK_SIZE;

/// Global voxel position, one unit per voxel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VoxelCoord {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

/// Chunk grid position. One chunk covers `CHUNK_SIZE` voxels per axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

/// Position within a chunk. Canonical range is `[0, CHUNK_SIZE)` per axis;
/// arithmetic may step outside it and is normalized by converting through
/// [`ChunkCoord::to_voxel`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

/// Chunk position plus fractional offset, the transform handed to entities.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WorldCoord {
    pub chunk: ChunkCoord,
    pub local: Vec3,
}

impl VoxelCoord {
    #[inline]
    pub const fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }

    /// Owning chunk. Arithmetic shift floors toward negative infinity, so
    /// voxel -1 lands in chunk -1, not chunk 0.
    #[inline]
    pub const fn to_chunk(self) -> ChunkCoord {
        ChunkCoord {
            x: self.x >> CHUNK_SIZE_LOG2,
            y: self.y >> CHUNK_SIZE_LOG2,
            z: self.z >> CHUNK_SIZE_LOG2,
        }
    }

    /// Offset within the owning chunk, always in `[0, CHUNK_SIZE)`.
    #[inline]
    pub const fn to_local(self) -> LocalCoord {
        LocalCoord {
            x: (self.x & (CHUNK_SIZE as i64 - 1)) as i32,
            y: (self.y & (CHUNK_SIZE as i64 - 1)) as i32,
            z: (self.z & (CHUNK_SIZE as i64 - 1)) as i32,
        }
    }

    #[inline]
    pub fn to_world(self) -> WorldCoord {
        let local = self.to_local();
        WorldCoord {
            chunk: self.to_chunk(),
            local: Vec3::new(local.x as f32, local.y as f32, local.z as f32),
        }
    }

    #[inline]
    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.x as f32, self.y as f32, self.z as f32)
    }
}

impl ChunkCoord {
    #[inline]
    pub const fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }

    /// Global position of a local cell in this chunk.
    #[inline]
    pub const fn to_voxel(self, lpos: LocalCoord) -> VoxelCoord {
        VoxelCoord {
            x: (self.x << CHUNK_SIZE_LOG2) + lpos.x as i64,
            y: (self.y << CHUNK_SIZE_LOG2) + lpos.y as i64,
            z: (self.z << CHUNK_SIZE_LOG2) + lpos.z as i64,
        }
    }

    #[inline]
    pub const fn offset(self, dx: i64, dy: i64, dz: i64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            z: self.z + dz,
        }
    }

    #[inline]
    pub const fn dir_north(self) -> Self {
        self.offset(0, 0, -1)
    }
    #[inline]
    pub const fn dir_south(self) -> Self {
        self.offset(0, 0, 1)
    }
    #[inline]
    pub const fn dir_east(self) -> Self {
        self.offset(1, 0, 0)
    }
    #[inline]
    pub const fn dir_west(self) -> Self {
        self.offset(-1, 0, 0)
    }
    #[inline]
    pub const fn dir_up(self) -> Self {
        self.offset(0, 1, 0)
    }
    #[inline]
    pub const fn dir_down(self) -> Self {
        self.offset(0, -1, 0)
    }

    /// The six face-adjacent neighbors.
    #[inline]
    pub fn face_neighbors(self) -> [ChunkCoord; 6] {
        [
            self.dir_north(),
            self.dir_south(),
            self.dir_east(),
            self.dir_west(),
            self.dir_up(),
            self.dir_down(),
        ]
    }
}

impl LocalCoord {
    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Storage index; matches the layout of `VoxelStorage`.
    #[inline]
    pub const fn to_index(self) -> usize {
        (self.y as usize * CHUNK_SIZE + self.z as usize) * CHUNK_SIZE + self.x as usize
    }

    #[inline]
    pub const fn from_index(index: usize) -> Self {
        Self {
            x: (index % CHUNK_SIZE) as i32,
            y: (index / CHUNK_AREA) as i32,
            z: (index / CHUNK_SIZE % CHUNK_SIZE) as i32,
        }
    }

    #[inline]
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            z: self.z + dz,
        }
    }

    #[inline]
    pub const fn dir_north(self) -> Self {
        self.offset(0, 0, -1)
    }
    #[inline]
    pub const fn dir_south(self) -> Self {
        self.offset(0, 0, 1)
    }
    #[inline]
    pub const fn dir_east(self) -> Self {
        self.offset(1, 0, 0)
    }
    #[inline]
    pub const fn dir_west(self) -> Self {
        self.offset(-1, 0, 0)
    }
    #[inline]
    pub const fn dir_up(self) -> Self {
        self.offset(0, 1, 0)
    }
    #[inline]
    pub const fn dir_down(self) -> Self {
        self.offset(0, -1, 0)
    }

    #[inline]
    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.x as f32, self.y as f32, self.z as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_voxel_floors_into_negative_chunk() {
        let v = VoxelCoord::new(-1, 0, 0);
        assert_eq!(v.to_chunk(), ChunkCoord::new(-1, 0, 0));
        assert_eq!(v.to_local(), LocalCoord::new(15, 0, 0));
    }

    #[test]
    fn index_roundtrip_covers_volume() {
        for i in 0..CHUNK_VOLUME {
            let l = LocalCoord::from_index(i);
            assert!(l.x >= 0 && (l.x as usize) < CHUNK_SIZE);
            assert!(l.y >= 0 && (l.y as usize) < CHUNK_SIZE);
            assert!(l.z >= 0 && (l.z as usize) < CHUNK_SIZE);
            assert_eq!(l.to_index(), i);
        }
    }

    #[test]
    fn to_world_splits_chunk_and_fraction() {
        let v = VoxelCoord::new(-17, 33, 0);
        let w = v.to_world();
        assert_eq!(w.chunk, ChunkCoord::new(-2, 2, 0));
        assert_eq!(w.local.x, 15.0);
        assert_eq!(w.local.y, 1.0);
    }
}
