/// Runtime voxel identifier. Indexes into the [`crate::VoxelRegistry`].
pub type VoxelId = u16;

/// Sentinel id meaning "empty/air". The registry never defines it.
pub const NULL_VOXEL: VoxelId = 0;

/// Geometric shape class a voxel meshes as.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum VoxelShape {
    #[default]
    Cube,
    Cross,
}

/// One textured face slot of a voxel definition.
///
/// Cube voxels use the six cube slots; cross voxels use the two diagonals.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VoxelFace {
    CubeNorth = 0,
    CubeSouth = 1,
    CubeEast = 2,
    CubeWest = 3,
    CubeTop = 4,
    CubeBottom = 5,
    CrossNesw = 6,
    CrossNwse = 7,
}

pub const FACE_COUNT: usize = 8;

impl VoxelFace {
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Packed 4-bit facing value carried by every emitted quad.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VoxelFacing {
    North = 0,
    South = 1,
    East = 2,
    West = 3,
    Up = 4,
    Down = 5,
    Nesw = 6,
    Nwse = 7,
}

impl VoxelFacing {
    /// Facing for a face slot, honoring the shape (cross faces map to the
    /// diagonal facings regardless of which cube slot asked).
    pub fn from_face(face: VoxelFace, shape: VoxelShape) -> VoxelFacing {
        if shape == VoxelShape::Cross {
            return match face {
                VoxelFace::CrossNesw => VoxelFacing::Nesw,
                VoxelFace::CrossNwse => VoxelFacing::Nwse,
                _ => VoxelFacing::North,
            };
        }
        match face {
            VoxelFace::CubeNorth => VoxelFacing::North,
            VoxelFace::CubeSouth => VoxelFacing::South,
            VoxelFace::CubeEast => VoxelFacing::East,
            VoxelFace::CubeWest => VoxelFacing::West,
            VoxelFace::CubeTop => VoxelFacing::Up,
            VoxelFace::CubeBottom => VoxelFacing::Down,
            _ => VoxelFacing::North,
        }
    }
}

/// Per-face texture entry. `paths` lists variant frames; the atlas assigns
/// `offset`/`plane` once at load time and they stay fixed while any mesh
/// build is outstanding.
#[derive(Clone, Debug, Default)]
pub struct VoxelTexture {
    pub paths: Vec<String>,
    pub offset: u16,
    pub plane: u8,
}

impl VoxelTexture {
    #[inline]
    pub fn variant_count(&self) -> usize {
        self.paths.len()
    }
}

/// Static per-type definition, read-only during meshing and generation.
#[derive(Clone, Debug)]
pub struct VoxelInfo {
    pub id: VoxelId,
    pub name: String,
    pub shape: VoxelShape,
    /// Semi-transparent voxels render in a separate blending pass and must
    /// expose faces against opaque neighbors.
    pub blending: bool,
    pub animated: bool,
    pub textures: [VoxelTexture; FACE_COUNT],
}

impl VoxelInfo {
    #[inline]
    pub fn texture(&self, face: VoxelFace) -> &VoxelTexture {
        &self.textures[face.index()]
    }
}
