//! Off-thread chunk mesh building: face culling and packed quad emission.
#![forbid(unsafe_code)]

pub mod quad;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use karst_chunk::VoxelStorage;
use karst_geom::{Vec2, Vec3};
use karst_voxel::{
    NULL_VOXEL, VoxelFace, VoxelFacing, VoxelId, VoxelInfo, VoxelRegistry, VoxelShape,
};
use karst_world::{CHUNK_VOLUME, ChunkCoord, LocalCoord};

pub use quad::ChunkQuad;

/// Cooperative cancellation flag shared between the scheduler and one build.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Neighbor cache slots: the chunk itself plus its six face neighbors.
pub const SNAPSHOT_SLOTS: usize = 7;

const SLOT_SELF: usize = 0;
const SLOT_EAST: usize = 1;
const SLOT_WEST: usize = 2;
const SLOT_UP: usize = 3;
const SLOT_DOWN: usize = 4;
const SLOT_SOUTH: usize = 5;
const SLOT_NORTH: usize = 6;

/// Immutable voxel snapshot a build task owns outright. Captured on the
/// main thread at enqueue time; the worker never re-reads live world state.
/// Unloaded neighbors stay all-null, so faces against them read as open.
pub struct MeshSnapshot {
    coord: ChunkCoord,
    cache: [VoxelStorage; SNAPSHOT_SLOTS],
}

impl MeshSnapshot {
    pub fn new(coord: ChunkCoord) -> Self {
        Self {
            coord,
            cache: Default::default(),
        }
    }

    #[inline]
    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// Store a chunk's grid into the slot its position selects. Grids that
    /// are neither the pivot nor a face neighbor land in the nearest slot;
    /// callers only ever pass the pivot and its six face neighbors.
    pub fn insert(&mut self, cpos: ChunkCoord, voxels: VoxelStorage) {
        self.cache[slot_for(self.coord, cpos)] = voxels;
    }

    #[inline]
    fn get(&self, cpos: ChunkCoord, lpos: LocalCoord) -> VoxelId {
        self.cache[slot_for(self.coord, cpos)].get(lpos)
    }
}

/// Resolve which cache slot holds the chunk at `cpos` relative to `pivot`.
/// The per-axis delta is clamped to {-1, 0, 1} and the first non-zero axis
/// wins in x, y, z order; a direct face neighbor differs on exactly one.
fn slot_for(pivot: ChunkCoord, cpos: ChunkCoord) -> usize {
    if pivot == cpos {
        return SLOT_SELF;
    }
    let dx = (cpos.x - pivot.x).clamp(-1, 1);
    let dy = (cpos.y - pivot.y).clamp(-1, 1);
    let dz = (cpos.z - pivot.z).clamp(-1, 1);
    if dx != 0 {
        return if dx > 0 { SLOT_EAST } else { SLOT_WEST };
    }
    if dy != 0 {
        return if dy > 0 { SLOT_UP } else { SLOT_DOWN };
    }
    if dz > 0 { SLOT_SOUTH } else { SLOT_NORTH }
}

/// Quad lists produced by one build, bucketed by atlas plane and split by
/// blending class for separate draw ordering.
#[derive(Clone, Debug, Default)]
pub struct ChunkMeshCpu {
    pub opaque: Vec<Vec<ChunkQuad>>,
    pub blending: Vec<Vec<ChunkQuad>>,
}

impl ChunkMeshCpu {
    fn with_planes(plane_count: usize) -> Self {
        Self {
            opaque: vec![Vec::new(); plane_count],
            blending: vec![Vec::new(); plane_count],
        }
    }

    pub fn plane_count(&self) -> usize {
        self.opaque.len()
    }

    pub fn quad_count(&self) -> usize {
        let nb: usize = self.opaque.iter().map(Vec::len).sum();
        let b: usize = self.blending.iter().map(Vec::len).sum();
        nb + b
    }

    pub fn is_empty(&self) -> bool {
        self.quad_count() == 0
    }
}

/// Build the quad lists for a snapshot. Returns `None` if the token fired
/// mid-build; partial output is dropped, never applied.
pub fn build_chunk_mesh(
    snapshot: &MeshSnapshot,
    reg: &VoxelRegistry,
    plane_count: usize,
    cancel: &CancelToken,
) -> Option<ChunkMeshCpu> {
    let mut out = ChunkMeshCpu::with_planes(plane_count);
    let voxels = &snapshot.cache[SLOT_SELF];

    for index in 0..CHUNK_VOLUME {
        if cancel.is_cancelled() {
            return None;
        }

        let voxel = voxels.get_index(index);
        let Some(info) = reg.find(voxel) else {
            // NULL_VOXEL, or an id the registry has never heard of.
            continue;
        };
        let lpos = LocalCoord::from_index(index);

        match info.shape {
            VoxelShape::Cube => emit_cube(&mut out, snapshot, reg, voxel, info, lpos),
            VoxelShape::Cross => emit_cross(&mut out, snapshot, reg, voxel, info, lpos),
        }
    }

    Some(out)
}

/// Face culling against the cached neighborhood: open space and unloaded
/// chunks read as visible, identical voxel types never expose a mutual
/// face, and a blending-class mismatch exposes the face from both sides.
fn face_visible(
    snapshot: &MeshSnapshot,
    reg: &VoxelRegistry,
    voxel: VoxelId,
    info: &VoxelInfo,
    lpos: LocalCoord,
) -> bool {
    let vpos = snapshot.coord.to_voxel(lpos);
    let neighbor = snapshot.get(vpos.to_chunk(), vpos.to_local());

    if neighbor == NULL_VOXEL {
        return true;
    }
    if neighbor == voxel {
        return false;
    }
    if let Some(ninfo) = reg.find(neighbor) {
        return ninfo.blending != info.blending;
    }
    false
}

struct FaceSet {
    north: bool,
    south: bool,
    east: bool,
    west: bool,
    up: bool,
    down: bool,
}

impl FaceSet {
    fn any(&self) -> bool {
        self.north || self.south || self.east || self.west || self.up || self.down
    }
}

fn visible_faces(
    snapshot: &MeshSnapshot,
    reg: &VoxelRegistry,
    voxel: VoxelId,
    info: &VoxelInfo,
    lpos: LocalCoord,
) -> FaceSet {
    FaceSet {
        north: face_visible(snapshot, reg, voxel, info, lpos.dir_north()),
        south: face_visible(snapshot, reg, voxel, info, lpos.dir_south()),
        east: face_visible(snapshot, reg, voxel, info, lpos.dir_east()),
        west: face_visible(snapshot, reg, voxel, info, lpos.dir_west()),
        up: face_visible(snapshot, reg, voxel, info, lpos.dir_up()),
        down: face_visible(snapshot, reg, voxel, info, lpos.dir_down()),
    }
}

fn emit_cube(
    out: &mut ChunkMeshCpu,
    snapshot: &MeshSnapshot,
    reg: &VoxelRegistry,
    voxel: VoxelId,
    info: &VoxelInfo,
    lpos: LocalCoord,
) {
    let vis = visible_faces(snapshot, reg, voxel, info, lpos);
    if !vis.any() {
        return;
    }
    let entropy = position_entropy(snapshot.coord.to_voxel(lpos));
    let faces = [
        (vis.north, VoxelFace::CubeNorth),
        (vis.south, VoxelFace::CubeSouth),
        (vis.east, VoxelFace::CubeEast),
        (vis.west, VoxelFace::CubeWest),
        (vis.up, VoxelFace::CubeTop),
        (vis.down, VoxelFace::CubeBottom),
    ];
    for (visible, face) in faces {
        if visible {
            push_quad(out, info, lpos, face, entropy);
        }
    }
}

/// Cross voxels render as two diagonal quads; they never occlude anything,
/// so they draw whenever at least one side is open.
fn emit_cross(
    out: &mut ChunkMeshCpu,
    snapshot: &MeshSnapshot,
    reg: &VoxelRegistry,
    voxel: VoxelId,
    info: &VoxelInfo,
    lpos: LocalCoord,
) {
    let vis = visible_faces(snapshot, reg, voxel, info, lpos);
    if !vis.any() {
        return;
    }
    let entropy = position_entropy(snapshot.coord.to_voxel(lpos));
    push_quad(out, info, lpos, VoxelFace::CrossNesw, entropy);
    push_quad(out, info, lpos, VoxelFace::CrossNwse, entropy);
}

fn push_quad(
    out: &mut ChunkMeshCpu,
    info: &VoxelInfo,
    lpos: LocalCoord,
    face: VoxelFace,
    entropy: u64,
) {
    let tex = info.texture(face);
    let facing = VoxelFacing::from_face(face, info.shape);
    let pos = lpos.to_vec3();
    let size = Vec2::ONE;

    let quad = if info.animated {
        ChunkQuad::pack(pos, size, facing, tex.offset, tex.variant_count())
    } else {
        // Multi-variant voxels pick a variant from the position hash, so
        // identical types vary visually yet remesh identically.
        let variant = match tex.variant_count() {
            0 => 0,
            n => (entropy % n as u64) as u16,
        };
        ChunkQuad::pack(pos, size, facing, tex.offset + variant, 0)
    };

    let plane = tex.plane as usize;
    let bucket = if info.blending {
        &mut out.blending[plane]
    } else {
        &mut out.opaque[plane]
    };
    bucket.push(quad);
}

/// Deterministic per-position entropy (splitmix64 over the folded axes).
/// Stable across rebuilds; never sourced from a live RNG.
fn position_entropy(vpos: karst_world::VoxelCoord) -> u64 {
    let mut s = (vpos.x as u64)
        .wrapping_mul(0x9E37_79B9_7F4A_7C15)
        .wrapping_add((vpos.y as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F))
        .wrapping_add((vpos.z as u64).wrapping_mul(0x2545_F491_4F6C_DD1D));
    s ^= s >> 30;
    s = s.wrapping_mul(0xBF58_476D_1CE4_E5B9);
    s ^= s >> 27;
    s = s.wrapping_mul(0x94D0_49BB_1331_11EB);
    s ^ (s >> 31)
}
