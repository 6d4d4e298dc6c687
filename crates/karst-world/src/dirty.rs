use crate::coord::{CHUNK_SIZE, ChunkCoord, VoxelCoord};

/// Chunks whose geometry is stale after a whole-chunk event (creation or
/// bulk voxel replacement): the chunk itself plus all six face neighbors.
#[inline]
pub fn affected_by_chunk(cpos: ChunkCoord) -> [ChunkCoord; 7] {
    let n = cpos.face_neighbors();
    [cpos, n[0], n[1], n[2], n[3], n[4], n[5]]
}

/// Chunks whose geometry is stale after a single-voxel change: the owning
/// chunk, plus the neighbor across each face the voxel sits on. An interior
/// edit yields one coordinate; an edge or corner voxel up to four.
pub fn affected_by_voxel(vpos: VoxelCoord) -> Vec<ChunkCoord> {
    let cpos = vpos.to_chunk();
    let lpos = vpos.to_local();
    let mut out = Vec::with_capacity(4);
    out.push(cpos);
    for (axis, l) in [(0, lpos.x), (1, lpos.y), (2, lpos.z)] {
        let step: i64 = if l == 0 {
            -1
        } else if l == CHUNK_SIZE as i32 - 1 {
            1
        } else {
            continue;
        };
        out.push(match axis {
            0 => cpos.offset(step, 0, 0),
            1 => cpos.offset(0, step, 0),
            _ => cpos.offset(0, 0, step),
        });
    }
    out
}
