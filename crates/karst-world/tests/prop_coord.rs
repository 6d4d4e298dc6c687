use karst_world::{CHUNK_SIZE, ChunkCoord, LocalCoord, VoxelCoord};
use proptest::prelude::*;

// Keep one chunk-size of headroom so `to_voxel` cannot overflow at the
// extremes of the i64 range.
fn arb_axis() -> impl Strategy<Value = i64> {
    (i64::MIN / 32)..(i64::MAX / 32)
}

proptest! {
    #[test]
    fn chunk_local_roundtrip(x in arb_axis(), y in arb_axis(), z in arb_axis()) {
        let v = VoxelCoord::new(x, y, z);
        let c = v.to_chunk();
        let l = v.to_local();
        prop_assert!(l.x >= 0 && (l.x as usize) < CHUNK_SIZE);
        prop_assert!(l.y >= 0 && (l.y as usize) < CHUNK_SIZE);
        prop_assert!(l.z >= 0 && (l.z as usize) < CHUNK_SIZE);
        prop_assert_eq!(c.to_voxel(l), v);
    }

    #[test]
    fn local_index_roundtrip(x in 0i32..16, y in 0i32..16, z in 0i32..16) {
        let l = LocalCoord::new(x, y, z);
        prop_assert_eq!(LocalCoord::from_index(l.to_index()), l);
    }

    #[test]
    fn to_voxel_stays_in_chunk(cx in -1_000_000i64..1_000_000, cy in -1_000_000i64..1_000_000,
                               cz in -1_000_000i64..1_000_000,
                               x in 0i32..16, y in 0i32..16, z in 0i32..16) {
        let c = ChunkCoord::new(cx, cy, cz);
        let v = c.to_voxel(LocalCoord::new(x, y, z));
        prop_assert_eq!(v.to_chunk(), c);
    }
}
