use std::collections::HashMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use karst_world::CHUNK_AREA;

/// Heightmap sentinel: no solid voxel recorded for the column cell yet
/// (or the recorded surface was carved away).
pub const HEIGHT_UNSET: i64 = i64::MIN;

/// Cached per-column state shared by every chunk in one (x, z) column.
///
/// `entropy` is drawn from a column-seeded stream, so the values do not
/// depend on which column gets touched first. `heightmap` holds the topmost
/// solid y seen by the terrain pass and is a cache, not ground truth: see
/// the carver notes in DESIGN.md.
#[derive(Clone, Debug)]
pub struct ColumnMetadata {
    pub entropy: Box<[u64; CHUNK_AREA]>,
    pub heightmap: Box<[i64; CHUNK_AREA]>,
}

impl ColumnMetadata {
    fn seeded(world_seed: u64, cx: i64, cz: i64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(column_seed(world_seed, cx, cz));
        let mut entropy = Box::new([0u64; CHUNK_AREA]);
        for slot in entropy.iter_mut() {
            *slot = rng.r#gen();
        }
        Self {
            entropy,
            heightmap: Box::new([HEIGHT_UNSET; CHUNK_AREA]),
        }
    }
}

/// Lazily-populated column cache; cleared wholesale on reseed.
#[derive(Default, Debug)]
pub struct MetadataCache {
    columns: HashMap<(i64, i64), ColumnMetadata>,
}

impl MetadataCache {
    pub fn column(&mut self, world_seed: u64, cx: i64, cz: i64) -> &mut ColumnMetadata {
        self.columns
            .entry((cx, cz))
            .or_insert_with(|| ColumnMetadata::seeded(world_seed, cx, cz))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn clear(&mut self) {
        self.columns.clear();
    }
}

/// Fold the column coordinates into the world seed (splitmix64 finalizer),
/// keeping neighboring columns decorrelated.
fn column_seed(world_seed: u64, cx: i64, cz: i64) -> u64 {
    let mut s = world_seed
        ^ (cx as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (cz as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F);
    s ^= s >> 30;
    s = s.wrapping_mul(0xBF58_476D_1CE4_E5B9);
    s ^= s >> 27;
    s = s.wrapping_mul(0x94D0_49BB_1331_11EB);
    s ^ (s >> 31)
}
