use std::error::Error;

use fastnoise_lite::{FastNoiseLite, FractalType, NoiseType};
use log::debug;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use karst_chunk::VoxelStorage;
use karst_voxel::{NULL_VOXEL, VoxelId, VoxelRegistry};
use karst_world::{CHUNK_SIZE, CHUNK_VOLUME, ChunkCoord, LocalCoord, VoxelCoord};

use crate::config::OverworldConfig;
use crate::metadata::{HEIGHT_UNSET, MetadataCache};

const FEATURES_PER_COLUMN: usize = 5;
const SOIL_PROBE_DEPTH: i32 = 5;
const CARVE_THRESHOLD: f32 = 1.0 / 1024.0;

/// Voxel types the generator places, resolved once against the registry.
#[derive(Clone, Copy, Debug)]
pub struct TerrainPalette {
    pub stone: VoxelId,
    pub topsoil: VoxelId,
    pub subsoil: VoxelId,
    pub marker: VoxelId,
}

impl TerrainPalette {
    pub fn from_registry(reg: &VoxelRegistry) -> Result<Self, Box<dyn Error>> {
        let lookup = |name: &str| -> Result<VoxelId, Box<dyn Error>> {
            reg.id_by_name(name)
                .ok_or_else(|| format!("palette voxel {name:?} not registered").into())
        };
        Ok(Self {
            stone: lookup("stone")?,
            topsoil: lookup("grass")?,
            subsoil: lookup("dirt")?,
            marker: lookup("cobblestone")?,
        })
    }
}

/// Deterministic chunk-coordinate → voxel-grid function.
///
/// `reseed` must run before the first `generate` of a world load; it derives
/// the three noise fields from the world seed and drops all column metadata.
pub struct OverworldGenerator {
    cfg: OverworldConfig,
    palette: TerrainPalette,
    seed: u64,
    terrain: FastNoiseLite,
    caves_a: FastNoiseLite,
    caves_b: FastNoiseLite,
    metadata: MetadataCache,
}

impl OverworldGenerator {
    pub fn new(cfg: OverworldConfig, palette: TerrainPalette) -> Self {
        let mut this = Self {
            cfg,
            palette,
            seed: 0,
            terrain: FastNoiseLite::new(),
            caves_a: FastNoiseLite::new(),
            caves_b: FastNoiseLite::new(),
            metadata: MetadataCache::default(),
        };
        this.reseed(0);
        this
    }

    /// Reinitialize for a (re)loaded world. Noise sub-seeds come from a
    /// seeded stream; stale column metadata from the previous load is
    /// dropped so it cannot leak entropy across worlds.
    pub fn reseed(&mut self, seed: u64) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        self.seed = seed;

        let mut terrain = FastNoiseLite::with_seed(rng.r#gen::<i32>());
        terrain.set_noise_type(Some(NoiseType::OpenSimplex2S));
        terrain.set_fractal_type(Some(FractalType::FBm));
        terrain.set_fractal_octaves(Some(4));
        terrain.set_frequency(Some(0.005));
        self.terrain = terrain;

        let mut caves_a = FastNoiseLite::with_seed(rng.r#gen::<i32>());
        caves_a.set_noise_type(Some(NoiseType::Perlin));
        caves_a.set_frequency(Some(0.0075));
        self.caves_a = caves_a;

        let mut caves_b = FastNoiseLite::with_seed(rng.r#gen::<i32>());
        caves_b.set_noise_type(Some(NoiseType::Perlin));
        caves_b.set_frequency(Some(0.0075));
        self.caves_b = caves_b;

        let dropped = self.metadata.len();
        self.metadata.clear();
        debug!("overworld: reseeded ({dropped} column entries dropped)");
    }

    /// Populate `voxels` for the chunk at `cpos`. Returns `false` without
    /// touching the grid when the row is outside the generated envelope.
    pub fn generate(&mut self, cpos: ChunkCoord, voxels: &mut VoxelStorage) -> bool {
        if cpos.y < self.cfg.bottommost_chunk
            || cpos.y > CHUNK_SIZE as i64 * self.cfg.terrain_variation
        {
            return false;
        }

        self.terrain_pass(cpos, voxels);
        if self.cfg.enable_surface {
            self.surface_pass(cpos, voxels);
        }
        if self.cfg.enable_carvers {
            self.carver_pass(cpos, voxels);
        }
        if self.cfg.enable_features {
            self.feature_pass(cpos, voxels);
        }
        true
    }

    /// Terrain density: amplitude-scaled 3D noise with a linear height bias.
    /// Also sampled by the surface pass when its probe crosses the chunk
    /// top, since a chunk cannot see its generated neighbors.
    fn height_noise(&self, vpos: VoxelCoord) -> f32 {
        let n = self
            .terrain
            .get_noise_3d(vpos.x as f32, vpos.y as f32, vpos.z as f32);
        self.cfg.terrain_variation as f32 * n - vpos.y as f32
    }

    /// Outside the variation band the density test is decided by the bias
    /// alone: always solid below, never solid above. Lets the terrain and
    /// surface passes skip noise sampling there.
    #[inline]
    fn outside_band(&self, y: i64) -> bool {
        y.abs() > self.cfg.terrain_variation
    }

    fn terrain_pass(&mut self, cpos: ChunkCoord, voxels: &mut VoxelStorage) {
        let variation = self.cfg.terrain_variation;
        let stone = self.palette.stone;
        let metadata = self.metadata.column(self.seed, cpos.x, cpos.z);
        for index in 0..CHUNK_VOLUME {
            let lpos = LocalCoord::from_index(index);
            let vpos = cpos.to_voxel(lpos);
            let hdx = (lpos.x + lpos.z * CHUNK_SIZE as i32) as usize;

            if vpos.y.abs() > variation {
                if vpos.y < 0 {
                    if vpos.y > metadata.heightmap[hdx] {
                        metadata.heightmap[hdx] = vpos.y;
                    }
                    voxels.set_index(index, stone);
                }
                continue;
            }

            let n = self
                .terrain
                .get_noise_3d(vpos.x as f32, vpos.y as f32, vpos.z as f32);
            if variation as f32 * n - vpos.y as f32 > 0.0 {
                if vpos.y > metadata.heightmap[hdx] {
                    metadata.heightmap[hdx] = vpos.y;
                }
                voxels.set_index(index, stone);
            }
        }
    }

    fn surface_pass(&mut self, cpos: ChunkCoord, voxels: &mut VoxelStorage) {
        for index in 0..CHUNK_VOLUME {
            let lpos = LocalCoord::from_index(index);
            let vpos = cpos.to_voxel(lpos);

            // No surface exists outside the variation band.
            if self.outside_band(vpos.y) {
                continue;
            }
            if voxels.get_index(index) == NULL_VOXEL {
                continue;
            }

            let mut depth = 0usize;
            for dy in 0..SOIL_PROBE_DEPTH {
                let dlpos = lpos.offset(0, dy + 1, 0);
                if dlpos.y >= CHUNK_SIZE as i32 {
                    // Probe crosses into the chunk above: that grid is not
                    // ours to read, so re-derive solidity from the noise.
                    let dvpos = cpos.to_voxel(dlpos);
                    if self.height_noise(dvpos) <= 0.0 {
                        break;
                    }
                    depth += 1;
                } else {
                    if voxels.get(dlpos) == NULL_VOXEL {
                        break;
                    }
                    depth += 1;
                }
            }

            if depth == 0 {
                voxels.set_index(index, self.palette.topsoil);
            } else if depth < SOIL_PROBE_DEPTH as usize {
                voxels.set_index(index, self.palette.subsoil);
            }
        }
    }

    fn carver_pass(&mut self, cpos: ChunkCoord, voxels: &mut VoxelStorage) {
        let metadata = self.metadata.column(self.seed, cpos.x, cpos.z);
        for index in 0..CHUNK_VOLUME {
            let lpos = LocalCoord::from_index(index);
            let vpos = cpos.to_voxel(lpos);
            let hdx = (lpos.x + lpos.z * CHUNK_SIZE as i32) as usize;

            // No solid terrain above the band to carve from.
            if vpos.y > self.cfg.terrain_variation + 1 {
                continue;
            }

            let x = vpos.x as f32;
            let y = 1.5 * vpos.y as f32;
            let z = vpos.z as f32;
            let na = self.caves_a.get_noise_3d(x, y, z);
            let nb = self.caves_b.get_noise_3d(x, y, z);

            if na * na + nb * nb <= CARVE_THRESHOLD {
                if vpos.y == metadata.heightmap[hdx] {
                    // The recorded surface was carved away; the next pass
                    // that relies on it sees "unset" rather than a lie.
                    metadata.heightmap[hdx] = HEIGHT_UNSET;
                }
                voxels.set_index(index, NULL_VOXEL);
            }
        }
    }

    fn feature_pass(&mut self, cpos: ChunkCoord, voxels: &mut VoxelStorage) {
        let metadata = self.metadata.column(self.seed, cpos.x, cpos.z);

        let mut fx = [0i32; FEATURES_PER_COLUMN];
        let mut fz = [0i32; FEATURES_PER_COLUMN];
        let mut heights = [0i64; FEATURES_PER_COLUMN];
        for tc in 0..FEATURES_PER_COLUMN {
            fx[tc] = (metadata.entropy[tc * 3] % CHUNK_SIZE as u64) as i32;
            fz[tc] = (metadata.entropy[tc * 3 + 1] % CHUNK_SIZE as u64) as i32;
            heights[tc] = 3 + (metadata.entropy[tc * 3 + 2] % 4) as i64;
        }

        for index in 0..CHUNK_VOLUME {
            let lpos = LocalCoord::from_index(index);
            let vpos = cpos.to_voxel(lpos);
            let hdx = (lpos.x + lpos.z * CHUNK_SIZE as i32) as usize;

            for tc in 0..FEATURES_PER_COLUMN {
                if lpos.x == fx[tc] && lpos.z == fz[tc] {
                    let surface = metadata.heightmap[hdx];
                    if surface != HEIGHT_UNSET {
                        let above = vpos.y - surface;
                        if (1..=heights[tc]).contains(&above) {
                            voxels.set_index(index, self.palette.marker);
                        }
                    }
                    break;
                }
            }
        }
    }
}
