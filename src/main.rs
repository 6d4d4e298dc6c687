use std::error::Error;
use std::sync::Arc;

use clap::Parser;
use log::info;

use karst::{MesherConfig, MesherRig, QuadUpload, World};
use karst_chunk::{EntityId, VoxelStorage};
use karst_mesh::ChunkQuad;
use karst_voxel::{VoxelAtlas, VoxelRegistry};
use karst_world::ChunkCoord;
use karst_worldgen::{OverworldConfig, OverworldGenerator, TerrainPalette};

/// Headless world-meshing demo: generate a disc of chunks, commit them,
/// and run the mesher to quiescence.
#[derive(Parser, Debug)]
#[command(name = "karst")]
struct Args {
    #[arg(long, default_value_t = 1337)]
    seed: u64,
    /// Horizontal chunk radius around the origin.
    #[arg(long, default_value_t = 2)]
    radius: i64,
    /// Chunk rows to generate, from the bottommost configured row up.
    #[arg(long, default_value_t = 5)]
    rows: i64,
    /// Frames of mesher upkeep to run.
    #[arg(long, default_value_t = 256)]
    frames: usize,
    #[arg(long, default_value = "assets/voxels.toml")]
    voxels: String,
    #[arg(long, default_value_t = 2)]
    workers: usize,
}

/// Stand-in renderer device: mints sequential handles, tracks live count.
#[derive(Default)]
struct HeadlessUpload {
    next: u64,
    live: usize,
    uploads: usize,
}

impl QuadUpload for HeadlessUpload {
    fn upload(&mut self, existing: Option<u64>, _quads: &[ChunkQuad]) -> u64 {
        self.uploads += 1;
        match existing {
            Some(handle) => handle,
            None => {
                self.next += 1;
                self.live += 1;
                self.next
            }
        }
    }

    fn release(&mut self, _handle: u64) {
        self.live -= 1;
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    let mut registry = VoxelRegistry::from_path(&args.voxels)?;
    let atlas = VoxelAtlas::build(&mut registry)?;
    let palette = TerrainPalette::from_registry(&registry)?;
    let registry = Arc::new(registry);

    let gen_cfg = OverworldConfig::default();
    let bottom = gen_cfg.bottommost_chunk;
    let mut generator = OverworldGenerator::new(gen_cfg, palette);
    generator.reseed(args.seed);

    let mut world = World::new();
    let mut rig = MesherRig::new(
        MesherConfig {
            workers: args.workers,
            ..MesherConfig::default()
        },
        registry.clone(),
        atlas.plane_count(),
    );

    let mut next_entity = 1u32;
    for cx in -args.radius..=args.radius {
        for cz in -args.radius..=args.radius {
            for cy in bottom..bottom + args.rows {
                let coord = ChunkCoord::new(cx, cy, cz);
                let mut voxels = VoxelStorage::new();
                if !generator.generate(coord, &mut voxels) {
                    continue;
                }
                let event = world.commit_chunk(coord, voxels, EntityId(next_entity));
                next_entity += 1;
                rig.apply_world_event(&world, &event);
            }
        }
    }
    info!("world: committed {} chunks", world.len());

    let mut device = HeadlessUpload::default();
    let mut updated = 0usize;
    let mut removed = 0usize;
    for frame in 0..args.frames {
        let stats = rig.update(&world, &mut device);
        for event in rig.drain_events() {
            match event {
                karst::MeshEvent::Updated { .. } => updated += 1,
                karst::MeshEvent::Removed { .. } => removed += 1,
            }
        }
        if stats.finalized == 0 && stats.enqueued == 0 && rig.idle() {
            info!("mesher: quiesced after {frame} frames");
            break;
        }
        std::thread::sleep(std::time::Duration::from_millis(1));
    }

    let quads: usize = world
        .coords()
        .filter_map(|c| rig.mesh(c))
        .map(|m| m.quad_count())
        .sum();
    info!(
        "mesher: {} meshes, {} quads, {} uploads ({} updated, {} removed events)",
        rig.mesh_count(),
        quads,
        device.uploads,
        updated,
        removed
    );

    rig.shutdown(&mut device);
    assert_eq!(device.live, 0, "buffers leaked across shutdown");
    Ok(())
}
