use std::sync::Arc;
use std::time::{Duration, Instant};

use karst::{MeshEvent, MesherConfig, MesherRig, QuadUpload, World};
use karst_chunk::{EntityId, VoxelStorage};
use karst_mesh::ChunkQuad;
use karst_voxel::{VoxelAtlas, VoxelRegistry};
use karst_world::{ChunkCoord, LocalCoord};

const DEFS: &str = r#"
    [[voxels]]
    name = "stone"

    [voxels.textures]
    all = ["stone.png"]

    [[voxels]]
    name = "water"
    blending = true
    animated = true

    [voxels.textures]
    all = ["water_0.png", "water_1.png"]
"#;

/// Counts uploads/releases and verifies handles never double-free.
#[derive(Default)]
struct CountingDevice {
    next: u64,
    live: Vec<u64>,
    uploads: usize,
    releases: usize,
}

impl QuadUpload for CountingDevice {
    fn upload(&mut self, existing: Option<u64>, quads: &[ChunkQuad]) -> u64 {
        assert!(!quads.is_empty(), "empty upload should have been a release");
        self.uploads += 1;
        match existing {
            Some(handle) => {
                assert!(self.live.contains(&handle), "upload over a dead handle");
                handle
            }
            None => {
                self.next += 1;
                self.live.push(self.next);
                self.next
            }
        }
    }

    fn release(&mut self, handle: u64) {
        let pos = self
            .live
            .iter()
            .position(|&h| h == handle)
            .expect("release of an unknown handle");
        self.live.swap_remove(pos);
        self.releases += 1;
    }
}

struct Rig {
    world: World,
    rig: MesherRig,
    device: CountingDevice,
    registry: Arc<VoxelRegistry>,
    next_entity: u32,
}

impl Rig {
    fn new() -> Self {
        let mut registry = VoxelRegistry::from_toml_str(DEFS).unwrap();
        let atlas = VoxelAtlas::build(&mut registry).unwrap();
        let registry = Arc::new(registry);
        let rig = MesherRig::new(MesherConfig::default(), registry.clone(), atlas.plane_count());
        Self {
            world: World::new(),
            rig,
            device: CountingDevice::default(),
            registry,
            next_entity: 1,
        }
    }

    fn commit(&mut self, coord: ChunkCoord, voxels: VoxelStorage) {
        let entity = EntityId(self.next_entity);
        self.next_entity += 1;
        let event = self.world.commit_chunk(coord, voxels, entity);
        self.rig.apply_world_event(&self.world, &event);
    }

    fn set_voxel(&mut self, coord: karst_world::VoxelCoord, id: u16) {
        let event = self.world.set_voxel(coord, id).expect("chunk loaded");
        self.rig.apply_world_event(&self.world, &event);
    }

    /// Pump update until the rig settles; panics if it never does.
    fn run_to_idle(&mut self) -> Vec<MeshEvent> {
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut events = Vec::new();
        loop {
            self.rig.update(&self.world, &mut self.device);
            events.extend(self.rig.drain_events());
            if self.rig.idle() {
                return events;
            }
            assert!(Instant::now() < deadline, "mesher never settled");
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    fn stone(&self) -> u16 {
        self.registry.id_by_name("stone").unwrap()
    }
}

fn solo_voxel_chunk(stone: u16) -> VoxelStorage {
    let mut voxels = VoxelStorage::new();
    voxels.set(LocalCoord::new(8, 8, 8), stone);
    voxels
}

#[test]
fn all_air_chunk_yields_no_mesh() {
    let mut t = Rig::new();
    t.commit(ChunkCoord::new(0, 0, 0), VoxelStorage::new());
    let events = t.run_to_idle();
    assert_eq!(t.rig.mesh_count(), 0);
    assert!(events.is_empty());
    assert_eq!(t.device.uploads, 0);
}

#[test]
fn isolated_voxel_meshes_six_quads() {
    let mut t = Rig::new();
    let stone = t.stone();
    let coord = ChunkCoord::new(3, -1, 2);
    t.commit(coord, solo_voxel_chunk(stone));
    let events = t.run_to_idle();

    let mesh = t.rig.mesh(coord).expect("mesh uploaded");
    assert_eq!(mesh.quad_count(), 6);
    assert!(
        events
            .iter()
            .any(|e| matches!(e, MeshEvent::Updated { coord: c, .. } if *c == coord))
    );
}

#[test]
fn dirty_while_in_flight_finalizes_exactly_once() {
    let mut t = Rig::new();
    let stone = t.stone();
    let coord = ChunkCoord::new(0, 0, 0);
    t.commit(coord, solo_voxel_chunk(stone));

    // First update puts a build in flight; re-flagging the chunk before the
    // drain must supersede that build rather than double-apply.
    t.rig.update(&t.world, &mut t.device);
    t.set_voxel(coord.to_voxel(LocalCoord::new(4, 4, 4)), stone);

    let events = t.run_to_idle();
    let updates = events
        .iter()
        .filter(|e| matches!(e, MeshEvent::Updated { coord: c, .. } if *c == coord))
        .count();
    assert_eq!(updates, 1);

    // The applied result reflects the second voxel: two isolated cubes.
    assert_eq!(t.rig.mesh(coord).unwrap().quad_count(), 12);
}

#[test]
fn voxel_edit_on_boundary_flags_the_neighbor() {
    let mut t = Rig::new();
    let stone = t.stone();
    let a = ChunkCoord::new(0, 0, 0);
    let b = ChunkCoord::new(1, 0, 0);
    t.commit(a, VoxelStorage::new());
    t.commit(b, VoxelStorage::new());
    t.run_to_idle();

    t.set_voxel(a.to_voxel(LocalCoord::new(15, 5, 5)), stone);
    assert!(t.rig.is_dirty(a));
    assert!(t.rig.is_dirty(b));
    // Interior edit keeps neighbors clean.
    t.run_to_idle();
    t.set_voxel(a.to_voxel(LocalCoord::new(7, 5, 5)), stone);
    assert!(t.rig.is_dirty(a));
    assert!(!t.rig.is_dirty(b));
}

#[test]
fn emptied_chunk_drops_its_mesh_and_buffers() {
    let mut t = Rig::new();
    let stone = t.stone();
    let coord = ChunkCoord::new(0, 0, 0);
    t.commit(coord, solo_voxel_chunk(stone));
    t.run_to_idle();
    assert_eq!(t.rig.mesh_count(), 1);

    // Bulk-replace with all air: the finalize must release the buffer and
    // remove the mesh outright.
    t.commit(coord, VoxelStorage::new());
    let events = t.run_to_idle();
    assert_eq!(t.rig.mesh_count(), 0);
    assert!(t.device.live.is_empty());
    assert!(
        events
            .iter()
            .any(|e| matches!(e, MeshEvent::Removed { coord: c } if *c == coord))
    );
}

#[test]
fn blending_quads_land_in_their_own_buffers() {
    let mut t = Rig::new();
    let stone = t.stone();
    let water = t.registry.id_by_name("water").unwrap();
    let coord = ChunkCoord::new(0, 0, 0);
    let mut voxels = VoxelStorage::new();
    voxels.set(LocalCoord::new(4, 4, 4), stone);
    voxels.set(LocalCoord::new(5, 4, 4), water);
    t.commit(coord, voxels);
    t.run_to_idle();

    let mesh = t.rig.mesh(coord).unwrap();
    let opaque: usize = mesh.opaque.iter().flatten().map(|b| b.quad_count).sum();
    let blending: usize = mesh.blending.iter().flatten().map(|b| b.quad_count).sum();
    assert_eq!(opaque, 6);
    assert_eq!(blending, 6);
}

#[test]
fn shutdown_releases_every_buffer() {
    let mut t = Rig::new();
    let stone = t.stone();
    for i in 0..4 {
        t.commit(ChunkCoord::new(i, 0, 0), solo_voxel_chunk(stone));
    }
    t.run_to_idle();
    assert!(t.device.uploads > 0);

    // Leave fresh work in flight so shutdown exercises the cancel path.
    t.set_voxel(ChunkCoord::new(0, 0, 0).to_voxel(LocalCoord::new(1, 1, 1)), stone);
    t.rig.update(&t.world, &mut t.device);

    let mut device = std::mem::take(&mut t.device);
    t.rig.shutdown(&mut device);
    assert!(device.live.is_empty());
    // Every handle ever minted came back.
    assert_eq!(device.next as usize, device.releases);
}
