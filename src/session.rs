use karst_protocol::{ChunkVoxels, SetVoxel};

use crate::mesher::MesherRig;
use crate::world::World;

/// Commit an authoritative chunk snapshot and fan its dirty flags out.
pub fn apply_chunk_voxels(world: &mut World, rig: &mut MesherRig, packet: ChunkVoxels) {
    let event = world.commit_chunk(packet.chunk, packet.voxels, packet.entity);
    rig.apply_world_event(world, &event);
}

/// Apply an authoritative voxel write. Returns `false` when the owning
/// chunk is not loaded; whether that is a protocol fault is the session
/// layer's call, not ours.
#[must_use]
pub fn apply_set_voxel(world: &mut World, rig: &mut MesherRig, packet: &SetVoxel) -> bool {
    match world.set_voxel(packet.coord, packet.voxel) {
        Some(event) => {
            rig.apply_world_event(world, &event);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesher::MesherConfig;
    use karst_chunk::{EntityId, VoxelStorage};
    use karst_voxel::VoxelRegistry;
    use karst_world::{ChunkCoord, LocalCoord};
    use std::sync::Arc;

    fn rig() -> MesherRig {
        let reg = Arc::new(VoxelRegistry::new());
        MesherRig::new(MesherConfig::default(), reg, 1)
    }

    #[test]
    fn chunk_packet_commits_and_flags() {
        let mut world = World::new();
        let mut rig = rig();
        let coord = ChunkCoord::new(0, 0, 0);
        apply_chunk_voxels(
            &mut world,
            &mut rig,
            ChunkVoxels {
                entity: EntityId(4),
                chunk: coord,
                voxels: VoxelStorage::new(),
            },
        );
        assert!(world.contains(coord));
        assert!(rig.is_dirty(coord));
    }

    #[test]
    fn voxel_packet_without_chunk_reports_failure() {
        let mut world = World::new();
        let mut rig = rig();
        let packet = SetVoxel {
            coord: ChunkCoord::new(5, 5, 5).to_voxel(LocalCoord::new(0, 0, 0)),
            voxel: 1,
            flags: 0,
        };
        assert!(!apply_set_voxel(&mut world, &mut rig, &packet));
        assert!(!rig.is_dirty(ChunkCoord::new(5, 5, 5)));
    }
}
