use hashbrown::HashMap;

use karst_chunk::{Chunk, EntityId, VoxelStorage};
use karst_voxel::VoxelId;
use karst_world::{ChunkCoord, VoxelCoord};

/// World mutations the dirty-tracking path listens to. Each maps to one of
/// the authoritative packets the session layer commits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorldEvent {
    ChunkCreated { coord: ChunkCoord },
    ChunkUpdated { coord: ChunkCoord },
    VoxelChanged { coord: VoxelCoord },
}

/// Chunk-coordinate indexed world storage, owned by the main thread.
#[derive(Default)]
pub struct World {
    chunks: HashMap<ChunkCoord, Chunk>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn find(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    #[inline]
    pub fn find_mut(&mut self, coord: ChunkCoord) -> Option<&mut Chunk> {
        self.chunks.get_mut(&coord)
    }

    #[inline]
    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn coords(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.chunks.keys().copied()
    }

    /// Commit an authoritative voxel grid, creating the chunk on first
    /// contact or bulk-replacing its contents after.
    pub fn commit_chunk(
        &mut self,
        coord: ChunkCoord,
        voxels: VoxelStorage,
        entity: EntityId,
    ) -> WorldEvent {
        match self.chunks.entry(coord) {
            hashbrown::hash_map::Entry::Occupied(mut slot) => {
                let chunk = slot.get_mut();
                chunk.voxels = voxels;
                chunk.entity = entity;
                WorldEvent::ChunkUpdated { coord }
            }
            hashbrown::hash_map::Entry::Vacant(slot) => {
                slot.insert(Chunk::new(voxels, entity));
                WorldEvent::ChunkCreated { coord }
            }
        }
    }

    /// Apply a single authoritative voxel write. Returns `None` when the
    /// owning chunk is not loaded; the session layer decides whether that
    /// is a protocol fault.
    pub fn set_voxel(&mut self, coord: VoxelCoord, voxel: VoxelId) -> Option<WorldEvent> {
        let chunk = self.chunks.get_mut(&coord.to_chunk())?;
        chunk.voxels.set(coord.to_local(), voxel);
        Some(WorldEvent::VoxelChanged { coord })
    }

    pub fn remove_chunk(&mut self, coord: ChunkCoord) -> Option<Chunk> {
        self.chunks.remove(&coord)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use karst_world::LocalCoord;

    #[test]
    fn commit_reports_create_then_update() {
        let mut world = World::new();
        let coord = ChunkCoord::new(1, 0, -1);
        let created = world.commit_chunk(coord, VoxelStorage::new(), EntityId(1));
        assert_eq!(created, WorldEvent::ChunkCreated { coord });
        let updated = world.commit_chunk(coord, VoxelStorage::new(), EntityId(2));
        assert_eq!(updated, WorldEvent::ChunkUpdated { coord });
        assert_eq!(world.len(), 1);
        assert_eq!(world.find(coord).unwrap().entity, EntityId(2));
    }

    #[test]
    fn set_voxel_requires_a_loaded_chunk() {
        let mut world = World::new();
        let vpos = ChunkCoord::new(0, 0, 0).to_voxel(LocalCoord::new(2, 3, 4));
        assert_eq!(world.set_voxel(vpos, 5), None);

        world.commit_chunk(ChunkCoord::new(0, 0, 0), VoxelStorage::new(), EntityId(9));
        assert_eq!(
            world.set_voxel(vpos, 5),
            Some(WorldEvent::VoxelChanged { coord: vpos })
        );
        let chunk = world.find(ChunkCoord::new(0, 0, 0)).unwrap();
        assert_eq!(chunk.voxels.get(LocalCoord::new(2, 3, 4)), 5);
    }
}
