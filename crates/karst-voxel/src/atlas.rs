use std::collections::HashMap;
use std::error::Error;

use crate::registry::VoxelRegistry;

/// Offsets are packed into 11 bits in the quad record.
pub const PLANE_CAPACITY: u16 = 2048;

/// Texture-atlas slot assignment. Each distinct variant list gets a run of
/// consecutive slots on one plane; faces sharing a variant list share slots.
///
/// Built once at asset-load time; immutable while any mesh build is
/// outstanding.
#[derive(Debug, Default)]
pub struct VoxelAtlas {
    planes: u8,
    cursor: u16,
    capacity: u16,
}

impl VoxelAtlas {
    /// Assign `offset`/`plane` to every non-empty texture in the registry.
    pub fn build(reg: &mut VoxelRegistry) -> Result<Self, Box<dyn Error>> {
        Self::build_with_capacity(reg, PLANE_CAPACITY)
    }

    pub fn build_with_capacity(
        reg: &mut VoxelRegistry,
        capacity: u16,
    ) -> Result<Self, Box<dyn Error>> {
        let mut atlas = VoxelAtlas {
            planes: 0,
            cursor: 0,
            capacity: capacity.min(PLANE_CAPACITY),
        };
        let mut assigned: HashMap<Vec<String>, (u16, u8)> = HashMap::new();
        for info in reg.iter_mut() {
            for tex in info.textures.iter_mut() {
                if tex.paths.is_empty() {
                    continue;
                }
                let (offset, plane) = match assigned.get(&tex.paths) {
                    Some(slot) => *slot,
                    None => {
                        let slot = atlas.allocate(tex.paths.len() as u16)?;
                        assigned.insert(tex.paths.clone(), slot);
                        slot
                    }
                };
                tex.offset = offset;
                tex.plane = plane;
            }
        }
        // A registry with no textures still occupies one plane so the
        // mesher's per-plane buckets are never zero-sized.
        if atlas.planes == 0 {
            atlas.planes = 1;
        }
        Ok(atlas)
    }

    fn allocate(&mut self, count: u16) -> Result<(u16, u8), Box<dyn Error>> {
        if count > self.capacity {
            return Err(format!("texture run of {count} exceeds plane capacity").into());
        }
        if self.planes == 0 || self.cursor + count > self.capacity {
            self.planes = self
                .planes
                .checked_add(1)
                .ok_or("atlas plane count overflow")?;
            self.cursor = 0;
        }
        let offset = self.cursor;
        self.cursor += count;
        Ok((offset, self.planes - 1))
    }

    #[inline]
    pub fn plane_count(&self) -> usize {
        self.planes as usize
    }
}
