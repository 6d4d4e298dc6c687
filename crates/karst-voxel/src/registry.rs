use std::collections::HashMap;
use std::error::Error;
use std::fs;
use std::path::Path;

use crate::config::{TexturesDef, VoxelDef, VoxelsConfig};
use crate::types::{
    FACE_COUNT, NULL_VOXEL, VoxelFace, VoxelId, VoxelInfo, VoxelShape, VoxelTexture,
};

/// Id-indexed voxel definition table. Slot 0 stays empty for [`NULL_VOXEL`].
#[derive(Default, Clone, Debug)]
pub struct VoxelRegistry {
    voxels: Vec<Option<VoxelInfo>>,
    by_name: HashMap<String, VoxelId>,
}

impl VoxelRegistry {
    pub fn new() -> Self {
        Self {
            voxels: vec![None],
            by_name: HashMap::new(),
        }
    }

    #[inline]
    pub fn find(&self, id: VoxelId) -> Option<&VoxelInfo> {
        self.voxels.get(id as usize)?.as_ref()
    }

    pub fn id_by_name(&self, name: &str) -> Option<VoxelId> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VoxelInfo> {
        self.voxels.iter().filter_map(|v| v.as_ref())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut VoxelInfo> {
        self.voxels.iter_mut().filter_map(|v| v.as_mut())
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    pub fn from_toml_str(toml_str: &str) -> Result<Self, Box<dyn Error>> {
        let cfg: VoxelsConfig = toml::from_str(toml_str)?;
        Self::from_config(cfg)
    }

    pub fn from_config(cfg: VoxelsConfig) -> Result<Self, Box<dyn Error>> {
        let mut reg = VoxelRegistry::new();
        for def in cfg.voxels {
            reg.register(def)?;
        }
        Ok(reg)
    }

    /// Register one definition. Explicit ids must not collide; implicit ids
    /// take the next free slot after the current highest.
    pub fn register(&mut self, def: VoxelDef) -> Result<VoxelId, Box<dyn Error>> {
        let id = def.id.unwrap_or(self.voxels.len() as u16);
        if id == NULL_VOXEL {
            return Err(format!("voxel {:?}: id 0 is reserved for air", def.name).into());
        }
        if self.by_name.contains_key(&def.name) {
            return Err(format!("duplicate voxel name {:?}", def.name).into());
        }
        let slot = id as usize;
        if slot < self.voxels.len() && self.voxels[slot].is_some() {
            return Err(format!("voxel {:?}: id {} already taken", def.name, id).into());
        }
        if slot >= self.voxels.len() {
            self.voxels.resize_with(slot + 1, || None);
        }

        let shape = match def.shape.as_deref() {
            None | Some("cube") => VoxelShape::Cube,
            Some("cross") => VoxelShape::Cross,
            Some(other) => {
                return Err(format!("voxel {:?}: unknown shape {:?}", def.name, other).into());
            }
        };

        let textures = compile_textures(shape, def.textures.unwrap_or_default());
        self.by_name.insert(def.name.clone(), id);
        self.voxels[slot] = Some(VoxelInfo {
            id,
            name: def.name,
            shape,
            blending: def.blending.unwrap_or(false),
            animated: def.animated.unwrap_or(false),
            textures,
        });
        Ok(id)
    }
}

fn compile_textures(shape: VoxelShape, def: TexturesDef) -> [VoxelTexture; FACE_COUNT] {
    let all = def.all.unwrap_or_default();
    let pick = |specific: Option<Vec<String>>| -> VoxelTexture {
        VoxelTexture {
            paths: specific.unwrap_or_else(|| all.clone()),
            offset: 0,
            plane: 0,
        }
    };
    let mut out: [VoxelTexture; FACE_COUNT] = Default::default();
    match shape {
        VoxelShape::Cube => {
            out[VoxelFace::CubeNorth.index()] = pick(def.north);
            out[VoxelFace::CubeSouth.index()] = pick(def.south);
            out[VoxelFace::CubeEast.index()] = pick(def.east);
            out[VoxelFace::CubeWest.index()] = pick(def.west);
            out[VoxelFace::CubeTop.index()] = pick(def.top);
            out[VoxelFace::CubeBottom.index()] = pick(def.bottom);
        }
        VoxelShape::Cross => {
            out[VoxelFace::CrossNesw.index()] = pick(def.cross.clone());
            out[VoxelFace::CrossNwse.index()] = pick(def.cross);
        }
    }
    out
}
