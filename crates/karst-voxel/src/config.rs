use serde::Deserialize;

// Top-level voxel definitions file
#[derive(Deserialize, Debug)]
pub struct VoxelsConfig {
    pub voxels: Vec<VoxelDef>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct VoxelDef {
    pub name: String,
    #[serde(default)]
    pub id: Option<u16>,
    #[serde(default)]
    pub shape: Option<String>,
    #[serde(default)]
    pub blending: Option<bool>,
    #[serde(default)]
    pub animated: Option<bool>,
    #[serde(default)]
    pub textures: Option<TexturesDef>,
}

// Face texture mapping: `all` applies to every slot the shape uses,
// specific entries override it.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct TexturesDef {
    #[serde(default)]
    pub all: Option<Vec<String>>,
    #[serde(default)]
    pub north: Option<Vec<String>>,
    #[serde(default)]
    pub south: Option<Vec<String>>,
    #[serde(default)]
    pub east: Option<Vec<String>>,
    #[serde(default)]
    pub west: Option<Vec<String>>,
    #[serde(default)]
    pub top: Option<Vec<String>>,
    #[serde(default)]
    pub bottom: Option<Vec<String>>,
    #[serde(default)]
    pub cross: Option<Vec<String>>,
}
