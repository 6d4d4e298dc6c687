//! Packet data shapes exchanged with the world authority.
//!
//! Wire framing and transport live elsewhere; these structs define the
//! vocabulary the session layer feeds into the world model. Only
//! [`ChunkVoxels`] and [`SetVoxel`] drive the meshing/dirty-tracking path;
//! the rest pass through this core opaquely.
#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

use karst_chunk::{EntityId, VoxelStorage};
use karst_voxel::VoxelId;
use karst_world::{ChunkCoord, VoxelCoord};

pub const TICKRATE: u16 = 60;
pub const PORT: u16 = 43103;
pub const VERSION: u32 = 14;

pub const MAX_CHAT: usize = 16384;
pub const MAX_USERNAME: usize = 64;
pub const MAX_SOUNDNAME: usize = 1024;

/// Authoritative full-chunk snapshot. Committing one creates or
/// bulk-replaces the chunk at `chunk` and re-flags it and its neighbors
/// for meshing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChunkVoxels {
    pub entity: EntityId,
    pub chunk: ChunkCoord,
    pub voxels: VoxelStorage,
}

impl ChunkVoxels {
    pub const ID: u16 = 0x0005;
}

/// Single authoritative voxel write.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SetVoxel {
    pub coord: VoxelCoord,
    pub voxel: VoxelId,
    pub flags: u16,
}

impl SetVoxel {
    pub const ID: u16 = 0x000B;
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct EntityTransform {
    pub entity: EntityId,
    pub chunk: ChunkCoord,
    pub local: [f32; 3],
    pub angles: [f32; 3],
}

impl EntityTransform {
    pub const ID: u16 = 0x0006;
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct EntityHead {
    pub entity: EntityId,
    pub angles: [f32; 3],
}

impl EntityHead {
    pub const ID: u16 = 0x0007;
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct EntityVelocity {
    pub entity: EntityId,
    pub angular: [f32; 3],
    pub linear: [f32; 3],
}

impl EntityVelocity {
    pub const ID: u16 = 0x0008;
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SpawnPlayer {
    pub entity: EntityId,
}

impl SpawnPlayer {
    pub const ID: u16 = 0x0009;
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct RemoveEntity {
    pub entity: EntityId,
}

impl RemoveEntity {
    pub const ID: u16 = 0x000C;
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub kind: u16,
    pub sender: String,
    pub message: String,
}

impl ChatMessage {
    pub const ID: u16 = 0x000A;

    pub const TEXT_MESSAGE: u16 = 0x0000;
    pub const PLAYER_JOIN: u16 = 0x0001;
    pub const PLAYER_LEAVE: u16 = 0x0002;
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Disconnect {
    pub reason: String,
}

impl Disconnect {
    pub const ID: u16 = 0x0004;
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct RequestChunk {
    pub coord: ChunkCoord,
}

impl RequestChunk {
    pub const ID: u16 = 0x000F;
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenericSound {
    pub sound: String,
    pub looping: bool,
    pub pitch: f32,
}

impl GenericSound {
    pub const ID: u16 = 0x0010;
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EntitySound {
    pub entity: EntityId,
    pub sound: String,
    pub looping: bool,
    pub pitch: f32,
}

impl EntitySound {
    pub const ID: u16 = 0x0011;
}
