use std::sync::Arc;

use hashbrown::{HashMap, HashSet};
use log::debug;
use serde::Deserialize;

use karst_geom::{Aabb, Vec3};
use karst_mesh::{CancelToken, ChunkMeshCpu, ChunkQuad, MeshSnapshot};
use karst_runtime::{BuildJob, DEFAULT_WORKERS, Runtime};
use karst_voxel::VoxelRegistry;
use karst_world::{CHUNK_SIZE, ChunkCoord, affected_by_chunk, affected_by_voxel};

use crate::world::{World, WorldEvent};

/// Opaque renderer-side buffer identifier handed out by [`QuadUpload`].
pub type BufferHandle = u64;

/// Narrow upload boundary standing in for the renderer. `upload` may reuse
/// the existing handle or mint a fresh one; `release` frees it.
pub trait QuadUpload {
    fn upload(&mut self, existing: Option<BufferHandle>, quads: &[ChunkQuad]) -> BufferHandle;
    fn release(&mut self, handle: BufferHandle);
}

/// One uploaded quad list for a (plane, blending class) pair.
#[derive(Clone, Copy, Debug)]
pub struct QuadBuffer {
    pub handle: BufferHandle,
    pub quad_count: usize,
}

/// Persistent per-chunk buffers, one slot per atlas plane and class.
#[derive(Debug)]
pub struct ChunkMesh {
    pub opaque: Vec<Option<QuadBuffer>>,
    pub blending: Vec<Option<QuadBuffer>>,
}

impl ChunkMesh {
    fn with_planes(plane_count: usize) -> Self {
        Self {
            opaque: (0..plane_count).map(|_| None).collect(),
            blending: (0..plane_count).map(|_| None).collect(),
        }
    }

    pub fn quad_count(&self) -> usize {
        self.opaque
            .iter()
            .chain(self.blending.iter())
            .flatten()
            .map(|b| b.quad_count)
            .sum()
    }

    fn is_empty(&self) -> bool {
        self.opaque
            .iter()
            .chain(self.blending.iter())
            .all(Option::is_none)
    }
}

/// Notifications for the visibility/culling system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MeshEvent {
    Updated { coord: ChunkCoord, bounds: Aabb },
    Removed { coord: ChunkCoord },
}

/// Per-frame scheduling tunables. The two budgets bound frame-time impact
/// independently: draining applies finished work, enqueuing snapshots and
/// submits new work.
#[derive(Clone, Debug, Deserialize)]
pub struct MesherConfig {
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_budget")]
    pub finalize_budget: usize,
    #[serde(default = "default_budget")]
    pub enqueue_budget: usize,
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}
fn default_budget() -> usize {
    64
}

impl Default for MesherConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            finalize_budget: default_budget(),
            enqueue_budget: default_budget(),
        }
    }
}

impl MesherConfig {
    pub fn from_toml_str(toml_str: &str) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(toml::from_str(toml_str)?)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpdateStats {
    pub finalized: usize,
    pub enqueued: usize,
}

struct WorkerHandle {
    job_id: u64,
    cancel: CancelToken,
}

/// Main-thread mesher state: dirty flags, the per-coordinate worker map,
/// and the persistent mesh store. Keeps world geometry eventually
/// consistent without blocking the frame loop.
pub struct MesherRig {
    cfg: MesherConfig,
    registry: Arc<VoxelRegistry>,
    plane_count: usize,
    runtime: Runtime,
    dirty: HashSet<ChunkCoord>,
    workers: HashMap<ChunkCoord, WorkerHandle>,
    meshes: HashMap<ChunkCoord, ChunkMesh>,
    events: Vec<MeshEvent>,
    next_job_id: u64,
}

impl MesherRig {
    pub fn new(cfg: MesherConfig, registry: Arc<VoxelRegistry>, plane_count: usize) -> Self {
        let runtime = Runtime::new(cfg.workers);
        Self {
            cfg,
            registry,
            plane_count,
            runtime,
            dirty: HashSet::new(),
            workers: HashMap::new(),
            meshes: HashMap::new(),
            events: Vec::new(),
            next_job_id: 1,
        }
    }

    /// Fan a committed world mutation out into dirty flags. Whole-chunk
    /// events flag the chunk and all six neighbors; a voxel write flags
    /// only the neighbors across the boundaries it touches. Unloaded
    /// neighbors are skipped.
    pub fn apply_world_event(&mut self, world: &World, event: &WorldEvent) {
        match *event {
            WorldEvent::ChunkCreated { coord } | WorldEvent::ChunkUpdated { coord } => {
                for c in affected_by_chunk(coord) {
                    if world.contains(c) {
                        self.dirty.insert(c);
                    }
                }
            }
            WorldEvent::VoxelChanged { coord } => {
                for c in affected_by_voxel(coord) {
                    if world.contains(c) {
                        self.dirty.insert(c);
                    }
                }
            }
        }
    }

    pub fn mark_dirty(&mut self, coord: ChunkCoord) {
        self.dirty.insert(coord);
    }

    pub fn is_dirty(&self, coord: ChunkCoord) -> bool {
        self.dirty.contains(&coord)
    }

    pub fn mesh(&self, coord: ChunkCoord) -> Option<&ChunkMesh> {
        self.meshes.get(&coord)
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// Nothing flagged, in flight, or queued.
    pub fn idle(&self) -> bool {
        self.dirty.is_empty() && self.workers.is_empty() && self.runtime.pending() == 0
    }

    pub fn drain_events(&mut self) -> Vec<MeshEvent> {
        std::mem::take(&mut self.events)
    }

    /// One frame of mesher upkeep: apply finished builds, then feed the
    /// pool from the dirty set. Never blocks on a worker.
    pub fn update(&mut self, world: &World, device: &mut dyn QuadUpload) -> UpdateStats {
        let mut stats = UpdateStats::default();

        while stats.finalized < self.cfg.finalize_budget {
            let Some(out) = self.runtime.try_recv_result() else {
                break;
            };
            match self.workers.get(&out.coord) {
                Some(handle) if handle.job_id == out.job_id => {
                    self.workers.remove(&out.coord);
                }
                // A job this rig no longer tracks; nothing to apply.
                _ => continue,
            }
            let Some(cpu) = out.mesh else {
                continue;
            };
            if self.dirty.contains(&out.coord) {
                // Re-flagged while the build ran; the result is stale and
                // the coord re-enqueues below or next frame.
                continue;
            }
            if !world.contains(out.coord) {
                self.remove_mesh(out.coord, device);
                continue;
            }
            self.finalize(out.coord, &cpu, device);
            stats.finalized += 1;
        }

        if !self.dirty.is_empty() {
            let flagged: Vec<ChunkCoord> = self.dirty.iter().copied().collect();
            for coord in flagged {
                if stats.enqueued >= self.cfg.enqueue_budget {
                    break;
                }
                if let Some(handle) = self.workers.get(&coord) {
                    // One live build per coordinate: supersede the running
                    // one and keep the flag so the coord re-enqueues once
                    // the stale result drains.
                    handle.cancel.cancel();
                    continue;
                }
                let Some(chunk) = world.find(coord) else {
                    self.dirty.remove(&coord);
                    continue;
                };
                self.dirty.remove(&coord);

                let mut snapshot = MeshSnapshot::new(coord);
                snapshot.insert(coord, chunk.voxels.clone());
                for neighbor in coord.face_neighbors() {
                    if let Some(c) = world.find(neighbor) {
                        snapshot.insert(neighbor, c.voxels.clone());
                    }
                }

                let cancel = CancelToken::new();
                let job_id = self.next_job_id;
                self.next_job_id += 1;
                self.workers.insert(
                    coord,
                    WorkerHandle {
                        job_id,
                        cancel: cancel.clone(),
                    },
                );
                self.runtime.submit(BuildJob {
                    coord,
                    job_id,
                    snapshot,
                    registry: self.registry.clone(),
                    plane_count: self.plane_count,
                    cancel,
                });
                stats.enqueued += 1;
            }
        }

        if stats.finalized > 0 || stats.enqueued > 0 {
            debug!(
                "mesher: finalized {} enqueued {}",
                stats.finalized, stats.enqueued
            );
        }
        stats
    }

    fn finalize(&mut self, coord: ChunkCoord, cpu: &ChunkMeshCpu, device: &mut dyn QuadUpload) {
        let existed = self.meshes.contains_key(&coord);
        let mesh = self
            .meshes
            .entry(coord)
            .or_insert_with(|| ChunkMesh::with_planes(cpu.plane_count()));

        for (slot, quads) in mesh.opaque.iter_mut().zip(&cpu.opaque) {
            upload_slot(device, slot, quads);
        }
        for (slot, quads) in mesh.blending.iter_mut().zip(&cpu.blending) {
            upload_slot(device, slot, quads);
        }

        if mesh.is_empty() {
            self.meshes.remove(&coord);
            if existed {
                self.events.push(MeshEvent::Removed { coord });
            }
        } else {
            self.events.push(MeshEvent::Updated {
                coord,
                bounds: chunk_bounds(coord),
            });
        }
    }

    fn remove_mesh(&mut self, coord: ChunkCoord, device: &mut dyn QuadUpload) {
        let Some(mesh) = self.meshes.remove(&coord) else {
            return;
        };
        for buffer in mesh.opaque.into_iter().chain(mesh.blending).flatten() {
            device.release(buffer.handle);
        }
        self.events.push(MeshEvent::Removed { coord });
    }

    /// Drop all mesher state for an unloaded chunk. An in-flight build for
    /// it is cancelled and its result discarded on a later drain.
    pub fn chunk_unloaded(&mut self, coord: ChunkCoord, device: &mut dyn QuadUpload) {
        self.dirty.remove(&coord);
        if let Some(handle) = self.workers.get(&coord) {
            handle.cancel.cancel();
        }
        self.remove_mesh(coord, device);
    }

    /// Cancel everything outstanding, wait for the pool to drain, and hand
    /// every held buffer back to the device.
    pub fn shutdown(&mut self, device: &mut dyn QuadUpload) {
        for handle in self.workers.values() {
            handle.cancel.cancel();
        }
        let discarded = self.runtime.shutdown();
        debug!("mesher: shutdown discarded {} results", discarded.len());
        self.workers.clear();
        self.dirty.clear();
        let coords: Vec<ChunkCoord> = self.meshes.keys().copied().collect();
        for coord in coords {
            self.remove_mesh(coord, device);
        }
    }
}

fn upload_slot(device: &mut dyn QuadUpload, slot: &mut Option<QuadBuffer>, quads: &[ChunkQuad]) {
    if quads.is_empty() {
        if let Some(buffer) = slot.take() {
            device.release(buffer.handle);
        }
        return;
    }
    let existing = slot.map(|b| b.handle);
    let handle = device.upload(existing, quads);
    *slot = Some(QuadBuffer {
        handle,
        quad_count: quads.len(),
    });
}

fn chunk_bounds(coord: ChunkCoord) -> Aabb {
    let min = Vec3::new(
        (coord.x * CHUNK_SIZE as i64) as f32,
        (coord.y * CHUNK_SIZE as i64) as f32,
        (coord.z * CHUNK_SIZE as i64) as f32,
    );
    let max = min + Vec3::new(CHUNK_SIZE as f32, CHUNK_SIZE as f32, CHUNK_SIZE as f32);
    Aabb::new(min, max)
}
