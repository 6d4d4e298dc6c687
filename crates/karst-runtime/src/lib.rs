//! Mesh build worker pool: bounded threads, cooperative cancellation.
#![forbid(unsafe_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_channel::{Receiver, Sender, unbounded};
use log::debug;
use rayon::{ThreadPool, ThreadPoolBuilder};

use karst_mesh::{CancelToken, ChunkMeshCpu, MeshSnapshot, build_chunk_mesh};
use karst_voxel::VoxelRegistry;
use karst_world::ChunkCoord;

/// Meshing keeps out of the simulation's way; a couple of threads clear a
/// whole view distance within a few frames.
pub const DEFAULT_WORKERS: usize = 2;

/// One build request. The snapshot is the worker's entire view of the
/// world; the registry is shared read-only and must not change while any
/// job is outstanding.
pub struct BuildJob {
    pub coord: ChunkCoord,
    pub job_id: u64,
    pub snapshot: MeshSnapshot,
    pub registry: Arc<VoxelRegistry>,
    pub plane_count: usize,
    pub cancel: CancelToken,
}

/// Completion record. `mesh` is `None` exactly when the token fired
/// mid-build; the scheduler must also treat results it has since
/// superseded as cancelled.
pub struct JobOut {
    pub coord: ChunkCoord,
    pub job_id: u64,
    pub mesh: Option<ChunkMeshCpu>,
}

impl JobOut {
    #[inline]
    pub fn was_cancelled(&self) -> bool {
        self.mesh.is_none()
    }
}

pub struct Runtime {
    job_tx: Option<Sender<BuildJob>>,
    res_rx: Receiver<JobOut>,
    _pool: ThreadPool,
    queued: Arc<AtomicUsize>,
    inflight: Arc<AtomicUsize>,
    workers: usize,
}

impl Runtime {
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        let (job_tx, job_rx) = unbounded::<BuildJob>();
        let (res_tx, res_rx) = unbounded::<JobOut>();
        let queued = Arc::new(AtomicUsize::new(0));
        let inflight = Arc::new(AtomicUsize::new(0));

        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("karst-mesh-{i}"))
            .build()
            .expect("mesher pool");
        for _ in 0..workers {
            let rx = job_rx.clone();
            let tx = res_tx.clone();
            let queued = queued.clone();
            let inflight = inflight.clone();
            pool.spawn(move || {
                while let Ok(job) = rx.recv() {
                    // Claim before releasing the queue count so `pending`
                    // never dips to zero with a build still in hand.
                    inflight.fetch_add(1, Ordering::Relaxed);
                    queued.fetch_sub(1, Ordering::Relaxed);
                    let mesh =
                        build_chunk_mesh(&job.snapshot, &job.registry, job.plane_count, &job.cancel);
                    let _ = tx.send(JobOut {
                        coord: job.coord,
                        job_id: job.job_id,
                        mesh,
                    });
                    inflight.fetch_sub(1, Ordering::Relaxed);
                }
            });
        }

        Self {
            job_tx: Some(job_tx),
            res_rx,
            _pool: pool,
            queued,
            inflight,
            workers,
        }
    }

    pub fn worker_count(&self) -> usize {
        self.workers
    }

    pub fn submit(&self, job: BuildJob) {
        let Some(tx) = &self.job_tx else {
            return;
        };
        self.queued.fetch_add(1, Ordering::Relaxed);
        if tx.send(job).is_err() {
            self.queued.fetch_sub(1, Ordering::Relaxed);
        }
    }

    /// Non-blocking; the per-frame drain loop calls this until it returns
    /// `None` or its finalize budget runs out.
    pub fn try_recv_result(&self) -> Option<JobOut> {
        self.res_rx.try_recv().ok()
    }

    pub fn pending(&self) -> usize {
        self.queued.load(Ordering::Relaxed) + self.inflight.load(Ordering::Relaxed)
    }

    /// Close the queue and wait for every in-flight and queued job to
    /// report back. Callers cancel outstanding tokens first so the wait is
    /// a drain, not a meshing marathon.
    pub fn shutdown(&mut self) -> Vec<JobOut> {
        self.job_tx.take();
        let mut leftovers: Vec<JobOut> = self.res_rx.try_iter().collect();
        while self.pending() > 0 {
            match self.res_rx.recv() {
                Ok(out) => leftovers.push(out),
                Err(_) => break,
            }
        }
        debug!("runtime: drained {} leftover results", leftovers.len());
        leftovers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use karst_chunk::VoxelStorage;
    use karst_world::LocalCoord;
    use std::time::{Duration, Instant};

    fn registry() -> Arc<VoxelRegistry> {
        Arc::new(
            VoxelRegistry::from_toml_str(
                r#"
                [[voxels]]
                name = "stone"

                [voxels.textures]
                all = ["stone.png"]
            "#,
            )
            .unwrap(),
        )
    }

    fn job(reg: &Arc<VoxelRegistry>, coord: ChunkCoord, job_id: u64) -> BuildJob {
        let stone = reg.id_by_name("stone").unwrap();
        let mut voxels = VoxelStorage::new();
        voxels.set(LocalCoord::new(1, 1, 1), stone);
        let mut snapshot = MeshSnapshot::new(coord);
        snapshot.insert(coord, voxels);
        BuildJob {
            coord,
            job_id,
            snapshot,
            registry: reg.clone(),
            plane_count: 1,
            cancel: CancelToken::new(),
        }
    }

    fn recv_blocking(rt: &Runtime) -> JobOut {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(out) = rt.try_recv_result() {
                return out;
            }
            assert!(Instant::now() < deadline, "worker never reported back");
            std::thread::yield_now();
        }
    }

    #[test]
    fn submitted_jobs_report_with_mesh() {
        let reg = registry();
        let rt = Runtime::new(1);
        rt.submit(job(&reg, ChunkCoord::new(0, 0, 0), 1));
        let out = recv_blocking(&rt);
        assert_eq!(out.job_id, 1);
        assert!(!out.was_cancelled());
        assert_eq!(out.mesh.unwrap().quad_count(), 6);
    }

    #[test]
    fn pre_cancelled_jobs_report_cancelled() {
        let reg = registry();
        let rt = Runtime::new(1);
        let j = job(&reg, ChunkCoord::new(0, 0, 0), 2);
        j.cancel.cancel();
        rt.submit(j);
        let out = recv_blocking(&rt);
        assert!(out.was_cancelled());
    }

    #[test]
    fn shutdown_waits_for_every_submission() {
        let reg = registry();
        let mut rt = Runtime::new(2);
        for i in 0..8 {
            rt.submit(job(&reg, ChunkCoord::new(i, 0, 0), i as u64));
        }
        let leftovers = rt.shutdown();
        assert_eq!(leftovers.len(), 8);
        assert_eq!(rt.pending(), 0);
    }
}
