//! Background cell loader.
//!
//! The loader services the load queue one request at a time:
//!
//! 1. Evict live cells that fell outside the window
//! 2. Pop the oldest request and pick a free slot
//! 3. Discard requests that are stale or already resident
//! 4. Claim the slot, build geometry without holding it, then commit
//!
//! The window read lock is held from eviction through claim, so a request is
//! always judged against the window it was evicted under. Slot selection and
//! claim run under a single claim lock. Lock order across the crate is
//! window, then queue, then claim, then cell.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use glam::{Vec2, Vec3};
use parking_lot::{Mutex, RwLock};
use terrastream_common::{PixelRect, StreamError, StreamResult};
use terrastream_kernel::{Heightmap, MeshBuilder, TerrainMesh};
use tracing::{debug, info, trace, warn};

use crate::config::{FullStorePolicy, StreamingConfig};
use crate::queue::LoadQueue;
use crate::store::CellStore;
use crate::window::GridWindow;

/// Name given to the loader thread.
pub const LOADER_THREAD_NAME: &str = "terrastream-loader";

/// What servicing one request did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum LoadOutcome {
    /// The queue was empty
    Idle,
    /// A cell was built and made live
    Loaded {
        /// Slot that received the cell
        slot: usize,
        /// Cell origin
        origin: Vec2,
    },
    /// The origin is no longer inside the window
    Stale {
        /// Requested origin
        origin: Vec2,
    },
    /// A resident cell already covers the origin
    Duplicate {
        /// Requested origin
        origin: Vec2,
    },
    /// Every slot was taken
    StoreFull {
        /// Requested origin
        origin: Vec2,
        /// Whether the request went back to the queue
        requeued: bool,
    },
}

/// Running counters for streaming activity.
#[derive(Debug, Default)]
pub(crate) struct StreamCounters {
    requested: AtomicU64,
    loaded: AtomicU64,
    stale: AtomicU64,
    duplicate: AtomicU64,
    store_full: AtomicU64,
    evicted: AtomicU64,
}

impl StreamCounters {
    pub(crate) fn add_requested(&self, count: usize) {
        self.requested.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub(crate) fn add_evicted(&self, count: usize) {
        self.evicted.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub(crate) fn record(&self, outcome: &LoadOutcome) {
        let counter = match outcome {
            LoadOutcome::Idle => return,
            LoadOutcome::Loaded { .. } => &self.loaded,
            LoadOutcome::Stale { .. } => &self.stale,
            LoadOutcome::Duplicate { .. } => &self.duplicate,
            LoadOutcome::StoreFull { .. } => &self.store_full,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Reads every counter.
    #[must_use]
    pub fn snapshot(&self) -> StreamStats {
        StreamStats {
            requested: self.requested.load(Ordering::Relaxed),
            loaded: self.loaded.load(Ordering::Relaxed),
            stale: self.stale.load(Ordering::Relaxed),
            duplicate: self.duplicate.load(Ordering::Relaxed),
            store_full: self.store_full.load(Ordering::Relaxed),
            evicted: self.evicted.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the streaming counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Origins enqueued by window shifts
    pub requested: u64,
    /// Cells built and made live, including the startup burst
    pub loaded: u64,
    /// Requests discarded because the window moved on
    pub stale: u64,
    /// Requests discarded because the origin was already resident
    pub duplicate: u64,
    /// Requests that found no free slot
    pub store_full: u64,
    /// Cells marked not live
    pub evicted: u64,
}

/// State shared between the manager and the loader thread.
pub(crate) struct StreamState {
    pub(crate) config: StreamingConfig,
    pub(crate) heightmap: Arc<Heightmap>,
    pub(crate) builder: Arc<dyn MeshBuilder>,
    pub(crate) store: CellStore,
    pub(crate) queue: LoadQueue,
    pub(crate) window: RwLock<GridWindow>,
    pub(crate) stopping: AtomicBool,
    pub(crate) counters: StreamCounters,
    claim_lock: Mutex<()>,
}

impl StreamState {
    pub(crate) fn new(
        config: StreamingConfig,
        heightmap: Arc<Heightmap>,
        builder: Arc<dyn MeshBuilder>,
    ) -> Self {
        let window = GridWindow::new(Vec2::ZERO, config.cell_size as f32, config.half_extent);
        Self {
            store: CellStore::new(config.capacity()),
            queue: LoadQueue::new(),
            window: RwLock::new(window),
            stopping: AtomicBool::new(false),
            counters: StreamCounters::default(),
            claim_lock: Mutex::new(()),
            config,
            heightmap,
            builder,
        }
    }

    /// Services the oldest pending request.
    pub(crate) fn service_next(&self) -> LoadOutcome {
        // The window cannot move between eviction, pop and claim
        let (origin, claimed) = {
            let window = self.window.read();

            let evicted = self
                .store
                .mark_distant_cells_not_live(|origin| window.is_distant(origin));
            if evicted > 0 {
                trace!(evicted, "Evicted distant cells");
                self.counters.add_evicted(evicted);
            }

            let Some(origin) = self.queue.pop() else {
                return LoadOutcome::Idle;
            };
            (origin, self.claim(origin, &window))
        };

        let outcome = match claimed {
            Ok((slot, mesh)) => {
                self.build_and_commit(slot, origin, mesh);
                debug!(slot, ?origin, "Loaded cell");
                LoadOutcome::Loaded { slot, origin }
            },
            Err(LoadOutcome::StoreFull { origin, requeued }) => {
                if requeued {
                    self.queue.push(origin);
                }
                LoadOutcome::StoreFull { origin, requeued }
            },
            Err(outcome) => outcome,
        };
        self.counters.record(&outcome);
        outcome
    }

    /// Drains the queue on the calling thread.
    pub(crate) fn drain(&self) -> usize {
        let mut loaded = 0;
        // Requeued requests would never drain while the store stays full
        for _ in 0..self.queue.len() {
            match self.service_next() {
                LoadOutcome::Idle => break,
                LoadOutcome::Loaded { .. } => loaded += 1,
                _ => {}
            }
        }
        loaded
    }

    /// Picks a slot for `origin` and marks it loading.
    fn claim(
        &self,
        origin: Vec2,
        window: &GridWindow,
    ) -> Result<(usize, TerrainMesh), LoadOutcome> {
        let _claim = self.claim_lock.lock();

        let Some(slot) = self.store.find_reusable_slot() else {
            let requeued = self.config.full_store_policy == FullStorePolicy::Requeue;
            trace!(?origin, requeued, "No free slot for request");
            return Err(LoadOutcome::StoreFull { origin, requeued });
        };

        if window.is_distant(origin) {
            trace!(?origin, "Discarding stale request");
            return Err(LoadOutcome::Stale { origin });
        }

        if self
            .store
            .find_by_origin(origin, window.tolerance())
            .is_some()
        {
            trace!(?origin, "Discarding duplicate request");
            return Err(LoadOutcome::Duplicate { origin });
        }

        self.store
            .lock(slot)
            .map(|mut cell| (slot, cell.begin_load(origin)))
            .ok_or(LoadOutcome::Idle)
    }

    /// Loads `origin` into `slot` directly, skipping the queue and filters.
    pub(crate) fn load_into(&self, slot: usize, origin: Vec2) {
        let Some(mesh) = self
            .store
            .lock(slot)
            .map(|mut cell| cell.begin_load(origin))
        else {
            return;
        };
        self.build_and_commit(slot, origin, mesh);
        self.counters.record(&LoadOutcome::Loaded { slot, origin });
    }

    /// Rebuilds a claimed cell's geometry and makes it live.
    fn build_and_commit(&self, slot: usize, origin: Vec2, mut mesh: TerrainMesh) {
        self.build_geometry(&mut mesh, origin);
        if let Some(mut cell) = self.store.lock(slot) {
            cell.finish_load(mesh);
        }
    }

    fn build_geometry(&self, mesh: &mut TerrainMesh, origin: Vec2) {
        let rect = PixelRect::for_cell(
            origin,
            self.config.cell_size,
            self.heightmap.width(),
            self.heightmap.height(),
        );
        match rect {
            Some(rect) => {
                let scale = Vec3::new(1.0, self.config.height_scale, 1.0);
                self.builder.build(mesh, &self.heightmap, rect, scale);
            },
            None => {
                trace!(?origin, "Cell lies outside the heightmap");
                mesh.clear();
            },
        }
    }
}

/// Handle to the running loader thread.
#[derive(Debug)]
pub(crate) struct Loader {
    handle: JoinHandle<()>,
}

impl Loader {
    /// Spawns the loader thread.
    pub(crate) fn spawn(state: Arc<StreamState>) -> StreamResult<Self> {
        let idle = state.config.idle_sleep();
        let handle = thread::Builder::new()
            .name(LOADER_THREAD_NAME.to_string())
            .spawn(move || {
                info!("Loader started");
                while !state.stopping.load(Ordering::Acquire) {
                    if state.queue.is_empty() {
                        thread::sleep(idle);
                        continue;
                    }
                    state.service_next();
                }
                info!("Loader stopped");
            })?;
        Ok(Self { handle })
    }

    /// Returns true once the thread has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the loader to exit. The stop flag must already be set.
    pub(crate) fn join(self) -> StreamResult<()> {
        self.handle.join().map_err(|_| {
            warn!("Loader thread panicked");
            StreamError::LoaderPanicked
        })
    }
}
