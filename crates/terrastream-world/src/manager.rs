//! Cell manager: window tracking, loading and draw selection.
//!
//! The manager is driven from one caller thread:
//!
//! ```text
//! initialize_for_position  once, loads the whole window synchronously
//! optimize_for_position    per update tick, enqueues newly entered cells
//! draw_active_cells        per render tick, uploads and draws live cells
//! stop                     once, joins the loader
//! ```
//!
//! Loads run on the loader thread, or on the caller through
//! [`CellManager::pump_load_queue`] when the background loader is disabled.

use std::f32::consts::FRAC_1_SQRT_2;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use glam::{Vec2, Vec3};
use terrastream_common::{ground_plane, StreamError, StreamResult};
use terrastream_kernel::{GridMeshBuilder, Heightmap, MeshBuilder, RenderBackend};
use tracing::{debug, info, warn};

use crate::cell::CellSnapshot;
use crate::config::StreamingConfig;
use crate::loader::{Loader, StreamState, StreamStats};
use crate::window::GridWindow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Idle,
    Inline,
    Running,
    Stopped,
}

/// Streams terrain cells around a moving viewpoint.
///
/// Owns a fixed store of `4 N^2` cells, the load queue, and the loader
/// thread. GPU buffers live here, one per slot, and are only touched by the
/// caller thread.
pub struct CellManager<R: RenderBackend> {
    state: Arc<StreamState>,
    lifecycle: Lifecycle,
    loader: Option<Loader>,
    buffers: Vec<Option<R::Buffer>>,
}

impl<R: RenderBackend> CellManager<R> {
    /// Creates a new manager with every slot empty.
    pub fn new(
        config: StreamingConfig,
        heightmap: Arc<Heightmap>,
        builder: Arc<dyn MeshBuilder>,
    ) -> StreamResult<Self> {
        config.validate()?;
        let capacity = config.capacity();
        info!(
            "Creating cell manager: {} slots, cell size {}, heightmap {}x{}",
            capacity,
            config.cell_size,
            heightmap.width(),
            heightmap.height()
        );

        Ok(Self {
            state: Arc::new(StreamState::new(config, heightmap, builder)),
            lifecycle: Lifecycle::Idle,
            loader: None,
            buffers: (0..capacity).map(|_| None).collect(),
        })
    }

    /// Creates a manager using the regular grid mesh builder.
    pub fn with_grid_builder(
        config: StreamingConfig,
        heightmap: Arc<Heightmap>,
    ) -> StreamResult<Self> {
        Self::new(config, heightmap, Arc::new(GridMeshBuilder))
    }

    /// Centers the window on `position` and loads every cell in it.
    ///
    /// Cells load synchronously in row-major order before this returns.
    /// The loader thread starts afterwards if the config asks for one.
    pub fn initialize_for_position(&mut self, position: Vec3) -> StreamResult<()> {
        if self.lifecycle != Lifecycle::Idle {
            warn!("initialize_for_position called twice");
            return Err(StreamError::AlreadyInitialized);
        }

        let config = &self.state.config;
        let window = GridWindow::centered_on(
            ground_plane(position),
            config.cell_size as f32,
            config.half_extent,
        );
        *self.state.window.write() = window;

        for (slot, origin) in window.origins().enumerate() {
            self.state.load_into(slot, origin);
        }
        info!(
            "Loaded {} cells around ({:.1}, {:.1}), window starts at {:?}",
            self.state.store.capacity(),
            position.x,
            position.z,
            window.start()
        );

        if config.background_loader {
            self.loader = Some(Loader::spawn(Arc::clone(&self.state))?);
            self.lifecycle = Lifecycle::Running;
        } else {
            self.lifecycle = Lifecycle::Inline;
        }
        Ok(())
    }

    /// Moves the window toward `position` and enqueues the cells entering it.
    ///
    /// Returns the number of requests enqueued; zero when the viewpoint is
    /// still inside the current band.
    pub fn optimize_for_position(&self, position: Vec3) -> StreamResult<usize> {
        self.ensure_active()?;

        let mut window = self.state.window.write();
        let Some(shift) = window.reconcile(ground_plane(position)) else {
            return Ok(0);
        };

        let count = shift.entered.len();
        self.state.queue.extend(shift.entered);
        *window = shift.window;
        self.state.counters.add_requested(count);

        debug!(
            "Window moved to {:?}, {} cells requested",
            shift.window.start(),
            count
        );
        Ok(count)
    }

    /// Services pending requests on the calling thread.
    ///
    /// Each request present when the call starts is serviced once. Returns
    /// the number of cells loaded. The queue has a single servicer, so this
    /// fails with [`StreamError::LoaderRunning`] while the background loader
    /// is active.
    pub fn pump_load_queue(&self) -> StreamResult<usize> {
        self.ensure_active()?;
        if self.lifecycle == Lifecycle::Running {
            warn!("pump_load_queue called while the background loader is running");
            return Err(StreamError::LoaderRunning);
        }
        Ok(self.state.drain())
    }

    /// Uploads and draws every live cell within range of the camera.
    ///
    /// The range is `draw_distance` plus half a cell diagonal, measured on
    /// the ground plane from the cell center. Cells mid-load are skipped.
    /// Returns the number of cells drawn.
    pub fn draw_active_cells(
        &mut self,
        camera: Vec3,
        draw_distance: f32,
        backend: &mut R,
    ) -> usize {
        let cell_size = self.state.config.cell_size as f32;
        let threshold = draw_distance + cell_size * FRAC_1_SQRT_2;
        let camera = ground_plane(camera);
        let half = Vec2::splat(cell_size * 0.5);

        let mut drawn = 0;
        for (slot, cell) in self.state.store.iter().enumerate() {
            let mut cell = cell.lock();
            if !cell.is_drawable() {
                continue;
            }
            if (cell.origin() + half).distance(camera) >= threshold {
                continue;
            }
            let Some(buffer) = self.buffers.get_mut(slot) else {
                continue;
            };

            if let Some(existing) = buffer.as_mut() {
                if cell.needs_refresh() {
                    backend.refresh(existing, cell.geometry());
                }
            } else {
                *buffer = Some(backend.upload(cell.geometry()));
            }
            cell.mark_uploaded();

            if let Some(buffer) = buffer.as_ref() {
                backend.draw(buffer);
                drawn += 1;
            }
        }
        drawn
    }

    /// Stops the loader and waits for it to exit.
    pub fn stop(&mut self) -> StreamResult<()> {
        match self.lifecycle {
            Lifecycle::Idle => {
                warn!("stop called before initialize_for_position");
                return Err(StreamError::NotInitialized);
            },
            Lifecycle::Stopped => {
                warn!("stop called twice");
                return Err(StreamError::AlreadyStopped);
            },
            Lifecycle::Inline | Lifecycle::Running => {},
        }

        self.lifecycle = Lifecycle::Stopped;
        self.join_loader()?;
        info!("Cell manager stopped");
        Ok(())
    }

    fn join_loader(&mut self) -> StreamResult<()> {
        self.state.stopping.store(true, Ordering::Release);
        match self.loader.take() {
            Some(loader) => loader.join(),
            None => Ok(()),
        }
    }

    fn ensure_active(&self) -> StreamResult<()> {
        match self.lifecycle {
            Lifecycle::Idle => Err(StreamError::NotInitialized),
            Lifecycle::Stopped => Err(StreamError::AlreadyStopped),
            Lifecycle::Inline | Lifecycle::Running => Ok(()),
        }
    }

    /// Minimum corner of the current window.
    #[must_use]
    pub fn grid_start(&self) -> Vec2 {
        self.state.window.read().start()
    }

    /// Copy of the current window.
    #[must_use]
    pub fn window(&self) -> GridWindow {
        *self.state.window.read()
    }

    /// Number of requests waiting in the queue.
    #[must_use]
    pub fn pending_requests(&self) -> usize {
        self.state.queue.len()
    }

    /// Origins of every live or loading cell, in slot order.
    #[must_use]
    pub fn resident_origins(&self) -> Vec<Vec2> {
        self.state
            .store
            .snapshots()
            .into_iter()
            .filter(|cell| cell.live || cell.loading)
            .map(|cell| cell.origin)
            .collect()
    }

    /// State of every slot, in slot order.
    #[must_use]
    pub fn cell_snapshots(&self) -> Vec<CellSnapshot> {
        self.state.store.snapshots()
    }

    /// Streaming counters.
    #[must_use]
    pub fn stats(&self) -> StreamStats {
        self.state.counters.snapshot()
    }

    /// Number of cell slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.state.store.capacity()
    }

    /// Construction parameters.
    #[must_use]
    pub fn config(&self) -> &StreamingConfig {
        &self.state.config
    }

    /// The heightmap cells are built from.
    #[must_use]
    pub fn heightmap(&self) -> &Arc<Heightmap> {
        &self.state.heightmap
    }

    /// Returns true while the background loader thread is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.lifecycle == Lifecycle::Running
            && self.loader.as_ref().is_some_and(|loader| !loader.is_finished())
    }
}

impl<R: RenderBackend> Drop for CellManager<R> {
    fn drop(&mut self) {
        if self.loader.is_some() {
            if let Err(e) = self.join_loader() {
                warn!("Loader did not shut down cleanly: {}", e);
            }
        }
    }
}
