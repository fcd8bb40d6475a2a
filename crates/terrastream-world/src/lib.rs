//! # Terrastream World
//!
//! Streams square terrain cells around a moving viewpoint.
//!
//! This crate provides:
//! - A fixed-capacity cell store, allocated once and overwritten in place
//! - A sliding window that reports exactly the cells entering it
//! - A FIFO load queue serviced by a background loader thread
//! - Distance-based eviction and draw selection
//!
//! ## Architecture
//!
//! ```text
//! position -> GridWindow -> LoadQueue -> loader -> CellStore -> draw_active_cells
//! ```
//!
//! The caller thread owns the [`CellManager`]. The loader thread shares the
//! store, queue and window through reference-counted state with one lock
//! per slot, so drawing never waits for a load in progress.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod cell;
pub mod config;
pub mod loader;
pub mod manager;
pub mod queue;
pub mod store;
pub mod window;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::cell::*;
    pub use crate::config::*;
    pub use crate::loader::{StreamStats, LOADER_THREAD_NAME};
    pub use crate::manager::*;
    pub use crate::queue::*;
    pub use crate::store::*;
    pub use crate::window::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_matches_window() {
        let config = StreamingConfig::new(3, 32);
        let window = GridWindow::new(glam::Vec2::ZERO, 32.0, 3);
        assert_eq!(window.origins().count(), config.capacity());
        assert_eq!(CellStore::new(config.capacity()).capacity(), 36);
    }
}
