//! Error types for Terrastream.

use thiserror::Error;

/// Errors reported by the cell manager lifecycle.
///
/// Edge conditions inside streaming (stale requests, full store, out of
/// bounds rectangles) are not errors and never surface here.
#[derive(Debug, Error)]
pub enum StreamError {
    /// An operation that needs a resident window ran before initialization
    #[error("Cell manager has not been initialized for a position")]
    NotInitialized,

    /// `initialize_for_position` ran on a manager that was already started
    #[error("Cell manager is already initialized")]
    AlreadyInitialized,

    /// `stop` ran on a manager that was already stopped
    #[error("Cell manager is already stopped")]
    AlreadyStopped,

    /// The queue was pumped while the background loader owns it
    #[error("Load queue is serviced by the background loader")]
    LoaderRunning,

    /// Construction parameters are unusable
    #[error("Invalid streaming config: {0}")]
    InvalidConfig(String),

    /// The loader thread could not be spawned
    #[error("Failed to spawn loader thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// The loader thread panicked before it could be joined
    #[error("Loader thread panicked")]
    LoaderPanicked,
}

/// Errors raised while loading or generating a heightmap.
#[derive(Debug, Error)]
pub enum HeightmapError {
    /// The image could not be opened or decoded
    #[error("Failed to read heightmap image: {0}")]
    Image(String),

    /// The image format or color type cannot be decoded
    #[error("Unsupported heightmap format: {0}")]
    UnsupportedFormat(String),

    /// Sample buffer does not match the declared dimensions
    #[error("Heightmap dimensions {width}x{height} do not match {samples} samples")]
    Dimensions {
        /// Declared width
        width: u32,
        /// Declared height
        height: u32,
        /// Number of samples supplied
        samples: usize,
    },
}

/// Result type alias for cell manager operations.
pub type StreamResult<T> = Result<T, StreamError>;
