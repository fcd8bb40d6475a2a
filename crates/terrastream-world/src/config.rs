//! Streaming configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use terrastream_common::{StreamError, StreamResult};

/// Default half-window extent in cells.
pub const DEFAULT_HALF_EXTENT: u32 = 4;

/// Default cell edge length in heightmap pixels.
pub const DEFAULT_CELL_SIZE: u32 = 64;

/// Default vertical scale applied to normalized heights.
pub const DEFAULT_HEIGHT_SCALE: f32 = 100.0;

/// Default loader sleep when the queue is empty.
pub const DEFAULT_IDLE_SLEEP_MS: u64 = 10;

/// What the loader does with a request when every slot is occupied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FullStorePolicy {
    /// Discard the request. A later window shift re-requests the origin if
    /// it is still needed.
    #[default]
    Drop,
    /// Push the request to the back of the queue.
    Requeue,
}

/// Cell manager construction parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Half-window extent `N`: the window is `2N x 2N` cells
    pub half_extent: u32,
    /// Cell edge length in heightmap pixels (one pixel per world unit)
    pub cell_size: u32,
    /// Vertical scale applied to normalized heightmap samples
    pub height_scale: f32,
    /// Loader sleep in milliseconds while the queue is empty
    pub idle_sleep_ms: u64,
    /// Behavior when no slot is free for a request
    pub full_store_policy: FullStorePolicy,
    /// Spawn a background loader thread on initialization.
    /// When false, the caller drains the queue with `pump_load_queue`.
    pub background_loader: bool,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            half_extent: DEFAULT_HALF_EXTENT,
            cell_size: DEFAULT_CELL_SIZE,
            height_scale: DEFAULT_HEIGHT_SCALE,
            idle_sleep_ms: DEFAULT_IDLE_SLEEP_MS,
            full_store_policy: FullStorePolicy::Drop,
            background_loader: true,
        }
    }
}

impl StreamingConfig {
    /// Creates a config with the given window extent and cell size.
    #[must_use]
    pub fn new(half_extent: u32, cell_size: u32) -> Self {
        Self {
            half_extent,
            cell_size,
            ..Default::default()
        }
    }

    /// Returns the config with the background loader disabled.
    #[must_use]
    pub fn inline(mut self) -> Self {
        self.background_loader = false;
        self
    }

    /// Number of cell slots: `4 * N^2`.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        4 * (self.half_extent as usize) * (self.half_extent as usize)
    }

    /// Cells along one side of the window: `2 * N`.
    #[must_use]
    pub const fn cells_per_side(&self) -> u32 {
        2 * self.half_extent
    }

    /// Loader sleep while idle.
    #[must_use]
    pub const fn idle_sleep(&self) -> Duration {
        Duration::from_millis(self.idle_sleep_ms)
    }

    /// Checks that the parameters describe a usable window.
    pub fn validate(&self) -> StreamResult<()> {
        if self.half_extent == 0 {
            return Err(StreamError::InvalidConfig(
                "half_extent must be at least 1".into(),
            ));
        }
        if self.half_extent > 64 {
            return Err(StreamError::InvalidConfig(format!(
                "half_extent {} exceeds 64",
                self.half_extent
            )));
        }
        if self.cell_size == 0 {
            return Err(StreamError::InvalidConfig(
                "cell_size must be at least 1".into(),
            ));
        }
        if !self.height_scale.is_finite() {
            return Err(StreamError::InvalidConfig(
                "height_scale must be finite".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StreamingConfig::default();
        assert_eq!(config.capacity(), 64);
        assert_eq!(config.cells_per_side(), 8);
        assert!(config.background_loader);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_configs() {
        assert!(StreamingConfig::new(0, 16).validate().is_err());
        assert!(StreamingConfig::new(2, 0).validate().is_err());
        assert!(StreamingConfig::new(65, 16).validate().is_err());

        let mut config = StreamingConfig::new(2, 16);
        config.height_scale = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = StreamingConfig::new(3, 32).inline();
        config.full_store_policy = FullStorePolicy::Requeue;

        let text = toml::to_string_pretty(&config).expect("serialize");
        assert!(text.contains("full_store_policy = \"requeue\""));

        let loaded: StreamingConfig = toml::from_str(&text).expect("deserialize");
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let loaded: StreamingConfig = toml::from_str("cell_size = 16").expect("deserialize");
        assert_eq!(loaded.cell_size, 16);
        assert_eq!(loaded.half_extent, DEFAULT_HALF_EXTENT);
        assert_eq!(loaded.full_store_policy, FullStorePolicy::Drop);
    }
}
