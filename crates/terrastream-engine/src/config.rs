//! Engine configuration.
//!
//! Covers terrain source, streaming and the scripted flythrough.
//! Configuration can be loaded from and saved to a TOML file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use terrastream_kernel::GeneratorConfig;
use terrastream_world::StreamingConfig;
use tracing::{info, warn};

/// Configuration file name.
pub const CONFIG_FILE: &str = "terrastream.toml";

/// Engine configuration parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // === Terrain Settings ===
    /// Heightmap image to stream (None = generate one)
    pub heightmap_path: Option<PathBuf>,
    /// Seed for the generated heightmap
    pub seed: u32,
    /// Generated heightmap edge length in pixels
    pub map_size: u32,
    /// Generated terrain feature scale (larger = smoother)
    pub terrain_scale: f64,

    // === Streaming Settings ===
    /// Distance from the camera within which cells are drawn
    pub draw_distance: f32,

    // === Flythrough Settings ===
    /// Camera speed in world units per frame
    pub speed: f32,
    /// Initial heading in degrees, measured from +x toward +z
    pub heading_degrees: f32,
    /// Heading change per frame in degrees
    pub turn_rate_degrees: f32,
    /// Camera height above the terrain
    pub camera_height: f32,
    /// Number of frames to run
    pub frames: u32,
    /// Sleep between frames in milliseconds (0 = run flat out)
    pub tick_ms: u64,
    /// Log streaming stats every this many frames (0 = only at the end)
    pub report_interval: u32,

    /// Cell manager parameters
    pub streaming: StreamingConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            // Terrain
            heightmap_path: None,
            seed: 12345,
            map_size: 1024,
            terrain_scale: 200.0,

            // Streaming
            draw_distance: 192.0,

            // Flythrough
            speed: 4.0,
            heading_degrees: 30.0,
            turn_rate_degrees: 0.25,
            camera_height: 20.0,
            frames: 600,
            tick_ms: 16,
            report_interval: 120,

            streaming: StreamingConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file {} not found, using defaults", path.display());
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    info!("Loaded config from {}", path.display());
                    config
                },
                Err(e) => {
                    warn!("Failed to parse config file: {e}");
                    Self::default()
                },
            },
            Err(e) => {
                warn!("Failed to read config file: {e}");
                Self::default()
            },
        }
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(path, contents)?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        // Terrain
        self.map_size = self.map_size.clamp(16, 16_384);
        self.terrain_scale = self.terrain_scale.clamp(1.0, 10_000.0);

        // Streaming
        self.streaming.half_extent = self.streaming.half_extent.clamp(1, 64);
        self.streaming.cell_size = self.streaming.cell_size.clamp(2, 1024);
        self.streaming.idle_sleep_ms = self.streaming.idle_sleep_ms.clamp(1, 1000);
        if !self.streaming.height_scale.is_finite() {
            self.streaming.height_scale = StreamingConfig::default().height_scale;
        }
        self.draw_distance = self.draw_distance.max(0.0);

        // Flythrough
        self.speed = self.speed.clamp(0.0, 1024.0);
        self.camera_height = self.camera_height.max(0.0);
        self.tick_ms = self.tick_ms.min(1000);
    }

    /// Parameters for the generated heightmap.
    #[must_use]
    pub fn generator(&self) -> GeneratorConfig {
        GeneratorConfig {
            seed: self.seed,
            width: self.map_size,
            height: self.map_size,
            terrain_scale: self.terrain_scale,
            ..Default::default()
        }
    }
}
