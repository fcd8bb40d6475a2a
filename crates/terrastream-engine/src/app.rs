//! Headless streaming run.
//!
//! Flies a camera over the terrain for a fixed number of frames, streaming
//! cells around it and drawing them through the headless backend.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use terrastream_kernel::{HeadlessBackend, Heightmap, RenderStats};
use terrastream_world::{CellManager, StreamStats};
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::flythrough::Flythrough;

/// Totals for a finished run.
#[derive(Debug, Clone, Copy)]
pub struct RunSummary {
    /// Frames simulated
    pub frames: u32,
    /// Cell draws summed over all frames
    pub cells_drawn: u64,
    /// Streaming counters at shutdown
    pub streaming: StreamStats,
    /// Backend counters at shutdown
    pub render: RenderStats,
    /// Wall-clock duration of the frame loop
    pub elapsed: Duration,
}

/// Loads the configured heightmap or generates one.
pub fn load_heightmap(config: &EngineConfig) -> Result<Heightmap> {
    match &config.heightmap_path {
        Some(path) => Heightmap::from_image_path(path)
            .with_context(|| format!("Failed to load heightmap {}", path.display())),
        None => Ok(Heightmap::generate(&config.generator())),
    }
}

/// Runs the flythrough to completion.
pub fn run(config: &EngineConfig) -> Result<RunSummary> {
    let heightmap = Arc::new(load_heightmap(config)?);
    let mut manager = CellManager::<HeadlessBackend>::with_grid_builder(
        config.streaming.clone(),
        Arc::clone(&heightmap),
    )?;
    let mut backend = HeadlessBackend::new();
    let mut flythrough = Flythrough::new(
        &heightmap,
        config.streaming.height_scale,
        config.speed,
        config.heading_degrees,
        config.turn_rate_degrees,
        config.camera_height,
    );

    manager.initialize_for_position(flythrough.camera(&heightmap))?;

    let tick = Duration::from_millis(config.tick_ms);
    let started = Instant::now();
    let mut cells_drawn = 0u64;

    for frame in 1..=config.frames {
        flythrough.advance();
        let camera = flythrough.camera(&heightmap);

        let requested = manager.optimize_for_position(camera)?;
        if requested > 0 {
            debug!("Frame {frame}: {requested} cells requested");
        }
        if !config.streaming.background_loader {
            manager.pump_load_queue()?;
        }

        let drawn = manager.draw_active_cells(camera, config.draw_distance, &mut backend);
        cells_drawn += drawn as u64;

        if config.report_interval > 0 && frame % config.report_interval == 0 {
            report(frame, &manager, &backend);
        }

        if !tick.is_zero() {
            thread::sleep(tick);
        }
    }

    manager.stop()?;

    let summary = RunSummary {
        frames: config.frames,
        cells_drawn,
        streaming: manager.stats(),
        render: backend.stats(),
        elapsed: started.elapsed(),
    };
    info!(
        "Streamed {} cells over {} frames in {:.2?} ({} stale, {} duplicate, {} store full)",
        summary.streaming.loaded,
        summary.frames,
        summary.elapsed,
        summary.streaming.stale,
        summary.streaming.duplicate,
        summary.streaming.store_full
    );
    Ok(summary)
}

fn report(frame: u32, manager: &CellManager<HeadlessBackend>, backend: &HeadlessBackend) {
    let stats = manager.stats();
    let render = backend.stats();
    info!(
        "Frame {frame}: window {:?}, {} pending, {} loaded, {} evicted, {} uploads, {} triangles",
        manager.grid_start(),
        manager.pending_requests(),
        stats.loaded,
        stats.evicted,
        render.uploads,
        render.triangles
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use terrastream_world::StreamingConfig;

    fn small_config() -> EngineConfig {
        EngineConfig {
            map_size: 128,
            terrain_scale: 40.0,
            draw_distance: 48.0,
            speed: 6.0,
            frames: 40,
            tick_ms: 0,
            report_interval: 0,
            streaming: StreamingConfig::new(2, 16).inline(),
            ..Default::default()
        }
    }

    #[test]
    fn test_inline_run_streams_cells() {
        let summary = run(&small_config()).expect("run");
        assert_eq!(summary.frames, 40);
        assert!(summary.streaming.loaded > 16);
        assert!(summary.streaming.evicted > 0);
        assert!(summary.render.draws > 0);
        assert_eq!(summary.cells_drawn, summary.render.draws);
    }

    #[test]
    fn test_background_run_completes() {
        let mut config = small_config();
        config.streaming.background_loader = true;
        config.streaming.idle_sleep_ms = 1;
        let summary = run(&config).expect("run");
        assert!(summary.streaming.loaded >= 16);
    }

    #[test]
    fn test_missing_heightmap_is_error() {
        let mut config = small_config();
        config.heightmap_path = Some("/nonexistent/heightmap.png".into());
        assert!(run(&config).is_err());
    }
}
