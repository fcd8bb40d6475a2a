//! # Terrastream Engine
//!
//! Headless driver for terrain cell streaming.
//!
//! This crate ties the workspace together:
//! - Kernel: heightmap loading or generation, mesh building, headless rendering
//! - World: the cell manager streaming cells around the camera
//!
//! Usage: `terrastream [config.toml]`. Without an argument the config is read
//! from `terrastream.toml` in the working directory, falling back to
//! defaults.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod app;
mod config;
mod flythrough;

use std::path::PathBuf;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{EngineConfig, CONFIG_FILE};

/// Main entry point.
fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("terrastream=info".parse()?))
        .init();

    info!("Terrastream starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config_path = std::env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from(CONFIG_FILE), PathBuf::from);
    let mut config = EngineConfig::load_from(&config_path);
    config.validate();

    let summary = app::run(&config)?;

    info!(
        "Terrastream shutdown complete: {} cell draws, {} bytes uploaded",
        summary.cells_drawn, summary.render.bytes_uploaded
    );
    Ok(())
}
