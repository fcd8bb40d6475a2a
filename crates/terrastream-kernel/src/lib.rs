//! # Terrastream Kernel
//!
//! Terrain data collaborators for the cell streaming core.
//!
//! This crate provides:
//! - 16-bit heightmap storage, image loading and procedural generation
//! - Bilinear terrain height sampling
//! - The mesh builder turning a pixel rectangle into flat-shaded geometry
//! - The render backend seam plus a headless backend
//!
//! ## Ownership
//!
//! Heightmaps are immutable once built and are shared by reference counting.
//! The streaming core only ever reads samples through a [`MeshBuilder`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod heightmap;
pub mod mesh;
pub mod render;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::heightmap::*;
    pub use crate::mesh::*;
    pub use crate::render::*;
}

pub use prelude::*;
