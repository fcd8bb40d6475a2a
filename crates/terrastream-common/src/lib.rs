//! # Terrastream Common
//!
//! Common types and shared abstractions for Terrastream.
//!
//! This crate provides foundational types used across the workspace:
//! - Ground-plane and pixel-space coordinate helpers
//! - Common error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod coords;
pub mod error;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::coords::*;
    pub use crate::error::*;
}

pub use prelude::*;
