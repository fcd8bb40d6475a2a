//! Coordinate helpers for world, ground-plane, and heightmap pixel space.
//!
//! World space is Y-up. Terrain cells live on the X/Z ground plane, so a
//! cell origin is a `Vec2` holding world `(x, z)`. Heightmap pixels map one
//! to one onto ground-plane units.

use glam::{Vec2, Vec3};

/// Projects a world-space position onto the ground plane as `(x, z)`.
#[must_use]
pub fn ground_plane(position: Vec3) -> Vec2 {
    Vec2::new(position.x, position.z)
}

/// Inclusive rectangle of heightmap pixels.
///
/// Both end coordinates are sampled, so a rectangle spanning `n` pixel quads
/// along an axis covers `n + 1` samples on that axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelRect {
    /// First sampled column
    pub x_start: u32,
    /// First sampled row
    pub y_start: u32,
    /// Last sampled column (inclusive)
    pub x_end: u32,
    /// Last sampled row (inclusive)
    pub y_end: u32,
}

impl PixelRect {
    /// Creates a new pixel rectangle.
    #[must_use]
    pub const fn new(x_start: u32, y_start: u32, x_end: u32, y_end: u32) -> Self {
        Self {
            x_start,
            y_start,
            x_end,
            y_end,
        }
    }

    /// Number of pixel quads along X.
    #[must_use]
    pub const fn quads_x(&self) -> u32 {
        self.x_end.saturating_sub(self.x_start)
    }

    /// Number of pixel quads along Y.
    #[must_use]
    pub const fn quads_y(&self) -> u32 {
        self.y_end.saturating_sub(self.y_start)
    }

    /// Returns true if the rectangle contains no pixel quad.
    #[must_use]
    pub const fn is_degenerate(&self) -> bool {
        self.x_end <= self.x_start || self.y_end <= self.y_start
    }

    /// Maps a cell footprint onto a heightmap of the given size.
    ///
    /// The origin is rounded to the nearest pixel and the footprint
    /// `[origin, origin + cell_size]` is intersected with the valid sample
    /// range `[0, width - 1] x [0, height - 1]`. Returns `None` when nothing
    /// of the footprint covers a pixel quad.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn for_cell(origin: Vec2, cell_size: u32, width: u32, height: u32) -> Option<Self> {
        if width < 2 || height < 2 {
            return None;
        }

        let size = i64::from(cell_size);
        let ox = origin.x.round() as i64;
        let oy = origin.y.round() as i64;

        let x_start = ox.max(0);
        let y_start = oy.max(0);
        let x_end = (ox + size).min(i64::from(width) - 1);
        let y_end = (oy + size).min(i64::from(height) - 1);

        if x_end <= x_start || y_end <= y_start {
            return None;
        }

        Some(Self::new(
            x_start as u32,
            y_start as u32,
            x_end as u32,
            y_end as u32,
        ))
    }
}
