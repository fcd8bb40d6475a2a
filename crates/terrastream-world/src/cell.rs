//! Streamable terrain cells.

use glam::Vec2;
use terrastream_kernel::TerrainMesh;

/// One square patch of terrain held in a store slot.
///
/// Flags move through `empty -> loading -> live -> not live` and the cell is
/// overwritten in place by the next load. `loading` and `live` are never
/// both set.
#[derive(Debug, Default)]
pub struct Cell {
    /// Ground-plane `(x, z)` of the lower corner
    pub(crate) origin: Vec2,
    /// Geometry for the footprint, rebuilt on each load
    pub(crate) geometry: TerrainMesh,
    /// Set while a load is in progress so the cell is not drawn mid-build
    pub(crate) loading: bool,
    /// Set once loaded; cleared on eviction
    pub(crate) live: bool,
    /// Set after a load so the render side re-uploads the geometry
    pub(crate) needs_refresh: bool,
}

impl Cell {
    /// Returns the cell origin.
    #[must_use]
    pub const fn origin(&self) -> Vec2 {
        self.origin
    }

    /// Returns the cell geometry.
    #[must_use]
    pub const fn geometry(&self) -> &TerrainMesh {
        &self.geometry
    }

    /// Returns true while a load is in progress.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    /// Returns true if the cell is loaded and not evicted.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        self.live
    }

    /// Returns true if the geometry changed since the last upload.
    #[must_use]
    pub const fn needs_refresh(&self) -> bool {
        self.needs_refresh
    }

    /// Live and not mid-load.
    #[must_use]
    pub const fn is_drawable(&self) -> bool {
        self.live && !self.loading
    }

    /// Live or mid-load: the slot is taken.
    #[must_use]
    pub const fn is_resident(&self) -> bool {
        self.live || self.loading
    }

    /// Claims the cell for a load at `origin`.
    ///
    /// Hands the old geometry out so it can be rebuilt without holding the
    /// slot.
    pub(crate) fn begin_load(&mut self, origin: Vec2) -> TerrainMesh {
        self.origin = origin;
        self.live = false;
        self.loading = true;
        std::mem::take(&mut self.geometry)
    }

    /// Installs rebuilt geometry and makes the cell live.
    pub(crate) fn finish_load(&mut self, geometry: TerrainMesh) {
        self.geometry = geometry;
        self.needs_refresh = true;
        self.loading = false;
        self.live = true;
    }

    /// Clears `needs_refresh` after the render side picked up the geometry.
    pub(crate) fn mark_uploaded(&mut self) {
        self.needs_refresh = false;
    }

    /// Marks the cell not live. Geometry is kept until the slot is reused.
    pub(crate) fn evict(&mut self) {
        self.live = false;
    }

    /// Copies the flags for inspection.
    #[must_use]
    pub fn snapshot(&self) -> CellSnapshot {
        CellSnapshot {
            origin: self.origin,
            loading: self.loading,
            live: self.live,
            needs_refresh: self.needs_refresh,
            triangles: self.geometry.triangle_count(),
        }
    }
}

/// Point-in-time copy of one slot's state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellSnapshot {
    /// Cell origin
    pub origin: Vec2,
    /// Load in progress
    pub loading: bool,
    /// Loaded and not evicted
    pub live: bool,
    /// Awaiting upload
    pub needs_refresh: bool,
    /// Triangles in the current geometry
    pub triangles: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle() {
        let mut cell = Cell::default();
        assert!(!cell.is_resident());

        let mesh = cell.begin_load(Vec2::new(16.0, -32.0));
        assert!(cell.is_loading());
        assert!(!cell.is_live());
        assert!(!cell.is_drawable());
        assert_eq!(cell.origin(), Vec2::new(16.0, -32.0));

        cell.finish_load(mesh);
        assert!(cell.is_drawable());
        assert!(cell.needs_refresh());

        cell.evict();
        assert!(!cell.is_resident());
        assert_eq!(cell.origin(), Vec2::new(16.0, -32.0));
    }

    #[test]
    fn test_begin_load_clears_live() {
        let mut cell = Cell::default();
        let mesh = cell.begin_load(Vec2::ZERO);
        cell.finish_load(mesh);

        let _ = cell.begin_load(Vec2::ONE);
        let snap = cell.snapshot();
        assert!(snap.loading && !snap.live);
    }
}
