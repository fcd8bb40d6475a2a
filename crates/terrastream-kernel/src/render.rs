//! Render backend seam.
//!
//! The streaming core hands finished cell geometry to a backend and keeps the
//! returned buffer handle opaque. It re-uploads only when a cell's geometry
//! was rebuilt since the last upload.

use tracing::trace;

use crate::mesh::TerrainMesh;

/// A render backend able to upload and draw terrain meshes.
///
/// Backends are driven from the caller's render thread only.
pub trait RenderBackend {
    /// Opaque GPU-side handle for one uploaded mesh.
    type Buffer;

    /// Uploads a mesh and returns a new buffer handle.
    fn upload(&mut self, mesh: &TerrainMesh) -> Self::Buffer;

    /// Replaces the contents of an existing buffer.
    ///
    /// The default uploads a fresh buffer over the old one.
    fn refresh(&mut self, buffer: &mut Self::Buffer, mesh: &TerrainMesh) {
        *buffer = self.upload(mesh);
    }

    /// Submits a draw of an uploaded buffer.
    fn draw(&mut self, buffer: &Self::Buffer);
}

/// Buffer handle produced by [`HeadlessBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadlessBuffer {
    /// Unique upload id
    pub id: u64,
    /// Number of indices uploaded
    pub index_count: usize,
    /// Number of bytes uploaded (vertices + indices)
    pub byte_size: usize,
}

/// Frame counters collected by [`HeadlessBackend`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Buffers created
    pub uploads: u64,
    /// Buffers re-filled in place
    pub refreshes: u64,
    /// Draw calls submitted
    pub draws: u64,
    /// Triangles submitted
    pub triangles: u64,
    /// Bytes transferred by uploads and refreshes
    pub bytes_uploaded: u64,
}

/// Backend that records uploads and draws without a GPU.
///
/// Used by the headless driver and by tests.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    next_id: u64,
    stats: RenderStats,
}

impl HeadlessBackend {
    /// Creates a new headless backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the accumulated counters.
    #[must_use]
    pub const fn stats(&self) -> RenderStats {
        self.stats
    }

    /// Resets the accumulated counters.
    pub fn reset_stats(&mut self) {
        self.stats = RenderStats::default();
    }

    fn describe(&mut self, mesh: &TerrainMesh) -> HeadlessBuffer {
        self.next_id += 1;
        let byte_size = mesh.vertex_bytes().len() + mesh.index_bytes().len();
        self.stats.bytes_uploaded += byte_size as u64;
        HeadlessBuffer {
            id: self.next_id,
            index_count: mesh.indices().len(),
            byte_size,
        }
    }
}

impl RenderBackend for HeadlessBackend {
    type Buffer = HeadlessBuffer;

    fn upload(&mut self, mesh: &TerrainMesh) -> HeadlessBuffer {
        self.stats.uploads += 1;
        let buffer = self.describe(mesh);
        trace!("Uploaded buffer {} ({} bytes)", buffer.id, buffer.byte_size);
        buffer
    }

    fn refresh(&mut self, buffer: &mut HeadlessBuffer, mesh: &TerrainMesh) {
        self.stats.refreshes += 1;
        *buffer = self.describe(mesh);
    }

    fn draw(&mut self, buffer: &HeadlessBuffer) {
        self.stats.draws += 1;
        self.stats.triangles += (buffer.index_count / 3) as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heightmap::Heightmap;
    use crate::mesh::{GridMeshBuilder, MeshBuilder};
    use glam::Vec3;
    use terrastream_common::PixelRect;

    fn two_quads() -> TerrainMesh {
        let map = Heightmap::flat(4, 4, 0);
        let mut mesh = TerrainMesh::new();
        GridMeshBuilder.build(&mut mesh, &map, PixelRect::new(0, 0, 2, 1), Vec3::ONE);
        mesh
    }

    #[test]
    fn test_upload_and_draw() {
        let mut backend = HeadlessBackend::new();
        let mesh = two_quads();

        let buffer = backend.upload(&mesh);
        backend.draw(&buffer);
        backend.draw(&buffer);

        let stats = backend.stats();
        assert_eq!(stats.uploads, 1);
        assert_eq!(stats.draws, 2);
        assert_eq!(stats.triangles, 8);
        assert_eq!(buffer.index_count, 12);
    }

    #[test]
    fn test_refresh_replaces_buffer() {
        let mut backend = HeadlessBackend::new();
        let mut buffer = backend.upload(&TerrainMesh::new());
        assert_eq!(buffer.index_count, 0);

        backend.refresh(&mut buffer, &two_quads());
        assert_eq!(buffer.index_count, 12);
        assert_eq!(backend.stats().refreshes, 1);

        backend.reset_stats();
        assert_eq!(backend.stats(), RenderStats::default());
    }
}
