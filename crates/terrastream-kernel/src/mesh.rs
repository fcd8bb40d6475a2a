//! Terrain mesh building.
//!
//! Turns an inclusive rectangle of heightmap pixels into flat-shaded
//! triangle geometry. Every sampled pixel becomes a grid point at
//! `(x * scale.x, normalized_height * scale.y, y * scale.z)` and every pixel
//! quad becomes two triangles:
//!
//! ```text
//!    0 -- 3
//!    |  / |
//!    | /  |
//!    1 -- 2
//! ```
//!
//! Flat shading gives each face its own three vertices carrying the face
//! normal. Normals are the negated `(b - a) x (c - a)` of each triangle
//! because the terrain is viewed from above with this winding.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use terrastream_common::PixelRect;

use crate::heightmap::Heightmap;

/// Vertex layout uploaded to render backends.
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct TerrainVertex {
    /// Object-space position
    pub position: [f32; 3],
    /// Face normal
    pub normal: [f32; 3],
}

impl TerrainVertex {
    /// Creates a vertex from a position and normal.
    #[must_use]
    pub fn new(position: Vec3, normal: Vec3) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
        }
    }

    /// Returns the position as a vector.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    /// Returns the normal as a vector.
    #[must_use]
    pub fn normal(&self) -> Vec3 {
        Vec3::from_array(self.normal)
    }
}

/// Indexed triangle geometry for one terrain cell.
///
/// Buffers are cleared and refilled on rebuild so a reused mesh keeps its
/// allocation.
#[derive(Debug, Clone, Default)]
pub struct TerrainMesh {
    vertices: Vec<TerrainVertex>,
    indices: Vec<u32>,
}

impl TerrainMesh {
    /// Creates an empty mesh.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes all geometry, keeping the allocation.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }

    /// Returns true if the mesh has no triangles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Returns the vertices.
    #[must_use]
    pub fn vertices(&self) -> &[TerrainVertex] {
        &self.vertices
    }

    /// Returns the triangle indices.
    #[must_use]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Returns the number of triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Returns the vertex data as raw bytes for upload.
    #[must_use]
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Returns the index data as raw bytes for upload.
    #[must_use]
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Appends one flat-shaded triangle.
    #[allow(clippy::cast_possible_truncation)]
    pub fn push_flat_triangle(&mut self, a: Vec3, b: Vec3, c: Vec3) {
        let normal = -(b - a).cross(c - a).normalize_or_zero();
        let base = self.vertices.len() as u32;
        self.vertices.push(TerrainVertex::new(a, normal));
        self.vertices.push(TerrainVertex::new(b, normal));
        self.vertices.push(TerrainVertex::new(c, normal));
        self.indices.extend_from_slice(&[base, base + 1, base + 2]);
    }
}

/// Builds cell geometry from a heightmap region.
///
/// Implementations are called from the loader thread.
pub trait MeshBuilder: Send + Sync {
    /// Fills `out` with geometry for `rect`, scaled by `scale`.
    ///
    /// `out` is cleared first. A degenerate rectangle leaves it empty.
    fn build(&self, out: &mut TerrainMesh, heightmap: &Heightmap, rect: PixelRect, scale: Vec3);
}

/// Regular-grid builder producing two flat-shaded triangles per pixel quad.
#[derive(Debug, Clone, Copy, Default)]
pub struct GridMeshBuilder;

impl MeshBuilder for GridMeshBuilder {
    fn build(&self, out: &mut TerrainMesh, heightmap: &Heightmap, rect: PixelRect, scale: Vec3) {
        out.clear();
        if rect.is_degenerate() {
            return;
        }

        let quads = (rect.quads_x() as usize) * (rect.quads_y() as usize);
        out.vertices.reserve(quads * 6);
        out.indices.reserve(quads * 6);

        let point = |x: u32, y: u32| {
            Vec3::new(x as f32, heightmap.normalized(x, y), y as f32) * scale
        };

        for x in rect.x_start..rect.x_end {
            for y in rect.y_start..rect.y_end {
                let top_left = point(x, y);
                let bottom_left = point(x, y + 1);
                let top_right = point(x + 1, y);
                let bottom_right = point(x + 1, y + 1);

                out.push_flat_triangle(top_left, bottom_left, top_right);
                out.push_flat_triangle(top_right, bottom_left, bottom_right);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_terrain() {
        let map = Heightmap::flat(8, 8, u16::MAX / 2);
        let mut mesh = TerrainMesh::new();
        GridMeshBuilder.build(&mut mesh, &map, PixelRect::new(0, 0, 4, 2), Vec3::ONE);

        // 4 x 2 quads, two triangles each
        assert_eq!(mesh.triangle_count(), 16);
        assert_eq!(mesh.vertices().len(), 48);
        for v in mesh.vertices() {
            assert!((v.normal() - Vec3::NEG_Y).length() < 1e-6);
            assert!((v.position().y - 0.5).abs() < 1e-4);
        }
    }

    #[test]
    fn test_scaled_positions() {
        let map = Heightmap::flat(8, 8, u16::MAX);
        let mut mesh = TerrainMesh::new();
        let scale = Vec3::new(2.0, 10.0, 3.0);
        GridMeshBuilder.build(&mut mesh, &map, PixelRect::new(1, 1, 3, 3), scale);

        let first = mesh.vertices()[0].position();
        assert_eq!(first, Vec3::new(2.0, 10.0, 3.0));

        let max = mesh
            .vertices()
            .iter()
            .map(TerrainVertex::position)
            .fold(Vec3::splat(f32::MIN), Vec3::max);
        assert_eq!(max, Vec3::new(6.0, 10.0, 9.0));
    }

    #[test]
    fn test_sloped_normals_flip() {
        // Rising along x: the upward-facing normal would tilt toward -x
        let map = Heightmap::from_fn(4, 4, |x, _| (x * 10_000) as u16);
        let mut mesh = TerrainMesh::new();
        GridMeshBuilder.build(&mut mesh, &map, PixelRect::new(0, 0, 1, 1), Vec3::ONE);

        let n = mesh.vertices()[0].normal();
        assert!(n.y < 0.0);
        assert!(n.x > 0.0);
        assert!((n.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_degenerate_rect_is_empty() {
        let map = Heightmap::flat(8, 8, 0);
        let mut mesh = TerrainMesh::new();
        GridMeshBuilder.build(&mut mesh, &map, PixelRect::new(0, 0, 4, 2), Vec3::ONE);
        assert!(!mesh.is_empty());

        GridMeshBuilder.build(&mut mesh, &map, PixelRect::new(3, 0, 3, 2), Vec3::ONE);
        assert!(mesh.is_empty());
        assert!(mesh.vertices().is_empty());
    }

    #[test]
    fn test_bytes_match_counts() {
        let map = Heightmap::flat(4, 4, 0);
        let mut mesh = TerrainMesh::new();
        GridMeshBuilder.build(&mut mesh, &map, PixelRect::new(0, 0, 1, 1), Vec3::ONE);
        assert_eq!(mesh.vertex_bytes().len(), 6 * 24);
        assert_eq!(mesh.index_bytes().len(), 6 * 4);
    }
}
