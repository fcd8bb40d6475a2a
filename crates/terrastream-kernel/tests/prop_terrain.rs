use glam::Vec3;
use proptest::prelude::*;
use terrastream_common::PixelRect;
use terrastream_kernel::{GridMeshBuilder, Heightmap, MeshBuilder, TerrainMesh, SAMPLE_MAX};

fn arb_heightmap() -> impl Strategy<Value = Heightmap> {
    (2u32..12, 2u32..12).prop_flat_map(|(w, h)| {
        prop::collection::vec(any::<u16>(), (w * h) as usize)
            .prop_map(move |samples| Heightmap::new(w, h, samples).expect("sized"))
    })
}

proptest! {
    #[test]
    fn prop_height_within_sample_range(
        map in arb_heightmap(),
        x in -50.0_f32..150.0,
        z in -50.0_f32..150.0,
        vertical in 1.0_f32..500.0,
    ) {
        let dims = Vec3::new(100.0, vertical, 100.0);
        let h = map.terrain_height_at(Vec3::new(x, 0.0, z), dims);

        let lo = f32::from(*map.samples().iter().min().expect("non-empty"));
        let hi = f32::from(*map.samples().iter().max().expect("non-empty"));
        let eps = vertical * 1e-4;
        prop_assert!(h >= lo / SAMPLE_MAX * vertical - eps);
        prop_assert!(h <= hi / SAMPLE_MAX * vertical + eps);
    }

    #[test]
    fn prop_two_triangles_per_quad(
        map in arb_heightmap(),
        x0 in 0u32..12,
        y0 in 0u32..12,
        size in 1u32..12,
    ) {
        let rect = PixelRect::for_cell(
            glam::Vec2::new(x0 as f32, y0 as f32),
            size,
            map.width(),
            map.height(),
        );
        let mut mesh = TerrainMesh::new();
        match rect {
            Some(rect) => {
                GridMeshBuilder.build(&mut mesh, &map, rect, Vec3::ONE);
                let quads = (rect.quads_x() * rect.quads_y()) as usize;
                prop_assert_eq!(mesh.triangle_count(), quads * 2);
                prop_assert_eq!(mesh.vertices().len(), quads * 6);
                prop_assert!(mesh
                    .vertices()
                    .iter()
                    .all(|v| v.normal().is_finite() && v.position().y <= 1.0));
            },
            None => prop_assert!(x0 >= map.width() - 1 || y0 >= map.height() - 1),
        }
    }
}
