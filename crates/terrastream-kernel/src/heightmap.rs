//! 16-bit heightmap storage.
//!
//! A heightmap is a row-major grid of unsigned samples where `u16::MAX`
//! represents the top of the terrain. One pixel maps to one ground-plane unit
//! before world scaling.

use std::path::Path;

use glam::{Vec2, Vec3};
use noise::{NoiseFn, Perlin};
use terrastream_common::HeightmapError;
use tracing::info;

/// Normalization factor for 16-bit samples.
pub const SAMPLE_MAX: f32 = u16::MAX as f32;

/// Immutable grid of height samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heightmap {
    /// Width in pixels
    width: u32,
    /// Height in pixels
    height: u32,
    /// Row-major samples (`width * height`)
    samples: Vec<u16>,
}

impl Heightmap {
    /// Creates a heightmap from raw row-major samples.
    pub fn new(width: u32, height: u32, samples: Vec<u16>) -> Result<Self, HeightmapError> {
        if samples.len() != (width as usize) * (height as usize) {
            return Err(HeightmapError::Dimensions {
                width,
                height,
                samples: samples.len(),
            });
        }
        Ok(Self {
            width,
            height,
            samples,
        })
    }

    /// Creates a heightmap with every sample set to `value`.
    #[must_use]
    pub fn flat(width: u32, height: u32, value: u16) -> Self {
        Self {
            width,
            height,
            samples: vec![value; (width as usize) * (height as usize)],
        }
    }

    /// Creates a heightmap by evaluating `f(x, y)` for every pixel.
    #[must_use]
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> u16) -> Self {
        let mut samples = Vec::with_capacity((width as usize) * (height as usize));
        for y in 0..height {
            for x in 0..width {
                samples.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            samples,
        }
    }

    /// Loads a heightmap from an image file.
    ///
    /// Any format the `image` crate decodes is accepted; color images are
    /// converted to 16-bit luminance.
    pub fn from_image_path<P: AsRef<Path>>(path: P) -> Result<Self, HeightmapError> {
        let path = path.as_ref();
        let image = image::open(path).map_err(|e| match e {
            image::ImageError::Unsupported(err) => {
                HeightmapError::UnsupportedFormat(err.to_string())
            },
            other => HeightmapError::Image(other.to_string()),
        })?;
        let luma = image.to_luma16();
        let (width, height) = luma.dimensions();
        info!("Loaded {width}x{height} heightmap from {}", path.display());
        Self::new(width, height, luma.into_raw())
    }

    /// Generates a procedural heightmap.
    #[must_use]
    pub fn generate(config: &GeneratorConfig) -> Self {
        let terrain_noise = Perlin::new(config.seed);
        let detail_noise = Perlin::new(config.seed.wrapping_add(1));

        info!(
            "Generating {}x{} heightmap (seed={})",
            config.width, config.height, config.seed
        );

        Self::from_fn(config.width, config.height, |x, y| {
            let wx = f64::from(x) / config.terrain_scale;
            let wy = f64::from(y) / config.terrain_scale;

            let height = terrain_noise.get([wx, wy]);
            let detail = detail_noise.get([wx * 4.0, wy * 4.0]) * config.detail_weight;
            let combined = ((height + detail + 1.0) / 2.0).clamp(0.0, 1.0);

            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let sample = (combined * f64::from(u16::MAX)).round() as u16;
            sample
        })
    }

    /// Returns the width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Returns true if the heightmap holds no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Returns the raw row-major samples.
    #[must_use]
    pub fn samples(&self) -> &[u16] {
        &self.samples
    }

    /// Returns the sample at a pixel, clamping coordinates to the grid.
    ///
    /// An empty heightmap samples as zero.
    #[must_use]
    pub fn sample(&self, x: u32, y: u32) -> u16 {
        if self.is_empty() {
            return 0;
        }
        let x = x.min(self.width - 1) as usize;
        let y = y.min(self.height - 1) as usize;
        self.samples[y * self.width as usize + x]
    }

    /// Returns the sample at a pixel normalized to `[0, 1]`.
    #[must_use]
    pub fn normalized(&self, x: u32, y: u32) -> f32 {
        f32::from(self.sample(x, y)) / SAMPLE_MAX
    }

    /// Returns the terrain height at a world position.
    ///
    /// `dimensions` is the world-space extent of the whole heightmap: the
    /// terrain spans `(0, 0, 0)` to `dimensions`. Samples are bilinearly
    /// interpolated and positions outside the terrain clamp to its edge.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn terrain_height_at(&self, position: Vec3, dimensions: Vec3) -> f32 {
        if self.width < 2 || self.height < 2 {
            return 0.0;
        }

        let unscaled = position / dimensions;
        let max_px = Vec2::new((self.width - 1) as f32, (self.height - 1) as f32);
        let pixel = (Vec2::new(unscaled.x, unscaled.z) * max_px).clamp(Vec2::ZERO, max_px);

        let base = pixel
            .floor()
            .min(max_px - Vec2::ONE)
            .max(Vec2::ZERO);
        let st = pixel - base;
        let (bx, by) = (base.x as u32, base.y as u32);

        let h00 = f32::from(self.sample(bx, by));
        let h01 = f32::from(self.sample(bx, by + 1));
        let h10 = f32::from(self.sample(bx + 1, by));
        let h11 = f32::from(self.sample(bx + 1, by + 1));

        let near = h00 + (h01 - h00) * st.y;
        let far = h10 + (h11 - h10) * st.y;
        (near + (far - near) * st.x) / SAMPLE_MAX * dimensions.y
    }
}

/// Procedural heightmap configuration.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Noise seed
    pub seed: u32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Terrain scale (larger = smoother)
    pub terrain_scale: f64,
    /// Weight of the high-frequency detail layer
    pub detail_weight: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: 12345,
            width: 1024,
            height: 1024,
            terrain_scale: 200.0,
            detail_weight: 0.1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> Heightmap {
        // Height grows with x: 0, 1000, 2000, ...
        Heightmap::from_fn(8, 8, |x, _| (x * 1000) as u16)
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = Heightmap::new(4, 4, vec![0; 15]).expect_err("mismatch");
        assert!(matches!(err, HeightmapError::Dimensions { samples: 15, .. }));
    }

    #[test]
    fn test_sample_clamps() {
        let map = ramp();
        assert_eq!(map.sample(3, 2), 3000);
        assert_eq!(map.sample(100, 100), 7000);
    }

    #[test]
    fn test_empty_heightmap() {
        let map = Heightmap::flat(0, 0, 0);
        assert!(map.is_empty());
        assert_eq!(map.sample(0, 0), 0);
        assert_eq!(map.terrain_height_at(Vec3::ONE, Vec3::ONE), 0.0);
    }

    #[test]
    fn test_terrain_height_interpolates() {
        let map = ramp();
        // World spans 7 units so pixels land on integer positions
        let dims = Vec3::new(7.0, SAMPLE_MAX, 7.0);

        let at_pixel = map.terrain_height_at(Vec3::new(2.0, 0.0, 3.0), dims);
        assert!((at_pixel - 2000.0).abs() < 0.01);

        let between = map.terrain_height_at(Vec3::new(2.5, 0.0, 3.0), dims);
        assert!((between - 2500.0).abs() < 0.01);
    }

    #[test]
    fn test_terrain_height_clamps_outside() {
        let map = ramp();
        let dims = Vec3::new(7.0, SAMPLE_MAX, 7.0);
        let beyond = map.terrain_height_at(Vec3::new(50.0, 0.0, -3.0), dims);
        assert!((beyond - 7000.0).abs() < 0.01);
        let before = map.terrain_height_at(Vec3::new(-5.0, 0.0, 3.0), dims);
        assert!(before.abs() < 0.01);
    }

    #[test]
    fn test_generation_deterministic() {
        let config = GeneratorConfig {
            width: 32,
            height: 32,
            ..Default::default()
        };
        let a = Heightmap::generate(&config);
        let b = Heightmap::generate(&config);
        assert_eq!(a, b);
        assert_eq!(a.samples().len(), 32 * 32);
    }

    #[test]
    fn test_image_round_trip() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("height.png");
        let img = image::ImageBuffer::<image::Luma<u16>, Vec<u16>>::from_fn(4, 3, |x, y| {
            image::Luma([(x * 100 + y) as u16])
        });
        img.save(&path).expect("save png");

        let map = Heightmap::from_image_path(&path).expect("load png");
        assert_eq!(map.width(), 4);
        assert_eq!(map.height(), 3);
        assert_eq!(map.sample(3, 2), 302);
    }

    #[test]
    fn test_missing_image() {
        let result = Heightmap::from_image_path("/nonexistent/height.png");
        assert!(matches!(result, Err(HeightmapError::Image(_))));
    }
}
