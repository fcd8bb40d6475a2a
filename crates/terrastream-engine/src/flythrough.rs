//! Scripted camera path over the terrain.

use glam::{Vec2, Vec3};
use terrastream_kernel::Heightmap;

/// Camera gliding over the terrain along a slowly turning heading.
///
/// The path stays on the heightmap: when the next step would leave it the
/// camera turns around instead.
#[derive(Debug, Clone)]
pub struct Flythrough {
    position: Vec2,
    heading: f32,
    speed: f32,
    turn_rate: f32,
    altitude: f32,
    bounds: Vec2,
    dimensions: Vec3,
}

impl Flythrough {
    /// Creates a flythrough starting at the center of the heightmap.
    ///
    /// `height_scale` must match the one cells are built with so the camera
    /// follows the streamed surface.
    #[must_use]
    pub fn new(
        heightmap: &Heightmap,
        height_scale: f32,
        speed: f32,
        heading_degrees: f32,
        turn_rate_degrees: f32,
        altitude: f32,
    ) -> Self {
        let bounds = Vec2::new(
            heightmap.width().saturating_sub(1) as f32,
            heightmap.height().saturating_sub(1) as f32,
        );
        Self {
            position: bounds * 0.5,
            heading: heading_degrees.to_radians(),
            speed,
            turn_rate: turn_rate_degrees.to_radians(),
            altitude,
            bounds,
            dimensions: Vec3::new(bounds.x.max(1.0), height_scale, bounds.y.max(1.0)),
        }
    }

    /// Current camera position, `altitude` above the terrain.
    #[must_use]
    pub fn camera(&self, heightmap: &Heightmap) -> Vec3 {
        let ground = Vec3::new(self.position.x, 0.0, self.position.y);
        let height = heightmap.terrain_height_at(ground, self.dimensions);
        Vec3::new(self.position.x, height + self.altitude, self.position.y)
    }

    /// Advances one frame along the path.
    pub fn advance(&mut self) {
        self.heading += self.turn_rate;
        let mut next = self.position + Vec2::from_angle(self.heading) * self.speed;
        if next.cmplt(Vec2::ZERO).any() || next.cmpgt(self.bounds).any() {
            self.heading += std::f32::consts::PI;
            next = self.position + Vec2::from_angle(self.heading) * self.speed;
        }
        self.position = next.clamp(Vec2::ZERO, self.bounds);
    }

    /// Ground-plane position.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }
}
