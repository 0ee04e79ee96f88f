//! Contract with the external renderer
//!
//! The tracking core never owns scene objects. It asks the renderer to spawn
//! one marker per tracked object, keeps the returned `RenderableId` as a weak
//! back-reference, and pushes positions and lighting through `SceneSink`.
//! Pointer picking goes the other way through `RayCaster`.

mod camera;
pub mod environment;
pub mod satellites;

pub use camera::*;
pub use environment::{Environment, MoonState};
pub use satellites::*;

use glam::{Quat, Vec3};

/// Renderer-assigned handle of a scene object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderableId(pub u64);

/// Receives everything the tracking core produces for display
pub trait SceneSink {
    /// Create a marker for a newly tracked object
    fn spawn_marker(&mut self, marker: &MarkerSpec) -> RenderableId;

    /// Place a marker, position is in the planet's local (rotating) frame
    fn move_marker(&mut self, id: RenderableId, position: Vec3);

    /// Planet rotation, Moon and lighting for the current frame
    fn set_environment(&mut self, environment: &Environment);
}

/// Ray/geometry intersection, performed by whoever owns the geometry
pub trait RayCaster {
    /// All hits along the ray, in any order
    fn cast(&self, ray: &Ray) -> Vec<RayHit>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub renderable: RenderableId,
    /// Distance from the ray origin along the (normalized) direction
    pub distance: f32,
}

/// World-space ray with a normalized direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }

    /// Nearest non-negative hit distance with a sphere
    pub fn intersect_sphere(&self, center: Vec3, radius: f32) -> Option<f32> {
        let oc = self.origin - center;
        let b = oc.dot(self.direction);
        let c = oc.length_squared() - radius * radius;
        let disc = b * b - c;
        if disc < 0.0 {
            return None;
        }

        let sqrt_disc = disc.sqrt();
        let t1 = -b - sqrt_disc;
        let t2 = -b + sqrt_disc;
        if t1 >= 0.0 {
            Some(t1)
        } else if t2 >= 0.0 {
            // Origin inside the sphere
            Some(t2)
        } else {
            None
        }
    }
}

/// Markers are children of the planet, which spins about +Y
pub fn planet_to_world(local: Vec3, earth_rotation: f32) -> Vec3 {
    Quat::from_rotation_y(earth_rotation) * local
}
