//! Satellite markers - per-kind styling and an in-memory instance buffer

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use super::{planet_to_world, Environment, Ray, RayCaster, RayHit, RenderableId, SceneSink};
use crate::data::ObjectKind;

/// Marker sphere radius in scene units
pub const MARKER_SIZE: f32 = 0.0025;

/// Instance data for each satellite marker, laid out for a GPU vertex buffer
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct MarkerInstance {
    /// Position in the planet's local frame (planet radii)
    pub position: [f32; 3],
    /// Color by object kind (RGBA)
    pub color: [f32; 4],
    /// Sphere radius
    pub size: f32,
}

/// What the renderer needs to create a marker
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    pub name: String,
    pub kind: ObjectKind,
    pub description: Option<String>,
    pub color: [f32; 4],
    pub size: f32,
}

impl MarkerSpec {
    pub fn new(name: impl Into<String>, kind: ObjectKind, description: Option<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            description,
            color: kind_color(kind),
            size: MARKER_SIZE,
        }
    }

    pub fn with_size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }
}

/// Get marker color for an object kind
pub fn kind_color(kind: ObjectKind) -> [f32; 4] {
    match kind {
        ObjectKind::Starlink => hex_color(0x18DE1B),
        ObjectKind::Debris => hex_color(0xEB413D),
        ObjectKind::Weather => hex_color(0xEB9E02),
        ObjectKind::Communication => hex_color(0x12EBE7),
        ObjectKind::Other => [1.0, 1.0, 1.0, 1.0],
    }
}

fn hex_color(rgb: u32) -> [f32; 4] {
    let channel = |shift: u32| ((rgb >> shift) & 0xFF) as f32 / 255.0;
    [channel(16), channel(8), channel(0), 1.0]
}

/// Scene sink that keeps marker instances in memory.
///
/// Ids are indices into the instance buffer. Markers that have never been
/// moved stay hidden and cannot be picked.
#[derive(Debug, Default)]
pub struct MarkerBuffer {
    instances: Vec<MarkerInstance>,
    placed: Vec<bool>,
    environment: Option<Environment>,
}

impl MarkerBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Instances of every marker that has a position, ready for upload
    pub fn instances(&self) -> Vec<MarkerInstance> {
        self.instances
            .iter()
            .zip(&self.placed)
            .filter(|(_, placed)| **placed)
            .map(|(instance, _)| *instance)
            .collect()
    }

    pub fn instance_bytes(&self) -> Vec<u8> {
        bytemuck::cast_slice(&self.instances()).to_vec()
    }

    pub fn get(&self, id: RenderableId) -> Option<&MarkerInstance> {
        self.instances.get(id.0 as usize)
    }

    pub fn environment(&self) -> Option<&Environment> {
        self.environment.as_ref()
    }

    /// World-space position of a placed marker
    pub fn world_position(&self, id: RenderableId) -> Option<Vec3> {
        let index = id.0 as usize;
        if !self.placed.get(index).copied().unwrap_or(false) {
            return None;
        }
        let local = Vec3::from_array(self.instances[index].position);
        Some(planet_to_world(local, self.earth_rotation()))
    }

    fn earth_rotation(&self) -> f32 {
        self.environment.map(|e| e.earth_rotation).unwrap_or(0.0)
    }
}

impl SceneSink for MarkerBuffer {
    fn spawn_marker(&mut self, marker: &MarkerSpec) -> RenderableId {
        let id = RenderableId(self.instances.len() as u64);
        self.instances.push(MarkerInstance {
            position: [0.0; 3],
            color: marker.color,
            size: marker.size,
        });
        self.placed.push(false);
        id
    }

    fn move_marker(&mut self, id: RenderableId, position: Vec3) {
        let index = id.0 as usize;
        match self.instances.get_mut(index) {
            Some(instance) => {
                instance.position = position.to_array();
                self.placed[index] = true;
            }
            None => log::warn!("Ignoring move of unknown marker {:?}", id),
        }
    }

    fn set_environment(&mut self, environment: &Environment) {
        self.environment = Some(*environment);
    }
}

impl RayCaster for MarkerBuffer {
    fn cast(&self, ray: &Ray) -> Vec<RayHit> {
        let rotation = self.earth_rotation();
        self.instances
            .iter()
            .zip(&self.placed)
            .enumerate()
            .filter(|(_, (_, placed))| **placed)
            .filter_map(|(index, (instance, _))| {
                let center = planet_to_world(Vec3::from_array(instance.position), rotation);
                ray.intersect_sphere(center, instance.size)
                    .map(|distance| RayHit {
                        renderable: RenderableId(index as u64),
                        distance,
                    })
            })
            .collect()
    }
}
