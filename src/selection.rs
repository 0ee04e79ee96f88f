//! Pointer picking and timed info popups
//!
//! Each tracked object is either without popup or showing exactly one.
//! Selecting an object that already shows a popup replaces it and restarts
//! its timer; `expire` retires popups whose deadline has passed.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use glam::Vec3;

use crate::config::TrackerConfig;
use crate::data::{ObjectId, Registry};
use crate::renderer::{planet_to_world, Camera, Ray, RayCaster};

/// Popups float this many pixels above the projected object
pub const POPUP_OFFSET_PX: f32 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn aspect_ratio(&self) -> f32 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }
}

/// Top-left anchor of a popup in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPosition {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub object: ObjectId,
    pub label: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// `None` until projected, or while the object is behind the camera
    pub screen: Option<ScreenPosition>,
}

#[derive(Debug)]
pub struct SelectionBridge {
    popups: HashMap<ObjectId, Popup>,
    lifetime: Duration,
    exclusive: bool,
}

impl SelectionBridge {
    pub fn new(config: &TrackerConfig) -> Self {
        Self {
            popups: HashMap::new(),
            lifetime: config.popup_lifetime(),
            exclusive: config.exclusive_popups,
        }
    }

    /// Nearest tracked object along the ray
    pub fn pick<H>(
        &self,
        ray: &Ray,
        caster: &dyn RayCaster,
        registry: &Registry<H>,
    ) -> Option<ObjectId> {
        let mut hits = caster.cast(ray);
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));

        // Hits on scene objects we don't track (planet, Moon) are skipped
        hits.iter()
            .find_map(|hit| registry.find_by_renderable(hit.renderable))
            .map(|object| object.id)
    }

    /// Show a popup for `id`, replacing any popup it already has
    pub fn select<H>(
        &mut self,
        id: ObjectId,
        registry: &Registry<H>,
        now: DateTime<Utc>,
    ) -> Option<&Popup> {
        let label = registry.get(id)?.label();

        if self.exclusive {
            self.popups.retain(|other, _| *other == id);
        }

        let popup = Popup {
            object: id,
            label,
            created_at: now,
            expires_at: now + self.lifetime,
            screen: None,
        };
        if self.popups.insert(id, popup).is_some() {
            log::debug!("Replaced popup for {}", id);
        }

        self.popups.get(&id)
    }

    /// Retire every popup whose deadline has passed
    pub fn expire(&mut self, now: DateTime<Utc>) -> Vec<ObjectId> {
        let mut retired: Vec<ObjectId> = self
            .popups
            .values()
            .filter(|popup| popup.expires_at <= now)
            .map(|popup| popup.object)
            .collect();
        retired.sort();

        for id in &retired {
            self.popups.remove(id);
        }
        retired
    }

    pub fn popup(&self, id: ObjectId) -> Option<&Popup> {
        self.popups.get(&id)
    }

    pub fn popups(&self) -> impl Iterator<Item = &Popup> {
        self.popups.values()
    }

    pub fn len(&self) -> usize {
        self.popups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.popups.is_empty()
    }

    /// Re-anchor one popup over its object's world position
    pub fn update_popup_screen_position(
        &mut self,
        id: ObjectId,
        world: Vec3,
        camera: &Camera,
        viewport: Viewport,
    ) {
        if let Some(popup) = self.popups.get_mut(&id) {
            popup.screen = project_to_screen(world, camera, viewport);
        }
    }

    /// Re-anchor every live popup, objects are in the rotating planet frame
    pub fn update_all<H>(
        &mut self,
        registry: &Registry<H>,
        earth_rotation: f32,
        camera: &Camera,
        viewport: Viewport,
    ) {
        for popup in self.popups.values_mut() {
            popup.screen = registry
                .get(popup.object)
                .and_then(|object| object.last_known_position())
                .and_then(|local| {
                    project_to_screen(planet_to_world(local, earth_rotation), camera, viewport)
                });
        }
    }
}

/// Pixel anchor for a world point, `None` when it is behind the camera
pub fn project_to_screen(world: Vec3, camera: &Camera, viewport: Viewport) -> Option<ScreenPosition> {
    let ndc = camera.project_to_ndc(world, viewport.aspect_ratio())?;
    Some(ScreenPosition {
        x: (ndc.x * 0.5 + 0.5) * viewport.width,
        y: (-ndc.y * 0.5 + 0.5) * viewport.height - POPUP_OFFSET_PX,
    })
}
