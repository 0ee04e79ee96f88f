//! Host-facing facade over ingestion, the frame loop and selection
//!
//! A host drives one `Tracker` from a single loop: `poll_ingestion` on every
//! iteration (it only does work when a batch is due), `frame` once per
//! rendered frame, and `click` on pointer input.

use chrono::{DateTime, Utc};
use glam::Vec2;

use crate::config::TrackerConfig;
use crate::data::{ObjectId, OrbitalElementRecord, Registry};
use crate::frame::{FrameDriver, FrameReport};
use crate::ingest::{BatchReport, IngestionQueue, Progress, ProgressObserver};
use crate::propagation::OrbitPropagator;
use crate::renderer::{Camera, RayCaster, SceneSink};
use crate::selection::{SelectionBridge, Viewport};

pub struct Tracker<P: OrbitPropagator> {
    config: TrackerConfig,
    propagator: P,
    registry: Registry<P::Handle>,
    queue: IngestionQueue,
    driver: FrameDriver,
    selection: SelectionBridge,
    camera: Camera,
    earth_rotation: f32,
}

impl<P: OrbitPropagator> Tracker<P> {
    pub fn new(propagator: P, config: TrackerConfig) -> Self {
        Self {
            queue: IngestionQueue::new(&config),
            driver: FrameDriver::new(config.body_radius),
            selection: SelectionBridge::new(&config),
            registry: Registry::new(),
            camera: Camera::default(),
            earth_rotation: 0.0,
            propagator,
            config,
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry<P::Handle> {
        &self.registry
    }

    pub fn selection(&self) -> &SelectionBridge {
        &self.selection
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn progress(&self) -> Progress {
        self.queue.progress()
    }

    pub fn is_ingesting(&self) -> bool {
        !self.queue.is_idle()
    }

    /// Objects whose most recent propagation failed
    pub fn failing(&self) -> usize {
        self.driver.failing()
    }

    pub fn set_progress_observer(&mut self, observer: impl ProgressObserver + 'static) {
        self.queue.set_observer(observer);
    }

    pub fn enqueue(&mut self, records: impl IntoIterator<Item = OrbitalElementRecord>) {
        self.queue.enqueue(records);
    }

    pub fn poll_ingestion(
        &mut self,
        now: DateTime<Utc>,
        scene: &mut dyn SceneSink,
    ) -> Option<BatchReport> {
        self.queue
            .poll(now, &self.propagator, &mut self.registry, scene)
    }

    /// Refresh every position and the environment, then the popups
    pub fn frame(
        &mut self,
        now: DateTime<Utc>,
        scene: &mut dyn SceneSink,
        viewport: Viewport,
    ) -> FrameReport {
        let report = self
            .driver
            .tick(now, &mut self.registry, &self.propagator, scene, &self.camera);
        self.earth_rotation = report.environment.earth_rotation;

        for id in self.selection.expire(now) {
            log::trace!("Popup for {} expired", id);
        }
        self.selection
            .update_all(&self.registry, self.earth_rotation, &self.camera, viewport);

        report
    }

    /// Pick at a pointer position (NDC) and open a popup for the hit object
    pub fn click(
        &mut self,
        ndc: Vec2,
        viewport: Viewport,
        caster: &dyn RayCaster,
        now: DateTime<Utc>,
    ) -> Option<ObjectId> {
        let ray = self.camera.ray_from_ndc(ndc, viewport.aspect_ratio());
        let id = self.selection.pick(&ray, caster, &self.registry)?;

        if let Some(popup) = self.selection.select(id, &self.registry, now) {
            log::info!("Selected {}", popup.label);
        }

        // Anchor right away rather than waiting for the next frame
        let world = self
            .registry
            .get(id)
            .and_then(|object| object.last_known_position())
            .map(|local| crate::renderer::planet_to_world(local, self.earth_rotation));
        if let Some(world) = world {
            self.selection
                .update_popup_screen_position(id, world, &self.camera, viewport);
        }

        Some(id)
    }
}
