//! Per-frame position refresh

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::data::{ObjectId, Registry};
use crate::propagation::{eci_to_scene, gmst, OrbitPropagator};
use crate::renderer::{Camera, Environment, SceneSink};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub updated: usize,
    pub failed: usize,
    pub environment: Environment,
}

/// Drives propagation of every tracked object once per rendered frame.
///
/// Only the driver writes positions. An object whose propagation fails keeps
/// its previous position for that frame and is retried on the next one.
#[derive(Debug)]
pub struct FrameDriver {
    body_radius: f32,
    failing: HashSet<ObjectId>,
    frames: u64,
}

impl FrameDriver {
    pub fn new(body_radius: f32) -> Self {
        Self {
            body_radius,
            failing: HashSet::new(),
            frames: 0,
        }
    }

    /// Objects whose last propagation failed
    pub fn failing(&self) -> usize {
        self.failing.len()
    }

    pub fn is_failing(&self, id: ObjectId) -> bool {
        self.failing.contains(&id)
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn tick<P: OrbitPropagator>(
        &mut self,
        now: DateTime<Utc>,
        registry: &mut Registry<P::Handle>,
        propagator: &P,
        scene: &mut dyn SceneSink,
        camera: &Camera,
    ) -> FrameReport {
        let environment = Environment::compute(now, camera);
        scene.set_environment(&environment);

        let gmst = gmst(now);
        let mut updated = 0;
        let mut failed = 0;

        for index in 0..registry.len() {
            let id = ObjectId(index as u32);
            let Some(object) = registry.get(id) else {
                continue;
            };
            let renderable = object.renderable;

            match propagator.propagate(object.handle(), now) {
                Ok(state) => {
                    let (_, position) = eci_to_scene(&state.position, gmst, self.body_radius);
                    if self.failing.remove(&id) {
                        log::info!("{} ({}) is propagating again", object.name, id);
                    }
                    registry.set_position(id, position);
                    scene.move_marker(renderable, position);
                    updated += 1;
                }
                Err(e) => {
                    if self.failing.insert(id) {
                        log::warn!("Propagation failed for {} ({}): {}", object.name, id, e);
                    } else {
                        log::debug!("Propagation still failing for {} ({}): {}", object.name, id, e);
                    }
                    failed += 1;
                }
            }
        }

        self.frames += 1;

        FrameReport {
            updated,
            failed,
            environment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ObjectKind, OrbitalElementRecord};
    use crate::propagation::elements::tests::*;
    use crate::propagation::Sgp4Propagator;
    use crate::renderer::{MarkerBuffer, MarkerSpec};
    use crate::test_support::{StubHandle, StubPropagator};
    use chrono::Duration;
    use glam::Vec3;

    fn setup(names: &[&str]) -> (Registry<StubHandle>, MarkerBuffer, StubPropagator) {
        let propagator = StubPropagator::default();
        let mut registry = Registry::new();
        let mut scene = MarkerBuffer::new();
        for name in names {
            let record = OrbitalElementRecord::new(*name, "1", "2", ObjectKind::Other);
            let handle = propagator.initialize(&record).unwrap();
            let renderable = scene.spawn_marker(&MarkerSpec::new(*name, ObjectKind::Other, None));
            registry.add(&record, handle, renderable).unwrap();
        }
        (registry, scene, propagator)
    }

    fn positions(registry: &Registry<StubHandle>) -> Vec<Option<Vec3>> {
        registry.iter().map(|o| o.last_known_position()).collect()
    }

    fn t0() -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_704_110_400, 0).unwrap()
    }

    #[test]
    fn test_tick_is_idempotent() {
        let (mut registry, mut scene, propagator) = setup(&["A", "B", "C"]);
        let mut driver = FrameDriver::new(1.0);
        let camera = Camera::default();

        let first = driver.tick(t0(), &mut registry, &propagator, &mut scene, &camera);
        let after_first = positions(&registry);
        let second = driver.tick(t0(), &mut registry, &propagator, &mut scene, &camera);

        assert_eq!(first.updated, 3);
        assert_eq!(after_first, positions(&registry));
        assert_eq!(first.environment, second.environment);
        assert!(after_first.iter().all(|p| p.is_some()));
        assert_eq!(driver.frames(), 2);
    }

    #[test]
    fn test_failure_is_isolated_per_object() {
        let (mut registry, mut scene, mut propagator) = setup(&["A", "B"]);
        let mut driver = FrameDriver::new(1.0);
        let camera = Camera::default();

        driver.tick(t0(), &mut registry, &propagator, &mut scene, &camera);
        let before = positions(&registry);

        propagator.failing.insert("A".to_string());
        let later = t0() + Duration::seconds(600);
        let report = driver.tick(later, &mut registry, &propagator, &mut scene, &camera);

        assert_eq!((report.updated, report.failed), (1, 1));
        let after = positions(&registry);
        // A keeps its old position, B moved on
        assert_eq!(after[0], before[0]);
        assert_ne!(after[1], before[1]);
        assert_eq!(registry.len(), 2);

        let a = registry.find_by_name("A").unwrap().id;
        assert!(driver.is_failing(a));
        assert_eq!(
            scene.get(registry.get(a).unwrap().renderable).unwrap().position,
            before[0].unwrap().to_array()
        );

        propagator.failing.clear();
        driver.tick(later, &mut registry, &propagator, &mut scene, &camera);
        assert_eq!(driver.failing(), 0);
    }

    #[test]
    fn test_repeated_failure_is_tracked_once() {
        let (mut registry, mut scene, mut propagator) = setup(&["A"]);
        let mut driver = FrameDriver::new(1.0);
        let camera = Camera::default();
        propagator.failing.insert("A".to_string());

        for step in 0..3 {
            let at = t0() + Duration::seconds(step);
            let report = driver.tick(at, &mut registry, &propagator, &mut scene, &camera);
            assert_eq!(report.failed, 1);
            assert_eq!(driver.failing(), 1);
        }

        propagator.failing.clear();
        let report = driver.tick(t0() + Duration::seconds(3), &mut registry, &propagator, &mut scene, &camera);
        assert_eq!((report.updated, report.failed), (1, 0));
        assert!(!driver.is_failing(ObjectId(0)));
    }

    #[test]
    fn test_environment_updates_without_objects() {
        let (mut registry, mut scene, propagator) = setup(&[]);
        let mut driver = FrameDriver::new(1.0);

        let report = driver.tick(t0(), &mut registry, &propagator, &mut scene, &Camera::default());
        assert_eq!(report.updated, 0);
        assert_eq!(scene.environment(), Some(&report.environment));
    }

    #[test]
    fn test_iss_lands_at_orbital_altitude() {
        let propagator = Sgp4Propagator::new();
        let mut registry = Registry::new();
        let mut scene = MarkerBuffer::new();

        let record = OrbitalElementRecord::new("ISS (ZARYA)", ISS_LINE1, ISS_LINE2, ObjectKind::Other);
        let handle = propagator.initialize(&record).unwrap();
        let epoch = handle.epoch();
        let renderable = scene.spawn_marker(&MarkerSpec::new("ISS (ZARYA)", ObjectKind::Other, None));
        registry.add(&record, handle, renderable).unwrap();

        let mut driver = FrameDriver::new(1.0);
        let report = driver.tick(epoch, &mut registry, &propagator, &mut scene, &Camera::default());
        assert_eq!(report.updated, 1);

        // ~350 km above a unit sphere
        let radius = registry.all()[0].last_known_position().unwrap().length();
        assert!(radius > 1.03 && radius < 1.08, "radius {}", radius);
    }
}
