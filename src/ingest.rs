//! Batched admission of element records
//!
//! Records arrive in bulk (tens of thousands per catalog load). Building a
//! propagation handle is the expensive step, so admission is spread over
//! batches on a fixed cadence and the host loop stays responsive between them.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};

use crate::config::TrackerConfig;
use crate::data::{ObjectId, OrbitalElementRecord, Registry};
use crate::error::TrackError;
use crate::propagation::{eci_to_scene, gmst, OrbitPropagator};
use crate::renderer::{MarkerSpec, SceneSink};

/// Cumulative ingestion counters, reported after every batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub admitted: usize,
    pub rejected: usize,
    pub remaining: usize,
    /// Every record ever enqueued
    pub total: usize,
}

/// Outcome of a single batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchReport {
    pub admitted: usize,
    pub rejected: usize,
    pub remaining: usize,
}

/// Receives progress after each batch
pub trait ProgressObserver {
    fn on_progress(&mut self, progress: &Progress);
}

impl<F: FnMut(&Progress)> ProgressObserver for F {
    fn on_progress(&mut self, progress: &Progress) {
        self(progress)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    Idle,
    /// `next_due == None` means the next batch runs on the next poll
    Draining { next_due: Option<DateTime<Utc>> },
}

pub struct IngestionQueue {
    pending: VecDeque<OrbitalElementRecord>,
    state: QueueState,
    batch_size: usize,
    batch_interval: Duration,
    body_radius: f32,
    marker_size: f32,
    progress: Progress,
    observer: Option<Box<dyn ProgressObserver>>,
}

impl std::fmt::Debug for IngestionQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestionQueue")
            .field("pending", &self.pending.len())
            .field("state", &self.state)
            .field("progress", &self.progress)
            .finish_non_exhaustive()
    }
}

impl IngestionQueue {
    pub fn new(config: &TrackerConfig) -> Self {
        Self {
            pending: VecDeque::new(),
            state: QueueState::Idle,
            batch_size: config.batch_size.max(1),
            batch_interval: config.batch_interval(),
            body_radius: config.body_radius,
            marker_size: config.marker_size,
            progress: Progress::default(),
            observer: None,
        }
    }

    pub fn set_observer(&mut self, observer: impl ProgressObserver + 'static) {
        self.observer = Some(Box::new(observer));
    }

    /// Append records; an idle queue starts draining on the next poll
    pub fn enqueue(&mut self, records: impl IntoIterator<Item = OrbitalElementRecord>) {
        let before = self.pending.len();
        self.pending.extend(records);
        let added = self.pending.len() - before;
        if added == 0 {
            return;
        }

        self.progress.total += added;
        self.progress.remaining = self.pending.len();

        // Never reschedule a queue that is already draining
        if self.state == QueueState::Idle {
            self.state = QueueState::Draining { next_due: None };
        }

        log::debug!("Enqueued {} records ({} pending)", added, self.pending.len());
    }

    pub fn state(&self) -> QueueState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == QueueState::Idle
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn progress(&self) -> Progress {
        self.progress
    }

    /// Run one batch if one is due at `now`
    pub fn poll<P: OrbitPropagator>(
        &mut self,
        now: DateTime<Utc>,
        propagator: &P,
        registry: &mut Registry<P::Handle>,
        scene: &mut dyn SceneSink,
    ) -> Option<BatchReport> {
        match self.state {
            QueueState::Idle => None,
            QueueState::Draining { next_due: Some(due) } if now < due => None,
            QueueState::Draining { .. } => Some(self.drain_batch(now, propagator, registry, scene)),
        }
    }

    /// Admit up to one batch of records from the front of the queue.
    ///
    /// Per-record failures are logged and counted, they never abort the batch.
    pub fn drain_batch<P: OrbitPropagator>(
        &mut self,
        now: DateTime<Utc>,
        propagator: &P,
        registry: &mut Registry<P::Handle>,
        scene: &mut dyn SceneSink,
    ) -> BatchReport {
        let take = self.batch_size.min(self.pending.len());
        let gmst = gmst(now);
        let mut report = BatchReport::default();

        for record in self.pending.drain(..take) {
            match admit(&record, now, gmst, propagator, registry, scene, self.body_radius, self.marker_size) {
                Ok(_) => report.admitted += 1,
                Err(e) => {
                    log::warn!("Rejected {:?}: {}", record.name.trim(), e);
                    report.rejected += 1;
                }
            }
        }

        report.remaining = self.pending.len();
        self.progress.admitted += report.admitted;
        self.progress.rejected += report.rejected;
        self.progress.remaining = report.remaining;

        self.state = if self.pending.is_empty() {
            log::info!(
                "Ingestion complete: {} admitted, {} rejected of {}",
                self.progress.admitted,
                self.progress.rejected,
                self.progress.total
            );
            QueueState::Idle
        } else {
            QueueState::Draining {
                next_due: Some(now + self.batch_interval),
            }
        };

        log::debug!(
            "Batch: {} admitted, {} rejected, {} remaining",
            report.admitted,
            report.rejected,
            report.remaining
        );

        let progress = self.progress;
        if let Some(observer) = self.observer.as_mut() {
            observer.on_progress(&progress);
        }

        report
    }
}

#[allow(clippy::too_many_arguments)]
fn admit<P: OrbitPropagator>(
    record: &OrbitalElementRecord,
    now: DateTime<Utc>,
    gmst: f64,
    propagator: &P,
    registry: &mut Registry<P::Handle>,
    scene: &mut dyn SceneSink,
    body_radius: f32,
    marker_size: f32,
) -> Result<ObjectId, TrackError> {
    if registry.contains_record(record) {
        return Err(TrackError::Duplicate {
            name: record.name.trim().to_string(),
        });
    }

    let handle = propagator.initialize(record)?;

    let marker = MarkerSpec::new(record.name.trim(), record.kind, record.description.clone())
        .with_size(marker_size);
    let renderable = scene.spawn_marker(&marker);
    let id = registry.add(record, handle, renderable)?;

    // First placement so the marker shows up before the next frame
    let placement = registry
        .get(id)
        .map(|object| propagator.propagate(object.handle(), now));
    match placement {
        Some(Ok(state)) => {
            let (_, position) = eci_to_scene(&state.position, gmst, body_radius);
            registry.set_position(id, position);
            scene.move_marker(renderable, position);
        }
        Some(Err(e)) => log::debug!("No initial position for {:?}: {}", record.name.trim(), e),
        None => {}
    }

    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ObjectKind;
    use crate::propagation::elements::tests::*;
    use crate::propagation::Sgp4Propagator;
    use crate::renderer::MarkerBuffer;
    use crate::test_support::StubPropagator;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn records(count: usize) -> Vec<OrbitalElementRecord> {
        (0..count)
            .map(|i| OrbitalElementRecord::new(format!("OBJ-{}", i), "1 STUB", "2 STUB", ObjectKind::Other))
            .collect()
    }

    fn now() -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_704_110_400, 0).unwrap()
    }

    #[test]
    fn test_batches_of_thousand() {
        let propagator = StubPropagator::default();
        let mut registry = Registry::new();
        let mut scene = MarkerBuffer::new();
        let mut queue = IngestionQueue::new(&TrackerConfig::default());

        queue.enqueue(records(2500));
        assert!(!queue.is_idle());

        let mut admitted = Vec::new();
        let mut t = now();
        while !queue.is_idle() {
            let report = queue.drain_batch(t, &propagator, &mut registry, &mut scene);
            admitted.push(report.admitted);
            t += Duration::milliseconds(80);
        }

        assert_eq!(admitted, vec![1000, 1000, 500]);
        assert_eq!(registry.len(), 2500);
        assert_eq!(scene.len(), 2500);
    }

    #[test]
    fn test_poll_follows_cadence() {
        let propagator = StubPropagator::default();
        let mut registry = Registry::new();
        let mut scene = MarkerBuffer::new();
        let mut queue = IngestionQueue::new(&TrackerConfig::default());

        let t0 = now();
        assert!(queue.poll(t0, &propagator, &mut registry, &mut scene).is_none());

        queue.enqueue(records(1500));
        // First batch is due immediately
        let first = queue.poll(t0, &propagator, &mut registry, &mut scene).unwrap();
        assert_eq!(first.admitted, 1000);
        assert_eq!(queue.state(), QueueState::Draining { next_due: Some(t0 + Duration::milliseconds(80)) });

        // Enqueueing while draining does not pull the next batch forward
        queue.enqueue(records(0));
        assert!(queue.poll(t0 + Duration::milliseconds(40), &propagator, &mut registry, &mut scene).is_none());

        let second = queue.poll(t0 + Duration::milliseconds(80), &propagator, &mut registry, &mut scene).unwrap();
        assert_eq!(second, BatchReport { admitted: 500, rejected: 0, remaining: 0 });
        assert!(queue.is_idle());
        assert!(queue.poll(t0 + Duration::seconds(1), &propagator, &mut registry, &mut scene).is_none());
    }

    #[test]
    fn test_malformed_record_counts_towards_total() {
        let propagator = Sgp4Propagator::new();
        let mut registry = Registry::new();
        let mut scene = MarkerBuffer::new();
        let mut queue = IngestionQueue::new(&TrackerConfig::default());

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        queue.set_observer(move |p: &Progress| sink.borrow_mut().push((p.admitted, p.total)));

        queue.enqueue(vec![
            OrbitalElementRecord::new("ISS (ZARYA)", ISS_LINE1, ISS_LINE2, ObjectKind::Other),
            OrbitalElementRecord::new("BROKEN", &ISS_LINE1[..60], ISS_LINE2, ObjectKind::Debris),
            OrbitalElementRecord::new("NOAA 19", NOAA_LINE1, NOAA_LINE2, ObjectKind::Weather),
        ]);

        let report = queue.drain_batch(now(), &propagator, &mut registry, &mut scene);
        assert_eq!(report, BatchReport { admitted: 2, rejected: 1, remaining: 0 });
        assert_eq!(registry.len(), 2);
        assert!(registry.find_by_name("BROKEN").is_none());
        assert_eq!(*seen.borrow(), vec![(2, 3)]);
        // Marker only spawned for admitted records
        assert_eq!(scene.len(), 2);
    }

    #[test]
    fn test_duplicates_are_rejected_across_batches() {
        let propagator = StubPropagator::default();
        let mut registry = Registry::new();
        let mut scene = MarkerBuffer::new();
        let mut queue = IngestionQueue::new(&TrackerConfig::default());

        queue.enqueue(records(3));
        queue.drain_batch(now(), &propagator, &mut registry, &mut scene);
        queue.enqueue(records(3));
        let report = queue.drain_batch(now(), &propagator, &mut registry, &mut scene);

        assert_eq!(report.rejected, 3);
        assert_eq!(registry.len(), 3);
        assert_eq!(queue.progress(), Progress { admitted: 3, rejected: 3, remaining: 0, total: 6 });
    }

    #[test]
    fn test_admission_places_marker() {
        let mut propagator = StubPropagator::default();
        propagator.failing.insert("OBJ-1".to_string());
        let mut registry = Registry::new();
        let mut scene = MarkerBuffer::new();
        let mut queue = IngestionQueue::new(&TrackerConfig::default());

        queue.enqueue(records(2));
        let report = queue.drain_batch(now(), &propagator, &mut registry, &mut scene);

        // A propagation failure at admission is transient
        assert_eq!(report.admitted, 2);
        let placed = registry.find_by_name("OBJ-0").unwrap();
        let unplaced = registry.find_by_name("OBJ-1").unwrap();
        assert!(placed.last_known_position().is_some());
        assert!(unplaced.last_known_position().is_none());
        assert_eq!(scene.instances().len(), 1);
    }
}
