//! Tracked object registry
//!
//! Owns every admitted object for the session. Objects are never removed;
//! only their last known position changes, and only through crate-internal
//! calls from the frame driver and ingestion.

use std::collections::{HashMap, HashSet};

use glam::Vec3;

use super::{ObjectKind, OrbitalElementRecord};
use crate::error::TrackError;
use crate::renderer::RenderableId;

/// Session-unique id of a tracked object, assigned in admission order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u32);

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A live object with its cached propagation state
#[derive(Debug, Clone)]
pub struct TrackedObject<H> {
    pub id: ObjectId,
    pub name: String,
    pub kind: ObjectKind,
    pub description: Option<String>,
    handle: H,
    pub renderable: RenderableId,
    last_known_position: Option<Vec3>,
}

impl<H> TrackedObject<H> {
    pub fn handle(&self) -> &H {
        &self.handle
    }

    /// Scene position from the last successful propagation, planet frame
    pub fn last_known_position(&self) -> Option<Vec3> {
        self.last_known_position
    }

    /// Popup label, `NAME (DESCRIPTION)` or `NAME (TYPE)`, uppercased
    pub fn label(&self) -> String {
        let detail = self.description.as_deref().unwrap_or(self.kind.label());
        format!("{} ({})", self.name, detail.to_uppercase())
    }
}

/// Insertion-ordered store of tracked objects
#[derive(Debug)]
pub struct Registry<H> {
    objects: Vec<TrackedObject<H>>,
    by_name: HashMap<String, ObjectId>,
    by_renderable: HashMap<RenderableId, ObjectId>,
    sources: HashSet<(String, String, String)>,
}

impl<H> Default for Registry<H> {
    fn default() -> Self {
        Self {
            objects: Vec::new(),
            by_name: HashMap::new(),
            by_renderable: HashMap::new(),
            sources: HashSet::new(),
        }
    }
}

impl<H> Registry<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an object derived from this exact record is already tracked
    pub fn contains_record(&self, record: &OrbitalElementRecord) -> bool {
        self.sources.contains(&record.source_key())
    }

    /// Admit a record whose handle has already been built.
    ///
    /// Fails with `TrackError::Duplicate` if the same `(name, line1, line2)`
    /// was admitted before.
    pub fn add(
        &mut self,
        record: &OrbitalElementRecord,
        handle: H,
        renderable: RenderableId,
    ) -> Result<ObjectId, TrackError> {
        let key = record.source_key();
        if self.sources.contains(&key) {
            return Err(TrackError::Duplicate {
                name: key.0.clone(),
            });
        }

        let id = ObjectId(self.objects.len() as u32);
        let name = key.0.clone();

        // First object admitted under a name keeps it
        self.by_name.entry(name.clone()).or_insert(id);
        self.by_renderable.insert(renderable, id);
        self.sources.insert(key);

        self.objects.push(TrackedObject {
            id,
            name,
            kind: record.kind,
            description: record.description.clone(),
            handle,
            renderable,
            last_known_position: None,
        });

        Ok(id)
    }

    pub fn get(&self, id: ObjectId) -> Option<&TrackedObject<H>> {
        self.objects.get(id.0 as usize)
    }

    /// Exact, case-sensitive lookup on the trimmed name
    pub fn find_by_name(&self, name: &str) -> Option<&TrackedObject<H>> {
        self.by_name.get(name.trim()).and_then(|id| self.get(*id))
    }

    pub fn find_by_renderable(&self, renderable: RenderableId) -> Option<&TrackedObject<H>> {
        self.by_renderable.get(&renderable).and_then(|id| self.get(*id))
    }

    /// All objects in admission order
    pub fn all(&self) -> &[TrackedObject<H>] {
        &self.objects
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedObject<H>> {
        self.objects.iter()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub(crate) fn set_position(&mut self, id: ObjectId, position: Vec3) {
        if let Some(object) = self.objects.get_mut(id.0 as usize) {
            object.last_known_position = Some(position);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, line1: &str) -> OrbitalElementRecord {
        OrbitalElementRecord::new(name, line1, "2 00000", ObjectKind::Debris)
    }

    #[test]
    fn test_add_and_lookup() {
        let mut registry: Registry<u8> = Registry::new();
        let a = registry.add(&record("ALPHA", "1 A"), 1, RenderableId(10)).unwrap();
        let b = registry.add(&record("BETA", "1 B"), 2, RenderableId(11)).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(a).unwrap().name, "ALPHA");
        assert_eq!(*registry.find_by_name("BETA").unwrap().handle(), 2);
        assert_eq!(registry.find_by_renderable(RenderableId(10)).unwrap().id, a);
        assert!(registry.find_by_renderable(RenderableId(12)).is_none());

        let order: Vec<ObjectId> = registry.iter().map(|o| o.id).collect();
        assert_eq!(order, vec![a, b]);
    }

    #[test]
    fn test_same_source_record_is_rejected() {
        let mut registry: Registry<()> = Registry::new();
        registry.add(&record("ALPHA", "1 A"), (), RenderableId(0)).unwrap();

        let again = registry.add(&record("ALPHA ", "1 A  "), (), RenderableId(1));
        assert_eq!(
            again,
            Err(TrackError::Duplicate {
                name: "ALPHA".to_string()
            })
        );
        assert_eq!(registry.len(), 1);
        assert!(registry.find_by_renderable(RenderableId(1)).is_none());
    }

    #[test]
    fn test_name_lookup_is_exact_and_first_wins() {
        let mut registry: Registry<u8> = Registry::new();
        registry.add(&record("ALPHA", "1 A"), 1, RenderableId(0)).unwrap();
        // Same name, different element set: distinct object
        registry.add(&record("ALPHA", "1 B"), 2, RenderableId(1)).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(*registry.find_by_name("ALPHA").unwrap().handle(), 1);
        assert!(registry.find_by_name("alpha").is_none());
        assert!(registry.find_by_name("ALP").is_none());
    }

    #[test]
    fn test_set_position_only_touches_target() {
        let mut registry: Registry<()> = Registry::new();
        let a = registry.add(&record("A", "1 A"), (), RenderableId(0)).unwrap();
        let b = registry.add(&record("B", "1 B"), (), RenderableId(1)).unwrap();

        registry.set_position(a, Vec3::X);
        assert_eq!(registry.get(a).unwrap().last_known_position(), Some(Vec3::X));
        assert_eq!(registry.get(b).unwrap().last_known_position(), None);
    }

    #[test]
    fn test_label_prefers_description() {
        let mut registry: Registry<()> = Registry::new();
        let plain = registry.add(&record("COSMOS 2251 DEB", "1 A"), (), RenderableId(0)).unwrap();
        let described = registry
            .add(
                &record("NOAA 19", "1 B").with_description("noaa weather"),
                (),
                RenderableId(1),
            )
            .unwrap();

        assert_eq!(registry.get(plain).unwrap().label(), "COSMOS 2251 DEB (DEBRIS)");
        assert_eq!(registry.get(described).unwrap().label(), "NOAA 19 (NOAA WEATHER)");
    }
}
