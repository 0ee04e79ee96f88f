//! SGP4 propagation of element records

use chrono::{DateTime, Utc};
use nalgebra::Vector3;

use super::elements::ElementSet;
use super::EARTH_RADIUS_KM;
use crate::data::OrbitalElementRecord;
use crate::error::{InvalidRecordError, PropagationError};

/// Inertial state produced by a propagator (TEME for SGP4)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EciState {
    /// Position in kilometers
    pub position: Vector3<f64>,
    /// Velocity in km/s
    pub velocity: Vector3<f64>,
}

impl EciState {
    /// Distance from the planet center in kilometers
    pub fn radius_km(&self) -> f64 {
        self.position.norm()
    }

    pub fn speed_kms(&self) -> f64 {
        self.velocity.norm()
    }
}

/// An analytic orbit model the tracking pipeline can drive.
///
/// `initialize` runs once per record during ingestion and may be expensive;
/// `propagate` runs for every tracked object on every frame and must be a
/// pure function of the handle and the instant.
pub trait OrbitPropagator {
    /// Per-object model state, immutable once built
    type Handle;

    fn initialize(&self, record: &OrbitalElementRecord)
        -> Result<Self::Handle, InvalidRecordError>;

    fn propagate(
        &self,
        handle: &Self::Handle,
        at: DateTime<Utc>,
    ) -> Result<EciState, PropagationError>;
}

/// Cached SGP4/SDP4 constants for one element set
#[derive(Clone)]
pub struct Sgp4Handle {
    elements: ElementSet,
    constants: sgp4::Constants,
    epoch: DateTime<Utc>,
}

impl Sgp4Handle {
    /// Element set epoch as used by the model
    pub fn epoch(&self) -> DateTime<Utc> {
        self.epoch
    }

    pub fn elements(&self) -> &ElementSet {
        &self.elements
    }

    /// Age of the element set in days (for error estimation)
    pub fn age_days(&self, at: DateTime<Utc>) -> f64 {
        self.elements.age_days(at)
    }
}

impl std::fmt::Debug for Sgp4Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sgp4Handle")
            .field("catalog_number", &self.elements.catalog_number)
            .field("epoch", &self.epoch)
            .finish_non_exhaustive()
    }
}

/// SGP4 propagator backed by the `sgp4` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct Sgp4Propagator;

impl Sgp4Propagator {
    pub fn new() -> Self {
        Self
    }
}

impl OrbitPropagator for Sgp4Propagator {
    type Handle = Sgp4Handle;

    fn initialize(&self, record: &OrbitalElementRecord) -> Result<Sgp4Handle, InvalidRecordError> {
        let elements = ElementSet::parse(&record.line1, &record.line2)?;

        let tle = sgp4::Elements::from_tle(
            Some(record.name.trim().to_string()),
            record.line1.trim_end().as_bytes(),
            record.line2.trim_end().as_bytes(),
        )
        .map_err(|e| InvalidRecordError::Model(e.to_string()))?;

        let constants = sgp4::Constants::from_elements(&tle)
            .map_err(|e| InvalidRecordError::Model(e.to_string()))?;

        let handle = Sgp4Handle {
            elements,
            constants,
            epoch: tle.datetime.and_utc(),
        };

        // An element set that is already unusable at its own epoch never gets tracked
        self.propagate(&handle, handle.epoch)?;

        log::trace!(
            "Initialized {} (catalog {}, epoch {})",
            record.name.trim(),
            handle.elements.catalog_number,
            handle.epoch
        );

        Ok(handle)
    }

    fn propagate(&self, handle: &Sgp4Handle, at: DateTime<Utc>) -> Result<EciState, PropagationError> {
        let minutes = minutes_since(handle.epoch, at);

        let prediction = handle
            .constants
            .propagate(sgp4::MinutesSinceEpoch(minutes))
            .map_err(|e| PropagationError::Model(e.to_string()))?;

        validate_state(EciState {
            position: Vector3::from(prediction.position),
            velocity: Vector3::from(prediction.velocity),
        })
    }
}

fn minutes_since(epoch: DateTime<Utc>, at: DateTime<Utc>) -> f64 {
    let delta = at - epoch;
    match delta.num_microseconds() {
        Some(us) => us as f64 / 60_000_000.0,
        None => delta.num_milliseconds() as f64 / 60_000.0,
    }
}

/// Reject states outside the model's physical domain
pub fn validate_state(state: EciState) -> Result<EciState, PropagationError> {
    let finite = state.position.iter().all(|v| v.is_finite())
        && state.velocity.iter().all(|v| v.is_finite());
    if !finite {
        return Err(PropagationError::NonFinite);
    }

    let radius_km = state.radius_km();
    if radius_km < EARTH_RADIUS_KM {
        return Err(PropagationError::Decayed { radius_km });
    }

    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ObjectKind;
    use crate::propagation::elements::tests::*;
    use chrono::Duration;

    fn iss() -> OrbitalElementRecord {
        OrbitalElementRecord::new("ISS (ZARYA)", ISS_LINE1, ISS_LINE2, ObjectKind::Other)
    }

    #[test]
    fn test_propagate_at_epoch_is_finite_and_nonzero() {
        let propagator = Sgp4Propagator::new();
        for (line1, line2) in [
            (ISS_LINE1, ISS_LINE2),
            (NOAA_LINE1, NOAA_LINE2),
            (STARLINK_LINE1, STARLINK_LINE2),
        ] {
            let record = OrbitalElementRecord::new("SAT", line1, line2, ObjectKind::Other);
            let handle = propagator.initialize(&record).unwrap();
            let state = propagator.propagate(&handle, handle.epoch()).unwrap();

            assert!(state.position.iter().all(|v| v.is_finite()));
            assert!(state.radius_km() > EARTH_RADIUS_KM);
            assert!(state.speed_kms() > 1.0);
        }
    }

    #[test]
    fn test_iss_orbit_is_plausible() {
        let propagator = Sgp4Propagator::new();
        let handle = propagator.initialize(&iss()).unwrap();

        for minutes in [0, 30, 60, 90] {
            let at = handle.epoch() + Duration::minutes(minutes);
            let state = propagator.propagate(&handle, at).unwrap();
            let altitude = state.radius_km() - EARTH_RADIUS_KM;
            // ~350 km perigee / apogee in 2008
            assert!(altitude > 250.0 && altitude < 500.0, "altitude {}", altitude);
            assert!((state.speed_kms() - 7.7).abs() < 0.3);
        }
    }

    #[test]
    fn test_propagation_is_deterministic() {
        let propagator = Sgp4Propagator::new();
        let handle = propagator.initialize(&iss()).unwrap();
        let at = handle.epoch() + Duration::seconds(12_345);

        let a = propagator.propagate(&handle, at).unwrap();
        let b = propagator.propagate(&handle, at).unwrap();
        assert_eq!(a, b);

        let copy = handle.clone();
        assert_eq!(propagator.propagate(&copy, at).unwrap(), a);
    }

    #[test]
    fn test_malformed_lines_fail_initialize() {
        let propagator = Sgp4Propagator::new();

        let short = OrbitalElementRecord::new("BAD", &ISS_LINE1[..50], ISS_LINE2, ObjectKind::Debris);
        assert!(matches!(
            propagator.initialize(&short),
            Err(InvalidRecordError::LineLength { line: 1, .. })
        ));

        let checksum = format!("{}?", &ISS_LINE2[..68]);
        let bad = OrbitalElementRecord::new("BAD", ISS_LINE1, checksum, ObjectKind::Debris);
        assert!(matches!(
            propagator.initialize(&bad),
            Err(InvalidRecordError::ChecksumNotNumeric { line: 2, .. })
        ));
    }

    #[test]
    fn test_subsurface_orbit_at_epoch_fails_initialize() {
        let propagator = Sgp4Propagator::new();
        // 18.5 rev/day puts the semi-major axis inside the planet
        let line2 = "2 33591  99.1000 100.0000 0014000 200.0000 160.0000 18.50000000770005";
        let record = OrbitalElementRecord::new("LOW", NOAA_LINE1, line2, ObjectKind::Debris);

        match propagator.initialize(&record) {
            Err(InvalidRecordError::Epoch(PropagationError::Decayed { radius_km })) => {
                assert!(radius_km < EARTH_RADIUS_KM);
            }
            other => panic!("expected a decayed orbit, got {:?}", other),
        }
    }

    #[test]
    fn test_handle_exposes_elements_and_age() {
        let propagator = Sgp4Propagator::new();
        let handle = propagator.initialize(&iss()).unwrap();

        assert_eq!(handle.elements().catalog_number, "25544");
        assert!(handle.age_days(handle.epoch()).abs() < 1e-6);
        let later = handle.epoch() + Duration::hours(36);
        assert!((handle.age_days(later) - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_validate_state_rejects_non_physical() {
        let nan = EciState {
            position: Vector3::new(f64::NAN, 0.0, 0.0),
            velocity: Vector3::zeros(),
        };
        assert_eq!(validate_state(nan), Err(PropagationError::NonFinite));

        let buried = EciState {
            position: Vector3::new(6000.0, 0.0, 0.0),
            velocity: Vector3::new(0.0, 7.0, 0.0),
        };
        assert!(matches!(
            validate_state(buried),
            Err(PropagationError::Decayed { .. })
        ));
    }

    #[test]
    fn test_minutes_since_epoch() {
        let epoch = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        assert_eq!(minutes_since(epoch, epoch), 0.0);
        assert_eq!(minutes_since(epoch, epoch + Duration::seconds(90)), 1.5);
        assert_eq!(minutes_since(epoch, epoch - Duration::minutes(2)), -2.0);
    }
}
