//! Deterministic propagator for pipeline tests

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use nalgebra::Vector3;

use crate::data::OrbitalElementRecord;
use crate::error::{InvalidRecordError, PropagationError};
use crate::propagation::{EciState, OrbitPropagator};

/// Equatorial circular orbit at 7000 km, phase driven by wall time.
///
/// Records whose line 1 is `MALFORMED` are rejected; objects named in
/// `failing` fail every propagation.
#[derive(Debug, Default)]
pub struct StubPropagator {
    pub failing: HashSet<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StubHandle {
    pub name: String,
    pub radius_km: f64,
}

impl OrbitPropagator for StubPropagator {
    type Handle = StubHandle;

    fn initialize(&self, record: &OrbitalElementRecord) -> Result<StubHandle, InvalidRecordError> {
        if record.line1 == "MALFORMED" {
            return Err(InvalidRecordError::LineLength {
                line: 1,
                actual: record.line1.len(),
                expected: 69,
            });
        }
        Ok(StubHandle {
            name: record.name.trim().to_string(),
            radius_km: 7000.0,
        })
    }

    fn propagate(&self, handle: &StubHandle, at: DateTime<Utc>) -> Result<EciState, PropagationError> {
        if self.failing.contains(&handle.name) {
            return Err(PropagationError::NonFinite);
        }
        let angle = at.timestamp_millis() as f64 / 1_000_000.0;
        Ok(EciState {
            position: Vector3::new(angle.cos(), angle.sin(), 0.0) * handle.radius_km,
            velocity: Vector3::new(-angle.sin(), angle.cos(), 0.0) * 7.5,
        })
    }
}
