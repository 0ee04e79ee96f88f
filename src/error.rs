//! Error taxonomy for the tracking pipeline
//!
//! Per-object failures are typed so ingestion and the frame loop can log and
//! skip them. Structural failures (unreadable files, a body that is not a
//! record array) go through `anyhow` at the loader boundary instead.

use thiserror::Error;

/// An element record that cannot become a tracked object.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidRecordError {
    /// The record did not match the `{name, line1, line2, type, description?}` shape
    #[error("record does not match schema: {0}")]
    Schema(String),

    #[error("record name is empty")]
    EmptyName,

    #[error("line {line} contains non-ASCII characters")]
    NonAscii { line: u8 },

    #[error("line {line} has length {actual}, expected {expected}")]
    LineLength {
        line: u8,
        actual: usize,
        expected: usize,
    },

    #[error("line {line} must start with '{line}', found {found:?}")]
    LineNumber { line: u8, found: char },

    #[error("line {line} checksum column {found:?} is not a digit")]
    ChecksumNotNumeric { line: u8, found: char },

    #[error("line {line} checksum mismatch: expected {expected}, found {found}")]
    ChecksumMismatch { line: u8, expected: u32, found: u32 },

    #[error("catalog numbers differ between lines ({line1:?} vs {line2:?})")]
    CatalogMismatch { line1: String, line2: String },

    #[error("field {field} on line {line} is not numeric: {value:?}")]
    Field {
        line: u8,
        field: &'static str,
        value: String,
    },

    #[error("eccentricity {0} is outside [0, 1)")]
    Eccentricity(f64),

    #[error("mean motion {0} rev/day is not positive")]
    MeanMotion(f64),

    /// The propagation model refused the element set
    #[error("propagation model rejected elements: {0}")]
    Model(String),

    /// The element set parses but yields no valid state at its own epoch
    #[error("element set has no valid state at epoch: {0}")]
    Epoch(#[from] PropagationError),
}

/// Propagation to a given instant produced no usable state.
///
/// Transient by nature: the object stays tracked and is retried next frame.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PropagationError {
    #[error("propagation model error: {0}")]
    Model(String),

    #[error("state is not finite")]
    NonFinite,

    /// Radius below the planet surface, orbit decayed past the model domain
    #[error("orbit decayed (radius {radius_km:.1} km)")]
    Decayed { radius_km: f64 },
}

/// Per-record admission failure raised while draining the ingestion queue.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackError {
    #[error(transparent)]
    Invalid(#[from] InvalidRecordError),

    #[error("record {name:?} is already tracked")]
    Duplicate { name: String },
}
