//! satscope - satellite tracking and coordinate pipeline
//!
//! Turns two-line element records into live scene positions around a
//! rendered planet: batched ingestion, SGP4 propagation, inertial to
//! geodetic to scene conversion every frame, and pointer picking with timed
//! popups. Rendering itself is left to whoever implements
//! [`renderer::SceneSink`].

pub mod config;
pub mod data;
pub mod error;
pub mod frame;
pub mod ingest;
pub mod propagation;
pub mod renderer;
pub mod selection;
pub mod tracker;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::TrackerConfig;
pub use error::{InvalidRecordError, PropagationError, TrackError};
pub use tracker::Tracker;
