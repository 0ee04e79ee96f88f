//! Orbital propagation and coordinate conversion
//!
//! - `elements` validates fixed-format element lines
//! - `propagator` turns a record into a reusable SGP4 handle and advances it
//! - `coordinates` converts inertial positions to geodetic and scene space

pub mod coordinates;
pub mod elements;
mod propagator;

pub use coordinates::{eci_to_scene, gmst, to_geodetic, to_renderable, Geodetic};
pub use elements::ElementSet;
pub use propagator::*;

/// Mean Earth radius in kilometers, one scene unit of altitude
pub const EARTH_RADIUS_KM: f64 = 6371.0;
