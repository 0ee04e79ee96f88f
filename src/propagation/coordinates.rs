//! Inertial → geodetic → scene coordinate conversion
//!
//! The scene convention is fixed and shared with the renderer:
//!
//! - Y is the polar axis, north is `+Y`
//! - polar angle `φ = (90° − lat)`, azimuth `θ = (lon + 180°)`
//! - `x = −r·sinφ·cosθ`, `y = r·cosφ`, `z = r·sinφ·sinθ`
//!
//! With this parametrization the prime meridian on the equator lands on `+X`
//! and eastern longitudes move towards `−Z`. Radii are in scene units where
//! the planet body has radius `body_radius` (1.0 by default) and one unit of
//! altitude is one mean Earth radius (6371 km).

use std::f64::consts::{PI, TAU};

use chrono::{DateTime, Utc};
use glam::Vec3;
use nalgebra::Vector3;

use super::EARTH_RADIUS_KM;

/// WGS-84 semi-major axis (km)
const WGS84_A_KM: f64 = 6378.137;
/// WGS-84 semi-minor axis (km)
const WGS84_B_KM: f64 = 6356.7523142;

const GEODETIC_MAX_ITERATIONS: usize = 20;
const GEODETIC_TOLERANCE_RAD: f64 = 1e-12;

pub const JULIAN_DATE_UNIX_EPOCH: f64 = 2_440_587.5;
pub const JULIAN_DATE_J2000: f64 = 2_451_545.0;
pub const DAYS_PER_JULIAN_CENTURY: f64 = 36_525.0;

/// Latitude/longitude/altitude relative to the rotating planet
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geodetic {
    pub latitude_deg: f64,
    /// Wrapped to [-180, 180]
    pub longitude_deg: f64,
    pub altitude_km: f64,
}

/// Julian date (UT1 ≈ UTC) of an instant, millisecond resolution
pub fn julian_date(at: DateTime<Utc>) -> f64 {
    at.timestamp_millis() as f64 / 86_400_000.0 + JULIAN_DATE_UNIX_EPOCH
}

/// Julian centuries elapsed since J2000.0
pub fn julian_centuries(at: DateTime<Utc>) -> f64 {
    (julian_date(at) - JULIAN_DATE_J2000) / DAYS_PER_JULIAN_CENTURY
}

/// Greenwich mean sidereal time in radians, [0, 2π)
///
/// IAU-82 polynomial, the same one SGP4 uses internally.
pub fn gmst(at: DateTime<Utc>) -> f64 {
    let tut1 = julian_centuries(at);
    let seconds = -6.2e-6 * tut1 * tut1 * tut1
        + 0.093104 * tut1 * tut1
        + (876_600.0 * 3600.0 + 8_640_184.812866) * tut1
        + 67_310.54841;
    // 240 seconds of time per degree
    (seconds.to_radians() / 240.0).rem_euclid(TAU)
}

/// Convert an inertial position (km) to geodetic coordinates at `at`
pub fn to_geodetic(position_eci: &Vector3<f64>, at: DateTime<Utc>) -> Geodetic {
    eci_to_geodetic(position_eci, gmst(at))
}

/// Convert with a precomputed sidereal angle, for per-frame batches
pub fn eci_to_geodetic(position_eci: &Vector3<f64>, gmst: f64) -> Geodetic {
    let (x, y, z) = (position_eci.x, position_eci.y, position_eci.z);
    let f = (WGS84_A_KM - WGS84_B_KM) / WGS84_A_KM;
    let e2 = 2.0 * f - f * f;
    let r = (x * x + y * y).sqrt();

    let mut longitude = y.atan2(x) - gmst;
    longitude = (longitude + PI).rem_euclid(TAU) - PI;

    let mut latitude = z.atan2(r);
    let mut c = 1.0;
    for _ in 0..GEODETIC_MAX_ITERATIONS {
        let sin_lat = latitude.sin();
        c = 1.0 / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        let next = (z + WGS84_A_KM * c * e2 * sin_lat).atan2(r);
        let converged = (next - latitude).abs() < GEODETIC_TOLERANCE_RAD;
        latitude = next;
        if converged {
            break;
        }
    }

    let altitude_km = if latitude.cos().abs() > 1e-10 {
        r / latitude.cos() - WGS84_A_KM * c
    } else {
        // Over a pole
        z.abs() - WGS84_B_KM
    };

    Geodetic {
        latitude_deg: latitude.to_degrees(),
        longitude_deg: longitude.to_degrees(),
        altitude_km,
    }
}

/// Scene radius of an object at `altitude_km` above a body of `body_radius` units
pub fn scene_radius(body_radius: f32, altitude_km: f64) -> f32 {
    body_radius + (altitude_km / EARTH_RADIUS_KM) as f32
}

/// Map latitude/longitude/radius onto the scene's spherical parametrization
pub fn to_renderable(latitude_deg: f64, longitude_deg: f64, radius: f32) -> Vec3 {
    let phi = (90.0 - latitude_deg).to_radians();
    let theta = (longitude_deg + 180.0).to_radians();
    let r = radius as f64;

    Vec3::new(
        (-(r * phi.sin() * theta.cos())) as f32,
        (r * phi.cos()) as f32,
        (r * phi.sin() * theta.sin()) as f32,
    )
}

/// Full chain used per object per frame
pub fn eci_to_scene(position_eci: &Vector3<f64>, gmst: f64, body_radius: f32) -> (Geodetic, Vec3) {
    let geodetic = eci_to_geodetic(position_eci, gmst);
    let position = to_renderable(
        geodetic.latitude_deg,
        geodetic.longitude_deg,
        scene_radius(body_radius, geodetic.altitude_km),
    );
    (geodetic, position)
}
