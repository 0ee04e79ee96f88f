//! Planet rotation, Moon placement and Sun lighting for a given instant
//!
//! All three are cheap closed-form expressions recomputed every frame. The Sun
//! uses the low-precision solar ephemeris (about 0.01° over this century),
//! which is plenty for a lighting direction.

use std::f64::consts::TAU;

use chrono::{DateTime, Timelike, Utc};
use glam::Vec3;

use super::Camera;
use crate::propagation::coordinates::julian_centuries;

/// Moon orbit radius in planet radii
pub const MOON_ORBIT_RADIUS: f32 = 60.3;
/// Sidereal month in seconds
pub const MOON_ORBIT_PERIOD_S: f64 = 27.3 * 86_400.0;
pub const MOON_INCLINATION_DEG: f64 = 5.14;
/// Distance of the directional light from the scene origin
pub const SUN_LIGHT_DISTANCE: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoonState {
    /// Scene position of the Moon's center
    pub position: Vec3,
    /// Spin about +Y, keeps the same face towards the planet
    pub rotation_y: f32,
}

/// Everything the renderer needs besides marker positions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Environment {
    /// Planet rotation about +Y in radians
    pub earth_rotation: f32,
    pub moon: MoonState,
    /// Unit vector towards the Sun, world frame
    pub sun_direction: Vec3,
    /// Unit vector towards the Sun, camera frame
    pub sun_light_direction: Vec3,
    /// Directional light position in the camera frame
    pub sun_light_position: Vec3,
}

impl Environment {
    pub fn compute(at: DateTime<Utc>, camera: &Camera) -> Self {
        let sun_direction = sun_direction(at);
        let sun_light_direction = camera.to_camera_frame(sun_direction).normalize_or_zero();

        Self {
            earth_rotation: earth_rotation_angle(at),
            moon: moon_state(at),
            sun_direction,
            sun_light_direction,
            sun_light_position: sun_light_direction * SUN_LIGHT_DISTANCE,
        }
    }
}

/// Planet rotation from whole seconds elapsed since UTC midnight
pub fn earth_rotation_angle(at: DateTime<Utc>) -> f32 {
    let seconds = at.num_seconds_from_midnight() as f64;
    (seconds / 86_400.0 * TAU) as f32
}

/// Circular inclined orbit, phase from Unix time
pub fn moon_state(at: DateTime<Utc>) -> MoonState {
    let seconds = at.timestamp_millis() as f64 / 1000.0;
    let angle = seconds.rem_euclid(MOON_ORBIT_PERIOD_S) / MOON_ORBIT_PERIOD_S * TAU;
    let r = MOON_ORBIT_RADIUS as f64;

    MoonState {
        position: Vec3::new(
            (angle.cos() * r) as f32,
            (angle.sin() * r * MOON_INCLINATION_DEG.to_radians().sin()) as f32,
            (angle.sin() * r) as f32,
        ),
        rotation_y: -angle as f32,
    }
}

/// Unit vector from the planet towards the Sun in scene axes
pub fn sun_direction(at: DateTime<Utc>) -> Vec3 {
    let t = julian_centuries(at);

    let mean_longitude = (280.46646 + t * (36_000.76983 + t * 0.0003032)) % 360.0;
    let mean_anomaly = (357.52911 + t * (35_999.05029 - 0.0001537 * t)).to_radians();
    let ecliptic_longitude = (mean_longitude
        + 1.914602 * mean_anomaly.sin()
        + 0.019993 * (2.0 * mean_anomaly).sin())
    .to_radians();
    let obliquity = (23.439 - 0.0000004 * t).to_radians();

    // Equatorial cartesian, then onto Y-up scene axes
    let x = ecliptic_longitude.cos();
    let y = obliquity.cos() * ecliptic_longitude.sin();
    let z = obliquity.sin() * ecliptic_longitude.sin();

    Vec3::new(-x as f32, z as f32, -y as f32).normalize_or_zero()
}
