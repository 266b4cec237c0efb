//! Polar shot geometry
//!
//! Converts a (distance, azimuth, inclination) measurement taken from a known
//! point into the absolute coordinate of the target. Azimuth is a compass
//! bearing (clockwise from local north) and inclination is positive upward.
//! Inputs are not validated here.

use nalgebra::Vector3;

use crate::core::{Point, Shot};

/// Cartesian offset (east, north, up) produced by a polar measurement
pub fn polar_offset(distance: f64, azimuth: f64, inclination: f64) -> Vector3<f64> {
    let azm = azimuth.to_radians();
    let inc = inclination.to_radians();
    let horizontal = distance * inc.cos();
    Vector3::new(
        horizontal * azm.sin(),
        horizontal * azm.cos(),
        distance * inc.sin(),
    )
}

/// Destination of a shot from `origin`; the result is unnamed
pub fn shoot(origin: &Point, distance: f64, azimuth: f64, inclination: f64) -> Point {
    Point::from_vector3(origin.to_vector3() + polar_offset(distance, azimuth, inclination))
}

/// Azimuth and inclination of the same line sighted from the other end
pub fn reverse_sight(azimuth: f64, inclination: f64) -> (f64, f64) {
    ((azimuth + 180.0).rem_euclid(360.0), -inclination)
}

/// Shoot backwards along a measurement: locate `from` given `to`
pub fn shoot_reversed(to: &Point, distance: f64, azimuth: f64, inclination: f64) -> Point {
    let (azimuth, inclination) = reverse_sight(azimuth, inclination);
    shoot(to, distance, azimuth, inclination)
}

/// Vertical drop from `from`; azimuth is carried but has no effect
pub fn down_shot(from: &Point, down: f64, azimuth: f64) -> Point {
    shoot(from, down, azimuth, -90.0)
}

/// Level back-sight from `from` along the shot's azimuth
pub fn back_shot(from: &Point, back: f64, azimuth: f64) -> Point {
    shoot(from, back, azimuth, 0.0)
}

/// Points reached by a shot and its auxiliary measurements
#[derive(Debug, Clone, PartialEq)]
pub struct ShotPoints {
    pub primary: Point,
    pub down: Option<Point>,
    pub back: Option<Point>,
}

/// Apply a full shot, chaining the back shot after the down shot when both are present
pub fn project_shot(origin: &Point, shot: &Shot) -> ShotPoints {
    let primary = shoot(origin, shot.distance, shot.azimuth, shot.inclination);
    let down = shot.down.map(|d| down_shot(&primary, d, shot.azimuth));
    let back = shot.back.map(|b| {
        let from = down.as_ref().unwrap_or(&primary);
        back_shot(from, b, shot.azimuth)
    });
    ShotPoints { primary, down, back }
}
