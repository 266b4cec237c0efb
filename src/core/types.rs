//! Core data types for survey reduction

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use super::constants::SURFACE_PREFIX;

/// Absolute 3D coordinate in the local Cartesian frame (meters, x east, y north, z up)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Point {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z, name: None }
    }

    pub fn named(x: f64, y: f64, z: f64, name: impl Into<String>) -> Self {
        Self { x, y, z, name: Some(name.into()) }
    }

    pub fn from_vector3(v: Vector3<f64>) -> Self {
        Self::new(v.x, v.y, v.z)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn to_vector3(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }

    pub fn coords(&self) -> (f64, f64, f64) {
        (self.x, self.y, self.z)
    }

    /// Whether this point was named as a bare ice-surface point
    pub fn is_surface(&self) -> bool {
        self.name
            .as_deref()
            .is_some_and(|name| name.starts_with(SURFACE_PREFIX))
    }
}

/// A single polar measurement with optional dependent auxiliary shots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shot {
    /// Slope distance (meters)
    pub distance: f64,
    /// Compass bearing, clockwise from local north (degrees)
    pub azimuth: f64,
    /// Vertical angle, positive up (degrees)
    pub inclination: f64,
    /// Vertical drop taken from the shot's endpoint (meters)
    #[serde(default)]
    pub down: Option<f64>,
    /// Horizontal back-sight taken after the down shot, or from the endpoint (meters)
    #[serde(default)]
    pub back: Option<f64>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl Shot {
    pub fn new(distance: f64, azimuth: f64, inclination: f64) -> Self {
        Self {
            distance,
            azimuth,
            inclination,
            down: None,
            back: None,
            comment: None,
        }
    }

    pub fn with_down(mut self, down: f64) -> Self {
        self.down = Some(down);
        self
    }

    pub fn with_back(mut self, back: f64) -> Self {
        self.back = Some(back);
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// True when the shot has neither a down nor a back measurement
    pub fn is_bare(&self) -> bool {
        self.down.is_none() && self.back.is_none()
    }
}

/// One tie-in measurement between two named stations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TieInEntry {
    pub from: String,
    pub to: String,
    pub shot: Shot,
}

impl TieInEntry {
    pub fn new(from: impl Into<String>, to: impl Into<String>, shot: Shot) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            shot,
        }
    }
}

/// A survey worksheet row; `shot` is `None` for rows without a recorded distance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyShot {
    /// Point number as recorded in the field book
    pub point: Option<u32>,
    pub shot: Option<Shot>,
}

impl SurveyShot {
    pub fn new(point: Option<u32>, shot: Shot) -> Self {
        Self { point, shot: Some(shot) }
    }

    pub fn blank(point: Option<u32>) -> Self {
        Self { point, shot: None }
    }
}

/// Purpose of a survey worksheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurveyKind {
    /// Outline of an ice formation
    Perimeter,
    /// Interior measurement line
    Transect,
}

/// A fan of shots taken from a single tripod station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Survey {
    pub id: String,
    pub origin: String,
    pub kind: SurveyKind,
    pub shots: Vec<SurveyShot>,
}

impl Survey {
    pub fn new(id: impl Into<String>, origin: impl Into<String>, kind: SurveyKind) -> Self {
        Self {
            id: id.into(),
            origin: origin.into(),
            kind,
            shots: Vec::new(),
        }
    }

    pub fn with_shot(mut self, point: u32, shot: Shot) -> Self {
        self.shots.push(SurveyShot::new(Some(point), shot));
        self
    }

    pub fn push(&mut self, shot: SurveyShot) {
        self.shots.push(shot);
    }

    /// Number of rows carrying a usable shot
    pub fn measured_count(&self) -> usize {
        self.shots.iter().filter(|s| s.shot.is_some()).count()
    }
}
