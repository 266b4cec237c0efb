//! Survey shot projection
//!
//! Every shot in a survey is taken from the same tripod station. A shot yields
//! its primary point, then the down point and back point when those auxiliary
//! measurements were recorded. Point names follow the field convention:
//!
//! | shot carries   | primary    | down        | back        |
//! |----------------|------------|-------------|-------------|
//! | nothing        | `S_A01`    |             |             |
//! | down           | `A01`      | `S_dA01`    |             |
//! | back           | `A01`      |             | `S_bA01`    |
//! | down and back  | `A01`      | `dA01`      | `S_bA01`    |

use std::iter::Enumerate;
use std::slice;
use std::vec;

use crate::algorithms::geometry::project_shot;
use crate::core::{Point, Shot, Survey, SurveyShot, BACK_MARKER, DOWN_MARKER, SURFACE_PREFIX};

/// Station names derived from a survey id and point number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationNaming {
    base: String,
}

impl StationNaming {
    pub fn new(survey_id: &str, point: u32) -> Self {
        Self {
            base: format!("{}{:02}", survey_id, point),
        }
    }

    pub fn primary(&self, shot: &Shot) -> String {
        if shot.is_bare() {
            format!("{}{}", SURFACE_PREFIX, self.base)
        } else {
            self.base.clone()
        }
    }

    pub fn down(&self, shot: &Shot) -> String {
        if shot.back.is_some() {
            format!("{}{}", DOWN_MARKER, self.base)
        } else {
            format!("{}{}{}", SURFACE_PREFIX, DOWN_MARKER, self.base)
        }
    }

    pub fn back(&self) -> String {
        format!("{}{}{}", SURFACE_PREFIX, BACK_MARKER, self.base)
    }
}

/// Projects a survey's shots from its resolved tripod station
#[derive(Debug, Clone)]
pub struct SurveyProjector<'a> {
    survey: &'a Survey,
    origin: Point,
}

impl<'a> SurveyProjector<'a> {
    pub fn new(survey: &'a Survey, origin: Point) -> Self {
        Self { survey, origin }
    }

    /// Fresh pass over the survey; each call yields the same sequence
    pub fn iter(&self) -> ProjectedPoints<'_> {
        ProjectedPoints {
            survey_id: &self.survey.id,
            origin: &self.origin,
            rows: self.survey.shots.iter().enumerate(),
            pending: Vec::new().into_iter(),
        }
    }

    pub fn points(&self) -> Vec<Point> {
        self.iter().collect()
    }
}

impl<'p, 'a> IntoIterator for &'p SurveyProjector<'a> {
    type Item = Point;
    type IntoIter = ProjectedPoints<'p>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lazy sequence of named points for one survey
#[derive(Debug, Clone)]
pub struct ProjectedPoints<'a> {
    survey_id: &'a str,
    origin: &'a Point,
    rows: Enumerate<slice::Iter<'a, SurveyShot>>,
    pending: vec::IntoIter<Point>,
}

impl ProjectedPoints<'_> {
    fn expand(&self, index: usize, row: &SurveyShot, shot: &Shot) -> Vec<Point> {
        let point = row.point.unwrap_or(index as u32 + 1);
        let naming = StationNaming::new(self.survey_id, point);
        let projected = project_shot(self.origin, shot);

        let mut points = Vec::with_capacity(3);
        points.push(projected.primary.with_name(naming.primary(shot)));
        if let Some(down) = projected.down {
            points.push(down.with_name(naming.down(shot)));
        }
        if let Some(back) = projected.back {
            points.push(back.with_name(naming.back()));
        }
        points
    }
}

impl Iterator for ProjectedPoints<'_> {
    type Item = Point;

    fn next(&mut self) -> Option<Point> {
        loop {
            if let Some(point) = self.pending.next() {
                return Some(point);
            }
            let (index, row) = self.rows.next()?;
            // rows without a distance are blanks
            let Some(shot) = row.shot.as_ref() else {
                continue;
            };
            self.pending = self.expand(index, row, shot).into_iter();
        }
    }
}
