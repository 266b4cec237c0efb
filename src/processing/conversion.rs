//! Workbook-to-coordinates conversion pipeline
//!
//! Tie-in sheet -> station table -> one projected point list per survey sheet.

use log::{info, warn};
use serde::Serialize;

use crate::algorithms::projector::SurveyProjector;
use crate::algorithms::resolver::{ResolutionReport, StationResolver, StationTable};
use crate::core::{Point, SurveyKind};
use crate::processing::worksheet::Workbook;
use crate::utils::config::{ConfigurationManager, ConversionConfig};
use crate::validation::{SurveyError, SurveyResult};

/// Points produced for one survey worksheet
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectedSurvey {
    /// Worksheet name
    pub name: String,
    pub id: String,
    pub kind: SurveyKind,
    pub origin: Point,
    pub points: Vec<Point>,
}

impl ProjectedSurvey {
    /// Closed outline of a perimeter survey, first vertex repeated at the end;
    /// `None` for transects and for perimeters with fewer than three points
    pub fn perimeter_ring(&self) -> Option<Vec<(f64, f64, f64)>> {
        if self.kind != SurveyKind::Perimeter || self.points.len() < 3 {
            return None;
        }
        let mut ring: Vec<_> = self.points.iter().map(Point::coords).collect();
        ring.push(self.points[0].coords());
        Some(ring)
    }
}

/// Result of converting a workbook
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub stations: StationTable,
    pub report: ResolutionReport,
    pub surveys: Vec<ProjectedSurvey>,
}

impl Conversion {
    /// Every survey point, paired with its worksheet name, in workbook order
    pub fn all_points(&self) -> impl Iterator<Item = (&str, &Point)> {
        self.surveys
            .iter()
            .flat_map(|s| s.points.iter().map(move |p| (s.name.as_str(), p)))
    }

    pub fn survey(&self, name: &str) -> Option<&ProjectedSurvey> {
        self.surveys.iter().find(|s| s.name == name)
    }
}

/// Converts field workbooks using a fixed configuration
#[derive(Debug, Clone, Default)]
pub struct Converter {
    config: ConversionConfig,
}

impl Converter {
    pub fn new(config: ConversionConfig) -> Self {
        Self { config }
    }

    /// Like `new`, but rejects an invalid configuration up front
    pub fn try_new(config: ConversionConfig) -> SurveyResult<Self> {
        ConfigurationManager::validate_config(&config)?;
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    fn resolver(&self) -> StationResolver {
        StationResolver::new()
            .with_max_passes(self.config.max_passes)
            .with_stop_when_stalled(self.config.stop_when_stalled)
    }

    /// Georeference the tie-in network of a workbook
    pub fn resolve_stations(
        &self,
        workbook: &Workbook,
    ) -> SurveyResult<(StationTable, ResolutionReport)> {
        let sheet = workbook.tie_in_sheet().ok_or_else(|| SurveyError::MissingTieIn {
            reason: "no worksheet named 'Tie-In'".to_string(),
        })?;

        let network = sheet.tie_in_network()?;
        if network.anchors.is_empty() {
            return Err(SurveyError::MissingTieIn {
                reason: format!(
                    "worksheet '{}' has no fixed station (no 'Alt m' values)",
                    sheet.name
                ),
            });
        }

        self.resolver()
            .resolve_with_report(&network.entries, &network.anchors)
    }

    pub fn convert(&self, workbook: &Workbook) -> SurveyResult<Conversion> {
        if self.config.declination_deg != 0.0 {
            // recorded only; azimuths are used as measured
            warn!(
                "Magnetic declination {:.2} deg is not applied to azimuths",
                self.config.declination_deg
            );
        }

        let (stations, report) = self.resolve_stations(workbook)?;

        let mut surveys = Vec::new();
        for sheet in workbook.survey_sheets() {
            let survey = sheet.survey()?;
            let origin = stations
                .point(&survey.origin)
                .cloned()
                .ok_or_else(|| SurveyError::MissingOrigin {
                    survey: sheet.name.clone(),
                    station: survey.origin.clone(),
                })?;

            info!(
                "{} ({:?}) from {}: {} shot(s)",
                sheet.name,
                survey.kind,
                survey.origin,
                survey.measured_count()
            );
            let points = SurveyProjector::new(&survey, origin.clone()).points();

            surveys.push(ProjectedSurvey {
                name: sheet.name.clone(),
                id: survey.id,
                kind: survey.kind,
                origin,
                points,
            });
        }

        Ok(Conversion {
            stations,
            report,
            surveys,
        })
    }
}
