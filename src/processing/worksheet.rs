//! Worksheet schema for tie-in and survey sheets
//!
//! Spreadsheets arrive already converted to a workbook of named worksheets,
//! each a list of rows keyed by column header. Rows are checked against the
//! schema for their sheet kind here, once, so the algorithms only ever see
//! typed shots.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::core::{
    Point, Shot, Survey, SurveyKind, SurveyShot, TieInEntry, RESERVED_SURVEY_LETTER, TRIPOD_SUFFIX,
};
use crate::validation::{SurveyError, SurveyResult};

pub const COL_FROM: &str = "From";
pub const COL_TO: &str = "To";
pub const COL_POINT: &str = "Point";
pub const COL_DISTANCE: &str = "Dist m";
pub const COL_AZIMUTH: &str = "Azm";
pub const COL_INCLINATION: &str = "Inc";
pub const COL_DOWN: &str = "Down m";
pub const COL_BACK: &str = "Back m";
pub const COL_COMMENT: &str = "Comment";
pub const COL_EAST: &str = "UTM East";
pub const COL_NORTH: &str = "UTM North";
pub const COL_ALTITUDE: &str = "Alt m";

/// A single spreadsheet cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
    Empty,
}

impl Cell {
    /// Numeric value; blank cells are `Ok(None)`, unparseable text is `Err` with the raw text
    pub fn as_f64(&self) -> Result<Option<f64>, String> {
        match self {
            Cell::Number(value) => Ok(Some(*value)),
            Cell::Text(text) => {
                let text = text.trim();
                if text.is_empty() {
                    Ok(None)
                } else {
                    text.parse::<f64>().map(Some).map_err(|_| text.to_string())
                }
            }
            Cell::Empty => Ok(None),
        }
    }

    /// Text value; whole numbers print without a fractional part
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Number(value) if value.fract() == 0.0 => Some(format!("{:.0}", value)),
            Cell::Number(value) => Some(value.to_string()),
            Cell::Text(text) => {
                let text = text.trim();
                (!text.is_empty()).then(|| text.to_string())
            }
            Cell::Empty => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.as_text().is_none()
    }
}

/// One worksheet row keyed by column header
pub type Row = BTreeMap<String, Cell>;

/// Classification of a worksheet by its name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetKind {
    TieIn,
    Perimeter,
    Transect,
}

impl SheetKind {
    pub fn classify(name: &str) -> Self {
        let lower = name.to_lowercase();
        if lower.replace('-', "") == "tiein" {
            SheetKind::TieIn
        } else if lower.contains("transect") {
            SheetKind::Transect
        } else {
            SheetKind::Perimeter
        }
    }

    pub fn survey_kind(self) -> Option<SurveyKind> {
        match self {
            SheetKind::TieIn => None,
            SheetKind::Perimeter => Some(SurveyKind::Perimeter),
            SheetKind::Transect => Some(SurveyKind::Transect),
        }
    }
}

/// Typed access to one row, reporting schema violations with their location
struct RowReader<'a> {
    sheet: &'a str,
    row: usize,
    cells: &'a Row,
}

impl<'a> RowReader<'a> {
    fn new(sheet: &'a str, index: usize, cells: &'a Row) -> Self {
        Self {
            sheet,
            row: index + 1,
            cells,
        }
    }

    fn missing(&self, field: &str) -> SurveyError {
        SurveyError::MissingField {
            sheet: self.sheet.to_string(),
            row: self.row,
            field: field.to_string(),
        }
    }

    fn invalid(&self, field: &str, value: impl ToString) -> SurveyError {
        SurveyError::InvalidField {
            sheet: self.sheet.to_string(),
            row: self.row,
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    fn text(&self, field: &str) -> Option<String> {
        self.cells.get(field).and_then(Cell::as_text)
    }

    fn required_text(&self, field: &str) -> SurveyResult<String> {
        self.text(field).ok_or_else(|| self.missing(field))
    }

    fn number(&self, field: &str) -> SurveyResult<Option<f64>> {
        match self.cells.get(field) {
            None => Ok(None),
            Some(cell) => cell.as_f64().map_err(|raw| self.invalid(field, raw)),
        }
    }

    fn required_number(&self, field: &str) -> SurveyResult<f64> {
        self.number(field)?.ok_or_else(|| self.missing(field))
    }

    /// Non-negative length; absent or zero means "not measured"
    fn length(&self, field: &str) -> SurveyResult<Option<f64>> {
        match self.number(field)? {
            Some(value) if value < 0.0 || !value.is_finite() => Err(self.invalid(field, value)),
            Some(value) if value == 0.0 => Ok(None),
            other => Ok(other),
        }
    }

    fn azimuth(&self) -> SurveyResult<f64> {
        let value = self.required_number(COL_AZIMUTH)?;
        if !(0.0..=360.0).contains(&value) {
            return Err(self.invalid(COL_AZIMUTH, value));
        }
        Ok(value)
    }

    fn inclination(&self) -> SurveyResult<f64> {
        let value = self.required_number(COL_INCLINATION)?;
        if !(-90.0..=90.0).contains(&value) {
            return Err(self.invalid(COL_INCLINATION, value));
        }
        Ok(value)
    }

    fn point_number(&self) -> SurveyResult<Option<u32>> {
        match self.number(COL_POINT)? {
            None => Ok(None),
            Some(value) if value >= 0.0 && value.fract() == 0.0 && value <= u32::MAX as f64 => {
                Ok(Some(value as u32))
            }
            Some(value) => Err(self.invalid(COL_POINT, value)),
        }
    }
}

/// A validated tie-in row
#[derive(Debug, Clone, PartialEq)]
pub struct TieInRow {
    pub entry: TieInEntry,
    /// Fixed coordinate of the `To` station, when the row carries one
    pub anchor: Option<Point>,
}

impl TieInRow {
    pub fn parse(sheet: &str, index: usize, cells: &Row) -> SurveyResult<Self> {
        let reader = RowReader::new(sheet, index, cells);
        let from = reader.required_text(COL_FROM)?;
        let to = reader.required_text(COL_TO)?;

        let distance = reader.required_number(COL_DISTANCE)?;
        if distance < 0.0 || !distance.is_finite() {
            return Err(reader.invalid(COL_DISTANCE, distance));
        }
        let mut shot = Shot::new(distance, reader.azimuth()?, reader.inclination()?);
        shot.comment = reader.text(COL_COMMENT);

        let anchor = match reader.number(COL_ALTITUDE)? {
            Some(altitude) => Some(Point::new(
                reader.number(COL_EAST)?.unwrap_or(0.0),
                reader.number(COL_NORTH)?.unwrap_or(0.0),
                altitude,
            )),
            None => None,
        };

        Ok(Self {
            entry: TieInEntry::new(from, to, shot),
            anchor,
        })
    }
}

/// A validated survey row
pub struct SurveyRow;

impl SurveyRow {
    /// Rows without a distance parse as blanks
    pub fn parse(sheet: &str, index: usize, cells: &Row) -> SurveyResult<SurveyShot> {
        let reader = RowReader::new(sheet, index, cells);
        let point = reader.point_number()?;

        let Some(distance) = reader.length(COL_DISTANCE)? else {
            return Ok(SurveyShot::blank(point));
        };

        let mut shot = Shot::new(distance, reader.azimuth()?, reader.inclination()?);
        shot.down = reader.length(COL_DOWN)?;
        shot.back = reader.length(COL_BACK)?;
        shot.comment = reader.text(COL_COMMENT);
        Ok(SurveyShot::new(point, shot))
    }
}

/// Shots and anchors read from a tie-in worksheet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TieInNetwork {
    pub entries: Vec<TieInEntry>,
    pub anchors: BTreeMap<String, Point>,
}

impl TieInNetwork {
    /// Add an anchor; a later definition of a station replaces an earlier one
    pub fn add_anchor(&mut self, station: &str, point: Point) {
        match self.anchors.get(station) {
            Some(existing) if existing.coords() != point.coords() => {
                warn!(
                    "Fixed station {} redefined: {:?} replaces {:?}",
                    station,
                    point.coords(),
                    existing.coords()
                );
            }
            Some(_) => {}
            None => info!("Found fixed station {} at {:?}", station, point.coords()),
        }
        self.anchors.insert(station.to_string(), point);
    }
}

/// A named worksheet of header-keyed rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Worksheet {
    pub name: String,
    #[serde(default)]
    pub rows: Vec<Row>,
}

impl Worksheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
        }
    }

    pub fn with_row<K, I>(mut self, cells: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Cell)>,
    {
        self.rows
            .push(cells.into_iter().map(|(k, v)| (k.into(), v)).collect());
        self
    }

    pub fn kind(&self) -> SheetKind {
        SheetKind::classify(&self.name)
    }

    /// Leading token of the sheet name
    pub fn survey_id(&self) -> SurveyResult<String> {
        let id = self
            .name
            .split_whitespace()
            .next()
            .ok_or_else(|| SurveyError::InvalidSheetName {
                name: self.name.clone(),
            })?;
        if id.to_uppercase().starts_with(RESERVED_SURVEY_LETTER) {
            return Err(SurveyError::ReservedSurveyId { id: id.to_string() });
        }
        Ok(id.to_string())
    }

    /// Station the survey's tripod stood on, e.g. `A` -> `A0`
    pub fn tripod_station(&self) -> SurveyResult<String> {
        Ok(format!("{}{}", self.survey_id()?, TRIPOD_SUFFIX))
    }

    pub fn tie_in_network(&self) -> SurveyResult<TieInNetwork> {
        let mut network = TieInNetwork::default();
        for (index, cells) in self.rows.iter().enumerate() {
            if cells.values().all(Cell::is_blank) {
                continue;
            }
            let row = TieInRow::parse(&self.name, index, cells)?;
            if let Some(anchor) = row.anchor {
                network.add_anchor(&row.entry.to, anchor);
            }
            network.entries.push(row.entry);
        }
        Ok(network)
    }

    /// Build the survey for a perimeter or transect sheet
    pub fn survey(&self) -> SurveyResult<Survey> {
        let kind = self.kind().survey_kind().ok_or_else(|| SurveyError::InvalidSheetName {
            name: self.name.clone(),
        })?;
        let id = self.survey_id()?;
        let mut survey = Survey::new(id.clone(), format!("{}{}", id, TRIPOD_SUFFIX), kind);

        for (index, cells) in self.rows.iter().enumerate() {
            let shot = SurveyRow::parse(&self.name, index, cells)?;
            if shot.shot.is_none() && cells.values().any(|c| !c.is_blank()) {
                debug!("{}: skipping row {} with no distance", self.name, index + 1);
            }
            survey.push(shot);
        }
        Ok(survey)
    }
}

/// All worksheets of one field workbook, in sheet order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    pub worksheets: Vec<Worksheet>,
}

impl Workbook {
    pub fn new(worksheets: Vec<Worksheet>) -> Self {
        Self { worksheets }
    }

    pub fn from_json_str(json: &str) -> SurveyResult<Self> {
        serde_json::from_str(json).map_err(|e| SurveyError::WorkbookRead {
            message: e.to_string(),
        })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> SurveyResult<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        let content = fs::read_to_string(&path).map_err(|e| SurveyError::WorkbookRead {
            message: format!("Failed to read '{}': {}", path_str, e),
        })?;
        serde_json::from_str(&content).map_err(|e| SurveyError::WorkbookRead {
            message: format!("Failed to parse '{}': {}", path_str, e),
        })
    }

    pub fn tie_in_sheet(&self) -> Option<&Worksheet> {
        self.worksheets
            .iter()
            .find(|sheet| sheet.kind() == SheetKind::TieIn)
    }

    pub fn survey_sheets(&self) -> impl Iterator<Item = &Worksheet> {
        self.worksheets
            .iter()
            .filter(|sheet| sheet.kind() != SheetKind::TieIn)
    }
}
