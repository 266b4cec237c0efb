//! Point output formatting
//!
//! Flattens projected surveys into `(survey, name, x, y, z)` records and writes
//! them as coordinate CSV, named CSV or JSON. A plain-text listing of the
//! station table is provided for diagnostics.

use std::fmt::Write as _;
use std::io::{self, Write};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::algorithms::resolver::{StationState, StationTable};
use crate::processing::conversion::Conversion;
use crate::utils::config::{OutputConfig, OutputFormat};

/// Errors raised while writing output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One output point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointRecord {
    pub survey: String,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl PointRecord {
    /// Records for every survey point, optionally only the ice-surface ones
    pub fn collect(conversion: &Conversion, surface_only: bool) -> Vec<PointRecord> {
        conversion
            .all_points()
            .filter(|(_, point)| !surface_only || point.is_surface())
            .map(|(survey, point)| PointRecord {
                survey: survey.to_string(),
                name: point.name.clone().unwrap_or_default(),
                x: point.x,
                y: point.y,
                z: point.z,
            })
            .collect()
    }
}

/// Writes point records to a byte sink
pub trait PointFormatter {
    fn write_records<W: Write>(&self, records: &[PointRecord], writer: W) -> Result<(), OutputError>;

    /// Render into an in-memory string
    fn format_records(&self, records: &[PointRecord]) -> Result<String, OutputError> {
        let mut buffer = Vec::new();
        self.write_records(records, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

/// CSV formatter
#[derive(Debug, Clone)]
pub struct CsvFormatter {
    /// Prefix each row with survey and point name
    pub named: bool,
    /// Decimal places for coordinates
    pub precision: usize,
}

impl Default for CsvFormatter {
    fn default() -> Self {
        Self {
            named: false,
            precision: 4,
        }
    }
}

impl CsvFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named() -> Self {
        Self {
            named: true,
            ..Self::default()
        }
    }

    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    pub fn header(&self) -> Vec<&'static str> {
        if self.named {
            vec!["Survey", "Name", "X", "Y", "Z"]
        } else {
            vec!["X", "Y", "Z"]
        }
    }
}

impl PointFormatter for CsvFormatter {
    fn write_records<W: Write>(&self, records: &[PointRecord], writer: W) -> Result<(), OutputError> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(self.header())?;

        let precision = self.precision;
        for record in records {
            let coords = [record.x, record.y, record.z].map(|v| format!("{:.*}", precision, v));
            if self.named {
                let labels = [record.survey.as_str(), record.name.as_str()];
                wtr.write_record(labels.into_iter().chain(coords.iter().map(String::as_str)))?;
            } else {
                wtr.write_record(&coords)?;
            }
        }

        wtr.flush()?;
        Ok(())
    }
}

/// JSON formatter
#[derive(Debug, Clone, Default)]
pub struct JsonFormatter {
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl PointFormatter for JsonFormatter {
    fn write_records<W: Write>(&self, records: &[PointRecord], mut writer: W) -> Result<(), OutputError> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut writer, records)?;
        } else {
            serde_json::to_writer(&mut writer, records)?;
        }
        writeln!(writer)?;
        Ok(())
    }
}

/// Write records in the configured format
pub fn write_output<W: Write>(
    output: &OutputConfig,
    records: &[PointRecord],
    writer: W,
) -> Result<(), OutputError> {
    match output.format {
        OutputFormat::Csv => CsvFormatter::new()
            .with_precision(output.precision)
            .write_records(records, writer),
        OutputFormat::NamedCsv => CsvFormatter::named()
            .with_precision(output.precision)
            .write_records(records, writer),
        OutputFormat::Json => JsonFormatter::pretty().write_records(records, writer),
    }
}

/// Plain-text station table listing
#[derive(Debug, Clone)]
pub struct TextFormatter {
    pub precision: usize,
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self { precision: 3 }
    }
}

impl TextFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn format_stations(&self, table: &StationTable) -> String {
        let width = table.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
        let mut text = String::new();
        for (name, state) in table.iter() {
            let _ = match state {
                StationState::Resolved(p) => writeln!(
                    text,
                    "{:<width$}  {:>14.prec$}  {:>14.prec$}  {:>10.prec$}",
                    name,
                    p.x,
                    p.y,
                    p.z,
                    width = width,
                    prec = self.precision
                ),
                StationState::Unresolved => {
                    writeln!(text, "{:<width$}  <unresolved>", name, width = width)
                }
            };
        }
        text
    }
}
