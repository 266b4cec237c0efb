//! Ice Survey Reduction
//!
//! Converts polar field measurements of cave-ice formations into absolute 3D
//! coordinates, anchored to fixed stations through a tie-in network.

pub mod core;
pub mod algorithms;
pub mod processing;
pub mod validation;
pub mod utils;
pub mod api;

// Re-export commonly used types
pub use crate::core::{Point, Shot, Survey, SurveyKind, SurveyShot, TieInEntry, DEFAULT_MAX_PASSES};
pub use algorithms::{
    shoot, ProjectedPoints, ResolutionReport, StationResolver, StationState, StationTable,
    SurveyProjector,
};
pub use processing::{Conversion, Converter, ProjectedSurvey, SheetKind, Workbook, Worksheet};
pub use validation::{SurveyError, SurveyResult};
pub use utils::{ConfigError, ConfigurationManager, ConversionConfig, OutputConfig, OutputFormat};
pub use api::{CsvFormatter, JsonFormatter, OutputError, PointFormatter, PointRecord, TextFormatter};
