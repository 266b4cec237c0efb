//! Output interfaces
//!
//! Records produced for external writers (shapefile, CSV and survey-format
//! tools) and the formatters that serialize them.

pub mod formatting;

pub use formatting::{
    write_output, CsvFormatter, JsonFormatter, OutputError, PointFormatter, PointRecord,
    TextFormatter,
};
