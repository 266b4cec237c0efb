//! Worksheet input and conversion pipeline

pub mod worksheet;
pub mod conversion;

pub use worksheet::{Cell, Row, SheetKind, TieInNetwork, TieInRow, SurveyRow, Workbook, Worksheet};
pub use conversion::{Conversion, Converter, ProjectedSurvey};
