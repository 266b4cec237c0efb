//! Error reporting for survey reduction

pub mod error;

pub use error::{SurveyError, SurveyResult};
