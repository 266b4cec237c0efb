//! Error types for survey reduction

use thiserror::Error;

use crate::algorithms::resolver::StationTable;
use crate::utils::config::ConfigError;

/// Errors raised while reducing a survey workbook
#[derive(Error, Debug, Clone)]
pub enum SurveyError {
    /// Some stations could not be reached from any anchor
    #[error(
        "Unable to georeference {} station(s) after {passes} pass(es): {}",
        .unresolved.len(),
        .unresolved.join(", ")
    )]
    UnderdeterminedNetwork {
        unresolved: Vec<String>,
        passes: usize,
        table: StationTable,
    },

    #[error("No usable tie-in survey: {reason}")]
    MissingTieIn { reason: String },

    #[error("Survey '{survey}' shoots from station {station}, which is not in the tie-in network")]
    MissingOrigin { survey: String, station: String },

    #[error("Worksheet '{sheet}' row {row}: missing required field '{field}'")]
    MissingField {
        sheet: String,
        row: usize,
        field: String,
    },

    #[error("Worksheet '{sheet}' row {row}: invalid {field} = '{value}'")]
    InvalidField {
        sheet: String,
        row: usize,
        field: String,
        value: String,
    },

    #[error("Survey identifier '{id}' is reserved for ice surface points")]
    ReservedSurveyId { id: String },

    #[error("Worksheet name '{name}' does not start with a survey identifier")]
    InvalidSheetName { name: String },

    #[error("Unable to read workbook: {message}")]
    WorkbookRead { message: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for survey reduction
pub type SurveyResult<T> = Result<T, SurveyError>;

impl SurveyError {
    /// Station table as it stood when resolution gave up
    pub fn partial_table(&self) -> Option<&StationTable> {
        match self {
            SurveyError::UnderdeterminedNetwork { table, .. } => Some(table),
            _ => None,
        }
    }

    /// Names of the stations that could not be placed
    pub fn unresolved_stations(&self) -> &[String] {
        match self {
            SurveyError::UnderdeterminedNetwork { unresolved, .. } => unresolved,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_underdetermined_message_lists_stations() {
        let err = SurveyError::UnderdeterminedNetwork {
            unresolved: vec!["X0".to_string(), "Y0".to_string()],
            passes: 5,
            table: StationTable::default(),
        };
        let message = err.to_string();
        assert!(message.contains("2 station(s)"));
        assert!(message.contains("X0, Y0"));
        assert_eq!(err.unresolved_stations(), ["X0", "Y0"]);
        assert!(err.partial_table().is_some());
    }

    #[test]
    fn test_field_errors() {
        let err = SurveyError::InvalidField {
            sheet: "A Front Room".to_string(),
            row: 3,
            field: "Azm".to_string(),
            value: "north".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Worksheet 'A Front Room' row 3: invalid Azm = 'north'"
        );
        assert!(err.partial_table().is_none());
        assert!(err.unresolved_stations().is_empty());
    }
}
