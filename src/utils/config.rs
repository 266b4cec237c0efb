use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::core::DEFAULT_MAX_PASSES;

/// Conversion parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Maximum number of propagation passes over the tie-in network
    pub max_passes: usize,
    /// Give up as soon as a pass resolves no new station
    pub stop_when_stalled: bool,
    /// Magnetic declination (degrees east). Recorded only; azimuths are not corrected.
    pub declination_deg: f64,
    /// Output settings
    pub output: OutputConfig,
}

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// `X,Y,Z` coordinate rows
    Csv,
    /// `Survey,Name,X,Y,Z` rows
    NamedCsv,
    /// JSON array of point records
    Json,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Emit only ice-surface points
    pub surface_only: bool,
    /// Decimal places for coordinates in CSV output
    pub precision: usize,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            max_passes: DEFAULT_MAX_PASSES,
            stop_when_stalled: true,
            declination_deg: 0.0,
            output: OutputConfig::default(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Csv,
            surface_only: false,
            precision: 4,
        }
    }
}

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid parameter '{parameter}' = '{value}': {reason}")]
    InvalidParameter {
        parameter: String,
        value: String,
        reason: String,
    },

    #[error("I/O error: {message}")]
    Io { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

/// Highest decimal precision accepted for coordinate output
const MAX_PRECISION: usize = 12;

/// Loads, validates and adjusts the conversion configuration
#[derive(Debug, Default)]
pub struct ConfigurationManager {
    config: ConversionConfig,
    config_file_path: Option<String>,
    is_modified: bool,
}

impl ConfigurationManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut manager = Self::new();
        manager.load_from_file(path)?;
        Ok(manager)
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    pub fn into_config(self) -> ConversionConfig {
        self.config
    }

    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content = fs::read_to_string(&path).map_err(|e| ConfigError::Io {
            message: format!("Failed to read config file '{}': {}", path_str, e),
        })?;

        let config: ConversionConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::Serialization {
                message: format!("Failed to parse config file '{}': {}", path_str, e),
            })?;

        Self::validate_config(&config)?;

        self.config = config;
        self.config_file_path = Some(path_str);
        self.is_modified = false;
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content =
            serde_json::to_string_pretty(&self.config).map_err(|e| ConfigError::Serialization {
                message: format!("Failed to serialize config: {}", e),
            })?;

        fs::write(&path, content).map_err(|e| ConfigError::Io {
            message: format!("Failed to write config file '{}': {}", path_str, e),
        })?;

        self.config_file_path = Some(path_str);
        self.is_modified = false;
        Ok(())
    }

    pub fn is_modified(&self) -> bool {
        self.is_modified
    }

    /// Set the pass cap; returns the previous value
    pub fn set_max_passes(&mut self, max_passes: usize) -> Result<usize, ConfigError> {
        Self::check_max_passes(max_passes)?;
        let old_value = self.config.max_passes;
        self.config.max_passes = max_passes;
        self.is_modified = true;
        Ok(old_value)
    }

    /// Set the declination; returns the previous value
    pub fn set_declination(&mut self, declination_deg: f64) -> Result<f64, ConfigError> {
        Self::check_declination(declination_deg)?;
        let old_value = self.config.declination_deg;
        self.config.declination_deg = declination_deg;
        self.is_modified = true;
        Ok(old_value)
    }

    pub fn set_stop_when_stalled(&mut self, stop: bool) -> bool {
        let old_value = self.config.stop_when_stalled;
        self.config.stop_when_stalled = stop;
        self.is_modified = true;
        old_value
    }

    pub fn set_output_format(&mut self, format: OutputFormat) -> OutputFormat {
        let old_value = self.config.output.format;
        self.config.output.format = format;
        self.is_modified = true;
        old_value
    }

    pub fn set_surface_only(&mut self, surface_only: bool) -> bool {
        let old_value = self.config.output.surface_only;
        self.config.output.surface_only = surface_only;
        self.is_modified = true;
        old_value
    }

    pub fn validate_config(config: &ConversionConfig) -> Result<(), ConfigError> {
        Self::check_max_passes(config.max_passes)?;
        Self::check_declination(config.declination_deg)?;

        if config.output.precision > MAX_PRECISION {
            return Err(ConfigError::InvalidParameter {
                parameter: "output.precision".to_string(),
                value: config.output.precision.to_string(),
                reason: format!("At most {} decimal places are supported", MAX_PRECISION),
            });
        }
        Ok(())
    }

    fn check_max_passes(max_passes: usize) -> Result<(), ConfigError> {
        if max_passes == 0 {
            return Err(ConfigError::InvalidParameter {
                parameter: "max_passes".to_string(),
                value: max_passes.to_string(),
                reason: "At least one propagation pass is required".to_string(),
            });
        }
        Ok(())
    }

    fn check_declination(declination_deg: f64) -> Result<(), ConfigError> {
        if !(-180.0..=180.0).contains(&declination_deg) {
            return Err(ConfigError::InvalidParameter {
                parameter: "declination_deg".to_string(),
                value: declination_deg.to_string(),
                reason: "Declination must be between -180 and 180 degrees".to_string(),
            });
        }
        Ok(())
    }
}
