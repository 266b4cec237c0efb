//! Configuration management

pub mod config;

pub use config::{ConfigError, ConfigurationManager, ConversionConfig, OutputConfig, OutputFormat};
