//! Core types and constants for ice survey reduction

pub mod types;
pub mod constants;

pub use types::*;
pub use constants::*;
