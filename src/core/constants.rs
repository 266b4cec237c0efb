//! Survey constants and station naming conventions

/// Default number of propagation passes over the tie-in network
pub const DEFAULT_MAX_PASSES: usize = 5;

/// Prefix marking a bare ice-surface point
pub const SURFACE_PREFIX: &str = "S_";

/// Marker for the point reached by a down shot
pub const DOWN_MARKER: &str = "d";

/// Marker for the point reached by a back shot
pub const BACK_MARKER: &str = "b";

/// Survey ids may not start with this letter; it would collide with `SURFACE_PREFIX`
pub const RESERVED_SURVEY_LETTER: char = 'S';

/// Suffix appended to a survey id to name its tripod station
pub const TRIPOD_SUFFIX: &str = "0";
