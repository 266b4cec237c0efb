//! Survey reduction algorithms

pub mod geometry;
pub mod resolver;
pub mod projector;

pub use geometry::{back_shot, down_shot, project_shot, shoot, shoot_reversed, ShotPoints};
pub use resolver::{ResolutionReport, StationResolver, StationState, StationTable};
pub use projector::{ProjectedPoints, StationNaming, SurveyProjector};
