//! Scenario configuration loaded from a single YAML file.

pub mod defaults;
mod grid;
mod planner;
mod scenario;

pub use grid::GridSection;
pub use planner::PlannerSection;
pub use scenario::ScenarioConfig;
