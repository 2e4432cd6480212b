//! Error types for rrt_star_planner

use thiserror::Error;

/// Main error type for the planners
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanningError {
    /// Start/goal, bounds or tuning parameters are unusable; nothing was planned
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The iteration cap was reached before the goal region was
    #[error("Planning exhausted after {iterations} iterations ({nodes} nodes) without reaching the goal")]
    PlanningExhausted { iterations: usize, nodes: usize },

    /// The tree lost one of its structural invariants
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// The node store is bounded and full
    #[error("Node store capacity of {capacity} nodes exhausted")]
    CapacityExhausted { capacity: usize },

    /// Lattice search ran out of open cells
    #[error("No path found: {0}")]
    NoPath(String),

    /// Scenario file could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<std::io::Error> for PlanningError {
    fn from(e: std::io::Error) -> Self {
        PlanningError::Config(e.to_string())
    }
}

impl From<serde_yaml::Error> for PlanningError {
    fn from(e: serde_yaml::Error) -> Self {
        PlanningError::Config(e.to_string())
    }
}

/// Result type alias for planning operations
pub type PlanningResult<T> = Result<T, PlanningError>;
