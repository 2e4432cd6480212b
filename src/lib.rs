//! rrt_star_planner - sampling-based and lattice path planning in 2D
//!
//! The crate provides an RRT* planner over a continuous workspace with
//! rectangular and circular obstacles, a sharded multi-threaded driver for
//! it, and an 8-connected grid A* planner as the lattice counterpart.

// Core modules
pub mod common;
pub mod config;
pub mod environment;
pub mod utils;

// Algorithm modules
pub mod path_planning;

// Re-export common types for convenience
pub use common::{AreaBounds, GridNode, Path2D, Point2D};
pub use common::PathPlanner;
pub use common::{PlanningError, PlanningResult};
pub use config::ScenarioConfig;
pub use environment::{CollisionMode, Obstacle, ObstacleField};
pub use path_planning::{
    CancelToken, GridAStarPlanner, GridWorld, PlanReport, PlanningRequest, RRTStar, RRTStarConfig,
    RRTStarPlanner, ShardedRRTStar,
};
