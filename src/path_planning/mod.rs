//! Path planning algorithms
//!
//! The RRT* planner is split into its building blocks (sampler, steering,
//! tree, rewiring) with a single-threaded and a sharded driver on top.
//! `grid_a_star` is the lattice counterpart over an occupancy grid.

pub mod events;
pub mod grid_a_star;
pub mod rewire;
pub mod rrt_star;
pub mod sampler;
pub mod sharded;
pub mod steering;
pub mod tree;

pub use events::{EventRecorder, NullObserver, PlannerEvent, PlannerObserver};
pub use grid_a_star::{GridAStarPlanner, GridWorld};
pub use rrt_star::{
    CancelToken, DefaultSampler, PlanReport, PlannerState, PlanningRequest, RRTStar, RRTStarConfig, RRTStarPlanner, StopReason,
};
pub use sampler::{goal_biased, GoalBiasedSampler, Sampler, UniformSampler};
pub use sharded::ShardedRRTStar;
pub use steering::steer;
pub use tree::{NodeHandle, PlanningNode, Tree};
