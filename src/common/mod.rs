//! Common types, traits, and error definitions for rrt_star_planner
//!
//! This module provides the foundational building blocks shared by the
//! tree planner, the lattice planner and the scenario configuration.

pub mod types;
pub mod traits;
pub mod error;

pub use types::*;
pub use traits::*;
pub use error::*;
