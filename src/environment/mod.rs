//! Planning environment: obstacles and built-in maps

pub mod obstacle_field;
pub mod presets;

pub use obstacle_field::{CollisionMode, Obstacle, ObstacleField};
