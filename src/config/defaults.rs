//! Default value functions for serde deserialization.

use crate::common::Point2D;

pub fn width() -> f64 {
    1000.0
}

pub fn height() -> f64 {
    1000.0
}

pub fn start() -> Point2D {
    Point2D::new(100.0, 100.0)
}

pub fn goal() -> Point2D {
    Point2D::new(900.0, 900.0)
}

pub fn step_size() -> f64 {
    15.0
}

pub fn rewiring_radius() -> f64 {
    30.0
}

pub fn goal_radius() -> f64 {
    20.0
}

pub fn max_iterations() -> usize {
    5000
}

pub fn max_resample_attempts() -> usize {
    100
}

pub fn goal_sample_rate() -> f64 {
    0.1
}

pub fn enabled() -> bool {
    true
}

pub fn grid_size() -> usize {
    100
}

pub fn obstacle_probability() -> f64 {
    0.3
}
