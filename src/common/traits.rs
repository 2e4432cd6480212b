//! Common traits defining interfaces for the planners

use crate::common::error::PlanningError;
use crate::common::types::*;

/// Trait for path planning algorithms
///
/// Both the sampling-based tree planner and the lattice search implement
/// this, so callers can swap strategies without touching the rest of the
/// pipeline.
pub trait PathPlanner {
    /// Plan a path from start to goal
    fn plan(&self, start: Point2D, goal: Point2D) -> Result<Path2D, PlanningError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StraightLinePlanner;

    impl PathPlanner for StraightLinePlanner {
        fn plan(&self, start: Point2D, goal: Point2D) -> Result<Path2D, PlanningError> {
            Ok(Path2D::from_points(vec![start, goal]))
        }
    }

    #[test]
    fn test_path_planner_trait_object() {
        let planner: Box<dyn PathPlanner> = Box::new(StraightLinePlanner);
        let path = planner.plan(Point2D::origin(), Point2D::new(3.0, 4.0)).unwrap();
        assert!((path.total_length() - 5.0).abs() < 1e-10);
    }
}
