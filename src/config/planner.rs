//! RRT* tuning section.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults;
use crate::environment::CollisionMode;
use crate::path_planning::RRTStarConfig;

/// Planner settings section
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlannerSection {
    /// Steering step length
    #[serde(default = "defaults::step_size")]
    pub step_size: f64,

    /// Neighbourhood radius for parent choice and rewiring
    #[serde(default = "defaults::rewiring_radius")]
    pub rewiring_radius: f64,

    /// Distance at which the goal counts as reached
    #[serde(default = "defaults::goal_radius")]
    pub goal_radius: f64,

    #[serde(default = "defaults::max_iterations")]
    pub max_iterations: usize,

    #[serde(default = "defaults::max_resample_attempts")]
    pub max_resample_attempts: usize,

    /// Share of samples drawn at the goal, in `[0, 1]`
    #[serde(default = "defaults::goal_sample_rate")]
    pub goal_sample_rate: f64,

    /// `segment` (exact edge test) or `point_only`
    #[serde(default)]
    pub collision_mode: CollisionMode,

    /// Iterations spent improving the path after the goal is reached
    #[serde(default)]
    pub refine_iterations: usize,

    #[serde(default)]
    pub node_capacity: Option<usize>,

    /// Wall-clock budget in milliseconds
    #[serde(default)]
    pub time_budget_ms: Option<u64>,

    #[serde(default)]
    pub seed: Option<u64>,

    /// Disable to grow a plain RRT
    #[serde(default = "defaults::enabled")]
    pub rewire: bool,

    #[serde(default)]
    pub verify_invariants: bool,
}

impl Default for PlannerSection {
    fn default() -> Self {
        Self::from(&RRTStarConfig::default())
    }
}

impl PlannerSection {
    /// Convert to the planner's runtime config
    pub fn to_rrt_star_config(&self) -> RRTStarConfig {
        RRTStarConfig {
            step_size: self.step_size,
            rewiring_radius: self.rewiring_radius,
            goal_radius: self.goal_radius,
            max_iterations: self.max_iterations,
            max_resample_attempts: self.max_resample_attempts,
            goal_sample_rate: self.goal_sample_rate,
            collision_mode: self.collision_mode,
            refine_iterations: self.refine_iterations,
            node_capacity: self.node_capacity,
            time_budget: self.time_budget_ms.map(Duration::from_millis),
            seed: self.seed,
            rewire: self.rewire,
            verify_invariants: self.verify_invariants,
        }
    }
}

impl From<&RRTStarConfig> for PlannerSection {
    fn from(config: &RRTStarConfig) -> Self {
        PlannerSection {
            step_size: config.step_size,
            rewiring_radius: config.rewiring_radius,
            goal_radius: config.goal_radius,
            max_iterations: config.max_iterations,
            max_resample_attempts: config.max_resample_attempts,
            goal_sample_rate: config.goal_sample_rate,
            collision_mode: config.collision_mode,
            refine_iterations: config.refine_iterations,
            node_capacity: config.node_capacity,
            time_budget_ms: config.time_budget.map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
            seed: config.seed,
            rewire: config.rewire,
            verify_invariants: config.verify_invariants,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_keys_take_defaults() {
        let section: PlannerSection = serde_yaml::from_str("step_size: 10").unwrap();
        assert_eq!(section.step_size, 10.0);
        assert_eq!(section.goal_sample_rate, 0.1);
        assert_eq!(section.max_iterations, 5000);
        assert_eq!(section.to_rrt_star_config().goal_sample_rate, 0.1);
    }

    #[test]
    fn test_goal_sample_rate_carried_both_ways() {
        let config = RRTStarConfig { goal_sample_rate: 0.25, ..Default::default() };
        let section = PlannerSection::from(&config);
        assert_eq!(section.goal_sample_rate, 0.25);
        assert_eq!(section.to_rrt_star_config(), config);
    }

    #[test]
    fn test_huge_time_budget_saturates() {
        let config = RRTStarConfig { time_budget: Some(Duration::MAX), ..Default::default() };
        assert_eq!(PlannerSection::from(&config).time_budget_ms, Some(u64::MAX));

        let config = RRTStarConfig { time_budget: Some(Duration::from_millis(1500)), ..Default::default() };
        assert_eq!(PlannerSection::from(&config).time_budget_ms, Some(1500));
    }
}
