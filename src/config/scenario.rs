//! Scenario file: workspace, obstacles, endpoints and planner settings.

use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use super::defaults;
use super::grid::GridSection;
use super::planner::PlannerSection;
use crate::common::{AreaBounds, PlanningResult, Point2D};
use crate::environment::{presets, Obstacle, ObstacleField};
use crate::path_planning::{GridWorld, PlanningRequest, RRTStarConfig};

/// Full scenario loaded from YAML
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Workspace extent along x, starting at 0
    #[serde(default = "defaults::width")]
    pub width: f64,

    /// Workspace extent along y, starting at 0
    #[serde(default = "defaults::height")]
    pub height: f64,

    #[serde(default = "defaults::start")]
    pub start: Point2D,

    #[serde(default = "defaults::goal")]
    pub goal: Point2D,

    /// Built-in obstacle preset, combined with `obstacles`
    #[serde(default)]
    pub map: Option<usize>,

    /// Extra obstacles
    #[serde(default)]
    pub obstacles: Vec<Obstacle>,

    #[serde(default)]
    pub planner: PlannerSection,

    #[serde(default)]
    pub grid: GridSection,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            width: defaults::width(),
            height: defaults::height(),
            start: defaults::start(),
            goal: defaults::goal(),
            map: None,
            obstacles: Vec::new(),
            planner: PlannerSection::default(),
            grid: GridSection::default(),
        }
    }
}

impl ScenarioConfig {
    /// Load a scenario from a YAML file
    pub fn load(path: &Path) -> PlanningResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&contents)?;
        info!("loaded scenario {}", path.display());
        Ok(config)
    }

    /// Parse from YAML string
    pub fn from_yaml(yaml: &str) -> PlanningResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn to_yaml(&self) -> PlanningResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn bounds(&self) -> AreaBounds {
        AreaBounds::from_size(self.width, self.height)
    }

    /// Preset obstacles (if any) followed by the inline ones
    pub fn obstacle_field(&self) -> PlanningResult<ObstacleField> {
        let mut obstacles = match self.map {
            Some(map) => ObstacleField::from_preset(map)?.obstacles().to_vec(),
            None => Vec::new(),
        };
        obstacles.extend_from_slice(&self.obstacles);
        ObstacleField::new(obstacles)
    }

    pub fn request(&self) -> PlanningRequest {
        PlanningRequest::new(self.start, self.goal, self.bounds())
    }

    pub fn planner_config(&self) -> RRTStarConfig {
        self.planner.to_rrt_star_config()
    }

    /// Occupancy grid for the lattice planner
    pub fn grid_world(&self) -> PlanningResult<GridWorld> {
        if self.grid.rasterize {
            GridWorld::from_field(&self.obstacle_field()?, self.bounds(), self.grid.rows, self.grid.cols)
        } else {
            GridWorld::random(
                self.grid.rows,
                self.grid.cols,
                self.bounds(),
                self.grid.obstacle_probability,
                self.grid.seed,
            )
        }
    }

    /// Scenario over one of the built-in maps with default endpoints
    pub fn preset(map: usize) -> PlanningResult<Self> {
        ObstacleField::from_preset(map)?;
        Ok(Self {
            width: presets::PRESET_WIDTH,
            height: presets::PRESET_HEIGHT,
            map: Some(map),
            ..Self::default()
        })
    }
}
