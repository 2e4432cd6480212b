//! Lattice planner section.

use serde::{Deserialize, Serialize};

use super::defaults;

/// Grid settings section
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridSection {
    #[serde(default = "defaults::grid_size")]
    pub rows: usize,

    #[serde(default = "defaults::grid_size")]
    pub cols: usize,

    /// Blocked-cell probability of a random grid
    #[serde(default = "defaults::obstacle_probability")]
    pub obstacle_probability: f64,

    /// Rasterize the scenario obstacles instead of drawing a random grid
    #[serde(default)]
    pub rasterize: bool,

    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for GridSection {
    fn default() -> Self {
        Self {
            rows: defaults::grid_size(),
            cols: defaults::grid_size(),
            obstacle_probability: defaults::obstacle_probability(),
            rasterize: false,
            seed: None,
        }
    }
}
