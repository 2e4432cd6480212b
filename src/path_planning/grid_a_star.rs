//! A* search on an 8-connected occupancy grid
//!
//! Cells are addressed by `GridNode { x: column, y: row }`. Step costs and
//! the heuristic are Euclidean in cell units; among equal f-costs the node
//! closer to the goal (smaller h) is expanded first.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use itertools::iproduct;
use log::{debug, info};
use ordered_float::OrderedFloat;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::common::{AreaBounds, GridNode, Path2D, PathPlanner, PlanningError, PlanningResult, Point2D};
use crate::environment::ObstacleField;

/// Blocked-cell probability of a random world
pub const DEFAULT_OBSTACLE_PROBABILITY: f64 = 0.3;
pub const DEFAULT_GRID_SIZE: usize = 100;

/// Rectangular world of free and blocked cells laid over `bounds`
#[derive(Debug, Clone, PartialEq)]
pub struct GridWorld {
    rows: usize,
    cols: usize,
    bounds: AreaBounds,
    blocked: Vec<bool>,
}

impl GridWorld {
    /// All-free grid
    pub fn new(rows: usize, cols: usize, bounds: AreaBounds) -> PlanningResult<Self> {
        if rows == 0 || cols == 0 {
            return Err(PlanningError::InvalidConfiguration(format!(
                "grid must have at least one cell, got {}x{}",
                rows, cols
            )));
        }
        if !bounds.is_valid() {
            return Err(PlanningError::InvalidConfiguration(format!(
                "grid bounds {:?} are empty or not finite",
                bounds
            )));
        }
        Ok(GridWorld { rows, cols, bounds, blocked: vec![false; rows * cols] })
    }

    /// Rasterize `field`: a cell is blocked when its centre collides.
    pub fn from_field(field: &ObstacleField, bounds: AreaBounds, rows: usize, cols: usize) -> PlanningResult<Self> {
        let mut world = Self::new(rows, cols, bounds)?;
        for (row, col) in iproduct!(0..rows, 0..cols) {
            let centre = world.cell_center(GridNode::new(col as i32, row as i32));
            world.blocked[row * cols + col] = field.collides(&centre);
        }
        debug!("rasterized {} obstacles into {} blocked cells", field.len(), world.blocked_count());
        Ok(world)
    }

    /// Each cell blocked independently with `obstacle_probability`
    pub fn random(
        rows: usize,
        cols: usize,
        bounds: AreaBounds,
        obstacle_probability: f64,
        seed: Option<u64>,
    ) -> PlanningResult<Self> {
        if !(0.0..=1.0).contains(&obstacle_probability) {
            return Err(PlanningError::InvalidConfiguration(format!(
                "obstacle probability must be in [0, 1], got {}",
                obstacle_probability
            )));
        }
        let mut world = Self::new(rows, cols, bounds)?;
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        for cell in world.blocked.iter_mut() {
            *cell = rng.gen::<f64>() < obstacle_probability;
        }
        Ok(world)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn bounds(&self) -> AreaBounds {
        self.bounds
    }

    fn cell_width(&self) -> f64 {
        self.bounds.width() / self.cols as f64
    }

    fn cell_height(&self) -> f64 {
        self.bounds.height() / self.rows as f64
    }

    pub fn in_grid(&self, cell: GridNode) -> bool {
        cell.x >= 0 && cell.y >= 0 && (cell.x as usize) < self.cols && (cell.y as usize) < self.rows
    }

    /// Out-of-grid cells count as blocked
    pub fn is_blocked(&self, cell: GridNode) -> bool {
        !self.in_grid(cell) || self.blocked[cell.y as usize * self.cols + cell.x as usize]
    }

    pub fn set_blocked(&mut self, cell: GridNode, blocked: bool) -> PlanningResult<()> {
        if !self.in_grid(cell) {
            return Err(PlanningError::InvalidConfiguration(format!("cell {:?} is outside the grid", cell)));
        }
        self.blocked[cell.y as usize * self.cols + cell.x as usize] = blocked;
        Ok(())
    }

    pub fn blocked_count(&self) -> usize {
        self.blocked.iter().filter(|&&b| b).count()
    }

    /// Blocked cells, row-major
    pub fn blocked_cells(&self) -> Vec<GridNode> {
        iproduct!(0..self.rows, 0..self.cols)
            .map(|(row, col)| GridNode::new(col as i32, row as i32))
            .filter(|&cell| self.is_blocked(cell))
            .collect()
    }

    /// Cell containing `point`, if it lies inside the bounds
    pub fn cell_of(&self, point: &Point2D) -> Option<GridNode> {
        if !self.bounds.contains(point) {
            return None;
        }
        let col = (((point.x - self.bounds.xmin) / self.cell_width()) as usize).min(self.cols - 1);
        let row = (((point.y - self.bounds.ymin) / self.cell_height()) as usize).min(self.rows - 1);
        Some(GridNode::new(col as i32, row as i32))
    }

    pub fn cell_center(&self, cell: GridNode) -> Point2D {
        Point2D::new(
            self.bounds.xmin + (cell.x as f64 + 0.5) * self.cell_width(),
            self.bounds.ymin + (cell.y as f64 + 0.5) * self.cell_height(),
        )
    }
}

/// Open-set entry, ordered so that `BinaryHeap` pops the lowest f, then h
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenEntry {
    f: OrderedFloat<f64>,
    h: OrderedFloat<f64>,
    cell: GridNode,
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .cmp(&self.f)
            .then_with(|| other.h.cmp(&self.h))
            .then_with(|| other.cell.cmp(&self.cell))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

pub struct GridAStarPlanner {
    world: GridWorld,
    motion: Vec<(i32, i32, f64)>,
}

impl GridAStarPlanner {
    pub fn new(world: GridWorld) -> Self {
        GridAStarPlanner { world, motion: Self::get_motion_model() }
    }

    pub fn world(&self) -> &GridWorld {
        &self.world
    }

    /// Cheapest 8-connected cell path from `start` to `goal`, both included
    pub fn plan_cells(&self, start: GridNode, goal: GridNode) -> PlanningResult<Vec<GridNode>> {
        for (name, cell) in [("start", start), ("goal", goal)] {
            if !self.world.in_grid(cell) {
                return Err(PlanningError::InvalidConfiguration(format!("{} {:?} is outside the grid", name, cell)));
            }
            if self.world.is_blocked(cell) {
                return Err(PlanningError::InvalidConfiguration(format!("{} {:?} is blocked", name, cell)));
            }
        }

        let mut open_set = BinaryHeap::new();
        let mut g_cost: HashMap<GridNode, f64> = HashMap::new();
        let mut parent: HashMap<GridNode, GridNode> = HashMap::new();
        let mut closed: HashSet<GridNode> = HashSet::new();

        g_cost.insert(start, 0.0);
        let h = Self::calc_heuristic(start, goal);
        open_set.push(OpenEntry { f: OrderedFloat(h), h: OrderedFloat(h), cell: start });

        let mut iteration = 0;
        while let Some(OpenEntry { cell: current, .. }) = open_set.pop() {
            if closed.contains(&current) {
                continue;
            }
            iteration += 1;
            if iteration % 1000 == 0 {
                debug!("Iteration: {}, open set size: {}, closed set size: {}", iteration, open_set.len(), closed.len());
            }

            if current == goal {
                info!("Find goal after {} expansions!", iteration);
                return Ok(Self::calc_final_path(goal, &parent));
            }
            closed.insert(current);

            let current_g = g_cost.get(&current).copied().unwrap_or(f64::INFINITY);
            for &(dx, dy, step) in &self.motion {
                let next = GridNode::new(current.x + dx, current.y + dy);
                if self.world.is_blocked(next) || closed.contains(&next) {
                    continue;
                }
                let tentative = current_g + step;
                if tentative < g_cost.get(&next).copied().unwrap_or(f64::INFINITY) {
                    g_cost.insert(next, tentative);
                    parent.insert(next, current);
                    let h = Self::calc_heuristic(next, goal);
                    open_set.push(OpenEntry { f: OrderedFloat(tentative + h), h: OrderedFloat(h), cell: next });
                }
            }
        }

        info!("Open set is empty after {} expansions", iteration);
        Err(PlanningError::NoPath(format!(
            "open set exhausted after {} expansions from {:?} to {:?}",
            iteration, start, goal
        )))
    }

    fn calc_final_path(goal: GridNode, parent: &HashMap<GridNode, GridNode>) -> Vec<GridNode> {
        let mut path = vec![goal];
        let mut current = goal;
        while let Some(&previous) = parent.get(&current) {
            path.push(previous);
            current = previous;
        }
        path.reverse();
        path
    }

    fn calc_heuristic(a: GridNode, b: GridNode) -> f64 {
        (((a.x - b.x).pow(2) + (a.y - b.y).pow(2)) as f64).sqrt()
    }

    fn get_motion_model() -> Vec<(i32, i32, f64)> {
        // dx, dy, cost
        vec![
            (1, 0, 1.0),
            (0, 1, 1.0),
            (-1, 0, 1.0),
            (0, -1, 1.0),
            (-1, -1, 2_f64.sqrt()),
            (-1, 1, 2_f64.sqrt()),
            (1, -1, 2_f64.sqrt()),
            (1, 1, 2_f64.sqrt()),
        ]
    }
}

impl PathPlanner for GridAStarPlanner {
    /// Plans between the cells containing `start` and `goal`; the returned
    /// waypoints are cell centres.
    fn plan(&self, start: Point2D, goal: Point2D) -> Result<Path2D, PlanningError> {
        let locate = |name: &str, point: Point2D| {
            self.world.cell_of(&point).ok_or_else(|| {
                PlanningError::InvalidConfiguration(format!(
                    "{} ({}, {}) lies outside the grid",
                    name, point.x, point.y
                ))
            })
        };
        let cells = self.plan_cells(locate("start", start)?, locate("goal", goal)?)?;
        Ok(Path2D::from_points(cells.into_iter().map(|c| self.world.cell_center(c)).collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::Obstacle;

    fn open_world(n: usize) -> GridWorld {
        GridWorld::new(n, n, AreaBounds::from_size(n as f64, n as f64)).unwrap()
    }

    fn cost(path: &[GridNode]) -> f64 {
        path.windows(2).map(|w| GridAStarPlanner::calc_heuristic(w[0], w[1])).sum()
    }

    #[test]
    fn test_diagonal_path_in_open_grid() {
        let planner = GridAStarPlanner::new(open_world(10));
        let path = planner.plan_cells(GridNode::new(0, 0), GridNode::new(5, 5)).unwrap();
        assert_eq!(path.len(), 6);
        assert!((cost(&path) - 5.0 * 2_f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_routes_around_wall() {
        let mut world = open_world(10);
        for row in 0..9 {
            world.set_blocked(GridNode::new(5, row), true).unwrap();
        }
        let planner = GridAStarPlanner::new(world);
        let path = planner.plan_cells(GridNode::new(0, 0), GridNode::new(9, 0)).unwrap();

        assert_eq!(path.first(), Some(&GridNode::new(0, 0)));
        assert_eq!(path.last(), Some(&GridNode::new(9, 0)));
        assert!(path.iter().all(|&c| !planner.world().is_blocked(c)));
        assert!(path.contains(&GridNode::new(5, 9)));
        for pair in path.windows(2) {
            assert!((pair[0].x - pair[1].x).abs() <= 1 && (pair[0].y - pair[1].y).abs() <= 1);
        }
    }

    #[test]
    fn test_blocked_goal_is_invalid() {
        let mut world = open_world(5);
        world.set_blocked(GridNode::new(4, 4), true).unwrap();
        let planner = GridAStarPlanner::new(world);
        let result = planner.plan_cells(GridNode::new(0, 0), GridNode::new(4, 4));
        assert!(matches!(result, Err(PlanningError::InvalidConfiguration(_))));

        let result = planner.plan_cells(GridNode::new(0, 0), GridNode::new(5, 0));
        assert!(matches!(result, Err(PlanningError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_enclosed_goal_has_no_path() {
        let mut world = open_world(7);
        for dx in -1..=1 {
            for dy in -1..=1 {
                if dx != 0 || dy != 0 {
                    world.set_blocked(GridNode::new(3 + dx, 3 + dy), true).unwrap();
                }
            }
        }
        let planner = GridAStarPlanner::new(world);
        let result = planner.plan_cells(GridNode::new(0, 0), GridNode::new(3, 3));
        assert!(matches!(result, Err(PlanningError::NoPath(_))));
    }

    #[test]
    fn test_from_field_rasterizes_cell_centres() {
        let field = ObstacleField::new(vec![Obstacle::rectangle(0.0, 0.0, 20.0, 10.0)]).unwrap();
        let world = GridWorld::from_field(&field, AreaBounds::from_size(100.0, 100.0), 10, 10).unwrap();
        assert!(world.is_blocked(GridNode::new(0, 0)));
        assert!(world.is_blocked(GridNode::new(1, 0)));
        assert!(!world.is_blocked(GridNode::new(2, 0)));
        assert!(!world.is_blocked(GridNode::new(0, 1)));
        assert_eq!(world.blocked_count(), 2);
    }

    #[test]
    fn test_random_world_density_and_seed() {
        let bounds = AreaBounds::from_size(1000.0, 1000.0);
        let a = GridWorld::random(DEFAULT_GRID_SIZE, DEFAULT_GRID_SIZE, bounds, DEFAULT_OBSTACLE_PROBABILITY, Some(4)).unwrap();
        let b = GridWorld::random(DEFAULT_GRID_SIZE, DEFAULT_GRID_SIZE, bounds, DEFAULT_OBSTACLE_PROBABILITY, Some(4)).unwrap();
        assert_eq!(a, b);
        let density = a.blocked_count() as f64 / 10_000.0;
        assert!((density - 0.3).abs() < 0.03);
        assert!(GridWorld::random(10, 10, bounds, 1.5, None).is_err());
    }

    #[test]
    fn test_plan_returns_cell_centres() {
        let world = GridWorld::new(10, 10, AreaBounds::from_size(100.0, 100.0)).unwrap();
        let planner = GridAStarPlanner::new(world);
        let path = planner.plan(Point2D::new(3.0, 3.0), Point2D::new(33.0, 3.0)).unwrap();
        assert_eq!(path.first(), Some(&Point2D::new(5.0, 5.0)));
        assert_eq!(path.last(), Some(&Point2D::new(35.0, 5.0)));
        assert_eq!(path.len(), 4);
    }

    #[test]
    fn test_tie_break_prefers_smaller_heuristic() {
        let low_h = OpenEntry { f: OrderedFloat(10.0), h: OrderedFloat(1.0), cell: GridNode::new(0, 0) };
        let high_h = OpenEntry { f: OrderedFloat(10.0), h: OrderedFloat(4.0), cell: GridNode::new(1, 1) };
        let mut heap = BinaryHeap::new();
        heap.push(high_h);
        heap.push(low_h);
        assert_eq!(heap.pop(), Some(low_h));
    }
}
