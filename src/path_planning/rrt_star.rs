//! RRT* (asymptotically optimal Rapidly-exploring Random Tree) path planning
//!
//! Each iteration samples the workspace, steers a fixed step from the
//! nearest tree node, rejects the candidate if it (or its edge) hits an
//! obstacle, inserts it below the cheapest valid neighbour and rewires the
//! neighbourhood through it. Once a node lands inside the goal region the
//! goal is attached and the path is read back along parent links.
//!
//! Reference: Karaman, S. & Frazzoli, E. (2011).
//! "Sampling-based Algorithms for Optimal Motion Planning"

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};

use crate::common::{AreaBounds, Path2D, PathPlanner, PlanningError, PlanningResult, Point2D};
use crate::environment::{CollisionMode, ObstacleField};
use crate::path_planning::events::{NullObserver, PlannerEvent, PlannerObserver};
use crate::path_planning::rewire::{choose_parent, rewire_neighbors};
use crate::path_planning::sampler::{goal_biased, GoalBiasedSampler, Sampler, UniformSampler};
use crate::path_planning::steering::steer;
use crate::path_planning::tree::{NodeHandle, Tree};

/// Configuration for the RRT* planner
#[derive(Debug, Clone, PartialEq)]
pub struct RRTStarConfig {
    /// Distance of each steering step
    pub step_size: f64,
    /// Neighbourhood radius for parent selection and rewiring
    pub rewiring_radius: f64,
    /// A node within this distance of the goal reaches it
    pub goal_radius: f64,
    /// Iteration cap; reaching it without a path is `PlanningExhausted`
    pub max_iterations: usize,
    /// Resamples allowed inside a single iteration before it is given up
    pub max_resample_attempts: usize,
    /// Probability of sampling the goal itself instead of the workspace
    pub goal_sample_rate: f64,
    /// Edge validation mode
    pub collision_mode: CollisionMode,
    /// Extra iterations spent improving the tree after the goal is attached
    pub refine_iterations: usize,
    /// Upper bound on the node store, `None` for unbounded
    pub node_capacity: Option<usize>,
    /// Wall-clock budget, checked between iterations
    pub time_budget: Option<Duration>,
    /// Sampler seed, `None` for OS entropy
    pub seed: Option<u64>,
    /// Parent selection and rewiring; `false` degrades to plain RRT
    pub rewire: bool,
    /// Run the full tree check after every iteration
    pub verify_invariants: bool,
}

impl Default for RRTStarConfig {
    fn default() -> Self {
        Self {
            step_size: 15.0,
            rewiring_radius: 30.0,
            goal_radius: 20.0,
            max_iterations: 5000,
            max_resample_attempts: 100,
            goal_sample_rate: 0.1,
            collision_mode: CollisionMode::Segment,
            refine_iterations: 0,
            node_capacity: None,
            time_budget: None,
            seed: None,
            rewire: true,
            verify_invariants: false,
        }
    }
}

impl RRTStarConfig {
    pub fn validate(&self) -> PlanningResult<()> {
        let positive = |name: &str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(PlanningError::InvalidConfiguration(format!(
                    "{} must be finite and > 0, got {}",
                    name, value
                )))
            }
        };
        positive("step_size", self.step_size)?;
        positive("rewiring_radius", self.rewiring_radius)?;
        positive("goal_radius", self.goal_radius)?;

        if self.max_iterations == 0 {
            return Err(PlanningError::InvalidConfiguration("max_iterations must be > 0".to_string()));
        }
        if self.max_resample_attempts == 0 {
            return Err(PlanningError::InvalidConfiguration(
                "max_resample_attempts must be > 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.goal_sample_rate) {
            return Err(PlanningError::InvalidConfiguration(format!(
                "goal_sample_rate must lie in [0, 1], got {}",
                self.goal_sample_rate
            )));
        }
        if let Some(capacity) = self.node_capacity {
            // Room for the root, one node and the goal
            if capacity < 3 {
                return Err(PlanningError::InvalidConfiguration(format!(
                    "node_capacity must be at least 3, got {}",
                    capacity
                )));
            }
        }
        Ok(())
    }
}

/// Start, goal and workspace of one planning request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanningRequest {
    pub start: Point2D,
    pub goal: Point2D,
    pub bounds: AreaBounds,
}

impl PlanningRequest {
    pub fn new(start: Point2D, goal: Point2D, bounds: AreaBounds) -> Self {
        Self { start, goal, bounds }
    }

    /// Reject requests that cannot be planned before any state is built.
    pub fn validate(&self, field: &ObstacleField) -> PlanningResult<()> {
        if !self.bounds.is_valid() {
            return Err(PlanningError::InvalidConfiguration(format!(
                "workspace bounds {:?} are empty or not finite",
                self.bounds
            )));
        }
        for (name, point) in [("start", self.start), ("goal", self.goal)] {
            if !point.is_finite() || !self.bounds.contains(&point) {
                return Err(PlanningError::InvalidConfiguration(format!(
                    "{} ({}, {}) lies outside the workspace",
                    name, point.x, point.y
                )));
            }
            if field.collides(&point) {
                return Err(PlanningError::InvalidConfiguration(format!(
                    "{} ({}, {}) lies inside an obstacle",
                    name, point.x, point.y
                )));
            }
        }
        Ok(())
    }
}

/// Planner life cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerState {
    Growing,
    GoalFound,
    Extracted,
}

/// Cooperative stop signal shared with the caller
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Why a run stopped without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    GoalReached,
    Cancelled,
    TimeBudget,
}

/// Result of [`RRTStar::run`]
#[derive(Debug, Clone)]
pub struct PlanReport {
    /// Start -> goal path, if one was found before stopping
    pub path: Option<Path2D>,
    /// Tree cost of the goal node
    pub cost: Option<f64>,
    pub iterations: usize,
    pub nodes: usize,
    pub rewires: usize,
    pub stop: StopReason,
    pub elapsed: Duration,
}

/// Sampler used by [`RRTStar::new`]
pub type DefaultSampler = GoalBiasedSampler<UniformSampler>;

/// One RRT* planning session over a fixed request
pub struct RRTStar<S: Sampler = DefaultSampler> {
    config: RRTStarConfig,
    field: ObstacleField,
    request: PlanningRequest,
    sampler: S,
    tree: Tree,
    state: PlannerState,
    goal_node: Option<NodeHandle>,
    iterations: usize,
    refined: usize,
    rewires: usize,
    path: Option<Path2D>,
}

impl RRTStar<DefaultSampler> {
    /// Session sampling uniformly over the request bounds, drawing the goal
    /// itself with probability `goal_sample_rate`
    pub fn new(field: ObstacleField, request: PlanningRequest, config: RRTStarConfig) -> PlanningResult<Self> {
        config.validate()?;
        request.validate(&field)?;
        let sampler = goal_biased(request.bounds, request.goal, config.goal_sample_rate, config.seed)?;
        Self::with_sampler(field, request, config, sampler)
    }
}

impl<S: Sampler> RRTStar<S> {
    /// Session drawing samples from a caller-provided sampler
    pub fn with_sampler(
        field: ObstacleField,
        request: PlanningRequest,
        config: RRTStarConfig,
        sampler: S,
    ) -> PlanningResult<Self> {
        config.validate()?;
        request.validate(&field)?;

        let tree = match config.node_capacity {
            Some(capacity) => Tree::with_capacity_limit(request.start, capacity),
            None => Tree::with_root(request.start),
        };

        Ok(RRTStar {
            config,
            field,
            request,
            sampler,
            tree,
            state: PlannerState::Growing,
            goal_node: None,
            iterations: 0,
            refined: 0,
            rewires: 0,
            path: None,
        })
    }

    pub fn config(&self) -> &RRTStarConfig {
        &self.config
    }

    pub fn request(&self) -> &PlanningRequest {
        &self.request
    }

    pub fn field(&self) -> &ObstacleField {
        &self.field
    }

    pub fn state(&self) -> PlannerState {
        self.state
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn rewires(&self) -> usize {
        self.rewires
    }

    pub fn goal_node(&self) -> Option<NodeHandle> {
        self.goal_node
    }

    /// Current parent -> child edges, for redraw
    pub fn edges(&self) -> Vec<(Point2D, Point2D)> {
        self.tree.edge_segments()
    }

    /// Extracted path, available in the `Extracted` state
    pub fn path(&self) -> Option<&Path2D> {
        self.path.as_ref()
    }

    /// Tree cost of the goal once it is attached
    pub fn best_cost(&self) -> Option<f64> {
        self.goal_node.and_then(|g| self.tree.get(g)).map(|n| n.cost())
    }

    /// One iteration. Returns the inserted node, or `None` when every
    /// resample was rejected or the path is already extracted.
    pub fn step<O: PlannerObserver + ?Sized>(&mut self, observer: &mut O) -> PlanningResult<Option<NodeHandle>> {
        if self.state == PlannerState::Extracted {
            return Ok(None);
        }
        let proposal = self.propose();
        self.apply(proposal, observer)
    }

    /// Iterate until the path is extracted, the caller cancels, the time
    /// budget runs out, or the iteration cap is hit.
    pub fn run<O: PlannerObserver + ?Sized>(&mut self, cancel: &CancelToken, observer: &mut O) -> PlanningResult<PlanReport> {
        let started = Instant::now();
        self.log_start();

        loop {
            if let Some(report) = self.poll_stop(cancel, started, observer)? {
                return Ok(report);
            }
            self.step(observer)?;
        }
    }

    pub(crate) fn log_start(&self) {
        info!(
            "RRT* planning start: ({:.1}, {:.1}) -> ({:.1}, {:.1}), {} obstacles",
            self.request.start.x,
            self.request.start.y,
            self.request.goal.x,
            self.request.goal.y,
            self.field.len()
        );
    }

    /// Termination check run before every iteration. `Some` ends the run.
    pub(crate) fn poll_stop<O: PlannerObserver + ?Sized>(
        &mut self,
        cancel: &CancelToken,
        started: Instant,
        observer: &mut O,
    ) -> PlanningResult<Option<PlanReport>> {
        if self.state == PlannerState::Extracted {
            return Ok(Some(self.report(StopReason::GoalReached, started)));
        }
        if cancel.is_cancelled() {
            warn!("RRT* cancelled after {} iterations", self.iterations);
            return self.stop(StopReason::Cancelled, started, observer).map(Some);
        }
        if let Some(budget) = self.config.time_budget {
            if started.elapsed() >= budget {
                warn!("RRT* time budget of {:?} spent after {} iterations", budget, self.iterations);
                return self.stop(StopReason::TimeBudget, started, observer).map(Some);
            }
        }
        if self.iterations >= self.config.max_iterations {
            if self.state == PlannerState::GoalFound {
                self.extract(observer)?;
                return Ok(Some(self.report(StopReason::GoalReached, started)));
            }
            warn!("RRT* reached max iteration ({}) without a path", self.iterations);
            return Err(PlanningError::PlanningExhausted {
                iterations: self.iterations,
                nodes: self.tree.len(),
            });
        }

        if self.iterations % 100 == 0 {
            debug!(
                "Iter: {}, number of nodes: {}, rewires: {}, best cost: {:?}",
                self.iterations,
                self.tree.len(),
                self.rewires,
                self.best_cost()
            );
        }
        Ok(None)
    }

    /// Steer one step from the nearest node toward `sample`. A step that
    /// overshoots the workspace edge is pulled back onto it. `None` when the
    /// result is still outside, coincides with the nearest node, or collides.
    pub(crate) fn candidate_from(&self, sample: Point2D) -> Option<(Point2D, NodeHandle)> {
        let nearest = self.tree.nearest(&sample);
        let from = self.tree.get(nearest)?.position();
        let candidate = self.request.bounds.clamp(&steer(from, sample, self.config.step_size));

        if candidate == from || !self.request.bounds.contains(&candidate) {
            return None;
        }
        if self.field.collides(&candidate) {
            return None;
        }
        if !self.field.edge_is_free(&from, &candidate, self.config.collision_mode) {
            return None;
        }
        Some((candidate, nearest))
    }

    /// Sample until a candidate survives, at most `max_resample_attempts` times.
    fn propose(&mut self) -> Option<(Point2D, NodeHandle)> {
        for _ in 0..self.config.max_resample_attempts {
            let sample = self.sampler.sample();
            if let Some(proposal) = self.candidate_from(sample) {
                return Some(proposal);
            }
        }
        None
    }

    /// Count one iteration and insert its candidate, if any.
    pub(crate) fn apply<O: PlannerObserver + ?Sized>(
        &mut self,
        proposal: Option<(Point2D, NodeHandle)>,
        observer: &mut O,
    ) -> PlanningResult<Option<NodeHandle>> {
        if self.state == PlannerState::Extracted {
            return Ok(None);
        }
        self.iterations += 1;

        let inserted = match proposal {
            Some((position, nearest)) => Some(self.insert_candidate(position, nearest, observer)?),
            None => {
                warn!(
                    "iteration {}: all {} resample attempts rejected",
                    self.iterations, self.config.max_resample_attempts
                );
                None
            }
        };

        match self.state {
            PlannerState::Growing => {
                if let Some(handle) = inserted {
                    self.try_reach_goal(handle, observer)?;
                }
            }
            PlannerState::GoalFound => {
                self.refined += 1;
                if self.refined >= self.config.refine_iterations {
                    self.extract(observer)?;
                }
            }
            PlannerState::Extracted => {}
        }

        if self.config.verify_invariants {
            if let Err(e) = self.tree.validate() {
                error!(
                    "RRT* aborted at iteration {} with {} nodes: {}",
                    self.iterations,
                    self.tree.len(),
                    e
                );
                return Err(e);
            }
        }
        Ok(inserted)
    }

    fn insert_candidate<O: PlannerObserver + ?Sized>(
        &mut self,
        position: Point2D,
        nearest: NodeHandle,
        observer: &mut O,
    ) -> PlanningResult<NodeHandle> {
        let neighbors = if self.config.rewire {
            self.tree.within_radius(&position, self.config.rewiring_radius)
        } else {
            Vec::new()
        };

        let choice = choose_parent(
            &self.tree,
            &self.field,
            self.config.collision_mode,
            &position,
            &neighbors,
            nearest,
        )?;
        let handle = self.tree.insert(position, choice.parent, choice.cost)?;
        observer.on_event(&PlannerEvent::NodeInserted {
            node: handle,
            parent: choice.parent,
            position,
            cost: choice.cost,
        });

        if self.config.rewire {
            self.rewires += rewire_neighbors(
                &mut self.tree,
                &self.field,
                self.config.collision_mode,
                handle,
                &neighbors,
                observer,
            )?;
        }
        Ok(handle)
    }

    fn try_reach_goal<O: PlannerObserver + ?Sized>(&mut self, handle: NodeHandle, observer: &mut O) -> PlanningResult<()> {
        let position = self.tree.node(handle)?.position();
        let goal = self.request.goal;
        if position.distance(&goal) > self.config.goal_radius
            || !self.field.edge_is_free(&position, &goal, self.config.collision_mode)
        {
            return Ok(());
        }

        let goal_node = self.tree.attach_goal(goal, handle)?;
        let cost = self.tree.node(goal_node)?.cost();
        self.goal_node = Some(goal_node);
        self.state = PlannerState::GoalFound;
        info!(
            "Find goal after {} iterations! nodes: {}, cost: {:.3}",
            self.iterations,
            self.tree.len(),
            cost
        );
        observer.on_event(&PlannerEvent::GoalReached { goal: goal_node, parent: handle, cost });

        if self.config.refine_iterations == 0 {
            self.extract(observer)?;
        }
        Ok(())
    }

    fn extract<O: PlannerObserver + ?Sized>(&mut self, observer: &mut O) -> PlanningResult<()> {
        let goal = self.goal_node.ok_or_else(|| {
            PlanningError::InvariantViolation("path extraction without a goal node".to_string())
        })?;
        let handles = self.tree.path_from_root(goal)?;
        let mut waypoints = Vec::with_capacity(handles.len());
        for handle in handles {
            waypoints.push(self.tree.node(handle)?.position());
        }
        let cost = self.tree.node(goal)?.cost();

        info!("RRT* path extracted: {} waypoints, cost {:.3}", waypoints.len(), cost);
        observer.on_event(&PlannerEvent::PathExtracted { waypoints: waypoints.clone(), cost });
        self.path = Some(Path2D::from_points(waypoints));
        self.state = PlannerState::Extracted;
        Ok(())
    }

    fn stop<O: PlannerObserver + ?Sized>(
        &mut self,
        reason: StopReason,
        started: Instant,
        observer: &mut O,
    ) -> PlanningResult<PlanReport> {
        if self.state == PlannerState::GoalFound {
            self.extract(observer)?;
        }
        Ok(self.report(reason, started))
    }

    fn report(&self, stop: StopReason, started: Instant) -> PlanReport {
        PlanReport {
            path: self.path.clone(),
            cost: self.path.as_ref().and_then(|_| self.best_cost()),
            iterations: self.iterations,
            nodes: self.tree.len(),
            rewires: self.rewires,
            stop,
            elapsed: started.elapsed(),
        }
    }
}

/// Reusable RRT* planner implementing [`PathPlanner`]
#[derive(Debug, Clone)]
pub struct RRTStarPlanner {
    field: ObstacleField,
    bounds: AreaBounds,
    config: RRTStarConfig,
}

impl RRTStarPlanner {
    pub fn new(field: ObstacleField, bounds: AreaBounds, config: RRTStarConfig) -> Self {
        RRTStarPlanner { field, bounds, config }
    }

    pub fn config(&self) -> &RRTStarConfig {
        &self.config
    }

    pub fn set_max_iterations(&mut self, max_iter: usize) {
        self.config.max_iterations = max_iter;
    }

    /// Fresh session for `start -> goal`
    pub fn session(&self, start: Point2D, goal: Point2D) -> PlanningResult<RRTStar> {
        let request = PlanningRequest::new(start, goal, self.bounds);
        RRTStar::new(self.field.clone(), request, self.config.clone())
    }
}

impl PathPlanner for RRTStarPlanner {
    fn plan(&self, start: Point2D, goal: Point2D) -> Result<Path2D, PlanningError> {
        let mut session = self.session(start, goal)?;
        let report = session.run(&CancelToken::new(), &mut NullObserver)?;
        report.path.ok_or(PlanningError::PlanningExhausted {
            iterations: report.iterations,
            nodes: report.nodes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::Obstacle;
    use crate::path_planning::events::EventRecorder;

    fn open_request() -> PlanningRequest {
        PlanningRequest::new(
            Point2D::new(0.0, 0.0),
            Point2D::new(100.0, 0.0),
            AreaBounds::from_size(1000.0, 1000.0),
        )
    }

    fn seeded(seed: u64) -> RRTStarConfig {
        RRTStarConfig {
            step_size: 15.0,
            goal_radius: 10.0,
            max_iterations: 2000,
            seed: Some(seed),
            verify_invariants: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_rrt_star_config_default() {
        let config = RRTStarConfig::default();
        assert_eq!(config.step_size, 15.0);
        assert_eq!(config.rewiring_radius, 30.0);
        assert_eq!(config.goal_radius, 20.0);
        assert_eq!(config.goal_sample_rate, 0.1);
        assert_eq!(config.collision_mode, CollisionMode::Segment);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_tuning() {
        let bad = [
            RRTStarConfig { step_size: 0.0, ..Default::default() },
            RRTStarConfig { goal_radius: -1.0, ..Default::default() },
            RRTStarConfig { rewiring_radius: f64::NAN, ..Default::default() },
            RRTStarConfig { max_iterations: 0, ..Default::default() },
            RRTStarConfig { max_resample_attempts: 0, ..Default::default() },
            RRTStarConfig { node_capacity: Some(2), ..Default::default() },
            RRTStarConfig { goal_sample_rate: 1.5, ..Default::default() },
            RRTStarConfig { goal_sample_rate: f64::NAN, ..Default::default() },
        ];
        for config in bad {
            let result = RRTStar::new(ObstacleField::empty(), open_request(), config);
            assert!(matches!(result, Err(PlanningError::InvalidConfiguration(_))));
        }
    }

    #[test]
    fn test_goal_inside_obstacle_is_rejected() {
        let field = ObstacleField::new(vec![Obstacle::rectangle(90.0, -10.0, 20.0, 20.0)]).unwrap();
        let result = RRTStar::new(field, open_request(), seeded(1));
        assert!(matches!(result, Err(PlanningError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_start_outside_bounds_is_rejected() {
        let mut request = open_request();
        request.start = Point2D::new(-1.0, 5.0);
        let result = RRTStar::new(ObstacleField::empty(), request, seeded(1));
        assert!(matches!(result, Err(PlanningError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_open_field_success_rate() {
        let mut reached = 0;
        for seed in 0..100 {
            let config = RRTStarConfig { verify_invariants: false, ..seeded(seed) };
            let mut planner = RRTStar::new(ObstacleField::empty(), open_request(), config).unwrap();
            if let Ok(report) = planner.run(&CancelToken::new(), &mut NullObserver) {
                let path = report.path.expect("path");
                assert_eq!(path.first(), Some(&Point2D::new(0.0, 0.0)));
                assert_eq!(path.last(), Some(&Point2D::new(100.0, 0.0)));
                assert!(report.iterations <= 2000);
                reached += 1;
            }
        }
        assert!(reached >= 90, "only {} of 100 seeds reached the goal", reached);
    }

    #[test]
    fn test_goal_on_workspace_edge_is_reached_without_bias() {
        // Steps overshooting y = 0 are pulled back onto the edge
        let request = PlanningRequest::new(
            Point2D::new(0.0, 0.0),
            Point2D::new(100.0, 0.0),
            AreaBounds::from_size(120.0, 120.0),
        );
        let config = RRTStarConfig {
            goal_sample_rate: 0.0,
            max_iterations: 20_000,
            verify_invariants: false,
            ..seeded(3)
        };
        let mut planner = RRTStar::new(ObstacleField::empty(), request, config).unwrap();
        let report = planner.run(&CancelToken::new(), &mut NullObserver).unwrap();
        assert!(report.path.is_some());
        for (_, node) in planner.tree().iter() {
            assert!(request.bounds.contains(&node.position()));
        }
    }

    #[test]
    fn test_open_field_run_emits_events() {
        let mut planner = RRTStar::new(ObstacleField::empty(), open_request(), seeded(11)).unwrap();
        let mut recorder = EventRecorder::new();
        let report = planner.run(&CancelToken::new(), &mut recorder).unwrap();

        assert_eq!(report.stop, StopReason::GoalReached);
        assert_eq!(planner.state(), PlannerState::Extracted);
        let path = report.path.expect("path");
        assert_eq!(path.first(), Some(&Point2D::new(0.0, 0.0)));
        assert_eq!(path.last(), Some(&Point2D::new(100.0, 0.0)));
        assert!(report.iterations <= 2000);
        assert!(planner.tree().validate().is_ok());
        assert!(matches!(recorder.events.last(), Some(PlannerEvent::PathExtracted { .. })));
        assert_eq!(recorder.insertions() + 1, planner.tree().len() - 1);
    }

    #[test]
    fn test_path_cost_matches_goal_node() {
        let mut planner = RRTStar::new(ObstacleField::empty(), open_request(), seeded(5)).unwrap();
        let report = planner.run(&CancelToken::new(), &mut NullObserver).unwrap();
        let path = report.path.unwrap();
        let cost = report.cost.unwrap();
        assert!((path.total_length() - cost).abs() < 1e-6);
        // Never shorter than the straight line
        assert!(cost >= 100.0 - 1e-9);
    }

    #[test]
    fn test_cancel_before_start_returns_no_path() {
        let mut planner = RRTStar::new(ObstacleField::empty(), open_request(), seeded(2)).unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();
        let report = planner.run(&cancel, &mut NullObserver).unwrap();
        assert_eq!(report.stop, StopReason::Cancelled);
        assert!(report.path.is_none());
        assert_eq!(report.iterations, 0);
        assert_eq!(planner.state(), PlannerState::Growing);
    }

    #[test]
    fn test_unreachable_goal_exhausts() {
        // Goal enclosed by four walls
        let field = ObstacleField::new(vec![
            Obstacle::rectangle(450.0, 450.0, 100.0, 10.0),
            Obstacle::rectangle(450.0, 540.0, 100.0, 10.0),
            Obstacle::rectangle(450.0, 450.0, 10.0, 100.0),
            Obstacle::rectangle(540.0, 450.0, 10.0, 100.0),
        ])
        .unwrap();
        let request = PlanningRequest::new(
            Point2D::new(100.0, 100.0),
            Point2D::new(500.0, 500.0),
            AreaBounds::from_size(1000.0, 1000.0),
        );
        let config = RRTStarConfig { max_iterations: 300, seed: Some(9), ..Default::default() };
        let mut planner = RRTStar::new(field, request, config).unwrap();
        let err = planner.run(&CancelToken::new(), &mut NullObserver).unwrap_err();
        assert!(matches!(err, PlanningError::PlanningExhausted { iterations: 300, .. }));
    }

    #[test]
    fn test_time_budget_stops_without_path() {
        let field = ObstacleField::new(vec![
            Obstacle::rectangle(450.0, 450.0, 100.0, 10.0),
            Obstacle::rectangle(450.0, 540.0, 100.0, 10.0),
            Obstacle::rectangle(450.0, 450.0, 10.0, 100.0),
            Obstacle::rectangle(540.0, 450.0, 10.0, 100.0),
        ])
        .unwrap();
        let request = PlanningRequest::new(
            Point2D::new(100.0, 100.0),
            Point2D::new(500.0, 500.0),
            AreaBounds::from_size(1000.0, 1000.0),
        );
        let config = RRTStarConfig {
            max_iterations: usize::MAX,
            time_budget: Some(Duration::from_millis(50)),
            seed: Some(9),
            ..Default::default()
        };
        let mut planner = RRTStar::new(field, request, config).unwrap();
        let report = planner.run(&CancelToken::new(), &mut NullObserver).unwrap();
        assert_eq!(report.stop, StopReason::TimeBudget);
        assert!(report.path.is_none());
        assert!(report.elapsed >= Duration::from_millis(50));
        assert_eq!(planner.state(), PlannerState::Growing);
    }

    #[test]
    fn test_cancel_during_refinement_keeps_best_path() {
        let config = RRTStarConfig { refine_iterations: 100_000, max_iterations: 200_000, ..seeded(14) };
        let mut planner = RRTStar::new(ObstacleField::empty(), open_request(), config).unwrap();
        let cancel = CancelToken::new();
        let token = cancel.clone();
        let mut observer = |event: &PlannerEvent| {
            if let PlannerEvent::GoalReached { .. } = event {
                token.cancel();
            }
        };
        let report = planner.run(&cancel, &mut observer).unwrap();

        assert_eq!(report.stop, StopReason::Cancelled);
        assert_eq!(planner.state(), PlannerState::Extracted);
        let path = report.path.expect("path found before the cancel");
        assert_eq!(path.last(), Some(&Point2D::new(100.0, 0.0)));
        assert_eq!(report.cost, planner.best_cost());
        assert!(report.iterations < 200_000);
    }

    #[test]
    fn test_resample_bound_prevents_livelock() {
        // Every sample coincides with the root, so every candidate is rejected
        let request = PlanningRequest::new(
            Point2D::new(10.0, 10.0),
            Point2D::new(990.0, 990.0),
            AreaBounds::from_size(1000.0, 1000.0),
        );
        let sampler = || Point2D::new(10.0, 10.0);
        let config = RRTStarConfig { max_iterations: 5, max_resample_attempts: 3, ..Default::default() };
        let mut planner = RRTStar::with_sampler(ObstacleField::empty(), request, config, sampler).unwrap();
        let err = planner.run(&CancelToken::new(), &mut NullObserver).unwrap_err();
        assert!(matches!(err, PlanningError::PlanningExhausted { iterations: 5, nodes: 1 }));
    }

    #[test]
    fn test_segment_mode_never_crosses_thin_wall() {
        let field = ObstacleField::new(vec![Obstacle::rectangle(200.0, 0.0, 2.0, 900.0)]).unwrap();
        let request = PlanningRequest::new(
            Point2D::new(100.0, 100.0),
            Point2D::new(300.0, 100.0),
            AreaBounds::from_size(400.0, 1000.0),
        );
        let config = RRTStarConfig { max_iterations: 20_000, seed: Some(4), ..Default::default() };
        let mut planner = RRTStar::new(field.clone(), request, config).unwrap();
        let report = planner.run(&CancelToken::new(), &mut NullObserver).unwrap();
        assert!(report.path.is_some());
        for (a, b) in planner.edges() {
            assert!(!field.segment_collides(&a, &b), "edge {:?} -> {:?} crosses the wall", a, b);
        }
    }

    #[test]
    fn test_refinement_never_worsens_cost() {
        let config = RRTStarConfig { refine_iterations: 500, ..seeded(21) };
        let mut planner = RRTStar::new(ObstacleField::empty(), open_request(), config).unwrap();

        let mut first_cost = None;
        let mut observer = |event: &PlannerEvent| {
            if let PlannerEvent::GoalReached { cost, .. } = event {
                first_cost = Some(*cost);
            }
        };
        let report = planner.run(&CancelToken::new(), &mut observer).unwrap();
        let final_cost = report.cost.unwrap();
        assert!(final_cost <= first_cost.unwrap() + 1e-9);
        assert!(planner.tree().validate().is_ok());
    }

    #[test]
    fn test_plain_rrt_mode_never_rewires() {
        let config = RRTStarConfig { rewire: false, ..seeded(8) };
        let mut planner = RRTStar::new(ObstacleField::empty(), open_request(), config).unwrap();
        let mut recorder = EventRecorder::new();
        planner.run(&CancelToken::new(), &mut recorder).unwrap();
        assert_eq!(recorder.rewires(), 0);
        assert_eq!(planner.rewires(), 0);
    }

    #[test]
    fn test_path_planner_trait() {
        let planner = RRTStarPlanner::new(
            ObstacleField::from_preset(0).unwrap(),
            AreaBounds::from_size(1000.0, 1000.0),
            RRTStarConfig { max_iterations: 20_000, seed: Some(3), ..Default::default() },
        );
        let path = planner.plan(Point2D::new(100.0, 100.0), Point2D::new(600.0, 800.0)).unwrap();
        assert!(path.len() >= 2);
    }

    #[test]
    fn test_step_after_extraction_is_noop() {
        let mut planner = RRTStar::new(ObstacleField::empty(), open_request(), seeded(13)).unwrap();
        planner.run(&CancelToken::new(), &mut NullObserver).unwrap();
        let iterations = planner.iterations();
        assert_eq!(planner.step(&mut NullObserver).unwrap(), None);
        assert_eq!(planner.iterations(), iterations);
    }
}
