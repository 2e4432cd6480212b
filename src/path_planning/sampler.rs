//! Random configuration sampling for sampling-based planners

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Bernoulli, Distribution, Uniform};

use crate::common::{AreaBounds, PlanningError, PlanningResult, Point2D};

/// Source of configurations for tree expansion.
///
/// Implementations must be re-invocable indefinitely.
pub trait Sampler {
    fn sample(&mut self) -> Point2D;
}

impl<F: FnMut() -> Point2D> Sampler for F {
    fn sample(&mut self) -> Point2D {
        self()
    }
}

/// Independent, uniform draws from `[xmin, xmax) x [ymin, ymax)`
#[derive(Debug, Clone)]
pub struct UniformSampler {
    rng: StdRng,
    x_dist: Uniform<f64>,
    y_dist: Uniform<f64>,
}

impl UniformSampler {
    /// Sampler seeded from OS entropy
    pub fn new(bounds: AreaBounds) -> PlanningResult<Self> {
        Self::with_rng(bounds, StdRng::from_entropy())
    }

    /// Reproducible sampler
    pub fn seeded(bounds: AreaBounds, seed: u64) -> PlanningResult<Self> {
        Self::with_rng(bounds, StdRng::seed_from_u64(seed))
    }

    fn with_rng(bounds: AreaBounds, rng: StdRng) -> PlanningResult<Self> {
        if !bounds.is_valid() {
            return Err(PlanningError::InvalidConfiguration(format!(
                "sampling bounds {:?} are empty or not finite",
                bounds
            )));
        }
        Ok(UniformSampler {
            rng,
            x_dist: Uniform::new(bounds.xmin, bounds.xmax),
            y_dist: Uniform::new(bounds.ymin, bounds.ymax),
        })
    }
}

impl Sampler for UniformSampler {
    fn sample(&mut self) -> Point2D {
        Point2D::new(self.x_dist.sample(&mut self.rng), self.y_dist.sample(&mut self.rng))
    }
}

/// Offsets the coin stream from the wrapped sampler's stream under one seed
const GOAL_COIN_STREAM: u64 = 0x9E37_79B9_7F4A_7C15;

/// Returns the goal itself with probability `rate`, otherwise defers to
/// the wrapped sampler.
#[derive(Debug, Clone)]
pub struct GoalBiasedSampler<S> {
    inner: S,
    goal: Point2D,
    coin: Bernoulli,
    rng: StdRng,
}

impl<S: Sampler> GoalBiasedSampler<S> {
    pub fn new(inner: S, goal: Point2D, rate: f64) -> PlanningResult<Self> {
        Self::with_rng(inner, goal, rate, StdRng::from_entropy())
    }

    pub fn seeded(inner: S, goal: Point2D, rate: f64, seed: u64) -> PlanningResult<Self> {
        Self::with_rng(inner, goal, rate, StdRng::seed_from_u64(seed ^ GOAL_COIN_STREAM))
    }

    fn with_rng(inner: S, goal: Point2D, rate: f64, rng: StdRng) -> PlanningResult<Self> {
        let coin = Bernoulli::new(rate).map_err(|_| {
            PlanningError::InvalidConfiguration(format!("goal_sample_rate must lie in [0, 1], got {}", rate))
        })?;
        Ok(GoalBiasedSampler { inner, goal, coin, rng })
    }

    pub fn goal(&self) -> Point2D {
        self.goal
    }
}

impl<S: Sampler> Sampler for GoalBiasedSampler<S> {
    fn sample(&mut self) -> Point2D {
        if self.coin.sample(&mut self.rng) {
            self.goal
        } else {
            self.inner.sample()
        }
    }
}

/// Uniform sampler over `bounds` that draws `goal` with probability `rate`
pub fn goal_biased(
    bounds: AreaBounds,
    goal: Point2D,
    rate: f64,
    seed: Option<u64>,
) -> PlanningResult<GoalBiasedSampler<UniformSampler>> {
    match seed {
        Some(seed) => GoalBiasedSampler::seeded(UniformSampler::seeded(bounds, seed)?, goal, rate, seed),
        None => GoalBiasedSampler::new(UniformSampler::new(bounds)?, goal, rate),
    }
}
