//! Obstacle field: the immutable set of rectangles and circles that the
//! planners must avoid.

use serde::{Deserialize, Serialize};

use crate::common::{PlanningError, PlanningResult, Point2D};
use crate::environment::presets;

/// How an edge between two configurations is validated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionMode {
    /// The whole straight segment must be obstacle-free
    Segment,
    /// Legacy behaviour: only the destination point is checked, so edges
    /// may cut through thin obstacles
    PointOnly,
}

impl Default for CollisionMode {
    fn default() -> Self {
        CollisionMode::Segment
    }
}

/// A single obstacle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Obstacle {
    /// Axis-aligned rectangle spanning `origin .. origin + (width, height)`
    Rectangle { origin: Point2D, width: f64, height: f64 },
    /// Disc around `center`
    Circle { center: Point2D, radius: f64 },
}

impl Obstacle {
    pub fn rectangle(x: f64, y: f64, width: f64, height: f64) -> Self {
        Obstacle::Rectangle { origin: Point2D::new(x, y), width, height }
    }

    pub fn circle(x: f64, y: f64, radius: f64) -> Self {
        Obstacle::Circle { center: Point2D::new(x, y), radius }
    }

    /// Rectangles include their boundary, circles do not.
    pub fn contains(&self, point: &Point2D) -> bool {
        match *self {
            Obstacle::Rectangle { origin, width, height } => {
                point.x >= origin.x && point.x <= origin.x + width
                    && point.y >= origin.y && point.y <= origin.y + height
            }
            Obstacle::Circle { center, radius } => center.distance(point) < radius,
        }
    }

    /// Exact test of the closed segment `a -> b` against this obstacle.
    pub fn intersects_segment(&self, a: &Point2D, b: &Point2D) -> bool {
        match *self {
            Obstacle::Rectangle { origin, width, height } => segment_hits_rectangle(
                a,
                b,
                (origin.x, origin.x + width),
                (origin.y, origin.y + height),
            ),
            Obstacle::Circle { center, radius } => {
                segment_distance_squared(a, b, &center) < radius * radius
            }
        }
    }

    fn validate(&self) -> PlanningResult<()> {
        let ok = match *self {
            Obstacle::Rectangle { origin, width, height } => {
                origin.is_finite() && width.is_finite() && height.is_finite()
                    && width > 0.0 && height > 0.0
            }
            Obstacle::Circle { center, radius } => {
                center.is_finite() && radius.is_finite() && radius > 0.0
            }
        };
        if ok {
            Ok(())
        } else {
            Err(PlanningError::InvalidConfiguration(format!(
                "obstacle {:?} must have finite, positive extent",
                self
            )))
        }
    }
}

/// Slab clipping (Liang-Barsky) of the segment against a closed box.
fn segment_hits_rectangle(a: &Point2D, b: &Point2D, xs: (f64, f64), ys: (f64, f64)) -> bool {
    let mut t_enter = 0.0_f64;
    let mut t_exit = 1.0_f64;

    for &(p, d, lo, hi) in &[(a.x, b.x - a.x, xs.0, xs.1), (a.y, b.y - a.y, ys.0, ys.1)] {
        if d == 0.0 {
            if p < lo || p > hi {
                return false;
            }
            continue;
        }
        let mut t0 = (lo - p) / d;
        let mut t1 = (hi - p) / d;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_enter = t_enter.max(t0);
        t_exit = t_exit.min(t1);
        if t_enter > t_exit {
            return false;
        }
    }
    true
}

fn segment_distance_squared(a: &Point2D, b: &Point2D, p: &Point2D) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq == 0.0 {
        0.0
    } else {
        (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0)
    };
    let closest = Point2D::new(a.x + t * dx, a.y + t * dy);
    closest.distance_squared(p)
}

/// Immutable collection of obstacles answering collision queries
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObstacleField {
    obstacles: Vec<Obstacle>,
}

impl ObstacleField {
    pub fn new(obstacles: Vec<Obstacle>) -> PlanningResult<Self> {
        for obstacle in &obstacles {
            obstacle.validate()?;
        }
        Ok(ObstacleField { obstacles })
    }

    pub fn empty() -> Self {
        ObstacleField { obstacles: Vec::new() }
    }

    /// One of the built-in maps, selected by identifier
    pub fn from_preset(map: usize) -> PlanningResult<Self> {
        let obstacles = presets::preset(map).ok_or_else(|| {
            PlanningError::InvalidConfiguration(format!(
                "unknown map preset {} ({} available)",
                map,
                presets::PRESET_COUNT
            ))
        })?;
        Self::new(obstacles)
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    /// True iff `point` is inside any obstacle
    pub fn collides(&self, point: &Point2D) -> bool {
        self.obstacles.iter().any(|o| o.contains(point))
    }

    /// True iff the segment `a -> b` touches any obstacle
    pub fn segment_collides(&self, a: &Point2D, b: &Point2D) -> bool {
        self.obstacles.iter().any(|o| o.intersects_segment(a, b))
    }

    /// Validity of the edge `from -> to` under the given mode
    pub fn edge_is_free(&self, from: &Point2D, to: &Point2D, mode: CollisionMode) -> bool {
        match mode {
            CollisionMode::Segment => !self.segment_collides(from, to),
            CollisionMode::PointOnly => !self.collides(to),
        }
    }
}
