//! Common types used throughout rrt_star_planner

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// 2D point representation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    pub fn distance(&self, other: &Point2D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn distance_squared(&self, other: &Point2D) -> f64 {
        (self.x - other.x).powi(2) + (self.y - other.y).powi(2)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn to_vector(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }
}

impl From<(f64, f64)> for Point2D {
    fn from(tuple: (f64, f64)) -> Self {
        Self { x: tuple.0, y: tuple.1 }
    }
}

impl From<Vector2<f64>> for Point2D {
    fn from(v: Vector2<f64>) -> Self {
        Self { x: v[0], y: v[1] }
    }
}

/// Path represented as a sequence of 2D points
#[derive(Debug, Clone, PartialEq)]
pub struct Path2D {
    pub points: Vec<Point2D>,
}

impl Path2D {
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    pub fn from_points(points: Vec<Point2D>) -> Self {
        Self { points }
    }

    pub fn push(&mut self, point: Point2D) {
        self.points.push(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&Point2D> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&Point2D> {
        self.points.last()
    }

    pub fn x_coords(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.x).collect()
    }

    pub fn y_coords(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.y).collect()
    }

    pub fn total_length(&self) -> f64 {
        if self.points.len() < 2 {
            return 0.0;
        }
        self.points.windows(2)
            .map(|w| w[0].distance(&w[1]))
            .sum()
    }
}

impl Default for Path2D {
    fn default() -> Self {
        Self::new()
    }
}

/// Axis-aligned workspace bounds, half-open on the max side
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AreaBounds {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
}

impl AreaBounds {
    pub fn new(xmin: f64, xmax: f64, ymin: f64, ymax: f64) -> Self {
        AreaBounds { xmin, xmax, ymin, ymax }
    }

    /// Bounds `[0, width) x [0, height)`
    pub fn from_size(width: f64, height: f64) -> Self {
        AreaBounds::new(0.0, width, 0.0, height)
    }

    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    /// True when both extents are finite and strictly positive
    pub fn is_valid(&self) -> bool {
        let finite = self.xmin.is_finite() && self.xmax.is_finite()
            && self.ymin.is_finite() && self.ymax.is_finite();
        finite && self.width() > 0.0 && self.height() > 0.0
    }

    pub fn contains(&self, point: &Point2D) -> bool {
        point.x >= self.xmin && point.x < self.xmax
            && point.y >= self.ymin && point.y < self.ymax
    }

    /// Nearest point of the closed rectangle. Never farther from an
    /// interior point than `point` was.
    pub fn clamp(&self, point: &Point2D) -> Point2D {
        Point2D::new(point.x.clamp(self.xmin, self.xmax), point.y.clamp(self.ymin, self.ymax))
    }
}

/// Grid node for graph-based planners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridNode {
    pub x: i32,
    pub y: i32,
}

impl GridNode {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point2d_distance() {
        let p1 = Point2D::new(0.0, 0.0);
        let p2 = Point2D::new(3.0, 4.0);
        assert!((p1.distance(&p2) - 5.0).abs() < 1e-10);
        assert!((p1.distance_squared(&p2) - 25.0).abs() < 1e-10);
    }

    #[test]
    fn test_point2d_vector_conversion() {
        let p = Point2D::new(1.5, -2.0);
        let back: Point2D = p.to_vector().into();
        assert_eq!(p, back);
    }

    #[test]
    fn test_path2d_total_length() {
        let path = Path2D::from_points(vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(1.0, 0.0),
            Point2D::new(1.0, 1.0),
        ]);
        assert!((path.total_length() - 2.0).abs() < 1e-10);
        assert_eq!(path.x_coords(), vec![0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_area_bounds_half_open() {
        let bounds = AreaBounds::from_size(10.0, 5.0);
        assert!(bounds.contains(&Point2D::new(0.0, 0.0)));
        assert!(bounds.contains(&Point2D::new(9.999, 4.999)));
        assert!(!bounds.contains(&Point2D::new(10.0, 1.0)));
        assert!(!bounds.contains(&Point2D::new(1.0, 5.0)));
        assert!(!bounds.contains(&Point2D::new(-0.1, 1.0)));
    }

    #[test]
    fn test_area_bounds_validity() {
        assert!(AreaBounds::from_size(1.0, 1.0).is_valid());
        assert!(!AreaBounds::from_size(0.0, 1.0).is_valid());
        assert!(!AreaBounds::new(0.0, f64::NAN, 0.0, 1.0).is_valid());
    }

    #[test]
    fn test_area_bounds_clamp() {
        let bounds = AreaBounds::from_size(10.0, 5.0);
        assert_eq!(bounds.clamp(&Point2D::new(3.0, 2.0)), Point2D::new(3.0, 2.0));
        assert_eq!(bounds.clamp(&Point2D::new(4.0, -0.5)), Point2D::new(4.0, 0.0));
        assert_eq!(bounds.clamp(&Point2D::new(12.0, 7.0)), Point2D::new(10.0, 5.0));
    }
}
