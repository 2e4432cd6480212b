//! Steering: fixed-length extension from a tree node toward a sample

use crate::common::Point2D;

/// Point at distance exactly `step` from `from` along the ray toward `toward`.
///
/// The step is taken even when the sample is closer than `step`, which bounds
/// every tree edge to the same length. When `from == toward` the direction is
/// undefined and `from` is returned unchanged.
pub fn steer(from: Point2D, toward: Point2D, step: f64) -> Point2D {
    let delta = toward.to_vector() - from.to_vector();
    let norm = delta.norm();
    if norm == 0.0 || !norm.is_finite() {
        return from;
    }
    Point2D::from(from.to_vector() + delta * (step / norm))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steer_takes_exact_step() {
        let from = Point2D::new(0.0, 0.0);
        let p = steer(from, Point2D::new(30.0, 40.0), 15.0);
        assert!((p.x - 9.0).abs() < 1e-12);
        assert!((p.y - 12.0).abs() < 1e-12);
        assert!((from.distance(&p) - 15.0).abs() < 1e-12);
    }

    #[test]
    fn test_steer_overshoots_close_sample() {
        let from = Point2D::new(10.0, 10.0);
        let p = steer(from, Point2D::new(11.0, 10.0), 5.0);
        assert!((p.x - 15.0).abs() < 1e-12);
        assert!((p.y - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_steer_same_point_returns_source() {
        let from = Point2D::new(3.0, -4.0);
        assert_eq!(steer(from, from, 15.0), from);
    }
}
