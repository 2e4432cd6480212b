//! Built-in obstacle maps for a 1000 x 1000 workspace.

use crate::environment::Obstacle;

pub const PRESET_COUNT: usize = 2;

/// Workspace size the presets were laid out for
pub const PRESET_WIDTH: f64 = 1000.0;
pub const PRESET_HEIGHT: f64 = 1000.0;

pub fn preset(map: usize) -> Option<Vec<Obstacle>> {
    match map {
        // Two walls and a disc in the upper right corner
        0 => Some(vec![
            Obstacle::rectangle(300.0, 300.0, 150.0, 600.0),
            Obstacle::rectangle(700.0, 500.0, 250.0, 100.0),
            Obstacle::circle(850.0, 150.0, 100.0),
        ]),
        // Long thin wall with a gap at each end, large disc on the left
        1 => Some(vec![
            Obstacle::rectangle(700.0, 50.0, 50.0, 900.0),
            Obstacle::circle(350.0, 650.0, 200.0),
            Obstacle::circle(900.0, 300.0, 50.0),
        ]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Point2D;
    use crate::environment::ObstacleField;

    #[test]
    fn test_all_presets_load() {
        for map in 0..PRESET_COUNT {
            let field = ObstacleField::from_preset(map).unwrap();
            assert_eq!(field.len(), 3);
        }
        assert!(ObstacleField::from_preset(PRESET_COUNT).is_err());
    }

    #[test]
    fn test_preset_one_wall_has_gaps() {
        let field = ObstacleField::from_preset(1).unwrap();
        assert!(field.collides(&Point2D::new(725.0, 500.0)));
        assert!(!field.collides(&Point2D::new(725.0, 25.0)));
        assert!(!field.collides(&Point2D::new(725.0, 975.0)));
    }
}
