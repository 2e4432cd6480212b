//! Visualization utilities for rrt_star_planner
//!
//! Layers are collected first and drawn onto a single gnuplot axes when the
//! figure is shown or saved.

use gnuplot::{AutoOption, AxesCommon, Caption, Color, Figure, LineWidth, PointSize, PointSymbol};

use crate::common::{GridNode, Path2D, Point2D};
use crate::environment::{Obstacle, ObstacleField};
use crate::path_planning::GridWorld;

/// Segments used to outline a circle
const CIRCLE_SEGMENTS: usize = 64;

/// Color palette for consistent styling
pub mod colors {
    pub const BLACK: &str = "#000000";
    pub const RED: &str = "#FF0000";
    pub const GREEN: &str = "#00FF00";
    pub const BLUE: &str = "#0000FF";
    pub const ORANGE: &str = "#FFA500";
    pub const GRAY: &str = "#808080";

    // Semantic colors
    pub const OBSTACLE: &str = BLACK;
    pub const TREE: &str = GRAY;
    pub const START: &str = ORANGE;
    pub const GOAL: &str = ORANGE;
    pub const PATH: &str = BLUE;
    pub const GOAL_REGION: &str = GREEN;
    pub const CLOSED_CELL: &str = RED;
}

/// Style for path rendering
#[derive(Debug, Clone)]
pub struct PathStyle {
    pub color: String,
    pub line_width: f64,
    pub caption: String,
}

impl PathStyle {
    pub fn new(color: &str, caption: &str) -> Self {
        Self {
            color: color.to_string(),
            line_width: 2.0,
            caption: caption.to_string(),
        }
    }

    pub fn with_line_width(mut self, width: f64) -> Self {
        self.line_width = width;
        self
    }
}

impl Default for PathStyle {
    fn default() -> Self {
        Self::new(colors::PATH, "Path")
    }
}

/// Style for point rendering
#[derive(Debug, Clone)]
pub struct PointStyle {
    pub color: String,
    pub size: f64,
    pub symbol: char,
    pub caption: String,
}

impl PointStyle {
    pub fn new(color: &str, caption: &str) -> Self {
        Self {
            color: color.to_string(),
            size: 1.0,
            symbol: 'O',
            caption: caption.to_string(),
        }
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    pub fn with_symbol(mut self, symbol: char) -> Self {
        self.symbol = symbol;
        self
    }
}

#[derive(Debug, Clone)]
enum Layer {
    Lines { x: Vec<f64>, y: Vec<f64>, style: PathStyle, captioned: bool },
    Points { x: Vec<f64>, y: Vec<f64>, style: PointStyle },
}

/// Main visualizer struct
pub struct Visualizer {
    layers: Vec<Layer>,
    title: String,
    x_range: Option<(f64, f64)>,
    y_range: Option<(f64, f64)>,
    aspect_ratio: Option<f64>,
}

impl Visualizer {
    pub fn new() -> Self {
        Self {
            layers: Vec::new(),
            title: String::new(),
            x_range: None,
            y_range: None,
            aspect_ratio: Some(1.0),
        }
    }

    pub fn set_title(&mut self, title: &str) -> &mut Self {
        self.title = title.to_string();
        self
    }

    pub fn set_x_range(&mut self, min: f64, max: f64) -> &mut Self {
        self.x_range = Some((min, max));
        self
    }

    pub fn set_y_range(&mut self, min: f64, max: f64) -> &mut Self {
        self.y_range = Some((min, max));
        self
    }

    /// Set aspect ratio (None for auto)
    pub fn set_aspect_ratio(&mut self, ratio: Option<f64>) -> &mut Self {
        self.aspect_ratio = ratio;
        self
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn plot_path(&mut self, path: &Path2D, style: &PathStyle) -> &mut Self {
        self.layers.push(Layer::Lines {
            x: path.x_coords(),
            y: path.y_coords(),
            style: style.clone(),
            captioned: true,
        });
        self
    }

    /// Outline of every obstacle; only the first one carries the caption
    pub fn plot_obstacles(&mut self, field: &ObstacleField) -> &mut Self {
        let style = PathStyle::new(colors::OBSTACLE, "Obstacles").with_line_width(1.5);
        for (i, obstacle) in field.obstacles().iter().enumerate() {
            let (x, y) = obstacle_outline(obstacle);
            self.layers.push(Layer::Lines { x, y, style: style.clone(), captioned: i == 0 });
        }
        self
    }

    /// Tree edges as thin uncaptioned segments
    pub fn plot_tree(&mut self, edges: &[(Point2D, Point2D)]) -> &mut Self {
        let style = PathStyle::new(colors::TREE, "Tree").with_line_width(0.5);
        for (i, (a, b)) in edges.iter().enumerate() {
            self.layers.push(Layer::Lines {
                x: vec![a.x, b.x],
                y: vec![a.y, b.y],
                style: style.clone(),
                captioned: i == 0,
            });
        }
        self
    }

    /// Circle of `radius` around `center`, e.g. the goal region
    pub fn plot_circle(&mut self, center: Point2D, radius: f64, style: &PathStyle) -> &mut Self {
        let (x, y) = circle_outline(center, radius);
        self.layers.push(Layer::Lines { x, y, style: style.clone(), captioned: true });
        self
    }

    /// Blocked cells of a lattice as square markers at their centres
    pub fn plot_grid(&mut self, world: &GridWorld) -> &mut Self {
        let cells = world.blocked_cells();
        self.plot_cells(world, &cells, &PointStyle::new(colors::OBSTACLE, "Blocked").with_symbol('S').with_size(0.5))
    }

    pub fn plot_cells(&mut self, world: &GridWorld, cells: &[GridNode], style: &PointStyle) -> &mut Self {
        let centres: Vec<Point2D> = cells.iter().map(|&c| world.cell_center(c)).collect();
        self.plot_points(&centres, style)
    }

    pub fn plot_point(&mut self, point: Point2D, style: &PointStyle) -> &mut Self {
        self.plot_points(&[point], style)
    }

    pub fn plot_points(&mut self, points: &[Point2D], style: &PointStyle) -> &mut Self {
        self.layers.push(Layer::Points {
            x: points.iter().map(|p| p.x).collect(),
            y: points.iter().map(|p| p.y).collect(),
            style: style.clone(),
        });
        self
    }

    pub fn plot_start(&mut self, point: Point2D) -> &mut Self {
        self.plot_point(point, &PointStyle::new(colors::START, "Start").with_size(1.5))
    }

    pub fn plot_goal(&mut self, point: Point2D) -> &mut Self {
        self.plot_point(point, &PointStyle::new(colors::GOAL, "Goal").with_size(1.5).with_symbol('S'))
    }

    /// Finalize and show the plot
    pub fn show(&self) -> Result<(), String> {
        let mut figure = self.render();
        figure.show().map_err(|e| e.to_string()).map(|_| ())
    }

    pub fn save_png(&self, path: &str, width: u32, height: u32) -> Result<(), String> {
        let mut figure = self.render();
        figure.save_to_png(path, width, height).map_err(|e| e.to_string())
    }

    pub fn save_svg(&self, path: &str, width: u32, height: u32) -> Result<(), String> {
        let mut figure = self.render();
        figure.save_to_svg(path, width, height).map_err(|e| e.to_string())
    }

    fn render(&self) -> Figure {
        let mut figure = Figure::new();
        let axes = figure.axes2d();

        for layer in &self.layers {
            match layer {
                Layer::Lines { x, y, style, captioned } => {
                    if *captioned {
                        axes.lines(x, y, &[Caption(&style.caption), Color(&style.color), LineWidth(style.line_width)]);
                    } else {
                        axes.lines(x, y, &[Color(&style.color), LineWidth(style.line_width)]);
                    }
                }
                Layer::Points { x, y, style } => {
                    axes.points(x, y, &[
                        Caption(&style.caption),
                        Color(&style.color),
                        PointSymbol(style.symbol),
                        PointSize(style.size),
                    ]);
                }
            }
        }

        if !self.title.is_empty() {
            axes.set_title(&self.title, &[]);
        }
        if let Some((min, max)) = self.x_range {
            axes.set_x_range(AutoOption::Fix(min), AutoOption::Fix(max));
        }
        if let Some((min, max)) = self.y_range {
            axes.set_y_range(AutoOption::Fix(min), AutoOption::Fix(max));
        }
        if let Some(ratio) = self.aspect_ratio {
            axes.set_aspect_ratio(AutoOption::Fix(ratio));
        }
        figure
    }
}

impl Default for Visualizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Closed polyline around an obstacle
fn obstacle_outline(obstacle: &Obstacle) -> (Vec<f64>, Vec<f64>) {
    match *obstacle {
        Obstacle::Rectangle { origin, width, height } => {
            let (x0, y0) = (origin.x, origin.y);
            let (x1, y1) = (x0 + width, y0 + height);
            (vec![x0, x1, x1, x0, x0], vec![y0, y0, y1, y1, y0])
        }
        Obstacle::Circle { center, radius } => circle_outline(center, radius),
    }
}

fn circle_outline(center: Point2D, radius: f64) -> (Vec<f64>, Vec<f64>) {
    (0..=CIRCLE_SEGMENTS)
        .map(|i| {
            let theta = 2.0 * std::f64::consts::PI * i as f64 / CIRCLE_SEGMENTS as f64;
            (center.x + radius * theta.cos(), center.y + radius * theta.sin())
        })
        .unzip()
}
