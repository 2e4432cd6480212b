//! Grid A* path planning demo
//!
//! Usage:
//!   cargo run --bin grid_a_star -- --seed 3
//!   cargo run --bin grid_a_star -- --config configs/grid_a_star.yaml
//!   cargo run --bin grid_a_star -- --map 0   # rasterize a built-in map

use std::path::Path;

use clap::Parser;
use log::{error, info, warn};

use rrt_star_planner::utils::{colors, PathStyle, PointStyle, Visualizer};
use rrt_star_planner::{GridAStarPlanner, PathPlanner, PlanningResult, ScenarioConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "A* search on an 8-connected occupancy grid", long_about = None)]
struct Args {
    /// Scenario file
    #[arg(short, long)]
    config: Option<String>,

    /// Rasterize this built-in map instead of drawing a random grid
    #[arg(short, long)]
    map: Option<usize>,

    /// Seed for the random grid
    #[arg(short, long)]
    seed: Option<u64>,

    /// Output image
    #[arg(short, long, default_value = "img/path_planning/grid_a_star_result.png")]
    output: String,

    /// Accepted for symmetry with the RRT* demo; the lattice search is single-threaded
    #[arg(short, long, default_value = "1")]
    workers: usize,

    /// Skip the plot
    #[arg(long)]
    no_plot: bool,
}

fn load_scenario(args: &Args) -> PlanningResult<ScenarioConfig> {
    let mut scenario = match (&args.config, args.map) {
        (Some(path), _) => ScenarioConfig::load(Path::new(path))?,
        (None, Some(map)) => ScenarioConfig::preset(map)?,
        (None, None) => ScenarioConfig::default(),
    };
    if let Some(map) = args.map {
        scenario.map = Some(map);
        scenario.grid.rasterize = true;
    }
    if let Some(seed) = args.seed {
        scenario.grid.seed = Some(seed);
    }
    Ok(scenario)
}

fn run(args: &Args) -> PlanningResult<()> {
    if args.workers > 1 {
        info!("grid A* ignores --workers {}", args.workers);
    }
    let scenario = load_scenario(args)?;
    let mut world = scenario.grid_world()?;

    // Endpoints of a random grid are always free
    if !scenario.grid.rasterize {
        for point in [scenario.start, scenario.goal] {
            if let Some(cell) = world.cell_of(&point) {
                world.set_blocked(cell, false)?;
            }
        }
    }
    info!("{}x{} grid with {} blocked cells", world.rows(), world.cols(), world.blocked_count());

    let planner = GridAStarPlanner::new(world);
    let path = planner.plan(scenario.start, scenario.goal)?;
    info!("path with {} cells, length {:.2}", path.len(), path.total_length());

    if args.no_plot {
        return Ok(());
    }

    let bounds = scenario.bounds();
    let mut vis = Visualizer::new();
    vis.set_title("Grid A*")
        .set_x_range(bounds.xmin, bounds.xmax)
        .set_y_range(bounds.ymin, bounds.ymax)
        .plot_grid(planner.world())
        .plot_path(&path, &PathStyle::new(colors::PATH, "Path").with_line_width(3.0))
        .plot_points(&path.points, &PointStyle::new(colors::CLOSED_CELL, "Cells").with_size(0.3))
        .plot_start(scenario.start)
        .plot_goal(scenario.goal);

    if let Some(dir) = Path::new(&args.output).parent() {
        std::fs::create_dir_all(dir)?;
    }
    match vis.save_png(&args.output, 800, 800) {
        Ok(()) => info!("Plot saved to: {}", args.output),
        Err(e) => warn!("failed to save plot: {}", e),
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if let Err(e) = run(&args) {
        error!("{}", e);
        std::process::exit(1);
    }
}
