//! RRT* path planning demo
//!
//! Usage:
//!   cargo run --bin rrt_star -- --map 1 --seed 42
//!   cargo run --bin rrt_star -- --config configs/rrt_star.yaml --workers 4
//!
//! Set `RUST_LOG=debug` for per-100-iteration progress.

use std::path::Path;

use clap::Parser;
use log::{error, info, warn};

use rrt_star_planner::path_planning::{PlannerEvent, PlannerObserver};
use rrt_star_planner::utils::{colors, PathStyle, Visualizer};
use rrt_star_planner::{CancelToken, PlanningResult, RRTStar, ScenarioConfig, ShardedRRTStar};

#[derive(Parser, Debug)]
#[command(author, version, about = "RRT* path planning on a 2D obstacle map", long_about = None)]
struct Args {
    /// Scenario file; defaults to the selected map preset
    #[arg(short, long)]
    config: Option<String>,

    /// Built-in obstacle map, overrides the scenario's map
    #[arg(short, long)]
    map: Option<usize>,

    /// Sampler seed for reproducible runs
    #[arg(short, long)]
    seed: Option<u64>,

    /// Output image
    #[arg(short, long, default_value = "img/path_planning/rrt_star_result.png")]
    output: String,

    /// Sampling threads; 1 runs the single-threaded planner
    #[arg(short, long, default_value = "1")]
    workers: usize,

    /// Skip the plot
    #[arg(long)]
    no_plot: bool,
}

/// Counts tree changes as they happen
#[derive(Default)]
struct Progress {
    inserted: usize,
    rewired: usize,
}

impl PlannerObserver for Progress {
    fn on_event(&mut self, event: &PlannerEvent) {
        match event {
            PlannerEvent::NodeInserted { .. } => self.inserted += 1,
            PlannerEvent::NodeRewired { .. } => self.rewired += 1,
            PlannerEvent::GoalReached { cost, .. } => info!("goal reached, cost {:.2}", cost),
            PlannerEvent::PathExtracted { waypoints, .. } => info!("path with {} waypoints", waypoints.len()),
        }
    }
}

fn load_scenario(args: &Args) -> PlanningResult<ScenarioConfig> {
    let mut scenario = match &args.config {
        Some(path) => ScenarioConfig::load(Path::new(path))?,
        None => ScenarioConfig::preset(args.map.unwrap_or(0))?,
    };
    if let Some(map) = args.map {
        scenario.map = Some(map);
    }
    if let Some(seed) = args.seed {
        scenario.planner.seed = Some(seed);
    }
    Ok(scenario)
}

fn run(args: &Args) -> PlanningResult<()> {
    let scenario = load_scenario(args)?;
    let field = scenario.obstacle_field()?;
    let request = scenario.request();
    let config = scenario.planner_config();
    let goal_radius = config.goal_radius;
    let cancel = CancelToken::new();
    let mut progress = Progress::default();

    let (report, session) = if args.workers > 1 {
        let mut planner = ShardedRRTStar::new(field.clone(), request, config, args.workers)?;
        let report = planner.run(&cancel, &mut progress)?;
        (report, planner.into_session()?)
    } else {
        let mut planner = RRTStar::new(field.clone(), request, config)?;
        let report = planner.run(&cancel, &mut progress)?;
        (report, planner)
    };

    info!(
        "{:?} after {} iterations in {:?}: {} nodes, {} inserted, {} rewired",
        report.stop, report.iterations, report.elapsed, report.nodes, progress.inserted, progress.rewired
    );
    match report.cost {
        Some(cost) => info!("path cost {:.2}", cost),
        None => warn!("no path found"),
    }

    if args.no_plot {
        return Ok(());
    }

    let mut vis = Visualizer::new();
    vis.set_title("RRT*")
        .set_x_range(request.bounds.xmin, request.bounds.xmax)
        .set_y_range(request.bounds.ymin, request.bounds.ymax)
        .plot_obstacles(&field)
        .plot_tree(&session.edges())
        .plot_circle(request.goal, goal_radius, &PathStyle::new(colors::GOAL_REGION, "Goal region"));
    if let Some(path) = &report.path {
        vis.plot_path(path, &PathStyle::default().with_line_width(3.0));
    }
    vis.plot_start(request.start).plot_goal(request.goal);

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
