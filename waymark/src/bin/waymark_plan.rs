use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;
use waymark::prelude::{DStarLite, GridPoint, PlanResult, PlannerConfig, ScenarioFile};
use waymark_core::{init_logging, ScenarioReplan};

#[derive(Parser)]
#[command(name = "waymark-plan")]
#[command(about = "Plan on a grid with D* Lite, apply world changes, print the results as JSON")]
#[command(version)]
struct Cli {
    /// TOML scenario file; grid arguments are ignored when given
    #[arg(short = 's', long = "scenario")]
    scenario: Option<PathBuf>,

    /// Planner config TOML, overrides the scenario's [planner] table
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Grid width in cells
    #[arg(long, default_value_t = 10)]
    width: usize,

    /// Grid height in cells
    #[arg(long, default_value_t = 10)]
    height: usize,

    /// Start cell as x,y
    #[arg(long, value_parser = parse_point, default_value = "0,0")]
    start: GridPoint,

    /// Goal cell as x,y (defaults to the far corner)
    #[arg(long, value_parser = parse_point)]
    goal: Option<GridPoint>,

    /// Initially blocked cell as x,y (repeatable)
    #[arg(long = "obstacle", value_parser = parse_point)]
    obstacles: Vec<GridPoint>,

    /// Cell to block after the first plan (repeatable)
    #[arg(long = "block", value_parser = parse_point)]
    block: Vec<GridPoint>,

    /// Cell to free after the first plan (repeatable)
    #[arg(long = "unblock", value_parser = parse_point)]
    unblock: Vec<GridPoint>,

    /// Robot position for the replan, as x,y
    #[arg(long = "move-to", value_parser = parse_point)]
    move_to: Option<GridPoint>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long = "log-level", default_value = "warn")]
    log_level: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
enum PointParseError {
    #[error("expected x,y but got '{0}'")]
    Format(String),
    #[error("invalid coordinate '{0}'")]
    Coordinate(String),
}

fn parse_point(s: &str) -> Result<GridPoint, PointParseError> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| PointParseError::Format(s.to_string()))?;
    let coord = |v: &str| {
        v.trim()
            .parse::<usize>()
            .map_err(|_| PointParseError::Coordinate(v.trim().to_string()))
    };
    Ok(GridPoint::new(coord(x)?, coord(y)?))
}

fn point(p: [usize; 2]) -> GridPoint {
    GridPoint::new(p[0], p[1])
}

fn points(cells: &[[usize; 2]]) -> Vec<GridPoint> {
    cells.iter().copied().map(point).collect()
}

#[derive(Serialize)]
struct Report {
    width: usize,
    height: usize,
    initial: PlanResult,
    replans: Vec<PlanResult>,
}

fn scenario_from_args(cli: &Cli) -> ScenarioFile {
    let goal = cli.goal.unwrap_or(GridPoint::new(
        cli.width.saturating_sub(1),
        cli.height.saturating_sub(1),
    ));

    let mut replans = Vec::new();
    if !cli.block.is_empty() || !cli.unblock.is_empty() || cli.move_to.is_some() {
        replans.push(ScenarioReplan {
            added: cli.block.iter().map(|p| [p.x, p.y]).collect(),
            removed: cli.unblock.iter().map(|p| [p.x, p.y]).collect(),
            move_to: cli.move_to.map(|p| [p.x, p.y]),
        });
    }

    ScenarioFile {
        width: cli.width,
        height: cli.height,
        start: [cli.start.x, cli.start.y],
        goal: [goal.x, goal.y],
        obstacles: cli.obstacles.iter().map(|p| [p.x, p.y]).collect(),
        replans,
        planner: PlannerConfig::default(),
    }
}

fn run(scenario: &ScenarioFile) -> Result<Report> {
    let mut planner = DStarLite::with_config(
        scenario.width,
        scenario.height,
        point(scenario.start),
        point(scenario.goal),
        &points(&scenario.obstacles),
        scenario.planner,
    )?;

    let initial = planner.plan();
    info!(
        success = initial.success,
        cost = initial.cost,
        nodes_explored = initial.nodes_explored,
        "initial plan"
    );

    let mut replans = Vec::with_capacity(scenario.replans.len());
    for (i, change) in scenario.replans.iter().enumerate() {
        let result = planner
            .replan(
                &points(&change.added),
                &points(&change.removed),
                change.move_to.map(point),
            )
            .with_context(|| format!("replan {} rejected", i + 1))?;
        info!(
            replan = i + 1,
            success = result.success,
            cost = result.cost,
            nodes_explored = result.nodes_explored,
            "replanned"
        );
        replans.push(result);
    }

    Ok(Report {
        width: scenario.width,
        height: scenario.height,
        initial,
        replans,
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let mut scenario = match &cli.scenario {
        Some(path) => ScenarioFile::load(path)
            .with_context(|| format!("failed to load scenario {}", path.display()))?,
        None => scenario_from_args(&cli),
    };
    if let Some(path) = &cli.config {
        scenario.planner = PlannerConfig::load(path)
            .with_context(|| format!("failed to load planner config {}", path.display()))?;
    }

    let report = run(&scenario)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
