#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plans and runs rover missions.

mod render;

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Arc,
    thread,
    time::Duration,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rover_mission_system_executor::Engine;
use rover_mission_system_planner::Plan;
use rover_mission_world::{load_layout_from_env, query, MissionLayout};

/// Plans and executes rover command sequences on a mission grid.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Action,
}

/// Operations offered by the command-line interface.
#[derive(Subcommand, Debug)]
enum Action {
    /// Executes a plan script and prints every event.
    Run {
        /// Path to the plan script, one command per line.
        plan: PathBuf,
        /// Mission document to load instead of the builtin mission.
        #[arg(long)]
        mission: Option<PathBuf>,
        /// Pause between execution steps, in milliseconds.
        #[arg(long, default_value_t = 0)]
        pace_ms: u64,
        /// Output format for the event stream.
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Validates a plan script and prints its declared energy cost.
    Check {
        /// Path to the plan script, one command per line.
        plan: PathBuf,
        /// Mission document to load instead of the builtin mission.
        #[arg(long)]
        mission: Option<PathBuf>,
    },
    /// Renders the tactical map of the mission.
    Map {
        /// Mission document to load instead of the builtin mission.
        #[arg(long)]
        mission: Option<PathBuf>,
    },
    /// Lists the command catalog with energy costs.
    Catalog {
        /// Mission document to load instead of the builtin mission.
        #[arg(long)]
        mission: Option<PathBuf>,
    },
}

/// Event stream encodings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    /// One human readable line per event.
    Text,
    /// One JSON object per line.
    Json,
}

/// Entry point for the rover mission command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Action::Run {
            plan,
            mission,
            pace_ms,
            format,
        } => run(&plan, mission.as_deref(), Duration::from_millis(pace_ms), format),
        Action::Check { plan, mission } => check(&plan, mission.as_deref()),
        Action::Map { mission } => {
            let layout = load_layout(mission.as_deref())?;
            print!("{}", render::tactical_map(&layout, layout.start()));
            Ok(())
        }
        Action::Catalog { mission } => {
            let layout = load_layout(mission.as_deref())?;
            print!("{}", render::catalog(&layout));
            Ok(())
        }
    }
}

fn run(plan_path: &Path, mission: Option<&Path>, pace: Duration, format: Format) -> Result<()> {
    let layout = load_layout(mission)?;
    let plan = read_plan(&layout, plan_path)?;

    let mut engine = Engine::new(layout);
    engine.set_plan(plan)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut events = Vec::new();
    engine.begin(&mut events).context("failed to start the run")?;
    let outcome = loop {
        let outcome = engine.step(&mut events);
        for event in events.drain(..) {
            match format {
                Format::Text => writeln!(out, "{}", render::event_line(&event))?,
                Format::Json => writeln!(out, "{}", serde_json::to_string(&event)?)?,
            }
        }
        if let Some(outcome) = outcome {
            break outcome;
        }
        if !pace.is_zero() {
            out.flush()?;
            thread::sleep(pace);
        }
    };

    if format == Format::Text {
        writeln!(out)?;
        write!(
            out,
            "{}",
            render::tactical_map(engine.layout(), query::position(engine.world()))
        )?;
    }
    tracing::info!(
        target: "rover_mission::cli",
        success = outcome.is_success(),
        "mission.finished"
    );
    Ok(())
}

fn check(plan_path: &Path, mission: Option<&Path>) -> Result<()> {
    let layout = load_layout(mission)?;
    let plan = read_plan(&layout, plan_path)?;
    print!("{}", render::plan_listing(&layout, &plan));
    Ok(())
}

fn load_layout(mission: Option<&Path>) -> Result<Arc<MissionLayout>> {
    match mission {
        Some(path) => {
            let layout = MissionLayout::from_path(path)
                .with_context(|| format!("failed to load mission {}", path.display()))?;
            Ok(Arc::new(layout))
        }
        None => load_layout_from_env().context("failed to load the builtin mission"),
    }
}

fn read_plan(layout: &MissionLayout, path: &Path) -> Result<Plan> {
    let script = fs::read_to_string(path)
        .with_context(|| format!("failed to read plan {}", path.display()))?;
    Plan::from_script(layout, &script)
        .with_context(|| format!("plan {} was rejected", path.display()))
}
