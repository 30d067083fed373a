use std::path::{Path, PathBuf};

use clap::Parser;
use roll_optimizer::render;
use roll_optimizer::{Job, OptimizeError, Solver, Strategy, compare, registry};
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "roll_optimizer",
    about = "Allocates material rolls to prioritized cut requests"
)]
struct Cli {
    /// Job file: JSON with rolls, requests and optional strategy/settings/run
    #[arg(long, required_unless_present = "list")]
    input: Option<PathBuf>,

    /// Strategy id (overrides the job file; default: waste-min)
    #[arg(long)]
    strategy: Option<String>,

    /// Strategy settings as inline JSON (overrides the job file)
    #[arg(long, value_parser = parse_settings)]
    settings: Option<serde_json::Value>,

    /// Disable length collage
    #[arg(long)]
    no_collage: bool,

    /// Show ASCII layout of each roll
    #[arg(long)]
    layout: bool,

    /// Print the plan as JSON instead of a text summary
    #[arg(long)]
    json: bool,

    /// Run every strategy with default settings and compare
    #[arg(long)]
    compare: bool,

    /// List registered strategies and exit
    #[arg(long)]
    list: bool,

    /// Log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

const DEFAULT_STRATEGY: &str = "waste-min";

fn parse_settings(s: &str) -> Result<serde_json::Value, String> {
    serde_json::from_str(s).map_err(|e| format!("invalid settings JSON: {e}"))
}

fn load_job(path: &Path) -> Result<Job, OptimizeError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| OptimizeError::InvalidInput(format!("cannot read {}: {e}", path.display())))?;
    let job: Job = serde_json::from_str(&text)
        .map_err(|e| OptimizeError::InvalidInput(format!("{}: {e}", path.display())))?;
    job.validate()?;
    Ok(job)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), OptimizeError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| OptimizeError::InvalidInput(e.to_string()))?;
    println!("{text}");
    Ok(())
}

fn run(cli: Cli) -> Result<(), OptimizeError> {
    if cli.list {
        let reg = registry();
        if cli.json {
            return print_json(&reg);
        }
        for info in reg {
            println!("{:<14} {}", info.id, info.name);
            println!("{:<14} {}", "", info.description);
            if info.has_settings {
                println!("{:<14} defaults: {}", "", info.default_settings);
            }
        }
        return Ok(());
    }

    let Some(path) = cli.input.as_ref() else {
        return Err(OptimizeError::InvalidInput("--input is required".to_string()));
    };
    let job = load_job(path)?;
    let mut run = job.run.clone();
    if cli.no_collage {
        run.allow_collage = false;
    }

    if cli.compare {
        let (plans, comparison) = compare(&job.rolls, &job.requests, &run)?;
        if cli.json {
            return print_json(&serde_json::json!({ "plans": plans, "comparison": comparison }));
        }
        print!("{}", render::comparison_table(&comparison));
        return Ok(());
    }

    let id = cli
        .strategy
        .or(job.strategy)
        .unwrap_or_else(|| DEFAULT_STRATEGY.to_string());
    let settings = cli.settings.or(job.settings);
    let strategy = Strategy::lookup(&id, settings.as_ref())?;
    let plan = Solver::new(strategy, run).solve(&job.rolls, &job.requests)?;

    if cli.json {
        return print_json(&plan);
    }
    print!("{}", render::summary(&plan, cli.layout));
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(level)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
