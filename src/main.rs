use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use table_planner::render::render_outcome;
use table_planner::{Planner, Roster, SolverConfig};

/// Seating plan generator for recurring meals.
///
/// The roster needs the columns: name, sex (male/female), relations,
/// preferred people, then one column per meal.
#[derive(Parser, Debug)]
#[command(version)]
struct Cli {
    /// Path to the roster file
    roster: PathBuf,
    /// TOML file with weights and search settings
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Random seed, overrides the config file
    #[arg(short, long)]
    seed: Option<u64>,
    /// Skip the circular layout drawing
    #[arg(long)]
    no_diagram: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("table_planner=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => SolverConfig::load(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => SolverConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }

    let roster = Roster::load(&cli.roster)
        .with_context(|| format!("reading roster {}", cli.roster.display()))?;
    let (registry, warnings) = roster.into_registry();
    if registry.guests().is_empty() {
        anyhow::bail!("no guests could be loaded from {}", cli.roster.display());
    }
    println!(
        "Data loaded: {} people, {} meals ({}), {} warnings.",
        registry.guests().len(),
        registry.meals().len(),
        registry.meals().join(", "),
        warnings.len(),
    );

    let mut planner = Planner::new(&registry, &config).context("invalid configuration")?;
    let outcomes = planner.solve_all();

    println!("\n--- Final Seating Arrangements ---");
    for outcome in &outcomes {
        println!();
        print!("{}", render_outcome(&registry, outcome, !cli.no_diagram));
    }
    Ok(())
}
