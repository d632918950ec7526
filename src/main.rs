use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use megaverse::api::{ApiConfig, DryRunApi, HttpMegaverseApi, MegaverseApi};
use megaverse::goal::{analyze, translate};
use megaverse::model::TargetObjectSet;
use megaverse::pattern::cross_pattern;
use megaverse::report::BatchResult;
use megaverse::run::{Orchestrator, RunConfig};

#[derive(Parser)]
#[command(name = "megaverse")]
#[command(about = "Builds a megaverse from a declarative goal map", long_about = None)]
struct Cli {
    /// Record calls instead of sending them; no object is created or deleted
    #[arg(long, global = true)]
    dry_run: bool,

    /// Candidate id; falls back to the CROSSMINT_CANDIDATE_ID env var
    #[arg(long, global = true)]
    candidate_id: Option<String>,

    /// Submissions in flight at once
    #[arg(long, global = true, default_value_t = 1)]
    concurrency: usize,

    /// Override the inter-call pacing delay, in milliseconds
    #[arg(long, global = true)]
    pace_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the fixed 11x11 polyanet cross
    Cross,
    /// Fetch the goal map and build the full megaverse
    Goal,
    /// Fetch the goal map and delete every object it names
    Clear,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let grid = match cli.command {
        Command::Cross => cross_pattern(),
        Command::Goal | Command::Clear => http_api(&cli)?.fetch_goal()?,
    };

    let analysis = analyze(&grid)?;
    println!(
        "goal: {}x{} grid: {} polyanets, {} soloons, {} comeths, {} empty",
        analysis.rows,
        analysis.columns,
        analysis.polyanets,
        analysis.soloons,
        analysis.comeths,
        analysis.empties
    );

    let target = translate(&grid)?;
    let config = RunConfig::new()
        .with_concurrency(cli.concurrency)
        .with_pace_delay(pace_delay(&cli));

    let result = if cli.dry_run {
        let api = DryRunApi::new();
        let result = run(&api, config, &cli, &target);
        println!("dry run: {} calls recorded, none sent", api.calls().len());
        result
    } else {
        let api = http_api(&cli)?;
        run(&api, config, &cli, &target)
    };

    result.print_summary();
    if !result.is_fully_successful() {
        std::process::exit(1);
    }
    Ok(())
}

fn run(api: &dyn MegaverseApi, config: RunConfig, cli: &Cli, target: &TargetObjectSet) -> BatchResult {
    let orchestrator = Orchestrator::new(api, config);
    match cli.command {
        Command::Clear => orchestrator.clear(target),
        Command::Cross | Command::Goal => orchestrator.build(target),
    }
}

fn http_api(cli: &Cli) -> anyhow::Result<HttpMegaverseApi> {
    let candidate_id = cli
        .candidate_id
        .clone()
        .or_else(|| std::env::var("CROSSMINT_CANDIDATE_ID").ok())
        .context("no candidate id: pass --candidate-id or set CROSSMINT_CANDIDATE_ID")?;
    Ok(HttpMegaverseApi::new(ApiConfig::new(candidate_id)))
}

/// The batch modes default to a full second between calls; the small fixed
/// cross gets away with half that.
fn pace_delay(cli: &Cli) -> Duration {
    if let Some(ms) = cli.pace_ms {
        return Duration::from_millis(ms);
    }
    match cli.command {
        Command::Cross => Duration::from_millis(500),
        Command::Goal | Command::Clear => Duration::from_millis(1000),
    }
}
