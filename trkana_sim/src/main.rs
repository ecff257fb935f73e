//! trkana Simulator CLI
//!
//! Run the track analysis over generated events or a JSON-lines event file.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;
use trkana_core::AnalysisConfig;
use trkana_env::{AnalysisError, JsonLinesSource};
use trkana_sim::{
    write_events_jsonl, AnalysisRunner, Oracle, RunExport, RunResult, RunSummary, Scenario,
};

/// trkana track analysis runner
#[derive(Parser, Debug)]
#[command(name = "trkana-sim")]
#[command(about = "Run the tracker reference-plane analysis", long_about = None)]
struct Args {
    /// Generator seed (0 = random from time)
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Number of events to generate
    #[arg(short = 'n', long, default_value = "1000")]
    events: u64,

    /// Run number stamped on generated events
    #[arg(long, default_value = "1")]
    run: u32,

    /// Scenario to generate (nominal, reflections, no_crv, early_beam, all)
    #[arg(short = 'S', long, default_value = "nominal")]
    scenario: String,

    /// JSON configuration file with fiducial_time_min / max_diagnostic_events
    #[arg(short, long)]
    config: Option<String>,

    /// Fiducial time cut on the mid-plane crossing (ns); overrides --config
    #[arg(long)]
    tmin: Option<f64>,

    /// Number of leading selected tracks whose intersections are printed; overrides --config
    #[arg(long)]
    max_print: Option<u64>,

    /// Read events from a JSON-lines file instead of generating them
    #[arg(short, long)]
    input: Option<String>,

    /// Write the generated events to a JSON-lines file and exit
    #[arg(long)]
    write_events: Option<String>,

    /// Export histograms, ntuple and report to a JSON file
    #[arg(long)]
    export: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON output for scripting
    #[arg(long)]
    json: bool,
}

/// Builds the analysis configuration from file and flags.
///
/// Without a file both flags are required; the analysis has no defaults.
fn load_config(args: &Args) -> Result<AnalysisConfig, AnalysisError> {
    match &args.config {
        Some(path) => AnalysisConfig::load(path)?.with_overrides(args.tmin, args.max_print),
        None => {
            let tmin = args.tmin.ok_or_else(|| {
                AnalysisError::configuration("--tmin is required when no --config file is given")
            })?;
            let max_print = args.max_print.ok_or_else(|| {
                AnalysisError::configuration("--max-print is required when no --config file is given")
            })?;
            AnalysisConfig::new(tmin, max_print)
        }
    }
}

fn parse_scenarios(name: &str) -> Result<Vec<Scenario>, String> {
    if name == "all" {
        Ok(Scenario::all())
    } else {
        name.parse().map(|s| vec![s])
    }
}

fn run(args: &Args, base_seed: u64) -> Result<Vec<RunResult>, AnalysisError> {
    let config = load_config(args)?;
    info!(
        "Config: fiducial_time_min={} ns, max_diagnostic_events={}",
        config.fiducial_time_min, config.max_diagnostic_events
    );

    let runner = AnalysisRunner::new(config)
        .with_seed(base_seed)
        .with_events(args.events)
        .with_run_number(args.run);

    if let Some(input) = &args.input {
        let mut source = JsonLinesSource::open(input)?;
        return Ok(vec![runner.run_source(&mut source, input)?]);
    }

    let scenarios = parse_scenarios(&args.scenario).map_err(AnalysisError::configuration)?;
    scenarios.into_iter().map(|s| runner.run(s)).collect()
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    let base_seed = if args.seed == 0 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(1)
    } else {
        args.seed
    };

    // Event dump mode: generate, write, done
    if let Some(path) = &args.write_events {
        let scenario = match args.scenario.parse::<Scenario>() {
            Ok(s) => s,
            Err(e) => {
                error!("{}", e);
                return ExitCode::FAILURE;
            }
        };
        let mut oracle = Oracle::with_config(base_seed, scenario.oracle_config()).with_run(args.run);
        let events: Vec<_> = (0..args.events).map(|_| oracle.generate_raw()).collect();
        return match write_events_jsonl(path, &events) {
            Ok(()) => {
                info!("Wrote {} {} events to {}", events.len(), scenario, path);
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!("Failed to write events: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    if !args.json {
        info!("trkana simulator v{}", env!("CARGO_PKG_VERSION"));
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    let results = match run(&args, base_seed) {
        Ok(results) => results,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if args.json {
        let summaries: Vec<RunSummary> = results.iter().map(RunSummary::from_result).collect();
        match serde_json::to_string_pretty(&summaries) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                error!("Failed to serialize summary: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        for result in &results {
            info!("");
            for line in result.report.to_string().lines() {
                info!("{}", line);
            }
            info!("  ({:.3}s)", result.elapsed_secs);
        }
    }

    if let Some(export_path) = &args.export {
        if results.len() > 1 {
            error!("--export only supports a single scenario, not 'all'");
            return ExitCode::FAILURE;
        }
        if let Some(result) = results.first() {
            let export = RunExport::from_result(result);
            if let Err(e) = export.write_to_file(export_path) {
                error!("Failed to write export: {:?}", e);
                return ExitCode::FAILURE;
            }
            info!("Exported {} histograms to {}", export.histograms.len(), export_path);
        }
    }

    ExitCode::SUCCESS
}
