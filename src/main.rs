use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;
use std::time::Duration;
use stochastix_twin::io::config::load_config;
use stochastix_twin::io::reporting;
use stochastix_twin::{JobOutput, JobRegistry, JobState, Kpis, MonteCarloSummary, SimulationConfig, KPI_FIELDS};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "stochastix-twin")]
#[command(about = "Simulate a store + distribution center inventory network", long_about = None)]
struct Args {
    /// JSON configuration file (missing fields take defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the horizon in days
    #[arg(long)]
    days: Option<u32>,

    /// Override the baseline demand per day
    #[arg(long)]
    lambda: Option<f64>,

    /// Override the seed (replication i uses seed + i)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Number of replications; more than one runs a Monte Carlo study
    #[arg(short, long, default_value = "1")]
    replications: usize,

    /// Run replications in parallel
    #[arg(long)]
    parallel: bool,

    /// Write the daily trajectory of a single run to this CSV file
    #[arg(long)]
    timeseries_csv: Option<PathBuf>,

    /// Write the full result as JSON
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log filter when RUST_LOG is unset (e.g. info, debug, stochastix_twin=trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    println!("=== Store + DC Inventory Simulation ===");
    info!(
        days = config.days,
        lambda = config.demand_lambda_per_day,
        replications = args.replications,
        seed = ?config.seed,
        "configuration ready"
    );

    // Run off the main thread so progress can be reported while it works
    let registry = JobRegistry::new().with_parallel_replications(args.parallel);
    let job = registry.submit(config, args.replications);

    let mut last_reported = 0.0;
    let status = loop {
        let Some(status) = registry.get(&job.job_id) else {
            error!(job_id = %job.job_id, "job vanished from registry");
            return ExitCode::FAILURE;
        };
        if status.status != JobState::Running {
            break status;
        }
        if status.progress - last_reported >= 0.1 {
            info!("progress: {:.0}%", status.progress * 100.0);
            last_reported = status.progress;
        }
        thread::sleep(Duration::from_millis(50));
    };

    if status.status == JobState::Error {
        error!("simulation failed: {}", status.error.as_deref().unwrap_or("unknown error"));
        return ExitCode::FAILURE;
    }

    match &status.result {
        Some(JobOutput::Single { kpis, timeseries, .. }) => {
            print_kpis(kpis);
            if let Some(path) = &args.timeseries_csv {
                if let Err(e) = reporting::write_timeseries_csv(path, timeseries) {
                    error!("Error writing CSV: {}", e);
                    return ExitCode::FAILURE;
                }
            }
        }
        Some(JobOutput::MonteCarlo { summary, .. }) => {
            print_summary(summary);
            if args.timeseries_csv.is_some() {
                info!("--timeseries-csv only applies to single runs; skipped");
            }
        }
        None => {
            error!("job finished without a result");
            return ExitCode::FAILURE;
        }
    }

    if let Some(path) = &args.output {
        if let Err(e) = reporting::write_json(path, &status) {
            error!("Error writing result: {}", e);
            return ExitCode::FAILURE;
        }
    }

    println!("\nSimulation Complete.");
    ExitCode::SUCCESS
}

fn build_config(args: &Args) -> Result<SimulationConfig, stochastix_twin::ConfigError> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => SimulationConfig::default(),
    };

    if let Some(days) = args.days {
        config.days = days;
    }
    if let Some(lambda) = args.lambda {
        config.demand_lambda_per_day = lambda;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    config.validate()?;
    Ok(config)
}

fn print_kpis(kpis: &Kpis) {
    println!("\n=== KPIs ===");
    for (name, value) in kpis.fields() {
        println!("{:<22} {:>12.4}", name, value);
    }
}

fn print_summary(summary: &MonteCarloSummary) {
    println!("\n=== Monte Carlo ({} replications) ===", summary.replications);
    println!("{:<22} {:>12} {:>12}", "kpi", "mean", "std");
    for name in KPI_FIELDS {
        println!(
            "{:<22} {:>12.4} {:>12.4}",
            name, summary.kpi_mean[name], summary.kpi_std[name]
        );
    }
}
