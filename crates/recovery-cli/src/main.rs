mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::analysis::AnalyseArgs;
use commands::pricing::PriceArgs;
use commands::report::ReportArgs;
use commands::simulate::SimulateArgs;
use commands::summarize::SummarizeArgs;

/// Debt portfolio recovery simulation and pricing
#[derive(Parser)]
#[command(
    name = "recov",
    version,
    about = "Debt portfolio recovery simulation and pricing",
    long_about = "Simulates the money recovered from a scored portfolio of delinquent \
                  debts, summarises the distribution and converts a chosen recovery \
                  scenario into the maximum price worth paying for the portfolio."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log level for diagnostics on stderr (overridden by RUST_LOG)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Monte Carlo simulation of recovered value
    Simulate(SimulateArgs),
    /// Summary statistics of an existing per-trial sample
    Summarize(SummarizeArgs),
    /// Maximum viable purchase price for a scenario value
    Price(PriceArgs),
    /// Closed-form portfolio score report
    Report(ReportArgs),
    /// Simulation, scenario selection and pricing in one run
    Analyse(AnalyseArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Simulate(args) => commands::simulate::run_simulate(args),
        Commands::Summarize(args) => commands::summarize::run_summarize(args),
        Commands::Price(args) => commands::pricing::run_price(args),
        Commands::Report(args) => commands::report::run_report(args),
        Commands::Analyse(args) => commands::analysis::run_analyse(args),
        Commands::Version => {
            println!("recov {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
