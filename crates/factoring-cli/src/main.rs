mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::origination::{AdvanceRateArgs, OriginateArgs};
use commands::projection::ProjectArgs;
use commands::settlement::SettleArgs;

/// Factoring origination and settlement calculations
#[derive(Parser)]
#[command(
    name = "fct",
    version,
    about = "Factoring origination and settlement calculations",
    long_about = "A CLI for factoring operations with decimal precision. Supports batch \
                  invoice origination with the aggregate fee-method decision, the reverse \
                  advance-rate solver, payment settlement with six-case classification and \
                  the small-balance back-door reduction, and daily interest projections."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Originate a batch of invoices (disbursement breakdown + fee method)
    Originate(OriginateArgs),
    /// Solve for the capital and advance rate that hit a target disbursement
    AdvanceRate(AdvanceRateArgs),
    /// Settle a payment event (or a batch of events) against an operation
    Settle(SettleArgs),
    /// Project day-by-day interest compounding over a horizon
    Project(ProjectArgs),
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

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Originate(args) => commands::origination::run_originate(args),
        Commands::AdvanceRate(args) => commands::origination::run_advance_rate(args),
        Commands::Settle(args) => commands::settlement::run_settle(args),
        Commands::Project(args) => commands::projection::run_project(args),
        Commands::Version => {
            println!("fct {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
