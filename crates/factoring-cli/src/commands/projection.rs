use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use factoring_core::projection::{project_daily, ProjectionInput};

use crate::input;

/// Arguments for the daily interest projection
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ProjectArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Capital balance at the start of the projection
    #[arg(long)]
    pub capital: Option<Decimal>,

    /// Monthly compensatory rate, decimal (e.g. 0.02)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Monthly moratory rate, decimal (e.g. 0.03)
    #[arg(long)]
    pub moratory_rate: Option<Decimal>,

    /// First projected day, YYYY-MM-DD
    #[arg(long)]
    pub start: Option<String>,

    /// Horizon in days
    #[arg(long)]
    pub days: Option<u32>,
}

pub fn run_project(args: ProjectArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let projection_input: ProjectionInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let start = args
            .start
            .as_deref()
            .ok_or("--start is required (or provide --input)")?;
        ProjectionInput {
            initial_capital: args
                .capital
                .ok_or("--capital is required (or provide --input)")?,
            start_date: NaiveDate::parse_from_str(start, "%Y-%m-%d")
                .map_err(|e| format!("invalid --start '{start}': {e}"))?,
            monthly_compensatory_rate: args
                .rate
                .ok_or("--rate is required (or provide --input)")?,
            monthly_moratory_rate: args.moratory_rate.unwrap_or(Decimal::ZERO),
            horizon_days: args.days.ok_or("--days is required (or provide --input)")?,
        }
    };

    let records = project_daily(&projection_input);
    Ok(serde_json::to_value(&records)?)
}
