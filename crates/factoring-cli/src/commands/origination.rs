use clap::Args;
use serde_json::Value;

use factoring_core::origination::{
    compute_batch_origination, find_advance_rate, OriginationItemInput, ReverseItemInput,
};

use crate::input;

/// Arguments for batch origination
#[derive(Args)]
pub struct OriginateArgs {
    /// Path to a JSON file holding the batch (array of items)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the reverse advance-rate solver
#[derive(Args)]
pub struct AdvanceRateArgs {
    /// Path to a JSON file holding the batch of disbursement targets
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_originate(args: OriginateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let items: Vec<OriginationItemInput> = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input is required (or pipe a JSON batch on stdin)".into());
    };

    let output = compute_batch_origination(&items)?;
    Ok(serde_json::to_value(&output)?)
}

pub fn run_advance_rate(args: AdvanceRateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let items: Vec<ReverseItemInput> = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input is required (or pipe a JSON batch on stdin)".into());
    };

    let output = find_advance_rate(&items)?;
    Ok(serde_json::to_value(&output)?)
}
