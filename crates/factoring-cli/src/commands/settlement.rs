use clap::Args;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use factoring_core::settlement::{
    settle_batch, settle_with_backdoor, settle_without_backdoor, BackDoorConfig, BackDoorEngine,
    SettlementEvent,
};

use crate::input;

/// Arguments for settling payment events
#[derive(Args)]
pub struct SettleArgs {
    /// Path to a JSON file: one settlement request or an array of them
    #[arg(long)]
    pub input: Option<String>,

    /// Run the small-balance back-door reduction after settlement
    #[arg(long)]
    pub backdoor: bool,

    /// Back-door minimum threshold (overrides the request file)
    #[arg(long)]
    pub threshold: Option<Decimal>,

    /// Average pursuit cost used by the back-door worth-collecting check
    #[arg(long)]
    pub transaction_cost: Option<Decimal>,
}

/// One settlement request as it arrives over the CLI boundary.
#[derive(Debug, Deserialize)]
struct SettleRequest {
    #[serde(flatten)]
    event: SettlementEvent,
    backdoor_minimum: Option<Decimal>,
}

fn build_engine(args: &SettleArgs, request_minimum: Option<Decimal>) -> Option<BackDoorEngine> {
    let threshold = args.threshold.or(request_minimum);
    if !args.backdoor && threshold.is_none() {
        return None;
    }

    let mut config = match threshold {
        Some(t) => BackDoorConfig::with_threshold(t),
        None => BackDoorConfig::default(),
    };
    if let Some(cost) = args.transaction_cost {
        config.transaction_cost = cost;
    }
    let (engine, _log) = BackDoorEngine::with_default_log(config);
    Some(engine)
}

pub fn run_settle(args: SettleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let raw: Value = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        return Err("--input is required (or pipe a JSON request on stdin)".into());
    };

    // An array settles as a batch with per-event error isolation; a single
    // object settles directly and propagates its error.
    if raw.is_array() {
        let requests: Vec<SettleRequest> = serde_json::from_value(raw)?;
        let minimum = requests.iter().find_map(|r| r.backdoor_minimum);
        let engine = build_engine(&args, minimum);
        let events: Vec<SettlementEvent> = requests.into_iter().map(|r| r.event).collect();
        let output = settle_batch(&events, engine.as_ref());
        Ok(serde_json::to_value(&output)?)
    } else {
        let request: SettleRequest = serde_json::from_value(raw)?;
        let engine = build_engine(&args, request.backdoor_minimum);
        let output = match engine {
            Some(ref engine) => settle_with_backdoor(
                &request.event.operation,
                request.event.payment_date,
                request.event.amount_received,
                engine,
            )?,
            None => settle_without_backdoor(
                &request.event.operation,
                request.event.payment_date,
                request.event.amount_received,
            )?,
        };
        Ok(serde_json::to_value(&output)?)
    }
}
