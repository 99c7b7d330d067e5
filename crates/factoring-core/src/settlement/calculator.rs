//! Settlement calculation: accrued and moratory interest against a payment
//! event, deltas vs. the originally billed amounts, and the resulting case
//! classification.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::batch::{run_batch, BatchOutput};
use crate::error::FactoringError;
use crate::interest::{apply_tax, compound_interest, day_count, IGV_RATE};
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::FactoringResult;

use super::backdoor::{BackDoorEngine, Reduction};
use super::cases::SettlementCase;

/// Moratory rate charged when the operation does not override it.
pub const DEFAULT_MORATORY_RATE: Decimal = dec!(0.03);

pub const STATUS_LIQUIDATED: &str = "LIQUIDADO";
pub const STATUS_PENDING: &str = "PENDIENTE";
pub const STATUS_MANUAL_REVIEW: &str = "REVISION MANUAL";
pub const STATUS_LIQUIDATED_BACKDOOR: &str = "LIQUIDADO - BACK DOOR";

fn default_moratory_rate() -> Rate {
    DEFAULT_MORATORY_RATE
}

/// An originated factoring advance, snapshotted for settlement.
///
/// Settlement never mutates an operation; repeated partial payments are
/// modeled by the caller passing a fresh snapshot whose `capital` is the
/// remaining amount to liquidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    pub id: String,
    /// Capital advanced (capital operación), not the net disbursed amount.
    pub capital: Money,
    pub monthly_compensatory_rate: Rate,
    #[serde(default = "default_moratory_rate")]
    pub monthly_moratory_rate: Rate,
    pub disbursement_date: NaiveDate,
    pub due_date: NaiveDate,
    /// Compensatory interest billed at origination.
    pub original_interest: Money,
    /// IGV on the originally billed interest.
    pub original_igv: Money,
    /// Net amount actually wired to the client at origination.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disbursed_amount: Option<Money>,
}

impl Operation {
    pub fn validate(&self) -> FactoringResult<()> {
        if self.capital <= Decimal::ZERO {
            return Err(FactoringError::AmountOutOfRange {
                field: "capital".into(),
                value: self.capital,
            });
        }
        if self.due_date < self.disbursement_date {
            return Err(FactoringError::DateError(format!(
                "due date {} precedes disbursement date {}",
                self.due_date, self.disbursement_date
            )));
        }
        Ok(())
    }
}

/// A payment received against an operation. One event per payment;
/// settlement history is append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementEvent {
    pub operation: Operation,
    pub payment_date: NaiveDate,
    pub amount_received: Money,
}

/// Full settlement breakdown for one payment event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settlement {
    pub operation_id: String,
    pub capital: Money,
    pub amount_received: Money,
    pub payment_date: NaiveDate,
    pub elapsed_days: i64,
    pub moratory_days: i64,
    pub accrued_interest: Money,
    pub accrued_igv: Money,
    pub moratory_interest: Money,
    pub moratory_igv: Money,
    pub delta_interest: Money,
    pub delta_igv: Money,
    pub delta_capital: Money,
    pub global_balance: Money,
    pub case: SettlementCase,
    pub recommended_action: String,
    pub settled: bool,
    pub status: String,
    pub backdoor_applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backdoor_threshold: Option<Money>,
    /// Balance before any back-door reduction, kept for audit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_balance: Option<Money>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub reductions: Vec<Reduction>,
}

/// Core settlement computation, shared by every public entry point.
pub(crate) fn compute_settlement(
    op: &Operation,
    payment_date: NaiveDate,
    amount_received: Money,
) -> FactoringResult<Settlement> {
    op.validate()?;

    if payment_date < op.disbursement_date {
        return Err(FactoringError::DateError(format!(
            "payment date {} precedes disbursement date {}",
            payment_date, op.disbursement_date
        )));
    }

    let elapsed_days = day_count(op.disbursement_date, payment_date);
    let accrued_interest =
        compound_interest(op.capital, op.monthly_compensatory_rate, elapsed_days)?;
    let accrued_igv = apply_tax(accrued_interest, IGV_RATE);

    // Moratory interest accrues only past the due date, at the separate
    // (higher) rate, on the full capital.
    let moratory_days = if payment_date > op.due_date {
        day_count(op.due_date, payment_date)
    } else {
        0
    };
    let moratory_interest =
        compound_interest(op.capital, op.monthly_moratory_rate, moratory_days)?;
    let moratory_igv = apply_tax(moratory_interest, IGV_RATE);

    let delta_interest = accrued_interest - op.original_interest;
    let delta_igv = accrued_igv - op.original_igv;
    // Capital owed minus what the client actually paid. The reference is
    // the capital of the operation, never the net disbursed amount.
    let delta_capital = op.capital - amount_received;

    let global_balance =
        delta_interest + delta_igv + moratory_interest + moratory_igv + delta_capital;

    let case = SettlementCase::classify(delta_interest, delta_capital, global_balance);
    let settled = case.is_settled();
    let status = if case.requires_manual_review() {
        STATUS_MANUAL_REVIEW
    } else if settled {
        STATUS_LIQUIDATED
    } else {
        STATUS_PENDING
    };

    Ok(Settlement {
        operation_id: op.id.clone(),
        capital: op.capital,
        amount_received,
        payment_date,
        elapsed_days,
        moratory_days,
        accrued_interest,
        accrued_igv,
        moratory_interest,
        moratory_igv,
        delta_interest,
        delta_igv,
        delta_capital,
        global_balance,
        recommended_action: case.recommended_action().to_string(),
        case,
        settled,
        status: status.to_string(),
        backdoor_applied: false,
        backdoor_threshold: None,
        original_balance: None,
        reductions: Vec::new(),
    })
}

fn envelope(
    settlement: Settlement,
    methodology: &str,
    elapsed_us: u64,
) -> ComputationOutput<Settlement> {
    let mut warnings = Vec::new();
    if settlement.case.requires_manual_review() {
        warnings.push(format!(
            "operation {}: sign combination outside the case table, route to manual review",
            settlement.operation_id
        ));
    }
    with_metadata(
        methodology,
        &serde_json::json!({
            "day_count": "30/month",
            "igv_rate": IGV_RATE,
            "capital_reference": "capital_operacion",
        }),
        warnings,
        elapsed_us,
        settlement,
    )
}

/// Settle a payment event without the back-door reduction pass.
pub fn settle_without_backdoor(
    op: &Operation,
    payment_date: NaiveDate,
    amount_received: Money,
) -> FactoringResult<ComputationOutput<Settlement>> {
    let start = Instant::now();
    let settlement = compute_settlement(op, payment_date, amount_received)?;
    Ok(envelope(
        settlement,
        "Settlement -- compound accrual vs. billed amounts, six-case sign classification",
        start.elapsed().as_micros() as u64,
    ))
}

/// Settle a payment event. Alias for the no-back-door entry point; the
/// reduction pass is opt-in via [`settle_with_backdoor`].
pub fn settle(
    op: &Operation,
    payment_date: NaiveDate,
    amount_received: Money,
) -> FactoringResult<ComputationOutput<Settlement>> {
    settle_without_backdoor(op, payment_date, amount_received)
}

/// Settle a payment event and run the back-door reduction over the result.
pub fn settle_with_backdoor(
    op: &Operation,
    payment_date: NaiveDate,
    amount_received: Money,
    engine: &BackDoorEngine,
) -> FactoringResult<ComputationOutput<Settlement>> {
    let start = Instant::now();
    let settlement = compute_settlement(op, payment_date, amount_received)?;
    let settlement = engine.apply(settlement);
    Ok(envelope(
        settlement,
        "Settlement -- six-case sign classification with small-balance back-door reduction",
        start.elapsed().as_micros() as u64,
    ))
}

/// Settle a list of payment events, isolating per-event failures.
///
/// With an engine, every event goes through the back-door pass.
pub fn settle_batch(
    events: &[SettlementEvent],
    engine: Option<&BackDoorEngine>,
) -> BatchOutput<Settlement> {
    run_batch(
        events,
        |event, _| event.operation.id.clone(),
        |event| {
            let settlement =
                compute_settlement(&event.operation, event.payment_date, event.amount_received)?;
            Ok(match engine {
                Some(engine) => engine.apply(settlement),
                None => settlement,
            })
        },
    )
}
