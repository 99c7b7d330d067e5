//! Reverse origination: solve for the capital (and implied advance rate)
//! that hits a target disbursed amount, then run the batch fee decision on
//! the solved capitals.

use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::batch::ItemOutcome;
use crate::error::FactoringError;
use crate::interest::DAYS_IN_MONTH;
use crate::types::{round_money, with_metadata, ComputationOutput, Money, Rate};
use crate::FactoringResult;

use super::{
    affiliation_charge, decide_fee_method, default_tax_rate, is_default_tax_rate,
    BatchOriginationOutput, FeeMethod, OriginationItemOutput,
};

/// One invoice with a disbursement target instead of an advance rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReverseItemInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    /// Net invoice face amount (for the implied advance rate and margin).
    pub net_amount: Option<Money>,
    /// Amount the client must receive after all charges.
    pub target_disbursement: Option<Money>,
    pub monthly_rate: Option<Rate>,
    pub term_days: Option<u32>,
    pub fixed_min_commission: Option<Money>,
    pub pct_commission: Option<Rate>,
    #[serde(default = "default_tax_rate", skip_serializing_if = "is_default_tax_rate")]
    pub tax_rate: Rate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affiliation_fee: Option<Money>,
    #[serde(default)]
    pub apply_affiliation: bool,
}

struct SolvedItem {
    net: Money,
    target: Money,
    term_days: u32,
    fixed_min: Money,
    pct: Rate,
    tax_rate: Rate,
    interest_factor: Decimal,
    affiliation: Money,
    igv_affiliation: Money,
    /// Capital required under the percentage commission method.
    capital_pct: Money,
    /// Capital required under the fixed commission method.
    capital_fixed: Money,
}

fn required_field<T>(opt: Option<T>, field_name: &str) -> FactoringResult<T> {
    opt.ok_or_else(|| FactoringError::InvalidInput {
        field: field_name.to_string(),
        reason: format!("{} is required", field_name),
    })
}

/// Invert the forward disbursement equation for both commission methods.
///
/// Forward: `D = C - C·f·(1+t) - commission·(1+t) - A·(1+t)` with
/// `f = (1+r/30)^term - 1`. Under the percentage method the commission is
/// `C·p`, so `C = (D + A·(1+t)) / (1 - (f+p)·(1+t))`; under the fixed
/// method it is a constant, so it moves to the numerator.
///
/// A non-positive denominator means the fee structure eats the whole
/// advance; the capital is reported as zero and the caller pushes a
/// warning (kept from production behavior, pending an explicit
/// infeasibility contract).
fn solve_item(item: &ReverseItemInput) -> FactoringResult<(SolvedItem, Option<String>)> {
    let net = required_field(item.net_amount, "net_amount")?;
    let target = required_field(item.target_disbursement, "target_disbursement")?;
    let monthly_rate = required_field(item.monthly_rate, "monthly_rate")?;
    let term_days = required_field(item.term_days, "term_days")?;
    let fixed_min = required_field(item.fixed_min_commission, "fixed_min_commission")?;
    let pct = required_field(item.pct_commission, "pct_commission")?;

    if target <= Decimal::ZERO {
        return Err(FactoringError::InvalidInput {
            field: "target_disbursement".into(),
            reason: "target disbursement must be positive".into(),
        });
    }

    let gross_up = Decimal::ONE + item.tax_rate;
    let daily = monthly_rate / DAYS_IN_MONTH;
    let interest_factor = (Decimal::ONE + daily).powd(Decimal::from(term_days)) - Decimal::ONE;
    let (affiliation, igv_affiliation) =
        affiliation_charge(item.affiliation_fee, item.apply_affiliation, item.tax_rate);
    let affiliation_total = affiliation + igv_affiliation;

    let mut warning = None;

    let denom_pct = Decimal::ONE - (interest_factor + pct) * gross_up;
    let capital_pct = if denom_pct > Decimal::ZERO {
        (target + affiliation_total) / denom_pct
    } else {
        warning = Some(format!(
            "percentage-method denominator {} is not positive, capital reported as 0",
            denom_pct.round_dp(6)
        ));
        Decimal::ZERO
    };

    let denom_fixed = Decimal::ONE - interest_factor * gross_up;
    let capital_fixed = if denom_fixed > Decimal::ZERO {
        (target + fixed_min * gross_up + affiliation_total) / denom_fixed
    } else {
        warning = Some(format!(
            "fixed-method denominator {} is not positive, capital reported as 0",
            denom_fixed.round_dp(6)
        ));
        Decimal::ZERO
    };

    Ok((
        SolvedItem {
            net,
            target,
            term_days,
            fixed_min,
            pct,
            tax_rate: item.tax_rate,
            interest_factor,
            affiliation,
            igv_affiliation,
            capital_pct,
            capital_fixed,
        },
        warning,
    ))
}

fn breakdown(s: &SolvedItem, method: FeeMethod) -> OriginationItemOutput {
    let (capital, commission) = match method {
        FeeMethod::Percentage => (s.capital_pct, s.capital_pct * s.pct),
        FeeMethod::Fixed => (s.capital_fixed, s.fixed_min),
    };
    let interest = capital * s.interest_factor;
    let igv_interest = interest * s.tax_rate;
    let igv_commission = commission * s.tax_rate;

    let disbursement = capital
        - interest
        - igv_interest
        - commission
        - igv_commission
        - s.affiliation
        - s.igv_affiliation;

    let advance_rate = if s.net > Decimal::ZERO {
        capital / s.net
    } else {
        Decimal::ZERO
    };

    OriginationItemOutput {
        capital: round_money(capital),
        advance_rate: advance_rate.round_dp(6),
        interest: round_money(interest),
        igv_interest: round_money(igv_interest),
        commission: round_money(commission),
        igv_commission: round_money(igv_commission),
        affiliation: round_money(s.affiliation),
        igv_affiliation: round_money(s.igv_affiliation),
        disbursed_amount: disbursement.floor(),
        safety_margin: round_money(s.net - capital),
        term_days: s.term_days,
    }
}

/// Solve a batch of disbursement targets for the required capital per item.
///
/// The fee-method decision runs on the solved capitals exactly as in the
/// forward direction, and the winning method selects which solved capital
/// each item uses for its final breakdown.
pub fn find_advance_rate(
    items: &[ReverseItemInput],
) -> FactoringResult<ComputationOutput<BatchOriginationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if items.is_empty() {
        return Err(FactoringError::EmptyBatch);
    }

    let solved: Vec<FactoringResult<(SolvedItem, Option<String>)>> =
        items.iter().map(solve_item).collect();

    let mut pct_revenue = Decimal::ZERO;
    let mut fixed_revenue = Decimal::ZERO;
    for (s, _) in solved.iter().flatten() {
        pct_revenue += s.capital_pct * s.pct;
        fixed_revenue += s.fixed_min;
    }
    let method = decide_fee_method(pct_revenue, fixed_revenue);

    let mut outcomes = Vec::with_capacity(items.len());
    let mut total_capital = Decimal::ZERO;
    let mut total_commission = Decimal::ZERO;
    let mut total_disbursed = Decimal::ZERO;

    for (idx, (item, s)) in items.iter().zip(solved.iter()).enumerate() {
        let id = item
            .item_id
            .clone()
            .unwrap_or_else(|| format!("item-{idx}"));
        match s {
            Ok((solved_item, item_warning)) => {
                if let Some(w) = item_warning {
                    warnings.push(format!("{id}: {w}"));
                }
                let out = breakdown(solved_item, method);
                if out.capital > round_money(solved_item.net) {
                    warnings.push(format!(
                        "{id}: target requires advancing more than the invoice face amount"
                    ));
                }
                total_capital += out.capital;
                total_commission += out.commission;
                total_disbursed += out.disbursed_amount;
                outcomes.push(ItemOutcome::ok(id, out));
            }
            Err(e) => outcomes.push(ItemOutcome::error(id, e.to_string())),
        }
    }

    let result = BatchOriginationOutput {
        chosen_fee_method: method,
        total_capital: round_money(total_capital),
        total_commission: round_money(total_commission),
        total_disbursed,
        items: outcomes,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Reverse origination -- algebraic inversion of the disbursement equation per fee method",
        &serde_json::json!({
            "day_count": "30/month",
            "fee_method": method.to_string(),
        }),
        warnings,
        elapsed,
        result,
    ))
}
