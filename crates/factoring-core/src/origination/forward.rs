//! Forward origination: from net invoice amount and advance rate to the
//! full disbursement breakdown.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::batch::ItemOutcome;
use crate::error::FactoringError;
use crate::interest::compound_interest;
use crate::types::{round_money, with_metadata, ComputationOutput, Money, Rate};
use crate::FactoringResult;

use super::{
    affiliation_charge, decide_fee_method, default_tax_rate, is_default_tax_rate,
    BatchOriginationOutput, FeeMethod, OriginationItemOutput,
};

/// One invoice to originate. Required numerics are optional at the struct
/// level so a missing field aborts only that item in batch mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OriginationItemInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    /// Net invoice face amount.
    pub net_amount: Option<Money>,
    /// Fraction of the net amount advanced as capital (e.g. 0.9).
    pub advance_rate: Option<Rate>,
    /// Monthly compensatory interest rate, decimal.
    pub monthly_rate: Option<Rate>,
    /// Financing term in days.
    pub term_days: Option<u32>,
    /// Minimum fixed commission for this invoice.
    pub fixed_min_commission: Option<Money>,
    /// Percentage commission rate on capital.
    pub pct_commission: Option<Rate>,
    /// Tax rate on interest and fees. Defaults to IGV (18%).
    #[serde(default = "default_tax_rate", skip_serializing_if = "is_default_tax_rate")]
    pub tax_rate: Rate,
    /// One-off affiliation fee, charged only when `apply_affiliation` is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affiliation_fee: Option<Money>,
    #[serde(default)]
    pub apply_affiliation: bool,
}

/// An item whose required fields all passed validation.
struct ValidatedItem {
    net: Money,
    advance_rate: Rate,
    term_days: u32,
    fixed_min: Money,
    pct: Rate,
    tax_rate: Rate,
    affiliation: Money,
    igv_affiliation: Money,
    capital: Money,
    interest: Money,
}

fn required_field<T>(opt: Option<T>, field_name: &str) -> FactoringResult<T> {
    opt.ok_or_else(|| FactoringError::InvalidInput {
        field: field_name.to_string(),
        reason: format!("{} is required", field_name),
    })
}

fn validate_item(item: &OriginationItemInput) -> FactoringResult<ValidatedItem> {
    let net = required_field(item.net_amount, "net_amount")?;
    let advance_rate = required_field(item.advance_rate, "advance_rate")?;
    let monthly_rate = required_field(item.monthly_rate, "monthly_rate")?;
    let term_days = required_field(item.term_days, "term_days")?;
    let fixed_min = required_field(item.fixed_min_commission, "fixed_min_commission")?;
    let pct = required_field(item.pct_commission, "pct_commission")?;

    if net <= Decimal::ZERO {
        return Err(FactoringError::InvalidInput {
            field: "net_amount".into(),
            reason: "net invoice amount must be positive".into(),
        });
    }
    if advance_rate <= Decimal::ZERO || advance_rate > Decimal::ONE {
        return Err(FactoringError::InvalidInput {
            field: "advance_rate".into(),
            reason: "advance rate must be in (0, 1]".into(),
        });
    }

    let capital = net * advance_rate;
    let interest = compound_interest(capital, monthly_rate, i64::from(term_days))?;
    let (affiliation, igv_affiliation) =
        affiliation_charge(item.affiliation_fee, item.apply_affiliation, item.tax_rate);

    Ok(ValidatedItem {
        net,
        advance_rate,
        term_days,
        fixed_min,
        pct,
        tax_rate: item.tax_rate,
        affiliation,
        igv_affiliation,
        capital,
        interest,
    })
}

/// Build the final per-item breakdown once the batch-wide fee method is known.
fn breakdown(v: &ValidatedItem, method: FeeMethod) -> OriginationItemOutput {
    let commission = match method {
        FeeMethod::Percentage => v.capital * v.pct,
        FeeMethod::Fixed => v.fixed_min,
    };
    let igv_interest = v.interest * v.tax_rate;
    let igv_commission = commission * v.tax_rate;

    let disbursement = v.capital
        - v.interest
        - igv_interest
        - commission
        - igv_commission
        - v.affiliation
        - v.igv_affiliation;

    OriginationItemOutput {
        capital: round_money(v.capital),
        advance_rate: v.advance_rate,
        interest: round_money(v.interest),
        igv_interest: round_money(igv_interest),
        commission: round_money(commission),
        igv_commission: round_money(igv_commission),
        affiliation: round_money(v.affiliation),
        igv_affiliation: round_money(v.igv_affiliation),
        // Disbursed amounts are whole currency units.
        disbursed_amount: disbursement.floor(),
        safety_margin: round_money(v.net - v.capital),
        term_days: v.term_days,
    }
}

/// Originate a batch of invoices.
///
/// The commission method (percentage of capital vs. fixed minimum) is
/// decided once across the whole batch -- whichever total yields more
/// revenue -- and then applied uniformly to every item. Items that fail
/// validation are reported in place and excluded from the aggregate.
pub fn compute_batch_origination(
    items: &[OriginationItemInput],
) -> FactoringResult<ComputationOutput<BatchOriginationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if items.is_empty() {
        return Err(FactoringError::EmptyBatch);
    }

    let validated: Vec<FactoringResult<ValidatedItem>> =
        items.iter().map(validate_item).collect();

    let mut pct_revenue = Decimal::ZERO;
    let mut fixed_revenue = Decimal::ZERO;
    for v in validated.iter().flatten() {
        pct_revenue += v.capital * v.pct;
        fixed_revenue += v.fixed_min;
    }
    let method = decide_fee_method(pct_revenue, fixed_revenue);

    let mut outcomes = Vec::with_capacity(items.len());
    let mut total_capital = Decimal::ZERO;
    let mut total_commission = Decimal::ZERO;
    let mut total_disbursed = Decimal::ZERO;

    for (idx, (item, v)) in items.iter().zip(validated.iter()).enumerate() {
        let id = item
            .item_id
            .clone()
            .unwrap_or_else(|| format!("item-{idx}"));
        match v {
            Ok(valid) => {
                let out = breakdown(valid, method);
                if out.disbursed_amount < Decimal::ZERO {
                    warnings.push(format!(
                        "{id}: charges exceed capital, disbursement is negative"
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

    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    if failed == items.len() {
        warnings.push("no item in the batch passed validation".into());
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
        "Batch origination -- compound monthly interest on 30-day basis, batch-wide fee method",
        &serde_json::json!({
            "day_count": "30/month",
            "fee_method": method.to_string(),
            "pct_revenue": pct_revenue.round_dp(4),
            "fixed_revenue": fixed_revenue.round_dp(4),
        }),
        warnings,
        elapsed,
        result,
    ))
}

/// Single-invoice adapter over [`compute_batch_origination`].
///
/// A validation failure on the item comes back as an error result rather
/// than an in-place outcome.
pub fn compute_origination(
    item: &OriginationItemInput,
) -> FactoringResult<ComputationOutput<BatchOriginationOutput>> {
    validate_item(item)?;
    compute_batch_origination(std::slice::from_ref(item))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_item(net: Decimal, fixed_min: Decimal) -> OriginationItemInput {
        OriginationItemInput {
            item_id: None,
            net_amount: Some(net),
            advance_rate: Some(dec!(0.9)),
            monthly_rate: Some(dec!(0.02)),
            term_days: Some(30),
            fixed_min_commission: Some(fixed_min),
            pct_commission: Some(dec!(0.005)),
            tax_rate: dec!(0.18),
            affiliation_fee: None,
            apply_affiliation: false,
        }
    }

    #[test]
    fn test_empty_batch_is_an_error() {
        let result = compute_batch_origination(&[]);
        assert!(matches!(result, Err(FactoringError::EmptyBatch)));
    }

    #[test]
    fn test_fixed_method_wins_when_minimums_are_larger() {
        // capital = 9000, pct revenue = 45; fixed minimums of 200 dominate
        let items = vec![sample_item(dec!(10000), dec!(200))];
        let out = compute_batch_origination(&items).unwrap();
        assert_eq!(out.result.chosen_fee_method, FeeMethod::Fixed);
        let item = out.result.items[0].result.as_ref().unwrap();
        assert_eq!(item.commission, dec!(200));
    }

    #[test]
    fn test_percentage_method_wins_on_tie() {
        // capital = 9000 at 0.5% = 45 exactly equal to the fixed minimum
        let items = vec![sample_item(dec!(10000), dec!(45))];
        let out = compute_batch_origination(&items).unwrap();
        assert_eq!(out.result.chosen_fee_method, FeeMethod::Percentage);
    }

    #[test]
    fn test_breakdown_floors_disbursement() {
        let items = vec![sample_item(dec!(10000), dec!(10))];
        let out = compute_batch_origination(&items).unwrap();
        let item = out.result.items[0].result.as_ref().unwrap();
        assert_eq!(item.disbursed_amount, item.disbursed_amount.floor());
        assert_eq!(item.safety_margin, dec!(1000));
        // capital minus every charge stays below capital
        assert!(item.disbursed_amount < item.capital);
    }

    #[test]
    fn test_missing_field_aborts_only_that_item() {
        let mut bad = sample_item(dec!(5000), dec!(10));
        bad.monthly_rate = None;
        let items = vec![sample_item(dec!(10000), dec!(10)), bad];
        let out = compute_batch_origination(&items).unwrap();
        assert!(out.result.items[0].is_ok());
        assert!(!out.result.items[1].is_ok());
        assert!(out.result.items[1]
            .message
            .as_deref()
            .unwrap()
            .contains("monthly_rate"));
    }

    #[test]
    fn test_single_item_adapter_propagates_validation_error() {
        let mut item = sample_item(dec!(1000), dec!(10));
        item.net_amount = None;
        assert!(compute_origination(&item).is_err());
    }

    #[test]
    fn test_affiliation_fee_charged_when_applied() {
        let mut item = sample_item(dec!(10000), dec!(10));
        item.affiliation_fee = Some(dec!(50));
        item.apply_affiliation = true;
        let out = compute_batch_origination(&[item]).unwrap();
        let detail = out.result.items[0].result.as_ref().unwrap();
        assert_eq!(detail.affiliation, dec!(50));
        assert_eq!(detail.igv_affiliation, dec!(9.00));
    }
}
