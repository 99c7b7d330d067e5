//! Invoice origination: disbursement breakdowns for a batch of factored
//! invoices, with the aggregate commission-method decision, and the reverse
//! solver that finds the capital needed to hit a target disbursement.

pub mod forward;
pub mod reverse;

pub use forward::{compute_batch_origination, compute_origination, OriginationItemInput};
pub use reverse::{find_advance_rate, ReverseItemInput};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::batch::ItemOutcome;
use crate::types::{Money, Rate};

/// Commission method applied uniformly across a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeeMethod {
    #[serde(rename = "PERCENTAGE")]
    Percentage,
    #[serde(rename = "FIXED")]
    Fixed,
}

impl std::fmt::Display for FeeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeeMethod::Percentage => write!(f, "PERCENTAGE"),
            FeeMethod::Fixed => write!(f, "FIXED"),
        }
    }
}

/// Whichever commission total generates more revenue wins for the whole
/// batch. Exact tie goes to the percentage method.
pub(crate) fn decide_fee_method(pct_revenue: Money, fixed_revenue: Money) -> FeeMethod {
    if fixed_revenue > pct_revenue {
        FeeMethod::Fixed
    } else {
        FeeMethod::Percentage
    }
}

/// Breakdown of a single originated invoice. All figures rounded to 2 dp
/// except `disbursed_amount`, which is floored to the currency unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OriginationItemOutput {
    pub capital: Money,
    pub advance_rate: Rate,
    pub interest: Money,
    pub igv_interest: Money,
    pub commission: Money,
    pub igv_commission: Money,
    pub affiliation: Money,
    pub igv_affiliation: Money,
    pub disbursed_amount: Money,
    pub safety_margin: Money,
    pub term_days: u32,
}

/// Output of a batch origination run (forward or reverse).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOriginationOutput {
    pub chosen_fee_method: FeeMethod,
    pub total_capital: Money,
    pub total_commission: Money,
    pub total_disbursed: Money,
    pub items: Vec<ItemOutcome<OriginationItemOutput>>,
}

pub(crate) fn default_tax_rate() -> Rate {
    crate::interest::IGV_RATE
}

pub(crate) fn is_default_tax_rate(rate: &Rate) -> bool {
    *rate == crate::interest::IGV_RATE
}

/// Affiliation charge for an item: `(fee, igv_on_fee)`, both zero unless
/// the item opts in and carries a fee.
pub(crate) fn affiliation_charge(
    fee: Option<Money>,
    apply: bool,
    tax_rate: Rate,
) -> (Money, Money) {
    match fee {
        Some(f) if apply => (f, f * tax_rate),
        _ => (Decimal::ZERO, Decimal::ZERO),
    }
}
