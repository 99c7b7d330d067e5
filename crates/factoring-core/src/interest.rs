use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::FactoringError;
use crate::types::{Money, Rate};
use crate::FactoringResult;

/// IGV (sales tax) rate applied to interest and commission amounts.
pub const IGV_RATE: Decimal = dec!(0.18);

/// Commercial month length used for all rate conversions. Contractual
/// convention, not an approximation of calendar months.
pub const DAYS_IN_MONTH: Decimal = dec!(30);

/// Compound interest accrued over `days` at a monthly rate:
/// `principal * ((1 + monthly_rate/30)^days - 1)`.
///
/// Zero days yields zero interest. Negative day counts must be rejected by
/// the caller before reaching this point; they are an input error here.
pub fn compound_interest(principal: Money, monthly_rate: Rate, days: i64) -> FactoringResult<Money> {
    if days < 0 {
        return Err(FactoringError::NegativeDayCount {
            days,
            context: "compound interest accrual".into(),
        });
    }
    if days == 0 {
        return Ok(Decimal::ZERO);
    }

    let daily_rate = monthly_rate / DAYS_IN_MONTH;
    let factor = (Decimal::ONE + daily_rate).powd(Decimal::from(days));
    Ok(principal * (factor - Decimal::ONE))
}

/// Apply a tax rate to an amount.
pub fn apply_tax(amount: Money, rate: Rate) -> Money {
    amount * rate
}

/// Apply the fixed IGV rate to an amount.
pub fn apply_igv(amount: Money) -> Money {
    apply_tax(amount, IGV_RATE)
}

/// Signed calendar days between two dates (`end - start`).
///
/// The sign is preserved: origination treats a negative count as invalid,
/// settlement treats payment-before-due as early payment.
pub fn day_count(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}
