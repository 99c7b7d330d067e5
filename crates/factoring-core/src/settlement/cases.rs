//! Sign-matrix classification of a settlement outcome.
//!
//! The decision table is strict-sign only: any zero among the three
//! discriminants falls through to `Unclassified` and is routed to manual
//! review rather than guessed at.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::types::Money;

/// Outcome of settling a payment against an originated operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettlementCase {
    /// Interest and capital both overcollected; operation closes with a
    /// credit note and a refund to the client.
    #[serde(rename = "SETTLED_CREDIT_NOTE_REFUND")]
    SettledCreditNoteRefund,
    /// Interest overbilled but capital short; credit note for the interest
    /// and a new payment schedule for the rest.
    #[serde(rename = "CREDIT_NOTE_NEW_SCHEDULE")]
    CreditNoteNewSchedule,
    /// Both interest and capital short; bill the additional interest and
    /// reschedule.
    #[serde(rename = "BILL_INTEREST_NEW_SCHEDULE")]
    BillInterestNewSchedule,
    /// Interest short, capital overpaid, net still owed; bill interest and
    /// evaluate late fees.
    #[serde(rename = "BILL_INTEREST_LATE_FEES")]
    BillInterestLateFees,
    /// Interest short but the capital excess covers it; bill interest and
    /// refund the capital excess, operation closes.
    #[serde(rename = "SETTLED_BILL_INTEREST_REFUND_CAPITAL")]
    SettledBillInterestRefundCapital,
    /// Interest overbilled, capital short, net in the client's favour;
    /// credit note and refund of the negative balance, operation closes.
    #[serde(rename = "SETTLED_CREDIT_NOTE_NEGATIVE_BALANCE")]
    SettledCreditNoteNegativeBalance,
    /// Sign combination outside the table (including any exact zero).
    #[serde(rename = "UNCLASSIFIED")]
    Unclassified,
}

impl SettlementCase {
    /// Classify from the signs of the interest delta, capital delta and
    /// global balance.
    pub fn classify(delta_interest: Money, delta_capital: Money, global_balance: Money) -> Self {
        use Ordering::{Greater, Less};

        let signs = (
            delta_interest.cmp(&Decimal::ZERO),
            delta_capital.cmp(&Decimal::ZERO),
            global_balance.cmp(&Decimal::ZERO),
        );

        match signs {
            (Less, Less, Less) => SettlementCase::SettledCreditNoteRefund,
            (Less, Greater, Greater) => SettlementCase::CreditNoteNewSchedule,
            (Greater, Greater, Greater) => SettlementCase::BillInterestNewSchedule,
            (Greater, Less, Greater) => SettlementCase::BillInterestLateFees,
            (Greater, Less, Less) => SettlementCase::SettledBillInterestRefundCapital,
            (Less, Greater, Less) => SettlementCase::SettledCreditNoteNegativeBalance,
            _ => SettlementCase::Unclassified,
        }
    }

    /// Whether this outcome closes the operation.
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            SettlementCase::SettledCreditNoteRefund
                | SettlementCase::SettledBillInterestRefundCapital
                | SettlementCase::SettledCreditNoteNegativeBalance
        )
    }

    pub fn requires_manual_review(&self) -> bool {
        matches!(self, SettlementCase::Unclassified)
    }

    /// Operational follow-up for the liquidation desk.
    pub fn recommended_action(&self) -> &'static str {
        match self {
            SettlementCase::SettledCreditNoteRefund => {
                "issue credit note and refund the client"
            }
            SettlementCase::CreditNoteNewSchedule => {
                "issue credit note for interest and agree a new payment schedule"
            }
            SettlementCase::BillInterestNewSchedule => {
                "bill additional interest and agree a new payment schedule"
            }
            SettlementCase::BillInterestLateFees => {
                "bill additional interest and evaluate late fees"
            }
            SettlementCase::SettledBillInterestRefundCapital => {
                "bill additional interest and refund the capital excess"
            }
            SettlementCase::SettledCreditNoteNegativeBalance => {
                "issue credit note and refund the negative balance"
            }
            SettlementCase::Unclassified => "flag for manual review",
        }
    }
}

impl std::fmt::Display for SettlementCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SettlementCase::SettledCreditNoteRefund => "SETTLED_CREDIT_NOTE_REFUND",
            SettlementCase::CreditNoteNewSchedule => "CREDIT_NOTE_NEW_SCHEDULE",
            SettlementCase::BillInterestNewSchedule => "BILL_INTEREST_NEW_SCHEDULE",
            SettlementCase::BillInterestLateFees => "BILL_INTEREST_LATE_FEES",
            SettlementCase::SettledBillInterestRefundCapital => {
                "SETTLED_BILL_INTEREST_REFUND_CAPITAL"
            }
            SettlementCase::SettledCreditNoteNegativeBalance => {
                "SETTLED_CREDIT_NOTE_NEGATIVE_BALANCE"
            }
            SettlementCase::Unclassified => "UNCLASSIFIED",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_all_six_table_rows() {
        let cases = [
            (dec!(-10), dec!(-50), dec!(-60), SettlementCase::SettledCreditNoteRefund),
            (dec!(-10), dec!(50), dec!(40), SettlementCase::CreditNoteNewSchedule),
            (dec!(10), dec!(50), dec!(60), SettlementCase::BillInterestNewSchedule),
            (dec!(10), dec!(-5), dec!(5), SettlementCase::BillInterestLateFees),
            (dec!(10), dec!(-50), dec!(-40), SettlementCase::SettledBillInterestRefundCapital),
            (dec!(-50), dec!(10), dec!(-40), SettlementCase::SettledCreditNoteNegativeBalance),
        ];
        for (di, dc, gb, expected) in cases {
            assert_eq!(SettlementCase::classify(di, dc, gb), expected);
        }
    }

    #[test]
    fn test_zero_falls_to_unclassified() {
        assert_eq!(
            SettlementCase::classify(dec!(0), dec!(-50), dec!(-50)),
            SettlementCase::Unclassified
        );
        assert_eq!(
            SettlementCase::classify(dec!(-10), dec!(0), dec!(-10)),
            SettlementCase::Unclassified
        );
        assert_eq!(
            SettlementCase::classify(dec!(-10), dec!(10), dec!(0)),
            SettlementCase::Unclassified
        );
    }

    #[test]
    fn test_settled_flags() {
        assert!(SettlementCase::SettledCreditNoteRefund.is_settled());
        assert!(SettlementCase::SettledBillInterestRefundCapital.is_settled());
        assert!(SettlementCase::SettledCreditNoteNegativeBalance.is_settled());
        assert!(!SettlementCase::BillInterestLateFees.is_settled());
        assert!(!SettlementCase::Unclassified.is_settled());
        assert!(SettlementCase::Unclassified.requires_manual_review());
    }
}
