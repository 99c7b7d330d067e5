//! Back-door reduction: deterministic forgiveness of small residual
//! balances, in a fixed bucket order, with a full audit trail.
//!
//! A balance is forgiven only when it is both under the configured minimum
//! AND under the average cost of pursuing it. Balances between the two
//! limits stay payable: small enough to be under the minimum, still worth
//! collecting.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

use crate::interest::IGV_RATE;
use crate::types::Money;

use super::calculator::{Settlement, STATUS_LIQUIDATED_BACKDOOR};

/// Average administrative cost of pursuing a residual balance.
pub const DEFAULT_TRANSACTION_COST: Decimal = dec!(25.0);
/// Default minimum balance under which the back door is considered.
pub const DEFAULT_MINIMUM_THRESHOLD: Decimal = dec!(100.0);

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BackDoorConfig {
    /// Balances above this never enter the back door.
    pub minimum_threshold: Money,
    /// Balances above this are still worth collecting, threshold or not.
    pub transaction_cost: Money,
}

impl Default for BackDoorConfig {
    fn default() -> Self {
        BackDoorConfig {
            minimum_threshold: DEFAULT_MINIMUM_THRESHOLD,
            transaction_cost: DEFAULT_TRANSACTION_COST,
        }
    }
}

impl BackDoorConfig {
    pub fn with_threshold(minimum_threshold: Money) -> Self {
        BackDoorConfig {
            minimum_threshold,
            ..Default::default()
        }
    }
}

/// Which bucket a forgiveness step drew from. Order is contractual:
/// moratory first, compensatory delta second, capital delta last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReductionKind {
    #[serde(rename = "moratory")]
    Moratory,
    #[serde(rename = "compensatory")]
    Compensatory,
    #[serde(rename = "capital")]
    Capital,
}

/// One forgiveness step applied by the back door.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reduction {
    #[serde(rename = "type")]
    pub kind: ReductionKind,
    pub amount: Money,
    /// Balance still outstanding after this step.
    pub resulting_balance: Money,
}

/// Structured audit record for one back-door application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub operation_id: String,
    pub original_balance: Money,
    pub final_balance: Money,
    pub minimum_threshold: Money,
    pub transaction_cost: Money,
    pub reductions: Vec<Reduction>,
}

/// Destination for back-door audit records.
///
/// Injected into the engine so tests can capture entries and production can
/// forward them to an external sink. Implementations must serialize their
/// own appends.
pub trait AuditSink: Send + Sync {
    fn record(&self, entry: AuditEntry);
}

/// Aggregate figures over an in-memory audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditMetrics {
    pub applications: usize,
    pub total_forgiven: Money,
    pub average_forgiven: Money,
    /// Pursuit cost avoided, net of the amounts written off.
    pub estimated_savings: Money,
}

/// Process-lifetime audit log. Appends serialize on an internal mutex;
/// that mutex is the only synchronization point when settlement runs in
/// parallel.
#[derive(Debug, Default)]
pub struct InMemoryAuditLog {
    entries: Mutex<Vec<AuditEntry>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().expect("audit log poisoned").clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("audit log poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn metrics(&self) -> AuditMetrics {
        let entries = self.entries.lock().expect("audit log poisoned");
        let applications = entries.len();
        let total_forgiven: Decimal = entries
            .iter()
            .map(|e| e.original_balance - e.final_balance)
            .sum();
        let total_cost: Decimal = entries.iter().map(|e| e.transaction_cost).sum();
        let average_forgiven = if applications > 0 {
            total_forgiven / Decimal::from(applications as u64)
        } else {
            Decimal::ZERO
        };
        AuditMetrics {
            applications,
            total_forgiven,
            average_forgiven,
            estimated_savings: total_cost - total_forgiven,
        }
    }
}

impl AuditSink for InMemoryAuditLog {
    fn record(&self, entry: AuditEntry) {
        self.entries.lock().expect("audit log poisoned").push(entry);
    }
}

/// Applies the back-door reduction to settlement results and records every
/// application with the injected sink.
pub struct BackDoorEngine {
    config: BackDoorConfig,
    sink: Arc<dyn AuditSink>,
}

impl BackDoorEngine {
    pub fn new(config: BackDoorConfig, sink: Arc<dyn AuditSink>) -> Self {
        BackDoorEngine { config, sink }
    }

    /// Engine wired to a fresh in-memory log, returned alongside it so the
    /// caller can query metrics.
    pub fn with_default_log(config: BackDoorConfig) -> (Self, Arc<InMemoryAuditLog>) {
        let log = Arc::new(InMemoryAuditLog::new());
        let engine = BackDoorEngine::new(config, log.clone());
        (engine, log)
    }

    pub fn config(&self) -> &BackDoorConfig {
        &self.config
    }

    /// Run the reduction over a settlement result.
    ///
    /// Fires only when `0 < balance <= minimum_threshold` and the balance is
    /// not worth pursuing (`balance <= transaction_cost`). Everything else
    /// passes through untouched.
    pub fn apply(&self, mut settlement: Settlement) -> Settlement {
        let balance = settlement.global_balance;

        if balance <= Decimal::ZERO || balance > self.config.minimum_threshold {
            return settlement;
        }
        if balance > self.config.transaction_cost {
            // Under the minimum but still worth collecting.
            return settlement;
        }

        let original_balance = balance;
        let mut remaining = balance;
        let mut reductions: Vec<Reduction> = Vec::with_capacity(3);

        // Interest buckets are forgiven gross of their IGV, so the three
        // buckets together span the whole balance and the interest/IGV
        // fields rebase proportionally after each cut.

        // 1. Moratory interest.
        let gross_moratory = settlement.moratory_interest + settlement.moratory_igv;
        if remaining > Decimal::ZERO && gross_moratory > Decimal::ZERO {
            let cut = remaining.min(gross_moratory);
            let kept = (gross_moratory - cut) / gross_moratory;
            settlement.moratory_interest *= kept;
            settlement.moratory_igv = settlement.moratory_interest * IGV_RATE;
            remaining -= cut;
            reductions.push(Reduction {
                kind: ReductionKind::Moratory,
                amount: cut,
                resulting_balance: remaining,
            });
        }

        // 2. Compensatory interest delta.
        let gross_delta = settlement.delta_interest + settlement.delta_igv;
        if remaining > Decimal::ZERO
            && settlement.delta_interest > Decimal::ZERO
            && gross_delta > Decimal::ZERO
        {
            let cut = remaining.min(gross_delta);
            let kept = (gross_delta - cut) / gross_delta;
            settlement.delta_interest *= kept;
            settlement.delta_igv = settlement.delta_interest * IGV_RATE;
            remaining -= cut;
            reductions.push(Reduction {
                kind: ReductionKind::Compensatory,
                amount: cut,
                resulting_balance: remaining,
            });
        }

        // 3. Capital delta.
        if remaining > Decimal::ZERO && settlement.delta_capital > Decimal::ZERO {
            let cut = remaining.min(settlement.delta_capital);
            settlement.delta_capital -= cut;
            remaining -= cut;
            reductions.push(Reduction {
                kind: ReductionKind::Capital,
                amount: cut,
                resulting_balance: remaining,
            });
        }

        settlement.global_balance = remaining;
        settlement.backdoor_applied = true;
        settlement.backdoor_threshold = Some(self.config.minimum_threshold);
        settlement.original_balance = Some(original_balance);
        settlement.settled = true;
        settlement.status = STATUS_LIQUIDATED_BACKDOOR.to_string();
        settlement.reductions = reductions.clone();

        self.sink.record(AuditEntry {
            timestamp: Utc::now(),
            operation_id: settlement.operation_id.clone(),
            original_balance,
            final_balance: remaining,
            minimum_threshold: self.config.minimum_threshold,
            transaction_cost: self.config.transaction_cost,
            reductions,
        });

        settlement
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settlement::cases::SettlementCase;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn settlement_with_balance(
        moratory: Decimal,
        delta_interest: Decimal,
        delta_capital: Decimal,
    ) -> Settlement {
        let moratory_igv = moratory * IGV_RATE;
        let delta_igv = delta_interest * IGV_RATE;
        let balance = delta_interest + delta_igv + moratory + moratory_igv + delta_capital;
        Settlement {
            operation_id: "OP-BD".into(),
            capital: dec!(10000),
            amount_received: dec!(10000) - delta_capital,
            payment_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            elapsed_days: 45,
            moratory_days: if moratory > Decimal::ZERO { 5 } else { 0 },
            accrued_interest: dec!(300),
            accrued_igv: dec!(54),
            moratory_interest: moratory,
            moratory_igv,
            delta_interest,
            delta_igv,
            delta_capital,
            global_balance: balance,
            case: SettlementCase::BillInterestNewSchedule,
            recommended_action: String::new(),
            settled: false,
            status: "PENDIENTE".into(),
            backdoor_applied: false,
            backdoor_threshold: None,
            original_balance: None,
            reductions: Vec::new(),
        }
    }

    fn engine() -> (BackDoorEngine, Arc<InMemoryAuditLog>) {
        BackDoorEngine::with_default_log(BackDoorConfig {
            minimum_threshold: dec!(100),
            transaction_cost: dec!(25),
        })
    }

    #[test]
    fn test_fires_below_cost_and_threshold() {
        // moratory 8 (igv 1.44), delta_interest 5 (igv 0.9), capital 4.66
        // balance = 8 + 1.44 + 5 + 0.9 + 4.66 = 20.00
        let s = settlement_with_balance(dec!(8), dec!(5), dec!(4.66));
        assert_eq!(s.global_balance, dec!(20.00));

        let (engine, log) = engine();
        let out = engine.apply(s);

        assert!(out.backdoor_applied);
        assert_eq!(out.global_balance, Decimal::ZERO);
        assert_eq!(out.status, STATUS_LIQUIDATED_BACKDOOR);
        assert_eq!(out.original_balance, Some(dec!(20.00)));

        // Fixed bucket order, each gross of IGV, amounts summing to the
        // original balance.
        assert_eq!(out.reductions.len(), 3);
        assert_eq!(out.reductions[0].kind, ReductionKind::Moratory);
        assert_eq!(out.reductions[0].amount, dec!(9.44));
        assert_eq!(out.reductions[1].kind, ReductionKind::Compensatory);
        assert_eq!(out.reductions[1].amount, dec!(5.90));
        assert_eq!(out.reductions[2].kind, ReductionKind::Capital);
        assert_eq!(out.reductions[2].amount, dec!(4.66));
        let total: Decimal = out.reductions.iter().map(|r| r.amount).sum();
        assert_eq!(total, dec!(20.00));
        assert_eq!(out.reductions[2].resulting_balance, Decimal::ZERO);

        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_under_threshold_but_worth_pursuing_does_not_fire() {
        // balance 80: under the 100 minimum, above the 25 pursuit cost
        let s = settlement_with_balance(dec!(40), dec!(20), dec!(9.20));
        assert_eq!(s.global_balance, dec!(80.00));

        let (engine, log) = engine();
        let out = engine.apply(s);

        assert!(!out.backdoor_applied);
        assert_eq!(out.global_balance, dec!(80.00));
        assert!(log.is_empty());
    }

    #[test]
    fn test_negative_and_zero_balances_pass_through() {
        let mut s = settlement_with_balance(dec!(0), dec!(-10), dec!(0));
        let (engine, log) = engine();
        let out = engine.apply(s.clone());
        assert!(!out.backdoor_applied);

        s.global_balance = Decimal::ZERO;
        let out = engine.apply(s);
        assert!(!out.backdoor_applied);
        assert!(log.is_empty());
    }

    #[test]
    fn test_moratory_igv_rebased_after_cut() {
        let s = settlement_with_balance(dec!(8), dec!(5), dec!(4.66));
        let (engine, _log) = engine();
        let out = engine.apply(s);
        // Moratory fully forgiven, so its IGV rebases to zero.
        assert_eq!(out.moratory_interest, Decimal::ZERO);
        assert_eq!(out.moratory_igv, Decimal::ZERO);
    }

    #[test]
    fn test_metrics_aggregate() {
        let (engine, log) = engine();
        engine.apply(settlement_with_balance(dec!(8), dec!(5), dec!(4.66)));
        engine.apply(settlement_with_balance(dec!(4), dec!(2), dec!(2.92)));

        let m = log.metrics();
        assert_eq!(m.applications, 2);
        assert_eq!(m.total_forgiven, dec!(30.00));
        assert_eq!(m.average_forgiven, dec!(15.00));
        // Two pursuits avoided at 25 each, minus what was written off.
        assert_eq!(m.estimated_savings, dec!(20.00));
    }
}
