//! Settlement of payment events against originated operations: compound
//! accrual, six-case outcome classification, and the small-balance
//! back-door reduction with its audit trail.

pub mod backdoor;
pub mod calculator;
pub mod cases;

pub use backdoor::{
    AuditEntry, AuditMetrics, AuditSink, BackDoorConfig, BackDoorEngine, InMemoryAuditLog,
    Reduction, ReductionKind,
};
pub use calculator::{
    settle, settle_batch, settle_with_backdoor, settle_without_backdoor, Operation, Settlement,
    SettlementEvent, DEFAULT_MORATORY_RATE, STATUS_LIQUIDATED, STATUS_LIQUIDATED_BACKDOOR,
    STATUS_MANUAL_REVIEW, STATUS_PENDING,
};
pub use cases::SettlementCase;
