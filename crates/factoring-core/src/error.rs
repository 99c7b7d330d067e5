use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FactoringError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Empty batch: at least one item is required")]
    EmptyBatch,

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Negative day count: {days} days between {context}")]
    NegativeDayCount { days: i64, context: String },

    #[error("Amount out of range: {field} = {value}")]
    AmountOutOfRange { field: String, value: Decimal },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for FactoringError {
    fn from(e: serde_json::Error) -> Self {
        FactoringError::SerializationError(e.to_string())
    }
}
