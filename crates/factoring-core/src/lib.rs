pub mod batch;
pub mod error;
pub mod interest;
pub mod origination;
pub mod projection;
pub mod settlement;
pub mod types;

pub use error::FactoringError;
pub use types::*;

/// Standard result type for all factoring operations
pub type FactoringResult<T> = Result<T, FactoringError>;
