//! Batch orchestration: run a calculation over a list of work items,
//! isolating per-item failures so one bad record never aborts the batch.

use serde::{Deserialize, Serialize};

use crate::FactoringResult;

/// Status of a single item inside a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemStatus {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "ERROR")]
    Error,
}

/// Outcome for one batch item: either a successful result or an error
/// descriptor. Position in the batch is preserved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemOutcome<T> {
    pub item_id: String,
    pub status: ItemStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ItemOutcome<T> {
    pub fn ok(item_id: impl Into<String>, result: T) -> Self {
        ItemOutcome {
            item_id: item_id.into(),
            status: ItemStatus::Ok,
            result: Some(result),
            message: None,
        }
    }

    pub fn error(item_id: impl Into<String>, message: impl Into<String>) -> Self {
        ItemOutcome {
            item_id: item_id.into(),
            status: ItemStatus::Error,
            result: None,
            message: Some(message.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == ItemStatus::Ok
    }
}

/// Ordered outcomes for a whole batch, with success/failure counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutput<T> {
    pub outcomes: Vec<ItemOutcome<T>>,
    pub processed: usize,
    pub failed: usize,
}

/// Run `op` over every item, capturing errors per item.
///
/// `id_of` names the item for the error descriptor; items keep their input
/// order in the output.
pub fn run_batch<I, T>(
    items: &[I],
    id_of: impl Fn(&I, usize) -> String,
    op: impl Fn(&I) -> FactoringResult<T>,
) -> BatchOutput<T> {
    let mut outcomes = Vec::with_capacity(items.len());
    let mut failed = 0usize;

    for (idx, item) in items.iter().enumerate() {
        let id = id_of(item, idx);
        match op(item) {
            Ok(result) => outcomes.push(ItemOutcome::ok(id, result)),
            Err(e) => {
                failed += 1;
                outcomes.push(ItemOutcome::error(id, e.to_string()));
            }
        }
    }

    BatchOutput {
        processed: items.len(),
        failed,
        outcomes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FactoringError;

    #[test]
    fn test_bad_item_does_not_abort_batch() {
        let items = vec![1i64, -1, 3];
        let out = run_batch(
            &items,
            |_, idx| format!("item-{idx}"),
            |n| {
                if *n < 0 {
                    Err(FactoringError::InvalidInput {
                        field: "n".into(),
                        reason: "must be positive".into(),
                    })
                } else {
                    Ok(n * 2)
                }
            },
        );

        assert_eq!(out.processed, 3);
        assert_eq!(out.failed, 1);
        assert_eq!(out.outcomes[0].result, Some(2));
        assert_eq!(out.outcomes[1].status, ItemStatus::Error);
        assert!(out.outcomes[1].message.as_deref().unwrap().contains("positive"));
        assert_eq!(out.outcomes[2].result, Some(6));
    }
}
