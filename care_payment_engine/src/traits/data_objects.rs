use cpg_common::Money;
use serde::{Deserialize, Serialize};

use crate::db_types::OrderId;

/// What the cash-completion posting actually wrote. `None` from the posting call means the idempotency marker
/// was already set and nothing changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionReceipt {
    pub order_id: OrderId,
    pub worker_id: String,
    /// The commission debited from the worker's balance (as a positive figure).
    pub commission: Money,
    /// The discount cost recorded against the patient, if any.
    pub discount: Option<Money>,
    /// The worker's balance after the posting.
    pub new_balance: Money,
}

/// Result of one archival sweep run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArchiveSweepResult {
    pub archived: Vec<OrderId>,
}

impl ArchiveSweepResult {
    pub fn count(&self) -> usize {
        self.archived.len()
    }
}
