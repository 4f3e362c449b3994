use thiserror::Error;

use crate::db_types::{Coupon, LedgerEntry, Order, OrderId, WorkerAccount};

#[derive(Debug, Clone, Error)]
pub enum AccountApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("User error constructing query: {0}")]
    QueryError(String),
}

impl From<sqlx::Error> for AccountApiError {
    fn from(e: sqlx::Error) -> Self {
        AccountApiError::DatabaseError(e.to_string())
    }
}

/// Read-side queries over worker accounts, the order mirror and the ledger journal, plus the handful of
/// record-keeping writes that belong to onboarding flows rather than the ledger (worker registration, push
/// token and coupon upkeep). The ledger itself never creates or deletes a worker account.
#[allow(async_fn_in_trait)]
pub trait AccountManagement {
    async fn fetch_worker_account(&self, worker_id: &str) -> Result<Option<WorkerAccount>, AccountApiError>;

    async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, AccountApiError>;

    /// Ledger journal for the given balance owner, most recent first.
    async fn fetch_ledger_entries(&self, user_id: &str) -> Result<Vec<LedgerEntry>, AccountApiError>;

    async fn fetch_coupon(&self, code: &str) -> Result<Option<Coupon>, AccountApiError>;

    /// Resolves a patient's push-delivery address. Worker addresses live on the worker account.
    async fn fetch_push_token(&self, user_id: &str) -> Result<Option<String>, AccountApiError>;

    /// Creates the account record for a newly onboarded worker. Idempotent on `worker_id`.
    async fn register_worker_account(
        &self,
        worker_id: &str,
        fcm_token: Option<String>,
    ) -> Result<WorkerAccount, AccountApiError>;

    async fn set_push_token(&self, user_id: &str, token: &str) -> Result<(), AccountApiError>;

    /// Registers a coupon code so completions can count its redemptions. Idempotent.
    async fn upsert_coupon(&self, code: &str) -> Result<(), AccountApiError>;
}
