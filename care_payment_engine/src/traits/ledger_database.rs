use chrono::{DateTime, Utc};
use cpg_common::Money;
use thiserror::Error;

use crate::{
    db_types::{Order, OrderDoc, OrderId},
    traits::{AccountApiError, AccountManagement, ArchiveSweepResult, CompletionReceipt},
};

/// The highest level of behaviour a storage backend must expose to support the engine.
///
/// This behaviour includes:
/// * Mirroring order snapshots delivered by upstream store triggers.
/// * Posting the cash-completion ledger entries atomically, guarded by a per-order idempotency marker.
/// * The manual admin adjustments (settle / payout), each an atomic read-modify-write against one account.
/// * The two maintenance sweeps.
#[allow(async_fn_in_trait)]
pub trait LedgerDatabase: Clone + AccountManagement {
    /// The URL of the database.
    fn url(&self) -> &str;

    /// Stores the given snapshot in the order mirror, inserting or updating as needed. Fields the engine owns
    /// (`commission_posted`, row id, timestamps) are preserved on update.
    ///
    /// Returns the stored row and `true` if the order was newly inserted.
    async fn upsert_order(&self, doc: OrderDoc) -> Result<(Order, bool), LedgerError>;

    /// Posts the ledger entries for a qualifying cash completion, as one atomic transaction:
    ///
    /// 1. Re-reads the order's `commission_posted` marker inside the transaction; if already set, the whole
    ///    call is a no-op and returns `Ok(None)`. This is what makes at-least-once delivery safe.
    /// 2. Debits the worker's balance by `total_price × commission_rate` and appends a `CommissionDue` entry.
    /// 3. When `discount_amount > 0`, appends a `DiscountCost` entry against the patient, and increments the
    ///    coupon's `used_count` by exactly one when a code is present.
    /// 4. Stamps `last_payout_update` on the account and sets the marker.
    ///
    /// All steps commit together or not at all. Fails with [`LedgerError::AccountNotFound`] when the worker has
    /// no account; nothing is written in that case.
    async fn post_cash_completion(&self, order: &Order) -> Result<Option<CompletionReceipt>, LedgerError>;

    /// Adds `amount` to the worker's balance and appends a positive `CommissionPayment` entry, atomically.
    /// Returns the new balance.
    async fn settle_balance(&self, worker_id: &str, amount: Money, note: &str) -> Result<Money, LedgerError>;

    /// Withdraws `amount` from the worker's balance and appends a negative `Payout` entry, atomically.
    ///
    /// The balance check happens inside the same transaction as the mutation, so a concurrent posting cannot
    /// slip between check and debit. Fails with [`LedgerError::InsufficientBalance`] when
    /// `amount > payout_balance`; the balance is left unchanged.
    async fn payout(&self, worker_id: &str, amount: Money, note: &str) -> Result<Money, LedgerError>;

    /// Latches `can_cancel_after_accept` on every accepted order whose cancellation window has opened, in one
    /// batched write. Returns the affected order ids. Re-running finds nothing once the flags are flipped.
    async fn open_cancellation_windows(&self, now: DateTime<Utc>) -> Result<Vec<OrderId>, LedgerError>;

    /// Copies up to `limit` terminal orders last touched before `cutoff` into the archive (one batch commit),
    /// then deletes the originals (a second batch commit). A crash in between duplicates rows in both stores,
    /// which is acceptable: archive copies are additive and the live row stays authoritative until deleted.
    async fn archive_stale_orders(&self, cutoff: DateTime<Utc>, limit: u32) -> Result<ArchiveSweepResult, LedgerError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), LedgerError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("We have an internal database engine error (configuration/uptime etc.): {0}")]
    DatabaseError(String),
    #[error("{0}")]
    AccountError(#[from] AccountApiError),
    #[error("No payout account exists for worker {0}")]
    AccountNotFound(String),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Order {0} completed as cash but has no worker assigned")]
    NoWorkerOnOrder(OrderId),
    #[error("Requested {requested} but only {available} is available")]
    InsufficientBalance { available: Money, requested: Money },
    #[error("Caller {0} does not have the required role for this operation")]
    Unauthorized(String),
    #[error("Invalid amount for manual adjustment: {0}")]
    InvalidAmount(Money),
    #[error("The store transaction kept conflicting with concurrent writers: {0}")]
    TransactionConflict(String),
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        let msg = e.to_string();
        if msg.contains("database is locked") || msg.contains("database table is locked") {
            LedgerError::TransactionConflict(msg)
        } else {
            LedgerError::DatabaseError(msg)
        }
    }
}

impl LedgerError {
    /// Conflicts from concurrent writers are worth retrying; everything else is surfaced immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::TransactionConflict(_))
    }
}
