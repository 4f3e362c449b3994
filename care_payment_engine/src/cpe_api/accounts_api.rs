//! Unified read-only query surface over accounts, orders and the ledger journal.

use std::fmt::Debug;

use crate::{
    db_types::{Coupon, LedgerEntry, Order, OrderId, WorkerAccount},
    traits::{AccountApiError, AccountManagement},
};

pub struct AccountApi<B> {
    db: B,
}

impl<B: Debug> Debug for AccountApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccountApi ({:?})", self.db)
    }
}

impl<B> AccountApi<B>
where B: AccountManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn worker_account(&self, worker_id: &str) -> Result<Option<WorkerAccount>, AccountApiError> {
        self.db.fetch_worker_account(worker_id).await
    }

    pub async fn order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, AccountApiError> {
        self.db.fetch_order_by_order_id(order_id).await
    }

    pub async fn ledger_entries(&self, user_id: &str) -> Result<Vec<LedgerEntry>, AccountApiError> {
        self.db.fetch_ledger_entries(user_id).await
    }

    pub async fn coupon(&self, code: &str) -> Result<Option<Coupon>, AccountApiError> {
        self.db.fetch_coupon(code).await
    }
}
