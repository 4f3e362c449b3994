use std::fmt::Debug;

use cpg_common::Money;
use log::*;

use crate::{
    db_types::{Caller, LedgerEntry, WorkerAccount},
    traits::{AccountManagement, LedgerDatabase, LedgerError},
};

/// Wraps the manual admin adjustments with the authorisation checks. The underlying balance mutations are
/// delegated to the backend, which performs them atomically with their journal entries.
pub struct LedgerApi<B> {
    db: B,
}

impl<B> Debug for LedgerApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LedgerApi")
    }
}

impl<B> LedgerApi<B>
where B: LedgerDatabase
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Credits `amount` to the worker's balance on behalf of an admin. Returns the new balance.
    pub async fn settle_balance(
        &self,
        caller: &Caller,
        worker_id: &str,
        amount: Money,
        note: &str,
    ) -> Result<Money, LedgerError> {
        require_admin(caller)?;
        if amount < Money::from(0) {
            return Err(LedgerError::InvalidAmount(amount));
        }
        let new_balance = self.db.settle_balance(worker_id, amount, note).await?;
        info!("💳️ {} credited {amount} to {worker_id}; balance is now {new_balance}", caller.id);
        Ok(new_balance)
    }

    /// Withdraws `amount` from the worker's balance on behalf of an admin. Returns the new balance.
    pub async fn payout(
        &self,
        caller: &Caller,
        worker_id: &str,
        amount: Money,
        note: &str,
    ) -> Result<Money, LedgerError> {
        require_admin(caller)?;
        if amount <= Money::from(0) {
            return Err(LedgerError::InvalidAmount(amount));
        }
        let new_balance = self.db.payout(worker_id, amount, note).await?;
        info!("💳️ {} paid out {amount} to {worker_id}; balance is now {new_balance}", caller.id);
        Ok(new_balance)
    }

    /// Account snapshot plus the full journal for a worker, admin only.
    pub async fn history(
        &self,
        caller: &Caller,
        worker_id: &str,
    ) -> Result<(WorkerAccount, Vec<LedgerEntry>), LedgerError> {
        require_admin(caller)?;
        let account = self
            .db
            .fetch_worker_account(worker_id)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(worker_id.to_string()))?;
        let entries = self.db.fetch_ledger_entries(worker_id).await?;
        Ok((account, entries))
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

fn require_admin(caller: &Caller) -> Result<(), LedgerError> {
    if caller.is_admin() {
        Ok(())
    } else {
        warn!("💳️ {} ({}) attempted a manual ledger adjustment without the Admin role", caller.id, caller.role);
        Err(LedgerError::Unauthorized(caller.id.clone()))
    }
}
