//! `SqliteDatabase` is a concrete implementation of the care-payment ledger backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use cpg_common::Money;
use log::*;
use sqlx::SqlitePool;

use super::db::{coupons, db_url, ledger, new_pool, orders, push_tokens, sweeps, worker_accounts};
use crate::{
    db_types::{
        Coupon,
        LedgerEntry,
        LedgerEntryType,
        NewLedgerEntry,
        Order,
        OrderDoc,
        OrderId,
        WorkerAccount,
    },
    traits::{
        AccountApiError,
        AccountManagement,
        ArchiveSweepResult,
        CompletionReceipt,
        LedgerDatabase,
        LedgerError,
    },
};

/// How many times a balance-affecting transaction is retried when SQLite reports a lock conflict before the
/// error is handed back to the caller.
const MAX_TX_RETRIES: u32 = 3;

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new connection pool using the URL from the `CPG_DATABASE_URL` environment variable.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn post_cash_completion_once(&self, order: &Order) -> Result<Option<CompletionReceipt>, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let posted = orders::commission_posted(&order.order_id, &mut tx)
            .await?
            .ok_or_else(|| LedgerError::OrderNotFound(order.order_id.clone()))?;
        if posted {
            debug!("💰️ Commission for order {} has already been posted. Nothing to do.", order.order_id);
            return Ok(None);
        }
        let worker_id = order
            .nurse_id
            .as_deref()
            .ok_or_else(|| LedgerError::NoWorkerOnOrder(order.order_id.clone()))?;
        let _account = worker_accounts::fetch_worker_account(worker_id, &mut tx)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(worker_id.to_string()))?;
        let commission = order.commission();
        let new_balance = worker_accounts::adjust_balance(worker_id, -commission, &mut tx)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(worker_id.to_string()))?;
        let note = format!("Commission at rate {} on {}", order.commission_rate, order.total_price);
        let entry = NewLedgerEntry::new(LedgerEntryType::CommissionDue, -commission, worker_id)
            .for_order(order.order_id.clone())
            .with_note(note);
        ledger::insert_entry(entry, &mut tx).await?;
        let discount = (order.discount_amount > Money::default()).then_some(order.discount_amount);
        if let Some(discount) = discount {
            let mut entry = NewLedgerEntry::new(LedgerEntryType::DiscountCost, -discount, order.user_id.as_str())
                .for_order(order.order_id.clone());
            if let Some(code) = order.coupon_code.as_deref() {
                entry = entry.with_note(format!("Coupon {code}"));
                coupons::increment_used_count(code, &mut tx).await?;
            }
            ledger::insert_entry(entry, &mut tx).await?;
        }
        orders::mark_commission_posted(&order.order_id, &mut tx).await?;
        tx.commit().await?;
        info!(
            "💰️ Posted {commission} commission against {worker_id} for order {}. New balance: {new_balance}",
            order.order_id
        );
        Ok(Some(CompletionReceipt {
            order_id: order.order_id.clone(),
            worker_id: worker_id.to_string(),
            commission,
            discount,
            new_balance,
        }))
    }

    async fn settle_balance_once(&self, worker_id: &str, amount: Money, note: &str) -> Result<Money, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let new_balance = worker_accounts::adjust_balance(worker_id, amount, &mut tx)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(worker_id.to_string()))?;
        let entry = NewLedgerEntry::new(LedgerEntryType::CommissionPayment, amount, worker_id).with_note(note);
        ledger::insert_entry(entry, &mut tx).await?;
        tx.commit().await?;
        Ok(new_balance)
    }

    async fn payout_once(&self, worker_id: &str, amount: Money, note: &str) -> Result<Money, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let account = worker_accounts::fetch_worker_account(worker_id, &mut tx)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(worker_id.to_string()))?;
        if amount > account.payout_balance {
            return Err(LedgerError::InsufficientBalance {
                available: account.payout_balance,
                requested: amount,
            });
        }
        let new_balance = worker_accounts::adjust_balance(worker_id, -amount, &mut tx)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(worker_id.to_string()))?;
        let entry = NewLedgerEntry::new(LedgerEntryType::Payout, -amount, worker_id).with_note(note);
        ledger::insert_entry(entry, &mut tx).await?;
        tx.commit().await?;
        Ok(new_balance)
    }
}

/// Retries a balance-affecting operation a bounded number of times when SQLite reports a lock conflict.
macro_rules! with_retries {
    ($op:expr) => {{
        let mut attempt = 0u32;
        loop {
            match $op {
                Err(e) if e.is_retryable() && attempt < MAX_TX_RETRIES => {
                    attempt += 1;
                    warn!("🗃️ Transaction conflict ({e}). Retrying, attempt {attempt} of {MAX_TX_RETRIES}.");
                },
                other => break other,
            }
        }
    }};
}

impl LedgerDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Inserts or updates the mirror row for the given order document in a single transaction.
    async fn upsert_order(&self, doc: OrderDoc) -> Result<(Order, bool), LedgerError> {
        let mut tx = self.pool.begin().await?;
        let (order, inserted) = orders::upsert_order(doc, &mut tx).await?;
        tx.commit().await?;
        if inserted {
            debug!("🗃️ Order {} has been saved in the DB with id {}", order.order_id, order.id);
        } else {
            debug!("🗃️ Order {} has been updated in the DB", order.order_id);
        }
        Ok((order, inserted))
    }

    /// Posts the ledger entries for a completed cash order in a single atomic transaction:
    /// * If the commission for this order has already been posted, nothing is done and `None` is returned.
    /// * The worker's payout balance is debited by the commission on the order.
    /// * A `CommissionDue` entry is written against the worker, and a `DiscountCost` entry against the patient when
    ///   a discount was applied (bumping the coupon's usage counter if a code is attached).
    /// * The order is marked as posted, so redeliveries of the same completion are no-ops.
    async fn post_cash_completion(&self, order: &Order) -> Result<Option<CompletionReceipt>, LedgerError> {
        with_retries!(self.post_cash_completion_once(order).await)
    }

    async fn settle_balance(&self, worker_id: &str, amount: Money, note: &str) -> Result<Money, LedgerError> {
        let new_balance = with_retries!(self.settle_balance_once(worker_id, amount, note).await)?;
        info!("💳️ Settled {amount} against {worker_id}. New balance: {new_balance}");
        Ok(new_balance)
    }

    async fn payout(&self, worker_id: &str, amount: Money, note: &str) -> Result<Money, LedgerError> {
        let new_balance = with_retries!(self.payout_once(worker_id, amount, note).await)?;
        info!("💳️ Paid out {amount} to {worker_id}. New balance: {new_balance}");
        Ok(new_balance)
    }

    /// Latches the `can_cancel_after_accept` flag on every accepted order whose cancellation window has opened.
    async fn open_cancellation_windows(&self, now: DateTime<Utc>) -> Result<Vec<OrderId>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let opened = sweeps::open_cancellation_windows(now, &mut conn).await?;
        if !opened.is_empty() {
            info!("🗄️ Opened the cancellation window on {} order(s)", opened.len());
        }
        Ok(opened)
    }

    /// Moves one page of stale terminal orders into the archive table. The copy commits before the delete, so a
    /// crash between the two leaves duplicates in the archive rather than losing rows.
    async fn archive_stale_orders(&self, cutoff: DateTime<Utc>, limit: u32) -> Result<ArchiveSweepResult, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let ids = sweeps::stale_order_ids(cutoff, limit, &mut tx).await?;
        if ids.is_empty() {
            return Ok(ArchiveSweepResult::default());
        }
        let copied = sweeps::copy_to_archive(&ids, &mut tx).await?;
        tx.commit().await?;
        let mut tx = self.pool.begin().await?;
        let deleted = sweeps::delete_orders(&ids, &mut tx).await?;
        tx.commit().await?;
        info!("🗄️ Archived {copied} order(s), deleted {deleted} from the live table");
        Ok(ArchiveSweepResult { archived: ids })
    }

    async fn close(&mut self) -> Result<(), LedgerError> {
        self.pool.close().await;
        Ok(())
    }
}

impl AccountManagement for SqliteDatabase {
    async fn fetch_worker_account(&self, worker_id: &str) -> Result<Option<WorkerAccount>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        worker_accounts::fetch_worker_account(worker_id, &mut conn).await
    }

    async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_order_id(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_ledger_entries(&self, user_id: &str) -> Result<Vec<LedgerEntry>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        ledger::entries_for_user(user_id, &mut conn).await
    }

    async fn fetch_coupon(&self, code: &str) -> Result<Option<Coupon>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        coupons::fetch_coupon(code, &mut conn).await
    }

    async fn fetch_push_token(&self, user_id: &str) -> Result<Option<String>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        push_tokens::fetch_push_token(user_id, &mut conn).await
    }

    async fn register_worker_account(
        &self,
        worker_id: &str,
        fcm_token: Option<String>,
    ) -> Result<WorkerAccount, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let account = worker_accounts::register_worker_account(worker_id, fcm_token, &mut conn).await?;
        debug!("🧑️ Worker account {worker_id} registered");
        Ok(account)
    }

    async fn set_push_token(&self, user_id: &str, token: &str) -> Result<(), AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        push_tokens::set_push_token(user_id, token, &mut conn).await
    }

    async fn upsert_coupon(&self, code: &str) -> Result<(), AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        coupons::upsert_coupon(code, &mut conn).await
    }
}
