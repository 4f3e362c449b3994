use std::fmt::Display;

use care_payment_engine::db_types::{LedgerEntry, WorkerAccount};
use cpg_common::Money;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// Body for the manual settle and payout endpoints. Amounts are integer piastres.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustmentRequest {
    pub nurse_id: String,
    pub amount: Money,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub success: bool,
    pub nurse_id: String,
    pub new_balance: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub account: WorkerAccount,
    pub entries: Vec<LedgerEntry>,
}

/// Body for the worker-registered trigger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerRegistration {
    pub worker_id: String,
    #[serde(default)]
    pub fcm_token: Option<String>,
}

/// Body for the push-token refresh trigger. Used by patient devices; worker tokens live on the worker account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushTokenUpdate {
    pub user_id: String,
    pub token: String,
}

/// Body for the coupon-created trigger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouponRegistration {
    pub code: String,
}
