use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use cpg_common::{Money, EGP_CURRENCY_CODE};
use log::error;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------        OrderId        -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------      OrderStatus       ------------------------------------------------------
/// The lifecycle status of an order. The upstream store does not enforce a state machine; the engine observes
/// transitions by diffing consecutive snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Newly placed, no worker assigned yet.
    Pending,
    /// A worker accepted the order.
    Accepted,
    /// The worker arrived at the patient.
    Arrived,
    /// The visit is done. Cash orders trigger ledger postings on entry into this state.
    Completed,
    /// Declined by the worker or the platform.
    Rejected,
    /// Cancelled by the patient or an admin.
    Cancelled,
}

impl OrderStatus {
    /// Terminal states are eligible for the archival sweep.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Rejected | OrderStatus::Cancelled)
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "Pending"),
            OrderStatus::Accepted => write!(f, "Accepted"),
            OrderStatus::Arrived => write!(f, "Arrived"),
            OrderStatus::Completed => write!(f, "Completed"),
            OrderStatus::Rejected => write!(f, "Rejected"),
            OrderStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid conversion: {0}")]
pub struct ConversionError(pub String);

impl FromStr for OrderStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Accepted" => Ok(Self::Accepted),
            "Arrived" => Ok(Self::Arrived),
            "Completed" => Ok(Self::Completed),
            "Rejected" => Ok(Self::Rejected),
            "Cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

impl From<String> for OrderStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to Pending");
            OrderStatus::Pending
        })
    }
}

//--------------------------------------     PaymentMethod      ------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// Settled in person; the platform recovers its commission from the worker's payout balance.
    Cash,
    /// Card and wallet payments are settled upstream and carry no ledger postings here.
    Card,
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "Cash"),
            PaymentMethod::Card => write!(f, "Card"),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Cash" => Ok(Self::Cash),
            "Card" => Ok(Self::Card),
            s => Err(ConversionError(format!("Invalid payment method: {s}"))),
        }
    }
}

//--------------------------------------       OrderFlag        ------------------------------------------------------
/// The one-way latch booleans on an order. Each goes false→true at most once in the order's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderFlag {
    NurseMovingConfirmed,
    NurseMovingRequested,
    PatientConfirmedNurseMoving,
    PaymentConfirmedByNurse,
    PaymentConfirmedByPatient,
    CanCancelAfterAccept,
}

impl OrderFlag {
    pub const ALL: [OrderFlag; 6] = [
        OrderFlag::NurseMovingConfirmed,
        OrderFlag::NurseMovingRequested,
        OrderFlag::PatientConfirmedNurseMoving,
        OrderFlag::PaymentConfirmedByNurse,
        OrderFlag::PaymentConfirmedByPatient,
        OrderFlag::CanCancelAfterAccept,
    ];
}

impl Display for OrderFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderFlag::NurseMovingConfirmed => "nurse_moving_confirmed",
            OrderFlag::NurseMovingRequested => "nurse_moving_requested",
            OrderFlag::PatientConfirmedNurseMoving => "patient_confirmed_nurse_moving",
            OrderFlag::PaymentConfirmedByNurse => "payment_confirmed_by_nurse",
            OrderFlag::PaymentConfirmedByPatient => "payment_confirmed_by_patient",
            OrderFlag::CanCancelAfterAccept => "can_cancel_after_accept",
        };
        write!(f, "{s}")
    }
}

//--------------------------------------         Order          ------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_id: OrderId,
    /// The patient who placed the order.
    pub user_id: String,
    /// The worker assigned to the order, if any.
    pub nurse_id: Option<String>,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub total_price: Money,
    pub discount_amount: Money,
    pub final_price: Money,
    /// Platform commission as a fraction of the total price, e.g. 0.15.
    pub commission_rate: f64,
    pub coupon_code: Option<String>,
    pub nurse_moving_confirmed: bool,
    pub nurse_moving_requested: bool,
    pub patient_confirmed_nurse_moving: bool,
    pub payment_confirmed_by_nurse: bool,
    pub payment_confirmed_by_patient: bool,
    pub can_cancel_after_accept: bool,
    /// Set at acceptance time; once it elapses, the sweep latches `can_cancel_after_accept`.
    pub cancellation_available_at: Option<DateTime<Utc>>,
    /// True once the cash-completion ledger posting has committed for this order.
    pub commission_posted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn flag(&self, flag: OrderFlag) -> bool {
        match flag {
            OrderFlag::NurseMovingConfirmed => self.nurse_moving_confirmed,
            OrderFlag::NurseMovingRequested => self.nurse_moving_requested,
            OrderFlag::PatientConfirmedNurseMoving => self.patient_confirmed_nurse_moving,
            OrderFlag::PaymentConfirmedByNurse => self.payment_confirmed_by_nurse,
            OrderFlag::PaymentConfirmedByPatient => self.payment_confirmed_by_patient,
            OrderFlag::CanCancelAfterAccept => self.can_cancel_after_accept,
        }
    }

    pub fn commission(&self) -> Money {
        self.total_price.times_rate(self.commission_rate)
    }
}

//--------------------------------------       OrderDoc         ------------------------------------------------------
/// An order snapshot as delivered by the upstream store trigger. The engine upserts these into its mirror; fields
/// the engine owns (`commission_posted`, row id, timestamps) are not part of the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDoc {
    pub order_id: OrderId,
    pub user_id: String,
    #[serde(default)]
    pub nurse_id: Option<String>,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    /// Unknown or absent amounts default to zero.
    #[serde(default)]
    pub total_price: Money,
    #[serde(default)]
    pub discount_amount: Money,
    #[serde(default)]
    pub final_price: Money,
    #[serde(default)]
    pub commission_rate: f64,
    #[serde(default)]
    pub coupon_code: Option<String>,
    /// Unknown or absent flags default to false.
    #[serde(default)]
    pub nurse_moving_confirmed: bool,
    #[serde(default)]
    pub nurse_moving_requested: bool,
    #[serde(default)]
    pub patient_confirmed_nurse_moving: bool,
    #[serde(default)]
    pub payment_confirmed_by_nurse: bool,
    #[serde(default)]
    pub payment_confirmed_by_patient: bool,
    #[serde(default)]
    pub can_cancel_after_accept: bool,
    #[serde(default)]
    pub cancellation_available_at: Option<DateTime<Utc>>,
}

impl OrderDoc {
    pub fn new<S: Into<String>>(order_id: OrderId, user_id: S, total_price: Money) -> Self {
        Self {
            order_id,
            user_id: user_id.into(),
            nurse_id: None,
            status: OrderStatus::Pending,
            payment_method: PaymentMethod::Cash,
            total_price,
            discount_amount: Money::default(),
            final_price: total_price,
            commission_rate: 0.0,
            coupon_code: None,
            nurse_moving_confirmed: false,
            nurse_moving_requested: false,
            patient_confirmed_nurse_moving: false,
            payment_confirmed_by_nurse: false,
            payment_confirmed_by_patient: false,
            can_cancel_after_accept: false,
            cancellation_available_at: None,
        }
    }

    pub fn with_nurse<S: Into<String>>(mut self, nurse_id: S) -> Self {
        self.nurse_id = Some(nurse_id.into());
        self
    }

    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_commission_rate(mut self, rate: f64) -> Self {
        self.commission_rate = rate;
        self
    }

    pub fn with_discount<S: Into<String>>(mut self, amount: Money, coupon_code: Option<S>) -> Self {
        self.discount_amount = amount;
        self.coupon_code = coupon_code.map(|c| c.into());
        self.final_price = self.total_price - amount;
        self
    }
}

//--------------------------------------     WorkerAccount      ------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct WorkerAccount {
    pub id: i64,
    pub worker_id: String,
    /// Signed running total. Negative means the worker owes the platform.
    pub payout_balance: Money,
    /// Current push-delivery address. May be absent or stale.
    pub fcm_token: Option<String>,
    pub last_payout_update: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------    LedgerEntryType     ------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum LedgerEntryType {
    /// Commission owed to the platform on a cash order. Negative amount.
    CommissionDue,
    /// The platform's cost of a discount applied to the patient's order. Negative amount.
    DiscountCost,
    /// An admin-initiated credit to a worker's balance. Positive amount.
    CommissionPayment,
    /// An admin-initiated withdrawal from a worker's balance. Negative amount.
    Payout,
}

impl Display for LedgerEntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerEntryType::CommissionDue => write!(f, "CommissionDue"),
            LedgerEntryType::DiscountCost => write!(f, "DiscountCost"),
            LedgerEntryType::CommissionPayment => write!(f, "CommissionPayment"),
            LedgerEntryType::Payout => write!(f, "Payout"),
        }
    }
}

impl FromStr for LedgerEntryType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CommissionDue" => Ok(Self::CommissionDue),
            "DiscountCost" => Ok(Self::DiscountCost),
            "CommissionPayment" => Ok(Self::CommissionPayment),
            "Payout" => Ok(Self::Payout),
            s => Err(ConversionError(format!("Invalid ledger entry type: {s}"))),
        }
    }
}

//--------------------------------------      LedgerEntry       ------------------------------------------------------
/// One immutable row in the transaction journal. Written atomically with its balance mutation; an entry is never
/// visible without the matching balance update.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub entry_type: LedgerEntryType,
    pub amount: Money,
    /// Null for manual admin-initiated entries.
    pub order_id: Option<OrderId>,
    /// The balance owner the entry is recorded against.
    pub user_id: String,
    pub status: String,
    pub currency: String,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewLedgerEntry {
    pub entry_type: LedgerEntryType,
    pub amount: Money,
    pub order_id: Option<OrderId>,
    pub user_id: String,
    pub note: Option<String>,
}

impl NewLedgerEntry {
    pub fn new<S: Into<String>>(entry_type: LedgerEntryType, amount: Money, user_id: S) -> Self {
        Self { entry_type, amount, order_id: None, user_id: user_id.into(), note: None }
    }

    pub fn for_order(mut self, order_id: OrderId) -> Self {
        self.order_id = Some(order_id);
        self
    }

    pub fn with_note<S: Into<String>>(mut self, note: S) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn currency(&self) -> &'static str {
        EGP_CURRENCY_CODE
    }
}

//--------------------------------------        Coupon          ------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Coupon {
    pub code: String,
    pub used_count: i64,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------      NewMessage        ------------------------------------------------------
/// A chat message envelope as delivered by the message-created trigger. Dispatch-only; no ledger involvement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMessage {
    pub sender_name: String,
    pub text: String,
    pub recipient_id: String,
}

//--------------------------------------     Role / Caller      ------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// May issue manual ledger adjustments and read any worker's history.
    Admin,
    /// Trusted upstream services delivering store triggers.
    Service,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "Admin"),
            Role::Service => write!(f, "Service"),
        }
    }
}

/// The resolved identity of a caller on the manual ledger endpoints.
#[derive(Debug, Clone)]
pub struct Caller {
    pub id: String,
    pub role: Role,
}

impl Caller {
    pub fn new<S: Into<String>>(id: S, role: Role) -> Self {
        Self { id: id.into(), role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
