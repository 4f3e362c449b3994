//! The public-facing engine APIs.
//!
//! * [`OrderFlowApi`] handles the trigger surface: order created/updated snapshots, chat messages, and the
//!   periodic maintenance sweeps. It runs the transition detector, drives ledger postings, and publishes
//!   events to the hook subscribers strictly after commit.
//! * [`LedgerApi`] wraps the two manual admin adjustments with the authorisation checks.
//! * [`AccountApi`] is the read-only query surface.
pub mod accounts_api;
pub mod ledger_api;
pub mod order_flow_api;

pub use accounts_api::AccountApi;
pub use ledger_api::LedgerApi;
pub use order_flow_api::{OrderFlowApi, OrderUpdateOutcome};
