//! Behaviour contracts for engine backends and collaborators.
//!
//! The engine core is written against these traits rather than a concrete store or push network:
//!
//! * [`LedgerDatabase`] is the highest level of behaviour a storage backend must expose: the atomic ledger
//!   postings, the order mirror upserts, and the maintenance sweeps.
//! * [`AccountManagement`] provides the read-side queries for worker accounts, orders, ledger history, coupons
//!   and push addresses.
//! * [`PushTransport`] is the fire-and-forget push delivery seam. Errors at this boundary are logged and
//!   swallowed, never propagated into ledger flows.
mod account_management;
mod data_objects;
mod ledger_database;
mod push_transport;

pub use account_management::{AccountApiError, AccountManagement};
pub use data_objects::{ArchiveSweepResult, CompletionReceipt};
pub use ledger_database::{LedgerDatabase, LedgerError};
pub use push_transport::{PushError, PushNotification, PushPriority, PushTransport};
