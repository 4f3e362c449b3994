//! Care Payment Engine
//!
//! The Care Payment Engine keeps the financial books for a home-nursing platform that collects cash in person.
//! This library contains the core logic for the engine. It is transport-agnostic.
//!
//! The library is divided into three main sections:
//! 1. Database management and control ([`mod@sqlite`]). SQLite is the supported backend. You should never need to
//!    access the database directly. Instead, use the public API provided by the engine. The exception is the data
//!    types used in the database. These are defined in the `db_types` module and are public.
//! 2. The engine public API ([`mod@cpe_api`]). This provides the public-facing functionality of the engine:
//!    mirroring order snapshots, posting commission and discount ledger entries when a cash order completes,
//!    the manual balance adjustments, and the maintenance sweeps. Specific backends need to implement the traits
//!    in the [`mod@traits`] module in order to act as a backend for the Care Payment Server.
//! 3. Transition detection and notification fan-out ([`mod@transitions`], [`mod@dispatch`]). Every accepted order
//!    snapshot is diffed against its predecessor, and the resulting transitions drive both the ledger postings
//!    and the push notifications.
//!
//! The engine also provides a set of events that can be subscribed to. These events are emitted strictly after
//! the corresponding database transaction commits, so a subscriber never observes a transition whose ledger
//! side effects could still roll back. A simple actor framework is used so that you can easily hook into these
//! events and perform custom actions.
pub mod cpe_api;
pub mod db_types;
pub mod dispatch;
pub mod events;
mod sqlite;
pub mod traits;
pub mod transitions;

pub use cpe_api::{AccountApi, LedgerApi, OrderFlowApi, OrderUpdateOutcome};
pub use sqlite::{SqliteDatabase, MIGRATOR};
pub use traits::{AccountManagement, LedgerDatabase, LedgerError, PushTransport};
