//! # Care Payment Server
//! This crate hosts the HTTP surface for the care payment engine. It is responsible for:
//! * Receiving the webhook-style triggers from the upstream store relay (order created, order updated, chat
//!   message, worker registration, push-token refresh, coupon creation).
//! * Exposing the manual admin ledger endpoints (settle, payout, history).
//! * Running the periodic maintenance sweeps (cancellation-window opener and order archival).
//! * Delivering push notifications over FCM from the engine's post-commit event hooks.
//!
//! ## Configuration
//! The server is configured via `CPG_`-prefixed environment variables. See [config](config/index.html) for
//! more information.
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/ledger/*`: The manual ledger adjustments, admin API key required.
//! * `/incoming/*`: The trigger surface, service API key required.

pub mod auth;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod integrations;
pub mod routes;
pub mod server;
pub mod sweep_worker;

#[cfg(test)]
mod endpoint_tests;
