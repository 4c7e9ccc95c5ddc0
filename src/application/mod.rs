//! Application layer - use-case handlers and orchestration.
//!
//! - `commands` - Internal RPC command handlers
//! - `payments` - Provider-agnostic payment command dispatch
//! - `sweeper` - Scheduled expiration of lapsed subscriptions
//! - `webhooks` - Webhook router and per-event handlers

pub mod commands;
pub mod payments;
pub mod sweeper;
pub mod webhooks;

pub use sweeper::ExpirationSweeper;
