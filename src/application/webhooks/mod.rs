//! Webhook routing and per-event handling.
//!
//! - `router` - Immutable event-type registry with idempotent dispatch
//! - `handlers` - One handler per semantic billing event

pub mod handlers;
mod router;

pub use router::{EventHandler, WebhookOutcome, WebhookRouter, WebhookRouterBuilder};
