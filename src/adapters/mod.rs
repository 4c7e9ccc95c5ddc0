//! Adapters - Implementations of ports against the outside world.
//!
//! - `gateway` - Notification forwarder to the upstream gateway service
//! - `http` - axum webhook endpoints and internal RPC surface
//! - `memory` - In-memory repositories for tests and local development
//! - `paypal` - Wallet provider gateway and webhook verifier
//! - `postgres` - sqlx repository implementations
//! - `stripe` - Card provider gateway and webhook verifier

pub mod gateway;
pub mod http;
pub mod memory;
pub mod paypal;
pub mod postgres;
pub mod stripe;
