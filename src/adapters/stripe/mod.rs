//! Card provider adapter: REST gateway, webhook verifier, wire types.

mod gateway;
pub mod types;
mod verifier;

pub use gateway::StripeGateway;
pub use types::parse_event;
pub use verifier::{SignatureHeader, StripeWebhookVerifier, SIGNATURE_HEADER};
