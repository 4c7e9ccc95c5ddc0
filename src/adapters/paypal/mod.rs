//! Wallet provider adapter: OAuth REST gateway, webhook verifier, wire types.

mod gateway;
pub mod types;
mod verifier;

pub use gateway::PaypalGateway;
pub use types::parse_event;
pub use verifier::{
    PaypalWebhookVerifier, CERT_URL_HEADER, TRANSMISSION_ID_HEADER, TRANSMISSION_SIG_HEADER,
    TRANSMISSION_TIME_HEADER,
};
