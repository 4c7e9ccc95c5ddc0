//! Upstream gateway service adapter.

mod notifier;

pub use notifier::GatewayNotifier;
