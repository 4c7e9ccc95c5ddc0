//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `SubscriptionRepository` - Subscription aggregate persistence
//! - `TransactionRepository` - Append-only payment ledger
//! - `ProviderGateway` - Payment provider API access, provider-agnostic
//! - `NotificationGateway` - Fire-and-forget pushes to the upstream gateway
//! - `WebhookEventRepository` - Webhook delivery idempotency tracking

mod notification_gateway;
mod provider_gateway;
mod subscription_repository;
mod transaction_repository;
mod webhook_event_repository;

pub use notification_gateway::NotificationGateway;
pub use provider_gateway::{
    CreateSubscriptionRequest, PaymentError, PaymentErrorCode, ProviderCheckout,
    ProviderGateway, ProviderSubscription,
};
pub use subscription_repository::SubscriptionRepository;
pub use transaction_repository::{TransactionPage, TransactionRepository};
pub use webhook_event_repository::{
    EventOutcome, SaveResult, WebhookEventRecord, WebhookEventRepository,
};
