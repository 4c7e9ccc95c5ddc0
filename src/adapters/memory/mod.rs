//! In-memory adapter implementations.
//!
//! Back the test suites and local development; the subscription store
//! mirrors the optimistic-versioning semantics of the PostgreSQL adapters.

mod provider_gateway;
mod subscription_repository;
mod transaction_repository;
mod webhook_event_repository;

pub use provider_gateway::{RecordingNotifier, StubProviderGateway};
pub use subscription_repository::InMemorySubscriptionRepository;
pub use transaction_repository::InMemoryTransactionRepository;
pub use webhook_event_repository::InMemoryWebhookEventRepository;
