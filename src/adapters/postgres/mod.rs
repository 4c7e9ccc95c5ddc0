//! PostgreSQL adapter implementations (sqlx).

mod subscription_repository;
mod transaction_repository;
mod webhook_event_repository;

pub use subscription_repository::PostgresSubscriptionRepository;
pub use transaction_repository::PostgresTransactionRepository;
pub use webhook_event_repository::PostgresWebhookEventRepository;
