//! Webhook event idempotency store.
//!
//! Providers deliver events at-least-once; this store records every
//! processed provider event id so re-deliveries short-circuit instead of
//! being applied twice.
//!
//! # Race Condition Handling
//!
//! When the same event is delivered concurrently, the first `save` wins
//! (a primary-key constraint on the event id); later writers observe
//! `AlreadyExists` and acknowledge without re-applying.

use crate::domain::foundation::{DomainError, Timestamp};
use crate::domain::subscription::ProviderKind;
use async_trait::async_trait;

/// How a recorded event was concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// A handler applied the event.
    Processed,
    /// No handler is registered for the event kind.
    Ignored,
    /// The handler failed; the record keeps the failure visible but the
    /// provider's redelivery will process it fresh (failed records are
    /// not deduplicated).
    Failed,
}

impl EventOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventOutcome::Processed => "processed",
            EventOutcome::Ignored => "ignored",
            EventOutcome::Failed => "failed",
        }
    }
}

/// Record of one processed webhook event.
#[derive(Debug, Clone)]
pub struct WebhookEventRecord {
    /// Provider's unique event id.
    pub event_id: String,

    /// Raw event-type discriminant.
    pub event_type: String,

    /// Provider that pushed the event.
    pub provider: ProviderKind,

    /// How processing concluded.
    pub outcome: EventOutcome,

    /// Failure detail, for `Failed` outcomes.
    pub error: Option<String>,

    /// When the event was processed.
    pub processed_at: Timestamp,
}

impl WebhookEventRecord {
    pub fn processed(event_id: &str, event_type: &str, provider: ProviderKind) -> Self {
        Self {
            event_id: event_id.to_string(),
            event_type: event_type.to_string(),
            provider,
            outcome: EventOutcome::Processed,
            error: None,
            processed_at: Timestamp::now(),
        }
    }

    pub fn ignored(event_id: &str, event_type: &str, provider: ProviderKind) -> Self {
        Self {
            event_id: event_id.to_string(),
            event_type: event_type.to_string(),
            provider,
            outcome: EventOutcome::Ignored,
            error: None,
            processed_at: Timestamp::now(),
        }
    }
}

/// Result of saving a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveResult {
    /// This writer recorded the event first.
    Inserted,
    /// Another delivery already recorded this event id.
    AlreadyExists,
}

/// Repository port for webhook event idempotency tracking.
#[async_trait]
pub trait WebhookEventRepository: Send + Sync {
    /// Look up a record by provider event id.
    async fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<WebhookEventRecord>, DomainError>;

    /// Save a record. Returns `AlreadyExists` instead of failing when the
    /// event id was recorded concurrently.
    async fn save(&self, record: WebhookEventRecord) -> Result<SaveResult, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn webhook_event_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn WebhookEventRepository) {}
    }

    #[test]
    fn record_constructors_set_outcome() {
        let rec = WebhookEventRecord::processed("WH-1", "PAYMENT.SALE.COMPLETED", ProviderKind::Paypal);
        assert_eq!(rec.outcome, EventOutcome::Processed);
        assert!(rec.error.is_none());

        let rec = WebhookEventRecord::ignored("evt_1", "product.created", ProviderKind::Stripe);
        assert_eq!(rec.outcome, EventOutcome::Ignored);
    }

    #[test]
    fn outcome_strings_are_stable() {
        assert_eq!(EventOutcome::Processed.as_str(), "processed");
        assert_eq!(EventOutcome::Ignored.as_str(), "ignored");
        assert_eq!(EventOutcome::Failed.as_str(), "failed");
    }
}
