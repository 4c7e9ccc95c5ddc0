//! Handler for provider-side subscription cancellation.

use std::sync::Arc;

use async_trait::async_trait;

use crate::application::webhooks::EventHandler;
use crate::domain::foundation::Timestamp;
use crate::domain::webhook::{ProviderEvent, WebhookError};
use crate::ports::{NotificationGateway, SubscriptionRepository};

use super::{str_field, transition_by_provider_id};

const EVENT_TYPES: &[&str] = &["BILLING.SUBSCRIPTION.CANCELLED", "customer.subscription.deleted"];

/// Applies a provider-side cancellation.
///
/// The operative flag drops immediately so the user can start a new
/// subscription; the row only turns `Canceled` once the window the user
/// already paid for has elapsed.
pub struct SubscriptionCancelledHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    notifier: Arc<dyn NotificationGateway>,
}

impl SubscriptionCancelledHandler {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        notifier: Arc<dyn NotificationGateway>,
    ) -> Self {
        Self {
            subscriptions,
            notifier,
        }
    }
}

#[async_trait]
impl EventHandler for SubscriptionCancelledHandler {
    fn event_types(&self) -> &'static [&'static str] {
        EVENT_TYPES
    }

    async fn handle(&self, event: &ProviderEvent) -> Result<(), WebhookError> {
        let provider_subscription_id = str_field(&event.resource, "id")?.to_string();
        let now = Timestamp::now();

        let result =
            transition_by_provider_id(&self.subscriptions, &provider_subscription_id, |sub| {
                sub.cancel_at_provider(now).map_err(WebhookError::from)
            })
            .await;

        let updated = match result {
            Ok(sub) => sub,
            // Duplicate cancellation for a record that is already gone is an
            // expected miss; acknowledge so the provider stops redelivering.
            Err(WebhookError::SubscriptionNotFound(id)) => {
                return Err(WebhookError::Ignored(format!(
                    "no local subscription for {}",
                    id
                )));
            }
            Err(e) => return Err(e),
        };

        self.notifier
            .push_end_date(updated.user_id, updated.end_date)
            .await;

        Ok(())
    }
}
