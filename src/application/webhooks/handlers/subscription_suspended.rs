//! Handler for provider-side subscription suspension.

use std::sync::Arc;

use async_trait::async_trait;

use crate::application::webhooks::EventHandler;
use crate::domain::subscription::SubscriptionStatus;
use crate::domain::webhook::{ProviderEvent, WebhookError};
use crate::ports::SubscriptionRepository;

use super::{str_field, transition_by_provider_id};

const EVENT_TYPES: &[&str] = &["BILLING.SUBSCRIPTION.SUSPENDED", "customer.subscription.paused"];

/// Marks the subscription as temporarily paused by the provider.
///
/// Auto-renewal is forced off; the operative flag stays, distinguishing
/// "temporarily paused" from "gone".
pub struct SubscriptionSuspendedHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
}

impl SubscriptionSuspendedHandler {
    pub fn new(subscriptions: Arc<dyn SubscriptionRepository>) -> Self {
        Self { subscriptions }
    }
}

#[async_trait]
impl EventHandler for SubscriptionSuspendedHandler {
    fn event_types(&self) -> &'static [&'static str] {
        EVENT_TYPES
    }

    async fn handle(&self, event: &ProviderEvent) -> Result<(), WebhookError> {
        let provider_subscription_id = str_field(&event.resource, "id")?.to_string();

        transition_by_provider_id(&self.subscriptions, &provider_subscription_id, |sub| {
            match sub.status {
                // Duplicate delivery.
                SubscriptionStatus::Suspended => Ok(()),
                SubscriptionStatus::Canceled => Err(WebhookError::Ignored(
                    "subscription already canceled".to_string(),
                )),
                _ => sub.suspend().map_err(WebhookError::from),
            }
        })
        .await?;

        Ok(())
    }
}
