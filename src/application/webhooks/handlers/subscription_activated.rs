//! Handler for provider-side subscription activation confirmations.

use std::sync::Arc;

use async_trait::async_trait;

use crate::application::payments::PaymentManager;
use crate::application::webhooks::EventHandler;
use crate::domain::subscription::SubscriptionStatus;
use crate::domain::webhook::{ProviderEvent, WebhookError};
use crate::ports::{NotificationGateway, SubscriptionRepository};

use super::{str_field, transition_by_provider_id};

const EVENT_TYPES: &[&str] = &["BILLING.SUBSCRIPTION.ACTIVATED", "customer.subscription.updated"];

/// Refreshes the billing-period end date and customer id when the provider
/// confirms a subscription is (back) in force.
pub struct SubscriptionActivatedHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    payments: Arc<PaymentManager>,
    notifier: Arc<dyn NotificationGateway>,
}

impl SubscriptionActivatedHandler {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        payments: Arc<PaymentManager>,
        notifier: Arc<dyn NotificationGateway>,
    ) -> Self {
        Self {
            subscriptions,
            payments,
            notifier,
        }
    }
}

#[async_trait]
impl EventHandler for SubscriptionActivatedHandler {
    fn event_types(&self) -> &'static [&'static str] {
        EVENT_TYPES
    }

    async fn handle(&self, event: &ProviderEvent) -> Result<(), WebhookError> {
        let provider_subscription_id = str_field(&event.resource, "id")?.to_string();

        // Event payloads don't carry the next billing date reliably; ask the
        // provider for the authoritative value.
        let details = self
            .payments
            .fetch_subscription(event.provider, &provider_subscription_id)
            .await
            .map_err(|e| WebhookError::Provider(e.to_string()))?;

        let updated =
            transition_by_provider_id(&self.subscriptions, &provider_subscription_id, |sub| {
                if sub.status == SubscriptionStatus::Canceled {
                    return Err(WebhookError::Ignored(
                        "subscription already canceled".to_string(),
                    ));
                }
                sub.refresh_billing(details.next_billing_time, details.customer_id.clone())
                    .map_err(WebhookError::from)
            })
            .await?;

        self.notifier
            .push_end_date(updated.user_id, updated.end_date)
            .await;

        Ok(())
    }
}
