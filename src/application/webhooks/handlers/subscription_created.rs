//! Handler for provider-side subscription creation / checkout completion.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;

use crate::application::payments::PaymentManager;
use crate::application::webhooks::EventHandler;
use crate::domain::foundation::{SubscriptionId, Timestamp};
use crate::domain::subscription::ProviderKind;
use crate::domain::webhook::{ProviderEvent, WebhookError};
use crate::ports::SubscriptionRepository;

use super::{opt_str_field, str_field, transition_by_id};

const EVENT_TYPES: &[&str] = &["BILLING.SUBSCRIPTION.CREATED", "checkout.session.completed"];

/// Records the provider-side identifiers on the pending subscription.
///
/// This is also the moment any prior operative subscription of the same
/// user is deactivated and its cancellation requested at its provider, so
/// a user never ends up with two subscriptions billing at once.
pub struct SubscriptionCreatedHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    payments: Arc<PaymentManager>,
}

impl SubscriptionCreatedHandler {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        payments: Arc<PaymentManager>,
    ) -> Self {
        Self {
            subscriptions,
            payments,
        }
    }

    /// Our subscription id, passed through to the provider at creation time.
    fn reference_id(event: &ProviderEvent) -> Result<SubscriptionId, WebhookError> {
        let raw = match event.provider {
            ProviderKind::Paypal => str_field(&event.resource, "custom_id")?,
            ProviderKind::Stripe => event
                .resource
                .get("metadata")
                .and_then(|m| m.get("subscription_id"))
                .and_then(|v| v.as_str())
                .ok_or(WebhookError::MissingField("metadata.subscription_id"))?,
        };
        SubscriptionId::from_str(raw)
            .map_err(|e| WebhookError::ParseError(format!("invalid reference id: {}", e)))
    }

    /// The provider's subscription id and customer/payer id.
    fn provider_ids(event: &ProviderEvent) -> Result<(String, Option<String>), WebhookError> {
        match event.provider {
            ProviderKind::Paypal => {
                let id = str_field(&event.resource, "id")?.to_string();
                let payer = event
                    .resource
                    .get("subscriber")
                    .and_then(|s| s.get("payer_id"))
                    .and_then(|v| v.as_str())
                    .map(str::to_string);
                Ok((id, payer))
            }
            ProviderKind::Stripe => {
                let id = str_field(&event.resource, "subscription")?.to_string();
                let customer = opt_str_field(&event.resource, "customer");
                Ok((id, customer))
            }
        }
    }
}

#[async_trait]
impl EventHandler for SubscriptionCreatedHandler {
    fn event_types(&self) -> &'static [&'static str] {
        EVENT_TYPES
    }

    async fn handle(&self, event: &ProviderEvent) -> Result<(), WebhookError> {
        let subscription_id = Self::reference_id(event)?;
        let (provider_subscription_id, customer_id) = Self::provider_ids(event)?;

        let current = self
            .subscriptions
            .find_by_id(&subscription_id)
            .await?
            .ok_or_else(|| WebhookError::SubscriptionNotFound(subscription_id.to_string()))?;

        // At most one operative subscription per user: deactivate the prior
        // one and request its cancellation at its provider.
        if let Some(mut prior) = self
            .subscriptions
            .find_active_for_user(&current.user_id)
            .await?
        {
            if prior.id != current.id {
                prior.deactivate();
                self.subscriptions.update(&prior).await?;

                if let Some(prior_provider_id) = prior.provider_subscription_id.clone() {
                    self.payments
                        .cancel_subscription(
                            prior.provider,
                            &prior_provider_id,
                            "superseded by a new subscription",
                        )
                        .await
                        .map_err(|e| WebhookError::Provider(e.to_string()))?;
                }
            }
        }

        let now = Timestamp::now();
        let first_period_end = now.add_days(current.plan.period_days());
        let provider = event.provider;

        transition_by_id(&self.subscriptions, &subscription_id, |sub| {
            sub.link_provider(provider_subscription_id.clone(), customer_id.clone());
            if provider == ProviderKind::Stripe {
                // Checkout completion implies the first charge went through.
                sub.activate(Some(now), first_period_end)
                    .map_err(WebhookError::from)?;
            }
            Ok(())
        })
        .await?;

        Ok(())
    }
}
