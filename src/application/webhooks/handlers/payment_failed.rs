//! Handler for failed billing charges.

use std::sync::Arc;

use async_trait::async_trait;

use crate::application::payments::PaymentManager;
use crate::application::webhooks::EventHandler;
use crate::domain::foundation::Timestamp;
use crate::domain::subscription::{
    PaymentTransaction, ProviderKind, Subscription, TransactionStatus,
};
use crate::domain::webhook::{ProviderEvent, WebhookError};
use crate::ports::{NotificationGateway, SubscriptionRepository, TransactionRepository};

use super::{payment_time, str_field, transition_by_provider_id, unix_field};

const EVENT_TYPES: &[&str] = &["BILLING.SUBSCRIPTION.PAYMENT.FAILED", "invoice.payment_failed"];

/// Applies a failed charge.
///
/// The paid-through window still follows the provider's period data that
/// accompanied the failure, a `Failed` ledger row is appended, and the
/// status is left alone: cancellation only comes from deliberate user
/// action or the expiration sweep.
pub struct PaymentFailedHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    transactions: Arc<dyn TransactionRepository>,
    payments: Arc<PaymentManager>,
    notifier: Arc<dyn NotificationGateway>,
}

impl PaymentFailedHandler {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        transactions: Arc<dyn TransactionRepository>,
        payments: Arc<PaymentManager>,
        notifier: Arc<dyn NotificationGateway>,
    ) -> Self {
        Self {
            subscriptions,
            transactions,
            payments,
            notifier,
        }
    }

    async fn resolve_period_end(
        &self,
        event: &ProviderEvent,
        subscription: &Subscription,
        provider_subscription_id: &str,
        failed_at: Timestamp,
    ) -> Result<Timestamp, WebhookError> {
        if event.provider == ProviderKind::Stripe {
            if let Some(end) = unix_field(&event.resource, "period_end") {
                return Ok(end);
            }
        }

        let details = self
            .payments
            .fetch_subscription(event.provider, provider_subscription_id)
            .await
            .map_err(|e| WebhookError::Provider(e.to_string()))?;

        Ok(details
            .next_billing_time
            .unwrap_or_else(|| failed_at.add_days(subscription.plan.period_days())))
    }
}

#[async_trait]
impl EventHandler for PaymentFailedHandler {
    fn event_types(&self) -> &'static [&'static str] {
        EVENT_TYPES
    }

    async fn handle(&self, event: &ProviderEvent) -> Result<(), WebhookError> {
        // The failed-payment resource is the subscription itself for one
        // provider and the invoice for the other.
        let provider_subscription_id = match event.provider {
            ProviderKind::Paypal => str_field(&event.resource, "id")?.to_string(),
            ProviderKind::Stripe => str_field(&event.resource, "subscription")?.to_string(),
        };
        let failed_at = payment_time(event)?;

        let subscription = self
            .subscriptions
            .find_by_provider_subscription_id(&provider_subscription_id)
            .await?
            .ok_or_else(|| {
                WebhookError::SubscriptionNotFound(provider_subscription_id.clone())
            })?;

        let period_end = self
            .resolve_period_end(event, &subscription, &provider_subscription_id, failed_at)
            .await?;

        let updated =
            transition_by_provider_id(&self.subscriptions, &provider_subscription_id, |sub| {
                sub.record_payment_failure(failed_at, period_end);
                Ok(())
            })
            .await?;

        let entry =
            PaymentTransaction::record(&updated, TransactionStatus::Failed, failed_at, period_end);
        self.transactions.append(&entry).await?;

        self.notifier
            .push_end_date(updated.user_id, updated.end_date)
            .await;

        Ok(())
    }
}
