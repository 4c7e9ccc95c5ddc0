//! Handler for successful billing charges.

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

use super::{payment_subscription_id, payment_time, transition_by_provider_id, unix_field};

const EVENT_TYPES: &[&str] = &["PAYMENT.SALE.COMPLETED", "invoice.payment_succeeded"];

/// Applies a successful charge: moves the paid-through window forward,
/// appends a `Succeeded` ledger row, and forwards the new end date.
pub struct PaymentSucceededHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    transactions: Arc<dyn TransactionRepository>,
    payments: Arc<PaymentManager>,
    notifier: Arc<dyn NotificationGateway>,
}

impl PaymentSucceededHandler {
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

    /// Resolves the end of the period this charge pays for.
    ///
    /// Sale events don't carry the next billing time, so the extended
    /// subscription details are fetched from the provider; a failed fetch
    /// fails this invocation and the provider redelivers.
    async fn resolve_period_end(
        &self,
        event: &ProviderEvent,
        subscription: &Subscription,
        provider_subscription_id: &str,
        paid_at: Timestamp,
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
            .unwrap_or_else(|| paid_at.add_days(subscription.plan.period_days())))
    }
}

#[async_trait]
impl EventHandler for PaymentSucceededHandler {
    fn event_types(&self) -> &'static [&'static str] {
        EVENT_TYPES
    }

    async fn handle(&self, event: &ProviderEvent) -> Result<(), WebhookError> {
        let provider_subscription_id = payment_subscription_id(event)?;
        let paid_at = payment_time(event)?;

        let subscription = self
            .subscriptions
            .find_by_provider_subscription_id(&provider_subscription_id)
            .await?
            .ok_or_else(|| {
                WebhookError::SubscriptionNotFound(provider_subscription_id.clone())
            })?;

        let period_end = self
            .resolve_period_end(event, &subscription, &provider_subscription_id, paid_at)
            .await?;

        let updated =
            transition_by_provider_id(&self.subscriptions, &provider_subscription_id, |sub| {
                sub.record_payment(paid_at, period_end)
                    .map_err(WebhookError::from)
            })
            .await?;

        let entry =
            PaymentTransaction::record(&updated, TransactionStatus::Succeeded, paid_at, period_end);
        self.transactions.append(&entry).await?;

        self.notifier
            .push_end_date(updated.user_id, updated.end_date)
            .await;

        Ok(())
    }
}
