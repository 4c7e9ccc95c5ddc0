//! CancelSubscriptionHandler - user-initiated cancellation.

use std::sync::Arc;

use crate::application::payments::PaymentManager;
use crate::domain::foundation::{DomainError, Timestamp, UserId};
use crate::ports::{NotificationGateway, SubscriptionRepository};

/// Cancels the user's operative subscription at the provider and applies
/// the cancellation transition locally. Access continues through any
/// window the user already paid for.
pub struct CancelSubscriptionHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    payments: Arc<PaymentManager>,
    notifier: Arc<dyn NotificationGateway>,
}

impl CancelSubscriptionHandler {
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

    pub async fn handle(&self, user_id: UserId) -> Result<(), DomainError> {
        let mut subscription = self
            .subscriptions
            .find_active_for_user(&user_id)
            .await?
            .ok_or_else(|| DomainError::subscription_not_found(user_id))?;

        if let Some(provider_subscription_id) = subscription.provider_subscription_id.clone() {
            self.payments
                .cancel_subscription(
                    subscription.provider,
                    &provider_subscription_id,
                    "canceled by user",
                )
                .await
                .map_err(DomainError::from)?;
        }

        subscription.cancel_at_provider(Timestamp::now())?;
        self.subscriptions.update(&subscription).await?;

        self.notifier
            .push_end_date(subscription.user_id, subscription.end_date)
            .await;

        tracing::info!(
            subscription = %subscription.id,
            user = %user_id,
            "subscription canceled by user"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{
        InMemorySubscriptionRepository, RecordingNotifier, StubProviderGateway,
    };
    use crate::domain::subscription::{PlanKind, ProviderKind, Subscription, SubscriptionStatus};

    #[tokio::test]
    async fn cancel_keeps_paid_window_but_clears_operative_flag() {
        let repo = Arc::new(InMemorySubscriptionRepository::new());
        let paypal = Arc::new(StubProviderGateway::new(ProviderKind::Paypal));
        let stripe = Arc::new(StubProviderGateway::new(ProviderKind::Stripe));
        let manager = Arc::new(PaymentManager::new(stripe, paypal));
        let notifier = Arc::new(RecordingNotifier::new());

        let user_id = UserId::new();
        let mut sub = Subscription::create(
            user_id,
            "grace".to_string(),
            ProviderKind::Paypal,
            PlanKind::Monthly,
        );
        sub.link_provider("I-22", None);
        sub.activate(Some(Timestamp::now()), Timestamp::now().add_days(20))
            .unwrap();
        repo.save(&sub).await.unwrap();

        let handler = CancelSubscriptionHandler::new(repo.clone(), manager, notifier.clone());
        handler.handle(user_id).await.unwrap();

        let stored = repo.find_by_id(&sub.id).await.unwrap().unwrap();
        assert_eq!(stored.status, SubscriptionStatus::Active);
        assert!(!stored.is_active);
        assert!(!stored.auto_renewal);
        assert_eq!(notifier.pushes().len(), 1);
    }
}
