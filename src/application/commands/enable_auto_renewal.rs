//! EnableAutoRenewalHandler - resumes automatic billing for a user.

use std::sync::Arc;

use crate::application::payments::PaymentManager;
use crate::domain::foundation::{DomainError, ErrorCode, UserId};
use crate::ports::SubscriptionRepository;

/// Turns auto-renewal back on for the user's operative subscription, at
/// the provider first, then locally.
pub struct EnableAutoRenewalHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    payments: Arc<PaymentManager>,
}

impl EnableAutoRenewalHandler {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        payments: Arc<PaymentManager>,
    ) -> Self {
        Self {
            subscriptions,
            payments,
        }
    }

    pub async fn handle(&self, user_id: UserId) -> Result<(), DomainError> {
        let mut subscription = self
            .subscriptions
            .find_active_for_user(&user_id)
            .await?
            .ok_or_else(|| DomainError::subscription_not_found(user_id))?;

        let provider_subscription_id = subscription
            .provider_subscription_id
            .clone()
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::BadRequest,
                    "Subscription has no provider linkage yet",
                )
            })?;

        self.payments
            .enable_auto_renewal(subscription.provider, &provider_subscription_id)
            .await
            .map_err(DomainError::from)?;

        subscription.set_auto_renewal(true);
        self.subscriptions.update(&subscription).await?;

        tracing::info!(
            subscription = %subscription.id,
            user = %user_id,
            "auto-renewal enabled"
        );

        Ok(())
    }
}
