//! CreateSubscriptionHandler - starts a new subscription for a user.

use std::sync::Arc;

use crate::application::payments::PaymentManager;
use crate::domain::foundation::{DomainError, SubscriptionId, UserId};
use crate::domain::subscription::{PlanKind, ProviderKind, Subscription};
use crate::ports::{CreateSubscriptionRequest, SubscriptionRepository};

/// Command to create a subscription.
#[derive(Debug, Clone)]
pub struct CreateSubscriptionCommand {
    pub user_id: UserId,
    pub username: String,
    pub provider: ProviderKind,
    pub plan: PlanKind,
    pub success_url: String,
    pub cancel_url: String,
}

/// Result of creating a subscription.
#[derive(Debug, Clone)]
pub struct CreateSubscriptionResult {
    pub subscription_id: SubscriptionId,
    /// URL the user must visit to approve billing, when the provider
    /// issues one.
    pub approval_url: Option<String>,
}

/// Creates the local `Pending` row and requests the subscription at the
/// provider. All later lifecycle changes come from webhook events or the
/// expiration sweep.
pub struct CreateSubscriptionHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    payments: Arc<PaymentManager>,
}

impl CreateSubscriptionHandler {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        payments: Arc<PaymentManager>,
    ) -> Self {
        Self {
            subscriptions,
            payments,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateSubscriptionCommand,
    ) -> Result<CreateSubscriptionResult, DomainError> {
        let mut subscription = Subscription::create(
            cmd.user_id,
            cmd.username.clone(),
            cmd.provider,
            cmd.plan,
        );

        let checkout = self
            .payments
            .create_auto_payment(
                cmd.provider,
                CreateSubscriptionRequest {
                    reference_id: subscription.id,
                    user_id: cmd.user_id,
                    username: cmd.username,
                    plan: cmd.plan,
                    success_url: cmd.success_url,
                    cancel_url: cmd.cancel_url,
                },
            )
            .await
            .map_err(DomainError::from)?;

        if let Some(provider_subscription_id) = checkout.provider_subscription_id {
            subscription.link_provider(provider_subscription_id, None);
        }

        self.subscriptions.save(&subscription).await?;

        tracing::info!(
            subscription = %subscription.id,
            user = %subscription.user_id,
            provider = %subscription.provider,
            plan = %subscription.plan,
            "subscription created"
        );

        Ok(CreateSubscriptionResult {
            subscription_id: subscription.id,
            approval_url: checkout.approval_url,
        })
    }
}
