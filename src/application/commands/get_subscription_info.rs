//! GetSubscriptionInfoHandler - current subscription details for a user.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::foundation::{DomainError, SubscriptionId, Timestamp, UserId};
use crate::domain::subscription::{PlanKind, ProviderKind, SubscriptionStatus};
use crate::ports::SubscriptionRepository;

/// User-facing view of the operative subscription.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionInfo {
    pub subscription_id: SubscriptionId,
    pub provider: ProviderKind,
    pub plan: PlanKind,
    pub status: SubscriptionStatus,
    pub auto_renewal: bool,
    pub date_of_payment: Option<Timestamp>,
    pub end_date: Option<Timestamp>,
}

/// Looks up the user's operative subscription.
pub struct GetSubscriptionInfoHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
}

impl GetSubscriptionInfoHandler {
    pub fn new(subscriptions: Arc<dyn SubscriptionRepository>) -> Self {
        Self { subscriptions }
    }

    pub async fn handle(&self, user_id: UserId) -> Result<SubscriptionInfo, DomainError> {
        let subscription = self
            .subscriptions
            .find_active_for_user(&user_id)
            .await?
            .ok_or_else(|| DomainError::subscription_not_found(user_id))?;

        Ok(SubscriptionInfo {
            subscription_id: subscription.id,
            provider: subscription.provider,
            plan: subscription.plan,
            status: subscription.status,
            auto_renewal: subscription.auto_renewal,
            date_of_payment: subscription.date_of_payment,
            end_date: subscription.end_date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemorySubscriptionRepository;
    use crate::domain::foundation::ErrorCode;
    use crate::domain::subscription::Subscription;

    #[tokio::test]
    async fn returns_operative_subscription_details() {
        let repo = Arc::new(InMemorySubscriptionRepository::new());
        let user_id = UserId::new();
        let mut sub = Subscription::create(
            user_id,
            "ivan".to_string(),
            ProviderKind::Stripe,
            PlanKind::Monthly,
        );
        let end = Timestamp::now().add_days(30);
        sub.activate(Some(Timestamp::now()), end).unwrap();
        repo.save(&sub).await.unwrap();

        let handler = GetSubscriptionInfoHandler::new(repo);
        let info = handler.handle(user_id).await.unwrap();

        assert_eq!(info.subscription_id, sub.id);
        assert_eq!(info.status, SubscriptionStatus::Active);
        assert_eq!(info.end_date, Some(end));
    }

    #[tokio::test]
    async fn no_operative_subscription_is_not_found() {
        let repo = Arc::new(InMemorySubscriptionRepository::new());
        let handler = GetSubscriptionInfoHandler::new(repo);

        let result = handler.handle(UserId::new()).await;

        assert!(matches!(
            result,
            Err(ref e) if e.code == ErrorCode::SubscriptionNotFound
        ));
    }
}
