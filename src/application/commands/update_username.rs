//! UpdateUsernameHandler - keeps the denormalized username in sync.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, UserId, ValidationError};
use crate::ports::SubscriptionRepository;

/// Propagates a username change from the gateway service onto all of the
/// user's subscriptions.
pub struct UpdateUsernameHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
}

impl UpdateUsernameHandler {
    pub fn new(subscriptions: Arc<dyn SubscriptionRepository>) -> Self {
        Self { subscriptions }
    }

    pub async fn handle(&self, user_id: UserId, username: &str) -> Result<u64, DomainError> {
        if username.trim().is_empty() {
            return Err(DomainError::validation(
                "username",
                ValidationError::empty_field("username").to_string(),
            ));
        }

        let updated = self
            .subscriptions
            .update_username(&user_id, username)
            .await?;

        tracing::debug!(user = %user_id, rows = updated, "username propagated");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemorySubscriptionRepository;
    use crate::domain::subscription::{PlanKind, ProviderKind, Subscription};

    #[tokio::test]
    async fn updates_all_subscriptions_of_the_user() {
        let repo = Arc::new(InMemorySubscriptionRepository::new());
        let user_id = UserId::new();
        for _ in 0..2 {
            let sub = Subscription::create(
                user_id,
                "old-name".to_string(),
                ProviderKind::Paypal,
                PlanKind::Day,
            );
            repo.save(&sub).await.unwrap();
        }

        let handler = UpdateUsernameHandler::new(repo.clone());
        let updated = handler.handle(user_id, "new-name").await.unwrap();

        assert_eq!(updated, 2);
        for sub in repo.find_by_user(&user_id).await.unwrap() {
            assert_eq!(sub.username, "new-name");
        }
    }

    #[tokio::test]
    async fn rejects_blank_username() {
        let repo = Arc::new(InMemorySubscriptionRepository::new());
        let handler = UpdateUsernameHandler::new(repo);

        let result = handler.handle(UserId::new(), "   ").await;

        assert!(result.is_err());
    }
}
