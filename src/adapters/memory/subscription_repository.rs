//! In-memory SubscriptionRepository.
//!
//! Backs tests and local development. Mirrors the optimistic-versioning
//! semantics of the PostgreSQL implementation: updates only land when the
//! caller's version matches the stored row.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, SubscriptionId, Timestamp, UserId};
use crate::domain::subscription::Subscription;
use crate::ports::SubscriptionRepository;

/// HashMap-backed subscription store with compare-and-swap updates.
#[derive(Default)]
pub struct InMemorySubscriptionRepository {
    rows: Arc<RwLock<HashMap<SubscriptionId, Subscription>>>,
}

impl InMemorySubscriptionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// All stored subscriptions, for test assertions.
    pub async fn all(&self) -> Vec<Subscription> {
        self.rows.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptionRepository {
    async fn save(&self, subscription: &Subscription) -> Result<(), DomainError> {
        let mut rows = self.rows.write().await;
        rows.insert(subscription.id, subscription.clone());
        Ok(())
    }

    async fn update(&self, subscription: &Subscription) -> Result<(), DomainError> {
        let mut rows = self.rows.write().await;
        let stored = rows
            .get_mut(&subscription.id)
            .ok_or_else(|| DomainError::subscription_not_found(subscription.id))?;

        if stored.version != subscription.version {
            return Err(DomainError::version_conflict(subscription.id));
        }

        let mut updated = subscription.clone();
        updated.version += 1;
        *stored = updated;
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &SubscriptionId,
    ) -> Result<Option<Subscription>, DomainError> {
        Ok(self.rows.read().await.get(id).cloned())
    }

    async fn find_by_provider_subscription_id(
        &self,
        provider_subscription_id: &str,
    ) -> Result<Option<Subscription>, DomainError> {
        Ok(self
            .rows
            .read()
            .await
            .values()
            .find(|s| {
                s.provider_subscription_id.as_deref() == Some(provider_subscription_id)
            })
            .cloned())
    }

    async fn find_active_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Subscription>, DomainError> {
        Ok(self
            .rows
            .read()
            .await
            .values()
            .find(|s| s.user_id == *user_id && s.is_active)
            .cloned())
    }

    async fn find_by_user(&self, user_id: &UserId) -> Result<Vec<Subscription>, DomainError> {
        let mut subs: Vec<_> = self
            .rows
            .read()
            .await
            .values()
            .filter(|s| s.user_id == *user_id)
            .cloned()
            .collect();
        subs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(subs)
    }

    async fn find_lapsed(&self, horizon: Timestamp) -> Result<Vec<Subscription>, DomainError> {
        Ok(self
            .rows
            .read()
            .await
            .values()
            .filter(|s| {
                s.status.is_active_like()
                    && s.end_date.map(|end| !end.is_after(&horizon)).unwrap_or(false)
            })
            .cloned()
            .collect())
    }

    async fn update_username(
        &self,
        user_id: &UserId,
        username: &str,
    ) -> Result<u64, DomainError> {
        let mut rows = self.rows.write().await;
        let mut updated = 0;
        for sub in rows.values_mut().filter(|s| s.user_id == *user_id) {
            sub.rename(username);
            sub.version += 1;
            updated += 1;
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::subscription::{PlanKind, ProviderKind};

    fn subscription() -> Subscription {
        Subscription::create(
            UserId::new(),
            "mallory".to_string(),
            ProviderKind::Stripe,
            PlanKind::Monthly,
        )
    }

    #[tokio::test]
    async fn save_and_find_roundtrip() {
        let repo = InMemorySubscriptionRepository::new();
        let sub = subscription();
        repo.save(&sub).await.unwrap();

        let found = repo.find_by_id(&sub.id).await.unwrap();
        assert_eq!(found, Some(sub));
    }

    #[tokio::test]
    async fn update_bumps_version() {
        let repo = InMemorySubscriptionRepository::new();
        let mut sub = subscription();
        repo.save(&sub).await.unwrap();

        sub.rename("renamed");
        repo.update(&sub).await.unwrap();

        let stored = repo.find_by_id(&sub.id).await.unwrap().unwrap();
        assert_eq!(stored.version, sub.version + 1);
        assert_eq!(stored.username, "renamed");
    }

    #[tokio::test]
    async fn stale_update_is_a_version_conflict() {
        let repo = InMemorySubscriptionRepository::new();
        let sub = subscription();
        repo.save(&sub).await.unwrap();

        // Two readers load the same version.
        let mut first = repo.find_by_id(&sub.id).await.unwrap().unwrap();
        let mut second = repo.find_by_id(&sub.id).await.unwrap().unwrap();

        first.rename("first-wins");
        repo.update(&first).await.unwrap();

        second.rename("second-loses");
        let result = repo.update(&second).await;

        assert!(matches!(
            result,
            Err(ref e) if e.code == crate::domain::foundation::ErrorCode::VersionConflict
        ));
    }

    #[tokio::test]
    async fn find_by_provider_subscription_id_matches_linked_rows() {
        let repo = InMemorySubscriptionRepository::new();
        let mut sub = subscription();
        sub.link_provider("sub_42", None);
        repo.save(&sub).await.unwrap();

        let found = repo
            .find_by_provider_subscription_id("sub_42")
            .await
            .unwrap();
        assert_eq!(found.map(|s| s.id), Some(sub.id));

        let missing = repo
            .find_by_provider_subscription_id("sub_unknown")
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn find_lapsed_only_returns_active_like_rows_in_horizon() {
        let repo = InMemorySubscriptionRepository::new();
        let now = Timestamp::now();

        let mut lapsed = subscription();
        lapsed.link_provider("sub_a", None);
        lapsed.activate(Some(now), now.minus_secs(60)).unwrap();
        repo.save(&lapsed).await.unwrap();

        let mut current = subscription();
        current.link_provider("sub_b", None);
        current.activate(Some(now), now.add_days(10)).unwrap();
        repo.save(&current).await.unwrap();

        let pending = subscription();
        repo.save(&pending).await.unwrap();

        let found = repo.find_lapsed(now).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, lapsed.id);
    }
}
