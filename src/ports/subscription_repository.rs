//! Subscription repository port.
//!
//! Defines the contract for persisting and retrieving Subscription
//! aggregates.
//!
//! # Concurrency
//!
//! Webhook deliveries for the same subscription may race each other and the
//! expiration sweep. `update` is therefore a compare-and-swap on the
//! aggregate's `version` field: the write only lands if the stored version
//! still matches the version the caller loaded, and a stale write surfaces
//! as `VersionConflict` so the caller can reload and retry.

use crate::domain::foundation::{DomainError, SubscriptionId, Timestamp, UserId};
use crate::domain::subscription::Subscription;
use async_trait::async_trait;

/// Repository port for Subscription aggregate persistence.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Save a new subscription.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure
    async fn save(&self, subscription: &Subscription) -> Result<(), DomainError>;

    /// Update an existing subscription.
    ///
    /// The write is conditional on `subscription.version` matching the
    /// stored row; the stored version is bumped on success.
    ///
    /// # Errors
    ///
    /// - `SubscriptionNotFound` if the subscription doesn't exist
    /// - `VersionConflict` if another writer got there first
    /// - `DatabaseError` on persistence failure
    async fn update(&self, subscription: &Subscription) -> Result<(), DomainError>;

    /// Find a subscription by its id.
    async fn find_by_id(
        &self,
        id: &SubscriptionId,
    ) -> Result<Option<Subscription>, DomainError>;

    /// Find a subscription by the provider's subscription id.
    ///
    /// This is the primary lookup on the webhook path.
    async fn find_by_provider_subscription_id(
        &self,
        provider_subscription_id: &str,
    ) -> Result<Option<Subscription>, DomainError>;

    /// Find the user's currently operative subscription (`is_active`).
    async fn find_active_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Subscription>, DomainError>;

    /// Find all subscriptions of a user, newest first.
    async fn find_by_user(&self, user_id: &UserId) -> Result<Vec<Subscription>, DomainError>;

    /// Find active-like (Active or Suspended) subscriptions whose paid
    /// window ends before the given horizon. Used by the expiration sweep.
    async fn find_lapsed(&self, horizon: Timestamp) -> Result<Vec<Subscription>, DomainError>;

    /// Update the denormalized username on all subscriptions of a user.
    ///
    /// Returns the number of rows touched.
    async fn update_username(
        &self,
        user_id: &UserId,
        username: &str,
    ) -> Result<u64, DomainError>;
}
