//! Notification gateway port.
//!
//! After any state change that affects the user-visible subscription end
//! date, the engine pushes a notification to the upstream gateway service.
//! Delivery is fire-and-forget: implementations log failures and never
//! propagate them, and nothing retries.

use crate::domain::foundation::{Timestamp, UserId};
use async_trait::async_trait;

/// Port for pushing subscription updates to the upstream gateway.
#[async_trait]
pub trait NotificationGateway: Send + Sync {
    /// Pushes the user's new subscription end date. Best effort only.
    async fn push_end_date(&self, user_id: UserId, end_date: Option<Timestamp>);
}
