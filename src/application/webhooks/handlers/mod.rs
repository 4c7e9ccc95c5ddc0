//! Per-event webhook handlers.
//!
//! One handler per semantic billing event; each covers the event-type
//! strings of both providers and performs the full lookup / pure
//! transition / persist cycle.
//!
//! # Concurrency
//!
//! Webhook deliveries for one subscription race each other and the
//! expiration sweep. Every read-modify-write here goes through a bounded
//! retry loop over the repository's compare-and-swap update: a stale write
//! reloads the row and re-applies the pure transition.

mod payment_failed;
mod payment_succeeded;
mod subscription_activated;
mod subscription_cancelled;
mod subscription_created;
mod subscription_suspended;

pub use payment_failed::PaymentFailedHandler;
pub use payment_succeeded::PaymentSucceededHandler;
pub use subscription_activated::SubscriptionActivatedHandler;
pub use subscription_cancelled::SubscriptionCancelledHandler;
pub use subscription_created::SubscriptionCreatedHandler;
pub use subscription_suspended::SubscriptionSuspendedHandler;

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::foundation::{ErrorCode, SubscriptionId, Timestamp};
use crate::domain::subscription::{ProviderKind, Subscription};
use crate::domain::webhook::{ProviderEvent, WebhookError};
use crate::ports::SubscriptionRepository;

/// Attempts per read-modify-write before giving up and letting the
/// provider's redelivery try again.
const MAX_WRITE_ATTEMPTS: u32 = 3;

/// Loads by provider subscription id, applies a pure mutation, persists,
/// retrying the whole cycle on stale writes.
pub(super) async fn transition_by_provider_id<F>(
    repo: &Arc<dyn SubscriptionRepository>,
    provider_subscription_id: &str,
    mut mutate: F,
) -> Result<Subscription, WebhookError>
where
    F: FnMut(&mut Subscription) -> Result<(), WebhookError>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        let mut subscription = repo
            .find_by_provider_subscription_id(provider_subscription_id)
            .await?
            .ok_or_else(|| {
                WebhookError::SubscriptionNotFound(provider_subscription_id.to_string())
            })?;
        mutate(&mut subscription)?;
        match repo.update(&subscription).await {
            Ok(()) => return Ok(subscription),
            Err(e) if e.code == ErrorCode::VersionConflict && attempt < MAX_WRITE_ATTEMPTS => {
                tracing::debug!(
                    subscription = %subscription.id,
                    attempt,
                    "stale subscription write, retrying transition"
                );
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Same cycle as [`transition_by_provider_id`], keyed by our own id.
pub(super) async fn transition_by_id<F>(
    repo: &Arc<dyn SubscriptionRepository>,
    id: &SubscriptionId,
    mut mutate: F,
) -> Result<Subscription, WebhookError>
where
    F: FnMut(&mut Subscription) -> Result<(), WebhookError>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        let mut subscription = repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| WebhookError::SubscriptionNotFound(id.to_string()))?;
        mutate(&mut subscription)?;
        match repo.update(&subscription).await {
            Ok(()) => return Ok(subscription),
            Err(e) if e.code == ErrorCode::VersionConflict && attempt < MAX_WRITE_ATTEMPTS => {
                tracing::debug!(
                    subscription = %subscription.id,
                    attempt,
                    "stale subscription write, retrying transition"
                );
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Extracts a required string field from the event resource.
pub(super) fn str_field<'a>(
    resource: &'a serde_json::Value,
    field: &'static str,
) -> Result<&'a str, WebhookError> {
    resource
        .get(field)
        .and_then(|v| v.as_str())
        .ok_or(WebhookError::MissingField(field))
}

/// Extracts an optional string field from the event resource.
pub(super) fn opt_str_field(resource: &serde_json::Value, field: &str) -> Option<String> {
    resource
        .get(field)
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

/// Parses an RFC 3339 timestamp field, when present.
pub(super) fn rfc3339_field(
    resource: &serde_json::Value,
    field: &'static str,
) -> Result<Option<Timestamp>, WebhookError> {
    match resource.get(field).and_then(|v| v.as_str()) {
        None => Ok(None),
        Some(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| Some(Timestamp::from_datetime(dt.with_timezone(&Utc))))
            .map_err(|e| WebhookError::ParseError(format!("invalid {}: {}", field, e))),
    }
}

/// Reads a Unix-seconds timestamp field, when present.
pub(super) fn unix_field(resource: &serde_json::Value, field: &str) -> Option<Timestamp> {
    resource
        .get(field)
        .and_then(|v| v.as_i64())
        .map(Timestamp::from_unix_secs)
}

/// The provider subscription id carried by payment events.
pub(super) fn payment_subscription_id(event: &ProviderEvent) -> Result<String, WebhookError> {
    let field = match event.provider {
        ProviderKind::Paypal => "billing_agreement_id",
        ProviderKind::Stripe => "subscription",
    };
    str_field(&event.resource, field).map(str::to_string)
}

/// When the provider processed the charge, falling back to now.
pub(super) fn payment_time(event: &ProviderEvent) -> Result<Timestamp, WebhookError> {
    let parsed = match event.provider {
        ProviderKind::Paypal => rfc3339_field(&event.resource, "create_time")?,
        ProviderKind::Stripe => unix_field(&event.resource, "created"),
    };
    Ok(parsed.unwrap_or_else(Timestamp::now))
}
