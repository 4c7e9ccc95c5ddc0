//! Wire types for the wallet provider's API and webhook payloads.

use serde::Deserialize;

use crate::domain::subscription::ProviderKind;
use crate::domain::webhook::{ProviderEvent, WebhookError};

/// Webhook event envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct PaypalEventEnvelope {
    /// Unique identifier for the event (WH-xxx format).
    pub id: String,

    /// Type of event (e.g. "BILLING.SUBSCRIPTION.ACTIVATED").
    pub event_type: String,

    /// The resource the event refers to (polymorphic per event type).
    pub resource: serde_json::Value,
}

/// Parses a verified raw webhook body into the normalized envelope.
pub fn parse_event(payload: &[u8]) -> Result<ProviderEvent, WebhookError> {
    let envelope: PaypalEventEnvelope = serde_json::from_slice(payload)
        .map_err(|e| WebhookError::ParseError(e.to_string()))?;

    Ok(ProviderEvent {
        id: envelope.id,
        event_type: envelope.event_type,
        provider: ProviderKind::Paypal,
        resource: envelope.resource,
    })
}

/// OAuth client-credentials token response.
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthTokenResponse {
    pub access_token: String,
    pub expires_in: u64,
}

/// Hypermedia link on API responses.
#[derive(Debug, Clone, Deserialize)]
pub struct LinkDescription {
    pub href: String,
    pub rel: String,
}

/// Subscription creation response.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSubscriptionResponse {
    pub id: String,
    #[serde(default)]
    pub links: Vec<LinkDescription>,
}

impl CreateSubscriptionResponse {
    /// The link the subscriber must visit to approve billing.
    pub fn approval_url(&self) -> Option<String> {
        self.links
            .iter()
            .find(|l| l.rel == "approve")
            .map(|l| l.href.clone())
    }
}

/// Subscription detail response.
#[derive(Debug, Clone, Deserialize)]
pub struct PaypalSubscription {
    pub id: String,
    pub status: String,
    pub subscriber: Option<Subscriber>,
    pub billing_info: Option<BillingInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Subscriber {
    pub payer_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BillingInfo {
    pub next_billing_time: Option<String>,
}
