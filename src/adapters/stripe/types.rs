//! Wire types for the card provider's API and webhook payloads.
//!
//! Only fields relevant to our processing are captured; everything else in
//! the provider's schemas is ignored.

use serde::Deserialize;

use crate::domain::subscription::ProviderKind;
use crate::domain::webhook::{ProviderEvent, WebhookError};

/// Webhook event envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeEventEnvelope {
    /// Unique identifier for the event (evt_xxx format).
    pub id: String,

    /// Type of event (e.g. "checkout.session.completed").
    #[serde(rename = "type")]
    pub event_type: String,

    /// Container for the object that triggered the event.
    pub data: StripeEventData,
}

/// Container for event-specific data.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeEventData {
    /// The object that triggered the event (polymorphic per event type).
    pub object: serde_json::Value,
}

/// Parses a verified raw webhook body into the normalized envelope.
pub fn parse_event(payload: &[u8]) -> Result<ProviderEvent, WebhookError> {
    let envelope: StripeEventEnvelope = serde_json::from_slice(payload)
        .map_err(|e| WebhookError::ParseError(e.to_string()))?;

    Ok(ProviderEvent {
        id: envelope.id,
        event_type: envelope.event_type,
        provider: ProviderKind::Stripe,
        resource: envelope.data.object,
    })
}

/// Subscription object from the API.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeSubscription {
    pub id: String,
    pub customer: Option<String>,
    pub status: String,
    pub current_period_end: Option<i64>,
}

/// Checkout session creation response.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeCheckoutSession {
    pub id: String,
    pub url: Option<String>,
}

/// Error body returned by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorBody {
    pub error: StripeErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorDetail {
    #[serde(rename = "type")]
    pub error_type: Option<String>,
    pub message: Option<String>,
    pub code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_event_extracts_envelope() {
        let payload = br#"{
            "id": "evt_1N",
            "type": "invoice.payment_succeeded",
            "created": 1704067200,
            "data": {
                "object": {"id": "in_1", "subscription": "sub_9", "period_end": 1706745600}
            },
            "livemode": false
        }"#;

        let event = parse_event(payload).unwrap();

        assert_eq!(event.id, "evt_1N");
        assert_eq!(event.event_type, "invoice.payment_succeeded");
        assert_eq!(event.provider, ProviderKind::Stripe);
        assert_eq!(event.resource["subscription"], "sub_9");
    }

    #[test]
    fn parse_event_rejects_invalid_json() {
        let result = parse_event(b"not json");
        assert!(matches!(result, Err(WebhookError::ParseError(_))));
    }

    #[test]
    fn parse_event_rejects_missing_type() {
        let result = parse_event(br#"{"id": "evt_1", "data": {"object": {}}}"#);
        assert!(matches!(result, Err(WebhookError::ParseError(_))));
    }

    #[test]
    fn subscription_deserializes_with_optional_fields() {
        let json = r#"{"id": "sub_1", "customer": "cus_2", "status": "active", "current_period_end": 1706745600}"#;
        let sub: StripeSubscription = serde_json::from_str(json).unwrap();
        assert_eq!(sub.customer.as_deref(), Some("cus_2"));
        assert_eq!(sub.current_period_end, Some(1_706_745_600));
    }
}
