//! Provider webhook event envelope and classification.
//!
//! Both providers push events with a string event-type discriminant and a
//! provider-specific resource payload. The envelope is normalized by each
//! provider adapter after signature verification; handlers interpret the
//! resource JSON per provider.

use serde::{Deserialize, Serialize};

use crate::domain::subscription::ProviderKind;

/// Verified webhook event, normalized across providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderEvent {
    /// Provider's unique event id, used for idempotent processing.
    pub id: String,

    /// Raw event-type discriminant (e.g. "PAYMENT.SALE.COMPLETED" or
    /// "invoice.payment_succeeded").
    pub event_type: String,

    /// Which provider pushed the event.
    pub provider: ProviderKind,

    /// Provider-specific resource payload, untouched.
    pub resource: serde_json::Value,
}

impl ProviderEvent {
    /// Classifies the raw event type into a semantic kind.
    pub fn kind(&self) -> EventKind {
        EventKind::from_event_type(&self.event_type)
    }

    /// Attempts to deserialize the resource payload as the specified type.
    pub fn deserialize_resource<T: serde::de::DeserializeOwned>(
        &self,
    ) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.resource.clone())
    }
}

/// Semantic kinds of billing events the engine reacts to.
///
/// Everything else is acknowledged as a no-op; providers push many event
/// kinds this system does not care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Subscription created at the provider / checkout completed.
    SubscriptionCreated,
    /// A charge for a billing period succeeded.
    PaymentSucceeded,
    /// A charge for a billing period failed.
    PaymentFailed,
    /// Provider paused the subscription.
    SubscriptionSuspended,
    /// Provider confirmed the subscription (re)activated.
    SubscriptionActivated,
    /// Subscription canceled at the provider.
    SubscriptionCancelled,
    /// Anything the engine does not handle.
    Unknown,
}

impl EventKind {
    /// Classifies a raw provider event-type string.
    pub fn from_event_type(s: &str) -> Self {
        match s {
            "BILLING.SUBSCRIPTION.CREATED" | "checkout.session.completed" => {
                Self::SubscriptionCreated
            }
            "PAYMENT.SALE.COMPLETED" | "invoice.payment_succeeded" => Self::PaymentSucceeded,
            "BILLING.SUBSCRIPTION.PAYMENT.FAILED" | "invoice.payment_failed" => {
                Self::PaymentFailed
            }
            "BILLING.SUBSCRIPTION.SUSPENDED" | "customer.subscription.paused" => {
                Self::SubscriptionSuspended
            }
            "BILLING.SUBSCRIPTION.ACTIVATED" | "customer.subscription.updated" => {
                Self::SubscriptionActivated
            }
            "BILLING.SUBSCRIPTION.CANCELLED" | "customer.subscription.deleted" => {
                Self::SubscriptionCancelled
            }
            _ => Self::Unknown,
        }
    }
}

#[cfg(test)]
pub struct ProviderEventBuilder {
    id: String,
    event_type: String,
    provider: ProviderKind,
    resource: serde_json::Value,
}

#[cfg(test)]
impl ProviderEventBuilder {
    pub fn new() -> Self {
        Self {
            id: "WH-5TY63559".to_string(),
            event_type: "PAYMENT.SALE.COMPLETED".to_string(),
            provider: ProviderKind::Paypal,
            resource: serde_json::json!({}),
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = event_type.into();
        self
    }

    pub fn provider(mut self, provider: ProviderKind) -> Self {
        self.provider = provider;
        self
    }

    pub fn resource(mut self, resource: serde_json::Value) -> Self {
        self.resource = resource;
        self
    }

    pub fn build(self) -> ProviderEvent {
        ProviderEvent {
            id: self.id,
            event_type: self.event_type,
            provider: self.provider,
            resource: self.resource,
        }
    }
}
