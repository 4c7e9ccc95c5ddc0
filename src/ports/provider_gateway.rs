//! Provider gateway port for external payment processing.
//!
//! Defines the provider-agnostic contract both payment processor adapters
//! implement. Each adapter authenticates on its own (OAuth
//! client-credentials for one provider, API key for the other) and
//! translates provider HTTP errors into the uniform `PaymentError` shape.
//! No provider-specific wire type crosses this boundary.

use crate::domain::foundation::{SubscriptionId, Timestamp, UserId};
use crate::domain::subscription::{PlanKind, ProviderKind};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Port for payment provider integrations.
#[async_trait]
pub trait ProviderGateway: Send + Sync {
    /// Which provider this gateway talks to.
    fn provider(&self) -> ProviderKind;

    /// Creates a recurring subscription at the provider.
    ///
    /// Returns the provider's subscription id when the provider assigns one
    /// synchronously, and an approval URL the user must visit to authorize
    /// billing.
    async fn create_subscription(
        &self,
        request: CreateSubscriptionRequest,
    ) -> Result<ProviderCheckout, PaymentError>;

    /// Cancels a subscription at the provider.
    async fn cancel_subscription(
        &self,
        provider_subscription_id: &str,
        reason: &str,
    ) -> Result<(), PaymentError>;

    /// Stops automatic billing at the next period boundary.
    async fn disable_auto_renewal(
        &self,
        provider_subscription_id: &str,
    ) -> Result<(), PaymentError>;

    /// Resumes automatic billing.
    async fn enable_auto_renewal(
        &self,
        provider_subscription_id: &str,
    ) -> Result<(), PaymentError>;

    /// Fetches extended subscription details from the provider, used to
    /// compute the next billing date when an event payload lacks it.
    async fn fetch_subscription(
        &self,
        provider_subscription_id: &str,
    ) -> Result<ProviderSubscription, PaymentError>;
}

/// Request to create a subscription at a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSubscriptionRequest {
    /// Our subscription id, passed through to the provider so webhook
    /// events can be correlated back.
    pub reference_id: SubscriptionId,

    /// Internal user id (stored as provider metadata).
    pub user_id: UserId,

    /// Display username for the provider dashboard.
    pub username: String,

    /// Plan to subscribe to.
    pub plan: PlanKind,

    /// URL to redirect after successful checkout.
    pub success_url: String,

    /// URL to redirect after canceled checkout.
    pub cancel_url: String,
}

/// Result of creating a subscription at a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderCheckout {
    /// Provider's subscription id, when assigned synchronously.
    pub provider_subscription_id: Option<String>,

    /// URL for the user to approve billing.
    pub approval_url: Option<String>,
}

/// Extended subscription details from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSubscription {
    /// Provider's subscription id.
    pub id: String,

    /// Provider's customer/payer id, when known.
    pub customer_id: Option<String>,

    /// Provider's own status string, informational only.
    pub status: String,

    /// When the provider will bill next / end of the paid period.
    pub next_billing_time: Option<Timestamp>,
}

/// Errors from provider gateway operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentError {
    /// Error code for categorization.
    pub code: PaymentErrorCode,

    /// Human-readable message.
    pub message: String,

    /// Provider's error code (if available).
    pub provider_code: Option<String>,

    /// Whether the operation can be retried.
    pub retryable: bool,
}

impl PaymentError {
    /// Create a new payment error.
    pub fn new(code: PaymentErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider_code: None,
            retryable: code.is_retryable(),
        }
    }

    /// Create with provider code.
    pub fn with_provider_code(mut self, code: impl Into<String>) -> Self {
        self.provider_code = Some(code.into());
        self
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::NetworkError, message)
    }

    /// Create an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::AuthenticationError, message)
    }

    /// Create a not found error.
    pub fn not_found(resource: &str) -> Self {
        Self::new(PaymentErrorCode::NotFound, format!("{} not found", resource))
    }

    /// Create a provider API error.
    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::ProviderError, message)
    }
}

impl std::fmt::Display for PaymentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for PaymentError {}

impl From<PaymentError> for crate::domain::foundation::DomainError {
    fn from(err: PaymentError) -> Self {
        use crate::domain::foundation::{DomainError, ErrorCode};

        let code = match err.code {
            PaymentErrorCode::NotFound => ErrorCode::SubscriptionNotFound,
            _ => ErrorCode::ProviderError,
        };

        DomainError::new(code, err.message)
    }
}

/// Payment error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentErrorCode {
    /// Network connectivity issue.
    NetworkError,

    /// API authentication failed.
    AuthenticationError,

    /// Resource not found at the provider.
    NotFound,

    /// Rate limit exceeded.
    RateLimitExceeded,

    /// Provider API error.
    ProviderError,

    /// Unknown error.
    Unknown,
}

impl PaymentErrorCode {
    /// Check if this error type is typically retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PaymentErrorCode::NetworkError | PaymentErrorCode::RateLimitExceeded
        )
    }
}

impl std::fmt::Display for PaymentErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentErrorCode::NetworkError => "network_error",
            PaymentErrorCode::AuthenticationError => "authentication_error",
            PaymentErrorCode::NotFound => "not_found",
            PaymentErrorCode::RateLimitExceeded => "rate_limit_exceeded",
            PaymentErrorCode::ProviderError => "provider_error",
            PaymentErrorCode::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}
