//! Webhook error taxonomy.
//!
//! Every failure on the webhook path maps onto one of these variants, each
//! with an HTTP status mapping and retryability semantics. Providers retry
//! delivery on non-2xx responses, so the mapping decides what gets retried.

use axum::http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::DomainError;

/// Errors that occur during webhook verification and processing.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// A required signature header is absent. Fails closed.
    #[error("Missing required header: {0}")]
    MissingHeader(&'static str),

    /// Signature verification failed.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Signing certificate could not be fetched or parsed.
    #[error("Certificate error: {0}")]
    Certificate(String),

    /// Failed to parse the payload or a signature header.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Required field missing from the webhook payload.
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// Referenced subscription could not be found locally.
    #[error("Subscription not found: {0}")]
    SubscriptionNotFound(String),

    /// Attempted state transition is not valid.
    #[error("Invalid state transition: {0}")]
    InvalidTransition(String),

    /// Event was intentionally ignored (not an error condition).
    #[error("Event ignored: {0}")]
    Ignored(String),

    /// Provider API call inside a handler failed.
    #[error("Provider error: {0}")]
    Provider(String),

    /// Repository operation failed.
    #[error("Database error: {0}")]
    Database(String),

    /// Concurrent writes exhausted the retry budget.
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl WebhookError {
    /// Returns true if the provider should retry delivering this webhook.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WebhookError::Database(_)
                | WebhookError::Provider(_)
                | WebhookError::Conflict(_)
                | WebhookError::SubscriptionNotFound(_) // Might be eventual consistency
        )
    }

    /// Maps the error to an HTTP status code.
    ///
    /// - 2xx: event acknowledged, no retry
    /// - 403: verification failure, never accepted
    /// - 4xx: client error, no retry
    /// - 5xx: server error, provider redelivers
    pub fn status_code(&self) -> StatusCode {
        match self {
            // Verification failures - forbidden, never accepted
            WebhookError::MissingHeader(_)
            | WebhookError::InvalidSignature
            | WebhookError::Certificate(_) => StatusCode::FORBIDDEN,

            // Malformed payloads after the signature passed
            WebhookError::ParseError(_) | WebhookError::MissingField(_) => {
                StatusCode::BAD_REQUEST
            }

            // Ignored events are acknowledged as success
            WebhookError::Ignored(_) => StatusCode::OK,

            // Server-side failures - provider redelivers
            WebhookError::SubscriptionNotFound(_)
            | WebhookError::InvalidTransition(_)
            | WebhookError::Provider(_)
            | WebhookError::Database(_)
            | WebhookError::Conflict(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DomainError> for WebhookError {
    fn from(err: DomainError) -> Self {
        use crate::domain::foundation::ErrorCode;
        match err.code {
            ErrorCode::SubscriptionNotFound => WebhookError::SubscriptionNotFound(err.message),
            ErrorCode::InvalidStateTransition => WebhookError::InvalidTransition(err.message),
            ErrorCode::VersionConflict => WebhookError::Conflict(err.message),
            ErrorCode::ProviderError => WebhookError::Provider(err.message),
            _ => WebhookError::Database(err.message),
        }
    }
}
