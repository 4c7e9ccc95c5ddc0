//! Provider webhook endpoints.
//!
//! Both endpoints take the raw request body as bytes: signature
//! verification runs over the exact bytes the provider sent, never over a
//! re-serialized form. The response is only ever an acknowledgement status;
//! handler detail stays in the logs.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::adapters::{paypal, stripe};
use crate::application::webhooks::WebhookOutcome;
use crate::domain::webhook::WebhookError;

use super::state::AppState;

/// POST /webhooks/paypal
pub async fn paypal_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let result = async {
        state.paypal_verifier.verify(&body, &headers).await?;
        let event = paypal::parse_event(&body)?;
        state.webhooks.dispatch(&event).await
    }
    .await;
    into_ack(result)
}

/// POST /webhooks/stripe
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let result = async {
        state.stripe_verifier.verify(&body, &headers)?;
        let event = stripe::parse_event(&body)?;
        state.webhooks.dispatch(&event).await
    }
    .await;
    into_ack(result)
}

fn into_ack(result: Result<WebhookOutcome, WebhookError>) -> Response {
    match result {
        Ok(outcome) => {
            let status = match outcome {
                WebhookOutcome::Processed => "processed",
                WebhookOutcome::Ignored => "ignored",
                WebhookOutcome::AlreadyProcessed => "already_processed",
            };
            Json(json!({ "status": status })).into_response()
        }
        Err(err) => {
            let status = err.status_code();
            if status.is_server_error() {
                tracing::error!(error = %err, "webhook processing failed");
            } else {
                tracing::warn!(error = %err, "webhook rejected");
            }
            (status, Json(json!({ "status": "error" }))).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn outcomes_acknowledge_with_ok() {
        for outcome in [
            WebhookOutcome::Processed,
            WebhookOutcome::Ignored,
            WebhookOutcome::AlreadyProcessed,
        ] {
            let response = into_ack(Ok(outcome));
            assert_eq!(response.status(), StatusCode::OK);
        }
    }

    #[test]
    fn verification_failures_are_forbidden() {
        let response = into_ack(Err(WebhookError::MissingHeader("paypal-transmission-sig")));
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = into_ack(Err(WebhookError::InvalidSignature));
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn handler_failures_are_server_errors() {
        let response = into_ack(Err(WebhookError::Database("down".to_string())));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
