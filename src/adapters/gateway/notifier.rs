//! Notification forwarder to the upstream gateway service.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use crate::config::GatewayConfig;
use crate::domain::foundation::{Timestamp, UserId};
use crate::ports::NotificationGateway;

/// Pushes subscription end-date changes to the gateway service.
///
/// Fire-and-forget: failures are logged and swallowed, nothing retries.
/// The gateway uses the push to refresh the user-facing subscription
/// display; a missed push self-corrects on the next state change.
pub struct GatewayNotifier {
    base_url: String,
    timeout: Duration,
    http_client: reqwest::Client,
}

impl GatewayNotifier {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            timeout: Duration::from_secs(config.notify_timeout_secs),
            http_client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl NotificationGateway for GatewayNotifier {
    async fn push_end_date(&self, user_id: UserId, end_date: Option<Timestamp>) {
        let url = format!("{}/internal/subscriptions/notify", self.base_url);
        let body = json!({
            "userId": user_id,
            "endDateOfSubscription": end_date,
        });

        match self
            .http_client
            .post(&url)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
        {
            Ok(response) if !response.status().is_success() => {
                tracing::warn!(
                    user = %user_id,
                    status = %response.status(),
                    "subscription notification rejected by gateway"
                );
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(
                    user = %user_id,
                    error = %e,
                    "subscription notification failed"
                );
            }
        }
    }
}
