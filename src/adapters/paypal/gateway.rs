//! Wallet provider REST gateway.
//!
//! Implements `ProviderGateway` against the provider's JSON REST API.
//! Authenticates with OAuth client-credentials; the bearer token is cached
//! in-process until shortly before it expires.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Mutex;

use crate::config::PaypalConfig;
use crate::domain::foundation::Timestamp;
use crate::domain::subscription::{PlanKind, ProviderKind};
use crate::ports::{
    CreateSubscriptionRequest, PaymentError, PaymentErrorCode, ProviderCheckout,
    ProviderGateway, ProviderSubscription,
};

use super::types::{CreateSubscriptionResponse, OAuthTokenResponse, PaypalSubscription};

/// Per-call timeout for provider API requests.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Refresh the cached token this many seconds before it expires.
const TOKEN_EXPIRY_MARGIN_SECS: u64 = 60;

struct CachedToken {
    access_token: String,
    expires_at: Timestamp,
}

/// Wallet provider payment gateway.
pub struct PaypalGateway {
    client_id: String,
    client_secret: SecretString,
    api_base_url: String,
    plan_id_day: Option<String>,
    plan_id_weekly: Option<String>,
    plan_id_monthly: Option<String>,
    http_client: reqwest::Client,
    token: Mutex<Option<CachedToken>>,
}

impl PaypalGateway {
    pub fn new(config: &PaypalConfig) -> Self {
        Self {
            client_id: config.client_id.clone(),
            client_secret: SecretString::new(config.client_secret.clone()),
            api_base_url: config.api_base_url.clone(),
            plan_id_day: config.plan_id_day.clone(),
            plan_id_weekly: config.plan_id_weekly.clone(),
            plan_id_monthly: config.plan_id_monthly.clone(),
            http_client: reqwest::Client::new(),
            token: Mutex::new(None),
        }
    }

    fn plan_id(&self, plan: PlanKind) -> Result<&str, PaymentError> {
        let id = match plan {
            PlanKind::Day => &self.plan_id_day,
            PlanKind::Weekly => &self.plan_id_weekly,
            PlanKind::Monthly => &self.plan_id_monthly,
        };
        id.as_deref().ok_or_else(|| {
            PaymentError::new(
                PaymentErrorCode::ProviderError,
                format!("No billing plan configured for plan {}", plan),
            )
        })
    }

    /// Returns a valid bearer token, fetching a fresh one when the cached
    /// token is missing or about to expire.
    async fn access_token(&self) -> Result<String, PaymentError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at.is_after(&Timestamp::now()) {
                return Ok(token.access_token.clone());
            }
        }

        let url = format!("{}/v1/oauth2/token", self.api_base_url);
        let response = self
            .http_client
            .post(&url)
            .timeout(REQUEST_TIMEOUT)
            .basic_auth(&self.client_id, Some(self.client_secret.expose_secret()))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| PaymentError::network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::error!(%status, "wallet provider token fetch failed");
            return Err(PaymentError::authentication(format!(
                "token fetch returned {}",
                status
            )));
        }

        let token: OAuthTokenResponse = response
            .json()
            .await
            .map_err(|e| PaymentError::provider(format!("invalid token response: {}", e)))?;

        let expires_at = Timestamp::now()
            .plus_secs(token.expires_in.saturating_sub(TOKEN_EXPIRY_MARGIN_SECS));
        let access_token = token.access_token.clone();
        *cached = Some(CachedToken {
            access_token: token.access_token,
            expires_at,
        });
        Ok(access_token)
    }

    async fn into_error(response: reqwest::Response, operation: &str) -> PaymentError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        tracing::error!(operation, %status, error = %body, "wallet provider API call failed");

        let code = match status.as_u16() {
            401 | 403 => PaymentErrorCode::AuthenticationError,
            404 => PaymentErrorCode::NotFound,
            429 => PaymentErrorCode::RateLimitExceeded,
            _ => PaymentErrorCode::ProviderError,
        };
        PaymentError::new(code, format!("{} failed: {}", operation, status))
    }

    /// POST with a JSON body to a subscription sub-resource (cancel,
    /// suspend, activate). These endpoints return 204 on success.
    async fn subscription_action(
        &self,
        provider_subscription_id: &str,
        action: &str,
        reason: &str,
    ) -> Result<(), PaymentError> {
        let token = self.access_token().await?;
        let url = format!(
            "{}/v1/billing/subscriptions/{}/{}",
            self.api_base_url, provider_subscription_id, action
        );

        let response = self
            .http_client
            .post(&url)
            .timeout(REQUEST_TIMEOUT)
            .bearer_auth(token)
            .json(&serde_json::json!({ "reason": reason }))
            .send()
            .await
            .map_err(|e| PaymentError::network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::into_error(response, action).await);
        }
        Ok(())
    }
}

#[async_trait]
impl ProviderGateway for PaypalGateway {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Paypal
    }

    async fn create_subscription(
        &self,
        request: CreateSubscriptionRequest,
    ) -> Result<ProviderCheckout, PaymentError> {
        let token = self.access_token().await?;
        let url = format!("{}/v1/billing/subscriptions", self.api_base_url);

        let body = serde_json::json!({
            "plan_id": self.plan_id(request.plan)?,
            "custom_id": request.reference_id.to_string(),
            "application_context": {
                "brand_name": request.username,
                "return_url": request.success_url,
                "cancel_url": request.cancel_url,
            },
        });

        let response = self
            .http_client
            .post(&url)
            .timeout(REQUEST_TIMEOUT)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| PaymentError::network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::into_error(response, "create_subscription").await);
        }

        let created: CreateSubscriptionResponse = response
            .json()
            .await
            .map_err(|e| PaymentError::provider(format!("invalid create response: {}", e)))?;

        Ok(ProviderCheckout {
            approval_url: created.approval_url(),
            provider_subscription_id: Some(created.id),
        })
    }

    async fn cancel_subscription(
        &self,
        provider_subscription_id: &str,
        reason: &str,
    ) -> Result<(), PaymentError> {
        self.subscription_action(provider_subscription_id, "cancel", reason)
            .await
    }

    async fn disable_auto_renewal(
        &self,
        provider_subscription_id: &str,
    ) -> Result<(), PaymentError> {
        self.subscription_action(
            provider_subscription_id,
            "suspend",
            "auto-renewal disabled by user",
        )
        .await
    }

    async fn enable_auto_renewal(
        &self,
        provider_subscription_id: &str,
    ) -> Result<(), PaymentError> {
        self.subscription_action(
            provider_subscription_id,
            "activate",
            "auto-renewal enabled by user",
        )
        .await
    }

    async fn fetch_subscription(
        &self,
        provider_subscription_id: &str,
    ) -> Result<ProviderSubscription, PaymentError> {
        let token = self.access_token().await?;
        let url = format!(
            "{}/v1/billing/subscriptions/{}",
            self.api_base_url, provider_subscription_id
        );

        let response = self
            .http_client
            .get(&url)
            .timeout(REQUEST_TIMEOUT)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| PaymentError::network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::into_error(response, "fetch_subscription").await);
        }

        let subscription: PaypalSubscription = response
            .json()
            .await
            .map_err(|e| PaymentError::provider(format!("invalid subscription: {}", e)))?;

        let next_billing_time = subscription
            .billing_info
            .as_ref()
            .and_then(|b| b.next_billing_time.as_deref())
            .map(parse_rfc3339)
            .transpose()?;

        Ok(ProviderSubscription {
            id: subscription.id,
            customer_id: subscription.subscriber.and_then(|s| s.payer_id),
            status: subscription.status,
            next_billing_time,
        })
    }
}

fn parse_rfc3339(s: &str) -> Result<Timestamp, PaymentError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| Timestamp::from_datetime(dt.with_timezone(&Utc)))
        .map_err(|e| PaymentError::provider(format!("invalid billing time: {}", e)))
}
