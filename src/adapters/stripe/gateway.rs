//! Card provider REST gateway.
//!
//! Implements `ProviderGateway` against the provider's form-encoded REST
//! API, authenticated with the secret API key. Subscriptions are started
//! through hosted checkout sessions; our subscription id travels in the
//! session metadata so webhook events can be correlated back.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::config::StripeConfig;
use crate::domain::foundation::Timestamp;
use crate::domain::subscription::{PlanKind, ProviderKind};
use crate::ports::{
    CreateSubscriptionRequest, PaymentError, PaymentErrorCode, ProviderCheckout,
    ProviderGateway, ProviderSubscription,
};

use super::types::{StripeCheckoutSession, StripeErrorBody, StripeSubscription};

/// Per-call timeout for provider API requests. Providers impose their own
/// webhook delivery timeouts, so a hanging call must resolve before then.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Card provider payment gateway.
pub struct StripeGateway {
    api_key: SecretString,
    api_base_url: String,
    price_id_day: Option<String>,
    price_id_weekly: Option<String>,
    price_id_monthly: Option<String>,
    http_client: reqwest::Client,
}

impl StripeGateway {
    pub fn new(config: &StripeConfig) -> Self {
        Self {
            api_key: SecretString::new(config.api_key.clone()),
            api_base_url: config.api_base_url.clone(),
            price_id_day: config.price_id_day.clone(),
            price_id_weekly: config.price_id_weekly.clone(),
            price_id_monthly: config.price_id_monthly.clone(),
            http_client: reqwest::Client::new(),
        }
    }

    fn price_id(&self, plan: PlanKind) -> Result<&str, PaymentError> {
        let price = match plan {
            PlanKind::Day => &self.price_id_day,
            PlanKind::Weekly => &self.price_id_weekly,
            PlanKind::Monthly => &self.price_id_monthly,
        };
        price.as_deref().ok_or_else(|| {
            PaymentError::new(
                PaymentErrorCode::ProviderError,
                format!("No price configured for plan {}", plan),
            )
        })
    }

    async fn into_error(response: reqwest::Response, operation: &str) -> PaymentError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        tracing::error!(operation, %status, error = %body, "card provider API call failed");

        let provider_code = serde_json::from_str::<StripeErrorBody>(&body)
            .ok()
            .and_then(|b| b.error.code);

        let code = match status.as_u16() {
            401 | 403 => PaymentErrorCode::AuthenticationError,
            404 => PaymentErrorCode::NotFound,
            429 => PaymentErrorCode::RateLimitExceeded,
            _ => PaymentErrorCode::ProviderError,
        };

        let mut err = PaymentError::new(code, format!("{} failed: {}", operation, status));
        if let Some(provider_code) = provider_code {
            err = err.with_provider_code(provider_code);
        }
        err
    }
}

#[async_trait]
impl ProviderGateway for StripeGateway {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Stripe
    }

    async fn create_subscription(
        &self,
        request: CreateSubscriptionRequest,
    ) -> Result<ProviderCheckout, PaymentError> {
        let url = format!("{}/v1/checkout/sessions", self.api_base_url);
        let reference = request.reference_id.to_string();
        let user = request.user_id.to_string();

        let params = [
            ("mode", "subscription"),
            ("line_items[0][price]", self.price_id(request.plan)?),
            ("line_items[0][quantity]", "1"),
            ("success_url", request.success_url.as_str()),
            ("cancel_url", request.cancel_url.as_str()),
            ("metadata[subscription_id]", reference.as_str()),
            ("metadata[user_id]", user.as_str()),
            ("subscription_data[metadata][subscription_id]", reference.as_str()),
        ];

        let response = self
            .http_client
            .post(&url)
            .timeout(REQUEST_TIMEOUT)
            .basic_auth(self.api_key.expose_secret(), Option::<&str>::None)
            .form(&params)
            .send()
            .await
            .map_err(|e| PaymentError::network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::into_error(response, "create_checkout_session").await);
        }

        let session: StripeCheckoutSession = response
            .json()
            .await
            .map_err(|e| PaymentError::provider(format!("invalid checkout response: {}", e)))?;

        Ok(ProviderCheckout {
            // The provider assigns the subscription id when checkout
            // completes; the webhook carries it.
            provider_subscription_id: None,
            approval_url: session.url,
        })
    }

    async fn cancel_subscription(
        &self,
        provider_subscription_id: &str,
        _reason: &str,
    ) -> Result<(), PaymentError> {
        let url = format!(
            "{}/v1/subscriptions/{}",
            self.api_base_url, provider_subscription_id
        );

        let response = self
            .http_client
            .delete(&url)
            .timeout(REQUEST_TIMEOUT)
            .basic_auth(self.api_key.expose_secret(), Option::<&str>::None)
            .send()
            .await
            .map_err(|e| PaymentError::network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::into_error(response, "cancel_subscription").await);
        }
        Ok(())
    }

    async fn disable_auto_renewal(
        &self,
        provider_subscription_id: &str,
    ) -> Result<(), PaymentError> {
        self.set_cancel_at_period_end(provider_subscription_id, true)
            .await
    }

    async fn enable_auto_renewal(
        &self,
        provider_subscription_id: &str,
    ) -> Result<(), PaymentError> {
        self.set_cancel_at_period_end(provider_subscription_id, false)
            .await
    }

    async fn fetch_subscription(
        &self,
        provider_subscription_id: &str,
    ) -> Result<ProviderSubscription, PaymentError> {
        let url = format!(
            "{}/v1/subscriptions/{}",
            self.api_base_url, provider_subscription_id
        );

        let response = self
            .http_client
            .get(&url)
            .timeout(REQUEST_TIMEOUT)
            .basic_auth(self.api_key.expose_secret(), Option::<&str>::None)
            .send()
            .await
            .map_err(|e| PaymentError::network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::into_error(response, "fetch_subscription").await);
        }

        let subscription: StripeSubscription = response
            .json()
            .await
            .map_err(|e| PaymentError::provider(format!("invalid subscription: {}", e)))?;

        Ok(ProviderSubscription {
            id: subscription.id,
            customer_id: subscription.customer,
            status: subscription.status,
            next_billing_time: subscription
                .current_period_end
                .map(Timestamp::from_unix_secs),
        })
    }
}

impl StripeGateway {
    async fn set_cancel_at_period_end(
        &self,
        provider_subscription_id: &str,
        cancel: bool,
    ) -> Result<(), PaymentError> {
        let url = format!(
            "{}/v1/subscriptions/{}",
            self.api_base_url, provider_subscription_id
        );
        let params = [(
            "cancel_at_period_end",
            if cancel { "true" } else { "false" },
        )];

        let response = self
            .http_client
            .post(&url)
            .timeout(REQUEST_TIMEOUT)
            .basic_auth(self.api_key.expose_secret(), Option::<&str>::None)
            .form(&params)
            .send()
            .await
            .map_err(|e| PaymentError::network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::into_error(response, "set_cancel_at_period_end").await);
        }
        Ok(())
    }
}
