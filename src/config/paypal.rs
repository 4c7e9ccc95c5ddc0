//! Wallet provider configuration.

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;

/// Wallet provider (PayPal) configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PaypalConfig {
    /// OAuth client id.
    pub client_id: String,

    /// OAuth client secret.
    pub client_secret: String,

    /// Webhook id from the provider dashboard; part of the signed
    /// canonical message during webhook verification.
    pub webhook_id: String,

    /// Base URL for the API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Directory for the signing-certificate cache.
    #[serde(default = "default_cert_cache_dir")]
    pub cert_cache_dir: PathBuf,

    /// Billing plan id for the daily plan.
    pub plan_id_day: Option<String>,

    /// Billing plan id for the weekly plan.
    pub plan_id_weekly: Option<String>,

    /// Billing plan id for the monthly plan.
    pub plan_id_monthly: Option<String>,
}

fn default_api_base_url() -> String {
    "https://api-m.paypal.com".to_string()
}

fn default_cert_cache_dir() -> PathBuf {
    std::env::temp_dir().join("billing-engine-certs")
}

impl PaypalConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.client_id.is_empty() {
            return Err(ValidationError::MissingRequired("PAYPAL_CLIENT_ID"));
        }
        if self.client_secret.is_empty() {
            return Err(ValidationError::MissingRequired("PAYPAL_CLIENT_SECRET"));
        }
        if self.webhook_id.is_empty() {
            return Err(ValidationError::MissingRequired("PAYPAL_WEBHOOK_ID"));
        }
        if !self.api_base_url.starts_with("https://") {
            return Err(ValidationError::InvalidUrl("paypal.api_base_url"));
        }
        Ok(())
    }
}
