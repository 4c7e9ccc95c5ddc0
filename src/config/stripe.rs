//! Card provider configuration.

use serde::Deserialize;

use super::error::ValidationError;

/// Card provider (Stripe) configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeConfig {
    /// Secret API key (sk_live_... or sk_test_...).
    pub api_key: String,

    /// Webhook signing secret (whsec_...).
    pub webhook_secret: String,

    /// Base URL for the API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Price id for the daily plan.
    pub price_id_day: Option<String>,

    /// Price id for the weekly plan.
    pub price_id_weekly: Option<String>,

    /// Price id for the monthly plan.
    pub price_id_monthly: Option<String>,
}

fn default_api_base_url() -> String {
    "https://api.stripe.com".to_string()
}

impl StripeConfig {
    /// Check if using test mode credentials.
    pub fn is_test_mode(&self) -> bool {
        self.api_key.starts_with("sk_test_")
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.api_key.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_API_KEY"));
        }
        if self.webhook_secret.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_WEBHOOK_SECRET"));
        }

        // Verify key prefixes for safety
        if !self.api_key.starts_with("sk_") {
            return Err(ValidationError::InvalidStripeKey);
        }
        if !self.webhook_secret.starts_with("whsec_") {
            return Err(ValidationError::InvalidStripeWebhookSecret);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> StripeConfig {
        StripeConfig {
            api_key: "sk_test_abcd1234".to_string(),
            webhook_secret: "whsec_xyz789".to_string(),
            api_base_url: default_api_base_url(),
            price_id_day: Some("price_day".to_string()),
            price_id_weekly: Some("price_weekly".to_string()),
            price_id_monthly: Some("price_monthly".to_string()),
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(config().validate().is_ok());
        assert!(config().is_test_mode());
    }

    #[test]
    fn wrong_api_key_prefix_fails() {
        let mut c = config();
        c.api_key = "pk_test_abcd".to_string();
        assert_eq!(c.validate(), Err(ValidationError::InvalidStripeKey));
    }

    #[test]
    fn wrong_webhook_secret_prefix_fails() {
        let mut c = config();
        c.webhook_secret = "secret_xyz".to_string();
        assert_eq!(
            c.validate(),
            Err(ValidationError::InvalidStripeWebhookSecret)
        );
    }

    #[test]
    fn missing_api_key_fails() {
        let mut c = config();
        c.api_key = String::new();
        assert!(c.validate().is_err());
    }
}
