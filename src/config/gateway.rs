//! Upstream gateway service configuration.

use serde::Deserialize;

use super::error::ValidationError;

/// Configuration for the gateway service this engine notifies, plus the
/// checkout redirect targets handed to providers.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Base URL of the gateway service.
    pub base_url: String,

    /// Timeout for notification pushes, in seconds.
    #[serde(default = "default_notify_timeout_secs")]
    pub notify_timeout_secs: u64,

    /// Where providers send the user after a successful checkout.
    pub checkout_success_url: String,

    /// Where providers send the user after an abandoned checkout.
    pub checkout_cancel_url: String,
}

fn default_notify_timeout_secs() -> u64 {
    5
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.base_url.is_empty() {
            return Err(ValidationError::MissingRequired("GATEWAY_BASE_URL"));
        }
        for (field, url) in [
            ("gateway.base_url", &self.base_url),
            ("gateway.checkout_success_url", &self.checkout_success_url),
            ("gateway.checkout_cancel_url", &self.checkout_cancel_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ValidationError::InvalidUrl(field));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GatewayConfig {
        GatewayConfig {
            base_url: "https://gateway.internal".to_string(),
            notify_timeout_secs: 5,
            checkout_success_url: "https://app.example/pay/ok".to_string(),
            checkout_cancel_url: "https://app.example/pay/cancel".to_string(),
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn bare_host_fails() {
        let mut c = config();
        c.checkout_success_url = "app.example/pay/ok".to_string();
        assert!(c.validate().is_err());
    }
}
