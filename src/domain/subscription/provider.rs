//! Payment provider tag.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::ValidationError;

/// Which external payment processor a subscription is billed through.
///
/// Closed set: adding a provider is a new enum case, never a string match
/// scattered through the codebase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProviderKind {
    Stripe,
    Paypal,
}

impl ProviderKind {
    /// Canonical wire/provider-tag form.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Stripe => "STRIPE",
            ProviderKind::Paypal => "PAYPAL",
        }
    }

    /// Parses a provider tag, case-insensitively.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s.to_uppercase().as_str() {
            "STRIPE" => Ok(ProviderKind::Stripe),
            "PAYPAL" => Ok(ProviderKind::Paypal),
            other => Err(ValidationError::invalid_format(
                "provider",
                format!("unknown provider tag: {}", other),
            )),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
