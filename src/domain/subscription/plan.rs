//! Subscription plan kinds and the fixed price table.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::ValidationError;

/// Billing cadence of a subscription plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanKind {
    Day,
    Weekly,
    Monthly,
}

impl PlanKind {
    /// Price in minor currency units. Fixed table, intentionally simple.
    pub fn price_minor(&self) -> i64 {
        match self {
            PlanKind::Day => 100,
            PlanKind::Weekly => 500,
            PlanKind::Monthly => 1_500,
        }
    }

    /// Length of one billing period in days.
    pub fn period_days(&self) -> i64 {
        match self {
            PlanKind::Day => 1,
            PlanKind::Weekly => 7,
            PlanKind::Monthly => 30,
        }
    }

    /// Canonical wire form.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanKind::Day => "DAY",
            PlanKind::Weekly => "WEEKLY",
            PlanKind::Monthly => "MONTHLY",
        }
    }

    /// Parses a plan kind, case-insensitively.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s.to_uppercase().as_str() {
            "DAY" => Ok(PlanKind::Day),
            "WEEKLY" => Ok(PlanKind::Weekly),
            "MONTHLY" => Ok(PlanKind::Monthly),
            other => Err(ValidationError::invalid_format(
                "plan",
                format!("unknown plan kind: {}", other),
            )),
        }
    }
}

impl fmt::Display for PlanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
