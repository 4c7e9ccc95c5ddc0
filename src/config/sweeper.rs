//! Expiration sweep scheduling configuration.

use serde::Deserialize;

use super::error::ValidationError;

/// How often the expiration sweep runs.
#[derive(Debug, Clone, Deserialize)]
pub struct SweeperConfig {
    /// Sweep interval in seconds.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

fn default_interval_secs() -> u64 {
    3_600
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

impl SweeperConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.interval_secs == 0 {
            return Err(ValidationError::InvalidValue {
                field: "sweeper.interval_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_hourly() {
        assert_eq!(SweeperConfig::default().interval_secs, 3_600);
    }

    #[test]
    fn zero_interval_fails() {
        let config = SweeperConfig { interval_secs: 0 };
        assert!(config.validate().is_err());
    }
}
