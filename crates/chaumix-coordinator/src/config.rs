//! Coordinator configuration.
//!
//! A JSON file owned by the operator; created with defaults on first
//! start (the file is then there to edit).

use crate::domain::DenominationAlgorithm;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration load/validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading or writing the config file failed
    #[error("config file io: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid JSON for this schema
    #[error("config file parse: {0}")]
    Parse(#[from] serde_json::Error),

    /// A field combination fails validation
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Runtime configuration for the round driver.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoordinatorConfig {
    /// Smallest anonymity set a round may target.
    pub minimum_anonymity_set: u32,

    /// Largest anonymity set a round may target.
    pub maximum_anonymity_set: u32,

    /// Target average duration of InputRegistration; the adaptive
    /// calculation steers toward this.
    pub average_input_registration_secs: u64,

    /// InputRegistration phase timeout.
    pub input_registration_timeout_secs: u64,

    /// InputConfirmation phase timeout.
    pub input_confirmation_timeout_secs: u64,

    /// OutputRegistration phase timeout.
    pub output_registration_timeout_secs: u64,

    /// Signing phase timeout.
    pub signing_timeout_secs: u64,

    /// How the round denomination is chosen.
    pub denomination_algorithm: DenominationAlgorithm,

    /// Static BTC denomination; also the fallback for the fiat peg.
    pub denomination_btc: f64,

    /// Fiat target amount for [`DenominationAlgorithm::FixedFiat`].
    pub denomination_fiat: f64,

    /// Currency code the fiat target is denominated in.
    pub fiat_currency_code: String,

    /// Exchange-rate lookup endpoint.
    pub exchange_rate_url: String,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            minimum_anonymity_set: 3,
            maximum_anonymity_set: 100,
            average_input_registration_secs: 180,
            input_registration_timeout_secs: 3600,
            input_confirmation_timeout_secs: 60,
            output_registration_timeout_secs: 60,
            signing_timeout_secs: 60,
            denomination_algorithm: DenominationAlgorithm::FixedFiat,
            denomination_btc: 0.1,
            denomination_fiat: 100.0,
            fiat_currency_code: "USD".to_string(),
            exchange_rate_url: "https://api.smartbit.com.au/v1/exchange-rates".to_string(),
        }
    }
}

impl CoordinatorConfig {
    /// Load from `path`, or write defaults there when the file is absent.
    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: Self = serde_json::from_str(&contents)?;
            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            std::fs::write(path, serde_json::to_string_pretty(&config)?)?;
            tracing::info!(path = %path.display(), "config file did not exist, created with defaults");
            Ok(config)
        }
    }

    /// Check field combinations a serde schema cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.minimum_anonymity_set == 0 {
            return Err(ConfigError::Invalid(
                "minimum_anonymity_set must be at least 1".into(),
            ));
        }
        if self.minimum_anonymity_set > self.maximum_anonymity_set {
            return Err(ConfigError::Invalid(format!(
                "minimum_anonymity_set {} exceeds maximum_anonymity_set {}",
                self.minimum_anonymity_set, self.maximum_anonymity_set
            )));
        }
        for (name, secs) in [
            (
                "input_registration_timeout_secs",
                self.input_registration_timeout_secs,
            ),
            (
                "input_confirmation_timeout_secs",
                self.input_confirmation_timeout_secs,
            ),
            (
                "output_registration_timeout_secs",
                self.output_registration_timeout_secs,
            ),
            ("signing_timeout_secs", self.signing_timeout_secs),
        ] {
            if secs == 0 {
                return Err(ConfigError::Invalid(format!("{name} must be non-zero")));
            }
        }
        if !(self.denomination_btc.is_finite() && self.denomination_btc > 0.0) {
            return Err(ConfigError::Invalid(
                "denomination_btc must be a positive number".into(),
            ));
        }
        if !(self.denomination_fiat.is_finite() && self.denomination_fiat > 0.0) {
            return Err(ConfigError::Invalid(
                "denomination_fiat must be a positive number".into(),
            ));
        }
        Ok(())
    }

    /// Target average InputRegistration duration.
    pub fn average_input_registration(&self) -> Duration {
        Duration::from_secs(self.average_input_registration_secs)
    }

    /// Timeout for the given phase's wait.
    pub fn phase_timeout(&self, phase: crate::domain::Phase) -> Duration {
        use crate::domain::Phase;
        let secs = match phase {
            Phase::InputRegistration => self.input_registration_timeout_secs,
            Phase::InputConfirmation => self.input_confirmation_timeout_secs,
            Phase::OutputRegistration => self.output_registration_timeout_secs,
            Phase::Signing => self.signing_timeout_secs,
        };
        Duration::from_secs(secs)
    }
}
