//! Outbound ports.

use async_trait::async_trait;
use thiserror::Error;

/// Exchange-rate lookup failures.
///
/// Always recovered locally: the driver falls back to the static BTC
/// denomination and never surfaces these.
#[derive(Debug, Error)]
pub enum RateError {
    /// Transport-level failure reaching the rate service
    #[error("rate lookup transport: {0}")]
    Transport(String),

    /// Response could not be parsed
    #[error("rate lookup malformed response: {0}")]
    Malformed(String),

    /// Response carried no entry for the requested currency
    #[error("no rate for currency {0}")]
    MissingCurrency(String),

    /// Rate value unusable for conversion
    #[error("unusable rate {rate} for currency {code}")]
    UnusableRate {
        /// Currency code
        code: String,
        /// Offending rate value
        rate: f64,
    },
}

/// One currency's exchange rate against BTC.
#[derive(Clone, Debug, PartialEq)]
pub struct ExchangeRate {
    /// Currency code, e.g. `USD`.
    pub code: String,
    /// Fiat units per BTC.
    pub rate: f64,
}

/// External exchange-rate lookup service.
#[async_trait]
pub trait ExchangeRateProvider: Send + Sync {
    /// Fetch the current (currency code, rate) pairs.
    async fn exchange_rates(&self) -> Result<Vec<ExchangeRate>, RateError>;
}

/// Fixed in-memory rates, for tests and offline operation.
pub struct StaticRateProvider {
    rates: Vec<ExchangeRate>,
}

impl StaticRateProvider {
    /// Provider always answering with the given rates.
    pub fn new(rates: Vec<ExchangeRate>) -> Self {
        Self { rates }
    }
}

#[async_trait]
impl ExchangeRateProvider for StaticRateProvider {
    async fn exchange_rates(&self) -> Result<Vec<ExchangeRate>, RateError> {
        Ok(self.rates.clone())
    }
}
