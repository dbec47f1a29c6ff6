//! HTTP exchange-rate client.
//!
//! Adapter behind [`ExchangeRateProvider`] hitting a smartbit-style
//! endpoint. Failures map into [`RateError`] and are absorbed by the
//! round driver's static fallback, so nothing here is fatal.

use async_trait::async_trait;
use chaumix_coordinator::{ExchangeRate, ExchangeRateProvider, RateError};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Deserialize)]
struct RatesResponse {
    exchange_rates: Vec<RateEntry>,
}

#[derive(Deserialize)]
struct RateEntry {
    code: String,
    #[serde(deserialize_with = "rate_value")]
    rate: f64,
}

/// The endpoint serves rates as JSON strings; accept numbers too.
fn rate_value<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        String(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(value) => Ok(value),
        NumberOrString::String(text) => text.parse().map_err(serde::de::Error::custom),
    }
}

/// Exchange-rate lookup over HTTP.
pub struct HttpRateProvider {
    client: reqwest::Client,
    url: String,
}

impl HttpRateProvider {
    /// Client for the given endpoint URL.
    pub fn new(url: impl Into<String>) -> Result<Self, RateError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RateError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl ExchangeRateProvider for HttpRateProvider {
    async fn exchange_rates(&self) -> Result<Vec<ExchangeRate>, RateError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| RateError::Transport(e.to_string()))?;

        let parsed: RatesResponse = response
            .json()
            .await
            .map_err(|e| RateError::Malformed(e.to_string()))?;

        debug!(rates = parsed.exchange_rates.len(), "fetched exchange rates");
        Ok(parsed
            .exchange_rates
            .into_iter()
            .map(|entry| ExchangeRate {
                code: entry.code,
                rate: entry.rate,
            })
            .collect())
    }
}
