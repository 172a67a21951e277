//! Central Bank of Russia daily rate source.
//!
//! Fetches the published daily quotes and exposes them through the
//! [`RateSource`] trait consumed by the FX cache.

use crate::domain::services::fx::{RateError, RateResult, RateSource};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

const DEFAULT_RATES_URL: &str = "https://www.cbr-xml-daily.ru/daily_json.js";

#[derive(Debug, Deserialize)]
struct DailyRates {
    #[serde(rename = "Valute")]
    valute: HashMap<String, ValuteQuote>,
}

#[derive(Debug, Deserialize)]
struct ValuteQuote {
    #[serde(rename = "Nominal")]
    nominal: f64,
    #[serde(rename = "Value")]
    value: f64,
}

/// Rubles per one unit of the quoted currency. The CBR publishes some
/// currencies per 10 or 100 units; the nominal normalizes that away.
fn rate_from_payload(payload: &DailyRates, currency: &str) -> RateResult<f64> {
    let quote = payload
        .valute
        .get(currency)
        .ok_or_else(|| RateError::UnknownCurrency(currency.to_string()))?;
    if quote.nominal <= 0.0 {
        return Err(RateError::Unavailable(format!(
            "malformed nominal for {}",
            currency
        )));
    }
    Ok(quote.value / quote.nominal)
}

pub struct CbrRateSource {
    http: reqwest::Client,
    url: String,
}

impl CbrRateSource {
    pub fn new() -> Self {
        Self::with_url(DEFAULT_RATES_URL.to_string())
    }

    pub fn with_url(url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            url,
        }
    }
}

impl Default for CbrRateSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RateSource for CbrRateSource {
    async fn rub_rate(&self, currency: &str) -> RateResult<f64> {
        let payload = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| RateError::Unavailable(e.to_string()))?
            .json::<DailyRates>()
            .await
            .map_err(|e| RateError::Unavailable(e.to_string()))?;

        let rate = rate_from_payload(&payload, currency)?;
        debug!("CBR rate for {}: {}", currency, rate);
        Ok(rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_payload() -> DailyRates {
        serde_json::from_str(
            r#"{
                "Valute": {
                    "USD": {"Nominal": 1, "Value": 92.5},
                    "KZT": {"Nominal": 100, "Value": 19.4}
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_rate_per_single_unit() {
        let payload = sample_payload();
        assert_eq!(rate_from_payload(&payload, "USD").unwrap(), 92.5);
    }

    #[test]
    fn test_rate_normalizes_nominal() {
        let payload = sample_payload();
        let rate = rate_from_payload(&payload, "KZT").unwrap();
        assert!((rate - 0.194).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_currency() {
        let payload = sample_payload();
        assert!(matches!(
            rate_from_payload(&payload, "EUR"),
            Err(RateError::UnknownCurrency(_))
        ));
    }
}
