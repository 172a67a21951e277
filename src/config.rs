//! Service configuration loaded from the environment.

use crate::domain::value_objects::country::CountryCode;
use std::net::SocketAddr;

#[derive(Clone)]
pub struct SettlementConfig {
    pub bind_addr: SocketAddr,
    pub database_url: String,
    /// Customs territory for duty estimation.
    pub domestic_country: CountryCode,
    /// Override for the daily-rates endpoint; None uses the published URL.
    pub rates_url: Option<String>,
    pub fx_ttl_secs: i64,
    pub requests_per_minute: u32,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            database_url: "sqlite://data/kassa.db".to_string(),
            domestic_country: CountryCode::new("RU").expect("static country code"),
            rates_url: None,
            fx_ttl_secs: 600,
            requests_per_minute: 120,
        }
    }
}

impl SettlementConfig {
    /// Load from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();

        let bind_addr = match std::env::var("KASSA_BIND_ADDR") {
            Ok(raw) => raw
                .parse()
                .map_err(|e| format!("Invalid KASSA_BIND_ADDR {:?}: {}", raw, e))?,
            Err(_) => defaults.bind_addr,
        };

        let database_url =
            std::env::var("DATABASE_URL").unwrap_or(defaults.database_url);

        let domestic_country = match std::env::var("KASSA_DOMESTIC_COUNTRY") {
            Ok(raw) => CountryCode::new(&raw)
                .map_err(|e| format!("Invalid KASSA_DOMESTIC_COUNTRY: {}", e))?,
            Err(_) => defaults.domestic_country,
        };

        let rates_url = std::env::var("KASSA_RATES_URL").ok();

        let fx_ttl_secs = std::env::var("KASSA_FX_TTL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.fx_ttl_secs);

        let requests_per_minute = std::env::var("KASSA_REQUESTS_PER_MINUTE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.requests_per_minute);

        Ok(Self {
            bind_addr,
            database_url,
            domestic_country,
            rates_url,
            fx_ttl_secs,
            requests_per_minute,
        })
    }
}
