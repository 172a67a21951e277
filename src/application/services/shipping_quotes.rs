//! Shipping quote service.
//!
//! Validates the raw quote request, runs the pure calculator, and persists
//! the immutable quote record.

use crate::domain::entities::shipping::ServiceLevel;
use crate::domain::errors::{SettlementError, SettlementResult};
use crate::domain::services::shipping::{compute_quote, ParcelSpec};
use crate::domain::value_objects::amount::Amount;
use crate::domain::value_objects::country::CountryCode;
use crate::persistence::marketplace_repository::QuoteRepository;
use crate::persistence::models::{CreateQuote, ShippingQuoteRecord};
use crate::persistence::DbPool;
use std::str::FromStr;
use tracing::info;

/// ShippingQuote input.
#[derive(Debug, Clone)]
pub struct QuoteCommand {
    pub from_country: String,
    pub to_country: Option<String>,
    pub weight_kg: f64,
    pub length_cm: f64,
    pub width_cm: f64,
    pub height_cm: f64,
    pub value_rub: i64,
    pub contents: String,
    pub service_level: Option<String>,
}

pub struct ShippingQuoteService {
    quotes: QuoteRepository,
    domestic_country: CountryCode,
}

impl ShippingQuoteService {
    pub fn new(pool: DbPool, domestic_country: CountryCode) -> Self {
        Self {
            quotes: QuoteRepository::new(pool),
            domestic_country,
        }
    }

    pub async fn quote(&self, cmd: QuoteCommand) -> SettlementResult<ShippingQuoteRecord> {
        let from_country =
            CountryCode::new(&cmd.from_country).map_err(SettlementError::Validation)?;
        let to_country = match &cmd.to_country {
            Some(raw) => CountryCode::new(raw).map_err(SettlementError::Validation)?,
            None => self.domestic_country,
        };

        for (label, value) in [
            ("weight_kg", cmd.weight_kg),
            ("length_cm", cmd.length_cm),
            ("width_cm", cmd.width_cm),
            ("height_cm", cmd.height_cm),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(SettlementError::Validation(format!(
                    "{} must be positive, got {}",
                    label, value
                )));
            }
        }
        let value_rub = Amount::positive(cmd.value_rub)
            .map_err(|_| {
                SettlementError::Validation("Declared value must be greater than zero".to_string())
            })?
            .value();
        let contents = cmd.contents.trim().to_string();
        if contents.is_empty() {
            return Err(SettlementError::Validation(
                "Contents description is required".to_string(),
            ));
        }
        let level = match &cmd.service_level {
            Some(raw) => ServiceLevel::from_str(raw).map_err(SettlementError::Validation)?,
            None => ServiceLevel::default(),
        };

        let parcel = ParcelSpec {
            weight_kg: cmd.weight_kg,
            length_cm: cmd.length_cm,
            width_cm: cmd.width_cm,
            height_cm: cmd.height_cm,
        };
        let breakdown = compute_quote(
            &parcel,
            value_rub,
            to_country,
            self.domestic_country,
            level,
        );

        let record = self
            .quotes
            .create(CreateQuote {
                id: uuid::Uuid::new_v4().to_string(),
                from_country: from_country.as_str().to_string(),
                to_country: to_country.as_str().to_string(),
                weight_kg: cmd.weight_kg,
                chargeable_weight_kg: breakdown.chargeable_weight_kg,
                length_cm: cmd.length_cm,
                width_cm: cmd.width_cm,
                height_cm: cmd.height_cm,
                value_rub,
                contents,
                service_level: level.as_str().to_string(),
                base_cost_rub: breakdown.base_cost_rub,
                duty_estimate_rub: breakdown.duty_estimate_rub,
                total_cost_rub: breakdown.total_cost_rub,
                estimated_days: breakdown.rate.transit_days as i64,
                carrier: breakdown.rate.carrier.to_string(),
                insurance_included: breakdown.rate.insurance_included,
            })
            .await?;

        info!(
            "Quoted {} -> {} at {} RUB ({} via {})",
            record.from_country, record.to_country, record.total_cost_rub,
            record.service_level, record.carrier
        );

        Ok(record)
    }
}
