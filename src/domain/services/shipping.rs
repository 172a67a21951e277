//! Shipping quote arithmetic.
//!
//! Pure computation over validated inputs: volumetric weight, carrier base
//! cost, and the tiered customs duty estimate. Persistence of the resulting
//! quote happens in the application layer; nothing here mutates state.

use crate::domain::entities::shipping::{RateCard, ServiceLevel};
use crate::domain::value_objects::country::CountryCode;

/// Industry-standard volumetric divisor for cm³ -> kg.
pub const VOLUMETRIC_DIVISOR: f64 = 5000.0;

/// Declared value up to this many rubles enters duty-free.
pub const DUTY_FREE_LIMIT_RUB: i64 = 200;
/// Declared value up to this many rubles pays the reduced duty tier.
pub const DUTY_REDUCED_LIMIT_RUB: i64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParcelSpec {
    pub weight_kg: f64,
    pub length_cm: f64,
    pub width_cm: f64,
    pub height_cm: f64,
}

impl ParcelSpec {
    pub fn volumetric_weight_kg(&self) -> f64 {
        (self.length_cm * self.width_cm * self.height_cm) / VOLUMETRIC_DIVISOR
    }

    /// Carriers bill the greater of actual and volumetric weight.
    pub fn chargeable_weight_kg(&self) -> f64 {
        self.weight_kg.max(self.volumetric_weight_kg())
    }
}

/// Everything a quote record and response needs, before persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteBreakdown {
    pub chargeable_weight_kg: f64,
    pub base_cost_rub: i64,
    pub duty_estimate_rub: i64,
    pub total_cost_rub: i64,
    pub rate: RateCard,
}

/// Tiered duty on declared value, levied only on parcels entering the
/// domestic customs territory.
pub fn duty_estimate_rub(
    value_rub: i64,
    to_country: CountryCode,
    domestic_country: CountryCode,
) -> i64 {
    if to_country != domestic_country {
        return 0;
    }
    if value_rub <= DUTY_FREE_LIMIT_RUB {
        0
    } else if value_rub <= DUTY_REDUCED_LIMIT_RUB {
        (value_rub * 15 + 50) / 100
    } else {
        (value_rub * 20 + 50) / 100
    }
}

pub fn compute_quote(
    parcel: &ParcelSpec,
    value_rub: i64,
    to_country: CountryCode,
    domestic_country: CountryCode,
    level: ServiceLevel,
) -> QuoteBreakdown {
    let rate = level.rate_card();
    let chargeable = parcel.chargeable_weight_kg();
    let billed_units = chargeable.ceil() as i64;
    let base_cost_rub = rate.base_rate_rub * billed_units;
    let duty = duty_estimate_rub(value_rub, to_country, domestic_country);
    QuoteBreakdown {
        chargeable_weight_kg: chargeable,
        base_cost_rub,
        duty_estimate_rub: duty,
        total_cost_rub: base_cost_rub + duty,
        rate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ru() -> CountryCode {
        CountryCode::new("RU").unwrap()
    }

    fn de() -> CountryCode {
        CountryCode::new("DE").unwrap()
    }

    #[test]
    fn test_volumetric_weight_dominates_light_parcels() {
        // 40x30x20 cm = 24000 cm3 -> 4.8 kg volumetric vs 2 kg actual.
        let parcel = ParcelSpec {
            weight_kg: 2.0,
            length_cm: 40.0,
            width_cm: 30.0,
            height_cm: 20.0,
        };
        assert!((parcel.volumetric_weight_kg() - 4.8).abs() < 1e-9);
        assert!((parcel.chargeable_weight_kg() - 4.8).abs() < 1e-9);
    }

    #[test]
    fn test_actual_weight_dominates_dense_parcels() {
        let parcel = ParcelSpec {
            weight_kg: 10.0,
            length_cm: 20.0,
            width_cm: 20.0,
            height_cm: 20.0,
        };
        assert!((parcel.chargeable_weight_kg() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_worked_example_standard_domestic() {
        // chargeable 4.8 kg -> 5 billed units * 800 = 4000 base;
        // value 500 in the reduced tier -> 75 duty; total 4075.
        let parcel = ParcelSpec {
            weight_kg: 2.0,
            length_cm: 40.0,
            width_cm: 30.0,
            height_cm: 20.0,
        };
        let quote = compute_quote(&parcel, 500, ru(), ru(), ServiceLevel::Standard);
        assert_eq!(quote.base_cost_rub, 4000);
        assert_eq!(quote.duty_estimate_rub, 75);
        assert_eq!(quote.total_cost_rub, 4075);
        assert_eq!(quote.rate.carrier, "CDEK");
        assert_eq!(quote.rate.transit_days, 7);
    }

    #[test]
    fn test_duty_tiers() {
        assert_eq!(duty_estimate_rub(200, ru(), ru()), 0);
        assert_eq!(duty_estimate_rub(201, ru(), ru()), 30);
        assert_eq!(duty_estimate_rub(1000, ru(), ru()), 150);
        assert_eq!(duty_estimate_rub(1001, ru(), ru()), 200);
        assert_eq!(duty_estimate_rub(5000, ru(), ru()), 1000);
    }

    #[test]
    fn test_no_duty_for_foreign_destination() {
        assert_eq!(duty_estimate_rub(5000, de(), ru()), 0);

        let parcel = ParcelSpec {
            weight_kg: 1.0,
            length_cm: 10.0,
            width_cm: 10.0,
            height_cm: 10.0,
        };
        let quote = compute_quote(&parcel, 5000, de(), ru(), ServiceLevel::Economy);
        assert_eq!(quote.duty_estimate_rub, 0);
        assert_eq!(quote.total_cost_rub, quote.base_cost_rub);
    }

    #[test]
    fn test_exact_kilo_boundary_is_not_rounded_up() {
        let parcel = ParcelSpec {
            weight_kg: 3.0,
            length_cm: 10.0,
            width_cm: 10.0,
            height_cm: 10.0,
        };
        let quote = compute_quote(&parcel, 100, ru(), ru(), ServiceLevel::Economy);
        // 3.0 kg bills exactly 3 units.
        assert_eq!(quote.base_cost_rub, 450 * 3);
    }
}
