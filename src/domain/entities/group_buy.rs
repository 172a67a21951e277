//! Group-buy deal types and discount arithmetic.

use crate::domain::value_objects::amount::Amount;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DealStatus {
    Active,
    Completed,
    Cancelled,
}

impl DealStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DealStatus::Active => "ACTIVE",
            DealStatus::Completed => "COMPLETED",
            DealStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::str::FromStr for DealStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(DealStatus::Active),
            "COMPLETED" => Ok(DealStatus::Completed),
            "CANCELLED" => Ok(DealStatus::Cancelled),
            other => Err(format!("Unknown deal status: {}", other)),
        }
    }
}

impl std::fmt::Display for DealStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PledgeStatus {
    Pending,
    Confirmed,
}

impl PledgeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PledgeStatus::Pending => "PENDING",
            PledgeStatus::Confirmed => "CONFIRMED",
        }
    }
}

impl std::str::FromStr for PledgeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(PledgeStatus::Pending),
            "CONFIRMED" => Ok(PledgeStatus::Confirmed),
            other => Err(format!("Unknown pledge status: {}", other)),
        }
    }
}

/// Per-unit price split produced when a deal closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscountBreakdown {
    pub original_price: i64,
    pub discount_per_unit: i64,
    pub discounted_price: i64,
}

/// Split a unit price by the deal's discount percentage (half-up rounding).
pub fn discount_breakdown(
    original_price: i64,
    discount_percentage: i64,
) -> Result<DiscountBreakdown, String> {
    let price = Amount::new(original_price)?;
    let discount_per_unit = price.percentage(discount_percentage)?.value();
    Ok(DiscountBreakdown {
        original_price,
        discount_per_unit,
        discounted_price: original_price - discount_per_unit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_deal_status_round_trip() {
        for status in [
            DealStatus::Active,
            DealStatus::Completed,
            DealStatus::Cancelled,
        ] {
            assert_eq!(DealStatus::from_str(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn test_discount_breakdown_worked_example() {
        // 1000 at 15% -> 150 off, 850 to pay.
        let split = discount_breakdown(1000, 15).unwrap();
        assert_eq!(split.discount_per_unit, 150);
        assert_eq!(split.discounted_price, 850);
    }

    #[test]
    fn test_discount_breakdown_rounds_half_up() {
        // 999 * 15% = 149.85 -> 150
        let split = discount_breakdown(999, 15).unwrap();
        assert_eq!(split.discount_per_unit, 150);
        assert_eq!(split.discounted_price, 849);
    }

    #[test]
    fn test_discount_breakdown_zero_percent() {
        let split = discount_breakdown(500, 0).unwrap();
        assert_eq!(split.discount_per_unit, 0);
        assert_eq!(split.discounted_price, 500);
    }

    #[test]
    fn test_discount_breakdown_rejects_bad_input() {
        assert!(discount_breakdown(-1, 10).is_err());
        assert!(discount_breakdown(1000, 150).is_err());
    }
}
