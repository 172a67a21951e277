//! Shipping service levels and the carrier rate card.
//!
//! Service levels are a closed enum with an exhaustive rate table; there is
//! deliberately no string-keyed lookup that could silently miss a level.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceLevel {
    Economy,
    Standard,
    Express,
    Overnight,
}

/// Fixed pricing and delivery characteristics of one service level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateCard {
    /// Rubles per started kilogram of chargeable weight.
    pub base_rate_rub: i64,
    pub transit_days: u32,
    pub carrier: &'static str,
    pub insurance_included: bool,
}

impl ServiceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceLevel::Economy => "ECONOMY",
            ServiceLevel::Standard => "STANDARD",
            ServiceLevel::Express => "EXPRESS",
            ServiceLevel::Overnight => "OVERNIGHT",
        }
    }

    pub fn rate_card(&self) -> RateCard {
        match self {
            ServiceLevel::Economy => RateCard {
                base_rate_rub: 450,
                transit_days: 14,
                carrier: "Pochta Rossii",
                insurance_included: false,
            },
            ServiceLevel::Standard => RateCard {
                base_rate_rub: 800,
                transit_days: 7,
                carrier: "CDEK",
                insurance_included: true,
            },
            ServiceLevel::Express => RateCard {
                base_rate_rub: 1500,
                transit_days: 3,
                carrier: "DPD Express",
                insurance_included: true,
            },
            ServiceLevel::Overnight => RateCard {
                base_rate_rub: 3000,
                transit_days: 1,
                carrier: "Dostavista",
                insurance_included: true,
            },
        }
    }
}

impl Default for ServiceLevel {
    fn default() -> Self {
        ServiceLevel::Standard
    }
}

impl std::str::FromStr for ServiceLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ECONOMY" => Ok(ServiceLevel::Economy),
            "STANDARD" => Ok(ServiceLevel::Standard),
            "EXPRESS" => Ok(ServiceLevel::Express),
            "OVERNIGHT" => Ok(ServiceLevel::Overnight),
            other => Err(format!("Unknown service level: {}", other)),
        }
    }
}

impl std::fmt::Display for ServiceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
