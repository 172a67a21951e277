//! Payment lifecycle types.
//!
//! A payment is created in `AUTHORIZED` state and only ever moves forward:
//! `AUTHORIZED -> CAPTURED`, `AUTHORIZED -> REFUNDED`, `CAPTURED -> REFUNDED`.
//! `REFUNDED` is terminal.

use serde::{Deserialize, Serialize};

/// Supported payment providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentProvider {
    Mockpay,
    Yoomoney,
    Sber,
    Tinkoff,
}

impl PaymentProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentProvider::Mockpay => "MOCKPAY",
            PaymentProvider::Yoomoney => "YOOMONEY",
            PaymentProvider::Sber => "SBER",
            PaymentProvider::Tinkoff => "TINKOFF",
        }
    }

    pub fn all() -> [PaymentProvider; 4] {
        [
            PaymentProvider::Mockpay,
            PaymentProvider::Yoomoney,
            PaymentProvider::Sber,
            PaymentProvider::Tinkoff,
        ]
    }
}

impl std::str::FromStr for PaymentProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MOCKPAY" => Ok(PaymentProvider::Mockpay),
            "YOOMONEY" => Ok(PaymentProvider::Yoomoney),
            "SBER" => Ok(PaymentProvider::Sber),
            "TINKOFF" => Ok(PaymentProvider::Tinkoff),
            other => Err(format!("Unknown payment provider: {}", other)),
        }
    }
}

impl std::fmt::Display for PaymentProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Authorized,
    Captured,
    Cancelled,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Authorized => "AUTHORIZED",
            PaymentStatus::Captured => "CAPTURED",
            PaymentStatus::Cancelled => "CANCELLED",
            PaymentStatus::Refunded => "REFUNDED",
        }
    }

    /// Only an authorized payment can be captured.
    pub fn can_capture(&self) -> bool {
        matches!(self, PaymentStatus::Authorized)
    }

    /// Authorized and captured payments can be refunded; REFUNDED is terminal.
    pub fn can_refund(&self) -> bool {
        matches!(self, PaymentStatus::Authorized | PaymentStatus::Captured)
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AUTHORIZED" => Ok(PaymentStatus::Authorized),
            "CAPTURED" => Ok(PaymentStatus::Captured),
            "CANCELLED" => Ok(PaymentStatus::Cancelled),
            "REFUNDED" => Ok(PaymentStatus::Refunded),
            other => Err(format!("Unknown payment status: {}", other)),
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_provider_round_trip() {
        for provider in PaymentProvider::all() {
            assert_eq!(
                PaymentProvider::from_str(provider.as_str()).unwrap(),
                provider
            );
        }
    }

    #[test]
    fn test_provider_unknown() {
        assert!(PaymentProvider::from_str("PAYPAL").is_err());
        assert!(PaymentProvider::from_str("mockpay").is_err());
    }

    #[test]
    fn test_status_transitions() {
        assert!(PaymentStatus::Authorized.can_capture());
        assert!(!PaymentStatus::Captured.can_capture());
        assert!(!PaymentStatus::Refunded.can_capture());

        assert!(PaymentStatus::Authorized.can_refund());
        assert!(PaymentStatus::Captured.can_refund());
        assert!(!PaymentStatus::Refunded.can_refund());
        assert!(!PaymentStatus::Cancelled.can_refund());
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            PaymentStatus::Authorized,
            PaymentStatus::Captured,
            PaymentStatus::Cancelled,
            PaymentStatus::Refunded,
        ] {
            assert_eq!(PaymentStatus::from_str(status.as_str()).unwrap(), status);
        }
    }
}
