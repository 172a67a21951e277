//! Order lifecycle and escrow types.
//!
//! `status` and `escrow_status` on an order are written only by the
//! settlement services; the persistence layer exposes guarded transition
//! methods rather than a general status setter.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Paid,
    Fulfilling,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Paid => "PAID",
            OrderStatus::Fulfilling => "FULFILLING",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(OrderStatus::Pending),
            "PAID" => Ok(OrderStatus::Paid),
            "FULFILLING" => Ok(OrderStatus::Fulfilling),
            "DELIVERED" => Ok(OrderStatus::Delivered),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            other => Err(format!("Unknown order status: {}", other)),
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EscrowStatus {
    Held,
    Released,
    Refunded,
}

impl EscrowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EscrowStatus::Held => "HELD",
            EscrowStatus::Released => "RELEASED",
            EscrowStatus::Refunded => "REFUNDED",
        }
    }
}

impl std::str::FromStr for EscrowStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HELD" => Ok(EscrowStatus::Held),
            "RELEASED" => Ok(EscrowStatus::Released),
            "REFUNDED" => Ok(EscrowStatus::Refunded),
            other => Err(format!("Unknown escrow status: {}", other)),
        }
    }
}

impl std::fmt::Display for EscrowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What an order purchases. Exactly one target is set on every order row;
/// the table carries a CHECK constraint mirroring this sum type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseTarget {
    Listing(String),
    VendorProduct(i64),
    ServiceBooking(String),
}

impl PurchaseTarget {
    /// Decompose into the three nullable order columns.
    pub fn into_columns(self) -> (Option<String>, Option<i64>, Option<String>) {
        match self {
            PurchaseTarget::Listing(id) => (Some(id), None, None),
            PurchaseTarget::VendorProduct(id) => (None, Some(id), None),
            PurchaseTarget::ServiceBooking(id) => (None, None, Some(id)),
        }
    }

    /// Reconstruct from the three nullable order columns, rejecting rows
    /// that do not carry exactly one target.
    pub fn from_columns(
        listing_id: Option<String>,
        vendor_product_id: Option<i64>,
        service_booking_id: Option<String>,
    ) -> Result<Self, String> {
        match (listing_id, vendor_product_id, service_booking_id) {
            (Some(id), None, None) => Ok(PurchaseTarget::Listing(id)),
            (None, Some(id), None) => Ok(PurchaseTarget::VendorProduct(id)),
            (None, None, Some(id)) => Ok(PurchaseTarget::ServiceBooking(id)),
            _ => Err("Order must reference exactly one purchase target".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_order_status_round_trip() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Paid,
            OrderStatus::Fulfilling,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(OrderStatus::from_str(status.as_str()).unwrap(), status);
        }
        assert!(OrderStatus::from_str("SHIPPED").is_err());
    }

    #[test]
    fn test_escrow_status_round_trip() {
        for status in [
            EscrowStatus::Held,
            EscrowStatus::Released,
            EscrowStatus::Refunded,
        ] {
            assert_eq!(EscrowStatus::from_str(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn test_purchase_target_columns_round_trip() {
        let targets = [
            PurchaseTarget::Listing("lst-1".to_string()),
            PurchaseTarget::VendorProduct(42),
            PurchaseTarget::ServiceBooking("bk-9".to_string()),
        ];
        for target in targets {
            let (l, v, s) = target.clone().into_columns();
            assert_eq!(PurchaseTarget::from_columns(l, v, s).unwrap(), target);
        }
    }

    #[test]
    fn test_purchase_target_rejects_ambiguous_rows() {
        assert!(PurchaseTarget::from_columns(None, None, None).is_err());
        assert!(PurchaseTarget::from_columns(
            Some("lst-1".to_string()),
            Some(42),
            None
        )
        .is_err());
    }
}
