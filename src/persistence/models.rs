//! Database Models
//!
//! Persistent row types for the ledger store and the typed inputs the
//! repositories accept. Status columns are stored as their wire strings;
//! the domain enums in `crate::domain::entities` parse them at the edges.

use crate::domain::entities::booking::BookingStatus;
use crate::domain::entities::ledger::LedgerEntryKind;
use crate::domain::entities::order::{EscrowStatus, OrderStatus, PurchaseTarget};
use crate::domain::entities::payment::{PaymentProvider, PaymentStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Payment row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PaymentRecord {
    pub id: String,
    pub provider: String,
    pub provider_ref: String,
    pub amount_rub: i64,
    pub currency: String,
    pub status: String,
    /// JSON object string
    pub metadata: String,
    pub processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Order row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrderRecord {
    pub id: String,
    pub buyer_id: String,
    pub seller_id: String,
    pub listing_id: Option<String>,
    pub vendor_product_id: Option<i64>,
    pub service_booking_id: Option<String>,
    pub payment_id: Option<String>,
    pub status: String,
    pub escrow_status: String,
    pub total_amount_rub: i64,
    pub escrow_amount_rub: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Vendor catalog product row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VendorProductRecord {
    pub id: i64,
    pub vendor_id: String,
    pub title: String,
    pub price_rub: i64,
}

/// Service catalog row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ServiceRecord {
    pub id: String,
    pub provider_id: String,
    pub title: String,
    pub price_rub: i64,
}

/// Service booking row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ServiceBookingRecord {
    pub id: String,
    pub client_id: String,
    pub service_id: String,
    pub status: String,
    pub escrow_status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Group-buy deal row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GroupBuyDealRecord {
    pub id: i64,
    pub vendor_product_id: i64,
    pub min_quantity: i64,
    pub current_quantity: i64,
    pub discount_percentage: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Group-buy pledge row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GroupBuyOrderRecord {
    pub id: i64,
    pub deal_id: i64,
    pub buyer_id: String,
    pub payment_id: Option<String>,
    pub price_per_unit_rub: i64,
    pub total_amount_rub: i64,
    pub discount_amount_rub: i64,
    pub status: String,
    pub order_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl GroupBuyOrderRecord {
    /// Units pledged, implicit in the stored money fields.
    pub fn quantity(&self) -> i64 {
        if self.price_per_unit_rub > 0 {
            self.total_amount_rub / self.price_per_unit_rub
        } else {
            1
        }
    }
}

/// Payout ledger row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PayoutLedgerRecord {
    pub id: i64,
    pub user_id: String,
    pub order_id: String,
    pub amount_rub: i64,
    pub kind: String,
    pub idempotency_key: String,
    pub created_at: DateTime<Utc>,
}

/// Shipping quote row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ShippingQuoteRecord {
    pub id: String,
    pub from_country: String,
    pub to_country: String,
    pub weight_kg: f64,
    pub chargeable_weight_kg: f64,
    pub length_cm: f64,
    pub width_cm: f64,
    pub height_cm: f64,
    pub value_rub: i64,
    pub contents: String,
    pub service_level: String,
    pub base_cost_rub: i64,
    pub duty_estimate_rub: i64,
    pub total_cost_rub: i64,
    pub estimated_days: i64,
    pub carrier: String,
    pub insurance_included: bool,
    pub created_at: DateTime<Utc>,
}

/// Create payment input
#[derive(Debug, Clone)]
pub struct CreatePayment {
    pub id: String,
    pub provider: PaymentProvider,
    pub provider_ref: String,
    pub amount_rub: i64,
    pub currency: String,
    pub status: PaymentStatus,
    /// JSON object string
    pub metadata: String,
    pub processed_at: Option<DateTime<Utc>>,
}

/// Create order input
#[derive(Debug, Clone)]
pub struct CreateOrder {
    pub id: String,
    pub buyer_id: String,
    pub seller_id: String,
    pub target: PurchaseTarget,
    pub payment_id: Option<String>,
    pub status: OrderStatus,
    pub escrow_status: EscrowStatus,
    pub total_amount_rub: i64,
    pub escrow_amount_rub: i64,
}

/// Create group-buy deal input
#[derive(Debug, Clone)]
pub struct CreateDeal {
    pub vendor_product_id: i64,
    pub min_quantity: i64,
    pub discount_percentage: i64,
}

/// Create booking input
#[derive(Debug, Clone)]
pub struct CreateBooking {
    pub id: String,
    pub client_id: String,
    pub service_id: String,
    pub status: BookingStatus,
}

/// Append ledger entry input
#[derive(Debug, Clone)]
pub struct CreateLedgerEntry {
    pub user_id: String,
    pub order_id: String,
    pub amount_rub: i64,
    pub kind: LedgerEntryKind,
    pub idempotency_key: String,
}

/// Create shipping quote input
#[derive(Debug, Clone)]
pub struct CreateQuote {
    pub id: String,
    pub from_country: String,
    pub to_country: String,
    pub weight_kg: f64,
    pub chargeable_weight_kg: f64,
    pub length_cm: f64,
    pub width_cm: f64,
    pub height_cm: f64,
    pub value_rub: i64,
    pub contents: String,
    pub service_level: String,
    pub base_cost_rub: i64,
    pub duty_estimate_rub: i64,
    pub total_cost_rub: i64,
    pub estimated_days: i64,
    pub carrier: String,
    pub insurance_included: bool,
}
