//! Service Booking Settlement
//!
//! Completes a confirmed booking: releases its escrow, resolves the
//! marketplace order (upsert-shaped), records the out-of-band charge as an
//! already-captured payment, and credits the service provider's payout
//! ledger. The ledger credit is best-effort: a failed append is logged
//! and the completion still succeeds.

use crate::domain::entities::booking::BookingStatus;
use crate::domain::entities::ledger::{idempotency_key, LedgerEntryKind};
use crate::domain::entities::order::{EscrowStatus, OrderStatus, PurchaseTarget};
use crate::domain::entities::payment::{PaymentProvider, PaymentStatus};
use crate::domain::errors::{SettlementError, SettlementResult};
use crate::infrastructure::gateways::reference_suffix;
use crate::persistence::marketplace_repository::BookingRepository;
use crate::persistence::models::{CreateLedgerEntry, CreateOrder, CreatePayment};
use crate::persistence::repository::{LedgerRepository, OrderRepository, PaymentRepository};
use crate::persistence::DbPool;
use chrono::Utc;
use std::str::FromStr;
use tracing::{info, warn};

/// CompleteBooking result.
#[derive(Debug, Clone)]
pub struct BookingCompletion {
    pub booking_id: String,
    pub order_id: String,
    pub status: String,
    pub escrow_status: String,
    pub amount_rub: i64,
}

pub struct BookingSettlement {
    bookings: BookingRepository,
    orders: OrderRepository,
    payments: PaymentRepository,
    ledger: LedgerRepository,
}

impl BookingSettlement {
    pub fn new(pool: DbPool) -> Self {
        Self {
            bookings: BookingRepository::new(pool.clone()),
            orders: OrderRepository::new(pool.clone()),
            payments: PaymentRepository::new(pool.clone()),
            ledger: LedgerRepository::new(pool),
        }
    }

    pub async fn complete_booking(&self, booking_id: &str) -> SettlementResult<BookingCompletion> {
        let booking = self
            .bookings
            .get(booking_id)
            .await?
            .ok_or_else(|| SettlementError::not_found("booking", booking_id))?;

        let status = BookingStatus::from_str(&booking.status)
            .map_err(SettlementError::Dependency)?;
        if !status.can_complete() {
            return Err(SettlementError::invalid_state(
                "booking",
                booking.status,
                BookingStatus::Confirmed.as_str(),
            ));
        }

        let service = self
            .bookings
            .get_service(&booking.service_id)
            .await?
            .ok_or_else(|| SettlementError::not_found("service", booking.service_id.clone()))?;

        // Primary transition, guarded on CONFIRMED.
        let rows = self.bookings.complete(booking_id).await?;
        if rows == 0 {
            let current = self
                .bookings
                .get(booking_id)
                .await?
                .map(|b| b.status)
                .unwrap_or_else(|| "UNKNOWN".to_string());
            return Err(SettlementError::invalid_state(
                "booking",
                current,
                BookingStatus::Confirmed.as_str(),
            ));
        }

        // The charge happened out-of-band when the booking was confirmed;
        // record it as an already-settled payment.
        let payment = self
            .payments
            .create(CreatePayment {
                id: uuid::Uuid::new_v4().to_string(),
                provider: PaymentProvider::Mockpay,
                provider_ref: format!("mockpay_{}", reference_suffix(12)),
                amount_rub: service.price_rub,
                currency: "RUB".to_string(),
                status: PaymentStatus::Captured,
                metadata: serde_json::json!({
                    "source": "service_booking",
                    "booking_id": booking_id,
                })
                .to_string(),
                processed_at: Some(Utc::now()),
            })
            .await?;

        let order_id = match self.orders.get_by_booking(booking_id).await? {
            Some(existing) => {
                let released = self
                    .orders
                    .deliver_and_release(&existing.id, Some(&payment.id))
                    .await?;
                if released == 0 {
                    warn!(
                        "Order {} escrow already settled; booking {} completion continues",
                        existing.id, booking_id
                    );
                }
                existing.id
            }
            None => {
                let created = self
                    .orders
                    .create(CreateOrder {
                        id: uuid::Uuid::new_v4().to_string(),
                        buyer_id: booking.client_id.clone(),
                        seller_id: service.provider_id.clone(),
                        target: PurchaseTarget::ServiceBooking(booking_id.to_string()),
                        payment_id: Some(payment.id.clone()),
                        status: OrderStatus::Delivered,
                        escrow_status: EscrowStatus::Released,
                        total_amount_rub: service.price_rub,
                        escrow_amount_rub: service.price_rub,
                    })
                    .await?;
                created.id
            }
        };

        let credit = CreateLedgerEntry {
            user_id: service.provider_id.clone(),
            order_id: order_id.clone(),
            amount_rub: service.price_rub,
            kind: LedgerEntryKind::Credit,
            idempotency_key: idempotency_key("booking", booking_id, "credit"),
        };
        if let Err(e) = self.ledger.append(credit).await {
            warn!(
                "Provider payout credit not recorded for booking {}: {}",
                booking_id, e
            );
        }

        info!(
            "Booking {} completed; order {} settled for {} RUB",
            booking_id, order_id, service.price_rub
        );

        Ok(BookingCompletion {
            booking_id: booking_id.to_string(),
            order_id,
            status: BookingStatus::Completed.as_str().to_string(),
            escrow_status: EscrowStatus::Released.as_str().to_string(),
            amount_rub: service.price_rub,
        })
    }
}
