//! Payment State Engine
//!
//! Owns the payment lifecycle and the escrow state of the linked order.
//! Side effects run in a fixed order per operation, (1) payment flip,
//! (2) order escrow/status, (3) ledger append, so a partial failure is
//! recoverable by retrying: the flips are conditional and the ledger
//! appends carry idempotency keys.

use crate::domain::entities::ledger::{idempotency_key, LedgerEntryKind};
use crate::domain::entities::payment::{PaymentProvider, PaymentStatus};
use crate::domain::errors::{SettlementError, SettlementResult};
use crate::domain::services::fx::FxCache;
use crate::domain::value_objects::amount::Amount;
use crate::infrastructure::gateways::{reference_suffix, GatewayRegistry};
use crate::persistence::models::{CreateLedgerEntry, CreatePayment, PaymentRecord};
use crate::persistence::repository::{LedgerRepository, OrderRepository, PaymentRepository};
use crate::persistence::DbPool;
use chrono::Utc;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

/// Authorize input.
#[derive(Debug, Clone)]
pub struct AuthorizeCommand {
    pub amount_rub: i64,
    pub currency: Option<String>,
    pub provider: String,
    pub description: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// Authorize output: the stored payment plus the client-side secret, which
/// is never persisted.
#[derive(Debug, Clone)]
pub struct AuthorizedPayment {
    pub payment: PaymentRecord,
    pub client_secret: String,
}

/// Capture output.
#[derive(Debug, Clone)]
pub struct CapturedPayment {
    pub payment: PaymentRecord,
    pub capture_ref: String,
    pub captured_amount: i64,
}

/// Refund output.
#[derive(Debug, Clone)]
pub struct RefundedPayment {
    pub payment: PaymentRecord,
    pub reason: Option<String>,
}

pub struct PaymentEngine {
    payments: PaymentRepository,
    orders: OrderRepository,
    ledger: LedgerRepository,
    gateways: Arc<GatewayRegistry>,
    fx: Option<Arc<FxCache>>,
}

impl PaymentEngine {
    pub fn new(pool: DbPool, gateways: Arc<GatewayRegistry>) -> Self {
        Self {
            payments: PaymentRepository::new(pool.clone()),
            orders: OrderRepository::new(pool.clone()),
            ledger: LedgerRepository::new(pool),
            gateways,
            fx: None,
        }
    }

    /// Attach an FX cache; non-ruble authorizations get rate metadata.
    pub fn with_fx(mut self, fx: Arc<FxCache>) -> Self {
        self.fx = Some(fx);
        self
    }

    /// Reserve funds with the provider and persist the AUTHORIZED payment.
    pub async fn authorize(&self, cmd: AuthorizeCommand) -> SettlementResult<AuthorizedPayment> {
        let amount =
            Amount::positive(cmd.amount_rub).map_err(SettlementError::Validation)?;
        let provider = PaymentProvider::from_str(&cmd.provider)
            .map_err(|_| SettlementError::ProviderUnsupported(cmd.provider.clone()))?;
        let currency = cmd
            .currency
            .map(|c| c.trim().to_ascii_uppercase())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| "RUB".to_string());

        let mut metadata = match cmd.metadata {
            Some(serde_json::Value::Object(map)) => map,
            Some(_) => {
                return Err(SettlementError::Validation(
                    "metadata must be a JSON object".to_string(),
                ))
            }
            None => serde_json::Map::new(),
        };
        if let Some(description) = cmd.description {
            metadata.insert("description".to_string(), description.into());
        }

        // Best-effort FX annotation; an unreachable rate source never
        // blocks the authorization.
        if currency != "RUB" {
            if let Some(fx) = &self.fx {
                match fx.rub_rate(&currency, Utc::now()).await {
                    Ok(rate) if rate > 0.0 => {
                        let charged =
                            ((amount.value() as f64 / rate) * 100.0).round() / 100.0;
                        metadata.insert("charged_amount".to_string(), charged.into());
                        metadata.insert("fx_rate".to_string(), rate.into());
                    }
                    Ok(rate) => {
                        warn!("Ignoring non-positive {} rate: {}", currency, rate);
                    }
                    Err(e) => {
                        warn!("FX annotation skipped for {}: {}", currency, e);
                    }
                }
            }
        }

        let provider_ref = format!(
            "{}_{}",
            provider.as_str().to_ascii_lowercase(),
            reference_suffix(12)
        );

        let gateway = self
            .gateways
            .get(provider)
            .ok_or_else(|| SettlementError::ProviderUnsupported(cmd.provider.clone()))?;
        let authorization = gateway
            .authorize(&provider_ref, amount.value(), &currency)
            .await?;

        let payment = self
            .payments
            .create(CreatePayment {
                id: uuid::Uuid::new_v4().to_string(),
                provider,
                provider_ref,
                amount_rub: amount.value(),
                currency,
                status: PaymentStatus::Authorized,
                metadata: serde_json::Value::Object(metadata).to_string(),
                processed_at: None,
            })
            .await?;

        info!(
            "Authorized payment {} via {} for {} RUB",
            payment.id, payment.provider, payment.amount_rub
        );

        Ok(AuthorizedPayment {
            payment,
            client_secret: authorization.client_secret,
        })
    }

    /// Settle an authorized payment. At most one of any number of
    /// concurrent captures wins; the rest observe `InvalidState`.
    pub async fn capture(
        &self,
        payment_id: &str,
        amount_rub: Option<i64>,
    ) -> SettlementResult<CapturedPayment> {
        let payment = self
            .payments
            .get(payment_id)
            .await?
            .ok_or_else(|| SettlementError::not_found("payment", payment_id))?;

        let status = PaymentStatus::from_str(&payment.status)
            .map_err(SettlementError::Dependency)?;
        if !status.can_capture() {
            return Err(SettlementError::invalid_state(
                "payment",
                payment.status,
                PaymentStatus::Authorized.as_str(),
            ));
        }

        let requested = match amount_rub {
            Some(value) => Amount::positive(value)
                .map_err(SettlementError::Validation)?
                .value(),
            None => payment.amount_rub,
        };
        if requested > payment.amount_rub {
            return Err(SettlementError::AmountExceeded {
                requested,
                authorized: payment.amount_rub,
            });
        }

        let provider = PaymentProvider::from_str(&payment.provider)
            .map_err(SettlementError::Dependency)?;
        let gateway = self
            .gateways
            .get(provider)
            .ok_or_else(|| SettlementError::ProviderUnsupported(payment.provider.clone()))?;
        let capture_ref = gateway.capture(&payment.provider_ref, requested).await?;

        let patch = serde_json::json!({
            "capture_ref": capture_ref,
            "captured_amount": requested,
        });
        let updated = match self.payments.capture(payment_id, &patch, Utc::now()).await? {
            Some(record) => record,
            // Lost the race: report whatever state the winner left behind.
            None => {
                let current = self
                    .payments
                    .get(payment_id)
                    .await?
                    .map(|p| p.status)
                    .unwrap_or_else(|| "UNKNOWN".to_string());
                return Err(SettlementError::invalid_state(
                    "payment",
                    current,
                    PaymentStatus::Authorized.as_str(),
                ));
            }
        };

        // Step 2 of the fixed order: the linked order becomes PAID while
        // escrow stays HELD. Idempotent; a repeated run is a no-op.
        if let Some(order) = self.orders.get_by_payment(payment_id).await? {
            self.orders.mark_paid(&order.id).await?;
        }

        info!(
            "Captured payment {} for {} RUB ({})",
            payment_id, requested, capture_ref
        );

        Ok(CapturedPayment {
            payment: updated,
            capture_ref,
            captured_amount: requested,
        })
    }

    /// Return funds to the buyer. When the order's escrow had already been
    /// released to the seller, a matching seller DEBIT keeps the ledger
    /// double-entry balanced.
    pub async fn refund(
        &self,
        payment_id: &str,
        reason: Option<String>,
    ) -> SettlementResult<RefundedPayment> {
        let payment = self
            .payments
            .get(payment_id)
            .await?
            .ok_or_else(|| SettlementError::not_found("payment", payment_id))?;

        let status = PaymentStatus::from_str(&payment.status)
            .map_err(SettlementError::Dependency)?;
        if status == PaymentStatus::Refunded {
            return Err(SettlementError::AlreadyRefunded(payment_id.to_string()));
        }
        if !status.can_refund() {
            return Err(SettlementError::invalid_state(
                "payment",
                payment.status,
                "AUTHORIZED or CAPTURED",
            ));
        }

        let provider = PaymentProvider::from_str(&payment.provider)
            .map_err(SettlementError::Dependency)?;
        let gateway = self
            .gateways
            .get(provider)
            .ok_or_else(|| SettlementError::ProviderUnsupported(payment.provider.clone()))?;
        let refund_ref = gateway.refund(&payment.provider_ref).await?;

        let mut patch = serde_json::json!({ "refund_ref": refund_ref });
        if let Some(reason) = &reason {
            patch["refund_reason"] = reason.clone().into();
        }

        let updated = match self.payments.refund(payment_id, &patch).await? {
            Some(record) => record,
            None => {
                let current = self
                    .payments
                    .get(payment_id)
                    .await?
                    .map(|p| p.status)
                    .unwrap_or_else(|| "UNKNOWN".to_string());
                if current == PaymentStatus::Refunded.as_str() {
                    return Err(SettlementError::AlreadyRefunded(payment_id.to_string()));
                }
                return Err(SettlementError::invalid_state(
                    "payment",
                    current,
                    "AUTHORIZED or CAPTURED",
                ));
            }
        };

        // Steps 2 and 3 of the fixed order. The ledger legs are
        // best-effort once the payment has flipped: failures are logged,
        // and the idempotency keys make a retry safe.
        if let Some(order) = self.orders.get_by_payment(payment_id).await? {
            let escrow_was_released = order.escrow_status == "RELEASED";
            self.orders.refund_escrow(&order.id).await?;

            let credit = CreateLedgerEntry {
                user_id: order.buyer_id.clone(),
                order_id: order.id.clone(),
                amount_rub: updated.amount_rub,
                kind: LedgerEntryKind::Credit,
                idempotency_key: idempotency_key("refund", payment_id, "credit"),
            };
            if let Err(e) = self.ledger.append(credit).await {
                warn!("Buyer refund credit not recorded for {}: {}", order.id, e);
            }

            if escrow_was_released {
                let debit = CreateLedgerEntry {
                    user_id: order.seller_id.clone(),
                    order_id: order.id.clone(),
                    amount_rub: updated.amount_rub,
                    kind: LedgerEntryKind::Debit,
                    idempotency_key: idempotency_key("refund", payment_id, "debit"),
                };
                if let Err(e) = self.ledger.append(debit).await {
                    warn!("Seller clawback not recorded for {}: {}", order.id, e);
                }
            }
        }

        info!("Refunded payment {} ({})", payment_id, refund_ref);

        Ok(RefundedPayment {
            payment: updated,
            reason,
        })
    }
}
