//! Group-Buy Settlement Engine
//!
//! Converts a threshold-met deal's pending pledges into confirmed,
//! discounted pledges and synthesizes a marketplace order per pledge.
//!
//! Closing is two-phase. Phase 1 (one transaction): flip the deal to
//! COMPLETED and reprice all pending pledges. Phase 2 (fan-out): create
//! one order per confirmed pledge and back-link it. Phase 2 failures are
//! logged and skipped; the deal stays COMPLETED and `total_orders`
//! counts only the orders that were created. See DESIGN.md for the
//! product sign-off flag on this degraded mode.

use crate::domain::entities::group_buy::{discount_breakdown, DealStatus};
use crate::domain::entities::order::{EscrowStatus, OrderStatus, PurchaseTarget};
use crate::domain::errors::{SettlementError, SettlementResult};
use crate::persistence::marketplace_repository::GroupBuyRepository;
use crate::persistence::models::CreateOrder;
use crate::persistence::repository::OrderRepository;
use crate::persistence::{DbPool, StoreError};
use std::str::FromStr;
use tracing::{info, warn};

/// CloseDeal result.
#[derive(Debug, Clone)]
pub struct DealClosure {
    pub deal_id: i64,
    pub status: String,
    pub total_orders: usize,
    pub discount_percentage: i64,
    pub original_price: i64,
    pub discounted_price: i64,
    pub total_savings: i64,
}

pub struct GroupBuySettlement {
    group_buys: GroupBuyRepository,
    orders: OrderRepository,
}

impl GroupBuySettlement {
    pub fn new(pool: DbPool) -> Self {
        Self {
            group_buys: GroupBuyRepository::new(pool.clone()),
            orders: OrderRepository::new(pool),
        }
    }

    pub async fn close_deal(&self, deal_id: i64) -> SettlementResult<DealClosure> {
        let deal = self
            .group_buys
            .get_deal(deal_id)
            .await?
            .ok_or_else(|| SettlementError::not_found("deal", deal_id.to_string()))?;

        let status =
            DealStatus::from_str(&deal.status).map_err(SettlementError::Dependency)?;
        if status != DealStatus::Active {
            return Err(SettlementError::invalid_state(
                "deal",
                deal.status,
                DealStatus::Active.as_str(),
            ));
        }

        if deal.current_quantity < deal.min_quantity {
            return Err(SettlementError::ThresholdNotMet {
                current: deal.current_quantity,
                required: deal.min_quantity,
            });
        }

        let pending = self.group_buys.pending_pledges(deal_id).await?;
        let original_price = pending
            .first()
            .map(|p| p.price_per_unit_rub)
            .unwrap_or(0);
        let split = discount_breakdown(original_price, deal.discount_percentage)
            .map_err(SettlementError::Validation)?;

        // Phase 1: transactional flip + batch reprice.
        match self
            .group_buys
            .close_deal(deal_id, split.discounted_price, split.discount_per_unit)
            .await
        {
            Ok(confirmed) => {
                info!("Deal {} closed: {} pledges confirmed", deal_id, confirmed)
            }
            // A concurrent close won between our read and the flip.
            Err(StoreError::Conflict(_)) => {
                let current = self
                    .group_buys
                    .get_deal(deal_id)
                    .await?
                    .map(|d| d.status)
                    .unwrap_or_else(|| "UNKNOWN".to_string());
                return Err(SettlementError::invalid_state(
                    "deal",
                    current,
                    DealStatus::Active.as_str(),
                ));
            }
            Err(e) => return Err(e.into()),
        }

        // Phase 2: best-effort order fan-out.
        let seller = match self
            .group_buys
            .get_vendor_product(deal.vendor_product_id)
            .await?
        {
            Some(product) => Some(product.vendor_id),
            None => {
                warn!(
                    "Vendor product {} missing; no orders synthesized for deal {}",
                    deal.vendor_product_id, deal_id
                );
                None
            }
        };

        let confirmed = self.group_buys.confirmed_pledges(deal_id).await?;
        let total_savings: i64 = confirmed.iter().map(|p| p.discount_amount_rub).sum();

        let mut total_orders = 0;
        if let Some(seller_id) = seller {
            for pledge in confirmed.iter().filter(|p| p.order_id.is_none()) {
                let order = CreateOrder {
                    id: uuid::Uuid::new_v4().to_string(),
                    buyer_id: pledge.buyer_id.clone(),
                    seller_id: seller_id.clone(),
                    target: PurchaseTarget::VendorProduct(deal.vendor_product_id),
                    payment_id: pledge.payment_id.clone(),
                    status: OrderStatus::Pending,
                    escrow_status: EscrowStatus::Held,
                    total_amount_rub: pledge.total_amount_rub,
                    escrow_amount_rub: pledge.total_amount_rub,
                };
                match self.orders.create(order).await {
                    Ok(created) => {
                        if let Err(e) = self
                            .group_buys
                            .link_pledge_order(pledge.id, &created.id)
                            .await
                        {
                            warn!(
                                "Order {} created but pledge {} not linked: {}",
                                created.id, pledge.id, e
                            );
                        }
                        total_orders += 1;
                    }
                    Err(e) => {
                        warn!(
                            "Order creation failed for pledge {} of deal {}: {}",
                            pledge.id, deal_id, e
                        );
                    }
                }
            }
        }

        Ok(DealClosure {
            deal_id,
            status: DealStatus::Completed.as_str().to_string(),
            total_orders,
            discount_percentage: deal.discount_percentage,
            original_price: split.original_price,
            discounted_price: split.discounted_price,
            total_savings,
        })
    }
}
