//! Marketplace Repository
//!
//! Data access for group-buy deals, service bookings, the catalog rows the
//! settlement engine reads (vendor products, services), and shipping
//! quotes.

use super::models::*;
use super::{DbPool, StoreError};
use chrono::Utc;
use tracing::{debug, error};

/// Group-buy repository
pub struct GroupBuyRepository {
    pool: DbPool,
}

impl GroupBuyRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn create_vendor_product(
        &self,
        vendor_id: &str,
        title: &str,
        price_rub: i64,
    ) -> Result<VendorProductRecord, StoreError> {
        let record = sqlx::query_as::<_, VendorProductRecord>(
            r#"
            INSERT INTO vendor_products (vendor_id, title, price_rub)
            VALUES (?1, ?2, ?3)
            RETURNING *
            "#,
        )
        .bind(vendor_id)
        .bind(title)
        .bind(price_rub)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to create vendor product: {}", e);
            StoreError::QueryError(format!("Failed to create vendor product: {}", e))
        })?;

        Ok(record)
    }

    pub async fn get_vendor_product(
        &self,
        id: i64,
    ) -> Result<Option<VendorProductRecord>, StoreError> {
        let record =
            sqlx::query_as::<_, VendorProductRecord>("SELECT * FROM vendor_products WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    error!("Failed to get vendor product {}: {}", id, e);
                    StoreError::QueryError(format!("Failed to get vendor product: {}", e))
                })?;

        Ok(record)
    }

    /// Open a new deal in ACTIVE state with nothing pledged.
    pub async fn create_deal(&self, deal: CreateDeal) -> Result<GroupBuyDealRecord, StoreError> {
        let now = Utc::now();
        let record = sqlx::query_as::<_, GroupBuyDealRecord>(
            r#"
            INSERT INTO group_buy_deals (
                vendor_product_id, min_quantity, current_quantity,
                discount_percentage, status, created_at, updated_at
            )
            VALUES (?1, ?2, 0, ?3, 'ACTIVE', ?4, ?4)
            RETURNING *
            "#,
        )
        .bind(deal.vendor_product_id)
        .bind(deal.min_quantity)
        .bind(deal.discount_percentage)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to create deal: {}", e);
            StoreError::QueryError(format!("Failed to create deal: {}", e))
        })?;

        debug!("Created group-buy deal: {}", record.id);
        Ok(record)
    }

    pub async fn get_deal(&self, id: i64) -> Result<Option<GroupBuyDealRecord>, StoreError> {
        let record =
            sqlx::query_as::<_, GroupBuyDealRecord>("SELECT * FROM group_buy_deals WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    error!("Failed to get deal {}: {}", id, e);
                    StoreError::QueryError(format!("Failed to get deal: {}", e))
                })?;

        Ok(record)
    }

    /// Record a pledge and advance the deal quantity in one transaction.
    /// The quantity increment is guarded on the deal still being ACTIVE;
    /// pledging against a closed deal is a conflict.
    pub async fn add_pledge(
        &self,
        deal_id: i64,
        buyer_id: &str,
        price_per_unit_rub: i64,
        quantity: i64,
    ) -> Result<GroupBuyOrderRecord, StoreError> {
        let mut tx = self.pool.begin().await?;

        let rows = sqlx::query(
            r#"
            UPDATE group_buy_deals
               SET current_quantity = current_quantity + ?1, updated_at = ?2
             WHERE id = ?3 AND status = 'ACTIVE'
            "#,
        )
        .bind(quantity)
        .bind(Utc::now())
        .bind(deal_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!("Failed to advance deal {} quantity: {}", deal_id, e);
            StoreError::QueryError(format!("Failed to advance deal quantity: {}", e))
        })?
        .rows_affected();

        if rows == 0 {
            return Err(StoreError::Conflict(format!(
                "Deal {} is not accepting pledges",
                deal_id
            )));
        }

        let record = sqlx::query_as::<_, GroupBuyOrderRecord>(
            r#"
            INSERT INTO group_buy_orders (
                deal_id, buyer_id, price_per_unit_rub, total_amount_rub,
                discount_amount_rub, status, created_at
            )
            VALUES (?1, ?2, ?3, ?4, 0, 'PENDING', ?5)
            RETURNING *
            "#,
        )
        .bind(deal_id)
        .bind(buyer_id)
        .bind(price_per_unit_rub)
        .bind(price_per_unit_rub * quantity)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            error!("Failed to create pledge for deal {}: {}", deal_id, e);
            StoreError::QueryError(format!("Failed to create pledge: {}", e))
        })?;

        tx.commit().await?;

        debug!("Pledge {} added to deal {}", record.id, deal_id);
        Ok(record)
    }

    pub async fn pending_pledges(
        &self,
        deal_id: i64,
    ) -> Result<Vec<GroupBuyOrderRecord>, StoreError> {
        self.pledges_by_status(deal_id, "PENDING").await
    }

    pub async fn confirmed_pledges(
        &self,
        deal_id: i64,
    ) -> Result<Vec<GroupBuyOrderRecord>, StoreError> {
        self.pledges_by_status(deal_id, "CONFIRMED").await
    }

    async fn pledges_by_status(
        &self,
        deal_id: i64,
        status: &str,
    ) -> Result<Vec<GroupBuyOrderRecord>, StoreError> {
        let records = sqlx::query_as::<_, GroupBuyOrderRecord>(
            "SELECT * FROM group_buy_orders WHERE deal_id = ?1 AND status = ?2 ORDER BY id ASC",
        )
        .bind(deal_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to get pledges for deal {}: {}", deal_id, e);
            StoreError::QueryError(format!("Failed to get pledges: {}", e))
        })?;

        Ok(records)
    }

    /// Phase-1 close: flip the deal ACTIVE -> COMPLETED and reprice every
    /// pending pledge to the discounted unit price in one transaction.
    /// Money fields scale with each pledge's implicit quantity. Returns the
    /// number of pledges confirmed; a deal that is no longer ACTIVE is a
    /// conflict and nothing is written.
    pub async fn close_deal(
        &self,
        deal_id: i64,
        discounted_price: i64,
        discount_per_unit: i64,
    ) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;

        let rows = sqlx::query(
            r#"
            UPDATE group_buy_deals
               SET status = 'COMPLETED', updated_at = ?1
             WHERE id = ?2 AND status = 'ACTIVE'
            "#,
        )
        .bind(Utc::now())
        .bind(deal_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!("Failed to complete deal {}: {}", deal_id, e);
            StoreError::QueryError(format!("Failed to complete deal: {}", e))
        })?
        .rows_affected();

        if rows == 0 {
            return Err(StoreError::Conflict(format!(
                "Deal {} is not ACTIVE",
                deal_id
            )));
        }

        // SET expressions evaluate against the pre-update row, so the
        // implicit quantity is derived before the unit price changes.
        let confirmed = sqlx::query(
            r#"
            UPDATE group_buy_orders
               SET total_amount_rub =
                       CASE WHEN price_per_unit_rub > 0
                            THEN total_amount_rub / price_per_unit_rub ELSE 1 END * ?1,
                   discount_amount_rub =
                       CASE WHEN price_per_unit_rub > 0
                            THEN total_amount_rub / price_per_unit_rub ELSE 1 END * ?2,
                   price_per_unit_rub = ?1,
                   status = 'CONFIRMED'
             WHERE deal_id = ?3 AND status = 'PENDING'
            "#,
        )
        .bind(discounted_price)
        .bind(discount_per_unit)
        .bind(deal_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!("Failed to confirm pledges for deal {}: {}", deal_id, e);
            StoreError::QueryError(format!("Failed to confirm pledges: {}", e))
        })?
        .rows_affected();

        tx.commit().await?;

        debug!("Deal {} completed with {} pledges confirmed", deal_id, confirmed);
        Ok(confirmed)
    }

    /// Back-link a confirmed pledge to its synthesized order. Guarded so a
    /// retried fan-out never relinks an already-linked pledge.
    pub async fn link_pledge_order(
        &self,
        pledge_id: i64,
        order_id: &str,
    ) -> Result<u64, StoreError> {
        let rows = sqlx::query(
            "UPDATE group_buy_orders SET order_id = ?1 WHERE id = ?2 AND order_id IS NULL",
        )
        .bind(order_id)
        .bind(pledge_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to link pledge {} to order: {}", pledge_id, e);
            StoreError::QueryError(format!("Failed to link pledge: {}", e))
        })?
        .rows_affected();

        Ok(rows)
    }
}

/// Service booking repository
pub struct BookingRepository {
    pool: DbPool,
}

impl BookingRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn create_service(
        &self,
        id: &str,
        provider_id: &str,
        title: &str,
        price_rub: i64,
    ) -> Result<ServiceRecord, StoreError> {
        let record = sqlx::query_as::<_, ServiceRecord>(
            r#"
            INSERT INTO services (id, provider_id, title, price_rub)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(provider_id)
        .bind(title)
        .bind(price_rub)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to create service: {}", e);
            StoreError::QueryError(format!("Failed to create service: {}", e))
        })?;

        Ok(record)
    }

    pub async fn get_service(&self, id: &str) -> Result<Option<ServiceRecord>, StoreError> {
        let record = sqlx::query_as::<_, ServiceRecord>("SELECT * FROM services WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to get service {}: {}", id, e);
                StoreError::QueryError(format!("Failed to get service: {}", e))
            })?;

        Ok(record)
    }

    /// Insert a booking with escrow HELD.
    pub async fn create(&self, booking: CreateBooking) -> Result<ServiceBookingRecord, StoreError> {
        let now = Utc::now();
        let record = sqlx::query_as::<_, ServiceBookingRecord>(
            r#"
            INSERT INTO service_bookings (
                id, client_id, service_id, status, escrow_status, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, 'HELD', ?5, ?5)
            RETURNING *
            "#,
        )
        .bind(&booking.id)
        .bind(&booking.client_id)
        .bind(&booking.service_id)
        .bind(booking.status.as_str())
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to create booking: {}", e);
            StoreError::QueryError(format!("Failed to create booking: {}", e))
        })?;

        debug!("Created booking: {}", record.id);
        Ok(record)
    }

    pub async fn get(&self, id: &str) -> Result<Option<ServiceBookingRecord>, StoreError> {
        let record =
            sqlx::query_as::<_, ServiceBookingRecord>("SELECT * FROM service_bookings WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    error!("Failed to get booking {}: {}", id, e);
                    StoreError::QueryError(format!("Failed to get booking: {}", e))
                })?;

        Ok(record)
    }

    /// CONFIRMED -> COMPLETED with escrow RELEASED. Returns the affected-row
    /// count; zero means the booking was not CONFIRMED.
    pub async fn complete(&self, id: &str) -> Result<u64, StoreError> {
        let rows = sqlx::query(
            r#"
            UPDATE service_bookings
               SET status = 'COMPLETED', escrow_status = 'RELEASED', updated_at = ?1
             WHERE id = ?2 AND status = 'CONFIRMED'
            "#,
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to complete booking {}: {}", id, e);
            StoreError::QueryError(format!("Failed to complete booking: {}", e))
        })?
        .rows_affected();

        Ok(rows)
    }
}

/// Shipping quote repository
pub struct QuoteRepository {
    pool: DbPool,
}

impl QuoteRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Persist a calculator result. Quotes are immutable; there is no
    /// update path.
    pub async fn create(&self, quote: CreateQuote) -> Result<ShippingQuoteRecord, StoreError> {
        let record = sqlx::query_as::<_, ShippingQuoteRecord>(
            r#"
            INSERT INTO shipping_quotes (
                id, from_country, to_country, weight_kg, chargeable_weight_kg,
                length_cm, width_cm, height_cm, value_rub, contents,
                service_level, base_cost_rub, duty_estimate_rub, total_cost_rub,
                estimated_days, carrier, insurance_included, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
            RETURNING *
            "#,
        )
        .bind(&quote.id)
        .bind(&quote.from_country)
        .bind(&quote.to_country)
        .bind(quote.weight_kg)
        .bind(quote.chargeable_weight_kg)
        .bind(quote.length_cm)
        .bind(quote.width_cm)
        .bind(quote.height_cm)
        .bind(quote.value_rub)
        .bind(&quote.contents)
        .bind(&quote.service_level)
        .bind(quote.base_cost_rub)
        .bind(quote.duty_estimate_rub)
        .bind(quote.total_cost_rub)
        .bind(quote.estimated_days)
        .bind(&quote.carrier)
        .bind(quote.insurance_included)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to create quote: {}", e);
            StoreError::QueryError(format!("Failed to create quote: {}", e))
        })?;

        debug!("Created shipping quote: {}", record.id);
        Ok(record)
    }

    pub async fn get(&self, id: &str) -> Result<Option<ShippingQuoteRecord>, StoreError> {
        let record =
            sqlx::query_as::<_, ShippingQuoteRecord>("SELECT * FROM shipping_quotes WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    error!("Failed to get quote {}: {}", id, e);
                    StoreError::QueryError(format!("Failed to get quote: {}", e))
                })?;

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::booking::BookingStatus;
    use crate::persistence::init_database;

    async fn seeded_deal(repo: &GroupBuyRepository, min: i64) -> GroupBuyDealRecord {
        let product = repo
            .create_vendor_product("vendor-1", "Samovar", 1000)
            .await
            .unwrap();
        repo.create_deal(CreateDeal {
            vendor_product_id: product.id,
            min_quantity: min,
            discount_percentage: 15,
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_pledges_advance_quantity_only_while_active() {
        let pool = init_database("sqlite::memory:").await.unwrap();
        let repo = GroupBuyRepository::new(pool);
        let deal = seeded_deal(&repo, 10).await;

        repo.add_pledge(deal.id, "buyer-1", 1000, 3).await.unwrap();
        repo.add_pledge(deal.id, "buyer-2", 1000, 2).await.unwrap();

        let deal = repo.get_deal(deal.id).await.unwrap().unwrap();
        assert_eq!(deal.current_quantity, 5);

        repo.close_deal(deal.id, 850, 150).await.unwrap();
        let err = repo.add_pledge(deal.id, "buyer-3", 1000, 1).await;
        assert!(matches!(err, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_close_deal_reprices_pending_pledges() {
        let pool = init_database("sqlite::memory:").await.unwrap();
        let repo = GroupBuyRepository::new(pool);
        let deal = seeded_deal(&repo, 2).await;

        repo.add_pledge(deal.id, "buyer-1", 1000, 1).await.unwrap();
        repo.add_pledge(deal.id, "buyer-2", 1000, 3).await.unwrap();

        let confirmed = repo.close_deal(deal.id, 850, 150).await.unwrap();
        assert_eq!(confirmed, 2);

        let pledges = repo.confirmed_pledges(deal.id).await.unwrap();
        assert_eq!(pledges.len(), 2);
        for pledge in &pledges {
            assert_eq!(pledge.price_per_unit_rub, 850);
        }
        // The 3-unit pledge scales by its quantity.
        let bulk = pledges.iter().find(|p| p.buyer_id == "buyer-2").unwrap();
        assert_eq!(bulk.total_amount_rub, 850 * 3);
        assert_eq!(bulk.discount_amount_rub, 150 * 3);

        // Closing again is a conflict, nothing double-confirmed.
        assert!(matches!(
            repo.close_deal(deal.id, 850, 150).await,
            Err(StoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_link_pledge_order_is_one_shot() {
        let pool = init_database("sqlite::memory:").await.unwrap();
        let repo = GroupBuyRepository::new(pool.clone());
        let deal = seeded_deal(&repo, 1).await;
        let pledge = repo.add_pledge(deal.id, "buyer-1", 1000, 1).await.unwrap();

        let orders = crate::persistence::repository::OrderRepository::new(pool);
        let order = orders
            .create(crate::persistence::models::CreateOrder {
                id: "ord-1".to_string(),
                buyer_id: "buyer-1".to_string(),
                seller_id: "vendor-1".to_string(),
                target: crate::domain::entities::order::PurchaseTarget::VendorProduct(
                    deal.vendor_product_id,
                ),
                payment_id: None,
                status: crate::domain::entities::order::OrderStatus::Pending,
                escrow_status: crate::domain::entities::order::EscrowStatus::Held,
                total_amount_rub: 1000,
                escrow_amount_rub: 1000,
            })
            .await
            .unwrap();

        assert_eq!(repo.link_pledge_order(pledge.id, &order.id).await.unwrap(), 1);
        // A retried fan-out finds the pledge already linked.
        assert_eq!(repo.link_pledge_order(pledge.id, &order.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_booking_completion_guard() {
        let pool = init_database("sqlite::memory:").await.unwrap();
        let repo = BookingRepository::new(pool);

        repo.create_service("svc-1", "provider-1", "Repair", 2500)
            .await
            .unwrap();
        repo.create(CreateBooking {
            id: "bk-1".to_string(),
            client_id: "client-1".to_string(),
            service_id: "svc-1".to_string(),
            status: BookingStatus::Pending,
        })
        .await
        .unwrap();

        // PENDING booking cannot complete.
        assert_eq!(repo.complete("bk-1").await.unwrap(), 0);

        repo.create(CreateBooking {
            id: "bk-2".to_string(),
            client_id: "client-1".to_string(),
            service_id: "svc-1".to_string(),
            status: BookingStatus::Confirmed,
        })
        .await
        .unwrap();

        assert_eq!(repo.complete("bk-2").await.unwrap(), 1);
        let done = repo.get("bk-2").await.unwrap().unwrap();
        assert_eq!(done.status, "COMPLETED");
        assert_eq!(done.escrow_status, "RELEASED");

        // Completion is one-shot.
        assert_eq!(repo.complete("bk-2").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_quote_round_trip() {
        let pool = init_database("sqlite::memory:").await.unwrap();
        let repo = QuoteRepository::new(pool);

        let created = repo
            .create(CreateQuote {
                id: "qt-1".to_string(),
                from_country: "RU".to_string(),
                to_country: "RU".to_string(),
                weight_kg: 2.0,
                chargeable_weight_kg: 4.8,
                length_cm: 40.0,
                width_cm: 30.0,
                height_cm: 20.0,
                value_rub: 500,
                contents: "books".to_string(),
                service_level: "STANDARD".to_string(),
                base_cost_rub: 4000,
                duty_estimate_rub: 75,
                total_cost_rub: 4075,
                estimated_days: 7,
                carrier: "CDEK".to_string(),
                insurance_included: true,
            })
            .await
            .unwrap();

        let fetched = repo.get(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.total_cost_rub, 4075);
        assert_eq!(fetched.carrier, "CDEK");
        assert!(fetched.insurance_included);
    }
}
