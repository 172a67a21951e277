//! Database Repository
//!
//! Data access for the settlement core: payments, orders, and the payout
//! ledger. Lifecycle transitions are conditional updates guarded on the
//! expected prior state; callers learn they lost a race from the `None` /
//! zero-rows result, never from a stale read.

use super::models::*;
use super::{DbPool, StoreError};
use chrono::{DateTime, Utc};
use sqlx::Row;
use tracing::{debug, error};

/// Payment repository
pub struct PaymentRepository {
    pool: DbPool,
}

impl PaymentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Insert a new payment row.
    pub async fn create(&self, payment: CreatePayment) -> Result<PaymentRecord, StoreError> {
        let now = Utc::now();
        let record = sqlx::query_as::<_, PaymentRecord>(
            r#"
            INSERT INTO payments (
                id, provider, provider_ref, amount_rub, currency, status,
                metadata, processed_at, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            RETURNING *
            "#,
        )
        .bind(&payment.id)
        .bind(payment.provider.as_str())
        .bind(&payment.provider_ref)
        .bind(payment.amount_rub)
        .bind(&payment.currency)
        .bind(payment.status.as_str())
        .bind(&payment.metadata)
        .bind(payment.processed_at)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to create payment: {}", e);
            StoreError::QueryError(format!("Failed to create payment: {}", e))
        })?;

        debug!("Created payment: {} ({})", record.id, record.provider_ref);
        Ok(record)
    }

    /// Get payment by ID
    pub async fn get(&self, id: &str) -> Result<Option<PaymentRecord>, StoreError> {
        let record = sqlx::query_as::<_, PaymentRecord>("SELECT * FROM payments WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to get payment {}: {}", id, e);
                StoreError::QueryError(format!("Failed to get payment: {}", e))
            })?;

        Ok(record)
    }

    /// Flip an AUTHORIZED payment to CAPTURED, stamping `processed_at` and
    /// merging the capture details into metadata in the same statement.
    /// Returns `None` when the payment was not AUTHORIZED (a concurrent
    /// capture already won, or the payment is refunded/cancelled).
    pub async fn capture(
        &self,
        id: &str,
        metadata_patch: &serde_json::Value,
        processed_at: DateTime<Utc>,
    ) -> Result<Option<PaymentRecord>, StoreError> {
        let record = sqlx::query_as::<_, PaymentRecord>(
            r#"
            UPDATE payments
               SET status = 'CAPTURED',
                   processed_at = ?1,
                   metadata = json_patch(metadata, ?2)
             WHERE id = ?3 AND status = 'AUTHORIZED'
            RETURNING *
            "#,
        )
        .bind(processed_at)
        .bind(metadata_patch.to_string())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to capture payment {}: {}", id, e);
            StoreError::QueryError(format!("Failed to capture payment: {}", e))
        })?;

        if record.is_some() {
            debug!("Captured payment: {}", id);
        }
        Ok(record)
    }

    /// Flip an AUTHORIZED or CAPTURED payment to REFUNDED, merging the
    /// refund details into metadata. Returns `None` when the payment is in
    /// neither state (already refunded or cancelled).
    pub async fn refund(
        &self,
        id: &str,
        metadata_patch: &serde_json::Value,
    ) -> Result<Option<PaymentRecord>, StoreError> {
        let record = sqlx::query_as::<_, PaymentRecord>(
            r#"
            UPDATE payments
               SET status = 'REFUNDED',
                   metadata = json_patch(metadata, ?1)
             WHERE id = ?2 AND status IN ('AUTHORIZED', 'CAPTURED')
            RETURNING *
            "#,
        )
        .bind(metadata_patch.to_string())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to refund payment {}: {}", id, e);
            StoreError::QueryError(format!("Failed to refund payment: {}", e))
        })?;

        if record.is_some() {
            debug!("Refunded payment: {}", id);
        }
        Ok(record)
    }
}

/// Order repository
pub struct OrderRepository {
    pool: DbPool,
}

impl OrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Insert a new order row.
    pub async fn create(&self, order: CreateOrder) -> Result<OrderRecord, StoreError> {
        let now = Utc::now();
        let (listing_id, vendor_product_id, service_booking_id) = order.target.into_columns();

        let record = sqlx::query_as::<_, OrderRecord>(
            r#"
            INSERT INTO orders (
                id, buyer_id, seller_id, listing_id, vendor_product_id,
                service_booking_id, payment_id, status, escrow_status,
                total_amount_rub, escrow_amount_rub, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)
            RETURNING *
            "#,
        )
        .bind(&order.id)
        .bind(&order.buyer_id)
        .bind(&order.seller_id)
        .bind(listing_id)
        .bind(vendor_product_id)
        .bind(service_booking_id)
        .bind(&order.payment_id)
        .bind(order.status.as_str())
        .bind(order.escrow_status.as_str())
        .bind(order.total_amount_rub)
        .bind(order.escrow_amount_rub)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to create order: {}", e);
            StoreError::QueryError(format!("Failed to create order: {}", e))
        })?;

        debug!("Created order: {} for buyer {}", record.id, record.buyer_id);
        Ok(record)
    }

    /// Get order by ID
    pub async fn get(&self, id: &str) -> Result<Option<OrderRecord>, StoreError> {
        let record = sqlx::query_as::<_, OrderRecord>("SELECT * FROM orders WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to get order {}: {}", id, e);
                StoreError::QueryError(format!("Failed to get order: {}", e))
            })?;

        Ok(record)
    }

    /// Get the order referencing a payment, if any.
    pub async fn get_by_payment(&self, payment_id: &str) -> Result<Option<OrderRecord>, StoreError> {
        let record =
            sqlx::query_as::<_, OrderRecord>("SELECT * FROM orders WHERE payment_id = ?1")
                .bind(payment_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    error!("Failed to get order for payment {}: {}", payment_id, e);
                    StoreError::QueryError(format!("Failed to get order: {}", e))
                })?;

        Ok(record)
    }

    /// Get the order referencing a service booking, if any.
    pub async fn get_by_booking(&self, booking_id: &str) -> Result<Option<OrderRecord>, StoreError> {
        let record =
            sqlx::query_as::<_, OrderRecord>("SELECT * FROM orders WHERE service_booking_id = ?1")
                .bind(booking_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    error!("Failed to get order for booking {}: {}", booking_id, e);
                    StoreError::QueryError(format!("Failed to get order: {}", e))
                })?;

        Ok(record)
    }

    /// PENDING -> PAID after a successful capture; escrow stays HELD.
    /// Returns the affected-row count (zero when already past PENDING,
    /// which a retrying caller treats as done).
    pub async fn mark_paid(&self, id: &str) -> Result<u64, StoreError> {
        let rows = sqlx::query(
            r#"
            UPDATE orders
               SET status = 'PAID', updated_at = ?1
             WHERE id = ?2 AND status = 'PENDING'
            "#,
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to mark order {} paid: {}", id, e);
            StoreError::QueryError(format!("Failed to mark order paid: {}", e))
        })?
        .rows_affected();

        Ok(rows)
    }

    /// Fulfilment complete: DELIVERED with escrow RELEASED, optionally
    /// attaching the settled payment. Guarded on escrow still being HELD.
    pub async fn deliver_and_release(
        &self,
        id: &str,
        payment_id: Option<&str>,
    ) -> Result<u64, StoreError> {
        let rows = sqlx::query(
            r#"
            UPDATE orders
               SET status = 'DELIVERED',
                   escrow_status = 'RELEASED',
                   payment_id = COALESCE(payment_id, ?1),
                   updated_at = ?2
             WHERE id = ?3 AND escrow_status = 'HELD'
            "#,
        )
        .bind(payment_id)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to release escrow for order {}: {}", id, e);
            StoreError::QueryError(format!("Failed to release escrow: {}", e))
        })?
        .rows_affected();

        Ok(rows)
    }

    /// Refund path: order CANCELLED with escrow REFUNDED. Legal from both
    /// HELD and RELEASED escrow (the latter is a post-payout clawback).
    pub async fn refund_escrow(&self, id: &str) -> Result<u64, StoreError> {
        let rows = sqlx::query(
            r#"
            UPDATE orders
               SET status = 'CANCELLED',
                   escrow_status = 'REFUNDED',
                   updated_at = ?1
             WHERE id = ?2 AND escrow_status IN ('HELD', 'RELEASED')
            "#,
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to refund escrow for order {}: {}", id, e);
            StoreError::QueryError(format!("Failed to refund escrow: {}", e))
        })?
        .rows_affected();

        Ok(rows)
    }
}

/// Payout ledger repository
pub struct LedgerRepository {
    pool: DbPool,
}

impl LedgerRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Append an entry. Returns `false` when the idempotency key already
    /// exists (a retried operation), in which case nothing is written.
    pub async fn append(&self, entry: CreateLedgerEntry) -> Result<bool, StoreError> {
        let rows = sqlx::query(
            r#"
            INSERT INTO payout_ledger (
                user_id, order_id, amount_rub, kind, idempotency_key, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(idempotency_key) DO NOTHING
            "#,
        )
        .bind(&entry.user_id)
        .bind(&entry.order_id)
        .bind(entry.amount_rub)
        .bind(entry.kind.as_str())
        .bind(&entry.idempotency_key)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to append ledger entry: {}", e);
            StoreError::QueryError(format!("Failed to append ledger entry: {}", e))
        })?
        .rows_affected();

        if rows > 0 {
            debug!(
                "Ledger {} {} RUB for {} ({})",
                entry.kind.as_str(),
                entry.amount_rub,
                entry.user_id,
                entry.idempotency_key
            );
        }
        Ok(rows > 0)
    }

    /// All entries touching an order, oldest first.
    pub async fn entries_for_order(
        &self,
        order_id: &str,
    ) -> Result<Vec<PayoutLedgerRecord>, StoreError> {
        let records = sqlx::query_as::<_, PayoutLedgerRecord>(
            "SELECT * FROM payout_ledger WHERE order_id = ?1 ORDER BY id ASC",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to get ledger entries for order {}: {}", order_id, e);
            StoreError::QueryError(format!("Failed to get ledger entries: {}", e))
        })?;

        Ok(records)
    }

    /// Running balance for a user: the fold of all credits minus debits.
    pub async fn balance_for_user(&self, user_id: &str) -> Result<i64, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT COALESCE(SUM(CASE WHEN kind = 'CREDIT' THEN amount_rub
                                     ELSE -amount_rub END), 0) AS balance
              FROM payout_ledger
             WHERE user_id = ?1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to compute balance for {}: {}", user_id, e);
            StoreError::QueryError(format!("Failed to compute balance: {}", e))
        })?;

        let balance: i64 = row.get("balance");
        Ok(balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::ledger::LedgerEntryKind;
    use crate::domain::entities::order::{EscrowStatus, OrderStatus, PurchaseTarget};
    use crate::domain::entities::payment::{PaymentProvider, PaymentStatus};
    use crate::persistence::init_database;

    fn authorized_payment(id: &str) -> CreatePayment {
        CreatePayment {
            id: id.to_string(),
            provider: PaymentProvider::Mockpay,
            provider_ref: format!("mockpay_{}", id),
            amount_rub: 1500,
            currency: "RUB".to_string(),
            status: PaymentStatus::Authorized,
            metadata: "{}".to_string(),
            processed_at: None,
        }
    }

    #[tokio::test]
    async fn test_payment_create_and_get() {
        let pool = init_database("sqlite::memory:").await.unwrap();
        let repo = PaymentRepository::new(pool);

        let created = repo.create(authorized_payment("pay-1")).await.unwrap();
        assert_eq!(created.status, "AUTHORIZED");
        assert_eq!(created.amount_rub, 1500);

        let fetched = repo.get("pay-1").await.unwrap().unwrap();
        assert_eq!(fetched.provider, "MOCKPAY");
        assert!(repo.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_capture_is_guarded_on_authorized() {
        let pool = init_database("sqlite::memory:").await.unwrap();
        let repo = PaymentRepository::new(pool);
        repo.create(authorized_payment("pay-1")).await.unwrap();

        let patch = serde_json::json!({"capture_ref": "cap-1", "captured_amount": 1500});
        let first = repo.capture("pay-1", &patch, Utc::now()).await.unwrap();
        assert!(first.is_some());
        let captured = first.unwrap();
        assert_eq!(captured.status, "CAPTURED");
        assert!(captured.processed_at.is_some());
        assert!(captured.metadata.contains("cap-1"));

        // Second capture loses the guard.
        let second = repo.capture("pay-1", &patch, Utc::now()).await.unwrap();
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn test_refund_is_terminal() {
        let pool = init_database("sqlite::memory:").await.unwrap();
        let repo = PaymentRepository::new(pool);
        repo.create(authorized_payment("pay-1")).await.unwrap();

        let patch = serde_json::json!({"refund_reason": "buyer request"});
        assert!(repo.refund("pay-1", &patch).await.unwrap().is_some());
        assert!(repo.refund("pay-1", &patch).await.unwrap().is_none());

        // And a refunded payment cannot be captured.
        let cap = serde_json::json!({});
        assert!(repo.capture("pay-1", &cap, Utc::now()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_order_transitions() {
        let pool = init_database("sqlite::memory:").await.unwrap();
        let repo = OrderRepository::new(pool);

        let order = repo
            .create(CreateOrder {
                id: "ord-1".to_string(),
                buyer_id: "buyer-1".to_string(),
                seller_id: "seller-1".to_string(),
                target: PurchaseTarget::Listing("lst-1".to_string()),
                payment_id: None,
                status: OrderStatus::Pending,
                escrow_status: EscrowStatus::Held,
                total_amount_rub: 1500,
                escrow_amount_rub: 1500,
            })
            .await
            .unwrap();
        assert_eq!(order.status, "PENDING");
        assert_eq!(order.escrow_status, "HELD");

        assert_eq!(repo.mark_paid("ord-1").await.unwrap(), 1);
        assert_eq!(repo.mark_paid("ord-1").await.unwrap(), 0);

        assert_eq!(repo.refund_escrow("ord-1").await.unwrap(), 1);
        let refunded = repo.get("ord-1").await.unwrap().unwrap();
        assert_eq!(refunded.status, "CANCELLED");
        assert_eq!(refunded.escrow_status, "REFUNDED");

        // Refunded escrow cannot be released afterwards.
        assert_eq!(repo.deliver_and_release("ord-1", None).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_ledger_append_is_idempotent() {
        let pool = init_database("sqlite::memory:").await.unwrap();
        let repo = LedgerRepository::new(pool);

        let entry = CreateLedgerEntry {
            user_id: "buyer-1".to_string(),
            order_id: "ord-1".to_string(),
            amount_rub: 1500,
            kind: LedgerEntryKind::Credit,
            idempotency_key: "refund:pay-1:credit".to_string(),
        };

        assert!(repo.append(entry.clone()).await.unwrap());
        assert!(!repo.append(entry).await.unwrap());

        let entries = repo.entries_for_order("ord-1").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(repo.balance_for_user("buyer-1").await.unwrap(), 1500);
    }

    #[tokio::test]
    async fn test_balance_folds_credits_and_debits() {
        let pool = init_database("sqlite::memory:").await.unwrap();
        let repo = LedgerRepository::new(pool);

        repo.append(CreateLedgerEntry {
            user_id: "seller-1".to_string(),
            order_id: "ord-1".to_string(),
            amount_rub: 900,
            kind: LedgerEntryKind::Credit,
            idempotency_key: "booking:bk-1:credit".to_string(),
        })
        .await
        .unwrap();
        repo.append(CreateLedgerEntry {
            user_id: "seller-1".to_string(),
            order_id: "ord-1".to_string(),
            amount_rub: 900,
            kind: LedgerEntryKind::Debit,
            idempotency_key: "refund:pay-1:debit".to_string(),
        })
        .await
        .unwrap();

        assert_eq!(repo.balance_for_user("seller-1").await.unwrap(), 0);
    }
}
