//! Persistence Layer
//!
//! The ledger store: payments, orders, group-buy deals, service bookings,
//! the payout ledger, and shipping quotes. Uses SQLite for storage with
//! async operations via sqlx.
//!
//! Every lifecycle transition is a conditional `UPDATE ... WHERE status = ?`
//! whose affected-row count decides the winner; there are no blind
//! read-then-write status flips anywhere in this module. The payout ledger
//! is append-only with a unique idempotency key per entry.
//!
//! # Tables
//!
//! - `payments`: provider charges with AUTHORIZED/CAPTURED/CANCELLED/REFUNDED
//!   lifecycle, JSON metadata
//! - `orders`: escrowed purchases; exactly one of listing / vendor product /
//!   service booking per row (CHECK-enforced sum type)
//! - `vendor_products`, `services`: marketplace catalog rows this service
//!   reads to resolve sellers and prices
//! - `group_buy_deals` / `group_buy_orders`: threshold deals and pledges
//! - `service_bookings`: client bookings with their own escrow state
//! - `payout_ledger`: append-only double-entry credits/debits
//! - `shipping_quotes`: immutable calculator output

pub mod marketplace_repository;
pub mod models;
pub mod repository;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::ConnectOptions;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// Database connection pool
pub type DbPool = SqlitePool;

/// Ledger store error
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database connection error: {0}")]
    ConnectionError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error("Query error: {0}")]
    QueryError(String),

    /// A conditional write found the row in a different state than expected.
    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Initialize the ledger store connection pool and run migrations.
///
/// # Arguments
/// - `database_url`: SQLite URL (e.g. "sqlite://data/kassa.db")
///
/// # Errors
/// Returns an error if the connection or a migration fails.
pub async fn init_database(database_url: &str) -> Result<DbPool, StoreError> {
    info!("Initializing ledger store: {}", database_url);

    // Ensure data directory exists
    if let Some(db_path) = database_url.strip_prefix("sqlite://") {
        if let Some(parent) = Path::new(db_path).parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::ConnectionError(sqlx::Error::Configuration(Box::new(e)))
            })?;
        }
    }

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .log_statements(tracing::log::LevelFilter::Debug);

    // An in-memory SQLite database exists per connection; a wider pool would
    // hand out empty databases.
    let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;

    info!("Ledger store initialized");

    Ok(pool)
}

async fn run_migrations(pool: &DbPool) -> Result<(), StoreError> {
    info!("Running ledger store migrations...");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS payments (
            id TEXT PRIMARY KEY,
            provider TEXT NOT NULL CHECK(provider IN ('MOCKPAY', 'YOOMONEY', 'SBER', 'TINKOFF')),
            provider_ref TEXT NOT NULL UNIQUE,
            amount_rub INTEGER NOT NULL CHECK(amount_rub >= 0),
            currency TEXT NOT NULL DEFAULT 'RUB',
            status TEXT NOT NULL CHECK(status IN ('AUTHORIZED', 'CAPTURED', 'CANCELLED', 'REFUNDED')),
            metadata TEXT NOT NULL DEFAULT '{}',
            processed_at DATETIME,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| StoreError::MigrationError(format!("Failed to create payments table: {}", e)))?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS vendor_products (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            vendor_id TEXT NOT NULL,
            title TEXT NOT NULL,
            price_rub INTEGER NOT NULL CHECK(price_rub >= 0)
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| {
        StoreError::MigrationError(format!("Failed to create vendor_products table: {}", e))
    })?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS services (
            id TEXT PRIMARY KEY,
            provider_id TEXT NOT NULL,
            title TEXT NOT NULL,
            price_rub INTEGER NOT NULL CHECK(price_rub >= 0)
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| StoreError::MigrationError(format!("Failed to create services table: {}", e)))?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS service_bookings (
            id TEXT PRIMARY KEY,
            client_id TEXT NOT NULL,
            service_id TEXT NOT NULL,
            status TEXT NOT NULL CHECK(status IN ('PENDING', 'CONFIRMED', 'COMPLETED', 'CANCELLED')),
            escrow_status TEXT NOT NULL CHECK(escrow_status IN ('HELD', 'RELEASED', 'REFUNDED')),
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (service_id) REFERENCES services(id)
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| {
        StoreError::MigrationError(format!("Failed to create service_bookings table: {}", e))
    })?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS orders (
            id TEXT PRIMARY KEY,
            buyer_id TEXT NOT NULL,
            seller_id TEXT NOT NULL,
            listing_id TEXT,
            vendor_product_id INTEGER,
            service_booking_id TEXT,
            payment_id TEXT,
            status TEXT NOT NULL CHECK(status IN ('PENDING', 'PAID', 'FULFILLING', 'DELIVERED', 'CANCELLED')),
            escrow_status TEXT NOT NULL CHECK(escrow_status IN ('HELD', 'RELEASED', 'REFUNDED')),
            total_amount_rub INTEGER NOT NULL CHECK(total_amount_rub >= 0),
            escrow_amount_rub INTEGER NOT NULL CHECK(escrow_amount_rub >= 0),
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CHECK (
                (listing_id IS NOT NULL) + (vendor_product_id IS NOT NULL)
                    + (service_booking_id IS NOT NULL) = 1
            ),
            FOREIGN KEY (payment_id) REFERENCES payments(id),
            FOREIGN KEY (service_booking_id) REFERENCES service_bookings(id)
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| StoreError::MigrationError(format!("Failed to create orders table: {}", e)))?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS group_buy_deals (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            vendor_product_id INTEGER NOT NULL,
            min_quantity INTEGER NOT NULL CHECK(min_quantity > 0),
            current_quantity INTEGER NOT NULL DEFAULT 0 CHECK(current_quantity >= 0),
            discount_percentage INTEGER NOT NULL CHECK(discount_percentage BETWEEN 0 AND 100),
            status TEXT NOT NULL CHECK(status IN ('ACTIVE', 'COMPLETED', 'CANCELLED')),
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (vendor_product_id) REFERENCES vendor_products(id)
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| {
        StoreError::MigrationError(format!("Failed to create group_buy_deals table: {}", e))
    })?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS group_buy_orders (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            deal_id INTEGER NOT NULL,
            buyer_id TEXT NOT NULL,
            payment_id TEXT,
            price_per_unit_rub INTEGER NOT NULL CHECK(price_per_unit_rub >= 0),
            total_amount_rub INTEGER NOT NULL CHECK(total_amount_rub >= 0),
            discount_amount_rub INTEGER NOT NULL DEFAULT 0 CHECK(discount_amount_rub >= 0),
            status TEXT NOT NULL CHECK(status IN ('PENDING', 'CONFIRMED')),
            order_id TEXT,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (deal_id) REFERENCES group_buy_deals(id),
            FOREIGN KEY (payment_id) REFERENCES payments(id),
            FOREIGN KEY (order_id) REFERENCES orders(id)
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| {
        StoreError::MigrationError(format!("Failed to create group_buy_orders table: {}", e))
    })?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS payout_ledger (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL,
            order_id TEXT NOT NULL,
            amount_rub INTEGER NOT NULL CHECK(amount_rub >= 0),
            kind TEXT NOT NULL CHECK(kind IN ('CREDIT', 'DEBIT')),
            idempotency_key TEXT NOT NULL UNIQUE,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| {
        StoreError::MigrationError(format!("Failed to create payout_ledger table: {}", e))
    })?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS shipping_quotes (
            id TEXT PRIMARY KEY,
            from_country TEXT NOT NULL,
            to_country TEXT NOT NULL,
            weight_kg REAL NOT NULL,
            chargeable_weight_kg REAL NOT NULL,
            length_cm REAL NOT NULL,
            width_cm REAL NOT NULL,
            height_cm REAL NOT NULL,
            value_rub INTEGER NOT NULL,
            contents TEXT NOT NULL,
            service_level TEXT NOT NULL CHECK(service_level IN ('ECONOMY', 'STANDARD', 'EXPRESS', 'OVERNIGHT')),
            base_cost_rub INTEGER NOT NULL,
            duty_estimate_rub INTEGER NOT NULL,
            total_cost_rub INTEGER NOT NULL,
            estimated_days INTEGER NOT NULL,
            carrier TEXT NOT NULL,
            insurance_included BOOLEAN NOT NULL,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| {
        StoreError::MigrationError(format!("Failed to create shipping_quotes table: {}", e))
    })?;

    for statement in [
        "CREATE INDEX IF NOT EXISTS idx_payments_status ON payments(status)",
        "CREATE INDEX IF NOT EXISTS idx_orders_payment_id ON orders(payment_id)",
        "CREATE INDEX IF NOT EXISTS idx_orders_booking_id ON orders(service_booking_id)",
        "CREATE INDEX IF NOT EXISTS idx_pledges_deal_status ON group_buy_orders(deal_id, status)",
        "CREATE INDEX IF NOT EXISTS idx_ledger_user ON payout_ledger(user_id)",
        "CREATE INDEX IF NOT EXISTS idx_ledger_order ON payout_ledger(order_id)",
    ] {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| StoreError::MigrationError(format!("Failed to create index: {}", e)))?;
    }

    info!("Ledger store migrations completed");

    Ok(())
}
