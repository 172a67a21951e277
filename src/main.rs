use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use kassa::application::handlers::{self, AppState};
use kassa::application::services::booking_settlement::BookingSettlement;
use kassa::application::services::group_buy_settlement::GroupBuySettlement;
use kassa::application::services::payment_engine::PaymentEngine;
use kassa::application::services::shipping_quotes::ShippingQuoteService;
use kassa::config::SettlementConfig;
use kassa::domain::services::fx::{FxCache, RateSource};
use kassa::infrastructure::cbr_rates::CbrRateSource;
use kassa::infrastructure::gateways::GatewayRegistry;
use kassa::{auth, persistence, rate_limit};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kassa=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("KASSA settlement service starting...");
    info!("Providers: MockPay, YooMoney, SberPay, T-Pay");

    let config = SettlementConfig::from_env().map_err(|e| {
        error!("Configuration error: {}", e);
        e
    })?;

    auth::init_service_tokens();

    let pool = persistence::init_database(&config.database_url).await?;

    let gateways = Arc::new(GatewayRegistry::standard());
    let rate_source: Arc<dyn RateSource> = match &config.rates_url {
        Some(url) => Arc::new(CbrRateSource::with_url(url.clone())),
        None => Arc::new(CbrRateSource::new()),
    };
    let fx = Arc::new(FxCache::new(
        rate_source,
        chrono::Duration::seconds(config.fx_ttl_secs),
    ));

    let state = Arc::new(AppState {
        payments: PaymentEngine::new(pool.clone(), gateways).with_fx(fx),
        group_buys: GroupBuySettlement::new(pool.clone()),
        bookings: BookingSettlement::new(pool.clone()),
        shipping: ShippingQuoteService::new(pool.clone(), config.domestic_country),
        pool,
    });

    let limiter = rate_limit::build_rate_limiter(config.requests_per_minute);
    let throttle = axum::middleware::from_fn(
        move |request: axum::extract::Request, next: axum::middleware::Next| {
            let limiter = limiter.clone();
            async move { rate_limit::throttle(limiter, request, next).await }
        },
    );

    // Browsers never call these endpoints directly, but the marketplace
    // front-end probes them through preflight; answer OPTIONS permissively.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let settlement_routes = Router::new()
        .route("/payments/authorize", post(handlers::payments::authorize))
        .route("/payments/capture", post(handlers::payments::capture))
        .route("/payments/refund", post(handlers::payments::refund))
        .route("/group-buys/close", post(handlers::group_buys::close_deal))
        .route("/bookings/complete", post(handlers::bookings::complete_booking))
        .route("/shipping/quote", post(handlers::shipping::quote))
        .route_layer(axum::middleware::from_fn(auth::require_service_token));

    let app = Router::new()
        .route("/health", get(health_check))
        .merge(settlement_routes)
        .layer(
            tower::ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(64 * 1024))
                .layer(cors)
                .layer(throttle),
        )
        .with_state(state);

    info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    let server = axum::serve(listener, app);

    let shutdown_signal = async move {
        let ctrl_c = async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Received Ctrl+C signal"),
                Err(e) => error!("Failed to install Ctrl+C handler: {}", e),
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut sig) => {
                    sig.recv().await;
                    info!("Received SIGTERM signal");
                }
                Err(e) => error!("Failed to install SIGTERM handler: {}", e),
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }
    };

    info!("Server started successfully. Press Ctrl+C to stop.");
    server.with_graceful_shutdown(shutdown_signal).await?;

    info!("Shutdown complete");
    Ok(())
}

/// Liveness plus a ledger-store ping.
async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let database_ok = sqlx::query("SELECT 1")
        .execute(&state.pool)
        .await
        .is_ok();

    Json(serde_json::json!({
        "status": "running",
        "database": database_ok,
    }))
}
