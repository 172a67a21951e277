//! HTTP handlers.
//!
//! Every settlement endpoint takes a JSON body over POST and answers with
//! the envelope `{"success": true, "data": {...}}` or
//! `{"success": false, "error": "..."}`; the error variant carries the
//! status code mapped from the settlement error taxonomy.

pub mod bookings;
pub mod group_buys;
pub mod payments;
pub mod shipping;

use crate::application::services::booking_settlement::BookingSettlement;
use crate::application::services::group_buy_settlement::GroupBuySettlement;
use crate::application::services::payment_engine::PaymentEngine;
use crate::application::services::shipping_quotes::ShippingQuoteService;
use crate::domain::errors::SettlementError;
use crate::persistence::DbPool;
use axum::{http::StatusCode, Json};
use serde::Serialize;
use tracing::error;

/// Shared handler state: one service per settlement surface.
pub struct AppState {
    pub payments: PaymentEngine,
    pub group_buys: GroupBuySettlement,
    pub bookings: BookingSettlement,
    pub shipping: ShippingQuoteService,
    pub pool: DbPool,
}

#[derive(Debug, Serialize)]
pub struct ApiSuccess<T: Serialize> {
    pub success: bool,
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct ApiFailure {
    pub success: bool,
    pub error: String,
}

pub type ApiResult<T> = Result<Json<ApiSuccess<T>>, (StatusCode, Json<ApiFailure>)>;

pub fn ok<T: Serialize>(data: T) -> Json<ApiSuccess<T>> {
    Json(ApiSuccess {
        success: true,
        data,
    })
}

pub fn fail(error: SettlementError) -> (StatusCode, Json<ApiFailure>) {
    let status = match &error {
        SettlementError::Validation(_)
        | SettlementError::InvalidState { .. }
        | SettlementError::ThresholdNotMet { .. }
        | SettlementError::AmountExceeded { .. }
        | SettlementError::ProviderUnsupported(_)
        | SettlementError::AlreadyRefunded(_) => StatusCode::BAD_REQUEST,
        SettlementError::NotFound { .. } => StatusCode::NOT_FOUND,
        SettlementError::Gateway(_) | SettlementError::Dependency(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    if status.is_server_error() {
        error!("Settlement operation failed: {}", error);
    }

    (
        status,
        Json(ApiFailure {
            success: false,
            error: error.to_string(),
        }),
    )
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::AppState;
    use crate::application::services::booking_settlement::BookingSettlement;
    use crate::application::services::group_buy_settlement::GroupBuySettlement;
    use crate::application::services::payment_engine::PaymentEngine;
    use crate::application::services::shipping_quotes::ShippingQuoteService;
    use crate::domain::value_objects::country::CountryCode;
    use crate::infrastructure::gateways::GatewayRegistry;
    use crate::persistence::init_database;
    use std::sync::Arc;

    /// Handler state over a fresh in-memory store.
    pub(crate) async fn test_state() -> Arc<AppState> {
        let pool = init_database("sqlite::memory:").await.unwrap();
        let gateways = Arc::new(GatewayRegistry::standard());
        Arc::new(AppState {
            payments: PaymentEngine::new(pool.clone(), gateways),
            group_buys: GroupBuySettlement::new(pool.clone()),
            bookings: BookingSettlement::new(pool.clone()),
            shipping: ShippingQuoteService::new(pool.clone(), CountryCode::new("RU").unwrap()),
            pool,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let (status, _) = fail(SettlementError::Validation("bad".to_string()));
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = fail(SettlementError::not_found("payment", "p-1"));
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = fail(SettlementError::Dependency("db down".to_string()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let (status, body) = fail(SettlementError::AmountExceeded {
            requested: 2000,
            authorized: 1500,
        });
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!body.0.success);
        assert!(body.0.error.contains("2000"));
    }
}
