//! Group-buy settlement endpoint.

use super::{fail, ok, ApiResult, AppState};
use crate::domain::errors::SettlementError;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct CloseDealRequest {
    pub deal_id: i64,
}

#[derive(Debug, Serialize)]
pub struct CloseDealResponse {
    pub deal_id: i64,
    pub status: String,
    pub total_orders: usize,
    pub discount_percentage: i64,
    pub original_price: i64,
    pub discounted_price: i64,
    pub total_savings: i64,
}

pub async fn close_deal(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CloseDealRequest>,
) -> ApiResult<CloseDealResponse> {
    if req.deal_id <= 0 {
        return Err(fail(SettlementError::Validation(format!(
            "deal_id must be positive, got {}",
            req.deal_id
        ))));
    }

    let closure = state.group_buys.close_deal(req.deal_id).await.map_err(fail)?;

    Ok(ok(CloseDealResponse {
        deal_id: closure.deal_id,
        status: closure.status,
        total_orders: closure.total_orders,
        discount_percentage: closure.discount_percentage,
        original_price: closure.original_price,
        discounted_price: closure.discounted_price,
        total_savings: closure.total_savings,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::test_state;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_close_deal_rejects_non_positive_id() {
        let state = test_state().await;

        let result = close_deal(State(state), Json(CloseDealRequest { deal_id: 0 })).await;
        let (status, _) = result.err().unwrap();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_close_deal_unknown_deal() {
        let state = test_state().await;

        let result = close_deal(State(state), Json(CloseDealRequest { deal_id: 999 })).await;
        let (status, _) = result.err().unwrap();
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
