//! Service booking settlement endpoint.

use super::{fail, ok, ApiResult, AppState};
use crate::domain::errors::SettlementError;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct CompleteBookingRequest {
    pub booking_id: String,
}

#[derive(Debug, Serialize)]
pub struct CompleteBookingResponse {
    pub booking_id: String,
    pub order_id: String,
    pub status: String,
    pub escrow_status: String,
    pub amount: i64,
}

pub async fn complete_booking(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CompleteBookingRequest>,
) -> ApiResult<CompleteBookingResponse> {
    let booking_id = req.booking_id.trim();
    if booking_id.is_empty() {
        return Err(fail(SettlementError::Validation(
            "booking_id is required".to_string(),
        )));
    }

    let completion = state
        .bookings
        .complete_booking(booking_id)
        .await
        .map_err(fail)?;

    Ok(ok(CompleteBookingResponse {
        booking_id: completion.booking_id,
        order_id: completion.order_id,
        status: completion.status,
        escrow_status: completion.escrow_status,
        amount: completion.amount_rub,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::test_state;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_complete_booking_requires_id() {
        let state = test_state().await;

        let result = complete_booking(
            State(state),
            Json(CompleteBookingRequest {
                booking_id: "  ".to_string(),
            }),
        )
        .await;

        let (status, _) = result.err().unwrap();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_complete_booking_unknown_booking() {
        let state = test_state().await;

        let result = complete_booking(
            State(state),
            Json(CompleteBookingRequest {
                booking_id: "missing".to_string(),
            }),
        )
        .await;

        let (status, _) = result.err().unwrap();
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
