//! Payment settlement endpoints: authorize, capture, refund.

use super::{fail, ok, ApiResult, AppState};
use crate::application::services::payment_engine::AuthorizeCommand;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct AuthorizeRequest {
    pub amount_rub: i64,
    pub currency: Option<String>,
    pub provider: String,
    pub description: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct AuthorizeResponse {
    pub payment_id: String,
    pub provider_ref: String,
    pub client_secret: String,
    pub status: String,
}

pub async fn authorize(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AuthorizeRequest>,
) -> ApiResult<AuthorizeResponse> {
    let authorized = state
        .payments
        .authorize(AuthorizeCommand {
            amount_rub: req.amount_rub,
            currency: req.currency,
            provider: req.provider,
            description: req.description,
            metadata: req.metadata,
        })
        .await
        .map_err(fail)?;

    Ok(ok(AuthorizeResponse {
        payment_id: authorized.payment.id,
        provider_ref: authorized.payment.provider_ref,
        client_secret: authorized.client_secret,
        status: authorized.payment.status,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CaptureRequest {
    pub payment_id: String,
    pub amount_rub: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CaptureResponse {
    pub payment_id: String,
    pub capture_ref: String,
    pub captured_amount: i64,
    pub status: String,
}

pub async fn capture(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CaptureRequest>,
) -> ApiResult<CaptureResponse> {
    let captured = state
        .payments
        .capture(&req.payment_id, req.amount_rub)
        .await
        .map_err(fail)?;

    Ok(ok(CaptureResponse {
        payment_id: captured.payment.id,
        capture_ref: captured.capture_ref,
        captured_amount: captured.captured_amount,
        status: captured.payment.status,
    }))
}

#[derive(Debug, Deserialize)]
pub struct RefundRequest {
    pub payment_id: String,
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RefundResponse {
    pub payment_id: String,
    pub status: String,
    pub reason: Option<String>,
}

pub async fn refund(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RefundRequest>,
) -> ApiResult<RefundResponse> {
    let refunded = state
        .payments
        .refund(&req.payment_id, req.reason)
        .await
        .map_err(fail)?;

    Ok(ok(RefundResponse {
        payment_id: refunded.payment.id,
        status: refunded.payment.status,
        reason: refunded.reason,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::test_state;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_authorize_endpoint_success() {
        let state = test_state().await;

        let result = authorize(
            State(state),
            Json(AuthorizeRequest {
                amount_rub: 1500,
                currency: None,
                provider: "MOCKPAY".to_string(),
                description: Some("Test charge".to_string()),
                metadata: None,
            }),
        )
        .await;

        let response = result.unwrap().0;
        assert!(response.success);
        assert_eq!(response.data.status, "AUTHORIZED");
        assert!(response.data.provider_ref.starts_with("mockpay_"));
        assert!(!response.data.client_secret.is_empty());
    }

    #[tokio::test]
    async fn test_authorize_endpoint_rejects_zero_amount() {
        let state = test_state().await;

        let result = authorize(
            State(state),
            Json(AuthorizeRequest {
                amount_rub: 0,
                currency: None,
                provider: "MOCKPAY".to_string(),
                description: None,
                metadata: None,
            }),
        )
        .await;

        let (status, body) = result.err().unwrap();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!body.0.success);
    }

    #[tokio::test]
    async fn test_capture_endpoint_unknown_payment() {
        let state = test_state().await;

        let result = capture(
            State(state),
            Json(CaptureRequest {
                payment_id: "missing".to_string(),
                amount_rub: None,
            }),
        )
        .await;

        let (status, _) = result.err().unwrap();
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
