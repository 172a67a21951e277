//! Shipping quote endpoint.

use super::{fail, ok, ApiResult, AppState};
use crate::application::services::shipping_quotes::QuoteCommand;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct Dimensions {
    pub length_cm: f64,
    pub width_cm: f64,
    pub height_cm: f64,
}

#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub from_country: String,
    pub to_country: Option<String>,
    pub weight_kg: f64,
    pub dimensions: Dimensions,
    pub value_rub: i64,
    pub contents: String,
    pub service_level: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub quote_id: String,
    pub base_cost_rub: i64,
    pub duty_estimate_rub: i64,
    pub total_cost_rub: i64,
    pub estimated_days: i64,
    pub carrier: String,
    pub insurance_included: bool,
}

pub async fn quote(
    State(state): State<Arc<AppState>>,
    Json(req): Json<QuoteRequest>,
) -> ApiResult<QuoteResponse> {
    let record = state
        .shipping
        .quote(QuoteCommand {
            from_country: req.from_country,
            to_country: req.to_country,
            weight_kg: req.weight_kg,
            length_cm: req.dimensions.length_cm,
            width_cm: req.dimensions.width_cm,
            height_cm: req.dimensions.height_cm,
            value_rub: req.value_rub,
            contents: req.contents,
            service_level: req.service_level,
        })
        .await
        .map_err(fail)?;

    Ok(ok(QuoteResponse {
        quote_id: record.id,
        base_cost_rub: record.base_cost_rub,
        duty_estimate_rub: record.duty_estimate_rub,
        total_cost_rub: record.total_cost_rub,
        estimated_days: record.estimated_days,
        carrier: record.carrier,
        insurance_included: record.insurance_included,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::test_state;
    use axum::http::StatusCode;

    fn sample_request() -> QuoteRequest {
        QuoteRequest {
            from_country: "RU".to_string(),
            to_country: None,
            weight_kg: 2.0,
            dimensions: Dimensions {
                length_cm: 40.0,
                width_cm: 30.0,
                height_cm: 20.0,
            },
            value_rub: 500,
            contents: "books".to_string(),
            service_level: Some("STANDARD".to_string()),
        }
    }

    #[tokio::test]
    async fn test_quote_endpoint_worked_example() {
        let state = test_state().await;

        let response = quote(State(state), Json(sample_request())).await.unwrap().0;
        assert!(response.success);
        assert_eq!(response.data.base_cost_rub, 4000);
        assert_eq!(response.data.duty_estimate_rub, 75);
        assert_eq!(response.data.total_cost_rub, 4075);
        assert_eq!(response.data.estimated_days, 7);
        assert_eq!(response.data.carrier, "CDEK");
    }

    #[tokio::test]
    async fn test_quote_endpoint_rejects_bad_weight() {
        let state = test_state().await;

        let mut request = sample_request();
        request.weight_kg = 0.0;

        let result = quote(State(state), Json(request)).await;
        let (status, _) = result.err().unwrap();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_quote_endpoint_rejects_unknown_level() {
        let state = test_state().await;

        let mut request = sample_request();
        request.service_level = Some("TELEPORT".to_string());

        let result = quote(State(state), Json(request)).await;
        let (status, _) = result.err().unwrap();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
