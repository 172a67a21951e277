//! YooMoney adapter.
//!
//! Simulates the YooMoney checkout flow: authorization yields a
//! confirmation token the widget consumes; capture and refund return the
//! provider's operation ids.

use super::reference_suffix;
use crate::domain::entities::payment::PaymentProvider;
use crate::domain::gateways::{GatewayAuthorization, GatewayError, GatewayResult, PaymentGateway};
use async_trait::async_trait;
use tracing::debug;

pub struct YooMoneyGateway;

impl YooMoneyGateway {
    pub fn new() -> Self {
        Self
    }
}

impl Default for YooMoneyGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentGateway for YooMoneyGateway {
    fn provider(&self) -> PaymentProvider {
        PaymentProvider::Yoomoney
    }

    async fn authorize(
        &self,
        provider_ref: &str,
        amount_rub: i64,
        currency: &str,
    ) -> GatewayResult<GatewayAuthorization> {
        // YooMoney holds are ruble-denominated.
        if currency != "RUB" {
            return Err(GatewayError::AuthorizationFailed(format!(
                "YooMoney does not accept {} charges",
                currency
            )));
        }
        debug!("YooMoney authorize {} for {} RUB", provider_ref, amount_rub);
        Ok(GatewayAuthorization {
            client_secret: format!("ct-{}", reference_suffix(22)),
        })
    }

    async fn capture(&self, provider_ref: &str, amount_rub: i64) -> GatewayResult<String> {
        debug!("YooMoney capture {} for {}", provider_ref, amount_rub);
        Ok(format!("ym_cap_{}", reference_suffix(12)))
    }

    async fn refund(&self, provider_ref: &str) -> GatewayResult<String> {
        debug!("YooMoney refund {}", provider_ref);
        Ok(format!("ym_ref_{}", reference_suffix(12)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_yoomoney_issues_confirmation_token() {
        let gateway = YooMoneyGateway::new();
        let auth = gateway.authorize("yoomoney_x1", 900, "RUB").await.unwrap();
        assert!(auth.client_secret.starts_with("ct-"));
    }

    #[tokio::test]
    async fn test_yoomoney_rejects_foreign_currency() {
        let gateway = YooMoneyGateway::new();
        let result = gateway.authorize("yoomoney_x1", 900, "USD").await;
        assert!(matches!(
            result,
            Err(GatewayError::AuthorizationFailed(_))
        ));
    }
}
