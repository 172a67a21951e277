//! SberPay adapter.

use super::reference_suffix;
use crate::domain::entities::payment::PaymentProvider;
use crate::domain::gateways::{GatewayAuthorization, GatewayResult, PaymentGateway};
use async_trait::async_trait;
use tracing::debug;

pub struct SberGateway;

impl SberGateway {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SberGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentGateway for SberGateway {
    fn provider(&self) -> PaymentProvider {
        PaymentProvider::Sber
    }

    async fn authorize(
        &self,
        provider_ref: &str,
        amount_rub: i64,
        currency: &str,
    ) -> GatewayResult<GatewayAuthorization> {
        debug!(
            "SberPay authorize {} for {} {}",
            provider_ref, amount_rub, currency
        );
        Ok(GatewayAuthorization {
            client_secret: format!("sber_session_{}", reference_suffix(20)),
        })
    }

    async fn capture(&self, provider_ref: &str, amount_rub: i64) -> GatewayResult<String> {
        debug!("SberPay capture {} for {}", provider_ref, amount_rub);
        Ok(format!("sb_cap_{}", reference_suffix(12)))
    }

    async fn refund(&self, provider_ref: &str) -> GatewayResult<String> {
        debug!("SberPay refund {}", provider_ref);
        Ok(format!("sb_ref_{}", reference_suffix(12)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sber_references() {
        let gateway = SberGateway::new();
        let auth = gateway.authorize("sber_a1", 5000, "RUB").await.unwrap();
        assert!(auth.client_secret.starts_with("sber_session_"));
        assert!(gateway
            .capture("sber_a1", 5000)
            .await
            .unwrap()
            .starts_with("sb_cap_"));
    }
}
