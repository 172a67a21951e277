//! MockPay adapter.
//!
//! The in-house test provider: every operation succeeds and returns
//! deterministic-looking references. Used in development and as the
//! synthetic provider for out-of-band booking charges.

use super::reference_suffix;
use crate::domain::entities::payment::PaymentProvider;
use crate::domain::gateways::{GatewayAuthorization, GatewayResult, PaymentGateway};
use async_trait::async_trait;
use tracing::debug;

pub struct MockPayGateway;

impl MockPayGateway {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MockPayGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentGateway for MockPayGateway {
    fn provider(&self) -> PaymentProvider {
        PaymentProvider::Mockpay
    }

    async fn authorize(
        &self,
        provider_ref: &str,
        amount_rub: i64,
        currency: &str,
    ) -> GatewayResult<GatewayAuthorization> {
        debug!(
            "MockPay authorize {} for {} {}",
            provider_ref, amount_rub, currency
        );
        Ok(GatewayAuthorization {
            client_secret: format!("mockpay_secret_{}", reference_suffix(16)),
        })
    }

    async fn capture(&self, provider_ref: &str, amount_rub: i64) -> GatewayResult<String> {
        debug!("MockPay capture {} for {}", provider_ref, amount_rub);
        Ok(format!("mp_cap_{}", reference_suffix(10)))
    }

    async fn refund(&self, provider_ref: &str) -> GatewayResult<String> {
        debug!("MockPay refund {}", provider_ref);
        Ok(format!("mp_ref_{}", reference_suffix(10)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mockpay_full_cycle() {
        let gateway = MockPayGateway::new();
        assert_eq!(gateway.provider(), PaymentProvider::Mockpay);

        let auth = gateway.authorize("mockpay_abc123", 1500, "RUB").await.unwrap();
        assert!(auth.client_secret.starts_with("mockpay_secret_"));

        let capture_ref = gateway.capture("mockpay_abc123", 1500).await.unwrap();
        assert!(capture_ref.starts_with("mp_cap_"));

        let refund_ref = gateway.refund("mockpay_abc123").await.unwrap();
        assert!(refund_ref.starts_with("mp_ref_"));
    }
}
