//! Tinkoff (T-Pay) adapter.

use super::reference_suffix;
use crate::domain::entities::payment::PaymentProvider;
use crate::domain::gateways::{GatewayAuthorization, GatewayResult, PaymentGateway};
use async_trait::async_trait;
use tracing::debug;

pub struct TinkoffGateway;

impl TinkoffGateway {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TinkoffGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentGateway for TinkoffGateway {
    fn provider(&self) -> PaymentProvider {
        PaymentProvider::Tinkoff
    }

    async fn authorize(
        &self,
        provider_ref: &str,
        amount_rub: i64,
        currency: &str,
    ) -> GatewayResult<GatewayAuthorization> {
        debug!(
            "T-Pay authorize {} for {} {}",
            provider_ref, amount_rub, currency
        );
        Ok(GatewayAuthorization {
            client_secret: format!("tnk_{}", reference_suffix(24)),
        })
    }

    async fn capture(&self, provider_ref: &str, amount_rub: i64) -> GatewayResult<String> {
        debug!("T-Pay capture {} for {}", provider_ref, amount_rub);
        Ok(format!("tk_cap_{}", reference_suffix(12)))
    }

    async fn refund(&self, provider_ref: &str) -> GatewayResult<String> {
        debug!("T-Pay refund {}", provider_ref);
        Ok(format!("tk_ref_{}", reference_suffix(12)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_tinkoff_references() {
        let gateway = TinkoffGateway::new();
        let auth = gateway.authorize("tinkoff_z9", 300, "RUB").await.unwrap();
        assert!(auth.client_secret.starts_with("tnk_"));
        assert!(gateway
            .refund("tinkoff_z9")
            .await
            .unwrap()
            .starts_with("tk_ref_"));
    }
}
