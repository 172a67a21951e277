//! Payment Gateway Trait
//!
//! Capability interface every payment provider adapter implements. The
//! settlement engine selects an adapter through a registry keyed by the
//! provider enum and never branches on provider names itself.

use crate::domain::entities::payment::PaymentProvider;
use async_trait::async_trait;

pub type GatewayResult<T> = Result<T, GatewayError>;

#[derive(Debug, Clone, thiserror::Error)]
pub enum GatewayError {
    #[error("authorization failed: {0}")]
    AuthorizationFailed(String),

    #[error("capture failed: {0}")]
    CaptureFailed(String),

    #[error("refund failed: {0}")]
    RefundFailed(String),

    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

/// Client-side handle returned by a successful authorization.
#[derive(Debug, Clone)]
pub struct GatewayAuthorization {
    /// Secret the marketplace front-end hands to the provider widget.
    pub client_secret: String,
}

/// One implementation per provider; all stubbed in this deployment, but the
/// interface mirrors the real authorize/capture/refund contract.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Which provider this adapter speaks for.
    fn provider(&self) -> PaymentProvider;

    /// Reserve funds against the given provider reference.
    async fn authorize(
        &self,
        provider_ref: &str,
        amount_rub: i64,
        currency: &str,
    ) -> GatewayResult<GatewayAuthorization>;

    /// Settle a previously authorized charge. Returns the provider's
    /// capture reference.
    async fn capture(&self, provider_ref: &str, amount_rub: i64) -> GatewayResult<String>;

    /// Return funds to the payer. Returns the provider's refund reference.
    async fn refund(&self, provider_ref: &str) -> GatewayResult<String>;
}
