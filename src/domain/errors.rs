//! Settlement error taxonomy.
//!
//! Every failure surfaced by the settlement services is one of these
//! variants; the HTTP layer maps them onto status codes and the JSON error
//! envelope. The engine never retries internally; callers retry
//! idempotently on dependency failures.

use crate::domain::gateways::GatewayError;
use crate::persistence::StoreError;
use thiserror::Error;

pub type SettlementResult<T> = Result<T, SettlementError>;

#[derive(Debug, Error)]
pub enum SettlementError {
    /// Malformed or out-of-range input.
    #[error("{0}")]
    Validation(String),

    /// Referenced entity absent from the ledger store.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Operation not legal in the entity's current lifecycle state.
    #[error("{entity} is {current}, expected {expected}")]
    InvalidState {
        entity: &'static str,
        current: String,
        expected: String,
    },

    /// Group-buy quantity threshold unmet.
    #[error("deal threshold not met: {current} of {required} pledged")]
    ThresholdNotMet { current: i64, required: i64 },

    /// Capture amount above the authorized amount.
    #[error("capture amount {requested} exceeds authorized amount {authorized}")]
    AmountExceeded { requested: i64, authorized: i64 },

    /// Provider value outside the supported enum.
    #[error("unsupported payment provider: {0}")]
    ProviderUnsupported(String),

    /// Refund requested for an already-refunded payment.
    #[error("payment already refunded: {0}")]
    AlreadyRefunded(String),

    /// Payment provider call failed.
    #[error("payment gateway failure: {0}")]
    Gateway(String),

    /// Ledger store read or write failed.
    #[error("storage failure: {0}")]
    Dependency(String),
}

impl SettlementError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        SettlementError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn invalid_state(
        entity: &'static str,
        current: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        SettlementError::InvalidState {
            entity,
            current: current.into(),
            expected: expected.into(),
        }
    }
}

impl From<StoreError> for SettlementError {
    fn from(e: StoreError) -> Self {
        SettlementError::Dependency(e.to_string())
    }
}

impl From<GatewayError> for SettlementError {
    fn from(e: GatewayError) -> Self {
        SettlementError::Gateway(e.to_string())
    }
}
