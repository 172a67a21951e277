//! Payout ledger primitives.
//!
//! The ledger is append-only double entry: a user's balance is the fold of
//! all CREDIT entries minus all DEBIT entries. Every append carries an
//! idempotency key so retried settlement operations never double-post.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEntryKind {
    Credit,
    Debit,
}

impl LedgerEntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerEntryKind::Credit => "CREDIT",
            LedgerEntryKind::Debit => "DEBIT",
        }
    }

    /// Signed contribution of one entry to a balance fold.
    pub fn signed(&self, amount_rub: i64) -> i64 {
        match self {
            LedgerEntryKind::Credit => amount_rub,
            LedgerEntryKind::Debit => -amount_rub,
        }
    }
}

impl std::str::FromStr for LedgerEntryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREDIT" => Ok(LedgerEntryKind::Credit),
            "DEBIT" => Ok(LedgerEntryKind::Debit),
            other => Err(format!("Unknown ledger entry kind: {}", other)),
        }
    }
}

/// Idempotency key for a settlement-operation ledger leg, derived from the
/// operation name, the entity that triggered it, and the leg.
pub fn idempotency_key(operation: &str, entity_id: &str, leg: &str) -> String {
    format!("{}:{}:{}", operation, entity_id, leg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_signed_contributions() {
        assert_eq!(LedgerEntryKind::Credit.signed(500), 500);
        assert_eq!(LedgerEntryKind::Debit.signed(500), -500);
    }

    #[test]
    fn test_kind_round_trip() {
        assert_eq!(
            LedgerEntryKind::from_str("CREDIT").unwrap(),
            LedgerEntryKind::Credit
        );
        assert_eq!(
            LedgerEntryKind::from_str("DEBIT").unwrap(),
            LedgerEntryKind::Debit
        );
        assert!(LedgerEntryKind::from_str("TRANSFER").is_err());
    }

    #[test]
    fn test_idempotency_key_shape() {
        assert_eq!(
            idempotency_key("refund", "pay-1", "credit"),
            "refund:pay-1:credit"
        );
    }
}
