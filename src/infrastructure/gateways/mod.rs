//! Payment gateway adapters.
//!
//! One adapter per provider behind the [`PaymentGateway`] capability trait,
//! selected through [`GatewayRegistry`]. The adapters simulate their
//! providers; swap an entry in the registry to go live with a real one.

pub mod mockpay;
pub mod sber;
pub mod tinkoff;
pub mod yoomoney;

use crate::domain::entities::payment::PaymentProvider;
use crate::domain::gateways::PaymentGateway;
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;

/// Random lowercase-alphanumeric suffix for provider-side references.
pub(crate) fn reference_suffix(len: usize) -> String {
    const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Provider-keyed adapter lookup.
pub struct GatewayRegistry {
    gateways: HashMap<PaymentProvider, Arc<dyn PaymentGateway>>,
}

impl GatewayRegistry {
    pub fn new() -> Self {
        Self {
            gateways: HashMap::new(),
        }
    }

    /// All four supported providers with their stub adapters.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(mockpay::MockPayGateway::new()));
        registry.register(Arc::new(yoomoney::YooMoneyGateway::new()));
        registry.register(Arc::new(sber::SberGateway::new()));
        registry.register(Arc::new(tinkoff::TinkoffGateway::new()));
        registry
    }

    pub fn register(&mut self, gateway: Arc<dyn PaymentGateway>) {
        self.gateways.insert(gateway.provider(), gateway);
    }

    pub fn get(&self, provider: PaymentProvider) -> Option<Arc<dyn PaymentGateway>> {
        self.gateways.get(&provider).cloned()
    }
}

impl Default for GatewayRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_registry_covers_every_provider() {
        let registry = GatewayRegistry::standard();
        for provider in PaymentProvider::all() {
            let gateway = registry.get(provider).expect("adapter registered");
            assert_eq!(gateway.provider(), provider);
        }
    }

    #[test]
    fn test_empty_registry_has_no_adapters() {
        let registry = GatewayRegistry::new();
        assert!(registry.get(PaymentProvider::Mockpay).is_none());
    }

    #[test]
    fn test_reference_suffix_alphabet_and_length() {
        let suffix = reference_suffix(12);
        assert_eq!(suffix.len(), 12);
        assert!(suffix
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }
}
