//! Service-to-service authentication.
//!
//! The settlement endpoints are called by the marketplace backend, never by
//! browsers directly; callers present a bearer token from a configured set.
//! This is the deployment-side face of the external auth provider: a
//! request either resolves to a trusted caller or is rejected.

use axum::{extract::Request, http::StatusCode, middleware::Next, response::Response};
use std::collections::HashSet;
use std::sync::OnceLock;

static SERVICE_TOKENS: OnceLock<HashSet<String>> = OnceLock::new();

/// Tokens shorter than this are refused outright.
const MIN_TOKEN_LENGTH: usize = 32;

/// Load the accepted tokens from `KASSA_SERVICE_TOKENS` (comma-separated).
///
/// # Panics
/// Panics when the variable is unset, empty, or contains a weak token.
/// Starting without authentication would expose money-moving endpoints,
/// so the process refuses to come up instead.
pub fn init_service_tokens() {
    let raw = std::env::var("KASSA_SERVICE_TOKENS").expect(
        "KASSA_SERVICE_TOKENS is not set. \
         Provide a comma-separated list of service tokens. \
         Generate one with: openssl rand -base64 32",
    );

    let mut tokens = HashSet::new();
    for token in raw.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        if token.len() < MIN_TOKEN_LENGTH {
            panic!(
                "Service token is too weak (length {}, minimum {}). \
                 Generate one with: openssl rand -base64 32",
                token.len(),
                MIN_TOKEN_LENGTH
            );
        }
        tokens.insert(token.to_string());
    }

    if tokens.is_empty() {
        panic!(
            "No usable tokens found in KASSA_SERVICE_TOKENS; at least one \
             token of {}+ characters is required",
            MIN_TOKEN_LENGTH
        );
    }

    let count = tokens.len();
    SERVICE_TOKENS
        .set(tokens)
        .expect("service tokens already initialized");
    tracing::info!("Service authentication initialized with {} token(s)", count);
}

fn is_trusted_token(token: &str) -> bool {
    SERVICE_TOKENS
        .get()
        .map(|tokens| tokens.contains(token))
        .unwrap_or(false)
}

/// Middleware guarding the settlement routes.
pub async fn require_service_token(request: Request, next: Next) -> Result<Response, StatusCode> {
    let header = request
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok());

    match header {
        Some(value) if value.starts_with("Bearer ") => {
            let token = &value["Bearer ".len()..];
            if is_trusted_token(token) {
                Ok(next.run(request).await)
            } else {
                tracing::warn!("Rejected request with unknown service token");
                Err(StatusCode::UNAUTHORIZED)
            }
        }
        Some(_) => {
            tracing::warn!("Rejected request with non-Bearer Authorization header");
            Err(StatusCode::UNAUTHORIZED)
        }
        None => {
            tracing::warn!("Rejected request without Authorization header");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_lookup() {
        let mut tokens = HashSet::new();
        tokens.insert("a-token-that-is-long-enough-to-pass-0001".to_string());
        let _ = SERVICE_TOKENS.set(tokens);

        assert!(is_trusted_token("a-token-that-is-long-enough-to-pass-0001"));
        assert!(!is_trusted_token("unknown"));
        assert!(!is_trusted_token(""));
    }
}
