//! Integration tests for Bear Beat.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p bear-beat-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `webhook_signatures` - Stripe signature verification against the raw
//!   HMAC scheme
//! - `webhook_http` - HTTP-level webhook handler behavior (signature
//!   rejection paths; no database required)
//! - `purchase_flow` - Purchase state machine and retry-summary semantics
//!
//! Tests that would require a live `PostgreSQL` instance (activation
//! transactions, pool claiming under contention) are not included here; the
//! atomic-claim guarantees are enforced by query construction (conditional
//! updates with affected-row checks, `FOR UPDATE SKIP LOCKED`).

use secrecy::SecretString;

use bear_beat_storefront::config::{
    CdnConfig, MarketingConfig, PayPalConfig, StorefrontConfig, StripeConfig,
};

/// Webhook secret used across signature tests.
pub const TEST_WEBHOOK_SECRET: &str = "whsec_test123secret456";

/// Admin token used across admin-route tests.
pub const TEST_ADMIN_TOKEN: &str = "gK8mQ2xVb9Tz4Wn7Jr5Pc1Hd6Ys3Fa0L";

/// Build a storefront configuration for tests.
///
/// The database URL points nowhere; combined with a lazily-connecting pool
/// this supports exercising every code path that fails before touching the
/// database.
#[must_use]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        database_url: SecretString::from("postgres://localhost:1/bearbeat_test"),
        host: "127.0.0.1".parse().expect("valid host"),
        port: 3000,
        base_url: "http://localhost:3000".to_owned(),
        admin_token: SecretString::from(TEST_ADMIN_TOKEN),
        default_pack: "bear-beat-pack".to_owned(),
        stripe: StripeConfig {
            secret_key: SecretString::from("sk_test_xxx"),
            webhook_secret: SecretString::from(TEST_WEBHOOK_SECRET),
        },
        paypal: PayPalConfig {
            client_id: "test_client".to_owned(),
            client_secret: SecretString::from("test_secret"),
            api_base: "https://api-m.sandbox.paypal.com".to_owned(),
        },
        marketing: MarketingConfig::default(),
        cdn: CdnConfig {
            base_url: "https://cdn.bearbeat.test".to_owned(),
            token_key: SecretString::from("cdn-token-key"),
            link_ttl_secs: 3600,
        },
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// Compute a Stripe `v1` signature the way Stripe documents it:
/// HMAC-SHA256 over `{timestamp}.{payload}`.
#[must_use]
pub fn compute_stripe_signature(payload: &[u8], secret: &str, timestamp: &str) -> String {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    type HmacSha256 = Hmac<Sha256>;

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Current Unix timestamp as a string (for webhook signature tests).
#[must_use]
pub fn current_timestamp() -> String {
    chrono::Utc::now().timestamp().to_string()
}

/// A timestamp beyond the 5-minute tolerance (for replay tests).
#[must_use]
pub fn old_timestamp() -> String {
    (chrono::Utc::now().timestamp() - 600).to_string()
}
