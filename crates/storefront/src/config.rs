//! Storefront configuration loaded from environment variables.
//!
//! All configuration is read once at startup into an explicit config object;
//! business logic never reads the process environment directly.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BEARBEAT_DATABASE_URL` - `PostgreSQL` connection string
//! - `BEARBEAT_BASE_URL` - Public URL for the storefront API
//! - `BEARBEAT_ADMIN_TOKEN` - Bearer token for admin endpoints (min 32 chars, high entropy)
//! - `STRIPE_SECRET_KEY` - Stripe API secret key
//! - `STRIPE_WEBHOOK_SECRET` - Stripe webhook signing secret
//! - `PAYPAL_CLIENT_ID` - PayPal REST client ID
//! - `PAYPAL_CLIENT_SECRET` - PayPal REST client secret
//! - `BUNNY_CDN_BASE_URL` - BunnyCDN pull-zone URL serving the video pack
//! - `BUNNY_CDN_TOKEN_KEY` - BunnyCDN URL token authentication key
//!
//! ## Optional
//! - `BEARBEAT_HOST` - Bind address (default: 127.0.0.1)
//! - `BEARBEAT_PORT` - Listen port (default: 3000)
//! - `BEARBEAT_DEFAULT_PACK` - Pack slug sold at checkout (default: bear-beat-pack)
//! - `PAYPAL_API_BASE` - PayPal API base (default: <https://api-m.paypal.com>)
//! - `BREVO_API_KEY` - Brevo transactional email API key
//! - `BREVO_LIST_ID` - Brevo contact list for buyers
//! - `MANYCHAT_API_KEY` - ManyChat API key
//! - `MANYCHAT_PURCHASE_FLOW` - ManyChat flow ns triggered after purchase
//! - `TWILIO_ACCOUNT_SID` - Twilio account SID
//! - `TWILIO_AUTH_TOKEN` - Twilio auth token
//! - `TWILIO_FROM_SMS` - Twilio SMS sender number
//! - `TWILIO_FROM_WHATSAPP` - Twilio WhatsApp sender (e.g. whatsapp:+14155238886)
//! - `BUNNY_CDN_LINK_TTL_SECS` - Signed download link lifetime (default: 86400)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_ADMIN_TOKEN_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Default lifetime of a signed download link.
const DEFAULT_LINK_TTL_SECS: u64 = 86_400;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront API
    pub base_url: String,
    /// Bearer token protecting admin endpoints
    pub admin_token: SecretString,
    /// Pack slug sold when the checkout session carries no pack metadata
    pub default_pack: String,
    /// Stripe API configuration
    pub stripe: StripeConfig,
    /// PayPal API configuration
    pub paypal: PayPalConfig,
    /// Marketing platform configuration (all optional)
    pub marketing: MarketingConfig,
    /// BunnyCDN download configuration
    pub cdn: CdnConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Stripe API configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct StripeConfig {
    /// Stripe API secret key (sk_live_... / sk_test_...)
    pub secret_key: SecretString,
    /// Webhook signing secret (whsec_...)
    pub webhook_secret: SecretString,
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("secret_key", &"[REDACTED]")
            .field("webhook_secret", &"[REDACTED]")
            .finish()
    }
}

/// PayPal REST API configuration.
#[derive(Clone)]
pub struct PayPalConfig {
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: SecretString,
    /// API base URL (live or sandbox)
    pub api_base: String,
}

impl std::fmt::Debug for PayPalConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayPalConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// Marketing platform configuration.
///
/// Every platform is optional; an unset platform is skipped during sync.
#[derive(Clone, Default)]
pub struct MarketingConfig {
    /// Brevo transactional email API key
    pub brevo_api_key: Option<SecretString>,
    /// Brevo contact list for buyers
    pub brevo_list_id: Option<i64>,
    /// ManyChat API key
    pub manychat_api_key: Option<SecretString>,
    /// ManyChat flow triggered after a completed purchase
    pub manychat_purchase_flow: Option<String>,
    /// Twilio account SID
    pub twilio_account_sid: Option<String>,
    /// Twilio auth token
    pub twilio_auth_token: Option<SecretString>,
    /// Twilio SMS sender number
    pub twilio_from_sms: Option<String>,
    /// Twilio WhatsApp sender
    pub twilio_from_whatsapp: Option<String>,
}

impl std::fmt::Debug for MarketingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketingConfig")
            .field("brevo_api_key", &self.brevo_api_key.as_ref().map(|_| "[REDACTED]"))
            .field("brevo_list_id", &self.brevo_list_id)
            .field(
                "manychat_api_key",
                &self.manychat_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("manychat_purchase_flow", &self.manychat_purchase_flow)
            .field("twilio_account_sid", &self.twilio_account_sid)
            .field(
                "twilio_auth_token",
                &self.twilio_auth_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("twilio_from_sms", &self.twilio_from_sms)
            .field("twilio_from_whatsapp", &self.twilio_from_whatsapp)
            .finish()
    }
}

/// BunnyCDN download configuration.
#[derive(Clone)]
pub struct CdnConfig {
    /// Pull-zone base URL serving the pack archives
    pub base_url: String,
    /// URL token authentication key
    pub token_key: SecretString,
    /// Signed link lifetime in seconds
    pub link_ttl_secs: u64,
}

impl std::fmt::Debug for CdnConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CdnConfig")
            .field("base_url", &self.base_url)
            .field("token_key", &"[REDACTED]")
            .field("link_ttl_secs", &self.link_ttl_secs)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("BEARBEAT_DATABASE_URL")?;
        let host = get_env_or_default("BEARBEAT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("BEARBEAT_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("BEARBEAT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("BEARBEAT_PORT".to_string(), e.to_string()))?;
        let base_url = get_required_env("BEARBEAT_BASE_URL")?;
        let admin_token = get_validated_secret("BEARBEAT_ADMIN_TOKEN")?;
        validate_admin_token(&admin_token, "BEARBEAT_ADMIN_TOKEN")?;
        let default_pack = get_env_or_default("BEARBEAT_DEFAULT_PACK", "bear-beat-pack");

        let stripe = StripeConfig::from_env()?;
        let paypal = PayPalConfig::from_env()?;
        let marketing = MarketingConfig::from_env();
        let cdn = CdnConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            admin_token,
            default_pack,
            stripe,
            paypal,
            marketing,
            cdn,
            sentry_dsn,
            sentry_environment,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl StripeConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            secret_key: get_required_secret("STRIPE_SECRET_KEY")?,
            webhook_secret: get_required_secret("STRIPE_WEBHOOK_SECRET")?,
        })
    }
}

impl PayPalConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            client_id: get_required_env("PAYPAL_CLIENT_ID")?,
            client_secret: get_required_secret("PAYPAL_CLIENT_SECRET")?,
            api_base: get_env_or_default("PAYPAL_API_BASE", "https://api-m.paypal.com"),
        })
    }
}

impl MarketingConfig {
    fn from_env() -> Self {
        Self {
            brevo_api_key: get_optional_env("BREVO_API_KEY").map(SecretString::from),
            brevo_list_id: get_optional_env("BREVO_LIST_ID").and_then(|v| v.parse().ok()),
            manychat_api_key: get_optional_env("MANYCHAT_API_KEY").map(SecretString::from),
            manychat_purchase_flow: get_optional_env("MANYCHAT_PURCHASE_FLOW"),
            twilio_account_sid: get_optional_env("TWILIO_ACCOUNT_SID"),
            twilio_auth_token: get_optional_env("TWILIO_AUTH_TOKEN").map(SecretString::from),
            twilio_from_sms: get_optional_env("TWILIO_FROM_SMS"),
            twilio_from_whatsapp: get_optional_env("TWILIO_FROM_WHATSAPP"),
        }
    }
}

impl CdnConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let link_ttl_secs = match get_optional_env("BUNNY_CDN_LINK_TTL_SECS") {
            Some(raw) => raw.parse::<u64>().map_err(|e| {
                ConfigError::InvalidEnvVar("BUNNY_CDN_LINK_TTL_SECS".to_string(), e.to_string())
            })?,
            None => DEFAULT_LINK_TTL_SECS,
        };

        Ok(Self {
            base_url: get_required_env("BUNNY_CDN_BASE_URL")?,
            token_key: get_required_secret("BUNNY_CDN_TOKEN_KEY")?,
            link_ttl_secs,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get database URL with fallback to generic `DATABASE_URL` (used by managed postgres attach).
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    // Try primary key first (e.g., BEARBEAT_DATABASE_URL)
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    // Fallback to generic DATABASE_URL
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Validate that the admin token meets minimum length requirements.
fn validate_admin_token(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_ADMIN_TOKEN_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_ADMIN_TOKEN_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Check entropy (real secrets like API keys have high entropy)
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        // All same character = 0 entropy
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        // "ab" has entropy of 1 bit per char (50% a, 50% b)
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_shannon_entropy_high() {
        // Random-looking string should have high entropy
        let entropy = shannon_entropy("aB3$xY9!mK2@nL5#");
        assert!(entropy > 3.3);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-api-key-here", "TEST_VAR");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_changeme() {
        let result = validate_secret_strength("changeme123", "TEST_VAR");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        // High-entropy random string
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_admin_token_too_short() {
        let secret = SecretString::from("short");
        let result = validate_admin_token(&secret, "TEST_TOKEN");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_admin_token_valid_length() {
        let secret = SecretString::from("a".repeat(32));
        let result = validate_admin_token(&secret, "TEST_TOKEN");
        assert!(result.is_ok());
    }

    #[test]
    fn test_socket_addr() {
        let config = StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            admin_token: SecretString::from("x".repeat(32)),
            default_pack: "bear-beat-pack".to_string(),
            stripe: StripeConfig {
                secret_key: SecretString::from("sk_test_123"),
                webhook_secret: SecretString::from("whsec_123"),
            },
            paypal: PayPalConfig {
                client_id: "client_id".to_string(),
                client_secret: SecretString::from("client_secret"),
                api_base: "https://api-m.sandbox.paypal.com".to_string(),
            },
            marketing: MarketingConfig::default(),
            cdn: CdnConfig {
                base_url: "https://cdn.bearbeat.mx".to_string(),
                token_key: SecretString::from("token_key"),
                link_ttl_secs: 3600,
            },
            sentry_dsn: None,
            sentry_environment: None,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_stripe_config_debug_redacts_secrets() {
        let config = StripeConfig {
            secret_key: SecretString::from("sk_live_super_secret"),
            webhook_secret: SecretString::from("whsec_super_secret"),
        };

        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("sk_live_super_secret"));
        assert!(!debug_output.contains("whsec_super_secret"));
    }

    #[test]
    fn test_paypal_config_debug_redacts_secret() {
        let config = PayPalConfig {
            client_id: "visible_client_id".to_string(),
            client_secret: SecretString::from("hidden_client_secret"),
            api_base: "https://api-m.paypal.com".to_string(),
        };

        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("visible_client_id"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("hidden_client_secret"));
    }
}
