//! Stripe API client.
//!
//! Covers the two Stripe interactions the purchase flow needs: verifying
//! webhook signatures on delivered events, and retrieving checkout sessions
//! to re-confirm payment status (OXXO and SPEI sessions flip to `paid` hours
//! after checkout).

use hmac::{Hmac, Mac};
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;
use sha2::Sha256;
use std::collections::HashMap;

use bear_beat_core::PaymentStatus;

use super::PaymentError;
use crate::config::StripeConfig;

type HmacSha256 = Hmac<Sha256>;

/// Stripe API base URL.
const BASE_URL: &str = "https://api.stripe.com/v1";

/// Maximum accepted age of a webhook timestamp (replay protection).
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Stripe API client.
#[derive(Clone)]
pub struct StripeClient {
    client: reqwest::Client,
    webhook_secret: String,
}

impl StripeClient {
    /// Create a new Stripe API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &StripeConfig) -> Result<Self, PaymentError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.secret_key.expose_secret());
        headers.insert(
            "Authorization",
            HeaderValue::from_str(&auth_value)
                .map_err(|e| PaymentError::Parse(format!("Invalid API key format: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            webhook_secret: config.webhook_secret.expose_secret().to_owned(),
        })
    }

    /// Verify a `Stripe-Signature` header against the raw request body.
    ///
    /// The header carries a unix timestamp and one or more `v1` signatures:
    /// `t=1712345678,v1=abcdef...`. The expected signature is
    /// HMAC-SHA256(`{timestamp}.{body}`) with the webhook secret. Timestamps
    /// older than the tolerance window are rejected to block replays.
    ///
    /// Returns `Ok(false)` for a well-formed header that does not match.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::InvalidSignatureHeader` if the header lacks a
    /// timestamp or signature part.
    pub fn verify_webhook_signature(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<bool, PaymentError> {
        let mut timestamp: Option<i64> = None;
        let mut signatures: Vec<&str> = Vec::new();

        for part in signature_header.split(',') {
            match part.trim().split_once('=') {
                Some(("t", value)) => {
                    timestamp = value.parse().ok();
                }
                Some(("v1", value)) => signatures.push(value),
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or_else(|| {
            PaymentError::InvalidSignatureHeader("missing timestamp".to_owned())
        })?;
        if signatures.is_empty() {
            return Err(PaymentError::InvalidSignatureHeader(
                "missing v1 signature".to_owned(),
            ));
        }

        // Reject stale deliveries regardless of signature validity
        let age = chrono::Utc::now().timestamp() - timestamp;
        if age.abs() > SIGNATURE_TOLERANCE_SECS {
            return Ok(false);
        }

        let expected = compute_signature(&self.webhook_secret, timestamp, payload);

        Ok(signatures.iter().any(|sig| *sig == expected))
    }

    /// Retrieve a checkout session by id.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails or the response cannot be
    /// parsed.
    pub async fn retrieve_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<CheckoutSession, PaymentError> {
        let url = format!(
            "{BASE_URL}/checkout/sessions/{}",
            urlencoding::encode(session_id)
        );

        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<CheckoutSession>()
            .await
            .map_err(|e| PaymentError::Parse(e.to_string()))
    }
}

/// Compute the `v1` signature for a payload at a timestamp.
fn compute_signature(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

// =============================================================================
// Webhook event types
// =============================================================================

/// A delivered webhook event.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeEvent {
    /// Event id (evt_...).
    pub id: String,
    /// Event type, e.g. `checkout.session.completed`.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Event payload.
    pub data: StripeEventData,
}

/// Event payload wrapper.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeEventData {
    /// The affected API object (a checkout session for the events we handle).
    pub object: CheckoutSession,
}

/// A Stripe checkout session, as delivered in events and session retrieval.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    /// Session id (cs_...).
    pub id: String,
    /// Payment intent id (pi_...), absent for some deferred methods.
    #[serde(default)]
    pub payment_intent: Option<String>,
    /// Payment status: `paid`, `unpaid`, or `no_payment_required`.
    pub payment_status: String,
    /// Total amount in minor units.
    #[serde(default)]
    pub amount_total: Option<i64>,
    /// Lowercase ISO 4217 currency code.
    #[serde(default)]
    pub currency: Option<String>,
    /// Payer details collected at checkout.
    #[serde(default)]
    pub customer_details: Option<CustomerDetails>,
    /// Metadata set when the session was created (carries the pack slug).
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Payer details collected at checkout.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerDetails {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl CheckoutSession {
    /// Parse the provider's payment status string.
    ///
    /// Unknown values map to `Unpaid`: activation refuses anything that is
    /// not positively paid.
    #[must_use]
    pub fn parsed_payment_status(&self) -> PaymentStatus {
        self.payment_status
            .parse::<PaymentStatus>()
            .unwrap_or(PaymentStatus::Unpaid)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    const TEST_SECRET: &str = "whsec_test123secret456";

    fn test_client() -> StripeClient {
        StripeClient::new(&StripeConfig {
            secret_key: SecretString::from("sk_test_xxx"),
            webhook_secret: SecretString::from(TEST_SECRET),
        })
        .unwrap()
    }

    fn sign(payload: &[u8], secret: &str, timestamp: i64) -> String {
        compute_signature(secret, timestamp, payload)
    }

    #[test]
    fn test_valid_signature_accepted() {
        let client = test_client();
        let payload = b"{\"type\":\"checkout.session.completed\"}";
        let timestamp = chrono::Utc::now().timestamp();
        let header = format!("t={timestamp},v1={}", sign(payload, TEST_SECRET, timestamp));

        assert!(client.verify_webhook_signature(payload, &header).unwrap());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let client = test_client();
        let payload = b"{\"type\":\"checkout.session.completed\"}";
        let timestamp = chrono::Utc::now().timestamp();
        let header = format!("t={timestamp},v1={}", sign(payload, "wrong_secret", timestamp));

        assert!(!client.verify_webhook_signature(payload, &header).unwrap());
    }

    #[test]
    fn test_modified_payload_rejected() {
        let client = test_client();
        let original = b"{\"amount_total\":49900}";
        let modified = b"{\"amount_total\":1}";
        let timestamp = chrono::Utc::now().timestamp();
        let header = format!("t={timestamp},v1={}", sign(original, TEST_SECRET, timestamp));

        assert!(!client.verify_webhook_signature(modified, &header).unwrap());
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let client = test_client();
        let payload = b"{}";
        // 10 minutes ago, beyond the 5-minute tolerance
        let timestamp = chrono::Utc::now().timestamp() - 600;
        let header = format!("t={timestamp},v1={}", sign(payload, TEST_SECRET, timestamp));

        assert!(!client.verify_webhook_signature(payload, &header).unwrap());
    }

    #[test]
    fn test_missing_timestamp_errors() {
        let client = test_client();
        let result = client.verify_webhook_signature(b"{}", "v1=abc");
        assert!(matches!(
            result,
            Err(PaymentError::InvalidSignatureHeader(_))
        ));
    }

    #[test]
    fn test_missing_signature_errors() {
        let client = test_client();
        let result = client.verify_webhook_signature(b"{}", "t=1234567890");
        assert!(matches!(
            result,
            Err(PaymentError::InvalidSignatureHeader(_))
        ));
    }

    #[test]
    fn test_malformed_header_errors() {
        let client = test_client();
        assert!(client.verify_webhook_signature(b"{}", "garbage").is_err());
        assert!(client.verify_webhook_signature(b"{}", "").is_err());
    }

    #[test]
    fn test_multiple_v1_signatures_any_match() {
        // Stripe sends multiple v1 entries during secret rollover
        let client = test_client();
        let payload = b"{}";
        let timestamp = chrono::Utc::now().timestamp();
        let good = sign(payload, TEST_SECRET, timestamp);
        let bad = sign(payload, "old_secret", timestamp);
        let header = format!("t={timestamp},v1={bad},v1={good}");

        assert!(client.verify_webhook_signature(payload, &header).unwrap());
    }

    #[test]
    fn test_event_deserialization() {
        let json = serde_json::json!({
            "id": "evt_123",
            "type": "checkout.session.completed",
            "data": {
                "object": {
                    "id": "cs_test_123",
                    "payment_intent": "pi_test_456",
                    "payment_status": "paid",
                    "amount_total": 49900,
                    "currency": "mxn",
                    "customer_details": {
                        "email": "dj@example.com",
                        "name": "DJ Example",
                        "phone": "+5215512345678"
                    },
                    "metadata": {
                        "pack_slug": "bear-beat-pack"
                    }
                }
            }
        });

        let event: StripeEvent = serde_json::from_value(json).unwrap();
        assert_eq!(event.event_type, "checkout.session.completed");

        let session = &event.data.object;
        assert_eq!(session.id, "cs_test_123");
        assert_eq!(session.parsed_payment_status(), PaymentStatus::Paid);
        assert_eq!(session.amount_total, Some(49900));
        assert_eq!(
            session.customer_details.as_ref().unwrap().email.as_deref(),
            Some("dj@example.com")
        );
        assert_eq!(session.metadata.get("pack_slug").unwrap(), "bear-beat-pack");
    }

    #[test]
    fn test_event_deserialization_minimal_session() {
        // Deferred-payment sessions arrive without intent, details, or totals
        let json = serde_json::json!({
            "id": "evt_124",
            "type": "checkout.session.async_payment_succeeded",
            "data": {
                "object": {
                    "id": "cs_test_124",
                    "payment_status": "unpaid"
                }
            }
        });

        let event: StripeEvent = serde_json::from_value(json).unwrap();
        let session = &event.data.object;
        assert!(session.payment_intent.is_none());
        assert!(session.customer_details.is_none());
        assert_eq!(session.parsed_payment_status(), PaymentStatus::Unpaid);
    }

    #[test]
    fn test_unknown_payment_status_maps_to_unpaid() {
        let session = CheckoutSession {
            id: "cs_x".to_owned(),
            payment_intent: None,
            payment_status: "something_new".to_owned(),
            amount_total: None,
            currency: None,
            customer_details: None,
            metadata: HashMap::new(),
        };
        assert_eq!(session.parsed_payment_status(), PaymentStatus::Unpaid);
    }
}
