//! Payment provider clients.
//!
//! Both providers are driven over their REST APIs with `reqwest`:
//!
//! - [`stripe`] - webhook signature verification and checkout session
//!   retrieval (cards, OXXO, SPEI).
//! - [`paypal`] - OAuth client-credentials token handling and order
//!   capture/lookup.

pub mod paypal;
pub mod stripe;

pub use paypal::PayPalClient;
pub use stripe::StripeClient;

use thiserror::Error;

/// Errors that can occur when talking to a payment provider.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Webhook signature header is missing required parts.
    #[error("invalid signature header: {0}")]
    InvalidSignatureHeader(String),

    /// Failed to parse a provider response.
    #[error("parse error: {0}")]
    Parse(String),
}
