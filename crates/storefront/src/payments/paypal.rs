//! PayPal REST API client.
//!
//! PayPal purchases go through the JS SDK in the browser; the backend's job
//! is to capture the approved order server-side and read back the payer and
//! amount. Every call fetches a fresh client-credentials token; Bear Beat's
//! order volume does not justify token caching.

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;

use super::PaymentError;
use crate::config::PayPalConfig;

/// PayPal REST API client.
#[derive(Clone)]
pub struct PayPalClient {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    api_base: String,
}

impl PayPalClient {
    /// Create a new PayPal API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &PayPalConfig) -> Result<Self, PaymentError> {
        let mut headers = HeaderMap::new();
        headers.insert("Accept", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.expose_secret().to_owned(),
            api_base: config.api_base.clone(),
        })
    }

    /// Fetch an OAuth access token via the client-credentials grant.
    async fn access_token(&self) -> Result<String, PaymentError> {
        let url = format!("{}/v1/oauth2/token", self.api_base);

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| PaymentError::Parse(e.to_string()))?;

        Ok(token.access_token)
    }

    /// Capture an approved order.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails or the order cannot be parsed.
    pub async fn capture_order(&self, order_id: &str) -> Result<PayPalOrder, PaymentError> {
        let token = self.access_token().await?;
        let url = format!(
            "{}/v2/checkout/orders/{}/capture",
            self.api_base,
            urlencoding::encode(order_id)
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&token)
            .header("Content-Type", "application/json")
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<PayPalOrder>()
            .await
            .map_err(|e| PaymentError::Parse(e.to_string()))
    }

    /// Retrieve an order without capturing it.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails or the order cannot be parsed.
    pub async fn get_order(&self, order_id: &str) -> Result<PayPalOrder, PaymentError> {
        let token = self.access_token().await?;
        let url = format!(
            "{}/v2/checkout/orders/{}",
            self.api_base,
            urlencoding::encode(order_id)
        );

        let response = self.client.get(&url).bearer_auth(&token).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<PayPalOrder>()
            .await
            .map_err(|e| PaymentError::Parse(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// A PayPal order, as returned by capture and retrieval.
#[derive(Debug, Clone, Deserialize)]
pub struct PayPalOrder {
    /// Order id.
    pub id: String,
    /// Order status: `COMPLETED` once captured.
    pub status: String,
    /// Payer details.
    #[serde(default)]
    pub payer: Option<Payer>,
    /// Purchase units (Bear Beat checkouts always have exactly one).
    #[serde(default)]
    pub purchase_units: Vec<PurchaseUnit>,
}

impl PayPalOrder {
    /// Whether the order has been captured successfully.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == "COMPLETED"
    }

    /// The capture id of the first purchase unit, if present.
    #[must_use]
    pub fn capture_id(&self) -> Option<&str> {
        self.purchase_units
            .first()?
            .payments
            .as_ref()?
            .captures
            .first()
            .map(|c| c.id.as_str())
    }

    /// The captured amount of the first purchase unit, if present.
    #[must_use]
    pub fn captured_amount(&self) -> Option<&Amount> {
        self.purchase_units
            .first()?
            .payments
            .as_ref()?
            .captures
            .first()
            .map(|c| &c.amount)
    }

    /// Payer email, if reported.
    #[must_use]
    pub fn payer_email(&self) -> Option<&str> {
        self.payer.as_ref()?.email_address.as_deref()
    }

    /// Payer full name, if reported.
    #[must_use]
    pub fn payer_name(&self) -> Option<String> {
        let name = self.payer.as_ref()?.name.as_ref()?;
        match (&name.given_name, &name.surname) {
            (Some(given), Some(surname)) => Some(format!("{given} {surname}")),
            (Some(given), None) => Some(given.clone()),
            (None, Some(surname)) => Some(surname.clone()),
            (None, None) => None,
        }
    }
}

/// Payer details.
#[derive(Debug, Clone, Deserialize)]
pub struct Payer {
    #[serde(default)]
    pub email_address: Option<String>,
    #[serde(default)]
    pub name: Option<PayerName>,
}

/// Payer name parts.
#[derive(Debug, Clone, Deserialize)]
pub struct PayerName {
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub surname: Option<String>,
}

/// One purchase unit of an order.
#[derive(Debug, Clone, Deserialize)]
pub struct PurchaseUnit {
    #[serde(default)]
    pub payments: Option<Payments>,
}

/// Payments recorded against a purchase unit.
#[derive(Debug, Clone, Deserialize)]
pub struct Payments {
    #[serde(default)]
    pub captures: Vec<Capture>,
}

/// One capture.
#[derive(Debug, Clone, Deserialize)]
pub struct Capture {
    /// Capture id.
    pub id: String,
    /// Captured amount.
    pub amount: Amount,
}

/// A money amount as PayPal reports it.
#[derive(Debug, Clone, Deserialize)]
pub struct Amount {
    /// Uppercase ISO 4217 currency code.
    pub currency_code: String,
    /// Decimal string, e.g. "499.00".
    pub value: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn captured_order_json() -> serde_json::Value {
        serde_json::json!({
            "id": "5O190127TN364715T",
            "status": "COMPLETED",
            "payer": {
                "email_address": "dj@example.com",
                "name": { "given_name": "Ana", "surname": "Torres" }
            },
            "purchase_units": [{
                "payments": {
                    "captures": [{
                        "id": "3C679366HH908993F",
                        "amount": { "currency_code": "USD", "value": "29.00" }
                    }]
                }
            }]
        })
    }

    #[test]
    fn test_order_deserialization() {
        let order: PayPalOrder = serde_json::from_value(captured_order_json()).unwrap();

        assert!(order.is_completed());
        assert_eq!(order.capture_id(), Some("3C679366HH908993F"));
        assert_eq!(order.payer_email(), Some("dj@example.com"));
        assert_eq!(order.payer_name(), Some("Ana Torres".to_owned()));

        let amount = order.captured_amount().unwrap();
        assert_eq!(amount.currency_code, "USD");
        assert_eq!(amount.value, "29.00");
    }

    #[test]
    fn test_uncaptured_order() {
        let order: PayPalOrder = serde_json::from_value(serde_json::json!({
            "id": "5O190127TN364715T",
            "status": "APPROVED"
        }))
        .unwrap();

        assert!(!order.is_completed());
        assert!(order.capture_id().is_none());
        assert!(order.captured_amount().is_none());
        assert!(order.payer_email().is_none());
        assert!(order.payer_name().is_none());
    }

    #[test]
    fn test_payer_name_partial() {
        let order: PayPalOrder = serde_json::from_value(serde_json::json!({
            "id": "X",
            "status": "COMPLETED",
            "payer": { "name": { "given_name": "Ana" } }
        }))
        .unwrap();

        assert_eq!(order.payer_name(), Some("Ana".to_owned()));
    }
}
