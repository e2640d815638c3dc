//! Brevo API client for contact management.
//!
//! Buyers are upserted into a Brevo contact list; Brevo automations take it
//! from there (welcome sequence, delivery email, win-back campaigns).

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde_json::json;

use crate::config::MarketingConfig;

use super::MarketingError;

/// Brevo API base URL.
const BASE_URL: &str = "https://api.brevo.com/v3";

/// Brevo API client.
#[derive(Clone)]
pub struct BrevoClient {
    client: reqwest::Client,
    list_id: Option<i64>,
}

impl BrevoClient {
    /// Build a client if an API key is configured.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn from_config(config: &MarketingConfig) -> Result<Option<Self>, MarketingError> {
        let Some(api_key) = &config.brevo_api_key else {
            return Ok(None);
        };

        let mut headers = HeaderMap::new();
        headers.insert(
            "api-key",
            HeaderValue::from_str(api_key.expose_secret())
                .map_err(|e| MarketingError::Parse(format!("Invalid API key format: {e}")))?,
        );
        headers.insert("Accept", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Some(Self {
            client,
            list_id: config.brevo_list_id,
        }))
    }

    /// Create or update a contact and add it to the buyers list.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    pub async fn upsert_contact(
        &self,
        email: &str,
        name: Option<&str>,
        phone: Option<&str>,
    ) -> Result<(), MarketingError> {
        let url = format!("{BASE_URL}/contacts");

        let mut attributes = serde_json::Map::new();
        if let Some(name) = name {
            attributes.insert("FIRSTNAME".to_owned(), json!(name));
        }
        if let Some(phone) = phone {
            attributes.insert("SMS".to_owned(), json!(phone));
        }

        let mut body = json!({
            "email": email,
            "attributes": attributes,
            "updateEnabled": true,
        });
        if let Some(list_id) = self.list_id {
            body["listIds"] = json!([list_id]);
        }

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();

        // 201 created, 204 updated
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MarketingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}
