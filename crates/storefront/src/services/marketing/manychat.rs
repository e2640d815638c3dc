//! ManyChat API client for chatbot flows.
//!
//! Buyers who reached checkout through the Messenger/Instagram chatbot have
//! a ManyChat subscriber keyed by their email; activation triggers the
//! post-purchase flow on that subscriber.

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::json;

use crate::config::MarketingConfig;

use super::MarketingError;

/// ManyChat API base URL.
const BASE_URL: &str = "https://api.manychat.com";

/// ManyChat API client.
#[derive(Clone)]
pub struct ManyChatClient {
    client: reqwest::Client,
    purchase_flow: Option<String>,
}

impl ManyChatClient {
    /// Build a client if an API key is configured.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn from_config(config: &MarketingConfig) -> Result<Option<Self>, MarketingError> {
        let Some(api_key) = &config.manychat_api_key else {
            return Ok(None);
        };

        let mut headers = HeaderMap::new();
        let auth_value = format!("Bearer {}", api_key.expose_secret());
        headers.insert(
            "Authorization",
            HeaderValue::from_str(&auth_value)
                .map_err(|e| MarketingError::Parse(format!("Invalid API key format: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Some(Self {
            client,
            purchase_flow: config.manychat_purchase_flow.clone(),
        }))
    }

    /// Find a subscriber id by email.
    ///
    /// Returns `None` when no subscriber matches (the buyer never talked to
    /// the chatbot).
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    pub async fn find_subscriber_by_email(
        &self,
        email: &str,
    ) -> Result<Option<String>, MarketingError> {
        let url = format!(
            "{BASE_URL}/fb/subscriber/findBySystemField?email={}",
            urlencoding::encode(email)
        );

        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if status.as_u16() == 404 {
            return Ok(None);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MarketingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let found: FindSubscriberResponse = response
            .json()
            .await
            .map_err(|e| MarketingError::Parse(e.to_string()))?;

        Ok(found.data.map(|d| d.id))
    }

    /// Trigger the post-purchase flow for the buyer, if they are a subscriber.
    ///
    /// A buyer without a subscriber record is not an error; the chatbot only
    /// knows customers who interacted with it.
    ///
    /// # Errors
    ///
    /// Returns error if an API request fails.
    pub async fn trigger_purchase_flow(&self, email: &str) -> Result<(), MarketingError> {
        let Some(flow_ns) = &self.purchase_flow else {
            return Ok(());
        };

        let Some(subscriber_id) = self.find_subscriber_by_email(email).await? else {
            return Ok(());
        };

        self.send_flow(&subscriber_id, flow_ns).await
    }

    /// Send a flow to a subscriber.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    pub async fn send_flow(&self, subscriber_id: &str, flow_ns: &str) -> Result<(), MarketingError> {
        let url = format!("{BASE_URL}/fb/sending/sendFlow");

        let body = json!({
            "subscriber_id": subscriber_id,
            "flow_ns": flow_ns,
        });

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();

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

/// Response wrapper for subscriber lookup.
#[derive(Debug, Deserialize)]
struct FindSubscriberResponse {
    #[serde(default)]
    data: Option<SubscriberData>,
}

#[derive(Debug, Deserialize)]
struct SubscriberData {
    id: String,
}
