//! Twilio API client for SMS and WhatsApp notices.
//!
//! One message per completed purchase, preferring WhatsApp when a WhatsApp
//! sender is configured (Mexican buyers overwhelmingly use it).

use secrecy::ExposeSecret;

use crate::config::MarketingConfig;

use super::MarketingError;

/// Twilio API base URL.
const BASE_URL: &str = "https://api.twilio.com/2010-04-01";

/// Twilio API client.
#[derive(Clone)]
pub struct TwilioClient {
    client: reqwest::Client,
    account_sid: String,
    auth_token: String,
    from_sms: Option<String>,
    from_whatsapp: Option<String>,
}

impl TwilioClient {
    /// Build a client if account credentials are configured.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn from_config(config: &MarketingConfig) -> Result<Option<Self>, MarketingError> {
        let (Some(account_sid), Some(auth_token)) =
            (&config.twilio_account_sid, &config.twilio_auth_token)
        else {
            return Ok(None);
        };

        let client = reqwest::Client::builder().build()?;

        Ok(Some(Self {
            client,
            account_sid: account_sid.clone(),
            auth_token: auth_token.expose_secret().to_owned(),
            from_sms: config.twilio_from_sms.clone(),
            from_whatsapp: config.twilio_from_whatsapp.clone(),
        }))
    }

    /// Send a purchase notice, preferring WhatsApp over SMS.
    ///
    /// # Errors
    ///
    /// Returns error if no sender is configured or the API request fails.
    pub async fn send_purchase_notice(&self, to: &str, body: &str) -> Result<(), MarketingError> {
        if let Some(from) = &self.from_whatsapp {
            let to = format!("whatsapp:{to}");
            return self.send_message(from, &to, body).await;
        }
        if let Some(from) = &self.from_sms {
            return self.send_message(from, to, body).await;
        }

        Err(MarketingError::Parse(
            "no Twilio sender configured".to_owned(),
        ))
    }

    /// Send a message through the Messages endpoint.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    pub async fn send_message(
        &self,
        from: &str,
        to: &str,
        body: &str,
    ) -> Result<(), MarketingError> {
        let url = format!("{BASE_URL}/Accounts/{}/Messages.json", self.account_sid);

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("From", from), ("To", to), ("Body", body)])
            .send()
            .await?;
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
