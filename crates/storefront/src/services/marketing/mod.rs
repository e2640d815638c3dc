//! Marketing platform sync.
//!
//! Completed purchases are mirrored into the marketing stack: the buyer is
//! upserted as a Brevo contact, their ManyChat subscriber gets the
//! post-purchase flow, and a delivery notice goes out over Twilio SMS or
//! WhatsApp. Every platform is optional and every failure is logged and
//! swallowed; nothing here can fail a purchase.

pub mod brevo;
pub mod manychat;
pub mod twilio;

pub use brevo::BrevoClient;
pub use manychat::ManyChatClient;
pub use twilio::TwilioClient;

use thiserror::Error;
use tracing::{error, info};

use crate::config::MarketingConfig;

use super::events::PurchaseEvent;

/// Errors from marketing platform APIs.
#[derive(Debug, Error)]
pub enum MarketingError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse a platform response.
    #[error("parse error: {0}")]
    Parse(String),
}

/// Fans one purchase event out to every configured platform.
#[derive(Clone)]
pub struct MarketingHub {
    brevo: Option<BrevoClient>,
    manychat: Option<ManyChatClient>,
    twilio: Option<TwilioClient>,
}

impl MarketingHub {
    /// Build the hub from configuration.
    ///
    /// Platforms with incomplete configuration are skipped with a log line;
    /// a client construction failure disables that platform only.
    #[must_use]
    pub fn from_config(config: &MarketingConfig) -> Self {
        let brevo = match BrevoClient::from_config(config) {
            Ok(client) => client,
            Err(e) => {
                error!(error = %e, "Failed to build Brevo client; email sync disabled");
                None
            }
        };
        let manychat = match ManyChatClient::from_config(config) {
            Ok(client) => client,
            Err(e) => {
                error!(error = %e, "Failed to build ManyChat client; chatbot sync disabled");
                None
            }
        };
        let twilio = match TwilioClient::from_config(config) {
            Ok(client) => client,
            Err(e) => {
                error!(error = %e, "Failed to build Twilio client; SMS sync disabled");
                None
            }
        };

        if brevo.is_none() && manychat.is_none() && twilio.is_none() {
            info!("No marketing platforms configured");
        }

        Self {
            brevo,
            manychat,
            twilio,
        }
    }

    /// An empty hub with no platforms, for tests.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            brevo: None,
            manychat: None,
            twilio: None,
        }
    }

    /// Process one purchase event.
    ///
    /// Each platform sync runs independently; a failure on one platform is
    /// logged and does not stop the others. The returned error is the last
    /// failure, reported to the caller for logging only.
    ///
    /// # Errors
    ///
    /// Returns the last platform error, if any platform failed.
    pub async fn handle(&self, event: &PurchaseEvent) -> Result<(), MarketingError> {
        match event {
            PurchaseEvent::CheckoutRecorded { email, .. } => {
                // Capture-time sync only lands the contact; the heavier
                // messaging waits for activation.
                let mut last_error = None;

                if let (Some(brevo), Some(email)) = (&self.brevo, email.as_deref()) {
                    if let Err(e) = brevo.upsert_contact(email, None, None).await {
                        error!(error = %e, "Brevo contact sync failed at capture");
                        last_error = Some(e);
                    }
                }

                last_error.map_or(Ok(()), Err)
            }
            PurchaseEvent::PurchaseCompleted {
                email,
                name,
                phone,
                pack_slug,
                ..
            } => {
                let mut last_error = None;

                if let Some(brevo) = &self.brevo {
                    if let Err(e) = brevo
                        .upsert_contact(email, name.as_deref(), phone.as_deref())
                        .await
                    {
                        error!(error = %e, "Brevo contact sync failed");
                        last_error = Some(e);
                    }
                }

                if let Some(manychat) = &self.manychat {
                    if let Err(e) = manychat.trigger_purchase_flow(email).await {
                        error!(error = %e, "ManyChat flow trigger failed");
                        last_error = Some(e);
                    }
                }

                if let (Some(twilio), Some(phone)) = (&self.twilio, phone.as_deref()) {
                    let body = format!(
                        "Tu compra de {pack_slug} está lista. Revisa tu correo para los accesos de descarga."
                    );
                    if let Err(e) = twilio.send_purchase_notice(phone, &body).await {
                        error!(error = %e, "Twilio purchase notice failed");
                        last_error = Some(e);
                    }
                }

                last_error.map_or(Ok(()), Err)
            }
        }
    }
}
