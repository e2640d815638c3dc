//! Post-commit purchase event queue.
//!
//! Activation and payment capture must never fail because a marketing
//! platform is down, so they do not call marketing APIs directly. Instead
//! they publish a [`PurchaseEvent`] after their database work commits; a
//! separate consumer task performs the marketing sync and swallows its own
//! failures. The isolation holds by construction: nothing on the critical
//! path awaits a marketing call.

use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use bear_beat_core::PaymentProvider;

use super::marketing::MarketingHub;

/// An event published by the purchase flow.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PurchaseEvent {
    /// A provider-confirmed payment was recorded as a pending purchase.
    CheckoutRecorded {
        /// Provider session id.
        session_id: String,
        /// Provider that confirmed the payment.
        provider: PaymentProvider,
        /// Payer email, if the provider reported one.
        email: Option<String>,
        /// Pack sold.
        pack_slug: String,
        /// Amount in the currency's standard unit.
        amount: Decimal,
        /// ISO 4217 currency code.
        currency: String,
    },
    /// A pending purchase was activated into a full purchase.
    PurchaseCompleted {
        /// Purchase id.
        purchase_id: i32,
        /// Buyer email.
        email: String,
        /// Buyer name, if known.
        name: Option<String>,
        /// Buyer phone, if known.
        phone: Option<String>,
        /// Pack purchased.
        pack_slug: String,
        /// Amount paid.
        amount: Decimal,
        /// ISO 4217 currency code.
        currency: String,
        /// Provider that confirmed the payment.
        provider: PaymentProvider,
        /// Whether FTP credentials were assigned (pool not exhausted).
        ftp_assigned: bool,
    },
}

/// Handle for publishing purchase events.
///
/// Cloneable; lives in the application state. Publishing never blocks and
/// never fails the caller: a closed channel (consumer task gone) is logged
/// and dropped.
#[derive(Clone)]
pub struct EventBus {
    sender: mpsc::UnboundedSender<PurchaseEvent>,
}

impl EventBus {
    /// Publish an event to the consumer task.
    pub fn publish(&self, event: PurchaseEvent) {
        if self.sender.send(event).is_err() {
            warn!("Event consumer is gone; dropping purchase event");
        }
    }
}

/// Spawn the event consumer task and return the publishing handle.
///
/// The consumer owns the marketing hub and processes events sequentially.
/// Marketing failures are logged inside the hub and never propagate.
#[must_use]
pub fn spawn_event_worker(hub: MarketingHub) -> EventBus {
    let (sender, mut receiver) = mpsc::unbounded_channel::<PurchaseEvent>();

    tokio::spawn(async move {
        info!("Purchase event consumer started");
        while let Some(event) = receiver.recv().await {
            if let Err(e) = hub.handle(&event).await {
                // Marketing sync is best-effort; the purchase is already safe
                error!(error = %e, "Marketing sync failed for purchase event");
            }
        }
        info!("Purchase event consumer stopped");
    });

    EventBus { sender }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_event_serialization_tags() {
        let event = PurchaseEvent::PurchaseCompleted {
            purchase_id: 7,
            email: "dj@example.com".to_owned(),
            name: None,
            phone: None,
            pack_slug: "bear-beat-pack".to_owned(),
            amount: Decimal::new(49_900, 2),
            currency: "MXN".to_owned(),
            provider: PaymentProvider::Stripe,
            ftp_assigned: true,
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "purchase_completed");
        assert_eq!(json["purchase_id"], 7);
        assert_eq!(json["provider"], "stripe");
        assert_eq!(json["amount"], "499.00");
    }

    #[tokio::test]
    async fn test_publish_after_consumer_gone_does_not_panic() {
        let (sender, receiver) = mpsc::unbounded_channel::<PurchaseEvent>();
        drop(receiver);
        let bus = EventBus { sender };

        // Must be a silent no-op, not a panic or error
        bus.publish(PurchaseEvent::CheckoutRecorded {
            session_id: "cs_1".to_owned(),
            provider: PaymentProvider::Stripe,
            email: None,
            pack_slug: "bear-beat-pack".to_owned(),
            amount: Decimal::ZERO,
            currency: "MXN".to_owned(),
        });
    }
}
