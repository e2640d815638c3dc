//! Payment webhook handlers.
//!
//! The Stripe handler is the entry point of the purchase flow: a signed
//! `checkout.session.completed` (or `async_payment_succeeded`, for OXXO and
//! SPEI) event becomes a pending purchase row. The handler's status codes
//! steer Stripe's redelivery:
//!
//! - 400/401 for signature problems: no state change, no retry useful
//! - 200 once the event is recorded (or recognized as a redelivery)
//! - 500 on database failure, so Stripe redelivers; the unique session id
//!   constraint makes redelivery safe

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};

use bear_beat_core::{PaymentProvider, PaymentStatus};

use crate::db::pending_purchases::{self, RecordPendingPurchase};
use crate::error::AppError;
use crate::payments::stripe::{CheckoutSession, StripeEvent};
use crate::services::PurchaseEvent;
use crate::state::AppState;

/// Stripe webhook endpoint.
///
/// Verifies the `Stripe-Signature` header against the raw body before any
/// parsing, then dispatches on the event type.
#[instrument(skip_all)]
pub async fn stripe(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("missing stripe-signature header".to_owned()))?;

    let valid = state
        .stripe()
        .verify_webhook_signature(&body, signature)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    if !valid {
        return Err(AppError::Unauthorized("invalid webhook signature".to_owned()));
    }

    let event: StripeEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("malformed event payload: {e}")))?;

    match event.event_type.as_str() {
        "checkout.session.completed" | "checkout.session.async_payment_succeeded" => {
            record_checkout(&state, &event.data.object).await
        }
        other => {
            debug!(event_type = %other, "Ignoring unhandled Stripe event");
            Ok(StatusCode::OK)
        }
    }
}

/// Record a checkout session as a pending purchase.
async fn record_checkout(
    state: &AppState,
    session: &CheckoutSession,
) -> Result<StatusCode, AppError> {
    let payment_status = session.parsed_payment_status();
    let currency = session
        .currency
        .as_deref()
        .unwrap_or("mxn")
        .to_ascii_uppercase();
    let amount = Decimal::new(session.amount_total.unwrap_or(0), 2);
    let pack_slug = session
        .metadata
        .get("pack_slug")
        .cloned()
        .unwrap_or_else(|| state.config().default_pack.clone());

    let details = session.customer_details.clone().unwrap_or_default();

    let created = pending_purchases::record(
        state.pool(),
        RecordPendingPurchase {
            session_id: session.id.clone(),
            payment_intent_id: session.payment_intent.clone(),
            pack_slug: pack_slug.clone(),
            amount,
            currency: currency.clone(),
            provider: PaymentProvider::Stripe,
            customer_email: details.email.clone(),
            customer_name: details.name,
            customer_phone: details.phone,
            payment_status,
        },
    )
    .await?;

    if created {
        info!(
            session_id = %session.id,
            payment_status = %payment_status,
            "Recorded pending purchase"
        );
        state.events().publish(PurchaseEvent::CheckoutRecorded {
            session_id: session.id.clone(),
            provider: PaymentProvider::Stripe,
            email: details.email,
            pack_slug,
            amount,
            currency,
        });
    } else {
        // Redelivery, or the paid follow-up for a deferred payment method
        debug!(session_id = %session.id, "Session already recorded");
        if payment_status == PaymentStatus::Paid
            && let Err(e) =
                pending_purchases::set_payment_status(state.pool(), &session.id, payment_status)
                    .await
        {
            warn!(session_id = %session.id, error = %e, "Failed to update payment status");
        }
    }

    Ok(StatusCode::OK)
}
