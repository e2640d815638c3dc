//! Purchase completion route handlers.
//!
//! After the provider confirms payment, the browser lands on the completion
//! page with the session id. These handlers drive the rest of the flow:
//! PayPal orders are captured server-side, the completion form activates the
//! pending purchase, and the status endpoint lets the page poll deferred
//! payments (OXXO, SPEI) until they settle.

use axum::{
    Json,
    extract::{Query, State},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use bear_beat_core::{FtpCredentials, PaymentProvider, PaymentStatus};

use crate::db::{pending_purchases, purchases};
use crate::db::pending_purchases::RecordPendingPurchase;
use crate::error::AppError;
use crate::models::Purchase;
use crate::services::PurchaseEvent;
use crate::services::activation::{ActivationError, CustomerProfile};
use crate::state::AppState;

/// Request body for the completion endpoint.
#[derive(Debug, Deserialize)]
pub struct CompleteRequest {
    /// Provider session id (Stripe `cs_...` or a PayPal order id).
    pub session_id: String,
    /// Payer email, when the provider did not report one.
    #[serde(default)]
    pub email: Option<String>,
    /// Payer name.
    #[serde(default)]
    pub name: Option<String>,
    /// Payer phone.
    #[serde(default)]
    pub phone: Option<String>,
}

/// Response for a completed (or previously completed) purchase.
#[derive(Debug, Serialize)]
pub struct PurchaseResponse {
    /// `activated` on first completion, `already_completed` afterwards.
    pub status: &'static str,
    /// Purchase id.
    pub purchase_id: i32,
    /// Pack purchased.
    pub pack_slug: String,
    /// Assigned FTP credentials, absent while the pool is exhausted.
    pub ftp: Option<FtpCredentials>,
    /// Signed download link for the pack archive.
    pub download_url: String,
    /// Support guidance when access is still pending.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl PurchaseResponse {
    fn from_purchase(state: &AppState, purchase: &Purchase, status: &'static str) -> Self {
        let message = if purchase.ftp_credentials.is_none() {
            Some(
                "Your payment is confirmed. FTP access is being prepared; \
                 contact support if it does not arrive shortly."
                    .to_owned(),
            )
        } else {
            None
        };

        Self {
            status,
            purchase_id: purchase.id.as_i32(),
            pack_slug: purchase.pack_slug.clone(),
            ftp: purchase.ftp_credentials.clone(),
            download_url: state.signer().pack_url(&purchase.pack_slug),
            message,
        }
    }
}

/// Complete a purchase: activate the pending purchase for a session.
///
/// Idempotent from the caller's view: refreshing the completion page finds
/// the already-activated purchase and returns it instead of erroring.
#[instrument(skip(state, request), fields(session_id = %request.session_id))]
pub async fn complete(
    State(state): State<AppState>,
    Json(request): Json<CompleteRequest>,
) -> Result<Json<PurchaseResponse>, AppError> {
    let profile = CustomerProfile {
        email: request.email,
        name: request.name,
        phone: request.phone,
    };

    match state.activation().activate(&request.session_id, &profile).await {
        Ok(outcome) => {
            let mut response =
                PurchaseResponse::from_purchase(&state, &outcome.purchase, "activated");
            // attach_ftp_credentials is async to the purchase row; trust the outcome
            response.ftp = outcome.ftp_credentials.clone();
            if response.ftp.is_some() {
                response.message = None;
            }
            Ok(Json(response))
        }
        Err(ActivationError::AlreadyCompleted(_)) => {
            let purchase = purchases::get_by_payment_id(state.pool(), &request.session_id)
                .await?
                .ok_or_else(|| {
                    // Claimed but no purchase row should be impossible; the
                    // claim and the insert commit together
                    AppError::Internal("completed session has no purchase".to_owned())
                })?;
            Ok(Json(PurchaseResponse::from_purchase(
                &state,
                &purchase,
                "already_completed",
            )))
        }
        Err(e) => Err(e.into()),
    }
}

/// Query parameters for the status endpoint.
#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    /// Provider session id.
    pub session_id: String,
}

/// Response for the status endpoint.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Provider-reported payment status.
    pub payment_status: PaymentStatus,
    /// Whether the purchase has been activated.
    pub completed: bool,
}

/// Report the payment/completion state of a session.
///
/// For Stripe sessions still marked unpaid, the provider's session-retrieval
/// API is consulted so OXXO/SPEI payers see their transfer settle without
/// waiting for the webhook.
#[instrument(skip(state))]
pub async fn status(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<StatusResponse>, AppError> {
    let pending = pending_purchases::get_by_session(state.pool(), &query.session_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("session {}", query.session_id)))?;

    let mut payment_status = pending.payment_status;

    if payment_status != PaymentStatus::Paid && pending.provider == PaymentProvider::Stripe {
        match state.stripe().retrieve_checkout_session(&query.session_id).await {
            Ok(session) => {
                let fresh = session.parsed_payment_status();
                if fresh == PaymentStatus::Paid {
                    pending_purchases::set_payment_status(
                        state.pool(),
                        &query.session_id,
                        fresh,
                    )
                    .await?;
                    payment_status = fresh;
                }
            }
            Err(e) => {
                // Stay on the stored status; the webhook will catch up
                warn!(session_id = %query.session_id, error = %e, "Session re-check failed");
            }
        }
    }

    Ok(Json(StatusResponse {
        payment_status,
        completed: pending.completion_status == bear_beat_core::CompletionStatus::Completed,
    }))
}

/// Request body for PayPal order capture.
#[derive(Debug, Deserialize)]
pub struct PayPalCaptureRequest {
    /// PayPal order id approved in the browser.
    pub order_id: String,
}

/// Response for PayPal order capture.
#[derive(Debug, Serialize)]
pub struct PayPalCaptureResponse {
    /// The order id, used as the session id for completion.
    pub session_id: String,
    /// Whether the capture completed.
    pub captured: bool,
}

/// Capture an approved PayPal order and record it as a pending purchase.
///
/// The browser's PayPal SDK approves the order; capture must happen
/// server-side. A completed capture lands in `pending_purchases` exactly like
/// a Stripe webhook, keyed by the order id.
#[instrument(skip(state, request), fields(order_id = %request.order_id))]
pub async fn capture_paypal(
    State(state): State<AppState>,
    Json(request): Json<PayPalCaptureRequest>,
) -> Result<Json<PayPalCaptureResponse>, AppError> {
    let order = state.paypal().capture_order(&request.order_id).await?;

    if !order.is_completed() {
        warn!(order_id = %order.id, status = %order.status, "PayPal capture not completed");
        return Ok(Json(PayPalCaptureResponse {
            session_id: order.id,
            captured: false,
        }));
    }

    let (amount, currency) = order.captured_amount().map_or_else(
        || (Decimal::ZERO, "USD".to_owned()),
        |a| {
            (
                a.value.parse::<Decimal>().unwrap_or(Decimal::ZERO),
                a.currency_code.clone(),
            )
        },
    );

    let email = order.payer_email().map(str::to_owned);
    let name = order.payer_name();
    let pack_slug = state.config().default_pack.clone();

    let created = pending_purchases::record(
        state.pool(),
        RecordPendingPurchase {
            session_id: order.id.clone(),
            payment_intent_id: order.capture_id().map(str::to_owned),
            pack_slug: pack_slug.clone(),
            amount,
            currency: currency.clone(),
            provider: PaymentProvider::Paypal,
            customer_email: email.clone(),
            customer_name: name,
            customer_phone: None,
            payment_status: PaymentStatus::Paid,
        },
    )
    .await?;

    if created {
        info!(order_id = %order.id, "Recorded PayPal pending purchase");
        state.events().publish(PurchaseEvent::CheckoutRecorded {
            session_id: order.id.clone(),
            provider: PaymentProvider::Paypal,
            email,
            pack_slug,
            amount,
            currency,
        });
    }

    Ok(Json(PayPalCaptureResponse {
        session_id: order.id,
        captured: true,
    }))
}
