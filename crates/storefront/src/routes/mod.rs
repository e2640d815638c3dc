//! HTTP route handlers for the purchase backend.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                     - Liveness check
//! GET  /health/ready               - Readiness check (database)
//!
//! # Payment capture
//! POST /webhooks/stripe            - Stripe webhook (signed events)
//! POST /api/paypal/capture         - Capture an approved PayPal order
//!
//! # Purchase completion
//! POST /purchase/complete          - Activate a paid session
//! GET  /purchase/status            - Poll payment/completion state
//!
//! # Admin (bearer token)
//! POST /admin/purchases/retry      - Re-run activation over the backlog
//! GET  /admin/ftp-pool             - Pool occupancy
//! POST /admin/ftp-pool/restock     - Add credential pairs
//! POST /admin/ftp-pool/assign      - Assign credentials to waiting purchases
//! ```

pub mod admin;
pub mod purchase;
pub mod webhooks;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};

use crate::middleware::require_admin_token;
use crate::state::AppState;

/// Create the webhook routes router.
pub fn webhook_routes() -> Router<AppState> {
    Router::new().route("/stripe", post(webhooks::stripe))
}

/// Create the purchase routes router.
pub fn purchase_routes() -> Router<AppState> {
    Router::new()
        .route("/complete", post(purchase::complete))
        .route("/status", get(purchase::status))
}

/// Create the admin routes router, wrapped in bearer-token auth.
pub fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/purchases/retry", post(admin::retry_pending))
        .route("/ftp-pool", get(admin::pool_status))
        .route("/ftp-pool/restock", post(admin::restock_pool))
        .route("/ftp-pool/assign", post(admin::assign_credentials))
        .layer(from_fn_with_state(state, require_admin_token))
}

/// Create all routes for the purchase backend.
pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/webhooks", webhook_routes())
        .route("/api/paypal/capture", post(purchase::capture_paypal))
        .nest("/purchase", purchase_routes())
        .nest("/admin", admin_routes(state))
}
