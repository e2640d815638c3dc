//! Admin route handlers.
//!
//! All handlers here sit behind the admin bearer-token middleware. They are
//! the recovery levers for the purchase flow: re-running activation over the
//! backlog, inspecting the FTP pool, restocking it, and assigning
//! credentials to purchases that missed out while the pool was dry.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use bear_beat_core::FtpCredentials;

use crate::db::ftp_pool::{self, PoolCounts};
use crate::error::AppError;
use crate::services::activation::{AssignmentSummary, RetrySummary};
use crate::state::AppState;

/// Re-run activation for every paid pending purchase still awaiting
/// completion.
///
/// Returns activated/failed counts and up to ten sample error messages.
#[instrument(skip(state))]
pub async fn retry_pending(
    State(state): State<AppState>,
) -> Result<Json<RetrySummary>, AppError> {
    let summary = state.activation().retry_pending().await?;
    Ok(Json(summary))
}

/// FTP pool occupancy.
#[instrument(skip(state))]
pub async fn pool_status(State(state): State<AppState>) -> Result<Json<PoolCounts>, AppError> {
    let counts = ftp_pool::counts(state.pool()).await?;
    Ok(Json(counts))
}

/// Request body for pool restocking.
#[derive(Debug, Deserialize)]
pub struct RestockRequest {
    /// Credential pairs to add to the pool.
    pub accounts: Vec<FtpCredentials>,
}

/// Response for pool restocking.
#[derive(Debug, Serialize)]
pub struct RestockResponse {
    /// Accounts actually added (existing usernames are skipped).
    pub added: u64,
    /// Pool occupancy after the restock.
    pub pool: PoolCounts,
}

/// Add credential pairs to the FTP pool.
#[instrument(skip(state, request), fields(count = request.accounts.len()))]
pub async fn restock_pool(
    State(state): State<AppState>,
    Json(request): Json<RestockRequest>,
) -> Result<Json<RestockResponse>, AppError> {
    if request.accounts.is_empty() {
        return Err(AppError::BadRequest("no accounts supplied".to_owned()));
    }

    let added = ftp_pool::restock(state.pool(), &request.accounts).await?;
    let pool = ftp_pool::counts(state.pool()).await?;

    info!(added, available = pool.available, "FTP pool restocked");

    Ok(Json(RestockResponse { added, pool }))
}

/// Assign pool credentials to purchases recorded while the pool was
/// exhausted.
#[instrument(skip(state))]
pub async fn assign_credentials(
    State(state): State<AppState>,
) -> Result<Json<AssignmentSummary>, AppError> {
    let summary = state.activation().assign_missing_credentials().await?;
    Ok(Json(summary))
}
