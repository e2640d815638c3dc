//! Database operations for pending purchases (payment capture queue).
//!
//! A pending purchase is written once by the payment webhook and promoted
//! exactly once by activation. The two guards that make the flow safe live
//! here:
//!
//! - [`record`] absorbs webhook redelivery with `ON CONFLICT DO NOTHING`
//!   on the unique session id.
//! - [`claim_for_completion`] promotes a row with a conditional update and
//!   an affected-row check, so a second activation of the same session is
//!   a no-op instead of a duplicate purchase.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use bear_beat_core::{CompletionStatus, PaymentProvider, PaymentStatus, PendingPurchaseId};

use super::RepositoryError;
use crate::models::PendingPurchase;

/// Row shape shared by all pending purchase queries.
#[derive(sqlx::FromRow)]
struct PendingPurchaseRow {
    id: i32,
    session_id: String,
    payment_intent_id: Option<String>,
    pack_slug: String,
    amount: Decimal,
    currency: String,
    provider: String,
    customer_email: Option<String>,
    customer_name: Option<String>,
    customer_phone: Option<String>,
    payment_status: String,
    completion_status: String,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl PendingPurchaseRow {
    fn into_pending(self) -> Result<PendingPurchase, RepositoryError> {
        let provider = self.provider.parse::<PaymentProvider>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid provider in database: {e}"))
        })?;
        let payment_status = self.payment_status.parse::<PaymentStatus>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid payment status in database: {e}"))
        })?;
        let completion_status =
            self.completion_status
                .parse::<CompletionStatus>()
                .map_err(|e| {
                    RepositoryError::DataCorruption(format!(
                        "invalid completion status in database: {e}"
                    ))
                })?;

        Ok(PendingPurchase {
            id: PendingPurchaseId::new(self.id),
            session_id: self.session_id,
            payment_intent_id: self.payment_intent_id,
            pack_slug: self.pack_slug,
            amount: self.amount,
            currency: self.currency,
            provider,
            customer_email: self.customer_email,
            customer_name: self.customer_name,
            customer_phone: self.customer_phone,
            payment_status,
            completion_status,
            created_at: self.created_at,
            completed_at: self.completed_at,
        })
    }
}

const PENDING_COLUMNS: &str = "id, session_id, payment_intent_id, pack_slug, amount, currency, \
     provider, customer_email, customer_name, customer_phone, \
     payment_status, completion_status, created_at, completed_at";

/// Parameters for recording a captured payment.
pub struct RecordPendingPurchase {
    /// Provider checkout session id (unique key).
    pub session_id: String,
    /// Provider payment intent / capture id.
    pub payment_intent_id: Option<String>,
    /// Pack being sold.
    pub pack_slug: String,
    /// Amount in the currency's standard unit.
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Provider that confirmed the payment.
    pub provider: PaymentProvider,
    /// Payer email, if reported.
    pub customer_email: Option<String>,
    /// Payer name, if reported.
    pub customer_name: Option<String>,
    /// Payer phone, if reported.
    pub customer_phone: Option<String>,
    /// Provider-reported payment status.
    pub payment_status: PaymentStatus,
}

/// Record a captured payment as a pending purchase.
///
/// Returns `true` if a new row was created, `false` if the session id was
/// already recorded (webhook redelivery).
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails; the webhook
/// handler surfaces this as a 5xx so the provider redelivers.
pub async fn record(
    pool: &PgPool,
    params: RecordPendingPurchase,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query(
        "INSERT INTO pending_purchases (
            session_id, payment_intent_id, pack_slug, amount, currency,
            provider, customer_email, customer_name, customer_phone,
            payment_status, completion_status
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'awaiting_completion')
        ON CONFLICT (session_id) DO NOTHING",
    )
    .bind(&params.session_id)
    .bind(&params.payment_intent_id)
    .bind(&params.pack_slug)
    .bind(params.amount)
    .bind(&params.currency)
    .bind(params.provider.to_string())
    .bind(&params.customer_email)
    .bind(&params.customer_name)
    .bind(&params.customer_phone)
    .bind(params.payment_status.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Get a pending purchase by its provider session id.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
/// Returns `RepositoryError::DataCorruption` if the stored row is invalid.
pub async fn get_by_session(
    pool: &PgPool,
    session_id: &str,
) -> Result<Option<PendingPurchase>, RepositoryError> {
    let row: Option<PendingPurchaseRow> = sqlx::query_as(&format!(
        "SELECT {PENDING_COLUMNS} FROM pending_purchases WHERE session_id = $1"
    ))
    .bind(session_id)
    .fetch_optional(pool)
    .await?;

    row.map(PendingPurchaseRow::into_pending).transpose()
}

/// Update the payment status of a pending purchase.
///
/// Deferred payment methods (OXXO, SPEI) complete checkout unpaid; the
/// provider's follow-up event flips the status here.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the session is unknown.
/// Returns `RepositoryError::Database` for other database errors.
pub async fn set_payment_status(
    pool: &PgPool,
    session_id: &str,
    status: PaymentStatus,
) -> Result<(), RepositoryError> {
    let result = sqlx::query(
        "UPDATE pending_purchases SET payment_status = $2 WHERE session_id = $1",
    )
    .bind(session_id)
    .bind(status.to_string())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }

    Ok(())
}

/// Atomically claim a pending purchase for completion.
///
/// Flips `completion_status` from `awaiting_completion` to `completed` and
/// stamps `completed_at`. Returns `false` if the row was already completed
/// (or does not exist), which callers treat as "someone else got here first".
///
/// Runs on a transaction connection so the claim commits together with the
/// purchase insert.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn claim_for_completion(
    conn: &mut PgConnection,
    session_id: &str,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query(
        "UPDATE pending_purchases
         SET completion_status = 'completed', completed_at = NOW()
         WHERE session_id = $1 AND completion_status = 'awaiting_completion'",
    )
    .bind(session_id)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// List all pending purchases that are paid but not yet completed.
///
/// Ordered oldest-first so the admin retry loop works through the backlog
/// in arrival order.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
/// Returns `RepositoryError::DataCorruption` if a stored row is invalid.
pub async fn list_awaiting_paid(pool: &PgPool) -> Result<Vec<PendingPurchase>, RepositoryError> {
    let rows: Vec<PendingPurchaseRow> = sqlx::query_as(&format!(
        "SELECT {PENDING_COLUMNS} FROM pending_purchases
         WHERE completion_status = 'awaiting_completion' AND payment_status = 'paid'
         ORDER BY created_at ASC"
    ))
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(PendingPurchaseRow::into_pending)
        .collect()
}
