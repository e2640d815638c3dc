//! Database operations for finalized purchases.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use bear_beat_core::{FtpCredentials, PaymentProvider, PurchaseId, UserId};

use super::RepositoryError;
use crate::models::Purchase;

/// Row shape shared by all purchase queries.
#[derive(sqlx::FromRow)]
struct PurchaseRow {
    id: i32,
    user_id: i32,
    pack_slug: String,
    amount: Decimal,
    currency: String,
    provider: String,
    payment_id: String,
    ftp_username: Option<String>,
    ftp_password: Option<String>,
    purchased_at: DateTime<Utc>,
}

impl PurchaseRow {
    fn into_purchase(self) -> Result<Purchase, RepositoryError> {
        let provider = self.provider.parse::<PaymentProvider>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid provider in database: {e}"))
        })?;

        let ftp_credentials = match (self.ftp_username, self.ftp_password) {
            (Some(username), Some(password)) => Some(FtpCredentials::new(username, password)),
            (None, None) => None,
            _ => {
                return Err(RepositoryError::DataCorruption(
                    "half-assigned ftp credentials".to_owned(),
                ));
            }
        };

        Ok(Purchase {
            id: PurchaseId::new(self.id),
            user_id: UserId::new(self.user_id),
            pack_slug: self.pack_slug,
            amount: self.amount,
            currency: self.currency,
            provider,
            payment_id: self.payment_id,
            ftp_credentials,
            purchased_at: self.purchased_at,
        })
    }
}

const PURCHASE_COLUMNS: &str = "id, user_id, pack_slug, amount, currency, provider, payment_id, \
     ftp_username, ftp_password, purchased_at";

/// Parameters for creating a purchase during activation.
pub struct CreatePurchase {
    /// Owning user.
    pub user_id: UserId,
    /// Pack purchased.
    pub pack_slug: String,
    /// Amount paid.
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Provider that confirmed the payment.
    pub provider: PaymentProvider,
    /// Provider payment id (session or capture id).
    pub payment_id: String,
}

/// Create a purchase row.
///
/// Runs on a transaction connection so the insert commits together with the
/// pending purchase claim.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the payment id is already recorded.
/// Returns `RepositoryError::Database` for other database errors.
pub async fn create(
    conn: &mut PgConnection,
    params: CreatePurchase,
) -> Result<Purchase, RepositoryError> {
    let row: PurchaseRow = sqlx::query_as(&format!(
        "INSERT INTO purchases (user_id, pack_slug, amount, currency, provider, payment_id)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING {PURCHASE_COLUMNS}"
    ))
    .bind(params.user_id.as_i32())
    .bind(&params.pack_slug)
    .bind(params.amount)
    .bind(&params.currency)
    .bind(params.provider.to_string())
    .bind(&params.payment_id)
    .fetch_one(conn)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return RepositoryError::Conflict("payment already recorded".to_owned());
        }
        RepositoryError::Database(e)
    })?;

    row.into_purchase()
}

/// Get a purchase by its ID.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
/// Returns `RepositoryError::DataCorruption` if the stored row is invalid.
pub async fn get_by_id(
    pool: &PgPool,
    id: PurchaseId,
) -> Result<Option<Purchase>, RepositoryError> {
    let row: Option<PurchaseRow> = sqlx::query_as(&format!(
        "SELECT {PURCHASE_COLUMNS} FROM purchases WHERE id = $1"
    ))
    .bind(id.as_i32())
    .fetch_optional(pool)
    .await?;

    row.map(PurchaseRow::into_purchase).transpose()
}

/// Get a purchase by its provider payment id.
///
/// The completion page polls by session id, which activation records as the
/// purchase's payment id.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
/// Returns `RepositoryError::DataCorruption` if the stored row is invalid.
pub async fn get_by_payment_id(
    pool: &PgPool,
    payment_id: &str,
) -> Result<Option<Purchase>, RepositoryError> {
    let row: Option<PurchaseRow> = sqlx::query_as(&format!(
        "SELECT {PURCHASE_COLUMNS} FROM purchases WHERE payment_id = $1"
    ))
    .bind(payment_id)
    .fetch_optional(pool)
    .await?;

    row.map(PurchaseRow::into_purchase).transpose()
}

/// List all purchases owned by a user, newest first.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
/// Returns `RepositoryError::DataCorruption` if a stored row is invalid.
pub async fn list_for_user(
    pool: &PgPool,
    user_id: UserId,
) -> Result<Vec<Purchase>, RepositoryError> {
    let rows: Vec<PurchaseRow> = sqlx::query_as(&format!(
        "SELECT {PURCHASE_COLUMNS} FROM purchases WHERE user_id = $1 ORDER BY purchased_at DESC"
    ))
    .bind(user_id.as_i32())
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(PurchaseRow::into_purchase).collect()
}

/// List purchases that have no FTP credentials assigned yet, oldest first.
///
/// These are sales recorded while the pool was exhausted; the admin retry
/// endpoint works through them after a restock.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
/// Returns `RepositoryError::DataCorruption` if a stored row is invalid.
pub async fn list_missing_credentials(pool: &PgPool) -> Result<Vec<Purchase>, RepositoryError> {
    let rows: Vec<PurchaseRow> = sqlx::query_as(&format!(
        "SELECT {PURCHASE_COLUMNS} FROM purchases
         WHERE ftp_username IS NULL
         ORDER BY purchased_at ASC"
    ))
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(PurchaseRow::into_purchase).collect()
}

/// Attach claimed FTP credentials to a purchase.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the purchase doesn't exist.
/// Returns `RepositoryError::Database` for other database errors.
pub async fn attach_ftp_credentials(
    pool: &PgPool,
    purchase_id: PurchaseId,
    credentials: &FtpCredentials,
) -> Result<(), RepositoryError> {
    let result = sqlx::query(
        "UPDATE purchases SET ftp_username = $2, ftp_password = $3 WHERE id = $1",
    )
    .bind(purchase_id.as_i32())
    .bind(&credentials.username)
    .bind(&credentials.password)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }

    Ok(())
}
