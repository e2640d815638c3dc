//! Database operations for the FTP credential pool.
//!
//! The pool is a finite set of pre-provisioned username/password pairs.
//! Claiming is the one multi-writer hot spot in the purchase flow: two
//! activations may race for the last free account, so the claim is a single
//! conditional update over a `FOR UPDATE SKIP LOCKED` subselect. Exactly one
//! writer wins the row; the loser sees an empty result, never a double
//! assignment.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use bear_beat_core::{FtpAccountId, FtpCredentials, PurchaseId};

use super::RepositoryError;
use crate::models::FtpPoolAccount;

/// Pool occupancy counters for the admin status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct PoolCounts {
    /// Total provisioned accounts.
    pub total: i64,
    /// Accounts still available for assignment.
    pub available: i64,
    /// Accounts claimed by purchases.
    pub in_use: i64,
}

#[derive(sqlx::FromRow)]
struct ClaimedRow {
    username: String,
    password: String,
}

/// Row shape for full pool account queries.
#[derive(sqlx::FromRow)]
struct AccountRow {
    id: i32,
    username: String,
    password: String,
    in_use: bool,
    purchase_id: Option<i32>,
    assigned_at: Option<DateTime<Utc>>,
}

impl AccountRow {
    fn into_account(self) -> FtpPoolAccount {
        FtpPoolAccount {
            id: FtpAccountId::new(self.id),
            username: self.username,
            password: self.password,
            in_use: self.in_use,
            purchase_id: self.purchase_id.map(PurchaseId::new),
            assigned_at: self.assigned_at,
        }
    }
}

/// Claim one free pool account for a purchase.
///
/// Returns `Ok(None)` when the pool is exhausted; exhaustion is an expected
/// outcome, not an error. The subselect takes the lowest-id free row, skipping
/// rows locked by concurrent claimants.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn claim(
    pool: &PgPool,
    purchase_id: PurchaseId,
) -> Result<Option<FtpCredentials>, RepositoryError> {
    let row: Option<ClaimedRow> = sqlx::query_as(
        "UPDATE ftp_pool_accounts
         SET in_use = TRUE, purchase_id = $1, assigned_at = NOW()
         WHERE id = (
             SELECT id FROM ftp_pool_accounts
             WHERE in_use = FALSE
             ORDER BY id
             FOR UPDATE SKIP LOCKED
             LIMIT 1
         )
         RETURNING username, password",
    )
    .bind(purchase_id.as_i32())
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| FtpCredentials::new(r.username, r.password)))
}

/// Get the pool account assigned to a purchase, if any.
///
/// The pool row is the authoritative record of an assignment; a purchase may
/// momentarily lack its credential columns when the attach update failed
/// after a successful claim.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_by_purchase(
    pool: &PgPool,
    purchase_id: PurchaseId,
) -> Result<Option<FtpPoolAccount>, RepositoryError> {
    let row: Option<AccountRow> = sqlx::query_as(
        "SELECT id, username, password, in_use, purchase_id, assigned_at
         FROM ftp_pool_accounts
         WHERE purchase_id = $1",
    )
    .bind(purchase_id.as_i32())
    .fetch_optional(pool)
    .await?;

    Ok(row.map(AccountRow::into_account))
}

/// Add new credential pairs to the pool.
///
/// Existing usernames are skipped so a restock file can be re-applied safely.
/// Returns the number of accounts actually added.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if an insert fails.
pub async fn restock(
    pool: &PgPool,
    accounts: &[FtpCredentials],
) -> Result<u64, RepositoryError> {
    let mut added = 0;

    for account in accounts {
        let result = sqlx::query(
            "INSERT INTO ftp_pool_accounts (username, password, in_use)
             VALUES ($1, $2, FALSE)
             ON CONFLICT (username) DO NOTHING",
        )
        .bind(&account.username)
        .bind(&account.password)
        .execute(pool)
        .await?;

        added += result.rows_affected();
    }

    Ok(added)
}

/// Count pool occupancy.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn counts(pool: &PgPool) -> Result<PoolCounts, RepositoryError> {
    let (total, in_use): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COUNT(*) FILTER (WHERE in_use) FROM ftp_pool_accounts",
    )
    .fetch_one(pool)
    .await?;

    Ok(PoolCounts {
        total,
        available: total - in_use,
        in_use,
    })
}
