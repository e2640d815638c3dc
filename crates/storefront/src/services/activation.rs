//! Purchase activation.
//!
//! Activation promotes a paid pending purchase into a permanent purchase:
//!
//! 1. look up the pending purchase by provider session id
//! 2. refuse anything not positively paid
//! 3. resolve or create the user by the payer's email
//! 4. in one transaction: claim the pending row (conditional update with an
//!    affected-row check) and insert the purchase
//! 5. after commit: claim an FTP pool account (non-critical) and publish the
//!    purchase event for marketing sync
//!
//! Step 4's claim is what makes activation idempotent: a second activation of
//! the same session observes zero affected rows and gets `AlreadyCompleted`
//! instead of a duplicate purchase. Steps 5 onward can fail without
//! rolling back the sale; the purchase stays recorded with `ftp: None` and
//! the customer sees "paid, access pending".

use sqlx::PgPool;
use tracing::{error, info, instrument, warn};

use bear_beat_core::{Email, EmailError, FtpCredentials, PaymentStatus, Phone};

use crate::db::{self, RepositoryError, UserRepository};
use crate::models::{PendingPurchase, Purchase, User};

use super::events::{EventBus, PurchaseEvent};

/// Errors from purchase activation.
#[derive(Debug, thiserror::Error)]
pub enum ActivationError {
    /// No pending purchase exists for the session id.
    #[error("no pending purchase for session {0}")]
    UnknownSession(String),

    /// The provider has not confirmed payment yet.
    #[error("payment not completed for session {0}")]
    NotPaid(String),

    /// The session was already activated.
    #[error("session {0} already activated")]
    AlreadyCompleted(String),

    /// No payer email is available from the provider or the caller.
    #[error("no payer email available for session {0}")]
    MissingEmail(String),

    /// The payer email could not be parsed.
    #[error("invalid payer email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Database operation failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Profile fields supplied by the caller (completion form or logged-in user).
///
/// Caller-supplied fields take precedence over what the payment provider
/// reported; the provider's data fills the gaps.
#[derive(Debug, Clone, Default)]
pub struct CustomerProfile {
    pub email: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
}

/// The result of a successful activation.
#[derive(Debug)]
pub struct ActivationOutcome {
    /// The new purchase.
    pub purchase: Purchase,
    /// The owning user (created if the payer had no account).
    pub user: User,
    /// Assigned credentials, or `None` when the pool was exhausted.
    pub ftp_credentials: Option<FtpCredentials>,
}

/// Summary of an admin retry run.
#[derive(Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct RetrySummary {
    /// Sessions activated in this run.
    pub activated: u32,
    /// Sessions that failed to activate.
    pub failed: u32,
    /// Up to [`Self::MAX_SAMPLE_ERRORS`] sample error messages for display.
    pub errors: Vec<String>,
}

impl RetrySummary {
    /// Sample error cap; a long backlog of failures should not bloat the
    /// admin response.
    pub const MAX_SAMPLE_ERRORS: usize = 10;

    /// Record one failure, keeping at most the first
    /// [`Self::MAX_SAMPLE_ERRORS`] messages.
    pub fn record_failure(&mut self, message: String) {
        self.failed += 1;
        if self.errors.len() < Self::MAX_SAMPLE_ERRORS {
            self.errors.push(message);
        }
    }
}

/// Summary of an admin credential-assignment run.
#[derive(Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct AssignmentSummary {
    /// Purchases that received credentials in this run.
    pub assigned: u32,
    /// Purchases still waiting (pool exhausted again, or attach failed).
    pub remaining: u32,
}

/// Orchestrates purchase activation and the admin recovery operations.
#[derive(Clone)]
pub struct ActivationService {
    pool: PgPool,
    events: EventBus,
}

impl ActivationService {
    /// Create a new activation service.
    #[must_use]
    pub const fn new(pool: PgPool, events: EventBus) -> Self {
        Self { pool, events }
    }

    /// Activate the pending purchase for a provider session.
    ///
    /// # Errors
    ///
    /// - `UnknownSession` if no pending purchase matches
    /// - `NotPaid` if the provider has not confirmed payment
    /// - `AlreadyCompleted` if a previous activation claimed the session
    /// - `MissingEmail`/`InvalidEmail` if no usable payer email exists
    /// - `Repository` for database failures
    #[instrument(skip(self, profile))]
    pub async fn activate(
        &self,
        session_id: &str,
        profile: &CustomerProfile,
    ) -> Result<ActivationOutcome, ActivationError> {
        let pending = db::pending_purchases::get_by_session(&self.pool, session_id)
            .await?
            .ok_or_else(|| ActivationError::UnknownSession(session_id.to_owned()))?;

        if pending.payment_status != PaymentStatus::Paid {
            return Err(ActivationError::NotPaid(session_id.to_owned()));
        }

        let user = self.resolve_user(&pending, profile).await?;
        let purchase = self.promote(&pending, &user).await?;

        // Pool assignment is non-critical: the sale is already recorded
        let ftp_credentials = self.assign_credentials(&purchase).await;

        info!(
            purchase_id = %purchase.id,
            user_id = %user.id,
            ftp_assigned = ftp_credentials.is_some(),
            "Purchase activated"
        );

        self.events.publish(PurchaseEvent::PurchaseCompleted {
            purchase_id: purchase.id.as_i32(),
            email: user.email.as_str().to_owned(),
            name: user.name.clone(),
            phone: user.phone.clone(),
            pack_slug: purchase.pack_slug.clone(),
            amount: purchase.amount,
            currency: purchase.currency.clone(),
            provider: purchase.provider,
            ftp_assigned: ftp_credentials.is_some(),
        });

        Ok(ActivationOutcome {
            purchase,
            user,
            ftp_credentials,
        })
    }

    /// Re-attempt activation for every paid pending purchase still awaiting
    /// completion.
    ///
    /// Runs sequentially and tolerates partial failure: each session is
    /// attempted once, failures are counted, and up to ten sample error
    /// messages are kept for display. A session activated concurrently while
    /// this loop runs counts as a failure (`AlreadyCompleted`).
    ///
    /// # Errors
    ///
    /// Returns `Repository` only if the initial backlog listing fails.
    #[instrument(skip(self))]
    pub async fn retry_pending(&self) -> Result<RetrySummary, ActivationError> {
        let backlog = db::pending_purchases::list_awaiting_paid(&self.pool).await?;
        info!(count = backlog.len(), "Retrying pending purchases");

        let mut summary = RetrySummary::default();

        for pending in backlog {
            match self.activate(&pending.session_id, &CustomerProfile::default()).await {
                Ok(_) => summary.activated += 1,
                Err(e) => {
                    warn!(session_id = %pending.session_id, error = %e, "Retry activation failed");
                    summary.record_failure(format!("{}: {e}", pending.session_id));
                }
            }
        }

        info!(
            activated = summary.activated,
            failed = summary.failed,
            "Retry run finished"
        );

        Ok(summary)
    }

    /// Assign pool credentials to purchases recorded while the pool was
    /// exhausted.
    ///
    /// Walks purchases without credentials oldest-first and stops early once
    /// the pool runs dry again.
    ///
    /// # Errors
    ///
    /// Returns `Repository` only if the backlog listing fails.
    #[instrument(skip(self))]
    pub async fn assign_missing_credentials(&self) -> Result<AssignmentSummary, ActivationError> {
        let backlog = db::purchases::list_missing_credentials(&self.pool).await?;
        let mut summary = AssignmentSummary::default();

        let mut backlog = backlog.into_iter();
        for purchase in backlog.by_ref() {
            match self.assign_credentials(&purchase).await {
                Some(_) => summary.assigned += 1,
                None => {
                    // Pool is dry again; everything left stays unassigned
                    summary.remaining += 1;
                    break;
                }
            }
        }
        summary.remaining += u32::try_from(backlog.count()).unwrap_or(u32::MAX);

        Ok(summary)
    }

    /// Resolve the owning user, creating an account when the payer has none.
    async fn resolve_user(
        &self,
        pending: &PendingPurchase,
        profile: &CustomerProfile,
    ) -> Result<User, ActivationError> {
        let raw_email = profile
            .email
            .as_deref()
            .or(pending.customer_email.as_deref())
            .ok_or_else(|| ActivationError::MissingEmail(pending.session_id.clone()))?;
        let email = Email::parse(raw_email)?;

        let name = profile
            .name
            .as_deref()
            .or(pending.customer_name.as_deref());
        // Keep only phones Twilio can dial
        let phone = profile
            .phone
            .as_deref()
            .or(pending.customer_phone.as_deref())
            .and_then(|raw| Phone::parse(raw).ok())
            .map(Phone::into_inner);

        let users = UserRepository::new(&self.pool);
        let user = users.get_or_create(&email, name, phone.as_deref()).await?;

        // Backfill blank profile fields for pre-existing accounts
        if name.is_some() || phone.is_some() {
            users.fill_profile(user.id, name, phone.as_deref()).await?;
        }

        users
            .get_by_id(user.id)
            .await?
            .ok_or(ActivationError::Repository(RepositoryError::NotFound))
    }

    /// Claim the pending row and insert the purchase in one transaction.
    async fn promote(
        &self,
        pending: &PendingPurchase,
        user: &User,
    ) -> Result<Purchase, ActivationError> {
        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        let claimed =
            db::pending_purchases::claim_for_completion(&mut *tx, &pending.session_id).await?;
        if !claimed {
            tx.rollback().await.map_err(RepositoryError::from)?;
            return Err(ActivationError::AlreadyCompleted(pending.session_id.clone()));
        }

        let purchase = db::purchases::create(
            &mut *tx,
            db::purchases::CreatePurchase {
                user_id: user.id,
                pack_slug: pending.pack_slug.clone(),
                amount: pending.amount,
                currency: pending.currency.clone(),
                provider: pending.provider,
                payment_id: pending.session_id.clone(),
            },
        )
        .await?;

        tx.commit().await.map_err(RepositoryError::from)?;

        Ok(purchase)
    }

    /// Claim a pool account for a purchase and attach it.
    ///
    /// Failures are logged, never propagated; a missing credential is
    /// recoverable by restocking and re-running assignment. An assignment
    /// already recorded on the pool side is reused rather than claiming a
    /// second account for the same purchase.
    async fn assign_credentials(&self, purchase: &Purchase) -> Option<FtpCredentials> {
        match db::ftp_pool::get_by_purchase(&self.pool, purchase.id).await {
            Ok(Some(account)) => {
                let credentials = FtpCredentials::new(account.username, account.password);
                if let Err(e) =
                    db::purchases::attach_ftp_credentials(&self.pool, purchase.id, &credentials)
                        .await
                {
                    error!(purchase_id = %purchase.id, error = %e, "Failed to re-attach FTP credentials");
                }
                return Some(credentials);
            }
            Ok(None) => {}
            Err(e) => {
                error!(purchase_id = %purchase.id, error = %e, "FTP assignment lookup failed");
                return None;
            }
        }

        let claimed = match db::ftp_pool::claim(&self.pool, purchase.id).await {
            Ok(Some(credentials)) => credentials,
            Ok(None) => {
                warn!(
                    purchase_id = %purchase.id,
                    "FTP pool exhausted; purchase recorded without credentials"
                );
                return None;
            }
            Err(e) => {
                error!(purchase_id = %purchase.id, error = %e, "FTP pool claim failed");
                return None;
            }
        };

        if let Err(e) =
            db::purchases::attach_ftp_credentials(&self.pool, purchase.id, &claimed).await
        {
            // The pool row already records the purchase id, so the pairing
            // is recoverable from the pool side
            error!(purchase_id = %purchase.id, error = %e, "Failed to attach FTP credentials");
        }

        Some(claimed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_summary_caps_sample_errors() {
        let mut summary = RetrySummary::default();
        for i in 0..25 {
            summary.record_failure(format!("cs_{i}: boom"));
        }

        assert_eq!(summary.failed, 25);
        assert_eq!(summary.errors.len(), RetrySummary::MAX_SAMPLE_ERRORS);
        assert_eq!(summary.errors.first().map(String::as_str), Some("cs_0: boom"));
    }

    #[test]
    fn test_retry_summary_counts_mixed_outcomes() {
        let mut summary = RetrySummary::default();
        summary.activated += 1;
        summary.record_failure("cs_1: session cs_1 already activated".to_owned());

        assert_eq!(summary.activated, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.errors.len(), 1);
    }

    #[test]
    fn test_profile_email_precedence_over_provider() {
        // resolve_user prefers caller-supplied email over the provider's;
        // the precedence lives in plain Option::or, assert it here
        let profile_email = Some("form@example.com");
        let provider_email = Some("stripe@example.com");
        assert_eq!(profile_email.or(provider_email), Some("form@example.com"));
        assert_eq!(None.or(provider_email), Some("stripe@example.com"));
    }
}
