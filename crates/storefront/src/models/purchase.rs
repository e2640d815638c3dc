//! Purchase domain types.
//!
//! A provider-confirmed payment first lands as a [`PendingPurchase`]; the
//! activation step promotes it into a permanent [`Purchase`] owned by a user
//! and assigns one [`FtpPoolAccount`] from the shared pool.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use bear_beat_core::{
    CompletionStatus, FtpAccountId, FtpCredentials, PaymentProvider, PaymentStatus,
    PendingPurchaseId, PurchaseId, UserId,
};

/// A provider-confirmed payment not yet linked to a user account.
///
/// One row per payment-provider session, keyed by the session id. Created by
/// payment capture, mutated only by activation, never deleted.
#[derive(Debug, Clone)]
pub struct PendingPurchase {
    /// Unique pending purchase ID.
    pub id: PendingPurchaseId,
    /// Provider checkout session id (unique).
    pub session_id: String,
    /// Provider payment intent / capture id, when reported.
    pub payment_intent_id: Option<String>,
    /// Pack being sold.
    pub pack_slug: String,
    /// Amount paid, in the currency's standard unit.
    pub amount: Decimal,
    /// ISO 4217 currency code as reported by the provider.
    pub currency: String,
    /// Which provider confirmed the payment.
    pub provider: PaymentProvider,
    /// Payer email, if the provider reported one.
    pub customer_email: Option<String>,
    /// Payer name, if the provider reported one.
    pub customer_name: Option<String>,
    /// Payer phone, if the provider reported one.
    pub customer_phone: Option<String>,
    /// Provider-reported payment status.
    pub payment_status: PaymentStatus,
    /// Whether this row has been promoted into a purchase.
    pub completion_status: CompletionStatus,
    /// When the webhook recorded the payment.
    pub created_at: DateTime<Utc>,
    /// When activation completed this row.
    pub completed_at: Option<DateTime<Utc>>,
}

/// A finalized sale.
///
/// Created exactly once during activation; immutable afterward except for
/// FTP credential assignment.
#[derive(Debug, Clone)]
pub struct Purchase {
    /// Unique purchase ID.
    pub id: PurchaseId,
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
    /// Assigned FTP credential pair, once the pool claim succeeds.
    pub ftp_credentials: Option<FtpCredentials>,
    /// When the purchase was activated.
    pub purchased_at: DateTime<Utc>,
}

/// One pre-provisioned credential pair from the shared FTP pool.
///
/// Seeded by an admin operation, claimed exactly once by a purchase, never
/// reclaimed.
#[derive(Debug, Clone)]
pub struct FtpPoolAccount {
    /// Unique pool account ID.
    pub id: FtpAccountId,
    /// FTP login name (unique).
    pub username: String,
    /// FTP password.
    pub password: String,
    /// Whether this account has been claimed.
    pub in_use: bool,
    /// Purchase that claimed this account, if any.
    pub purchase_id: Option<PurchaseId>,
    /// When the account was claimed.
    pub assigned_at: Option<DateTime<Utc>>,
}
