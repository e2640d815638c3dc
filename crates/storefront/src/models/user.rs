//! User domain types.

use chrono::{DateTime, Utc};

use bear_beat_core::{Email, UserId, UserRole};

/// A Bear Beat user.
///
/// Created by normal registration or implicitly during purchase activation
/// when no account exists yet for the payer's email.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// User's email address (unique, lowercased).
    pub email: Email,
    /// Display name, if known.
    pub name: Option<String>,
    /// Phone number in E.164 form, if known.
    pub phone: Option<String>,
    /// Account role.
    pub role: UserRole,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}
