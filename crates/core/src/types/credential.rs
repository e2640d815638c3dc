//! FTP credential types.
//!
//! Every purchase is entitled to one credential pair from the shared FTP
//! pool. The pair is handed verbatim to the customer, but must never leak
//! into logs, so `Debug` redacts the password.

use serde::{Deserialize, Serialize};

/// A username/password pair from the FTP pool.
///
/// Implements `Debug` manually to redact the password field.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FtpCredentials {
    /// FTP login name (unique across the pool).
    pub username: String,
    /// FTP password, shown to the owning customer only.
    pub password: String,
}

impl FtpCredentials {
    /// Create a new credential pair.
    #[must_use]
    pub const fn new(username: String, password: String) -> Self {
        Self { username, password }
    }
}

impl std::fmt::Debug for FtpCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FtpCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_password() {
        let creds = FtpCredentials::new("bearbeat_041".to_owned(), "hunter2hunter2".to_owned());
        let debug_output = format!("{creds:?}");

        assert!(debug_output.contains("bearbeat_041"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("hunter2hunter2"));
    }

    #[test]
    fn test_serde_keeps_password() {
        // Serialization feeds the customer-facing response, so the password
        // must survive the round trip even though Debug hides it.
        let creds = FtpCredentials::new("u".to_owned(), "p".to_owned());
        let json = serde_json::to_string(&creds).unwrap();
        assert!(json.contains("\"password\":\"p\""));
        let back: FtpCredentials = serde_json::from_str(&json).unwrap();
        assert_eq!(back, creds);
    }
}
