//! Status enums for the purchase flow.

use serde::{Deserialize, Serialize};

/// Payment status reported by the provider for a checkout session.
///
/// Only `Paid` sessions may be activated. `Unpaid` covers deferred payment
/// methods (OXXO vouchers, SPEI transfers) where the checkout completes
/// before the money arrives; the provider sends a follow-up event once paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Paid,
    NoPaymentRequired,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unpaid => write!(f, "unpaid"),
            Self::Paid => write!(f, "paid"),
            Self::NoPaymentRequired => write!(f, "no_payment_required"),
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unpaid" => Ok(Self::Unpaid),
            "paid" => Ok(Self::Paid),
            "no_payment_required" => Ok(Self::NoPaymentRequired),
            _ => Err(format!("invalid payment status: {s}")),
        }
    }
}

/// Completion status of a pending purchase.
///
/// `AwaitingCompletion` rows are created by payment capture and promoted to
/// the terminal `Completed` exactly once by activation. There is no path
/// back; pending rows are never deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    #[default]
    AwaitingCompletion,
    Completed,
}

impl std::fmt::Display for CompletionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AwaitingCompletion => write!(f, "awaiting_completion"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

impl std::str::FromStr for CompletionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "awaiting_completion" => Ok(Self::AwaitingCompletion),
            "completed" => Ok(Self::Completed),
            _ => Err(format!("invalid completion status: {s}")),
        }
    }
}

/// Payment provider that confirmed a purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentProvider {
    Stripe,
    Paypal,
}

impl std::fmt::Display for PaymentProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stripe => write!(f, "stripe"),
            Self::Paypal => write!(f, "paypal"),
        }
    }
}

impl std::str::FromStr for PaymentProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stripe" => Ok(Self::Stripe),
            "paypal" => Ok(Self::Paypal),
            _ => Err(format!("invalid payment provider: {s}")),
        }
    }
}

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// A paying customer with download access.
    #[default]
    Customer,
    /// Staff access to retry/restock operations.
    Admin,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Customer => write!(f, "customer"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid user role: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_status_roundtrip() {
        for status in [
            PaymentStatus::Unpaid,
            PaymentStatus::Paid,
            PaymentStatus::NoPaymentRequired,
        ] {
            let s = status.to_string();
            assert_eq!(s.parse::<PaymentStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_completion_status_roundtrip() {
        for status in [CompletionStatus::AwaitingCompletion, CompletionStatus::Completed] {
            let s = status.to_string();
            assert_eq!(s.parse::<CompletionStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_provider_roundtrip() {
        assert_eq!("stripe".parse::<PaymentProvider>().unwrap(), PaymentProvider::Stripe);
        assert_eq!("paypal".parse::<PaymentProvider>().unwrap(), PaymentProvider::Paypal);
        assert!("oxxo".parse::<PaymentProvider>().is_err());
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&CompletionStatus::AwaitingCompletion).unwrap();
        assert_eq!(json, "\"awaiting_completion\"");
        let json = serde_json::to_string(&PaymentStatus::NoPaymentRequired).unwrap();
        assert_eq!(json, "\"no_payment_required\"");
    }

    #[test]
    fn test_default_statuses() {
        // New pending purchases start unpaid and awaiting completion
        assert_eq!(PaymentStatus::default(), PaymentStatus::Unpaid);
        assert_eq!(CompletionStatus::default(), CompletionStatus::AwaitingCompletion);
    }
}
