//! Purchase state machine and retry semantics tests.
//!
//! These verify the pending → completed lifecycle rules and the retry
//! summary behavior without requiring a live database.

use bear_beat_core::{CompletionStatus, PaymentProvider, PaymentStatus};
use bear_beat_storefront::services::activation::{ActivationError, RetrySummary};

// =============================================================================
// Status Tests
// =============================================================================

#[test]
fn test_payment_status_values() {
    // Only Paid may activate; everything else is refused
    let activatable = |status: PaymentStatus| status == PaymentStatus::Paid;

    assert!(activatable(PaymentStatus::Paid));
    assert!(!activatable(PaymentStatus::Unpaid));
    assert!(!activatable(PaymentStatus::NoPaymentRequired));
}

#[test]
fn test_completion_status_is_two_state() {
    // awaiting_completion -> completed is the only transition; completed is
    // terminal and the claim query's WHERE clause enforces it
    assert_ne!(
        CompletionStatus::AwaitingCompletion,
        CompletionStatus::Completed
    );
    assert_eq!(
        CompletionStatus::default(),
        CompletionStatus::AwaitingCompletion
    );
}

#[test]
fn test_status_wire_format_matches_database() {
    // The CHECK constraints in the migrations store these exact strings
    assert_eq!(PaymentStatus::Paid.to_string(), "paid");
    assert_eq!(PaymentStatus::Unpaid.to_string(), "unpaid");
    assert_eq!(
        PaymentStatus::NoPaymentRequired.to_string(),
        "no_payment_required"
    );
    assert_eq!(
        CompletionStatus::AwaitingCompletion.to_string(),
        "awaiting_completion"
    );
    assert_eq!(CompletionStatus::Completed.to_string(), "completed");
    assert_eq!(PaymentProvider::Stripe.to_string(), "stripe");
    assert_eq!(PaymentProvider::Paypal.to_string(), "paypal");
}

#[test]
fn test_status_roundtrips_from_database_strings() {
    assert_eq!(
        "paid".parse::<PaymentStatus>().expect("parse"),
        PaymentStatus::Paid
    );
    assert_eq!(
        "awaiting_completion"
            .parse::<CompletionStatus>()
            .expect("parse"),
        CompletionStatus::AwaitingCompletion
    );
    assert!("definitely_not_a_status".parse::<PaymentStatus>().is_err());
}

// =============================================================================
// Activation Error Tests
// =============================================================================

#[test]
fn test_activation_errors_name_the_session() {
    let err = ActivationError::UnknownSession("cs_123".to_owned());
    assert!(err.to_string().contains("cs_123"));

    let err = ActivationError::NotPaid("cs_456".to_owned());
    assert!(err.to_string().contains("cs_456"));

    let err = ActivationError::AlreadyCompleted("cs_789".to_owned());
    assert!(err.to_string().contains("cs_789"));
}

// =============================================================================
// Retry Summary Tests
// =============================================================================

#[test]
fn test_retry_summary_mixed_run() {
    // Two paid pending purchases, one activated concurrently by someone
    // else: the summary reports one success and one failure with one
    // captured message.
    let mut summary = RetrySummary::default();

    summary.activated += 1;
    summary.record_failure("cs_2: session cs_2 already activated".to_owned());

    assert_eq!(summary.activated, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.errors.len(), 1);
}

#[test]
fn test_retry_summary_truncates_error_samples_to_ten() {
    let mut summary = RetrySummary::default();
    for i in 0..50 {
        summary.record_failure(format!("cs_{i}: boom"));
    }

    assert_eq!(summary.failed, 50);
    assert_eq!(summary.errors.len(), 10);
    // The first ten failures are the ones kept
    assert_eq!(summary.errors[0], "cs_0: boom");
    assert_eq!(summary.errors[9], "cs_9: boom");
}

#[test]
fn test_retry_summary_serializes_for_admin_response() {
    let mut summary = RetrySummary::default();
    summary.activated = 3;
    summary.record_failure("cs_9: payment not completed for session cs_9".to_owned());

    let json = serde_json::to_value(&summary).expect("serialize");
    assert_eq!(json["activated"], 3);
    assert_eq!(json["failed"], 1);
    assert_eq!(json["errors"].as_array().expect("array").len(), 1);
}
