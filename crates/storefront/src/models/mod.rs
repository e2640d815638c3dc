//! Domain models for the purchase flow.

pub mod purchase;
pub mod user;

pub use purchase::{FtpPoolAccount, PendingPurchase, Purchase};
pub use user::User;
