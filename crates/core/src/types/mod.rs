//! Core types for Bear Beat.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod credential;
pub mod email;
pub mod id;
pub mod money;
pub mod phone;
pub mod status;

pub use credential::FtpCredentials;
pub use email::{Email, EmailError};
pub use id::*;
pub use money::{CurrencyCode, Money};
pub use phone::{Phone, PhoneError};
pub use status::*;
