//! Bear Beat Core - Shared types library.
//!
//! This crate provides common types used across all Bear Beat components:
//! - `storefront` - Purchase backend (payment webhooks, activation, downloads)
//! - `cli` - Command-line tools for migrations and FTP pool management
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, money, emails, phone
//!   numbers, statuses, and FTP credentials

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
