//! Tidewater Core - Shared domain types.
//!
//! This crate provides the types used across Tidewater components:
//! - `storefront` - JSON API serving accounts, authentication and billing
//! - `cli` - Command-line tools for migrations and token management
//!
//! # Architecture
//!
//! The core crate contains only types and pure domain logic - no I/O, no
//! database access, no HTTP. The billing address ledger lives here so the
//! single-default invariant can be tested without a store behind it.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, emails and billing addresses
//! - [`ledger`] - The per-account billing address collection

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod ledger;
pub mod types;

pub use ledger::{BillingLedger, LedgerError};
pub use types::*;
