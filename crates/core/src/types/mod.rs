//! Core types for Tidewater.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod email;
pub mod id;

pub use address::{
    AddressError, AddressInput, AddressKey, AddressKeyError, BillingAddress, NewAddress,
};
pub use email::{Email, EmailError};
pub use id::*;
