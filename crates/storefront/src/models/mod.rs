//! Domain models for storefront.

pub mod account;

pub use account::{Account, ProfileView};
