//! Data models for the storefront categories service.
//!
//! Field names serialize in camelCase to match what the storefront frontend expects.

mod category;
mod locale;

pub use category::*;
pub use locale::*;
