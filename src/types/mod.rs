//! Shared types: the crate error and checked `Decimal` math helpers.

/// Checked mathematical helpers over `Decimal`.
pub mod decimal;

/// Error type and result alias.
pub mod error;
