//! Core domain models shared across all Courier crates.
//!
//! These are the wire types: what the platform sends us and what we answer with.

pub mod interaction;

/// Re-export all model types for convenience.
pub use interaction::*;
