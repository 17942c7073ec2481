//! # courier-common
//!
//! Shared configuration, error handling, and interaction models used across all Courier crates.
//! This is the foundation layer: no request handling, just primitives and contracts.

pub mod config;
pub mod error;
pub mod models;
