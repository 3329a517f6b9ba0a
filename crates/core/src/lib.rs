//! Giftsouq Core - Shared types library.
//!
//! This crate provides common types used across all Giftsouq components:
//! - `client` - Session and cart state engine over the backend REST API
//! - `integration-tests` - Scenario tests for the client engine
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no
//! storage access. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, identities, and product kinds

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
