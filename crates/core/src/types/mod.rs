//! Core types for Giftsouq.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod identity;
pub mod product;

pub use email::{Email, EmailError};
pub use id::*;
pub use identity::{Identity, IdentityKind};
pub use product::ProductKind;
