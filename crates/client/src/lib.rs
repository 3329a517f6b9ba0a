//! Giftsouq client core.
//!
//! State orchestration over the Giftsouq backend REST API. All business
//! logic of consequence (pricing, inventory, fulfillment, payments)
//! lives in the backend; this crate owns the two client-side state
//! machines that sit in front of it:
//!
//! 1. **Session bootstrap** ([`session`]) - at startup, resolves the
//!    single active identity (admin or customer) from two disjoint
//!    credential scopes, self-healing any inconsistent state.
//! 2. **Cart reconciliation engine** ([`cart`]) - maintains a guest
//!    cart in local persistence and, on authentication, merges it line
//!    by line into the server-backed cart, tolerating partial failure.
//!
//! Storage ([`storage`]) and the remote cart contract ([`api`]) are
//! explicit seams: both are traits, so every state machine here can be
//! driven by test doubles.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod config;
pub mod session;
pub mod storage;
