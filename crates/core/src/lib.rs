//! SelempangKu Core - Shared domain types.
//!
//! This crate provides the types used across all SelempangKu components:
//! - `api` - REST API for customers and the admin back office
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains only types and pure rules - no I/O, no database
//! access, no HTTP. The order/payment lifecycle lives here so every caller
//! applies the same transition table.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, emails, money and statuses
//! - [`lifecycle`] - Order and payment state machines

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod lifecycle;
pub mod types;

pub use lifecycle::{LifecycleError, OrderEvent, PaymentDecision};
pub use types::*;
