//! QuickImage Core - Shared types library.
//!
//! This crate provides the validated domain types used across the QuickImage
//! identity subsystem:
//! - `identity` - User accounts, verification codes, and the invitation ledger
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access, no
//! delivery clients. Every value that crosses a service boundary is parsed
//! into one of these types first, so the services never re-validate strings.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, phone numbers,
//!   invitation codes, and credit balances

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
