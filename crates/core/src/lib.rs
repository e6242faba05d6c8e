//! Stagedoor Core - Shared types library.
//!
//! This crate provides common types used across all Stagedoor components:
//! - `client` - Session store, backend gateway and event discovery
//! - `cli` - Command-line front end for the storefront
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no storage
//! access, no HTTP clients. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, emails, roles, prices and orders

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
