//! Core types for Stagedoor.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod order;
pub mod price;
pub mod role;

pub use email::{Email, EmailError};
pub use id::*;
pub use order::{NewOrder, Order, OrderList, OrderSummary, ValidationError};
pub use price::Price;
pub use role::Role;
