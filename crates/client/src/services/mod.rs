//! Services built on the gateway and session store.
//!
//! # Services
//!
//! - `auth` - Sign in, sign up and sign out
//! - `orders` - Order listing, creation, deletion and dashboard totals
//! - `booking` - Turning a discovered event into an order

pub mod auth;
pub mod booking;
pub mod orders;

pub use auth::{AuthFlowError, AuthService};
pub use booking::{BookingService, order_for_event};
pub use orders::OrderService;
