//! Business logic services for storefront.
//!
//! # Services
//!
//! - `payment` - Simulated payment processing with a re-entrancy guard

pub mod payment;

pub use payment::{PaymentError, PaymentService};
