//! Brew & Bites Core - domain library for the café storefront.
//!
//! This crate holds everything about the café that does not depend on HTTP:
//! the fixed menu, the session cart, and the checkout state machine.
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no timers,
//! no HTTP. The storefront crate owns sessions, rendering and the payment
//! task, and drives the types defined here.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices and categories
//! - [`catalog`] - The immutable product catalog and category filtering
//! - [`cart`] - The cart store and its actions
//! - [`checkout`] - Checkout snapshot, totals and the checkout flow

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod types;

pub use cart::{Cart, CartAction, CartEvent, CartLineItem};
pub use catalog::{Catalog, CatalogError, Product};
pub use checkout::{
    CheckoutError, CheckoutFlow, CheckoutSnapshot, OrderConfirmation, PaymentDetails,
    PaymentOutcome, TAX_RATE_PERCENT, tax_rate,
};
pub use types::*;
