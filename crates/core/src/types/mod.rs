//! Core types for the café storefront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod category;
pub mod id;
pub mod price;

pub use category::{Category, CategoryFilter, CategoryParseError};
pub use id::{CheckoutId, ProductId};
pub use price::{CurrencyCode, CurrencyCodeError, Price};
