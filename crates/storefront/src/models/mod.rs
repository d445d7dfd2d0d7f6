//! Domain models for storefront.

pub mod session;

pub use session::{CartStore, load_checkout, save_checkout};
