//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Menu page (?category=all|coffee|pastries|sandwiches|tea)
//!
//! # Cart (HTMX fragments)
//! GET  /cart                   - Cart drawer fragment
//! GET  /cart/count             - Cart count badge (fragment)
//! POST /cart/add               - Add to cart (returns count badge, triggers cart-updated)
//! POST /cart/update            - Change quantity (returns cart drawer fragment)
//!
//! # Checkout
//! POST /checkout/start         - Snapshot the cart, redirect to /checkout
//! GET  /checkout               - Checkout page (empty | form | processing | confirmation)
//! POST /checkout               - Submit payment details
//! ```

pub mod cart;
pub mod checkout;
pub mod menu;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/count", get(cart::count))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show).post(checkout::submit))
        .route("/start", post(checkout::start))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Menu page
        .route("/", get(menu::index))
        // Cart routes
        .nest("/cart", cart_routes())
        // Checkout routes
        .nest("/checkout", checkout_routes())
}
