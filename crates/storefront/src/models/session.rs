//! Session-stored state.
//!
//! The cart and the checkout flow live in the visitor's session. Handlers
//! load them at the start of a request and write them back before
//! responding, so each request is the single writer of its session's state.

use brew_and_bites_core::{Cart, CartAction, CartEvent, CheckoutFlow};
use tower_sessions::Session;

/// Session keys for storefront state.
pub mod keys {
    /// Key for the visitor's cart.
    pub const CART: &str = "cart";

    /// Key for the checkout flow, carried from the cart to the checkout page.
    pub const CHECKOUT: &str = "checkout";
}

/// A session's cart, loaded for the duration of one request.
///
/// Mutations go through [`CartStore::dispatch`] and are written back with
/// [`CartStore::commit`].
#[derive(Debug)]
pub struct CartStore {
    session: Session,
    cart: Cart,
}

impl CartStore {
    /// Load the cart from the session; a new session starts empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be read.
    pub async fn load(session: Session) -> Result<Self, tower_sessions::session::Error> {
        let cart = session.get::<Cart>(keys::CART).await?.unwrap_or_default();
        Ok(Self { session, cart })
    }

    /// Apply an action to the loaded cart.
    pub fn dispatch(&mut self, action: CartAction) -> CartEvent {
        self.cart.dispatch(action)
    }

    /// Write the cart back to the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be written.
    pub async fn commit(&self) -> Result<(), tower_sessions::session::Error> {
        self.session.insert(keys::CART, &self.cart).await
    }

    /// The current cart.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }
}

/// Load the checkout flow, if the visitor has entered checkout.
///
/// # Errors
///
/// Returns an error if the session store cannot be read.
pub async fn load_checkout(
    session: &Session,
) -> Result<Option<CheckoutFlow>, tower_sessions::session::Error> {
    session.get::<CheckoutFlow>(keys::CHECKOUT).await
}

/// Store the checkout flow.
///
/// The session is saved immediately so that concurrent requests observe a
/// flow that has moved to Processing.
///
/// # Errors
///
/// Returns an error if the session store cannot be written.
pub async fn save_checkout(
    session: &Session,
    flow: &CheckoutFlow,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::CHECKOUT, flow).await?;
    session.save().await
}
