//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! The cart itself lives in the visitor's session.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::HeaderValue,
    response::{IntoResponse, Response},
};
use brew_and_bites_core::{Cart, CartAction, CartEvent, CartLineItem, ProductId};
use serde::Deserialize;
use serde_json::json;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::CartStore;
use crate::state::AppState;

/// HTMX event fired whenever the cart changes.
pub const CART_UPDATED_EVENT: &str = "cart-updated";

/// HTMX event carrying a toast notification.
pub const SHOW_TOAST_EVENT: &str = "show-toast";

/// Cart item display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub id: String,
    pub name: String,
    pub image: String,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: u32,
}

impl CartItemView {
    pub(crate) fn new(item: &CartLineItem, state: &AppState) -> Self {
        Self {
            id: item.id.to_string(),
            name: item.name.clone(),
            image: item.image.clone(),
            quantity: item.quantity,
            price: state.format_price(item.price),
            line_price: state.format_price(item.line_total()),
        }
    }
}

impl CartView {
    /// Build the display data for `cart`.
    #[must_use]
    pub fn new(cart: &Cart, state: &AppState) -> Self {
        Self {
            items: cart
                .items()
                .iter()
                .map(|item| CartItemView::new(item, state))
                .collect(),
            subtotal: state.format_price(cart.total_price()),
            item_count: cart.total_count(),
        }
    }
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
}

/// Update quantity form data.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityForm {
    pub product_id: String,
    pub delta: i32,
}

/// Cart drawer fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_drawer.html")]
pub struct CartDrawerTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub cart_count: u32,
}

/// Serialize `value` as JSON with every non-ASCII character `\u`-escaped.
///
/// Browsers decode header bytes as Latin-1, so product names must reach
/// htmx as pure ASCII.
fn ascii_json(value: &serde_json::Value) -> String {
    let json = value.to_string();
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            let mut units = [0_u16; 2];
            for unit in c.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{unit:04x}"));
            }
        }
    }
    out
}

/// Attach an `HX-Trigger` header to a response.
fn with_trigger(mut response: Response, trigger: &serde_json::Value) -> Response {
    match HeaderValue::from_str(&ascii_json(trigger)) {
        Ok(value) => {
            response.headers_mut().insert("HX-Trigger", value);
        }
        Err(e) => tracing::warn!("Dropping invalid HX-Trigger header: {e}"),
    }
    response
}

/// The acknowledgment shown when a product lands in the cart.
fn added_toast(name: &str) -> serde_json::Value {
    json!({
        CART_UPDATED_EVENT: null,
        SHOW_TOAST_EVENT: {
            "title": "Added to cart",
            "description": format!("{name} has been added to your cart"),
        },
    })
}

/// Display the cart drawer (HTMX).
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<impl IntoResponse> {
    let store = CartStore::load(session).await?;

    Ok(CartDrawerTemplate {
        cart: CartView::new(store.cart(), &state),
    })
}

/// Get cart count badge (HTMX).
#[instrument(skip(session))]
pub async fn count(session: Session) -> Result<impl IntoResponse> {
    let store = CartStore::load(session).await?;

    Ok(CartCountTemplate {
        cart_count: store.cart().total_count(),
    })
}

/// Add one unit of a product to the cart (HTMX).
///
/// Returns the updated count badge and triggers the cart-updated and toast
/// events on the client.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let product_id = ProductId::from(form.product_id);
    let product = state
        .catalog()
        .get(&product_id)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))?;

    let mut store = CartStore::load(session).await?;
    let event = store.dispatch(CartAction::Add(product));
    store.commit().await?;

    let CartEvent::ItemAdded { name, quantity, .. } = &event else {
        return Err(AppError::Internal(format!(
            "unexpected cart event for add: {event:?}"
        )));
    };
    tracing::info!(%product_id, quantity, "Added to cart");
    add_breadcrumb("cart", "Added to cart", Some(&[("product_id", product_id.as_str())]));

    let response = CartCountTemplate {
        cart_count: store.cart().total_count(),
    }
    .into_response();

    Ok(with_trigger(response, &added_toast(name)))
}

/// Change a line item's quantity (HTMX).
///
/// Unknown line items are ignored. Returns the refreshed cart drawer.
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<UpdateQuantityForm>,
) -> Result<Response> {
    let id = ProductId::from(form.product_id);

    let mut store = CartStore::load(session).await?;
    let event = store.dispatch(CartAction::UpdateQuantity {
        id: id.clone(),
        delta: form.delta,
    });

    match &event {
        CartEvent::QuantityChanged { quantity, .. } => {
            tracing::info!(product_id = %id, quantity, "Cart quantity changed");
        }
        CartEvent::ItemRemoved { .. } => {
            tracing::info!(product_id = %id, "Removed from cart");
            add_breadcrumb("cart", "Removed from cart", Some(&[("product_id", id.as_str())]));
        }
        _ => tracing::debug!(product_id = %id, "Cart update ignored"),
    }

    if event != CartEvent::Unchanged {
        store.commit().await?;
    }

    let response = CartDrawerTemplate {
        cart: CartView::new(store.cart(), &state),
    }
    .into_response();

    Ok(with_trigger(response, &json!({ CART_UPDATED_EVENT: null })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_added_toast_names_product() {
        let toast = added_toast("Espresso");
        assert_eq!(toast[SHOW_TOAST_EVENT]["title"], "Added to cart");
        assert_eq!(
            toast[SHOW_TOAST_EVENT]["description"],
            "Espresso has been added to your cart"
        );
        assert!(toast.get(CART_UPDATED_EVENT).is_some());
    }

    #[test]
    fn test_with_trigger_sets_header() {
        let response = with_trigger("ok".into_response(), &json!({ CART_UPDATED_EVENT: null }));
        assert_eq!(
            response.headers().get("HX-Trigger").expect("header"),
            r#"{"cart-updated":null}"#
        );
    }

    #[test]
    fn test_with_trigger_escapes_non_ascii() {
        let response = with_trigger("ok".into_response(), &added_toast("Café au lait"));
        let header = response
            .headers()
            .get("HX-Trigger")
            .expect("header")
            .to_str()
            .expect("ascii");
        assert!(header.contains(r"Caf\u00e9 au lait"));

        let decoded: serde_json::Value = serde_json::from_str(header).expect("valid json");
        assert_eq!(
            decoded[SHOW_TOAST_EVENT]["description"],
            "Café au lait has been added to your cart"
        );
    }
}
