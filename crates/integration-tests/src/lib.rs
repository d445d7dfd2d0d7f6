//! Integration tests for the Brew & Bites storefront.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p brew-and-bites-integration-tests
//! ```
//!
//! Each test starts its own storefront on an ephemeral port and talks to it
//! over HTTP with a cookie-carrying client, so every test gets a fresh
//! session store and a fresh visitor.

use std::net::SocketAddr;
use std::time::Duration;

use brew_and_bites_core::Catalog;
use brew_and_bites_storefront::{
    app,
    config::{CheckoutConfig, StorefrontConfig},
    state::AppState,
};
use reqwest::{Client, Response, redirect::Policy};

/// A running storefront and a client acting as one visitor.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
    pub state: AppState,
}

impl TestContext {
    /// Start a storefront whose payments complete immediately.
    ///
    /// # Panics
    ///
    /// Panics if the server cannot be started.
    pub async fn new() -> Self {
        Self::with_payment_delay(Duration::ZERO).await
    }

    /// Start a storefront whose payments take `payment_delay`.
    ///
    /// # Panics
    ///
    /// Panics if the server cannot be started.
    pub async fn with_payment_delay(payment_delay: Duration) -> Self {
        let config = StorefrontConfig {
            port: 0,
            checkout: CheckoutConfig {
                payment_delay,
                ..CheckoutConfig::default()
            },
            ..StorefrontConfig::default()
        };
        let state = AppState::new(config.clone(), Catalog::cafe_menu());

        let listener = tokio::net::TcpListener::bind(config.socket_addr())
            .await
            .expect("Failed to bind test listener");
        let addr: SocketAddr = listener.local_addr().expect("Listener has an address");

        let router = app(state.clone());
        tokio::spawn(async move {
            axum_serve(listener, router).await;
        });

        Self {
            client: visitor(),
            base_url: format!("http://{addr}"),
            state,
        }
    }

    /// A second visitor with its own cookie jar.
    #[must_use]
    pub fn new_visitor(&self) -> Client {
        visitor()
    }

    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// GET `path`.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET request failed")
    }

    /// POST a form to `path`.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("POST request failed")
    }

    /// Add one unit of `product_id` to the cart.
    ///
    /// # Panics
    ///
    /// Panics if the product is not added.
    pub async fn add_to_cart(&self, product_id: &str) {
        let resp = self
            .post_form("/cart/add", &[("product_id", product_id)])
            .await;
        assert!(
            resp.status().is_success(),
            "adding {product_id} returned {}",
            resp.status()
        );
    }

    /// Wait until the server has a payment running.
    ///
    /// # Panics
    ///
    /// Panics if no payment starts within five seconds.
    pub async fn wait_for_payment_in_flight(&self) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while self.state.payments().in_flight_count() == 0 {
            assert!(
                tokio::time::Instant::now() < deadline,
                "no payment started within five seconds"
            );
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    /// Current cart count badge text.
    ///
    /// # Panics
    ///
    /// Panics if the badge cannot be fetched.
    pub async fn cart_count(&self) -> String {
        let body = self.get("/cart/count").await.text().await.expect("badge body");
        badge_value(&body)
    }
}

/// A complete set of payment form fields.
#[must_use]
pub fn payment_form() -> Vec<(&'static str, &'static str)> {
    vec![
        ("card_number", "4111 1111 1111 1111"),
        ("expiry", "12/29"),
        ("cvv", "123"),
        ("card_name", "Ada Lovelace"),
        ("email", "ada@example.com"),
        ("address", "123 Coffee Street"),
        ("city", "Kuala Lumpur"),
        ("postal_code", "50000"),
    ]
}

/// Text content of the cart count badge fragment.
#[must_use]
pub fn badge_value(fragment: &str) -> String {
    fragment
        .split_once('>')
        .and_then(|(_, rest)| rest.split_once('<'))
        .map(|(value, _)| value.trim().to_string())
        .unwrap_or_default()
}

fn visitor() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

async fn axum_serve(listener: tokio::net::TcpListener, router: axum::Router) {
    if let Err(e) = axum::serve(listener, router).await {
        panic!("Test server failed: {e}");
    }
}
