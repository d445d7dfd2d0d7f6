//! Application state shared across handlers.

use std::sync::Arc;

use brew_and_bites_core::{Catalog, CurrencyCode, Price};
use rust_decimal::Decimal;

use crate::config::StorefrontConfig;
use crate::services::PaymentService;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// catalog, configuration and the payment service.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: Catalog,
    payments: PaymentService,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `catalog` - The menu served by this storefront
    #[must_use]
    pub fn new(config: StorefrontConfig, catalog: Catalog) -> Self {
        let payments = PaymentService::new(config.checkout.payment_delay);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                payments,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the product catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    /// Get a reference to the payment service.
    #[must_use]
    pub fn payments(&self) -> &PaymentService {
        &self.inner.payments
    }

    /// Currency prices are displayed in.
    #[must_use]
    pub fn currency(&self) -> CurrencyCode {
        self.inner.config.currency
    }

    /// Format an amount in the storefront's currency.
    #[must_use]
    pub fn format_price(&self, amount: Decimal) -> String {
        Price::new(amount, self.currency()).to_string()
    }
}
