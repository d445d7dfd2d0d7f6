//! Checkout snapshot and the checkout state machine.
//!
//! ```text
//!            enter(empty)
//!   ─────────────────────────▶ Empty (terminal)
//!
//!            enter(items)          begin_processing()         finish(Success)
//!   ─────────────────────────▶ Idle ───────────────────▶ Processing ───────────────▶ Succeeded (terminal)
//!                               ▲                              │
//!                               └──────── finish(Failure) ─────┘
//! ```
//!
//! The flow never touches the cart. Callers clear the cart themselves once
//! the flow reports [`CheckoutFlow::Succeeded`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cart::{Cart, CartLineItem};
use crate::types::CheckoutId;

/// Sales tax, in percent.
pub const TAX_RATE_PERCENT: u32 = 6;

/// Sales tax as a fraction (`0.06`).
#[must_use]
pub fn tax_rate() -> Decimal {
    Decimal::new(i64::from(TAX_RATE_PERCENT), 2)
}

/// Immutable copy of the cart with derived totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSnapshot {
    pub checkout_id: CheckoutId,
    items: Vec<CartLineItem>,
    subtotal: Decimal,
    tax: Decimal,
    total: Decimal,
}

impl CheckoutSnapshot {
    /// Snapshot a list of line items.
    #[must_use]
    pub fn new(items: Vec<CartLineItem>) -> Self {
        let subtotal: Decimal = items.iter().map(CartLineItem::line_total).sum();
        let tax = subtotal * tax_rate();
        Self {
            checkout_id: CheckoutId::generate(),
            items,
            subtotal,
            tax,
            total: subtotal + tax,
        }
    }

    /// Snapshot the current contents of `cart`.
    #[must_use]
    pub fn from_cart(cart: &Cart) -> Self {
        Self::new(cart.items().to_vec())
    }

    #[must_use]
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    #[must_use]
    pub const fn subtotal(&self) -> Decimal {
        self.subtotal
    }

    #[must_use]
    pub const fn tax(&self) -> Decimal {
        self.tax
    }

    #[must_use]
    pub const fn total(&self) -> Decimal {
        self.total
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Result of a payment attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum PaymentOutcome {
    Success,
    Failure(String),
}

/// Proof of a completed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderConfirmation {
    pub checkout_id: CheckoutId,
    pub order_number: String,
    pub total: Decimal,
    pub confirmed_at: DateTime<Utc>,
}

impl OrderConfirmation {
    fn for_snapshot(snapshot: &CheckoutSnapshot) -> Self {
        Self {
            checkout_id: snapshot.checkout_id,
            order_number: snapshot.checkout_id.order_number(),
            total: snapshot.total,
            confirmed_at: Utc::now(),
        }
    }
}

/// Invalid checkout transitions.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,
    #[error("payment is already being processed")]
    AlreadyProcessing,
    #[error("checkout already completed")]
    AlreadyCompleted,
    #[error("no payment in progress")]
    NotProcessing,
}

/// Checkout state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CheckoutFlow {
    /// Entered with nothing to pay for.
    Empty,
    /// Waiting for payment details.
    Idle {
        snapshot: CheckoutSnapshot,
        /// Reason the previous attempt failed, if any.
        last_failure: Option<String>,
    },
    /// Payment in progress; submissions are rejected.
    Processing { snapshot: CheckoutSnapshot },
    /// Payment went through.
    Succeeded {
        snapshot: CheckoutSnapshot,
        confirmation: OrderConfirmation,
    },
}

impl CheckoutFlow {
    /// Enter checkout with a snapshot.
    ///
    /// An absent or empty snapshot lands in [`CheckoutFlow::Empty`].
    #[must_use]
    pub fn enter(snapshot: Option<CheckoutSnapshot>) -> Self {
        match snapshot {
            Some(snapshot) if !snapshot.is_empty() => Self::Idle {
                snapshot,
                last_failure: None,
            },
            _ => Self::Empty,
        }
    }

    /// Move from Idle to Processing and return the snapshot to charge.
    ///
    /// # Errors
    ///
    /// Fails without changing state unless the flow is Idle.
    pub fn begin_processing(&mut self) -> Result<CheckoutSnapshot, CheckoutError> {
        match self {
            Self::Empty => Err(CheckoutError::EmptyCart),
            Self::Processing { .. } => Err(CheckoutError::AlreadyProcessing),
            Self::Succeeded { .. } => Err(CheckoutError::AlreadyCompleted),
            Self::Idle { snapshot, .. } => {
                let snapshot = snapshot.clone();
                *self = Self::Processing {
                    snapshot: snapshot.clone(),
                };
                Ok(snapshot)
            }
        }
    }

    /// Apply the payment outcome to a Processing flow.
    ///
    /// # Errors
    ///
    /// Returns `NotProcessing` if no payment is in progress.
    pub fn finish(&mut self, outcome: PaymentOutcome) -> Result<(), CheckoutError> {
        let Self::Processing { snapshot } = self else {
            return Err(CheckoutError::NotProcessing);
        };
        let snapshot = snapshot.clone();

        *self = match outcome {
            PaymentOutcome::Success => {
                let confirmation = OrderConfirmation::for_snapshot(&snapshot);
                Self::Succeeded {
                    snapshot,
                    confirmation,
                }
            }
            PaymentOutcome::Failure(reason) => Self::Idle {
                snapshot,
                last_failure: Some(reason),
            },
        };
        Ok(())
    }

    /// The snapshot being checked out, if any.
    #[must_use]
    pub fn snapshot(&self) -> Option<&CheckoutSnapshot> {
        match self {
            Self::Empty => None,
            Self::Idle { snapshot, .. }
            | Self::Processing { snapshot }
            | Self::Succeeded { snapshot, .. } => Some(snapshot),
        }
    }

    /// Whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Empty | Self::Succeeded { .. })
    }

    #[must_use]
    pub const fn is_processing(&self) -> bool {
        matches!(self, Self::Processing { .. })
    }
}

/// Payment form contents.
///
/// Only presence of each field is checked; there is no real card
/// validation. `Debug` redacts the card number and CVV.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct PaymentDetails {
    pub card_number: String,
    pub expiry: String,
    pub cvv: String,
    pub card_name: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
}

impl PaymentDetails {
    /// Names of required fields that are blank.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("card_number", &self.card_number),
            ("expiry", &self.expiry),
            ("cvv", &self.cvv),
            ("card_name", &self.card_name),
            ("email", &self.email),
            ("address", &self.address),
            ("city", &self.city),
            ("postal_code", &self.postal_code),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

impl std::fmt::Debug for PaymentDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentDetails")
            .field("card_number", &"[REDACTED]")
            .field("expiry", &self.expiry)
            .field("cvv", &"[REDACTED]")
            .field("card_name", &self.card_name)
            .field("email", &self.email)
            .field("address", &self.address)
            .field("city", &self.city)
            .field("postal_code", &self.postal_code)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::types::ProductId;

    fn line(price_cents: i64, quantity: u32) -> CartLineItem {
        CartLineItem {
            id: ProductId::from(format!("item-{price_cents}").as_str()),
            name: "Item".to_string(),
            price: Decimal::new(price_cents, 2),
            image: String::new(),
            quantity,
        }
    }

    fn idle_flow() -> CheckoutFlow {
        CheckoutFlow::enter(Some(CheckoutSnapshot::new(vec![line(500, 2)])))
    }

    #[test]
    fn test_ten_ringgit_subtotal() {
        let snapshot = CheckoutSnapshot::new(vec![line(1000, 1)]);
        assert_eq!(snapshot.subtotal(), Decimal::new(1000, 2));
        assert_eq!(snapshot.tax(), Decimal::new(60, 2));
        assert_eq!(snapshot.total(), Decimal::new(1060, 2));
    }

    #[test]
    fn test_snapshot_from_cart() {
        let menu = Catalog::cafe_menu();
        let mut cart = Cart::new();
        for id in ["espresso", "espresso", "green_tea"] {
            let product = menu.get(&ProductId::from(id)).expect("on menu");
            cart.add_item(product);
        }

        let snapshot = CheckoutSnapshot::from_cart(&cart);

        assert_eq!(snapshot.items(), cart.items());
        assert_eq!(snapshot.subtotal(), cart.total_price());
        assert_eq!(snapshot.total(), snapshot.subtotal() + snapshot.tax());
    }

    #[test]
    fn test_snapshot_is_independent_of_cart() {
        let menu = Catalog::cafe_menu();
        let latte = menu.get(&ProductId::from("latte")).expect("on menu");
        let mut cart = Cart::new();
        cart.add_item(latte);

        let snapshot = CheckoutSnapshot::from_cart(&cart);
        cart.add_item(latte);

        assert_eq!(snapshot.items()[0].quantity, 1);
        assert_eq!(snapshot.subtotal(), Decimal::new(450, 2));
    }

    #[test]
    fn test_tax_rate() {
        assert_eq!(tax_rate(), Decimal::new(6, 2));
    }

    #[test]
    fn test_enter_empty_is_terminal() {
        let mut flow = CheckoutFlow::enter(Some(CheckoutSnapshot::new(Vec::new())));
        assert_eq!(flow, CheckoutFlow::Empty);
        assert!(flow.is_terminal());

        assert_eq!(flow.begin_processing(), Err(CheckoutError::EmptyCart));
        assert!(!flow.is_processing());
        assert_eq!(flow, CheckoutFlow::Empty);
    }

    #[test]
    fn test_enter_without_snapshot_is_empty() {
        assert_eq!(CheckoutFlow::enter(None), CheckoutFlow::Empty);
    }

    #[test]
    fn test_successful_payment() {
        let mut flow = idle_flow();

        let snapshot = flow.begin_processing().expect("idle flow starts");
        assert!(flow.is_processing());
        assert_eq!(flow.snapshot(), Some(&snapshot));

        flow.finish(PaymentOutcome::Success).expect("processing flow finishes");

        let CheckoutFlow::Succeeded { confirmation, .. } = &flow else {
            panic!("expected Succeeded, got {flow:?}");
        };
        assert_eq!(confirmation.checkout_id, snapshot.checkout_id);
        assert_eq!(confirmation.total, Decimal::new(1060, 2));
        assert!(confirmation.order_number.starts_with("BB-"));
        assert!(flow.is_terminal());
    }

    #[test]
    fn test_second_submission_is_rejected() {
        let mut flow = idle_flow();
        flow.begin_processing().expect("first submission");
        assert_eq!(
            flow.begin_processing(),
            Err(CheckoutError::AlreadyProcessing)
        );
        assert!(flow.is_processing());
    }

    #[test]
    fn test_failure_returns_to_idle() {
        let mut flow = idle_flow();
        flow.begin_processing().expect("first submission");

        flow.finish(PaymentOutcome::Failure("cancelled".to_string()))
            .expect("processing flow finishes");

        let CheckoutFlow::Idle { last_failure, .. } = &flow else {
            panic!("expected Idle, got {flow:?}");
        };
        assert_eq!(last_failure.as_deref(), Some("cancelled"));
        assert!(flow.begin_processing().is_ok());
    }

    #[test]
    fn test_completed_flow_rejects_submission() {
        let mut flow = idle_flow();
        flow.begin_processing().expect("first submission");
        flow.finish(PaymentOutcome::Success).expect("finish");

        assert_eq!(
            flow.begin_processing(),
            Err(CheckoutError::AlreadyCompleted)
        );
        assert_eq!(
            flow.finish(PaymentOutcome::Success),
            Err(CheckoutError::NotProcessing)
        );
    }

    #[test]
    fn test_flow_survives_session_serialization() {
        let mut flow = idle_flow();
        flow.begin_processing().expect("first submission");

        let json = serde_json::to_value(&flow).expect("serialize");
        assert_eq!(json["state"], "processing");
        let restored: CheckoutFlow = serde_json::from_value(json).expect("deserialize");
        assert_eq!(restored, flow);
    }

    #[test]
    fn test_missing_fields() {
        let details = PaymentDetails {
            card_number: "4111 1111 1111 1111".to_string(),
            expiry: "12/29".to_string(),
            cvv: "   ".to_string(),
            card_name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            address: "123 Coffee Street".to_string(),
            city: String::new(),
            postal_code: "50000".to_string(),
        };
        assert_eq!(details.missing_fields(), vec!["cvv", "city"]);
        assert_eq!(PaymentDetails::default().missing_fields().len(), 8);
    }

    #[test]
    fn test_payment_details_debug_redacts_card_data() {
        let details = PaymentDetails {
            card_number: "4111111111111111".to_string(),
            cvv: "123".to_string(),
            ..PaymentDetails::default()
        };
        let debug = format!("{details:?}");
        assert!(!debug.contains("4111111111111111"));
        assert!(!debug.contains("123"));
        assert!(debug.contains("[REDACTED]"));
    }
}
