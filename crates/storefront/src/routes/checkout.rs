//! Checkout route handlers.
//!
//! The checkout flow is a state machine stored in the session. Entering
//! checkout snapshots the cart; submitting the payment form runs a simulated
//! payment and, on success, clears the cart.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use brew_and_bites_core::{
    CartAction, CheckoutError, CheckoutFlow, CheckoutSnapshot, PaymentDetails, PaymentOutcome,
    TAX_RATE_PERCENT,
};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, add_breadcrumb};
use crate::models::{CartStore, load_checkout, save_checkout};
use crate::routes::cart::CartItemView;
use crate::services::PaymentError;
use crate::state::AppState;

/// Failure reason for a payment whose request went away mid-flight.
pub const INTERRUPTED_REASON: &str = "Your previous payment attempt was interrupted";

/// Failure reason for a payment task that did not finish.
const TASK_FAILED_REASON: &str = "Payment could not be processed";

/// Order summary display data.
#[derive(Clone)]
pub struct OrderSummaryView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub tax_label: String,
    pub tax: String,
    pub total: String,
    pub pay_label: String,
}

impl OrderSummaryView {
    fn new(snapshot: &CheckoutSnapshot, state: &AppState) -> Self {
        let total = state.format_price(snapshot.total());
        Self {
            items: snapshot
                .items()
                .iter()
                .map(|item| CartItemView::new(item, state))
                .collect(),
            subtotal: state.format_price(snapshot.subtotal()),
            tax_label: format!("Tax ({TAX_RATE_PERCENT}%)"),
            tax: state.format_price(snapshot.tax()),
            pay_label: format!("Pay {total}"),
            total,
        }
    }
}

/// Checkout form page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub summary: OrderSummaryView,
    /// Previously entered details; card number and CVV are never echoed.
    pub details: PaymentDetails,
    pub error: Option<String>,
    pub processing: bool,
    pub cart_count: u32,
}

/// Empty cart checkout template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/empty.html")]
pub struct CheckoutEmptyTemplate {
    pub cart_count: u32,
}

/// Order confirmation template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/success.html")]
pub struct CheckoutSuccessTemplate {
    pub order_number: String,
    pub total: String,
    pub redirect_delay_secs: u32,
    pub cart_count: u32,
}

/// Render the page for the current state of the flow.
fn render(
    state: &AppState,
    flow: &CheckoutFlow,
    details: PaymentDetails,
    cart_count: u32,
) -> Response {
    match flow {
        CheckoutFlow::Empty => CheckoutEmptyTemplate { cart_count }.into_response(),
        CheckoutFlow::Idle {
            snapshot,
            last_failure,
        } => CheckoutTemplate {
            summary: OrderSummaryView::new(snapshot, state),
            details: redact(details),
            error: last_failure.clone(),
            processing: false,
            cart_count,
        }
        .into_response(),
        CheckoutFlow::Processing { snapshot } => CheckoutTemplate {
            summary: OrderSummaryView::new(snapshot, state),
            details: redact(details),
            error: None,
            processing: true,
            cart_count,
        }
        .into_response(),
        CheckoutFlow::Succeeded { confirmation, .. } => CheckoutSuccessTemplate {
            order_number: confirmation.order_number.clone(),
            total: state.format_price(confirmation.total),
            redirect_delay_secs: state.config().checkout.redirect_delay_secs,
            cart_count,
        }
        .into_response(),
    }
}

/// Drop the card number and CVV before details are echoed back.
fn redact(details: PaymentDetails) -> PaymentDetails {
    PaymentDetails {
        card_number: String::new(),
        cvv: String::new(),
        ..details
    }
}

/// Human-readable list of blank form fields.
fn missing_fields_message(missing: &[&str]) -> String {
    let labels: Vec<String> = missing.iter().map(|name| name.replace('_', " ")).collect();
    format!("Please fill in: {}", labels.join(", "))
}

/// Return a Processing flow to Idle when its payment is no longer running.
///
/// This happens when the request that started the payment was dropped
/// before it could store the outcome.
fn recover_stale(state: &AppState, flow: &mut CheckoutFlow) -> Result<bool> {
    let stale = match flow {
        CheckoutFlow::Processing { snapshot } => {
            !state.payments().is_processing(snapshot.checkout_id)
        }
        _ => false,
    };
    if stale {
        tracing::warn!("Recovering checkout left in processing");
        flow.finish(PaymentOutcome::Failure(INTERRUPTED_REASON.to_string()))?;
    }
    Ok(stale)
}

/// Snapshot the cart and enter checkout.
///
/// Redirects to the checkout page. An empty cart enters the empty state.
#[instrument(skip(state, session))]
pub async fn start(State(state): State<AppState>, session: Session) -> Result<Redirect> {
    if let Some(mut current) = load_checkout(&session).await? {
        recover_stale(&state, &mut current)?;
        if current.is_processing() {
            return Err(CheckoutError::AlreadyProcessing.into());
        }
    }

    let store = CartStore::load(session.clone()).await?;
    let flow = CheckoutFlow::enter(Some(CheckoutSnapshot::from_cart(store.cart())));
    save_checkout(&session, &flow).await?;

    if let Some(snapshot) = flow.snapshot() {
        let checkout_id = snapshot.checkout_id.to_string();
        tracing::info!(%checkout_id, total = %snapshot.total(), "Checkout started");
        add_breadcrumb("checkout", "Checkout started", Some(&[("checkout_id", checkout_id.as_str())]));
    } else {
        tracing::debug!("Checkout started with an empty cart");
    }

    Ok(Redirect::to("/checkout"))
}

/// Display the checkout page for the current flow state.
///
/// Visiting without going through [`start`] lands in the empty state; only
/// [`start`] takes a snapshot of the cart.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Response> {
    let store = CartStore::load(session.clone()).await?;

    let flow = match load_checkout(&session).await? {
        Some(mut flow) => {
            if recover_stale(&state, &mut flow)? {
                save_checkout(&session, &flow).await?;
            }
            flow
        }
        None => {
            tracing::debug!("Checkout visited without a snapshot");
            let flow = CheckoutFlow::enter(None);
            save_checkout(&session, &flow).await?;
            flow
        }
    };

    Ok(render(
        &state,
        &flow,
        PaymentDetails::default(),
        store.cart().total_count(),
    ))
}

/// Submit payment details and run the simulated payment.
///
/// Submitting from the empty state never starts a payment. A second
/// submission while a payment is running is rejected with 409 Conflict.
#[instrument(skip(state, session))]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    Form(details): Form<PaymentDetails>,
) -> Result<Response> {
    let mut store = CartStore::load(session.clone()).await?;
    let mut flow = load_checkout(&session)
        .await?
        .unwrap_or(CheckoutFlow::Empty);
    recover_stale(&state, &mut flow)?;

    if flow == CheckoutFlow::Empty {
        tracing::debug!("Payment submitted with an empty cart");
        return Ok(CheckoutEmptyTemplate {
            cart_count: store.cart().total_count(),
        }
        .into_response());
    }

    if let CheckoutFlow::Idle { snapshot, .. } = &flow {
        let missing = details.missing_fields();
        if !missing.is_empty() {
            tracing::debug!(?missing, "Payment form incomplete");
            let page = CheckoutTemplate {
                summary: OrderSummaryView::new(snapshot, &state),
                details: redact(details),
                error: Some(missing_fields_message(&missing)),
                processing: false,
                cart_count: store.cart().total_count(),
            };
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    }

    let snapshot = flow.begin_processing()?;
    save_checkout(&session, &flow).await?;

    let checkout_id = snapshot.checkout_id;
    let outcome = match state.payments().charge(checkout_id, snapshot.total()).await {
        Ok(outcome) => outcome,
        Err(err @ PaymentError::Task(_)) => {
            flow.finish(PaymentOutcome::Failure(TASK_FAILED_REASON.to_string()))?;
            save_checkout(&session, &flow).await?;
            return Err(err.into());
        }
        Err(err) => return Err(err.into()),
    };

    flow.finish(outcome)?;

    if let CheckoutFlow::Succeeded { confirmation, .. } = &flow {
        store.dispatch(CartAction::Clear);
        store.commit().await?;
        tracing::info!(
            %checkout_id,
            order_number = %confirmation.order_number,
            "Order confirmed"
        );
        add_breadcrumb(
            "checkout",
            "Order confirmed",
            Some(&[("order_number", confirmation.order_number.as_str())]),
        );
    }
    save_checkout(&session, &flow).await?;

    Ok(render(&state, &flow, details, store.cart().total_count()))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use brew_and_bites_core::{Catalog, ProductId};

    use super::*;
    use crate::config::{CheckoutConfig, StorefrontConfig};

    fn state() -> AppState {
        let config = StorefrontConfig {
            checkout: CheckoutConfig {
                payment_delay: Duration::ZERO,
                ..CheckoutConfig::default()
            },
            ..StorefrontConfig::default()
        };
        AppState::new(config, Catalog::cafe_menu())
    }

    fn processing_flow() -> CheckoutFlow {
        let menu = Catalog::cafe_menu();
        let mut cart = brew_and_bites_core::Cart::new();
        cart.add_item(menu.get(&ProductId::from("espresso")).expect("on menu"));
        let mut flow = CheckoutFlow::enter(Some(CheckoutSnapshot::from_cart(&cart)));
        flow.begin_processing().expect("idle flow starts");
        flow
    }

    #[test]
    fn test_missing_fields_message() {
        assert_eq!(
            missing_fields_message(&["card_number", "postal_code"]),
            "Please fill in: card number, postal code"
        );
    }

    #[test]
    fn test_redact_clears_card_data() {
        let details = redact(PaymentDetails {
            card_number: "4111111111111111".to_string(),
            cvv: "123".to_string(),
            email: "ada@example.com".to_string(),
            ..PaymentDetails::default()
        });
        assert!(details.card_number.is_empty());
        assert!(details.cvv.is_empty());
        assert_eq!(details.email, "ada@example.com");
    }

    #[test]
    fn test_order_summary_labels() {
        let flow = processing_flow();
        let summary = OrderSummaryView::new(flow.snapshot().expect("snapshot"), &state());

        assert_eq!(summary.subtotal, "RM 3.50");
        assert_eq!(summary.tax_label, "Tax (6%)");
        assert_eq!(summary.tax, "RM 0.21");
        assert_eq!(summary.total, "RM 3.71");
        assert_eq!(summary.pay_label, "Pay RM 3.71");
    }

    #[test]
    fn test_stale_processing_flow_is_recovered() {
        let mut flow = processing_flow();

        assert!(recover_stale(&state(), &mut flow).expect("recovers"));

        let CheckoutFlow::Idle { last_failure, .. } = &flow else {
            panic!("expected Idle, got {flow:?}");
        };
        assert_eq!(last_failure.as_deref(), Some(INTERRUPTED_REASON));
    }

    #[test]
    fn test_idle_flow_is_not_recovered() {
        let mut flow = processing_flow();
        flow.finish(PaymentOutcome::Failure("declined".to_string()))
            .expect("finish");
        let before = flow.clone();

        assert!(!recover_stale(&state(), &mut flow).expect("no-op"));
        assert_eq!(flow, before);
    }
}
