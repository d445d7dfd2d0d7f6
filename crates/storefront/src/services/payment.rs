//! Simulated payment processing.
//!
//! Every payment runs as its own tokio task that waits out a fixed delay and
//! then reports [`PaymentOutcome::Success`]. The task races the delay against
//! a cancellation token derived from the service's root token, so shutting
//! the service down fails in-flight payments instead of leaving them hanging.
//!
//! The service also owns the re-entrancy guard: a checkout that is already
//! being charged cannot be submitted again until its task finishes.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use brew_and_bites_core::{CheckoutId, PaymentOutcome};
use rust_decimal::Decimal;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

/// Failure reason reported when a payment is cancelled by shutdown.
pub const CANCELLED_REASON: &str = "Payment was cancelled before it completed";

/// Errors starting or running a payment.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The checkout already has a payment in flight.
    #[error("payment already in progress for checkout {0}")]
    AlreadyProcessing(CheckoutId),

    /// The payment task panicked or was aborted.
    #[error("payment task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Payment service with a fixed simulated latency.
#[derive(Debug)]
pub struct PaymentService {
    delay: Duration,
    shutdown: CancellationToken,
    in_flight: Mutex<HashSet<CheckoutId>>,
}

/// Removes a checkout from the in-flight set when dropped, including when
/// the request driving the payment goes away mid-flight.
struct InFlight<'a> {
    service: &'a PaymentService,
    checkout_id: CheckoutId,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.service.in_flight().remove(&self.checkout_id);
    }
}

impl PaymentService {
    /// Create a payment service whose payments take `delay`.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            shutdown: CancellationToken::new(),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Charge `amount` for `checkout_id`.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyProcessing` if this checkout is already being charged,
    /// or `Task` if the payment task did not run to completion.
    #[instrument(skip(self))]
    pub async fn charge(
        &self,
        checkout_id: CheckoutId,
        amount: Decimal,
    ) -> Result<PaymentOutcome, PaymentError> {
        if !self.in_flight().insert(checkout_id) {
            tracing::warn!(%checkout_id, "Rejected duplicate payment submission");
            return Err(PaymentError::AlreadyProcessing(checkout_id));
        }
        let _guard = InFlight {
            service: self,
            checkout_id,
        };
        let token = self.shutdown.child_token();

        tracing::info!(%checkout_id, %amount, "Payment started");

        let delay = self.delay;
        let task = tokio::spawn(async move {
            tokio::select! {
                biased;
                () = token.cancelled() => PaymentOutcome::Failure(CANCELLED_REASON.to_string()),
                () = tokio::time::sleep(delay) => PaymentOutcome::Success,
            }
        });
        let outcome = task.await?;
        match &outcome {
            PaymentOutcome::Success => tracing::info!(%checkout_id, "Payment succeeded"),
            PaymentOutcome::Failure(reason) => {
                tracing::warn!(%checkout_id, %reason, "Payment failed");
            }
        }
        Ok(outcome)
    }

    /// Whether a payment for `checkout_id` is currently running.
    #[must_use]
    pub fn is_processing(&self, checkout_id: CheckoutId) -> bool {
        self.in_flight().contains(&checkout_id)
    }

    /// Number of payments currently running.
    #[must_use]
    pub fn in_flight_count(&self) -> usize {
        self.in_flight().len()
    }

    /// Cancel every in-flight payment and refuse to complete new ones.
    pub fn shutdown(&self) {
        tracing::info!("Cancelling in-flight payments");
        self.shutdown.cancel();
    }

    fn in_flight(&self) -> MutexGuard<'_, HashSet<CheckoutId>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn amount() -> Decimal {
        Decimal::new(1060, 2)
    }

    async fn wait_until_processing(service: &PaymentService, checkout_id: CheckoutId) {
        while !service.is_processing(checkout_id) {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_payment_succeeds_after_delay() {
        let service = PaymentService::new(Duration::from_secs(2));
        let started = tokio::time::Instant::now();

        let outcome = service
            .charge(CheckoutId::generate(), amount())
            .await
            .expect("payment runs");

        assert_eq!(outcome, PaymentOutcome::Success);
        assert!(started.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_submission_is_rejected() {
        let service = Arc::new(PaymentService::new(Duration::from_secs(2)));
        let checkout_id = CheckoutId::generate();

        let first = tokio::spawn({
            let service = Arc::clone(&service);
            async move { service.charge(checkout_id, amount()).await }
        });
        wait_until_processing(&service, checkout_id).await;

        let second = service.charge(checkout_id, amount()).await;
        assert!(matches!(second, Err(PaymentError::AlreadyProcessing(id)) if id == checkout_id));

        assert_eq!(service.in_flight_count(), 1);

        let outcome = first.await.expect("task joins").expect("payment runs");
        assert_eq!(outcome, PaymentOutcome::Success);
        assert!(!service.is_processing(checkout_id));
        assert_eq!(service.in_flight_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_different_checkouts_run_independently() {
        let service = Arc::new(PaymentService::new(Duration::from_secs(2)));
        let (a, b) = (CheckoutId::generate(), CheckoutId::generate());

        let (first, second) = tokio::join!(service.charge(a, amount()), service.charge(b, amount()));

        assert_eq!(first.expect("a runs"), PaymentOutcome::Success);
        assert_eq!(second.expect("b runs"), PaymentOutcome::Success);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_in_flight_payment() {
        let service = Arc::new(PaymentService::new(Duration::from_secs(60)));
        let checkout_id = CheckoutId::generate();

        let pending = tokio::spawn({
            let service = Arc::clone(&service);
            async move { service.charge(checkout_id, amount()).await }
        });
        wait_until_processing(&service, checkout_id).await;

        service.shutdown();

        let outcome = pending.await.expect("task joins").expect("payment runs");
        assert_eq!(outcome, PaymentOutcome::Failure(CANCELLED_REASON.to_string()));
        assert!(!service.is_processing(checkout_id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_checkout_can_be_charged_again_after_completion() {
        let service = PaymentService::new(Duration::from_millis(10));
        let checkout_id = CheckoutId::generate();

        service.charge(checkout_id, amount()).await.expect("first");
        let again = service.charge(checkout_id, amount()).await.expect("second");
        assert_eq!(again, PaymentOutcome::Success);
    }
}
