//! Checkout state machine for one checkout screen.
//!
//! ```text
//! Idle --begin--> Validating --preconditions fail--> Idle (last_error set)
//!                 Validating --preconditions pass--> Submitting
//!                                                    Submitting --success--> Succeeded
//!                                                    Submitting --failure--> Idle (last_error set)
//! ```
//!
//! While an attempt is in flight (`Validating` or `Submitting`), [`CheckoutFlow::begin`]
//! refuses a second attempt with [`CheckoutError::AlreadySubmitting`].

use smartsales_core::Credential;
use tracing::Instrument;
use uuid::Uuid;

use super::error::CheckoutError;
use super::pipeline::{SaleResult, conclude, prepare};
use super::SalesApi;
use crate::api::{ApiError, CreateSaleRequest, SaleRecord};
use crate::cart::CartLine;

/// Where the current checkout attempt stands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CheckoutState {
    #[default]
    Idle,
    Validating,
    /// One create-sale request is outstanding.
    Submitting { attempt: Uuid },
    /// The sale was created. A new attempt may start from here.
    Succeeded { sale: Box<SaleResult> },
}

/// A validated attempt, ready to send.
#[derive(Debug, Clone)]
pub struct Submission {
    pub attempt: Uuid,
    pub request: CreateSaleRequest,
    pub credential: Credential,
}

/// Checkout screen state: the chosen payment method and the attempt state.
#[derive(Debug, Clone, Default)]
pub struct CheckoutFlow {
    state: CheckoutState,
    method: String,
    last_error: Option<CheckoutError>,
}

impl CheckoutFlow {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn state(&self) -> &CheckoutState {
        &self.state
    }

    /// Error from the most recent failed attempt, cleared when a new one begins.
    #[must_use]
    pub const fn last_error(&self) -> Option<&CheckoutError> {
        self.last_error.as_ref()
    }

    /// The selected payment method label.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Select a payment method label (e.g. `efectivo`).
    pub fn select_method(&mut self, label: impl Into<String>) {
        self.method = label.into();
    }

    /// Whether the confirm control should be enabled.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        !self.is_in_flight() && !self.method.trim().is_empty()
    }

    const fn is_in_flight(&self) -> bool {
        matches!(
            self.state,
            CheckoutState::Validating | CheckoutState::Submitting { .. }
        )
    }

    /// Start a new attempt.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::AlreadySubmitting`] if an attempt is already
    /// in flight. The in-flight attempt is not affected.
    pub fn begin(&mut self) -> Result<(), CheckoutError> {
        if self.is_in_flight() {
            tracing::debug!(state = ?self.state, "Ignoring checkout while an attempt is in flight");
            return Err(CheckoutError::AlreadySubmitting);
        }
        self.last_error = None;
        self.state = CheckoutState::Validating;
        Ok(())
    }

    /// Check preconditions for the attempt started by [`begin`](Self::begin).
    ///
    /// On success the flow moves to `Submitting`; on failure it returns to
    /// `Idle` with the error recorded.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Validation`] if a precondition fails, or
    /// [`CheckoutError::AlreadySubmitting`] if called outside `Validating`.
    pub fn validate(
        &mut self,
        lines: &[CartLine],
        credential: Option<&Credential>,
    ) -> Result<Submission, CheckoutError> {
        if self.state != CheckoutState::Validating {
            return Err(CheckoutError::AlreadySubmitting);
        }

        match prepare(lines, &self.method, credential) {
            Ok((request, credential)) => {
                let attempt = Uuid::new_v4();
                self.state = CheckoutState::Submitting { attempt };
                Ok(Submission {
                    attempt,
                    request,
                    credential: credential.clone(),
                })
            }
            Err(e) => Err(self.fail(e.into())),
        }
    }

    /// Record the backend's answer for the in-flight attempt.
    ///
    /// # Errors
    ///
    /// Returns the mapped [`CheckoutError`] if the sale was not created, or
    /// [`CheckoutError::AlreadySubmitting`] if `attempt` is not the attempt
    /// in flight (the state is left unchanged in that case).
    pub fn complete(
        &mut self,
        attempt: Uuid,
        outcome: Result<SaleRecord, ApiError>,
    ) -> Result<SaleResult, CheckoutError> {
        if self.state != (CheckoutState::Submitting { attempt }) {
            tracing::warn!(%attempt, state = ?self.state, "Completion for an attempt that is not in flight");
            return Err(CheckoutError::AlreadySubmitting);
        }

        match conclude(outcome) {
            Ok(sale) => {
                self.state = CheckoutState::Succeeded {
                    sale: Box::new(sale.clone()),
                };
                Ok(sale)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Run one full attempt: begin, validate, send, complete.
    ///
    /// # Errors
    ///
    /// Returns the [`CheckoutError`] that ended the attempt.
    pub async fn confirm<A: SalesApi>(
        &mut self,
        api: &A,
        lines: &[CartLine],
        credential: Option<&Credential>,
    ) -> Result<SaleResult, CheckoutError> {
        self.begin()?;
        let submission = self.validate(lines, credential)?;

        let span = tracing::info_span!(
            "checkout",
            attempt = %submission.attempt,
            items = submission.request.items.len(),
            method = %submission.request.payment_method,
        );
        let outcome = api
            .create_sale_from_cart(&submission.request, &submission.credential)
            .instrument(span)
            .await;

        self.complete(submission.attempt, outcome)
    }

    fn fail(&mut self, err: CheckoutError) -> CheckoutError {
        self.state = CheckoutState::Idle;
        self.last_error = Some(err.clone());
        err
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use smartsales_core::{Price, SaleId};

    use super::*;
    use crate::checkout::ValidationError;
    use crate::checkout::testing::{FakeOutcome, FakeSalesApi, sale_record};

    fn lines() -> Vec<CartLine> {
        vec![CartLine {
            id: "5".to_string(),
            name: "Mouse".to_string(),
            unit_price: Price::from(25),
            image: None,
            quantity: 2,
        }]
    }

    fn token() -> Credential {
        Credential::parse("tok123").unwrap()
    }

    #[test]
    fn test_cannot_submit_without_method() {
        let mut flow = CheckoutFlow::new();
        assert!(!flow.can_submit());
        flow.select_method("efectivo");
        assert!(flow.can_submit());
    }

    #[test]
    fn test_second_begin_is_refused_while_in_flight() {
        let mut flow = CheckoutFlow::new();
        flow.select_method("efectivo");

        flow.begin().unwrap();
        assert_eq!(flow.begin(), Err(CheckoutError::AlreadySubmitting));

        let submission = flow.validate(&lines(), Some(&token())).unwrap();
        assert_eq!(
            flow.state(),
            &CheckoutState::Submitting {
                attempt: submission.attempt
            }
        );
        assert!(!flow.can_submit());
        assert_eq!(flow.begin(), Err(CheckoutError::AlreadySubmitting));

        // The refused attempt did not disturb the one in flight.
        let sale = flow
            .complete(submission.attempt, Ok(sale_record(10, "Completado")))
            .unwrap();
        assert_eq!(sale.id, Some(SaleId::new(10)));
        assert!(matches!(flow.state(), CheckoutState::Succeeded { .. }));
        assert!(flow.can_submit());
    }

    #[test]
    fn test_stale_completion_is_ignored() {
        let mut flow = CheckoutFlow::new();
        flow.select_method("efectivo");
        flow.begin().unwrap();
        let submission = flow.validate(&lines(), Some(&token())).unwrap();

        let stale = flow.complete(Uuid::new_v4(), Ok(sale_record(11, "Completado")));
        assert_eq!(stale, Err(CheckoutError::AlreadySubmitting));
        assert_eq!(
            flow.state(),
            &CheckoutState::Submitting {
                attempt: submission.attempt
            }
        );
    }

    #[tokio::test]
    async fn test_confirm_success() {
        let api = FakeSalesApi::new(FakeOutcome::Created(sale_record(10, "Completado")));
        let mut flow = CheckoutFlow::new();
        flow.select_method("efectivo");

        let sale = flow.confirm(&api, &lines(), Some(&token())).await.unwrap();

        assert_eq!(sale.status, "Completado");
        assert_eq!(
            flow.state(),
            &CheckoutState::Succeeded {
                sale: Box::new(sale)
            }
        );
        assert!(flow.last_error().is_none());
        assert_eq!(api.call_count(), 1);
    }

    #[test]
    fn test_unreadable_success_completes_the_sale() {
        let mut flow = CheckoutFlow::new();
        flow.select_method("efectivo");
        flow.begin().unwrap();
        let submission = flow.validate(&lines(), Some(&token())).unwrap();

        let outcome = Err(ApiError::UnreadableSuccess {
            status: 201,
            message: "missing field `total`".to_string(),
            body: r#"{"id": 1}"#.to_string(),
        });
        let sale = flow.complete(submission.attempt, outcome).unwrap();

        assert!(sale.partial);
        assert_eq!(sale.id, Some(SaleId::new(1)));
        assert_eq!(sale.total, None);
        assert!(matches!(flow.state(), CheckoutState::Succeeded { .. }));
        assert!(flow.last_error().is_none());
    }

    #[tokio::test]
    async fn test_validation_failure_returns_to_idle() {
        let api = FakeSalesApi::new(FakeOutcome::Created(sale_record(10, "Completado")));
        let mut flow = CheckoutFlow::new();
        flow.select_method("efectivo");

        let err = flow.confirm(&api, &lines(), None).await.unwrap_err();

        assert_eq!(err, CheckoutError::Validation(ValidationError::NotAuthenticated));
        assert_eq!(flow.state(), &CheckoutState::Idle);
        assert_eq!(flow.last_error(), Some(&err));
        assert_eq!(api.call_count(), 0);
    }

    #[tokio::test]
    async fn test_backend_failure_returns_to_idle_and_allows_retry() {
        let api = FakeSalesApi::new(FakeOutcome::Rejected(400, "Stock insuficiente"));
        let mut flow = CheckoutFlow::new();
        flow.select_method("efectivo");

        let err = flow.confirm(&api, &lines(), Some(&token())).await.unwrap_err();
        assert_eq!(err.user_message(), "Stock insuficiente");
        assert_eq!(flow.state(), &CheckoutState::Idle);
        assert!(flow.can_submit());

        // No automatic retry: a second request only happens on a second confirm.
        assert_eq!(api.call_count(), 1);
        flow.confirm(&api, &lines(), Some(&token())).await.unwrap_err();
        assert_eq!(api.call_count(), 2);
    }

    #[tokio::test]
    async fn test_new_attempt_after_success() {
        let api = FakeSalesApi::new(FakeOutcome::Created(sale_record(10, "Completado")));
        let mut flow = CheckoutFlow::new();
        flow.select_method("paypal");

        flow.confirm(&api, &lines(), Some(&token())).await.unwrap();
        flow.begin().unwrap();
        assert_eq!(flow.state(), &CheckoutState::Validating);
    }
}
