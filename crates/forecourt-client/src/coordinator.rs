//! # Submission Coordinator
//!
//! Validates the form, sends it, and tracks the submit button's state.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   ┌──────┐  submit()   ┌────────────┐  done   ┌──────────────────────┐  │
//! │   │ Idle │ ──────────► │ Submitting │ ──────► │ Finished(outcome)    │  │
//! │   └──────┘             └────────────┘         └──────────┬───────────┘  │
//! │      ▲                   │  submit() here               │              │
//! │      │                   └─► AlreadySubmitting          │              │
//! │      │                                                   │              │
//! │      └──────────── display time elapsed, or reset() ─────┘              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A validation failure goes straight to `Finished(Failed)` without a request.
//! If the submit future is dropped mid-flight the state falls back to `Idle`.

use chrono::Local;
use futures_util::future::join_all;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use forecourt_core::EntryPayload;

use crate::config::SubmitStrategy;
use crate::controller::FormState;
use crate::error::{ClientError, ClientResult};
use crate::http::ApiClient;
use crate::notice::{Notice, NoticeLog};

/// Success notice text.
pub const SUBMITTED: &str = "Sales & Collections submitted successfully";

// =============================================================================
// State Types
// =============================================================================

/// What one accepted submission sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    /// Key of the attempt. Split requests append a per-part suffix.
    pub idempotency_key: String,
    pub strategy: SubmitStrategy,
    /// Number of HTTP requests issued.
    pub requests: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Succeeded(SubmissionReceipt),
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    Submitting,
    Finished(SubmissionOutcome),
}

#[derive(Debug)]
struct Inner {
    state: SubmissionState,
    finished_at: Option<Instant>,
}

impl Inner {
    /// Drops a finished outcome whose display time is over.
    fn collapse(&mut self, display: Duration) {
        if let (SubmissionState::Finished(_), Some(at)) = (&self.state, self.finished_at) {
            if at.elapsed() >= display {
                self.state = SubmissionState::Idle;
                self.finished_at = None;
            }
        }
    }
}

/// Resets `Submitting` to `Idle` if dropped before `finish`.
struct InFlight<'a> {
    inner: &'a Mutex<Inner>,
    done: bool,
}

impl InFlight<'_> {
    fn finish(mut self, outcome: SubmissionOutcome) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.state = SubmissionState::Finished(outcome);
        inner.finished_at = Some(Instant::now());
        self.done = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if inner.state == SubmissionState::Submitting {
            warn!("Submission abandoned before completion");
            inner.state = SubmissionState::Idle;
        }
    }
}

// =============================================================================
// Coordinator
// =============================================================================

#[derive(Debug, Clone)]
pub struct SubmissionCoordinator {
    api: ApiClient,
    form: FormState,
    notices: NoticeLog,
    strategy: SubmitStrategy,
    display: Duration,
    inner: Arc<Mutex<Inner>>,
}

impl SubmissionCoordinator {
    pub fn new(
        api: ApiClient,
        form: FormState,
        notices: NoticeLog,
        strategy: SubmitStrategy,
        display: Duration,
    ) -> Self {
        SubmissionCoordinator {
            api,
            form,
            notices,
            strategy,
            display,
            inner: Arc::new(Mutex::new(Inner {
                state: SubmissionState::Idle,
                finished_at: None,
            })),
        }
    }

    pub fn strategy(&self) -> SubmitStrategy {
        self.strategy
    }

    /// Current state. A finished outcome reads as `Idle` once its display
    /// time has passed.
    pub fn state(&self) -> SubmissionState {
        let mut inner = self.lock();
        inner.collapse(self.display);
        inner.state.clone()
    }

    pub fn is_submitting(&self) -> bool {
        self.state() == SubmissionState::Submitting
    }

    /// Clears a finished outcome. Has no effect while submitting.
    pub fn reset(&self) {
        let mut inner = self.lock();
        if matches!(inner.state, SubmissionState::Finished(_)) {
            inner.state = SubmissionState::Idle;
            inner.finished_at = None;
        }
    }

    /// Validates and sends the form.
    ///
    /// On success the form is cleared. On failure it is left as it was and a
    /// notice carries the reason.
    pub async fn submit(&self) -> ClientResult<SubmissionReceipt> {
        let in_flight = self.begin()?;

        let payload = match self.form.with_form(EntryPayload::from_form) {
            Ok(payload) => payload,
            Err(e) => {
                debug!(rule = %e, "Submission blocked by validation");
                return Err(self.fail(in_flight, e.into()));
            }
        };

        let key = Uuid::new_v4().to_string();
        info!(
            strategy = %self.strategy,
            rows = payload.entry_sale_data.products.len(),
            idempotency_key = %key,
            "Submitting entry"
        );

        let sent = match self.strategy {
            SubmitStrategy::Combined => self.api.post_entry(&payload, &key).await.map(|()| 1),
            SubmitStrategy::Split => self.dispatch_split(&payload, &key).await,
        };

        match sent {
            Ok(requests) => {
                self.form
                    .with_form_mut(|form| form.reset(Local::now().naive_local()));
                self.notices.push(Notice::success(SUBMITTED));
                let receipt = SubmissionReceipt {
                    idempotency_key: key,
                    strategy: self.strategy,
                    requests,
                };
                info!(requests, "Entry submitted");
                in_flight.finish(SubmissionOutcome::Succeeded(receipt.clone()));
                Ok(receipt)
            }
            Err(e) => {
                warn!(error = %e, "Submission failed");
                Err(self.fail(in_flight, e))
            }
        }
    }

    fn begin(&self) -> ClientResult<InFlight<'_>> {
        let mut inner = self.lock();
        inner.collapse(self.display);
        if inner.state == SubmissionState::Submitting {
            warn!("Submit ignored, previous submission still running");
            return Err(ClientError::AlreadySubmitting);
        }
        inner.state = SubmissionState::Submitting;
        inner.finished_at = None;

        Ok(InFlight {
            inner: &self.inner,
            done: false,
        })
    }

    fn fail(&self, in_flight: InFlight<'_>, error: ClientError) -> ClientError {
        let message = error.submission_message();
        self.notices.push(Notice::error(message.clone()));
        in_flight.finish(SubmissionOutcome::Failed { message });
        error
    }

    /// Sends the three record kinds concurrently. Returns the request count.
    async fn dispatch_split(&self, payload: &EntryPayload, key: &str) -> ClientResult<usize> {
        let sales_key = format!("{key}-sales");
        let collections_key = format!("{key}-collections");

        let inventory = join_all(payload.inventory_data.iter().map(|record| {
            let part_key = format!("{}-inventory-{}", key, record.product_id);
            async move { self.api.post_inventory(record, &part_key).await }
        }));

        let (sales, collections, inventory) = tokio::join!(
            self.api.post_sales(&payload.entry_sale_data, &sales_key),
            self.api.post_collections(&payload.entry_collection_data, &collections_key),
            inventory
        );

        let mut results = vec![
            ("/sales".to_string(), sales),
            ("/collections".to_string(), collections),
        ];
        results.extend(
            payload
                .inventory_data
                .iter()
                .zip(inventory)
                .map(|(record, result)| (format!("/inventory ({})", record.product_id), result)),
        );
        settle_split(results)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Folds split results: all ok, all failed (first error), or a partial failure.
fn settle_split(results: Vec<(String, ClientResult<()>)>) -> ClientResult<usize> {
    let total = results.len();
    let mut succeeded = Vec::new();
    let mut failures = Vec::new();

    for (endpoint, result) in results {
        match result {
            Ok(()) => succeeded.push(endpoint),
            Err(e) => failures.push((endpoint, e)),
        }
    }

    if failures.is_empty() {
        return Ok(total);
    }

    let message = failures
        .iter()
        .find_map(|(_, e)| e.backend_message().map(str::to_string));
    let failed: Vec<String> = failures.iter().map(|(endpoint, _)| endpoint.clone()).collect();

    if succeeded.is_empty() {
        warn!(failed = ?failed, "Every split request failed");
        return Err(failures.swap_remove(0).1);
    }

    warn!(failed = ?failed, succeeded = ?succeeded, "Split submission partly failed");
    Err(ClientError::PartialFailure {
        failed,
        succeeded,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use forecourt_core::{FormPolicy, SalesForm, ValidationError};

    fn coordinator() -> SubmissionCoordinator {
        let config = ClientConfig::default();
        let api = ApiClient::new(&config).unwrap();
        let now = Local::now().naive_local();
        let form = FormState::new(SalesForm::new(FormPolicy::default(), now));
        SubmissionCoordinator::new(
            api,
            form,
            NoticeLog::new(),
            SubmitStrategy::Combined,
            Duration::from_secs(3),
        )
    }

    fn rejected(message: &str) -> ClientError {
        ClientError::Rejected {
            status: 400,
            message: message.to_string(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_validation_failure_finishes_without_request() {
        let coordinator = coordinator();

        let err = coordinator.submit().await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(ValidationError::EmployeeRequired)));
        assert_eq!(
            coordinator.state(),
            SubmissionState::Finished(SubmissionOutcome::Failed {
                message: "Please select employee".into()
            })
        );

        let notices = coordinator.notices.drain();
        assert_eq!(notices, vec![Notice::error("Please select employee")]);

        tokio::time::advance(Duration::from_secs(3)).await;
        assert_eq!(coordinator.state(), SubmissionState::Idle);
    }

    #[tokio::test]
    async fn test_second_submit_rejected_while_in_flight() {
        let coordinator = coordinator();
        let in_flight = coordinator.begin().unwrap();

        assert!(coordinator.is_submitting());
        assert!(matches!(
            coordinator.submit().await,
            Err(ClientError::AlreadySubmitting)
        ));
        assert!(coordinator.notices.drain().is_empty());

        drop(in_flight);
        assert_eq!(coordinator.state(), SubmissionState::Idle);
    }

    #[tokio::test]
    async fn test_reset_clears_finished_outcome() {
        let coordinator = coordinator();
        let _ = coordinator.submit().await;
        assert!(matches!(coordinator.state(), SubmissionState::Finished(_)));

        coordinator.reset();
        assert_eq!(coordinator.state(), SubmissionState::Idle);
    }

    #[test]
    fn test_settle_split_all_ok() {
        let results = vec![("/sales".to_string(), Ok(())), ("/collections".to_string(), Ok(()))];
        assert_eq!(settle_split(results).unwrap(), 2);
    }

    #[test]
    fn test_settle_split_partial() {
        let results = vec![
            ("/sales".to_string(), Ok(())),
            ("/collections".to_string(), Ok(())),
            ("/inventory (3)".to_string(), Err(rejected("Insufficient stock"))),
        ];
        match settle_split(results).unwrap_err() {
            ClientError::PartialFailure {
                failed,
                succeeded,
                message,
            } => {
                assert_eq!(failed, vec!["/inventory (3)"]);
                assert_eq!(succeeded, vec!["/sales", "/collections"]);
                assert_eq!(message.as_deref(), Some("Insufficient stock"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_settle_split_total_failure_returns_first_error() {
        let results = vec![
            ("/sales".to_string(), Err(rejected("Duplicate entry"))),
            ("/collections".to_string(), Err(rejected("other"))),
        ];
        let err = settle_split(results).unwrap_err();
        assert_eq!(err.backend_message(), Some("Duplicate entry"));
    }
}
