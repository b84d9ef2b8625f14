// Verification orchestrator — owns the submission lifecycle and the history.
//
// State and history live behind one RwLock so they always change together.
// The lock is never held across the service call: submit test-and-sets
// InFlight, releases the lock, and re-takes it to apply the outcome.
//
// The service call runs in its own tokio task, watched by a second task
// that applies the outcome. Dropping a submit future does not cancel the
// request, and a panicking classifier still moves the session to Errored,
// so the session can never get stuck in InFlight.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{watch, RwLock};
use tracing::{debug, error, info, warn};

use super::error::VerifyError;
use super::models::{
    History, SessionSnapshot, SubmissionState, VerificationRequest, VerificationResult,
};
use super::validator::ValidatedUrl;
use crate::classifier::traits::Classifier;

/// What happened to an accepted submission.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The service classified the URL and the result was added to history.
    Completed(VerificationResult),
    /// Another check was already in flight; nothing was sent.
    Ignored,
}

#[derive(Default)]
struct Session {
    state: SubmissionState,
    history: History,
    last_error: Option<VerifyError>,
}

impl Session {
    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            history: self.history.clone(),
            last_error: self.last_error.clone(),
        }
    }
}

struct Shared {
    session: RwLock<Session>,
    updates: watch::Sender<SessionSnapshot>,
}

impl Shared {
    /// Push the current session to subscribers. Call with the write lock held
    /// so snapshots are published in transition order.
    fn publish(&self, session: &Session) {
        self.updates.send_replace(session.snapshot());
    }

    fn apply_success(&self, session: &mut Session, result: VerificationResult) {
        session.history.prepend(result);
        session.state = SubmissionState::Idle;
        session.last_error = None;
        self.publish(session);
    }

    fn apply_failure(&self, session: &mut Session, error: VerifyError) {
        session.state = SubmissionState::Errored;
        session.last_error = Some(error);
        self.publish(session);
    }
}

/// Drives URL checks for one session.
///
/// At most one check is in flight at a time. Submissions made while one is
/// outstanding are ignored rather than queued.
pub struct Orchestrator {
    classifier: Arc<dyn Classifier>,
    shared: Arc<Shared>,
}

impl Orchestrator {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        let (updates, _) = watch::channel(SessionSnapshot::default());
        Self {
            classifier,
            shared: Arc::new(Shared {
                session: RwLock::new(Session::default()),
                updates,
            }),
        }
    }

    /// Validate raw user input and submit it.
    ///
    /// Blank input returns `EmptyInput` without touching the session or
    /// calling the service.
    pub async fn submit_raw(&self, raw_input: &str) -> Result<SubmitOutcome, VerifyError> {
        self.submit_request(&VerificationRequest::new(raw_input)).await
    }

    /// Validate a request and submit it.
    pub async fn submit_request(
        &self,
        request: &VerificationRequest,
    ) -> Result<SubmitOutcome, VerifyError> {
        let url = match request.validate() {
            Ok(url) => url,
            Err(e) => {
                debug!("Ignoring blank submission");
                return Err(e);
            }
        };
        self.submit(url).await
    }

    /// Send `url` to the classification service.
    ///
    /// Returns `Ignored` if a check is already in flight. On success the
    /// result is prepended to history and returned; on failure the session
    /// moves to `Errored` and the error is returned. Either way the session
    /// accepts the next submission afterwards.
    pub async fn submit(&self, url: ValidatedUrl) -> Result<SubmitOutcome, VerifyError> {
        {
            let mut session = self.shared.session.write().await;
            if !session.state.accepts_submissions() {
                debug!(url = %url, "Check already in flight, ignoring submission");
                return Ok(SubmitOutcome::Ignored);
            }
            session.state = SubmissionState::InFlight;
            session.last_error = None;
            self.shared.publish(&session);
        }

        let classifier = Arc::clone(&self.classifier);
        let shared = Arc::clone(&self.shared);

        // The classifier runs in its own task so a panic in it surfaces as a
        // JoinError here, inside the task that owns the outcome, even when the
        // caller is gone.
        let task = tokio::spawn(async move {
            let request_url = url.as_str().to_string();
            let call = tokio::spawn(async move { classifier.classify(&request_url).await });

            let response = match call.await {
                Ok(response) => response,
                Err(join_error) => {
                    error!(url = %url, error = %join_error, "Classification task aborted");
                    Err(VerifyError::ServiceUnavailable(
                        "classification task aborted".to_string(),
                    ))
                }
            };
            let completed_at = Utc::now();

            let mut session = shared.session.write().await;
            match response {
                Ok(response) => {
                    let result =
                        VerificationResult::from_response(url.into_inner(), response, completed_at);
                    info!(
                        url = result.url(),
                        risk_level = %result.risk_level(),
                        details = result.details().len(),
                        "URL checked"
                    );
                    shared.apply_success(&mut session, result.clone());
                    Ok(SubmitOutcome::Completed(result))
                }
                Err(e) => {
                    warn!(url = %url, kind = e.kind(), error = %e, "URL check failed");
                    shared.apply_failure(&mut session, e.clone());
                    Err(e)
                }
            }
        });

        match task.await {
            Ok(outcome) => outcome,
            Err(join_error) => {
                // Only reachable if the runtime cancelled the outcome task.
                error!(error = %join_error, "Verification task aborted");
                let e = VerifyError::ServiceUnavailable("verification task aborted".to_string());
                let mut session = self.shared.session.write().await;
                if session.state == SubmissionState::InFlight {
                    self.shared.apply_failure(&mut session, e.clone());
                }
                Err(e)
            }
        }
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> SubmissionState {
        self.shared.session.read().await.state
    }

    /// A copy of the history, newest first.
    pub async fn history(&self) -> History {
        self.shared.session.read().await.history.clone()
    }

    /// A consistent copy of state, history and last error.
    pub async fn snapshot(&self) -> SessionSnapshot {
        self.shared.session.read().await.snapshot()
    }

    /// Receive a fresh snapshot after every state transition.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.shared.updates.subscribe()
    }
}
