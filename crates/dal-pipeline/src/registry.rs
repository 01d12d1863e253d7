use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use dal_types::{Fingerprint, SubjectId};
use tokio::sync::watch;

use crate::error::ErrorKind;
use crate::state::SubmissionState;

#[derive(Default)]
struct RegistryState {
    in_flight: HashMap<SubjectId, watch::Receiver<SubmissionState>>,
    last: HashMap<SubjectId, SubmissionState>,
}

/// Per-subject single-flight registry.
///
/// At most one submission per subject holds a claim at a time. Claiming is
/// an atomic check-and-insert under the registry mutex; the claim is
/// released when its [`InFlightGuard`] drops.
#[derive(Default)]
pub struct InFlightRegistry {
    inner: Mutex<RegistryState>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `subject`, starting in `initial`. Returns `None` if another
    /// submission already holds it.
    pub fn try_claim(
        self: &Arc<Self>,
        subject: &SubjectId,
        initial: SubmissionState,
    ) -> Option<InFlightGuard> {
        let mut state = self.lock();
        if state.in_flight.contains_key(subject) {
            return None;
        }
        let (tx, rx) = watch::channel(initial);
        state.in_flight.insert(subject.clone(), rx);
        Some(InFlightGuard {
            registry: Arc::clone(self),
            subject: subject.clone(),
            tx,
            stored: OnceLock::new(),
        })
    }

    pub fn is_in_flight(&self, subject: &SubjectId) -> bool {
        self.lock().in_flight.contains_key(subject)
    }

    pub fn in_flight_count(&self) -> usize {
        self.lock().in_flight.len()
    }

    /// Current state of the in-flight submission, else the final state of
    /// the most recent one, else `Idle`.
    pub fn state(&self, subject: &SubjectId) -> SubmissionState {
        let state = self.lock();
        if let Some(rx) = state.in_flight.get(subject) {
            return rx.borrow().clone();
        }
        state
            .last
            .get(subject)
            .cloned()
            .unwrap_or(SubmissionState::Idle)
    }

    /// Follow the in-flight submission for `subject`, if there is one.
    pub fn watch(&self, subject: &SubjectId) -> Option<watch::Receiver<SubmissionState>> {
        self.lock().in_flight.get(subject).cloned()
    }

    /// Record the final state of a submission that never held a claim.
    /// Ignored while another submission for the subject is in flight.
    pub fn record_outcome(&self, subject: &SubjectId, outcome: SubmissionState) {
        let mut state = self.lock();
        if !state.in_flight.contains_key(subject) {
            state.last.insert(subject.clone(), outcome);
        }
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for InFlightRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InFlightRegistry")
            .field("in_flight", &self.in_flight_count())
            .finish()
    }
}

/// A held claim on a subject. Publishes state changes to watchers.
pub struct InFlightGuard {
    registry: Arc<InFlightRegistry>,
    subject: SubjectId,
    tx: watch::Sender<SubmissionState>,
    stored: OnceLock<Fingerprint>,
}

impl InFlightGuard {
    /// Note that the document is in the store. An abandoned submission
    /// reports this fingerprint in its `Failed` state.
    pub fn set_stored(&self, fingerprint: Fingerprint) {
        let _ = self.stored.set(fingerprint);
    }

    pub fn stored(&self) -> Option<&Fingerprint> {
        self.stored.get()
    }

    pub fn current(&self) -> SubmissionState {
        self.tx.borrow().clone()
    }

    /// Move to `next`. Out-of-order transitions are dropped and logged.
    pub fn advance(&self, next: SubmissionState) {
        let current = self.current();
        if !current.can_advance_to(&next) {
            tracing::error!(
                subject = %self.subject,
                from = current.name(),
                to = next.name(),
                "refusing out-of-order state transition"
            );
            return;
        }
        self.tx.send_replace(next);
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut last = self.current();
        if !last.is_terminal() {
            // Dropped mid-flight: the task was aborted or panicked.
            last = SubmissionState::Failed {
                kind: ErrorKind::Cancelled,
                message: format!("submission abandoned while {}", last.name()),
                fingerprint: self.stored.get().cloned(),
            };
            self.tx.send_replace(last.clone());
        }
        let mut state = self.registry.lock();
        state.in_flight.remove(&self.subject);
        state.last.insert(self.subject.clone(), last);
    }
}
