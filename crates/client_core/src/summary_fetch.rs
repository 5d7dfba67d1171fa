//! Race-safe summary lookups.
//!
//! Every request bumps a generation counter. A lookup result is handed to
//! its `deliver` callback only if no newer request was issued while it was in
//! flight; otherwise it is dropped on arrival. In-flight lookups are never
//! aborted.

use std::{
    panic::AssertUnwindSafe,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use futures::FutureExt;
use shared::domain::IssueKey;
use tokio::{runtime::Handle, task::JoinHandle};
use tracing::{debug, warn};

use crate::{error::TrackerClientError, tracker_client::IssueTrackerClient};

#[derive(Debug, Default)]
struct FetchState {
    generation: u64,
    in_flight_key: Option<IssueKey>,
}

pub struct SummaryFetchCoordinator {
    runtime: Handle,
    state: Arc<Mutex<FetchState>>,
}

impl SummaryFetchCoordinator {
    /// Lookups are spawned onto `runtime`; `request` itself never blocks.
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            state: Arc::new(Mutex::new(FetchState::default())),
        }
    }

    pub fn generation(&self) -> u64 {
        lock(&self.state).generation
    }

    pub fn in_flight_key(&self) -> Option<IssueKey> {
        lock(&self.state).in_flight_key.clone()
    }

    /// Issues a lookup for `key`, superseding any lookup still in flight.
    ///
    /// With an empty key or an unavailable tracker nothing is spawned:
    /// `deliver("")` runs before this returns and `None` is returned.
    /// Otherwise the spawned task's handle is returned. Failed lookups are
    /// delivered as an empty summary.
    ///
    /// `deliver` runs with the coordinator's lock held and must not call back
    /// into the coordinator.
    pub fn request<F>(
        &self,
        key: &IssueKey,
        lookup: &Arc<dyn IssueTrackerClient>,
        deliver: F,
    ) -> Option<JoinHandle<()>>
    where
        F: FnOnce(String) + Send + 'static,
    {
        self.request_with_pending(key, lookup, || {}, deliver)
    }

    /// Like [`request`](Self::request), but when a lookup is issued
    /// `on_pending` runs under the lock after older lookups were superseded
    /// and before the new result can be delivered. It is not called when
    /// the request short-circuits.
    pub fn request_with_pending<P, F>(
        &self,
        key: &IssueKey,
        lookup: &Arc<dyn IssueTrackerClient>,
        on_pending: P,
        deliver: F,
    ) -> Option<JoinHandle<()>>
    where
        P: FnOnce(),
        F: FnOnce(String) + Send + 'static,
    {
        let generation = {
            let mut state = lock(&self.state);
            state.generation += 1;
            if key.is_empty() || !lookup.is_available() {
                state.in_flight_key = None;
                None
            } else {
                state.in_flight_key = Some(key.clone());
                on_pending();
                Some(state.generation)
            }
        };

        let Some(generation) = generation else {
            deliver(String::new());
            return None;
        };

        let key = key.clone();
        let lookup = Arc::clone(lookup);
        let fetch_state = Arc::clone(&self.state);
        Some(self.runtime.spawn(async move {
            let summary = match AssertUnwindSafe(lookup.get_summary(&key))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| Err(TrackerClientError::LookupPanicked { key: key.clone() }))
            {
                Ok(summary) => summary,
                Err(err) => {
                    warn!(
                        issue = %key,
                        transient = err.is_transient(),
                        "summary lookup failed: {err}"
                    );
                    String::new()
                }
            };

            let mut state = lock(&fetch_state);
            if state.generation != generation {
                debug!(
                    issue = %key,
                    generation,
                    current = state.generation,
                    "dropping superseded summary"
                );
                return;
            }
            state.in_flight_key = None;
            deliver(summary);
        }))
    }
}

impl Drop for SummaryFetchCoordinator {
    fn drop(&mut self) {
        let mut state = lock(&self.state);
        state.generation += 1;
        state.in_flight_key = None;
    }
}

fn lock(state: &Mutex<FetchState>) -> MutexGuard<'_, FetchState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
#[path = "tests/summary_fetch_tests.rs"]
mod tests;
