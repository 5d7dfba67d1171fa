//! Test doubles shared by the session and coordinator tests.

use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use shared::{
    domain::IssueKey,
    error::{ApiError, ErrorCode},
};
use tokio::sync::oneshot;

use crate::{error::TrackerClientError, tracker_client::IssueTrackerClient};

/// Answers `summary of <KEY>`, optionally holding a key until its gate is
/// released or failing it outright.
#[derive(Default)]
pub struct ScriptedTracker {
    gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
    failing: HashSet<String>,
    calls: AtomicUsize,
}

impl ScriptedTracker {
    pub fn gated(self, key: &str) -> (Self, oneshot::Sender<()>) {
        let (release, gate) = oneshot::channel();
        self.gates
            .lock()
            .expect("gates")
            .insert(key.to_string(), gate);
        (self, release)
    }

    pub fn failing(mut self, key: &str) -> Self {
        self.failing.insert(key.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IssueTrackerClient for ScriptedTracker {
    async fn get_summary(&self, key: &IssueKey) -> Result<String, TrackerClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gates.lock().expect("gates").remove(key.as_str());
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        if self.failing.contains(key.as_str()) {
            return Err(TrackerClientError::Status {
                key: key.clone(),
                error: ApiError::new(ErrorCode::Internal, "tracker exploded"),
            });
        }
        Ok(format!("summary of {key}"))
    }

    fn issue_url(&self, key: &IssueKey) -> Option<String> {
        Some(format!("https://tracker.test/browse/{key}"))
    }
}

pub struct PanickingTracker;

#[async_trait]
impl IssueTrackerClient for PanickingTracker {
    async fn get_summary(&self, key: &IssueKey) -> Result<String, TrackerClientError> {
        panic!("lookup for {key} blew up");
    }

    fn issue_url(&self, _key: &IssueKey) -> Option<String> {
        None
    }
}

/// Records every delivery as `(label, text)`.
#[derive(Clone, Default)]
pub struct Deliveries(Arc<Mutex<Vec<(String, String)>>>);

impl Deliveries {
    pub fn sink(&self, label: &str) -> impl FnOnce(String) + Send + 'static {
        let deliveries = self.0.clone();
        let label = label.to_string();
        move |text| deliveries.lock().expect("deliveries").push((label, text))
    }

    pub fn take(&self) -> Vec<(String, String)> {
        std::mem::take(&mut *self.0.lock().expect("deliveries"))
    }
}

pub fn delivered(label: &str, text: &str) -> (String, String) {
    (label.to_string(), text.to_string())
}
