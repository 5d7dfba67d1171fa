use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use shared::domain::{IssueKey, SessionId};
use tokio::{
    runtime::Handle,
    sync::{broadcast, watch},
    task::JoinHandle,
};
use tracing::{debug, info};

use crate::{
    summary_fetch::SummaryFetchCoordinator,
    tracker_client::{IssueTrackerClient, MissingIssueTracker},
    watch_timer::{format_elapsed, WatchTimer},
};

const SESSION_EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    TimerStarted {
        session_id: SessionId,
        key: IssueKey,
        started_at: DateTime<Utc>,
    },
    SummaryUpdated {
        session_id: SessionId,
        key: IssueKey,
        summary: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplaySnapshot {
    pub running: bool,
    pub elapsed: Duration,
    pub formatted_elapsed: String,
}

impl DisplaySnapshot {
    /// Label of the control that flips the timer.
    pub fn action_label(&self) -> &'static str {
        if self.running {
            "Pause"
        } else {
            "Start"
        }
    }
}

/// Receiving end of summary deliveries; cloned into each lookup callback.
#[derive(Clone)]
struct SummarySink {
    session_id: SessionId,
    summary: Arc<watch::Sender<String>>,
    events: broadcast::Sender<SessionEvent>,
}

impl SummarySink {
    fn on_summary_delivered(&self, key: IssueKey, text: String) {
        self.summary.send_replace(text.clone());
        let _ = self.events.send(SessionEvent::SummaryUpdated {
            session_id: self.session_id,
            key,
            summary: text,
        });
    }

    /// Blanks a summary that belongs to a superseded lookup.
    fn clear(&self, key: IssueKey) {
        if self.summary.send_if_modified(|current| {
            let changed = !current.is_empty();
            current.clear();
            changed
        }) {
            let _ = self.events.send(SessionEvent::SummaryUpdated {
                session_id: self.session_id,
                key,
                summary: String::new(),
            });
        }
    }
}

pub struct IssueSession {
    id: SessionId,
    item_key: IssueKey,
    timer: WatchTimer,
    fetcher: SummaryFetchCoordinator,
    tracker: Arc<dyn IssueTrackerClient>,
    sink: SummarySink,
}

impl IssueSession {
    pub fn new(runtime: Handle, tracker: Arc<dyn IssueTrackerClient>) -> Self {
        let id = SessionId::new();
        let (summary, _) = watch::channel(String::new());
        let (events, _) = broadcast::channel(SESSION_EVENT_CAPACITY);
        Self {
            id,
            item_key: IssueKey::empty(),
            timer: WatchTimer::new(),
            fetcher: SummaryFetchCoordinator::new(runtime),
            tracker,
            sink: SummarySink {
                session_id: id,
                summary: Arc::new(summary),
                events,
            },
        }
    }

    pub fn without_tracker(runtime: Handle) -> Self {
        Self::new(runtime, Arc::new(MissingIssueTracker))
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn key(&self) -> &IssueKey {
        &self.item_key
    }

    /// Replaces the tracked key and refetches its summary. Setting the
    /// current key again refreshes it.
    pub fn set_key(&mut self, key: impl Into<IssueKey>) -> Option<JoinHandle<()>> {
        let key = key.into();
        if key != self.item_key {
            debug!(session = %self.id, from = %self.item_key, to = %key, "issue key changed");
            self.item_key = key;
        }
        self.refresh_summary()
    }

    /// Re-runs the lookup for the current key. The previous summary is
    /// blanked while the lookup is pending.
    pub fn refresh_summary(&self) -> Option<JoinHandle<()>> {
        let sink = self.sink.clone();
        let key = self.item_key.clone();
        self.fetcher.request_with_pending(
            &self.item_key,
            &self.tracker,
            || self.sink.clear(self.item_key.clone()),
            move |text| sink.on_summary_delivered(key, text),
        )
    }

    /// Starts tracking. Returns `true` and raises
    /// [`SessionEvent::TimerStarted`] only on the stopped-to-running edge; a
    /// session without a key never starts.
    pub fn start(&mut self) -> bool {
        if self.item_key.is_empty() {
            debug!(session = %self.id, "ignoring start without an issue key");
            return false;
        }
        if !self.timer.start() {
            return false;
        }

        info!(session = %self.id, issue = %self.item_key, "timer started");
        let _ = self.sink.events.send(SessionEvent::TimerStarted {
            session_id: self.id,
            key: self.item_key.clone(),
            started_at: Utc::now(),
        });
        true
    }

    pub fn pause(&mut self) -> bool {
        let paused = self.timer.pause();
        if paused {
            info!(
                session = %self.id,
                issue = %self.item_key,
                elapsed = %format_elapsed(self.timer.elapsed()),
                "timer paused"
            );
        }
        paused
    }

    /// Starts a stopped timer or pauses a running one; returns whether the
    /// timer is running afterwards.
    pub fn toggle(&mut self) -> bool {
        if self.timer.is_running() {
            self.pause();
        } else {
            self.start();
        }
        self.timer.is_running()
    }

    pub fn reset(&mut self) {
        self.timer.reset();
        info!(session = %self.id, issue = %self.item_key, "timer reset");
    }

    pub fn display_snapshot(&self) -> DisplaySnapshot {
        let elapsed = self.timer.elapsed();
        DisplaySnapshot {
            running: self.timer.is_running(),
            elapsed,
            formatted_elapsed: format_elapsed(elapsed),
        }
    }

    pub fn summary(&self) -> String {
        self.sink.summary.borrow().clone()
    }

    pub fn watch_summary(&self) -> watch::Receiver<String> {
        self.sink.summary.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.sink.events.subscribe()
    }

    /// Where the UI should point a browser for the current key.
    pub fn browse_url(&self) -> Option<String> {
        if self.item_key.is_empty() || !self.tracker.is_available() {
            return None;
        }
        self.tracker.issue_url(&self.item_key)
    }
}

#[cfg(test)]
#[path = "tests/issue_session_tests.rs"]
mod tests;
