pub mod error;
pub mod issue_session;
pub mod summary_fetch;
pub mod tracker_client;
pub mod watch_timer;

pub use error::TrackerClientError;
pub use issue_session::{DisplaySnapshot, IssueSession, SessionEvent};
pub use summary_fetch::SummaryFetchCoordinator;
pub use tracker_client::{IssueTrackerClient, JiraClient, JiraCredentials, MissingIssueTracker};
pub use watch_timer::{format_elapsed, WatchTimer};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
