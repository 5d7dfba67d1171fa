//! Elapsed-time accounting for one tracked item.

use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone, Default)]
pub struct WatchTimer {
    accumulated: Duration,
    running_since: Option<Instant>,
}

impl WatchTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` on the `Stopped -> Running` edge, `false` if already running.
    pub fn start(&mut self) -> bool {
        if self.running_since.is_some() {
            return false;
        }
        self.running_since = Some(Instant::now());
        true
    }

    /// Returns `true` on the `Running -> Stopped` edge, `false` if already stopped.
    pub fn pause(&mut self) -> bool {
        match self.running_since.take() {
            Some(since) => {
                self.accumulated += since.elapsed();
                true
            }
            None => false,
        }
    }

    pub fn reset(&mut self) {
        self.accumulated = Duration::ZERO;
        self.running_since = None;
    }

    pub fn elapsed(&self) -> Duration {
        let current = self
            .running_since
            .map_or(Duration::ZERO, |since| since.elapsed());
        self.accumulated + current
    }

    pub fn is_running(&self) -> bool {
        self.running_since.is_some()
    }
}

/// Renders a duration the way Jira worklogs spell it: `"<H>h <M>m"` once at
/// least one whole hour has passed, otherwise `"<M>m"`. Seconds are dropped.
pub fn format_elapsed(elapsed: Duration) -> String {
    let total_secs = elapsed.as_secs();
    let hours = total_secs / 3600;
    if hours > 0 {
        let minutes = (total_secs % 3600) / 60;
        format!("{hours}h {minutes}m")
    } else {
        format!("{}m", total_secs / 60)
    }
}

#[cfg(test)]
#[path = "tests/watch_timer_tests.rs"]
mod tests;
