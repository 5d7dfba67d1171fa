//! Terminal commands and status rendering for the stopwatch front end.

use client_core::DisplaySnapshot;
use shared::domain::IssueKey;

pub const HELP: &str = "commands: key <ISSUE> | start | pause | toggle | reset | show | refresh | open | help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SetKey(String),
    Start,
    Pause,
    Toggle,
    Reset,
    Show,
    Refresh,
    Open,
    Help,
    Quit,
    Unknown(String),
}

impl Command {
    /// `None` for blank input.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(word, rest)| (word, rest.trim()));

        let command = match word.to_ascii_lowercase().as_str() {
            "key" | "issue" => Self::SetKey(rest.to_string()),
            "start" => Self::Start,
            "pause" | "stop" => Self::Pause,
            "toggle" | "t" => Self::Toggle,
            "reset" => Self::Reset,
            "show" | "status" | "s" => Self::Show,
            "refresh" => Self::Refresh,
            "open" => Self::Open,
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            _ => Self::Unknown(line.to_string()),
        };
        Some(command)
    }
}

pub fn render_status(key: &IssueKey, snapshot: &DisplaySnapshot, summary: &str) -> String {
    let key = if key.is_empty() { "-" } else { key.as_str() };
    let state = if snapshot.running { "running" } else { "stopped" };
    let mut line = format!(
        "{key:<12} {:>8}  [{state}; {}]",
        snapshot.formatted_elapsed,
        snapshot.action_label().to_ascii_lowercase()
    );
    if !summary.is_empty() {
        line.push_str("  ");
        line.push_str(summary);
    }
    line
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn parses_commands_case_insensitively() {
        assert_eq!(Command::parse("  START "), Some(Command::Start));
        assert_eq!(Command::parse("q"), Some(Command::Quit));
        assert_eq!(Command::parse(""), None);
        assert_eq!(
            Command::parse("frobnicate now"),
            Some(Command::Unknown("frobnicate now".to_string()))
        );
    }

    #[test]
    fn key_command_keeps_argument() {
        assert_eq!(
            Command::parse("key   PROJ-12  "),
            Some(Command::SetKey("PROJ-12".to_string()))
        );
        assert_eq!(Command::parse("key"), Some(Command::SetKey(String::new())));
    }

    #[test]
    fn renders_running_status_with_summary() {
        let snapshot = DisplaySnapshot {
            running: true,
            elapsed: Duration::from_secs(3725),
            formatted_elapsed: "1h 2m".to_string(),
        };
        let line = render_status(&IssueKey::new("PROJ-1"), &snapshot, "Fix login");
        assert_eq!(line, "PROJ-1          1h 2m  [running; pause]  Fix login");
    }

    #[test]
    fn renders_placeholder_for_missing_key() {
        let snapshot = DisplaySnapshot {
            running: false,
            elapsed: Duration::ZERO,
            formatted_elapsed: "0m".to_string(),
        };
        assert_eq!(
            render_status(&IssueKey::empty(), &snapshot, ""),
            "-                  0m  [stopped; start]"
        );
    }
}
