use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "stopwatch.toml";
const ENV_PREFIX: &str = "STOPWATCH__";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub jira_base_url: Option<String>,
    pub jira_username: Option<String>,
    pub jira_api_token: Option<String>,
    pub issue_key: Option<String>,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            jira_base_url: None,
            jira_username: None,
            jira_api_token: None,
            issue_key: None,
            log_filter: "info".into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    jira_base_url: Option<String>,
    jira_username: Option<String>,
    jira_api_token: Option<String>,
    issue_key: Option<String>,
    log_filter: Option<String>,
}

/// Defaults, then the settings file, then `STOPWATCH__*` environment
/// variables. An explicitly passed file must exist; the default one may not.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let (path, required) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };

    let mut settings = Settings::default();
    match fs::read_to_string(&path) {
        Ok(raw) => apply_file(&mut settings, &raw)
            .with_context(|| format!("failed to parse config file '{}'", path.display()))?,
        Err(err) if !required && err.kind() == ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read config file '{}'", path.display()))
        }
    }

    apply_env(&mut settings, |name| std::env::var(name).ok());
    settings.jira_base_url = settings
        .jira_base_url
        .as_deref()
        .and_then(normalize_base_url);
    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileSettings = toml::from_str(raw)?;
    if let Some(v) = file_cfg.jira_base_url {
        settings.jira_base_url = Some(v);
    }
    if let Some(v) = file_cfg.jira_username {
        settings.jira_username = Some(v);
    }
    if let Some(v) = file_cfg.jira_api_token {
        settings.jira_api_token = Some(v);
    }
    if let Some(v) = file_cfg.issue_key {
        settings.issue_key = Some(v);
    }
    if let Some(v) = file_cfg.log_filter {
        settings.log_filter = v;
    }
    Ok(())
}

fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}")).filter(|v| !v.is_empty());

    if let Some(v) = var("JIRA_BASE_URL") {
        settings.jira_base_url = Some(v);
    }
    if let Some(v) = var("JIRA_USERNAME") {
        settings.jira_username = Some(v);
    }
    if let Some(v) = var("JIRA_API_TOKEN") {
        settings.jira_api_token = Some(v);
    }
    if let Some(v) = var("ISSUE_KEY") {
        settings.issue_key = Some(v);
    }
    if let Some(v) = var("LOG_FILTER") {
        settings.log_filter = v;
    }
}

/// Trims the configured Jira location and assumes https when no scheme is
/// given. Blank values mean "no tracker".
pub fn normalize_base_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.contains("://") {
        Some(trimmed.to_string())
    } else {
        Some(format!("https://{trimmed}"))
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
