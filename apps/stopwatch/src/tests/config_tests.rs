use super::{apply_env, apply_file, load_settings, normalize_base_url, Settings};

use std::{
    collections::HashMap,
    env, fs,
    time::{SystemTime, UNIX_EPOCH},
};

fn temp_dir(tag: &str) -> std::path::PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let dir = env::temp_dir().join(format!("stopwatch_{tag}_{suffix}"));
    fs::create_dir_all(&dir).expect("temp dir");
    dir
}

#[test]
fn normalizes_base_url() {
    assert_eq!(
        normalize_base_url(" https://jira.example.com/ "),
        Some("https://jira.example.com".to_string())
    );
    assert_eq!(
        normalize_base_url("jira.example.com/jira"),
        Some("https://jira.example.com/jira".to_string())
    );
    assert_eq!(normalize_base_url("   "), None);
}

#[test]
fn file_values_override_defaults() {
    let mut settings = Settings::default();
    apply_file(
        &mut settings,
        r#"
jira_base_url = "https://jira.example.com"
jira_username = "alice"
log_filter = "debug"
"#,
    )
    .expect("parse");

    assert_eq!(
        settings.jira_base_url.as_deref(),
        Some("https://jira.example.com")
    );
    assert_eq!(settings.jira_username.as_deref(), Some("alice"));
    assert_eq!(settings.jira_api_token, None);
    assert_eq!(settings.log_filter, "debug");
}

#[test]
fn unknown_file_keys_are_rejected() {
    let mut settings = Settings::default();
    assert!(apply_file(&mut settings, "jira_url = \"x\"").is_err());
}

#[test]
fn environment_overrides_file_values() {
    let mut settings = Settings::default();
    apply_file(&mut settings, "jira_username = \"alice\"").expect("parse");

    let env: HashMap<&str, &str> = HashMap::from([
        ("STOPWATCH__JIRA_USERNAME", "bob"),
        ("STOPWATCH__JIRA_API_TOKEN", "token"),
        ("STOPWATCH__ISSUE_KEY", ""),
    ]);
    apply_env(&mut settings, |name| env.get(name).map(|v| v.to_string()));

    assert_eq!(settings.jira_username.as_deref(), Some("bob"));
    assert_eq!(settings.jira_api_token.as_deref(), Some("token"));
    assert_eq!(settings.issue_key, None);
}

#[test]
fn explicit_missing_file_is_an_error() {
    let dir = temp_dir("missing");
    let err = load_settings(Some(dir.join("absent.toml").as_path())).expect_err("must fail");
    assert!(err.to_string().contains("failed to read config file"));
    fs::remove_dir_all(dir).expect("cleanup");
}

#[test]
fn loads_and_normalizes_explicit_file() {
    let dir = temp_dir("explicit");
    let path = dir.join("stopwatch.toml");
    fs::write(
        &path,
        "jira_base_url = \"jira.example.com/\"\nissue_key = \"PROJ-3\"\n",
    )
    .expect("write config");

    let settings = load_settings(Some(path.as_path())).expect("load");
    if env::var("STOPWATCH__JIRA_BASE_URL").is_err() {
        assert_eq!(
            settings.jira_base_url.as_deref(),
            Some("https://jira.example.com")
        );
    }
    if env::var("STOPWATCH__ISSUE_KEY").is_err() {
        assert_eq!(settings.issue_key.as_deref(), Some("PROJ-3"));
    }

    fs::remove_dir_all(dir).expect("cleanup");
}

#[test]
fn malformed_file_reports_its_path() {
    let dir = temp_dir("malformed");
    let path = dir.join("broken.toml");
    fs::write(&path, "jira_base_url = [").expect("write config");

    let err = load_settings(Some(path.as_path())).expect_err("must fail");
    assert!(err.to_string().contains("broken.toml"), "unexpected: {err}");

    fs::remove_dir_all(dir).expect("cleanup");
}
