use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{
    IssueSession, IssueTrackerClient, JiraClient, JiraCredentials, MissingIssueTracker,
    SessionEvent,
};
use futures::StreamExt;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    runtime::Handle,
};
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod command;
mod config;

use command::{render_status, Command, HELP};
use config::{load_settings, normalize_base_url, Settings};

#[derive(Parser, Debug)]
struct Args {
    /// Settings file; defaults to ./stopwatch.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Issue to track on startup.
    #[arg(long)]
    issue: Option<String>,
    /// Jira base URL, overriding the settings file.
    #[arg(long)]
    jira_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut settings = load_settings(args.config.as_deref())?;
    if let Some(url) = args.jira_url.as_deref() {
        settings.jira_base_url = normalize_base_url(url);
    }

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_filter))
        .context("invalid log filter")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let tracker = build_tracker(&settings)?;
    let mut session = IssueSession::new(Handle::current(), tracker);
    spawn_event_printer(&session);

    if let Some(key) = args.issue.or_else(|| settings.issue_key.clone()) {
        session.set_key(key);
    }

    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        let Some(command) = Command::parse(&line) else {
            continue;
        };
        if !run_command(&mut session, command) {
            break;
        }
    }

    session.pause();
    let snapshot = session.display_snapshot();
    info!(issue = %session.key(), elapsed = %snapshot.formatted_elapsed, "exiting");
    Ok(())
}

fn build_tracker(settings: &Settings) -> Result<Arc<dyn IssueTrackerClient>> {
    let Some(base_url) = settings.jira_base_url.as_deref() else {
        warn!("no Jira base URL configured; issue summaries are disabled");
        return Ok(Arc::new(MissingIssueTracker));
    };

    let credentials = match (&settings.jira_username, &settings.jira_api_token) {
        (Some(username), Some(api_token)) => Some(JiraCredentials {
            username: username.clone(),
            api_token: api_token.clone(),
        }),
        (None, None) => None,
        _ => {
            warn!("jira_username and jira_api_token must be set together; sending anonymous requests");
            None
        }
    };

    let client = JiraClient::new(base_url, credentials)
        .with_context(|| format!("invalid Jira base URL '{base_url}'"))?;
    info!(base_url = %client.base_url(), "using Jira issue tracker");
    Ok(Arc::new(client))
}

fn spawn_event_printer(session: &IssueSession) {
    let mut events = BroadcastStream::new(session.subscribe_events());
    tokio::spawn(async move {
        while let Some(event) = events.next().await {
            match event {
                Ok(SessionEvent::TimerStarted {
                    key, started_at, ..
                }) => {
                    println!("started {key} at {}", started_at.format("%H:%M:%S"));
                }
                Ok(SessionEvent::SummaryUpdated { key, summary, .. }) => {
                    if !summary.is_empty() {
                        println!("{key}: {summary}");
                    }
                }
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    warn!(skipped, "session event printer lagged");
                }
            }
        }
    });
}

/// Returns `false` when the loop should stop.
fn run_command(session: &mut IssueSession, command: Command) -> bool {
    match command {
        Command::SetKey(key) => {
            session.set_key(key);
        }
        Command::Start => {
            if !session.start() && session.key().is_empty() {
                println!("set an issue key first");
            }
        }
        Command::Pause => {
            session.pause();
        }
        Command::Toggle => {
            session.toggle();
        }
        Command::Reset => session.reset(),
        Command::Show => {}
        Command::Refresh => {
            session.refresh_summary();
        }
        Command::Open => match session.browse_url() {
            Some(url) => println!("open {url}"),
            None => println!("nothing to open"),
        },
        Command::Help => {
            println!("{HELP}");
            return true;
        }
        Command::Quit => return false,
        Command::Unknown(input) => {
            println!("unknown command: {input}");
            println!("{HELP}");
            return true;
        }
    }

    println!(
        "{}",
        render_status(
            session.key(),
            &session.display_snapshot(),
            &session.summary()
        )
    );
    true
}
