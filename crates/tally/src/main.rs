//! Tally - calculator sessions on the console.
//!
//! Reads whitespace-separated key tokens from stdin and prints the
//! calculator display after each one. On end of input or Ctrl-C the
//! session store is drained, falling back to a hard close.

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tally::{CalculatorSessions, SessionError, SessionKey};
use tally_session::StoreConfig;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

const WELCOME: &str = "Welcome! Type /open to get started.";

const HELP: &str = "Help:
/open - open a new session.
/help - show this message.
Keys: 0-9 . + - * / % = C T AC";

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Tally - per-user calculator sessions with TTL expiry
#[derive(Parser)]
#[command(name = "tally")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Session lifetime after the last key press
    #[arg(long, env = "TALLY_SESSION_TTL", default_value = "20m", value_parser = humantime::parse_duration)]
    pub session_ttl: Duration,

    /// Interval between sweeps of expired sessions
    #[arg(long, env = "TALLY_CLEANUP_INTERVAL", default_value = "1m", value_parser = humantime::parse_duration)]
    pub cleanup_interval: Duration,

    /// How long shutdown waits for live sessions before closing them
    #[arg(long, env = "TALLY_SHUTDOWN_TIMEOUT", default_value = "2m", value_parser = humantime::parse_duration)]
    pub shutdown_timeout: Duration,
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries only what the user sees.
    let filter = if cli.verbose {
        "tally=debug,tally_session=debug,tally_calc=trace,info"
    } else {
        "tally=info,tally_session=info,warn"
    };

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    let sessions = CalculatorSessions::new(
        StoreConfig::new()
            .with_ttl(cli.session_ttl)
            .with_cleanup_interval(cli.cleanup_interval),
    );
    let key = SessionKey::new(0, 0);

    info!(ttl = ?cli.session_ttl, "Starting tally");
    println!("{WELCOME}");

    tokio::select! {
        result = run_console(&sessions, &key) => result?,
        _ = tokio::signal::ctrl_c() => info!("Interrupted"),
    }

    shutdown(&sessions, cli.shutdown_timeout).await
}

async fn run_console(sessions: &CalculatorSessions, key: &SessionKey) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        for token in line.split_whitespace() {
            handle_token(sessions, key, token).await;
        }
    }
    Ok(())
}

async fn handle_token(sessions: &CalculatorSessions, key: &SessionKey, token: &str) {
    match token {
        "/help" => println!("{HELP}"),
        "/open" => match sessions.open(key).await {
            Ok(display) => println!("{display}"),
            Err(SessionError::Active(_)) => println!("Your session is not expired!"),
            Err(e) => println!("error: {e}"),
        },
        _ => match sessions.apply(key, token).await {
            Ok(display) => println!("{display}"),
            Err(SessionError::Expired(_)) => {
                println!("Your session has expired, please /open a new one.")
            }
            Err(e) => {
                warn!(token = %token, error = %e, "Rejected token");
                println!("error: {e}");
                if let Some(display) = sessions.display(key).await {
                    println!("{display}");
                }
            }
        },
    }
}

async fn shutdown(sessions: &CalculatorSessions, deadline: Duration) -> Result<()> {
    info!(deadline = ?deadline, "Stopping tally");
    if let Err(e) = sessions.shutdown(deadline).await {
        warn!(error = %e, "Graceful shutdown failed, closing sessions");
        sessions.close().await?;
    }
    info!("Tally stopped");
    Ok(())
}
