use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;

use phishwatch::classifier::http::HttpClassifier;
use phishwatch::config::Config;
use phishwatch::output::terminal;
use phishwatch::verify::{Orchestrator, SubmitOutcome, VerifyError};

/// Phishwatch: check URLs against a phishing detector.
///
/// Each URL is classified as safe, suspicious or malicious, with the
/// evidence behind the verdict. Results accumulate for the session.
#[derive(Parser)]
#[command(name = "phishwatch", version, about)]
struct Cli {
    /// Detector API base URL (overrides PHISHWATCH_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Request timeout in seconds (overrides PHISHWATCH_TIMEOUT_SECS)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check one or more URLs and print the results
    Check {
        /// URLs to check, in order
        #[arg(required = true)]
        urls: Vec<String>,

        /// Print the history as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Start an interactive session: one URL per line, `:quit` to leave
    Session,

    /// Show whether the detector backend is up
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Logs go to stderr so --json output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("phishwatch=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Check { urls, json } => {
            let classifier = HttpClassifier::from_config(&config)?;
            let orchestrator = Orchestrator::new(Arc::new(classifier));

            let mut failed = 0;
            for url in &urls {
                if let Err(e) = run_check(&orchestrator, url, !json).await {
                    failed += 1;
                    if !json {
                        println!("  {}", url.bold());
                        terminal::display_error(&e);
                    }
                }
            }

            let history = orchestrator.history().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&history)?);
            } else {
                terminal::display_history(&history);
            }

            if failed > 0 {
                anyhow::bail!("{failed} of {} checks failed", urls.len());
            }
        }

        Commands::Session => {
            let classifier = HttpClassifier::from_config(&config)?;
            info!(api_url = classifier.base_url(), "Starting session");
            let orchestrator = Orchestrator::new(Arc::new(classifier));
            run_session(&orchestrator).await?;
        }

        Commands::Health => {
            let classifier = HttpClassifier::from_config(&config)?;
            let report = classifier.health().await?;
            terminal::display_health(classifier.base_url(), &report);
            if !report.is_healthy() {
                anyhow::bail!("Detector reported status {:?}", report.status);
            }
        }
    }

    Ok(())
}

/// Environment configuration with CLI overrides applied on top.
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load()?;
    if let Some(url) = &cli.api_url {
        config = config.with_api_url(url);
    }
    if let Some(secs) = cli.timeout {
        config = config.with_timeout_secs(secs)?;
    }
    Ok(config)
}

/// Submit one raw input, showing a spinner while the check is in flight.
async fn run_check(
    orchestrator: &Orchestrator,
    raw_input: &str,
    show_progress: bool,
) -> Result<SubmitOutcome, VerifyError> {
    let pb = if show_progress {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("  {spinner} Checking {msg}...")
                .expect("valid template"),
        );
        pb.set_message(phishwatch::output::truncate_chars(raw_input.trim(), 60));
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let outcome = orchestrator.submit_raw(raw_input).await;

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    outcome
}

/// One line of interactive input.
#[derive(Debug, PartialEq, Eq)]
enum SessionInput<'a> {
    Quit,
    History,
    Submit(&'a str),
}

/// Session commands carry a `:` prefix so that every bare word, including
/// "quit" or "history", can still be checked as a URL.
fn parse_session_line(line: &str) -> SessionInput<'_> {
    match line.trim() {
        ":quit" | ":exit" => SessionInput::Quit,
        ":history" => SessionInput::History,
        _ => SessionInput::Submit(line),
    }
}

/// Interactive loop: read lines from stdin and submit each one.
async fn run_session(orchestrator: &Orchestrator) -> Result<()> {
    println!("{}", "Phishwatch session".bold());
    println!(
        "{}",
        "Enter a URL to check. `:history` shows results, `:quit` exits.".dimmed()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"\nurl> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await.context("Failed to read input")? else {
            break;
        };

        let raw_input = match parse_session_line(&line) {
            SessionInput::Quit => break,
            SessionInput::History => {
                terminal::display_history(&orchestrator.history().await);
                continue;
            }
            SessionInput::Submit(raw_input) => raw_input,
        };

        match run_check(orchestrator, raw_input, true).await {
            Ok(SubmitOutcome::Completed(_)) => {
                terminal::display_history(&orchestrator.history().await);
            }
            Ok(SubmitOutcome::Ignored) => {
                println!("  {}", "A check is already running, please wait.".yellow());
            }
            Err(VerifyError::EmptyInput) => {
                terminal::display_error(&VerifyError::EmptyInput);
                continue;
            }
            // Service failures are reported through the snapshot's last_error
            Err(_) => {}
        }

        terminal::display_snapshot(&orchestrator.snapshot().await);
    }

    let history = orchestrator.history().await;
    println!("\nSession ended after {} checks.", history.len());
    Ok(())
}
