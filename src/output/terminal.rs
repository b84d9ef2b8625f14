// Colored terminal output for check results.
//
// Rendering is a pure function of a History or SessionSnapshot; nothing
// here holds state or writes back into the session.

use chrono::Local;
use colored::Colorize;

use crate::classifier::http::HealthReport;
use crate::verify::{History, RiskLevel, SessionSnapshot, SubmissionState, VerifyError};

/// Widest URL shown in the history table before truncation.
const URL_COLUMN: usize = 48;

/// Display the session history as a table, newest first.
pub fn display_history(history: &History) {
    if history.is_empty() {
        println!("No URLs checked yet. Enter a URL above to start.");
        return;
    }

    println!(
        "\n{}",
        format!("=== Check Results ({} URLs) ===", history.len()).bold()
    );
    println!();

    println!(
        "  {:<4} {:<51} {:<12} {}",
        "#".dimmed(),
        "URL".dimmed(),
        "Status".dimmed(),
        "Checked at".dimmed(),
    );
    println!("  {}", "-".repeat(90).dimmed());

    for (i, result) in history.iter().enumerate() {
        let url = super::truncate_chars(result.url(), URL_COLUMN);
        let checked_at = result
            .checked_at()
            .with_timezone(&Local)
            .format("%d/%m/%Y %H:%M:%S");

        println!(
            "  {:<4} {:<51} {:<12} {}",
            format!("{}.", i + 1),
            url,
            colorize_risk(result.risk_level()),
            checked_at,
        );

        for detail in result.details() {
            println!("       {} {}", "•".dimmed(), detail);
        }

        if let RiskLevel::Unknown(raw) = result.risk_level() {
            println!(
                "       {}",
                format!("(service reported unrecognized level {raw:?})").dimmed()
            );
        }
    }

    println!();
    display_tally(history);
}

/// One-line summary of how many results fall in each risk level.
fn display_tally(history: &History) {
    let (safe, suspicious, malicious, unknown) = history.tally();

    if malicious > 0 {
        println!("  {} {} malicious", "!!".red().bold(), malicious);
    }
    if suspicious > 0 {
        println!("  {} {} suspicious", "!".yellow(), suspicious);
    }
    if safe > 0 {
        println!("  {} {} safe", "✓".green(), safe);
    }
    if unknown > 0 {
        println!("  {} {} unknown", "?".dimmed(), unknown);
    }
}

/// Display the session state line shown under the prompt.
pub fn display_snapshot(snapshot: &SessionSnapshot) {
    let state = match snapshot.state {
        SubmissionState::Idle => "ready".green(),
        SubmissionState::InFlight => "checking…".yellow(),
        SubmissionState::Errored => "last check failed".red(),
    };
    println!("  Session: {}  |  {} checked", state, snapshot.history.len());

    if let Some(err) = &snapshot.last_error {
        display_error(err);
    }
}

/// Explain a failed submission and how to recover from it.
pub fn display_error(err: &VerifyError) {
    match err {
        VerifyError::EmptyInput => {
            println!("  {} Please enter a URL to check.", "Notice:".yellow());
        }
        VerifyError::ServiceUnavailable(_) => {
            println!("  {} {}", "Error:".red().bold(), err);
            println!(
                "  {}",
                "Make sure the detector backend is running, then submit again.".dimmed()
            );
        }
        VerifyError::ServiceRejected { .. } | VerifyError::MalformedResponse(_) => {
            println!("  {} {}", "Error:".red().bold(), err);
            println!("  {}", "Submit the URL again to retry.".dimmed());
        }
    }
}

/// Display the detector health report.
pub fn display_health(base_url: &str, report: &HealthReport) {
    let status = if report.is_healthy() {
        report.status.green().bold()
    } else {
        report.status.red().bold()
    };

    println!("Detector: {base_url}");
    println!("  Status: {status}");
    if let Some(ts) = &report.timestamp {
        println!("  Reported at: {ts}");
    }
    if let Some(count) = report.phishing_urls_in_db {
        println!("  Known phishing URLs: {count}");
    }
    if let Some(err) = &report.error {
        println!("  {} {}", "Error:".red(), err);
    }
}

/// Colorize a risk level label.
fn colorize_risk(level: &RiskLevel) -> colored::ColoredString {
    let label = level.label();
    match level {
        RiskLevel::Safe => label.green(),
        RiskLevel::Suspicious => label.yellow(),
        RiskLevel::Malicious => label.red().bold(),
        RiskLevel::Unknown(_) => label.dimmed(),
    }
}
