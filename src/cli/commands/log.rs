use chrono::{NaiveDate, TimeZone, Utc};
use colored::Colorize;

use crate::adapters::audit::json_audit_logger::JsonAuditLogger;
use crate::cli::context::Context;
use crate::cli::output;
use crate::core::errors::{Result, SealError};
use crate::core::models::audit_entry::{AuditAction, AuditEntry};
use crate::core::traits::audit::AuditLogger;

/// Execute the `sealdrop log` command.
///
/// Displays the audit log with optional filters for user, date,
/// and entry count.
pub fn execute(
    ctx: &Context,
    by: Option<&str>,
    since: Option<&str>,
    last: Option<usize>,
) -> Result<()> {
    if !ctx.config.audit.enabled {
        output::warning("Audit is disabled in the config ([audit] enabled = false)");
    }

    let logger = JsonAuditLogger::new(&ctx.config.state_dir(), &ctx.config.audit.log_file);

    // Parse the --since flag as a date
    let since_dt = since.map(parse_since).transpose()?;

    let entries = logger.query(by, since_dt)?;

    if entries.is_empty() {
        output::header("sealdrop log");
        output::warning("No audit entries found");
        if by.is_some() || since.is_some() {
            println!("  Try removing filters to see all entries.");
        }
        return Ok(());
    }

    // Apply --last N (take from the end)
    let skip = last.map_or(0, |n| entries.len().saturating_sub(n));
    let display: Vec<&AuditEntry> = entries.iter().skip(skip).collect();

    output::header(&format!("sealdrop log ({} entries)", display.len()));
    println!();

    for entry in &display {
        print_entry(entry);
    }

    Ok(())
}

/// Parse a date string (ISO 8601: `YYYY-MM-DD`) into a UTC DateTime.
fn parse_since(s: &str) -> Result<chrono::DateTime<Utc>> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| {
            SealError::invalid_request(format!(
                "Invalid date format: '{s}'. Expected ISO 8601 (YYYY-MM-DD), e.g. 2026-01-15"
            ))
        })
        .map(|d| {
            let midnight = d.and_hms_opt(0, 0, 0).expect("midnight is always valid");
            Utc.from_utc_datetime(&midnight)
        })
}

/// Print a single audit entry as a formatted row.
fn print_entry(entry: &AuditEntry) {
    let date = entry.timestamp.format("%Y-%m-%d %H:%M:%S");
    let action = format_action(&entry.action);
    let files = if entry.files.is_empty() {
        "-".dimmed().to_string()
    } else {
        entry.files.join(" → ")
    };
    let detail = entry.detail.as_deref().unwrap_or("").dimmed().to_string();

    println!(
        "  {} {} {:<10} {:<12} {} {}",
        date.to_string().dimmed(),
        "│".dimmed(),
        entry.user,
        action,
        files,
        detail,
    );
}

/// Format an AuditAction as a colored string.
fn format_action(action: &AuditAction) -> String {
    match action {
        AuditAction::Encrypt => "encrypt".green().to_string(),
        AuditAction::Decrypt => "decrypt".blue().to_string(),
        AuditAction::RecipientAdd => "rcpt add".green().to_string(),
        AuditAction::RecipientRemove => "rcpt rm".red().to_string(),
        AuditAction::PrivateKeyStore => "key set".cyan().to_string(),
        AuditAction::PrivateKeyRemove => "key rm".red().to_string(),
    }
}
