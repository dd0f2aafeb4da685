use colored::Colorize;

use crate::adapters::engine;
use crate::cli::context::Context;
use crate::cli::output;
use crate::core::errors::Result;
use crate::core::traits::session::UserSession;

/// Execute the `sealdrop status` command.
///
/// Displays which OpenPGP engines work on this host, where storage
/// lives, and, when a user is given, their recipients and key.
pub fn execute(ctx: &Context) -> Result<()> {
    output::header(&format!("sealdrop v{}", env!("CARGO_PKG_VERSION")));
    println!(
        "  Default config: {}",
        crate::config::app_config::AppConfig::default_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none)".into())
            .dimmed()
    );

    print_engines(ctx);
    print_storage(ctx)?;
    print_user(ctx);
    print_audit_status(ctx);

    Ok(())
}

/// Print the "Engines" section: every candidate, probed.
fn print_engines(ctx: &Context) {
    let config = &ctx.config.engine;
    println!(
        "\n{}",
        format!("  Engines (backend = {})", config.backend).bold()
    );

    let candidates = engine::candidates(config.backend, &config.gpg_path);
    if candidates.is_empty() {
        output::warning("This build has no engine for the configured backend");
        return;
    }
    for engine in &candidates {
        if engine.is_available() {
            output::success(&format!("{} available", engine.name()));
        } else {
            output::warning(&format!("{} not available", engine.name()));
        }
    }
}

/// Print the storage root and how many users have files there.
fn print_storage(ctx: &Context) -> Result<()> {
    println!("\n{}", "  Storage".bold());
    let root = ctx.files().root();
    if !root.exists() {
        output::warning(&format!("{} does not exist yet", root.display()));
        return Ok(());
    }
    let users = ctx.files().users()?;
    output::success(&format!("{} ({} user(s))", root.display(), users.len()));
    Ok(())
}

/// Print the acting user's recipients and key state.
fn print_user(ctx: &Context) {
    let session = ctx.session();
    let Ok(user) = session.require_user() else {
        println!("\n  {}", "No user given (--user / SEALDROP_USER)".dimmed());
        return;
    };
    println!("\n{}", format!("  User {user}").bold());

    match ctx.recipient_service().list(&session) {
        Ok(list) => output::success(&format!("{} recipient(s)", list.len())),
        Err(e) => output::warning(&format!("Could not read recipients: {e}")),
    }

    match ctx.private_key_service().metadata(&session) {
        Ok(meta) if meta.exists => output::success("Private key stored"),
        Ok(_) => output::warning("No private key stored"),
        Err(e) => output::warning(&format!("Could not read private key: {e}")),
    }
}

/// Print audit log status.
fn print_audit_status(ctx: &Context) {
    let audit = &ctx.config.audit;
    if !audit.enabled {
        println!("\n{}", "  Audit: disabled".dimmed());
        return;
    }

    let log_path = ctx.config.audit_log_path();
    if log_path.exists() {
        let content = std::fs::read_to_string(&log_path).unwrap_or_default();
        let entry_count = content.lines().filter(|l| !l.trim().is_empty()).count();
        println!(
            "\n  {} Audit: {} entries in {}",
            "✓".green(),
            entry_count,
            log_path.display(),
        );
    } else {
        println!(
            "\n  {} Audit: no entries yet ({})",
            "-".dimmed(),
            log_path.display()
        );
    }
}
