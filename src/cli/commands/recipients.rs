use std::path::Path;

use colored::Colorize;

use crate::cli::RecipientsAction;
use crate::cli::context::Context;
use crate::cli::output;
use crate::core::errors::{Result, SealError};

/// Execute the `sealdrop recipients` command.
pub fn execute(ctx: &Context, action: &RecipientsAction) -> Result<()> {
    match action {
        RecipientsAction::Add { name, key_file } => execute_add(ctx, name, key_file),
        RecipientsAction::List => execute_list(ctx),
        RecipientsAction::Remove { id } => execute_remove(ctx, *id),
    }
}

fn execute_add(ctx: &Context, name: &str, key_file: &Path) -> Result<()> {
    let public_key = read_key_file(key_file)?;
    let id = ctx
        .recipient_service()
        .create(&ctx.session(), name, &public_key)?;

    output::success(&format!("Added recipient #{id} ({})", name.trim()));
    output::hint(&format!(
        "Encrypt for it with: sealdrop encrypt --recipient {id} <path>"
    ));
    Ok(())
}

fn execute_list(ctx: &Context) -> Result<()> {
    let recipients = ctx.recipient_service().list(&ctx.session())?;

    if recipients.is_empty() {
        output::warning("No recipients yet");
        output::hint("Run 'sealdrop recipients add --name <n> --key-file <path>' to add one.");
        return Ok(());
    }

    output::header(&format!("Recipients ({})", recipients.len()));
    for r in &recipients {
        let first_line = r.public_key.lines().next().unwrap_or_default();
        println!(
            "  {} {:<4} {:<24} {}",
            "•".dimmed(),
            format!("#{}", r.id).cyan(),
            r.name,
            first_line.dimmed(),
        );
    }
    Ok(())
}

fn execute_remove(ctx: &Context, id: i64) -> Result<()> {
    ctx.recipient_service().delete(&ctx.session(), id)?;
    output::success(&format!("Removed recipient #{id}"));
    Ok(())
}

/// Read an armored key from disk, with a readable error when it is missing.
pub(crate) fn read_key_file(path: &Path) -> Result<String> {
    let content = std::fs::read_to_string(path).map_err(|source| SealError::ReadFailed {
        path: path.to_path_buf(),
        source,
    })?;
    if content.trim().is_empty() {
        return Err(SealError::invalid_request(format!(
            "{} is empty",
            path.display()
        )));
    }
    Ok(content)
}
