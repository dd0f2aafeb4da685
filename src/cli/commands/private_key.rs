use std::path::Path;

use chrono::{TimeZone, Utc};

use crate::cli::PrivateKeyAction;
use crate::cli::commands::recipients::read_key_file;
use crate::cli::context::Context;
use crate::cli::output;
use crate::core::errors::Result;

/// Execute the `sealdrop private-key` command.
pub fn execute(ctx: &Context, action: &PrivateKeyAction) -> Result<()> {
    match action {
        PrivateKeyAction::Set { key_file, hint } => execute_set(ctx, key_file, hint.as_deref()),
        PrivateKeyAction::Show => execute_show(ctx),
        PrivateKeyAction::Export => execute_export(ctx),
        PrivateKeyAction::Remove => execute_remove(ctx),
    }
}

fn execute_set(ctx: &Context, key_file: &Path, hint: Option<&str>) -> Result<()> {
    let key = read_key_file(key_file)?;
    let record = ctx
        .private_key_service()
        .store(&ctx.session(), &key, hint)?;

    if record.created_at == record.updated_at {
        output::success("Private key stored");
    } else {
        output::success("Private key replaced");
    }
    if record.passphrase_hint.is_some() {
        output::detail("Passphrase hint saved");
    }
    Ok(())
}

fn execute_show(ctx: &Context) -> Result<()> {
    let meta = ctx.private_key_service().metadata(&ctx.session())?;

    if !meta.exists {
        output::warning("No private key stored");
        output::hint("Run 'sealdrop private-key set --key-file <path>' to store one.");
        return Ok(());
    }

    output::success("Private key stored");
    if let Some(created) = meta.created_at {
        println!("  Created: {}", format_timestamp(created));
    }
    if let Some(updated) = meta.updated_at {
        println!("  Updated: {}", format_timestamp(updated));
    }
    if let Some(hint) = &meta.passphrase_hint {
        println!("  Passphrase hint: {hint}");
    }
    Ok(())
}

/// Prints the raw key on stdout so it can be redirected to a file.
fn execute_export(ctx: &Context) -> Result<()> {
    let key = ctx.private_key_service().value(&ctx.session())?;
    println!("{key}");
    Ok(())
}

fn execute_remove(ctx: &Context) -> Result<()> {
    ctx.private_key_service().delete(&ctx.session())?;
    output::success("Private key removed");
    Ok(())
}

fn format_timestamp(secs: i64) -> String {
    Utc.timestamp_opt(secs, 0)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| secs.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_unix_seconds() {
        assert_eq!(format_timestamp(1_700_000_000), "2023-11-14 22:13:20 UTC");
    }
}
