use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

const QUIET: u8 = 0;
const NORMAL: u8 = 1;
const VERBOSE: u8 = 2;

static LEVEL: AtomicU8 = AtomicU8::new(NORMAL);

/// Set how chatty the CLI is. `quiet` wins over `verbose`.
pub fn configure(verbose: bool, quiet: bool) {
    let level = match (verbose, quiet) {
        (_, true) => QUIET,
        (true, false) => VERBOSE,
        (false, false) => NORMAL,
    };
    LEVEL.store(level, Ordering::Relaxed);
}

fn level() -> u8 {
    LEVEL.load(Ordering::Relaxed)
}

/// Print a success message.
pub fn success(msg: &str) {
    if level() > QUIET {
        println!("  {} {}", "✓".green(), msg);
    }
}

/// Print a warning message.
pub fn warning(msg: &str) {
    if level() > QUIET {
        println!("  {} {}", "⚠".yellow(), msg);
    }
}

/// Print an error message. Always shown.
pub fn error(msg: &str) {
    eprintln!("  {} {}", "✗".red(), msg);
}

/// Print a plain hint line.
pub fn hint(msg: &str) {
    if level() > QUIET {
        println!("  {msg}");
    }
}

/// Print a header line.
pub fn header(msg: &str) {
    if level() > QUIET {
        println!("\n{}", msg.bold());
    }
}

/// Extra detail, only with `--verbose`.
pub fn detail(msg: &str) {
    if level() >= VERBOSE {
        println!("  {} {}", "·".dimmed(), msg.dimmed());
    }
}

/// Start a spinner for a slow step. Hidden in quiet mode.
pub fn spinner(msg: &str) -> ProgressBar {
    if level() == QUIET {
        return ProgressBar::hidden();
    }
    let sp = ProgressBar::new_spinner();
    sp.set_style(
        ProgressStyle::with_template("  {spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    sp.set_message(msg.to_string());
    sp.enable_steady_tick(Duration::from_millis(80));
    sp
}

/// Stop a spinner and replace it with a success line.
pub fn finish_spinner(sp: ProgressBar, msg: &str) {
    sp.finish_and_clear();
    success(msg);
}
