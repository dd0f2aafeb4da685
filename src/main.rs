mod adapters;
mod cli;
mod config;
mod core;
mod http;
#[cfg(test)]
mod test_support;

use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use cli::context::Context;
use cli::{Cli, Commands};

fn main() {
    let args = Cli::parse();
    cli::output::configure(args.verbose, args.quiet);
    init_tracing(&args);

    let result = Context::from_cli(&args).and_then(|ctx| run(&ctx, &args.command));

    if let Err(e) = result {
        cli::output::error(&format!("Error: {e}"));
        std::process::exit(1);
    }
}

fn run(ctx: &Context, command: &Commands) -> core::errors::Result<()> {
    match command {
        Commands::Encrypt {
            recipient,
            path,
            file_id,
        } => cli::commands::encrypt::execute(ctx, *recipient, path.as_deref(), *file_id),
        Commands::Decrypt {
            path,
            file_id,
            passphrase,
        } => cli::commands::decrypt::execute(ctx, path.as_deref(), *file_id, passphrase.as_deref()),
        Commands::Recipients { action } => cli::commands::recipients::execute(ctx, action),
        Commands::PrivateKey { action } => cli::commands::private_key::execute(ctx, action),
        Commands::Log { by, since, last } => {
            cli::commands::log::execute(ctx, by.as_deref(), since.as_deref(), *last)
        }
        Commands::Status => cli::commands::status::execute(ctx),
        Commands::Serve { listen } => cli::commands::serve::execute(ctx, *listen),
    }
}

/// Diagnostics go to stderr. `RUST_LOG` wins; otherwise `-v` means debug,
/// `serve` logs info and everything else only warns.
fn init_tracing(args: &Cli) {
    let default_level = if args.verbose {
        LevelFilter::DEBUG
    } else if matches!(args.command, Commands::Serve { .. }) {
        LevelFilter::INFO
    } else {
        LevelFilter::WARN
    };
    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    let stderr_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_filter(env_filter);

    tracing_subscriber::registry().with(stderr_layer).init();
}
