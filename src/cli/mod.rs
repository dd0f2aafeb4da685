pub mod commands;
pub mod context;
pub mod output;

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::adapters::engine::EngineChoice;

/// Encrypt stored files for a recipient's PGP key and decrypt them with your own.
#[derive(Parser, Debug)]
#[command(name = "sealdrop", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to alternative config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// User to act as
    #[arg(long, global = true, env = "SEALDROP_USER")]
    pub user: Option<String>,

    /// Storage root holding <uid>/files/ (overrides [storage] data_dir)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// OpenPGP engine to use (overrides [engine] backend)
    #[arg(long, global = true, value_enum)]
    pub engine: Option<EngineChoice>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode: only show errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Encrypt one of your files for a recipient
    Encrypt {
        /// Recipient id (see `sealdrop recipients list`)
        #[arg(long)]
        recipient: i64,
        /// Path relative to your files root
        path: Option<String>,
        /// File id instead of a path
        #[arg(long)]
        file_id: Option<u64>,
    },

    /// Decrypt one of your files with your stored private key
    Decrypt {
        /// Path relative to your files root
        path: Option<String>,
        /// File id instead of a path
        #[arg(long)]
        file_id: Option<u64>,
        /// Passphrase of the stored private key
        #[arg(long, env = "SEALDROP_PASSPHRASE", hide_env_values = true)]
        passphrase: Option<String>,
    },

    /// Manage the public keys you encrypt for
    Recipients {
        #[command(subcommand)]
        action: RecipientsAction,
    },

    /// Manage your stored private key
    PrivateKey {
        #[command(subcommand)]
        action: PrivateKeyAction,
    },

    /// Show operation history
    Log {
        /// Filter by user
        #[arg(long)]
        by: Option<String>,
        /// Filter entries since this date (ISO 8601)
        #[arg(long)]
        since: Option<String>,
        /// Show last N entries
        #[arg(long)]
        last: Option<usize>,
    },

    /// Show engine, storage and key status
    Status,

    /// Run the HTTP API
    Serve {
        /// Address to listen on (overrides [server] listen_addr)
        #[arg(long)]
        listen: Option<SocketAddr>,
    },
}

#[derive(Subcommand, Debug)]
pub enum RecipientsAction {
    /// Add a recipient from an armored public key file
    Add {
        /// Display name
        #[arg(long)]
        name: String,
        /// File holding the armored public key
        #[arg(long)]
        key_file: PathBuf,
    },
    /// List your recipients
    List,
    /// Remove a recipient
    Remove {
        /// Recipient id
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
pub enum PrivateKeyAction {
    /// Store (or replace) your armored private key
    Set {
        /// File holding the armored private key
        #[arg(long)]
        key_file: PathBuf,
        /// Reminder shown when the passphrase is needed
        #[arg(long)]
        hint: Option<String>,
    },
    /// Show whether a key is stored, without revealing it
    Show,
    /// Print the stored key
    Export,
    /// Forget the stored key
    Remove,
}
