use clap::{Args, Parser, Subcommand};

use crate::types::*;

#[derive(Parser, Debug)]
#[command(
    name = "orderpd-rs",
    about = "Download selected photos from a yipai360 order catalog",
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Sync options when no subcommand is given
    #[command(flatten)]
    pub sync: SyncArgs,

    /// Log level
    #[arg(long, value_enum, default_value = "info", global = true)]
    pub log_level: LogLevel,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Download the requested files of an order (default)
    Sync(SyncArgs),
    /// Show what the download ledger holds
    Status(StatusArgs),
    /// Check that every file in the ledger still exists on disk
    Verify(VerifyArgs),
}

impl Cli {
    /// The subcommand to run, treating a bare invocation as `sync`.
    pub fn effective_command(self) -> Command {
        self.command.unwrap_or(Command::Sync(self.sync))
    }
}

/// Where the ledger lives.
#[derive(Args, Debug, Clone)]
pub struct LedgerArgs {
    /// Download ledger file
    #[arg(long, default_value = "history.json")]
    pub history_file: String,
}

#[derive(Args, Debug, Clone)]
pub struct SyncArgs {
    /// JSON file holding `orderId`, `fname` and optionally `policy`
    #[arg(short = 'c', long, default_value = "config.json")]
    pub config: String,

    /// Order to sync (overrides the config file)
    #[arg(short = 'o', long)]
    pub order_id: Option<String>,

    /// Filename to download; repeat for several (overrides the config file)
    #[arg(short = 'f', long = "fname")]
    pub fnames: Vec<String>,

    /// Catalog traversal policy (overrides the config file)
    #[arg(long, value_enum)]
    pub policy: Option<SyncPolicy>,

    /// Download root; each order gets a subdirectory named after its title
    #[arg(short = 'd', long, default_value = "downloads")]
    pub directory: String,

    #[command(flatten)]
    pub ledger: LedgerArgs,

    /// Audit log written by full scans
    #[arg(long, default_value = "catalog-audit.jsonl")]
    pub audit_file: String,

    /// Directory name used when an order has no usable title
    #[arg(long, default_value = crate::catalog::types::DEFAULT_TITLE)]
    pub fallback_dir_name: String,

    /// Base URL of the catalog API
    #[arg(long, default_value = crate::catalog::endpoints::DEFAULT_API_BASE)]
    pub api_base: String,

    /// Base URL content tags are resolved against
    #[arg(long, default_value = crate::catalog::endpoints::DEFAULT_CONTENT_BASE)]
    pub content_base: String,

    /// HTTP request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub ledger: LedgerArgs,

    /// List the files recorded for this order
    #[arg(short = 'o', long)]
    pub order_id: Option<String>,
}

#[derive(Args, Debug)]
pub struct VerifyArgs {
    #[command(flatten)]
    pub ledger: LedgerArgs,

    /// Download root the files were saved under
    #[arg(short = 'd', long, default_value = "downloads")]
    pub directory: String,

    /// Directory name used when an order has no usable title
    #[arg(long, default_value = crate::catalog::types::DEFAULT_TITLE)]
    pub fallback_dir_name: String,
}
