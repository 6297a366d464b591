//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::output::OutputFormat;

/// Hashpay Protocol CLI.
#[derive(Parser, Debug)]
#[command(name = "hashpay")]
#[command(author = "Hashpay Contributors")]
#[command(version)]
#[command(about = "Command-line interface for the Hashpay protocol")]
#[command(
    long_about = "Hashpay moves value over two-party payment channels with hashlocked transfers.\n\nRun 'hashpay speed' to benchmark the channel ledger."
)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file.
    #[arg(short, long, global = true, env = "HASHPAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format (human or json).
    #[arg(short, long, global = true, default_value = "human")]
    pub format: OutputFormatArg,

    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Output format argument for clap.
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormatArg {
    /// Human-readable output.
    #[default]
    Human,
    /// JSON output.
    Json,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Human => OutputFormat::Human,
            OutputFormatArg::Json => OutputFormat::Json,
        }
    }
}

/// CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Measure locked-transfer throughput.
    ///
    /// Opens a channel between two deterministic identities, then creates,
    /// signs and registers locked transfers on both ledgers, claiming the
    /// oldest lock once too many are pending.
    Speed {
        /// Number of transfers (default from config).
        #[arg(short, long, env = "HASHPAY_TRANSFERS")]
        transfers: Option<u64>,

        /// Pending locks allowed before claiming (default from config).
        #[arg(short, long, env = "HASHPAY_MAX_LOCKED")]
        max_locked: Option<u64>,

        /// Reveal timeout in blocks (default from config).
        #[arg(long, env = "HASHPAY_REVEAL_TIMEOUT")]
        reveal_timeout: Option<u64>,

        /// Settle timeout in blocks (default from config).
        #[arg(long, env = "HASHPAY_SETTLE_TIMEOUT")]
        settle_timeout: Option<u64>,
    },

    /// Decode a wire message.
    ///
    /// Prints every field and the address that signed it.
    Decode {
        /// Message bytes as hex, with or without a 0x prefix.
        hex: String,

        /// Fail unless this address signed the message.
        #[arg(short, long)]
        signer: Option<String>,
    },

    /// Create a signing key.
    ///
    /// Prints the private key and its address.
    Keygen {
        /// Derive the key from this seed instead of randomly.
        #[arg(short, long)]
        seed: Option<String>,
    },

    /// Show the effective configuration.
    Config {
        /// Write it to the config path.
        #[arg(short, long)]
        write: bool,
    },
}
