//! Command-line interface for the Hashpay protocol.
//!
//! This crate provides the `hashpay` binary:
//!
//! - **speed**: measure locked-transfer throughput on a two-party channel
//! - **decode**: decode a wire message and recover its signer
//! - **keygen**: create a signing key and its address
//! - **config**: show or write the effective configuration
//!
//! # Quick Start
//!
//! ```bash
//! # 10 000 locked transfers, at most 100 pending at a time
//! hashpay speed --transfers 10000 --max-locked 100
//!
//! # Decode a captured message
//! hashpay decode 0x0600000000...
//! ```
//!
//! # Output Formats
//!
//! All commands support `--format`:
//!
//! - `human` (default): Human-readable with colors
//! - `json`: Machine-readable JSON
//!
//! # Configuration
//!
//! Configuration is loaded from `config.toml` in the platform data
//! directory. Override with `--config` or `HASHPAY_CONFIG`.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;
pub mod progress;

pub use cli::{Cli, Commands, OutputFormatArg};
pub use config::CliConfig;
pub use error::{CliError, CliResult};
pub use output::{OutputFormat, Render};
