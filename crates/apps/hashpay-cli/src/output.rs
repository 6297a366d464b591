//! Output formatting for CLI.

use colored::Colorize;
use serde::Serialize;

/// Output format for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable output.
    #[default]
    Human,
    /// JSON output.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" | "text" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use 'human' or 'json'.", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Human => write!(f, "human"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Trait for renderable output.
pub trait Render: Serialize {
    /// Render as human-readable string.
    fn render_human(&self) -> String;

    /// Render as JSON string.
    fn render_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Render in the specified format.
    fn render(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Human => self.render_human(),
            OutputFormat::Json => self.render_json(),
        }
    }
}

// =============================================================================
// Output Types
// =============================================================================

/// Output for the speed benchmark.
#[derive(Debug, Serialize)]
pub struct SpeedOutput {
    pub transfers: u64,
    pub max_locked: u64,
    pub elapsed_secs: f64,
    pub transfers_per_second: f64,
    pub claimed: u64,
    pub pending_locks: usize,
    pub sender_balance: u64,
    pub receiver_balance: u64,
}

impl Render for SpeedOutput {
    fn render_human(&self) -> String {
        format!(
            "{} {:.0} transfers per second\n{} {} transfers in {:.3}s ({} claimed, {} pending)\n{} sender {} / receiver {}",
            "Throughput:".green().bold(),
            self.transfers_per_second,
            "Run:".cyan(),
            self.transfers,
            self.elapsed_secs,
            self.claimed,
            self.pending_locks,
            "Balances:".cyan(),
            self.sender_balance,
            self.receiver_balance,
        )
    }
}

/// Output for a decoded message.
#[derive(Debug, Serialize)]
pub struct DecodeOutput {
    pub message_type: String,
    pub size: usize,
    pub signer: Option<String>,
    pub message: serde_json::Value,
}

impl Render for DecodeOutput {
    fn render_human(&self) -> String {
        let signer = match &self.signer {
            Some(address) => address.green().to_string(),
            None => "unsigned or unrecoverable".yellow().to_string(),
        };
        format!(
            "{} {} ({} bytes)\n{} {}\n{}",
            "Message:".green().bold(),
            self.message_type,
            self.size,
            "Signer:".cyan(),
            signer,
            serde_json::to_string_pretty(&self.message).unwrap_or_default()
        )
    }
}

/// Output for a generated key.
#[derive(Debug, Serialize)]
pub struct KeygenOutput {
    pub address: String,
    pub private_key: String,
    pub deterministic: bool,
}

impl Render for KeygenOutput {
    fn render_human(&self) -> String {
        let mut out = format!(
            "{} {}\n{} {}",
            "Address:".green().bold(),
            self.address,
            "Private key:".cyan(),
            self.private_key
        );
        if self.deterministic {
            out.push_str(&format!(
                "\n{}",
                "Seeded keys are for tests only.".yellow()
            ));
        }
        out
    }
}

/// Output for the effective configuration.
#[derive(Debug, Serialize)]
pub struct ConfigOutput {
    pub path: String,
    pub written: bool,
    pub config: crate::config::CliConfig,
}

impl Render for ConfigOutput {
    fn render_human(&self) -> String {
        let header = if self.written {
            format!("{} {}", "Configuration saved to:".green(), self.path)
        } else {
            format!("{} {}", "Configuration path:".cyan(), self.path)
        };
        format!(
            "{}\n\n{}",
            header,
            toml::to_string_pretty(&self.config).unwrap_or_default()
        )
    }
}
