//! Hashpay CLI binary entry point.

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use hashpay_cli::{
    cli::{Cli, Commands},
    commands::{self, SpeedParams},
    config::{default_config_path, CliConfig},
    error::{CliError, CliResult},
    output::OutputFormat,
};

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            print_error(&e);
            std::process::exit(e.exit_code());
        }
    }
}

/// Initialize logging from `--verbose` or `RUST_LOG`.
fn init_logging(verbose: bool) {
    let has_rust_log = std::env::var("RUST_LOG").is_ok();
    if !verbose && !has_rust_log {
        return;
    }
    let mut filter = EnvFilter::from_default_env();
    if verbose {
        if let Ok(directive) = "hashpay=debug".parse() {
            filter = filter.add_directive(directive);
        }
    }
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Print a user-friendly error message with error code and recovery hint.
fn print_error(e: &CliError) {
    let code = e.error_code();

    eprintln!(
        "{} [{}]: {}",
        "Error".red().bold(),
        code.to_string().yellow(),
        e
    );

    if let Some(suggestion) = e.suggestion() {
        eprintln!("{}: {}", "Hint".cyan(), suggestion);
    }
}

fn run(cli: Cli) -> CliResult<String> {
    let config_path = cli.config.unwrap_or_else(default_config_path);
    let config = CliConfig::load(&config_path)?;
    let format: OutputFormat = cli.format.into();

    match cli.command {
        Commands::Speed {
            transfers,
            max_locked,
            reveal_timeout,
            settle_timeout,
        } => {
            let mut channel = config.channel.clone();
            if let Some(blocks) = reveal_timeout {
                channel.reveal_timeout = blocks;
            }
            if let Some(blocks) = settle_timeout {
                channel.settle_timeout = blocks;
            }
            let params = SpeedParams {
                transfers: transfers.unwrap_or(config.benchmark.transfers),
                max_locked: max_locked.unwrap_or(config.benchmark.max_locked),
                channel: channel.to_channel_config(),
            };
            commands::speed(params, format)
        }

        Commands::Decode { hex, signer } => commands::decode(&hex, signer.as_deref(), format),

        Commands::Keygen { seed } => commands::keygen(seed.as_deref(), format),

        Commands::Config { write } => commands::config(config, &config_path, write, format),
    }
}
