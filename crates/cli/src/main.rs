//! sermousectl - serial mouse inspection CLI
//!
//! Decodes captured serial mouse traffic and drives the full acquisition
//! pipeline against simulated devices.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

mod commands;
mod completion;
mod error;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::{DeviceArg, ProtocolArg};
use crate::error::CliError;

#[derive(Parser)]
#[command(name = "sermousectl")]
#[command(about = "Serial mouse CLI - Decode captures and exercise the acquisition pipeline")]
#[command(version)]
#[command(long_about = "
sermousectl decodes raw serial mouse traffic (MM, MP, BP and Z packet formats)
and runs detection, the read pump and the removal watcher against simulated
devices.

Use --json for machine-readable output suitable for scripting.
")]
struct Cli {
    /// Output format (human-readable or JSON)
    #[arg(long, global = true, help = "Output in JSON format for machine parsing")]
    json: bool,

    /// Verbose logging; -vv traces packets, -vvv traces bytes
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Configuration file (JSON)
    #[arg(short, long, global = true, env = "SERMOUSE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a captured byte stream and print one event per line
    Decode {
        /// Packet format of the capture
        #[arg(short, long, value_enum)]
        protocol: ProtocolArg,

        /// Capture file, or `-` for standard input
        #[arg(default_value = "-")]
        input: PathBuf,

        /// Input is text hex bytes instead of raw binary
        #[arg(long)]
        hex: bool,
    },

    /// Attach to a simulated device and stream generated motion
    Simulate {
        /// Device to simulate
        #[arg(short, long, value_enum, default_value = "microsoft")]
        device: DeviceArg,

        /// Number of packets the device sends
        #[arg(short = 'n', long, default_value_t = 10)]
        packets: usize,

        /// Pull the cable after the last packet
        #[arg(long)]
        unplug: bool,
    },

    /// Print the effective configuration
    Config,

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completion for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match execute_command(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                output::print_error_json(&e);
            } else {
                output::print_error_human(&e);
            }

            let code = e.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
            ExitCode::from(code)
        }
    }
}

fn execute_command(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Decode {
            protocol,
            input,
            hex,
        } => commands::decode::execute((*protocol).into(), input, *hex, cli.json),
        Commands::Simulate {
            device,
            packets,
            unplug,
        } => {
            let mut config = commands::load_config(cli.config.as_deref())?;
            config.pipeline.verbosity = commands::verbosity_for(cli.verbose, config.pipeline.verbosity);
            config.detection.verbosity = commands::verbosity_for(cli.verbose, config.detection.verbosity);
            commands::simulate::execute((*device).into(), *packets, *unplug, config, cli.json)
        }
        Commands::Config => {
            let config = commands::load_config(cli.config.as_deref())?;
            commands::config::execute(&config)
        }
        Commands::Completion { shell } => {
            completion::generate_completion(*shell);
            Ok(())
        }
    }
}
