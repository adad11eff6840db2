// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # cardsim CLI
//!
//! Operator tooling around the applet firewall core.
//!
//! ## Commands
//!
//! - `cardsim config show|validate|generate` - Card configuration management
//! - `cardsim aid parse <NOTATION>` - Decode hex notation into an AID
//! - `cardsim firewall inspect` - Package/applet table and channel layout

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use cardsim::commands::{self, AidCommand, ConfigCommand, FirewallCommand};

/// cardsim - smart-card applet firewall simulator
#[derive(Parser)]
#[command(name = "cardsim")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "CARDSIM_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "CARDSIM_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Emit logs as JSON lines instead of compact text
    #[arg(long, global = true, env = "CARDSIM_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// AID notation tools
    #[command(name = "aid")]
    Aid {
        #[command(subcommand)]
        command: AidCommand,
    },

    /// Firewall inspection
    #[command(name = "firewall")]
    Firewall {
        #[command(subcommand)]
        command: FirewallCommand,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level, cli.log_json)?;

    match cli.command {
        Commands::Config { command } => commands::config::handle_command(command, cli.config),
        Commands::Aid { command } => commands::aid::handle_command(command),
        Commands::Firewall { command } => commands::firewall::handle_command(command, cli.config),
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str, json: bool) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.compact().init();
    }

    Ok(())
}
