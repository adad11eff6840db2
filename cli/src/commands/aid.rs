// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! AID notation commands
//!
//! Commands: parse

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;

use cardsim_core::domain::aid::{Aid, AidError};
use cardsim_core::domain::hex_string;

#[derive(Subcommand)]
pub enum AidCommand {
    /// Decode hex notation (e.g. "F0 AA |ab| #(01 02)") and check it as an AID
    Parse {
        #[arg(value_name = "NOTATION")]
        notation: String,
    },
}

pub fn handle_command(command: AidCommand) -> Result<()> {
    match command {
        AidCommand::Parse { notation } => parse(&notation),
    }
}

/// Decoded notation and the AID check applied to it.
#[derive(Debug)]
pub struct AidReport {
    pub bytes: Vec<u8>,
    pub aid: Result<Aid, AidError>,
}

pub fn inspect(notation: &str) -> Result<AidReport> {
    let bytes = hex_string::parse(notation)
        .with_context(|| format!("Failed to parse notation {:?}", notation))?;
    let aid = Aid::new(&bytes);
    Ok(AidReport { bytes, aid })
}

fn parse(notation: &str) -> Result<()> {
    let report = inspect(notation)?;

    println!("{}", "Decoded bytes:".bold());
    println!("  Hex: {}", hex_string::to_hex(&report.bytes));
    println!("  Length: {}", report.bytes.len());

    match &report.aid {
        Ok(aid) => println!("{}", format!("✓ Valid AID: {}", aid).green()),
        Err(e) => println!("{}", format!("✗ Not an AID: {}", e).red()),
    }

    Ok(())
}
