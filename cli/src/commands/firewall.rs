// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Firewall inspection commands
//!
//! Commands: inspect

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::fmt::Write;
use std::path::PathBuf;

use cardsim_core::application::{ChannelSet, IdentityRegistry};
use cardsim_core::domain::card_config::CardConfigManifest;

#[derive(Subcommand)]
pub enum FirewallCommand {
    /// Show the package/applet table and channel layout of the configured card
    Inspect,
}

pub fn handle_command(command: FirewallCommand, config_override: Option<PathBuf>) -> Result<()> {
    match command {
        FirewallCommand::Inspect => inspect(config_override),
    }
}

fn inspect(config_override: Option<PathBuf>) -> Result<()> {
    let config = CardConfigManifest::load_or_default(config_override)
        .context("Failed to load configuration")?;
    config
        .validate()
        .context("Configuration validation failed")?;

    print!("{}", render(&config)?);
    Ok(())
}

/// Build the runtime registry and channel set from `config` and describe them.
pub fn render(config: &CardConfigManifest) -> Result<String> {
    let registry = IdentityRegistry::from_config(config).context("Failed to build identity registry")?;
    let channels = ChannelSet::from_config(config).context("Failed to build logical channels")?;

    let mut out = String::new();
    writeln!(out, "{}", format!("Card {}", config.metadata.name).bold())?;
    writeln!(
        out,
        "  Logical channels: {} (active: {})",
        channels.count(),
        channels.active_channel()
    )?;
    writeln!(out, "  Registered applets: {}", registry.len())?;
    writeln!(out)?;

    writeln!(out, "{}", "Firewall domains:".bold())?;
    if config.spec.packages.is_empty() {
        writeln!(out, "  {}", "(no packages installed)".dimmed())?;
    }
    for package in &config.spec.packages {
        writeln!(out, "  Package {}", package.aid.to_string().bold())?;
        for applet in registry.applets_of(&package.aid) {
            let marker = if applet.starts_with(&package.aid) { "" } else { " (foreign RID)" };
            writeln!(out, "    - applet {}{}", applet, marker.yellow())?;
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_lists_packages_and_channels() {
        colored::control::set_override(false);
        let config = CardConfigManifest::from_yaml_str(
            r#"
apiVersion: cardsim/v1
kind: CardConfig
metadata:
  name: dev-card
spec:
  logical_channels: 2
  packages:
    - aid: "F0AA000000"
      applets: ["F0AA000002", "F0AA000001"]
    - aid: "F0BB000000"
      applets: ["A0000000620001"]
"#,
        )
        .unwrap();

        let out = render(&config).unwrap();
        assert!(out.contains("Logical channels: 2 (active: 0)"));
        assert!(out.contains("Registered applets: 3"));
        let first = out.find("applet F0AA000001").unwrap();
        let second = out.find("applet F0AA000002").unwrap();
        assert!(first < second);
        assert!(out.contains("applet A0000000620001 (foreign RID)"));
    }
}
