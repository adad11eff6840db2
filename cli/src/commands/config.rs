// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::fmt::Write;
use std::path::{Path, PathBuf};

use cardsim_core::domain::card_config::{CardConfigManifest, DiscoveryCandidate};

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,

        /// Print the effective manifest as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./cardsim-config.yaml)
        #[arg(short, long, default_value = "./cardsim-config.yaml")]
        output: PathBuf,

        /// Include examples and comments
        #[arg(long)]
        examples: bool,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub fn handle_command(command: ConfigCommand, config_override: Option<PathBuf>) -> Result<()> {
    match command {
        ConfigCommand::Show { paths, json } => show(config_override, paths, json),
        ConfigCommand::Validate { file } => validate(file.or(config_override)),
        ConfigCommand::Generate {
            output,
            examples,
            force,
        } => generate(&output, examples, force),
    }
}

fn show(config_override: Option<PathBuf>, show_paths: bool, json: bool) -> Result<()> {
    let config = CardConfigManifest::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    if show_paths {
        let candidates = CardConfigManifest::discovery_candidates();
        print!("{}", render_discovery(config_override.as_deref(), &candidates)?);
    }
    print!("{}", render_manifest(&config)?);

    Ok(())
}

/// Discovery order as `load_or_default` applies it: the explicit flag, then
/// each candidate. The first existing entry wins.
pub fn render_discovery(explicit: Option<&Path>, candidates: &[DiscoveryCandidate]) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "{}", "Configuration discovery:".bold())?;

    let mut selected = explicit.is_some();
    match explicit {
        Some(path) => writeln!(out, "  1. --config: {} {}", path.display(), "(selected)".green())?,
        None => writeln!(out, "  1. --config: {}", "(not set)".dimmed())?,
    }

    for (i, candidate) in candidates.iter().enumerate() {
        let status = match &candidate.path {
            None => "(not set)".dimmed(),
            Some(_) if candidate.exists() && !selected => {
                selected = true;
                "(selected)".green()
            }
            Some(_) if candidate.exists() => "(shadowed)".yellow(),
            Some(_) => "(missing)".dimmed(),
        };
        let location = candidate
            .path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        writeln!(out, "  {}. {}: {} {}", i + 2, candidate.source, location, status)?;
    }

    if !selected {
        writeln!(out, "  {}", "No file found; built-in defaults apply".yellow())?;
    }
    writeln!(out)?;
    Ok(out)
}

fn render_manifest(config: &CardConfigManifest) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "{} {}", "Card".bold(), config.metadata.name.bold())?;
    writeln!(out, "  apiVersion: {}  kind: {}", config.api_version, config.kind)?;
    if let Some(labels) = &config.metadata.labels {
        let mut labels: Vec<_> = labels.iter().collect();
        labels.sort();
        for (key, value) in labels {
            writeln!(out, "  label {}={}", key, value)?;
        }
    }
    writeln!(out, "  logical channels: {}", config.spec.logical_channels)?;

    if config.spec.packages.is_empty() {
        writeln!(out, "  packages: {}", "(none)".dimmed())?;
    }
    for package in &config.spec.packages {
        writeln!(out, "  package {} ({} applets)", package.aid, package.applets.len())?;
        for applet in &package.applets {
            writeln!(out, "    - {}", applet)?;
        }
    }
    Ok(out)
}

fn validate(config_path: Option<PathBuf>) -> Result<()> {
    let config = CardConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;
    config
        .validate()
        .context("Configuration validation failed")?;

    let applets: usize = config.spec.packages.iter().map(|p| p.applets.len()).sum();
    println!(
        "{}",
        format!(
            "✓ {} is valid: {} channels, {} packages, {} applets",
            config.metadata.name,
            config.spec.logical_channels,
            config.spec.packages.len(),
            applets
        )
        .green()
    );
    Ok(())
}

fn generate(output: &Path, with_examples: bool, force: bool) -> Result<()> {
    if output.exists() && !force {
        anyhow::bail!("{} already exists; pass --force to overwrite", output.display());
    }
    std::fs::write(output, template(with_examples))
        .with_context(|| format!("Failed to write config to {}", output.display()))?;

    println!("{}", format!("✓ Configuration generated: {}", output.display()).green());
    Ok(())
}

fn template(with_examples: bool) -> &'static str {
    if with_examples {
        include_str!("../../templates/config-with-examples.yaml")
    } else {
        include_str!("../../templates/config-minimal.yaml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(source: &'static str, path: Option<PathBuf>) -> DiscoveryCandidate {
        DiscoveryCandidate { source, path }
    }

    #[test]
    fn test_templates_are_valid_manifests() {
        for with_examples in [false, true] {
            let manifest = CardConfigManifest::from_yaml_str(template(with_examples)).unwrap();
            manifest.validate().unwrap();
        }
    }

    #[test]
    fn test_generate_then_validate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cardsim-config.yaml");

        generate(&path, true, false).unwrap();
        validate(Some(path.clone())).unwrap();
        assert!(generate(&path, false, false).is_err());
        generate(&path, false, true).unwrap();
    }

    #[test]
    fn test_discovery_rendering_follows_candidates() {
        colored::control::set_override(false);
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.yaml");
        let second = dir.path().join("second.yaml");
        std::fs::write(&first, "").unwrap();
        std::fs::write(&second, "").unwrap();

        let candidates = vec![
            candidate("CARDSIM_CONFIG_PATH", None),
            candidate("working directory", Some(dir.path().join("absent.yaml"))),
            candidate("user home", Some(first.clone())),
            candidate("system", Some(second.clone())),
        ];

        let out = render_discovery(None, &candidates).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[1], "  1. --config: (not set)");
        assert_eq!(lines[2], "  2. CARDSIM_CONFIG_PATH:  (not set)");
        assert!(lines[3].starts_with("  3. working directory:") && lines[3].ends_with("(missing)"));
        assert!(lines[4].starts_with("  4. user home:") && lines[4].ends_with("(selected)"));
        assert!(lines[5].starts_with("  5. system:") && lines[5].ends_with("(shadowed)"));

        let explicit = render_discovery(Some(Path::new("card.yaml")), &candidates).unwrap();
        assert!(explicit.contains("--config: card.yaml (selected)"));
        assert!(explicit.contains("user home: ") && !explicit.contains("user home: (selected)"));
        assert_eq!(explicit.matches("(selected)").count(), 1);
    }

    #[test]
    fn test_discovery_rendering_without_any_file() {
        colored::control::set_override(false);
        let out = render_discovery(None, &[candidate("system", None)]).unwrap();
        assert!(out.contains("built-in defaults apply"));
    }
}
