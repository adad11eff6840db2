// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Card Configuration Types
//
// Defines the configuration manifest of one simulated card:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - Logical channel count
// - Package/applet identity table handed to the IdentityRegistry

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use super::aid::Aid;

pub const API_VERSION: &str = "cardsim/v1";
pub const ENV_CONFIG_PATH: &str = "CARDSIM_CONFIG_PATH";
pub const KIND: &str = "CardConfig";

/// Upper bound on logical channels a card may expose.
pub const MAX_LOGICAL_CHANNELS: u8 = 20;

/// Top-level Kubernetes-style card configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardConfigManifest {
    /// API version (must be "cardsim/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "CardConfig")
    pub kind: String,

    /// Card metadata (name, labels)
    pub metadata: ManifestMetadata,

    /// Card configuration specification
    pub spec: CardConfigSpec,
}

/// Manifest metadata (Kubernetes-style)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    /// Human-readable card name
    pub name: String,

    /// Optional: Labels for categorization
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

/// Card configuration specification (content under spec:)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardConfigSpec {
    /// Number of logical channels, each with its own context stack
    #[serde(default = "default_logical_channels")]
    pub logical_channels: u8,

    /// Installed packages and the applets instantiated from each
    #[serde(default)]
    pub packages: Vec<PackageConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageConfig {
    /// Package AID
    pub aid: Aid,

    /// Applet instance AIDs belonging to this package
    #[serde(default)]
    pub applets: Vec<Aid>,
}

/// One configuration discovery location. `path` is `None` when the source is
/// unavailable (variable unset, no home directory).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryCandidate {
    pub source: &'static str,
    pub path: Option<PathBuf>,
}

impl DiscoveryCandidate {
    pub fn exists(&self) -> bool {
        self.path.as_deref().is_some_and(Path::exists)
    }
}

impl Default for CardConfigSpec {
    fn default() -> Self {
        Self {
            logical_channels: default_logical_channels(),
            packages: Vec::new(),
        }
    }
}

impl Default for CardConfigManifest {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: "cardsim".to_string(),
                labels: None,
            },
            spec: CardConfigSpec::default(),
        }
    }
}

impl CardConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Places configuration discovery looks, highest precedence first:
    /// 1. CARDSIM_CONFIG_PATH environment variable
    /// 2. ./cardsim-config.yaml (working directory)
    /// 3. ~/.cardsim/config.yaml (user home)
    /// 4. /etc/cardsim/config.yaml (system, Unix) or C:\ProgramData\Cardsim\config.yaml (Windows)
    pub fn discovery_candidates() -> Vec<DiscoveryCandidate> {
        #[cfg(unix)]
        let system_config = PathBuf::from("/etc/cardsim/config.yaml");
        #[cfg(windows)]
        let system_config = PathBuf::from("C:\\ProgramData\\Cardsim\\config.yaml");

        vec![
            DiscoveryCandidate {
                source: ENV_CONFIG_PATH,
                path: std::env::var_os(ENV_CONFIG_PATH).map(PathBuf::from),
            },
            DiscoveryCandidate {
                source: "working directory",
                path: Some(PathBuf::from("./cardsim-config.yaml")),
            },
            DiscoveryCandidate {
                source: "user home",
                path: dirs::home_dir().map(|home| home.join(".cardsim").join("config.yaml")),
            },
            DiscoveryCandidate {
                source: "system",
                path: Some(system_config),
            },
        ]
    }

    /// First existing file among [`Self::discovery_candidates`].
    pub fn discover_config() -> Option<PathBuf> {
        Self::discovery_candidates()
            .into_iter()
            .filter_map(|candidate| candidate.path)
            .find(|path| path.exists())
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // 1. Explicit CLI path (Fail if missing/invalid)
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        // 2. Discovery (Env -> Cwd -> Home -> System)
        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::warn!("No configuration file found in standard locations. Using empty defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("CARDSIM_LOGICAL_CHANNELS") {
            self.apply_logical_channels_override(&val);
        }
    }

    fn apply_logical_channels_override(&mut self, val: &str) {
        match val.trim().parse::<u8>() {
            Ok(channels) => {
                tracing::info!("Environment override: CARDSIM_LOGICAL_CHANNELS={}", channels);
                self.spec.logical_channels = channels;
            }
            Err(_) => {
                tracing::warn!(
                    "Invalid value for CARDSIM_LOGICAL_CHANNELS: '{}'. Expected a number. Ignoring.",
                    val
                );
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        if self.spec.logical_channels == 0 || self.spec.logical_channels > MAX_LOGICAL_CHANNELS {
            anyhow::bail!(
                "spec.logical_channels must be between 1 and {}, got {}",
                MAX_LOGICAL_CHANNELS,
                self.spec.logical_channels
            );
        }

        let mut packages = HashSet::new();
        let mut applets = HashSet::new();
        for package in &self.spec.packages {
            if !packages.insert(package.aid) {
                anyhow::bail!("Package {} is listed more than once", package.aid);
            }
            for applet in &package.applets {
                if !applets.insert(*applet) {
                    anyhow::bail!("Applet {} is listed more than once", applet);
                }
            }
        }

        Ok(())
    }
}

fn default_logical_channels() -> u8 {
    4
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
apiVersion: cardsim/v1
kind: CardConfig
metadata:
  name: dev-card
spec:
  logical_channels: 2
  packages:
    - aid: "F0AA000000"
      applets: ["F0AA000001", "F0AA000002"]
    - aid: "F0 BB 00 00 00"
      applets: ["F0BB000001"]
"#;

    #[test]
    fn test_default_manifest() {
        let manifest = CardConfigManifest::default();
        assert_eq!(manifest.api_version, "cardsim/v1");
        assert_eq!(manifest.kind, "CardConfig");
        assert_eq!(manifest.spec.logical_channels, 4);
        assert!(manifest.spec.packages.is_empty());
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_parse_sample() {
        let manifest = CardConfigManifest::from_yaml_str(SAMPLE).unwrap();
        assert_eq!(manifest.metadata.name, "dev-card");
        assert_eq!(manifest.spec.logical_channels, 2);
        assert_eq!(manifest.spec.packages.len(), 2);
        assert_eq!(manifest.spec.packages[1].aid.to_string(), "F0BB000000");
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_invalid_aid_rejected_at_parse() {
        let yaml = SAMPLE.replace("F0AA000001", "F0AA");
        assert!(CardConfigManifest::from_yaml_str(&yaml).is_err());
    }

    #[test]
    fn test_validation() {
        let mut manifest = CardConfigManifest::from_yaml_str(SAMPLE).unwrap();

        manifest.api_version = "wrong/v1".to_string();
        assert!(manifest.validate().is_err());
        manifest.api_version = API_VERSION.to_string();

        manifest.kind = "NodeConfig".to_string();
        assert!(manifest.validate().is_err());
        manifest.kind = KIND.to_string();

        manifest.spec.logical_channels = 0;
        assert!(manifest.validate().is_err());
        manifest.spec.logical_channels = 21;
        assert!(manifest.validate().is_err());
        manifest.spec.logical_channels = 20;
        assert!(manifest.validate().is_ok());

        // Same applet under two packages
        let duplicate = manifest.spec.packages[0].applets[0];
        manifest.spec.packages[1].applets.push(duplicate);
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn test_logical_channels_override() {
        let mut manifest = CardConfigManifest::default();
        manifest.apply_logical_channels_override("8");
        assert_eq!(manifest.spec.logical_channels, 8);
        manifest.apply_logical_channels_override("many");
        assert_eq!(manifest.spec.logical_channels, 8);
    }

    #[test]
    fn test_yaml_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("card.yaml");

        let manifest = CardConfigManifest::from_yaml_str(SAMPLE).unwrap();
        manifest.to_yaml_file(&path).unwrap();

        let loaded = CardConfigManifest::load_or_default(Some(path)).unwrap();
        assert_eq!(loaded.spec.packages, manifest.spec.packages);
    }

    #[test]
    fn test_discovery_candidates_order() {
        let candidates = CardConfigManifest::discovery_candidates();
        let sources: Vec<&str> = candidates.iter().map(|c| c.source).collect();
        assert_eq!(sources, vec![ENV_CONFIG_PATH, "working directory", "user home", "system"]);
        assert_eq!(candidates[1].path, Some(PathBuf::from("./cardsim-config.yaml")));
    }

    #[test]
    fn test_candidate_exists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let candidate = DiscoveryCandidate { source: "test", path: Some(path.clone()) };
        assert!(!candidate.exists());
        std::fs::write(&path, "").unwrap();
        assert!(candidate.exists());
        assert!(!DiscoveryCandidate { source: "unset", path: None }.exists());
    }

    #[test]
    fn test_missing_explicit_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.yaml");
        assert!(CardConfigManifest::load_or_default(Some(missing)).is_err());
    }
}
