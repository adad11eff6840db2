// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Identity Registry
//
// Package/applet association as reported by the installation subsystem. The
// firewall itself never consults it; channel selection uses it to find the
// package an applet runs under.

use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

use crate::domain::aid::Aid;
use crate::domain::card_config::CardConfigManifest;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Applet {applet} is already registered under package {package}")]
    AlreadyRegistered { applet: Aid, package: Aid },
}

#[derive(Debug, Default, Clone)]
pub struct IdentityRegistry {
    applets: HashMap<Aid, Aid>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry from the `spec.packages` table of a manifest.
    pub fn from_config(config: &CardConfigManifest) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for package in &config.spec.packages {
            for applet in &package.applets {
                registry.register(package.aid, *applet)?;
            }
        }
        Ok(registry)
    }

    /// Record that `applet` is an instance of `package`. Registering the same
    /// pair twice is accepted; moving an applet to another package is not.
    pub fn register(&mut self, package: Aid, applet: Aid) -> Result<(), RegistryError> {
        if let Some(existing) = self.applets.get(&applet) {
            if *existing == package {
                return Ok(());
            }
            return Err(RegistryError::AlreadyRegistered {
                applet,
                package: *existing,
            });
        }
        debug!(package = %package, applet = %applet, "Registered applet");
        self.applets.insert(applet, package);
        Ok(())
    }

    pub fn package_of(&self, applet: &Aid) -> Option<Aid> {
        self.applets.get(applet).copied()
    }

    /// Applets of `package`, in AID order.
    pub fn applets_of(&self, package: &Aid) -> Vec<Aid> {
        let mut applets: Vec<Aid> = self
            .applets
            .iter()
            .filter(|(_, p)| *p == package)
            .map(|(applet, _)| *applet)
            .collect();
        applets.sort();
        applets
    }

    pub fn len(&self) -> usize {
        self.applets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.applets.is_empty()
    }
}
