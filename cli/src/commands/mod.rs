// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for cardsim CLI

pub mod aid;
pub mod config;
pub mod firewall;

pub use self::aid::AidCommand;
pub use self::config::ConfigCommand;
pub use self::firewall::FirewallCommand;
