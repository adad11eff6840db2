// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Application Identifier Value Object
//!
//! An [`Aid`] names a package or an applet. It is an immutable 5–16 byte string
//! compared by content. Parsing accepts the hex notation of
//! [`crate::domain::hex_string`], so `"F0 AA 00 00 01"` and `"f0aa000001"` are
//! the same identity.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::hex_string::{self, HexParseError};

pub const AID_MIN_LENGTH: usize = 5;
pub const AID_MAX_LENGTH: usize = 16;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AidError {
    #[error("AID must be 5 to 16 bytes, got {0}")]
    InvalidLength(usize),

    #[error("Invalid AID notation: {0}")]
    Notation(#[from] HexParseError),
}

/// Application identifier. `Copy` and fixed-size; bytes past the identifier's
/// length are always zero so derived equality compares content only.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Aid {
    bytes: [u8; AID_MAX_LENGTH],
    len: u8,
}

impl Aid {
    /// Build an identifier from raw bytes.
    ///
    /// # Errors
    ///
    /// [`AidError::InvalidLength`] unless `5 <= bytes.len() <= 16`.
    pub fn new(bytes: &[u8]) -> Result<Self, AidError> {
        if !(AID_MIN_LENGTH..=AID_MAX_LENGTH).contains(&bytes.len()) {
            return Err(AidError::InvalidLength(bytes.len()));
        }
        let mut buf = [0u8; AID_MAX_LENGTH];
        buf[..bytes.len()].copy_from_slice(bytes);
        Ok(Self {
            bytes: buf,
            len: bytes.len() as u8,
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..usize::from(self.len)]
    }

    /// True when `self` begins with the bytes of `other`. Applet identifiers are
    /// conventionally extensions of their package's RID.
    pub fn starts_with(&self, other: &Aid) -> bool {
        self.as_bytes().starts_with(other.as_bytes())
    }

    pub fn to_hex(&self) -> String {
        hex_string::to_hex(self.as_bytes())
    }
}

impl fmt::Display for Aid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Aid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Aid({})", self.to_hex())
    }
}

impl FromStr for Aid {
    type Err = AidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex_string::parse(s)?;
        Self::new(&bytes)
    }
}

impl TryFrom<&[u8]> for Aid {
    type Error = AidError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::new(bytes)
    }
}

impl TryFrom<String> for Aid {
    type Error = AidError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Aid> for String {
    fn from(aid: Aid) -> Self {
        aid.to_hex()
    }
}
