// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Hex Notation Domain Service
//!
//! Parses the compact notation used throughout cardsim to write identities and
//! byte buffers by hand.
//!
//! ## Syntax
//!
//! | Input | Meaning |
//! |-------|---------|
//! | `ca fe` | hex digit pairs, case-insensitive, spaces ignored |
//! | `\|HELLO\|` | text mode: each character emitted as its byte value |
//! | `#(..)` `#<..>` `#{..}` | one-byte length prefix of the enclosed bytes (nestable) |
//!
//! Inside text mode, `#` without an opening bracket and unmatched closing
//! brackets are emitted literally.

use thiserror::Error;

/// Hex notation parse errors. Positions are 1-based except for
/// [`HexParseError::OddDigits`], which reports the index of the offending
/// character (or the input length when the input ends mid-byte).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HexParseError {
    #[error("Odd number of digits at position {position}")]
    OddDigits { position: usize },

    #[error("Can not parse input at {position}: {found}")]
    UnexpectedInput { position: usize, found: char },

    #[error("Missing closing '{0}'")]
    MissingClosing(char),
}

/// Open `#(`-style length record: where the prefix byte lives and which
/// character closes it.
struct LengthRecord {
    prefix_at: usize,
    closing: char,
}

/// Parse hex notation into bytes.
///
/// # Examples
/// ```
/// use cardsim_core::domain::hex_string;
///
/// assert_eq!(hex_string::parse("ca fe").unwrap(), vec![0xCA, 0xFE]);
/// assert_eq!(hex_string::parse("#(|HI)").unwrap(), vec![0x02, b'H', b'I']);
/// assert!(hex_string::parse("12z").is_err());
/// ```
pub fn parse(input: &str) -> Result<Vec<u8>, HexParseError> {
    let chars: Vec<char> = input.chars().collect();
    let mut out = Vec::with_capacity(chars.len());
    let mut records: Vec<LengthRecord> = Vec::new();
    let mut high_nibble: Option<u8> = None;
    let mut text_mode = false;

    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];
        match ch {
            c if c.is_ascii_hexdigit() => {
                if text_mode {
                    out.push(char_byte(c));
                } else if let Some(high) = high_nibble.take() {
                    out.push(high | nibble(c));
                } else {
                    high_nibble = Some(nibble(c) << 4);
                }
            }
            '|' => {
                if high_nibble.is_some() {
                    return Err(HexParseError::OddDigits { position: i });
                }
                text_mode = !text_mode;
            }
            ' ' => {
                if text_mode {
                    out.push(b' ');
                }
            }
            '#' => match chars.get(i + 1) {
                None if text_mode => out.push(b'#'),
                None => {
                    return Err(HexParseError::UnexpectedInput { position: i + 1, found: '#' });
                }
                Some(&next) => match closing_for(next) {
                    Some(closing) => {
                        i += 1;
                        records.push(LengthRecord { prefix_at: out.len(), closing });
                        out.push(0);
                    }
                    None if text_mode => out.push(b'#'),
                    None => {
                        return Err(HexParseError::UnexpectedInput { position: i + 1, found: next });
                    }
                },
            },
            '>' | ')' | '}' => match records.last() {
                Some(record) if record.closing == ch => {
                    let enclosed = out.len() - record.prefix_at - 1;
                    out[record.prefix_at] = (enclosed & 0xFF) as u8;
                    records.pop();
                }
                _ if text_mode => out.push(char_byte(ch)),
                _ => {
                    return Err(HexParseError::UnexpectedInput { position: i + 1, found: ch });
                }
            },
            _ if text_mode => out.push(char_byte(ch)),
            _ => return Err(HexParseError::UnexpectedInput { position: i + 1, found: ch }),
        }
        i += 1;
    }

    if let Some(record) = records.pop() {
        return Err(HexParseError::MissingClosing(record.closing));
    }
    if !text_mode && high_nibble.is_some() {
        return Err(HexParseError::OddDigits { position: chars.len() });
    }

    Ok(out)
}

/// Uppercase hex rendering without separators.
pub fn to_hex(bytes: &[u8]) -> String {
    hex::encode_upper(bytes)
}

fn closing_for(opening: char) -> Option<char> {
    match opening {
        '(' => Some(')'),
        '<' => Some('>'),
        '{' => Some('}'),
        _ => None,
    }
}

fn nibble(c: char) -> u8 {
    c.to_digit(16).map(|d| d as u8).unwrap_or(0)
}

fn char_byte(c: char) -> u8 {
    (u32::from(c) & 0xFF) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(input: &str) -> String {
        match parse(input) {
            Ok(bytes) => to_hex(&bytes),
            Err(e) => e.to_string(),
        }
    }

    #[test]
    fn test_plain_hex() {
        assert_eq!(render("ca"), "CA");
        assert_eq!(render("Ca"), "CA");
        assert_eq!(render("c a"), "CA");
        assert_eq!(render("ca fe"), "CAFE");
        assert_eq!(render(""), "");
    }

    #[test]
    fn test_length_prefixes() {
        assert_eq!(render("#(ca)"), "01CA");
        assert_eq!(render("#<ca>"), "01CA");
        assert_eq!(render("#{ca}"), "01CA");
        assert_eq!(render("|#(HELLO#(WORLD))"), "0B48454C4C4F05574F524C44");
        assert_eq!(render("#(|HELLO|#<01>)"), "0748454C4C4F0101");
    }

    #[test]
    fn test_text_mode() {
        assert_eq!(render("|HELLO|01"), "48454C4C4F01");
        assert_eq!(render("|HELLO WORLD"), "48454C4C4F20574F524C44");
        // Unmatched closers and bare '#' are literal inside text mode
        assert_eq!(render("|#(HE>)"), "0348453E");
        assert_eq!(render("|HELLO#"), "48454C4C4F23");
        assert_eq!(render("|HELLO#W"), "48454C4C4F2357");
    }

    #[test]
    fn test_invalid_inputs() {
        assert_eq!(render("ca a"), "Odd number of digits at position 4");
        assert_eq!(render("7|"), "Odd number of digits at position 1");
        assert_eq!(render("|HELLO|#"), "Can not parse input at 8: #");
        assert_eq!(render("12z"), "Can not parse input at 3: z");
        assert_eq!(render("12}"), "Can not parse input at 3: }");
        assert_eq!(render("cafe#x"), "Can not parse input at 5: x");
        assert_eq!(render("cafe#<22"), "Missing closing '>'");
    }
}
