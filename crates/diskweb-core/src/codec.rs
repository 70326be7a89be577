//! Address codec.
//!
//! Percent-escapes raw strings so they fit inside a single address segment.
//! Every byte outside the unreserved set is written as `%XX`, which means an
//! encoded value never contains `/` and can never be confused with a segment
//! boundary.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::config::UNRESERVED_MARKS;

const HEX_UPPER: &[u8; 16] = b"0123456789ABCDEF";

// ============================================================================
// Errors
// ============================================================================

/// Why an encoded segment could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeErrorKind {
    /// `%` not followed by two hex digits.
    InvalidEscape,
    /// Escapes unpack to bytes that are not UTF-8.
    InvalidUtf8,
    /// A raw `/` inside a value that must stay one segment.
    UnescapedSeparator,
}

impl fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEscape => write!(f, "malformed escape sequence"),
            Self::InvalidUtf8 => write!(f, "escaped bytes are not valid UTF-8"),
            Self::UnescapedSeparator => write!(f, "unescaped '/'"),
        }
    }
}

/// A segment contained an escape sequence that cannot be reversed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at byte {position}")]
pub struct DecodeError {
    /// Byte offset of the offending sequence.
    pub position: usize,
    pub kind: DecodeErrorKind,
}

// ============================================================================
// EncodedSegment
// ============================================================================

/// A string that is safe to embed as one address segment.
///
/// Only obtainable through [`encode`] or [`EncodedSegment::parse`], so every
/// value decodes without error.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EncodedSegment(String);

impl EncodedSegment {
    /// Validate text that is already encoded.
    ///
    /// Rejects raw `/` and escapes that [`decode`] would reject.
    pub fn parse(raw: &str) -> Result<Self, DecodeError> {
        if let Some(position) = raw.find('/') {
            return Err(DecodeError {
                position,
                kind: DecodeErrorKind::UnescapedSeparator,
            });
        }
        decode(raw)?;
        Ok(Self(raw.to_string()))
    }

    /// The encoded text.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Recover the raw value.
    pub fn decode(&self) -> String {
        // Construction guarantees a well-formed value.
        decode(&self.0).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for EncodedSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EncodedSegment {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for EncodedSegment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Encoding
// ============================================================================

#[inline]
fn is_unreserved(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || UNRESERVED_MARKS.contains(&byte)
}

/// Encode a raw string into a single address segment.
pub fn encode(raw: &str) -> EncodedSegment {
    let mut out = String::with_capacity(raw.len());
    for &byte in raw.as_bytes() {
        if is_unreserved(byte) {
            out.push(byte as char);
        } else {
            out.push('%');
            out.push(HEX_UPPER[(byte >> 4) as usize] as char);
            out.push(HEX_UPPER[(byte & 0x0f) as usize] as char);
        }
    }
    EncodedSegment(out)
}

#[inline]
fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// Decode an encoded segment back into the raw string.
///
/// Characters that should have been escaped but were not are passed
/// through, so hand-typed addresses still resolve.
pub fn decode(segment: &str) -> Result<String, DecodeError> {
    let bytes = segment.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'%' {
            out.push(bytes[i]);
            i += 1;
            continue;
        }

        let hi = bytes.get(i + 1).copied().and_then(hex_value);
        let lo = bytes.get(i + 2).copied().and_then(hex_value);
        let (Some(hi), Some(lo)) = (hi, lo) else {
            return Err(DecodeError {
                position: i,
                kind: DecodeErrorKind::InvalidEscape,
            });
        };
        out.push((hi << 4) | lo);
        i += 3;
    }

    String::from_utf8(out).map_err(|e| DecodeError {
        position: e.utf8_error().valid_up_to(),
        kind: DecodeErrorKind::InvalidUtf8,
    })
}

// ============================================================================
// Tests
// ============================================================================
