//! Share codes for joining shared runs
//!
//! Codes are short, human-typable, and case-insensitive: whatever a player
//! types is canonicalized to uppercase before lookup. The alphabet leaves
//! out characters that are easy to misread (I, L, O, 0, 1).

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of every share code
pub const SHARE_CODE_LEN: usize = 8;

/// Characters a share code may contain
pub const SHARE_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

/// A validated run share code in canonical (uppercase) form
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShareCode(String);

impl ShareCode {
    /// Parse user input into a canonical share code
    ///
    /// Trims surrounding whitespace and uppercases the rest, so
    /// `"abc23def"` and `"ABC23DEF"` parse to the same code.
    pub fn parse(input: &str) -> Result<Self> {
        let code = input.trim().to_ascii_uppercase();
        if code.len() != SHARE_CODE_LEN {
            return Err(Error::InvalidShareCode(input.trim().to_string()));
        }
        if !code.bytes().all(|b| SHARE_CODE_ALPHABET.contains(&b)) {
            return Err(Error::InvalidShareCode(input.trim().to_string()));
        }
        Ok(Self(code))
    }

    /// Get the code as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShareCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonicalizes_case() {
        let lower = ShareCode::parse("abc23def").unwrap();
        let upper = ShareCode::parse("ABC23DEF").unwrap();
        assert_eq!(lower, upper);
        assert_eq!(lower.as_str(), "ABC23DEF");
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let code = ShareCode::parse("  QRST2345 ").unwrap();
        assert_eq!(code.as_str(), "QRST2345");
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        assert!(ShareCode::parse("ABC").is_err());
        assert!(ShareCode::parse("ABC23DEF9").is_err());
        assert!(ShareCode::parse("").is_err());
    }

    #[test]
    fn test_parse_rejects_ambiguous_characters() {
        // I, L, O, 0 and 1 are not in the alphabet.
        assert!(ShareCode::parse("ABC10DEF").is_err());
        assert!(ShareCode::parse("ILOVECAT").is_err());
    }

    #[test]
    fn test_alphabet_is_uppercase_only() {
        for b in SHARE_CODE_ALPHABET {
            assert!(b.is_ascii_uppercase() || b.is_ascii_digit());
        }
    }
}
