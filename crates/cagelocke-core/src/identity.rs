//! Identity types for tracked records

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a Pokémon record
///
/// The empty string is the "not yet persisted" sentinel: the store assigns
/// a real identifier on first save.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct PokemonId(pub String);

impl PokemonId {
    /// Create a new Pokémon ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The sentinel for a record the store has not assigned an ID yet
    pub fn unassigned() -> Self {
        Self(String::new())
    }

    /// Check whether this is the unassigned sentinel
    pub fn is_unassigned(&self) -> bool {
        self.0.is_empty()
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PokemonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pokemon:{}", self.0)
    }
}

impl From<&str> for PokemonId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for PokemonId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Identifier for a Run
///
/// The empty string is the local pseudo-run: Pokémon tracked without any
/// shared run carry it as their owner.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct RunId(pub String);

impl RunId {
    /// Create a new run ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The local pseudo-run owner
    pub fn local() -> Self {
        Self(String::new())
    }

    /// Check whether this is the local pseudo-run
    pub fn is_local(&self) -> bool {
        self.0.is_empty()
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_local() {
            write!(f, "run:local")
        } else {
            write!(f, "run:{}", self.0)
        }
    }
}

impl From<&str> for RunId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for RunId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Unique identifier for a cage match record
///
/// Assigned by the store like [`PokemonId`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct MatchId(pub String);

impl MatchId {
    /// Create a new match ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The sentinel for a record the store has not assigned an ID yet
    pub fn unassigned() -> Self {
        Self(String::new())
    }

    /// Check whether this is the unassigned sentinel
    pub fn is_unassigned(&self) -> bool {
        self.0.is_empty()
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "match:{}", self.0)
    }
}

impl From<&str> for MatchId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for MatchId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pokemon_id() {
        let id = PokemonId::new("1724072400000");
        assert_eq!(id.as_str(), "1724072400000");
        assert!(!id.is_unassigned());
        assert_eq!(format!("{}", id), "pokemon:1724072400000");

        assert!(PokemonId::unassigned().is_unassigned());
    }

    #[test]
    fn test_run_id_local_sentinel() {
        let local = RunId::local();
        assert!(local.is_local());
        assert_eq!(format!("{}", local), "run:local");

        let shared = RunId::new("abc123");
        assert!(!shared.is_local());
        assert_eq!(shared.as_str(), "abc123");
    }

    #[test]
    fn test_match_id() {
        let id = MatchId::new("m-1");
        assert_eq!(id.as_str(), "m-1");
        assert!(MatchId::unassigned().is_unassigned());
    }
}
