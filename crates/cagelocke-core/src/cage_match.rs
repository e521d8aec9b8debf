//! Cage match records

use crate::error::{Error, Result};
use crate::identity::{MatchId, PokemonId, RunId};
use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// A resolved cage match
///
/// Participants are kept in selection order. The record is append-only
/// history; nothing ever edits a match after it is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CageMatch {
    /// Unique identifier, assigned by the store
    pub id: MatchId,
    /// Owning run
    pub run_id: RunId,
    /// Everyone who fought, in selection order
    pub participants: Vec<PokemonId>,
    /// The one who walked out
    pub winner: PokemonId,
    /// When the match was executed
    pub match_date: DateTime<Utc>,
}

impl CageMatch {
    /// Check the record's invariants
    pub fn validate(&self) -> Result<()> {
        if self.participants.len() < 2 {
            return Err(Error::NotEnoughParticipants(self.participants.len()));
        }
        let mut seen: IndexSet<&PokemonId> = IndexSet::new();
        for id in &self.participants {
            if !seen.insert(id) {
                return Err(Error::DuplicateParticipant(id.clone()));
            }
        }
        if !self.participants.contains(&self.winner) {
            return Err(Error::WinnerNotInMatch(self.winner.clone()));
        }
        Ok(())
    }
}
