//! Pokémon records and their lifecycle invariants

use crate::error::{Error, Result};
use crate::identity::{PokemonId, RunId};
use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// A tracked Pokémon
///
/// The record keeps its own win/loss arithmetic honest: after every
/// transition, `cage_match_count == wins + losses` must hold, and
/// [`Pokemon::validate`] checks exactly that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pokemon {
    /// Unique identifier, assigned by the store on first save
    pub id: PokemonId,
    /// Owning run (the local pseudo-run outside shared mode)
    pub run_id: RunId,
    /// Species name
    pub name: String,
    /// Display name, defaults to the species name
    pub nickname: String,
    /// Total cage matches fought
    pub cage_match_count: u32,
    /// Matches won
    pub wins: u32,
    /// Matches lost
    pub losses: u32,
    /// Earned perks, deduplicated, in the order they were earned
    pub perks: IndexSet<String>,
    /// False once the Pokémon faints; revivable by hand
    pub is_alive: bool,
    /// Creation time, stamped by the store and never changed afterwards
    pub created_at: DateTime<Utc>,
}

impl Pokemon {
    /// Create a fresh record ready for its first save
    ///
    /// Trims both names; an empty nickname falls back to the species name,
    /// an empty species name is rejected.
    pub fn new(run_id: RunId, name: &str, nickname: &str, now: DateTime<Utc>) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::EmptyField("name"));
        }
        let nickname = nickname.trim();
        let nickname = if nickname.is_empty() { name } else { nickname };
        Ok(Self {
            id: PokemonId::unassigned(),
            run_id,
            name: name.to_string(),
            nickname: nickname.to_string(),
            cage_match_count: 0,
            wins: 0,
            losses: 0,
            perks: IndexSet::new(),
            is_alive: true,
            created_at: now,
        })
    }

    /// Check the record's invariants
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::EmptyField("name"));
        }
        // Sum in u64: the fields are public, so the check must report even
        // values whose u32 sum would overflow.
        if self.cage_match_count as u64 != self.wins as u64 + self.losses as u64 {
            return Err(Error::CountMismatch {
                id: self.id.clone(),
                count: self.cage_match_count,
                wins: self.wins,
                losses: self.losses,
            });
        }
        Ok(())
    }

    /// Add a perk; returns false when it was already present
    pub fn add_perk(&mut self, perk: &str) -> Result<bool> {
        let perk = perk.trim();
        if perk.is_empty() {
            return Err(Error::EmptyField("perk"));
        }
        Ok(self.perks.insert(perk.to_string()))
    }

    /// Remove a perk; returns false when it was not present
    pub fn remove_perk(&mut self, perk: &str) -> bool {
        self.perks.shift_remove(perk.trim())
    }

    /// Check whether a perk is present
    pub fn has_perk(&self, perk: &str) -> bool {
        self.perks.contains(perk.trim())
    }

    /// Bring a fainted Pokémon back
    ///
    /// Always sets `is_alive` and leaves the loss count alone, so the next
    /// loss faints it again.
    pub fn revive(&mut self) {
        self.is_alive = true;
    }
}
