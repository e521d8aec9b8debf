//! Row models for the shared store.
//!
//! Row fields use the external snake_case schema (`cage_matches`,
//! `is_alive`, `share_code`) so the data stays interoperable with the
//! backend this binding stands in for. Translation back into entity values
//! validates at the boundary: malformed rows fail here instead of leaking
//! into the match engine.

use crate::error::{Error, Result};
use cagelocke_core::{
    CageMatch, MatchId, Pokemon, PokemonId, Run, RunId, ShareCode,
};
use chrono::{DateTime, Utc};
use native_db::*;
use native_model::{native_model, Model};
use serde::{Deserialize, Serialize};

/// Stored Pokémon row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 1, version = 1)]
#[native_db]
pub struct StoredPokemon {
    /// Primary key - pokemon id.
    #[primary_key]
    pub id: String,
    /// Owning run.
    #[secondary_key]
    pub run_id: String,
    /// Species name.
    pub name: String,
    /// Display name.
    pub nickname: String,
    /// Total matches fought (`cage_match_count` internally).
    pub cage_matches: u32,
    /// Matches won.
    pub wins: u32,
    /// Matches lost.
    pub losses: u32,
    /// Earned perks, in earned order.
    pub perks: Vec<String>,
    /// False once fainted or released.
    pub is_alive: bool,
    /// Creation time, microseconds since the epoch.
    pub created_at: i64,
}

impl StoredPokemon {
    /// Create from a Pokémon record.
    pub fn from_pokemon(pokemon: &Pokemon) -> Self {
        Self {
            id: pokemon.id.as_str().to_string(),
            run_id: pokemon.run_id.as_str().to_string(),
            name: pokemon.name.clone(),
            nickname: pokemon.nickname.clone(),
            cage_matches: pokemon.cage_match_count,
            wins: pokemon.wins,
            losses: pokemon.losses,
            perks: pokemon.perks.iter().cloned().collect(),
            is_alive: pokemon.is_alive,
            created_at: pokemon.created_at.timestamp_micros(),
        }
    }

    /// Convert to a Pokémon record, validating the row.
    pub fn to_pokemon(&self) -> Result<Pokemon> {
        let pokemon = Pokemon {
            id: PokemonId::new(self.id.clone()),
            run_id: RunId::new(self.run_id.clone()),
            name: self.name.clone(),
            nickname: self.nickname.clone(),
            cage_match_count: self.cage_matches,
            wins: self.wins,
            losses: self.losses,
            perks: self.perks.iter().cloned().collect(),
            is_alive: self.is_alive,
            created_at: from_micros(self.created_at)?,
        };
        pokemon.validate()?;
        Ok(pokemon)
    }
}

/// Stored run row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 2, version = 1)]
#[native_db]
pub struct StoredRun {
    /// Primary key - run id.
    #[primary_key]
    pub id: String,
    /// Run name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Creator, when known.
    pub created_by: Option<String>,
    /// Creation time, microseconds since the epoch.
    pub created_at: i64,
    /// Whether the run is listed and joinable.
    pub is_public: bool,
    /// Join code, canonical uppercase, unique across runs.
    #[secondary_key(unique)]
    pub share_code: String,
}

impl StoredRun {
    /// Create from a run record.
    pub fn from_run(run: &Run) -> Self {
        Self {
            id: run.id.as_str().to_string(),
            name: run.name.clone(),
            description: run.description.clone(),
            created_by: run.created_by.clone(),
            created_at: run.created_at.timestamp_micros(),
            is_public: run.is_public,
            share_code: run.share_code.as_str().to_string(),
        }
    }

    /// Convert to a run record, validating the row.
    pub fn to_run(&self) -> Result<Run> {
        let run = Run {
            id: RunId::new(self.id.clone()),
            name: self.name.clone(),
            description: self.description.clone(),
            created_by: self.created_by.clone(),
            created_at: from_micros(self.created_at)?,
            is_public: self.is_public,
            share_code: ShareCode::parse(&self.share_code)?,
        };
        run.validate()?;
        Ok(run)
    }
}

/// Stored cage match row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 3, version = 1)]
#[native_db]
pub struct StoredCageMatch {
    /// Primary key - match id.
    #[primary_key]
    pub id: String,
    /// Owning run.
    #[secondary_key]
    pub run_id: String,
    /// Participant ids, in selection order.
    pub participants: Vec<String>,
    /// Winner id.
    pub winner: String,
    /// Execution time, microseconds since the epoch.
    pub match_date: i64,
}

impl StoredCageMatch {
    /// Create from a match record.
    pub fn from_cage_match(record: &CageMatch) -> Self {
        Self {
            id: record.id.as_str().to_string(),
            run_id: record.run_id.as_str().to_string(),
            participants: record
                .participants
                .iter()
                .map(|id| id.as_str().to_string())
                .collect(),
            winner: record.winner.as_str().to_string(),
            match_date: record.match_date.timestamp_micros(),
        }
    }

    /// Convert to a match record, validating the row.
    pub fn to_cage_match(&self) -> Result<CageMatch> {
        let record = CageMatch {
            id: MatchId::new(self.id.clone()),
            run_id: RunId::new(self.run_id.clone()),
            participants: self
                .participants
                .iter()
                .map(|id| PokemonId::new(id.clone()))
                .collect(),
            winner: PokemonId::new(self.winner.clone()),
            match_date: from_micros(self.match_date)?,
        };
        record.validate()?;
        Ok(record)
    }
}

pub(crate) fn from_micros(micros: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_micros(micros)
        .ok_or_else(|| Error::Serialization(format!("timestamp out of range: {micros}")))
}
