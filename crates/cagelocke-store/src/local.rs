//! Local-only binding: JSON files on disk, no runs, no sharing.
//!
//! The whole roster lives in two keyed files that are read once at open
//! and rewritten wholesale on every mutation. Writes go through a temp
//! file and a rename so a crash never leaves a half-written file behind.

use crate::error::{Error, Result};
use crate::port::{check_match_batch, RosterStore, Scope};
use async_trait::async_trait;
use cagelocke_core::{CageMatch, MatchId, Pokemon, PokemonId};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Storage key for the roster.
pub const POKEMON_KEY: &str = "pokemon-cagelocke";
/// Storage key for the match history.
pub const MATCHES_KEY: &str = "cage-matches";

/// File-backed store for a single local player.
pub struct LocalStore {
    dir: PathBuf,
    state: Mutex<LocalState>,
}

#[derive(Default)]
struct LocalState {
    pokemon: Vec<Pokemon>,
    matches: Vec<CageMatch>,
}

impl LocalStore {
    /// Open or create the store under the given directory.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        let pokemon = read_entries(&dir.join(file_name(POKEMON_KEY)))?;
        let matches = read_entries(&dir.join(file_name(MATCHES_KEY)))?;
        Ok(Self {
            dir,
            state: Mutex::new(LocalState { pokemon, matches }),
        })
    }

    fn state(&self) -> MutexGuard<'_, LocalState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn file_path(&self, key: &str) -> PathBuf {
        self.dir.join(file_name(key))
    }

    fn check_scope(scope: &Scope) -> Result<()> {
        match scope {
            Scope::Local => Ok(()),
            Scope::Run(id) => Err(Error::Unsupported(format!(
                "the local store keeps no runs (requested {id})"
            ))),
        }
    }

    fn check_local_owner(pokemon: &Pokemon) -> Result<()> {
        if pokemon.run_id.is_local() {
            Ok(())
        } else {
            Err(Error::Unsupported(format!(
                "the local store keeps no runs ({} belongs to {})",
                pokemon.id, pokemon.run_id
            )))
        }
    }

    fn put_pokemon(&self, mut pokemon: Pokemon) -> Result<Pokemon> {
        pokemon.validate()?;
        Self::check_local_owner(&pokemon)?;

        let mut state = self.state();
        if pokemon.id.is_unassigned() {
            let id = mint_id(|id| state.pokemon.iter().any(|p| p.id.as_str() == id));
            pokemon.id = PokemonId::new(id);
            pokemon.created_at = Utc::now();
            state.pokemon.push(pokemon.clone());
        } else if let Some(slot) = state.pokemon.iter_mut().find(|p| p.id == pokemon.id) {
            pokemon.created_at = slot.created_at;
            *slot = pokemon.clone();
        } else {
            state.pokemon.push(pokemon.clone());
        }
        write_entries(&self.file_path(POKEMON_KEY), &state.pokemon)?;
        Ok(pokemon)
    }

    fn delete_pokemon(&self, id: &PokemonId) -> Result<()> {
        let mut state = self.state();
        let before = state.pokemon.len();
        state.pokemon.retain(|p| &p.id != id);
        if state.pokemon.len() == before {
            return Err(Error::NotFound(format!("{id}")));
        }
        write_entries(&self.file_path(POKEMON_KEY), &state.pokemon)
    }

    fn apply_match(&self, updated: Vec<Pokemon>, mut record: CageMatch) -> Result<CageMatch> {
        record.validate()?;
        check_match_batch(&updated, &record)?;
        for pokemon in &updated {
            pokemon.validate()?;
            Self::check_local_owner(pokemon)?;
        }

        let mut state = self.state();

        // The whole batch must resolve before anything is touched.
        let mut slots = Vec::with_capacity(updated.len());
        for pokemon in &updated {
            let slot = state
                .pokemon
                .iter()
                .position(|p| p.id == pokemon.id)
                .ok_or_else(|| Error::NotFound(format!("{}", pokemon.id)))?;
            slots.push(slot);
        }
        for (slot, mut pokemon) in slots.into_iter().zip(updated) {
            pokemon.created_at = state.pokemon[slot].created_at;
            state.pokemon[slot] = pokemon;
        }
        if record.id.is_unassigned() {
            let id = mint_id(|id| state.matches.iter().any(|m| m.id.as_str() == id));
            record.id = MatchId::new(id);
        }
        state.matches.push(record.clone());

        write_entries(&self.file_path(POKEMON_KEY), &state.pokemon)?;
        write_entries(&self.file_path(MATCHES_KEY), &state.matches)?;
        Ok(record)
    }
}

#[async_trait]
impl RosterStore for LocalStore {
    async fn load_pokemon(&self, scope: &Scope) -> Result<Vec<Pokemon>> {
        Self::check_scope(scope)?;
        Ok(self.state().pokemon.clone())
    }

    async fn save_pokemon(&self, pokemon: Pokemon) -> Result<Pokemon> {
        self.put_pokemon(pokemon)
    }

    async fn release_pokemon(&self, id: &PokemonId) -> Result<()> {
        self.delete_pokemon(id)
    }

    async fn load_matches(&self, scope: &Scope) -> Result<Vec<CageMatch>> {
        Self::check_scope(scope)?;
        Ok(self.state().matches.clone())
    }

    async fn record_match(&self, updated: Vec<Pokemon>, record: CageMatch) -> Result<CageMatch> {
        self.apply_match(updated, record)
    }
}

fn file_name(key: &str) -> String {
    format!("{key}.json")
}

fn mint_id(is_taken: impl Fn(&str) -> bool) -> String {
    let mut candidate = Utc::now().timestamp_millis();
    while is_taken(&candidate.to_string()) {
        candidate += 1;
    }
    candidate.to_string()
}

fn read_entries<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn write_entries<T: Serialize>(path: &Path, entries: &[T]) -> Result<()> {
    let json = serde_json::to_string(entries)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
