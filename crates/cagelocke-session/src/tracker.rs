//! Tracker - roster operations for one scope
//!
//! A tracker pairs a roster store with the scope the session selected and
//! carries the cage-match selection between calls. All mutations flow
//! through here so the fainting and counting rules cannot be bypassed by
//! writing to a store directly.

use crate::error::{Error, Result};
use cagelocke_core::{resolve_match, CageMatch, MatchOutcome, Pokemon, PokemonId, RunId};
use cagelocke_store::{RosterStore, Scope};
use chrono::Utc;
use std::sync::Arc;

/// Roster operations against whichever store a session selected
///
/// Trackers own their store handle and scope, so one can be kept across
/// a refresh without borrowing from the session that made it.
pub struct Tracker {
    /// Store serving this scope
    store: Arc<dyn RosterStore>,
    /// Which roster the tracker reads and writes
    scope: Scope,
    /// Pokemon picked for the next cage match, in pick order
    selected: Vec<PokemonId>,
}

impl Tracker {
    pub(crate) fn new(store: Arc<dyn RosterStore>, scope: Scope) -> Self {
        Self {
            store,
            scope,
            selected: Vec::new(),
        }
    }

    /// The scope this tracker serves
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Load the roster for this scope
    pub async fn roster(&self) -> Result<Vec<Pokemon>> {
        Ok(self.store.load_pokemon(&self.scope).await?)
    }

    /// Load the cage-match history for this scope
    pub async fn match_history(&self) -> Result<Vec<CageMatch>> {
        Ok(self.store.load_matches(&self.scope).await?)
    }

    /// Add a pokemon to the roster
    ///
    /// The store assigns the identity and creation time; the returned
    /// value is the row as stored.
    pub async fn add_pokemon(&self, name: &str, nickname: &str) -> Result<Pokemon> {
        let run_id = match &self.scope {
            Scope::Local => RunId::local(),
            Scope::Run(run_id) => run_id.clone(),
        };
        let pokemon = Pokemon::new(run_id, name, nickname, Utc::now())?;
        Ok(self.store.save_pokemon(pokemon).await?)
    }

    /// Toggle a pokemon in or out of the cage-match selection
    ///
    /// Returns whether the pokemon is selected afterwards. Deselecting
    /// always works; selecting a fainted pokemon is refused.
    pub fn toggle_selection(&mut self, pokemon: &Pokemon) -> Result<bool> {
        if let Some(index) = self.selected.iter().position(|id| id == &pokemon.id) {
            self.selected.remove(index);
            return Ok(false);
        }
        if !pokemon.is_alive {
            return Err(Error::Fainted(pokemon.id.clone()));
        }
        self.selected.push(pokemon.id.clone());
        Ok(true)
    }

    /// The current cage-match selection, in pick order
    pub fn selection(&self) -> &[PokemonId] {
        &self.selected
    }

    /// Drop the current selection without running a match
    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    /// Run a cage match between the selected pokemon
    ///
    /// Resolves the match, persists the updated rows and the match
    /// record, and clears the selection. On any failure the selection is
    /// kept so the caller can correct and retry.
    pub async fn execute_match(&mut self, winner: &PokemonId) -> Result<MatchOutcome> {
        let roster = self.roster().await?;
        let mut participants = Vec::with_capacity(self.selected.len());
        for id in &self.selected {
            let pokemon = roster
                .iter()
                .find(|p| &p.id == id)
                .cloned()
                .ok_or_else(|| Error::UnknownPokemon(id.clone()))?;
            participants.push(pokemon);
        }
        let mut outcome = resolve_match(&participants, winner, Utc::now())?;
        outcome.record = self
            .store
            .record_match(outcome.pokemon.clone(), outcome.record)
            .await?;
        self.selected.clear();
        Ok(outcome)
    }

    /// Grant a perk, writing only when it was not already held
    pub async fn add_perk(&self, pokemon: &Pokemon, perk: &str) -> Result<Pokemon> {
        let mut updated = pokemon.clone();
        if !updated.add_perk(perk)? {
            return Ok(updated);
        }
        Ok(self.store.save_pokemon(updated).await?)
    }

    /// Take a perk away, writing only when it was held
    pub async fn remove_perk(&self, pokemon: &Pokemon, perk: &str) -> Result<Pokemon> {
        let mut updated = pokemon.clone();
        if !updated.remove_perk(perk) {
            return Ok(updated);
        }
        Ok(self.store.save_pokemon(updated).await?)
    }

    /// Bring a fainted pokemon back, keeping its record intact
    pub async fn revive(&self, pokemon: &Pokemon) -> Result<Pokemon> {
        let mut updated = pokemon.clone();
        updated.revive();
        Ok(self.store.save_pokemon(updated).await?)
    }

    /// Release a pokemon and drop it from the selection
    pub async fn release(&mut self, id: &PokemonId) -> Result<()> {
        self.store.release_pokemon(id).await?;
        self.selected.retain(|selected| selected != id);
        Ok(())
    }
}

impl std::fmt::Debug for Tracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracker")
            .field("scope", &self.scope)
            .field("selected", &self.selected.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cagelocke_store::LocalStore;
    use tempfile::TempDir;

    fn local_tracker() -> (Tracker, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path()).unwrap();
        (Tracker::new(Arc::new(store), Scope::Local), dir)
    }

    #[tokio::test]
    async fn test_add_and_load_roster() {
        let (tracker, _dir) = local_tracker();

        let saved = tracker.add_pokemon("Totodile", "Chompers").await.unwrap();
        assert!(!saved.id.is_unassigned());
        assert_eq!(saved.nickname, "Chompers");

        let roster = tracker.roster().await.unwrap();
        assert_eq!(roster, vec![saved]);
    }

    #[tokio::test]
    async fn test_toggle_selection_round_trip() {
        let (mut tracker, _dir) = local_tracker();
        let saved = tracker.add_pokemon("Totodile", "").await.unwrap();

        assert!(tracker.toggle_selection(&saved).unwrap());
        assert_eq!(tracker.selection(), &[saved.id.clone()]);

        assert!(!tracker.toggle_selection(&saved).unwrap());
        assert!(tracker.selection().is_empty());
    }

    #[test]
    fn test_fainted_cannot_be_selected() {
        let (mut tracker, _dir) = local_tracker();

        let mut pokemon = Pokemon::new(RunId::local(), "Totodile", "", Utc::now()).unwrap();
        pokemon.id = PokemonId::new("row");
        pokemon.is_alive = false;
        assert!(matches!(
            tracker.toggle_selection(&pokemon),
            Err(Error::Fainted(_))
        ));
        assert!(tracker.selection().is_empty());

        // Deselecting still works if the pokemon fainted after being picked.
        pokemon.is_alive = true;
        assert!(tracker.toggle_selection(&pokemon).unwrap());
        pokemon.is_alive = false;
        assert!(!tracker.toggle_selection(&pokemon).unwrap());
    }

    #[tokio::test]
    async fn test_execute_match_updates_roster_and_clears_selection() {
        let (mut tracker, _dir) = local_tracker();
        let a = tracker.add_pokemon("Totodile", "").await.unwrap();
        let b = tracker.add_pokemon("Hoothoot", "").await.unwrap();

        tracker.toggle_selection(&a).unwrap();
        tracker.toggle_selection(&b).unwrap();
        let outcome = tracker.execute_match(&a.id).await.unwrap();

        assert!(!outcome.record.id.is_unassigned());
        assert!(tracker.selection().is_empty());

        let roster = tracker.roster().await.unwrap();
        let winner = roster.iter().find(|p| p.id == a.id).unwrap();
        let loser = roster.iter().find(|p| p.id == b.id).unwrap();
        assert_eq!((winner.wins, winner.losses), (1, 0));
        assert_eq!((loser.wins, loser.losses), (0, 1));

        let history = tracker.match_history().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].winner, a.id);
    }

    #[tokio::test]
    async fn test_selection_survives_failed_match() {
        let (mut tracker, _dir) = local_tracker();
        let a = tracker.add_pokemon("Totodile", "").await.unwrap();
        let b = tracker.add_pokemon("Hoothoot", "").await.unwrap();

        tracker.toggle_selection(&a).unwrap();
        assert!(matches!(
            tracker.execute_match(&a.id).await,
            Err(Error::Model(_))
        ));
        assert_eq!(tracker.selection().len(), 1);

        tracker.toggle_selection(&b).unwrap();
        let outsider = PokemonId::new("outsider");
        assert!(matches!(
            tracker.execute_match(&outsider).await,
            Err(Error::Model(_))
        ));
        assert_eq!(tracker.selection().len(), 2);
    }

    #[tokio::test]
    async fn test_stale_selection_is_reported() {
        let (mut tracker, _dir) = local_tracker();
        let a = tracker.add_pokemon("Totodile", "").await.unwrap();

        let mut ghost = Pokemon::new(RunId::local(), "Gastly", "", Utc::now()).unwrap();
        ghost.id = PokemonId::new("ghost");

        tracker.toggle_selection(&a).unwrap();
        tracker.toggle_selection(&ghost).unwrap();
        assert!(matches!(
            tracker.execute_match(&a.id).await,
            Err(Error::UnknownPokemon(_))
        ));
        assert_eq!(tracker.selection().len(), 2);
    }

    #[tokio::test]
    async fn test_perks_write_only_on_change() {
        let (tracker, _dir) = local_tracker();
        let saved = tracker.add_pokemon("Totodile", "").await.unwrap();

        let with_perk = tracker.add_perk(&saved, "Held Item").await.unwrap();
        assert!(with_perk.has_perk("Held Item"));

        let again = tracker.add_perk(&with_perk, "Held Item").await.unwrap();
        assert_eq!(again.perks.len(), 1);

        let without = tracker.remove_perk(&again, "Held Item").await.unwrap();
        assert!(!without.has_perk("Held Item"));
        assert!(tracker.roster().await.unwrap()[0].perks.is_empty());
    }

    #[tokio::test]
    async fn test_faint_and_revive_flow() {
        let (mut tracker, _dir) = local_tracker();
        let a = tracker.add_pokemon("Totodile", "").await.unwrap();
        let b = tracker.add_pokemon("Hoothoot", "").await.unwrap();

        for _ in 0..3 {
            let roster = tracker.roster().await.unwrap();
            let a_row = roster.iter().find(|p| p.id == a.id).unwrap().clone();
            let b_row = roster.iter().find(|p| p.id == b.id).unwrap().clone();
            tracker.toggle_selection(&a_row).unwrap();
            tracker.toggle_selection(&b_row).unwrap();
            tracker.execute_match(&a.id).await.unwrap();
        }

        let roster = tracker.roster().await.unwrap();
        let fainted = roster.iter().find(|p| p.id == b.id).unwrap();
        assert!(!fainted.is_alive);
        assert_eq!(fainted.losses, 3);
        assert!(matches!(
            tracker.toggle_selection(fainted),
            Err(Error::Fainted(_))
        ));

        let revived = tracker.revive(fainted).await.unwrap();
        assert!(revived.is_alive);
        assert_eq!(revived.losses, 3);
    }

    #[tokio::test]
    async fn test_release_clears_selection() {
        let (mut tracker, _dir) = local_tracker();
        let saved = tracker.add_pokemon("Totodile", "").await.unwrap();

        tracker.toggle_selection(&saved).unwrap();
        tracker.release(&saved.id).await.unwrap();

        assert!(tracker.selection().is_empty());
        assert!(tracker.roster().await.unwrap().is_empty());
    }
}
