//! The persistence port: what every binding must offer.

use crate::error::{Error, Result};
use crate::subscription::{ChangeCallback, Subscription};
use async_trait::async_trait;
use cagelocke_core::{CageMatch, Pokemon, PokemonId, Run, RunId};
use indexmap::IndexSet;

/// Which roster a request is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// The local pseudo-run. Served by the file binding only.
    Local,
    /// A shared run. Served by the shared-store binding only.
    Run(RunId),
}

impl Scope {
    /// The run id, when this scope names one.
    pub fn run_id(&self) -> Option<&RunId> {
        match self {
            Scope::Local => None,
            Scope::Run(id) => Some(id),
        }
    }
}

/// Filter for run listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunFilter {
    /// Every run.
    All,
    /// Public runs only.
    Public,
}

/// Roster persistence. Both bindings implement this.
#[async_trait]
pub trait RosterStore: Send + Sync {
    /// Load the roster for a scope, in creation order.
    ///
    /// Asking a binding for a scope it does not serve fails with
    /// [`Error::Unsupported`].
    async fn load_pokemon(&self, scope: &Scope) -> Result<Vec<Pokemon>>;

    /// Upsert a Pokémon and return the stored value.
    ///
    /// An unassigned id means insert: the store mints an id and stamps
    /// `created_at`. Updates keep the original `created_at` and cannot move
    /// a Pokémon to another run.
    async fn save_pokemon(&self, pokemon: Pokemon) -> Result<Pokemon>;

    /// Release a Pokémon from the roster.
    ///
    /// The bindings deliberately disagree here: the local store deletes the
    /// record for good, the shared store only marks it fainted so other
    /// players keep seeing the row and a revive can undo the release.
    async fn release_pokemon(&self, id: &PokemonId) -> Result<()>;

    /// Load the match history for a scope, oldest first.
    async fn load_matches(&self, scope: &Scope) -> Result<Vec<CageMatch>>;

    /// Persist a resolved match: the updated participants plus the record.
    ///
    /// The local binding validates the whole batch before touching anything,
    /// so a failure leaves no partial update. The shared binding writes one
    /// row at a time and surfaces the first failure with earlier rows
    /// already written, which is the exact behavior of the backend it
    /// stands in for.
    async fn record_match(&self, updated: Vec<Pokemon>, record: CageMatch) -> Result<CageMatch>;
}

/// Run lookup and lifecycle. Only the shared binding has runs.
#[async_trait]
pub trait RunDirectory: Send + Sync {
    /// List runs, newest first.
    async fn load_runs(&self, filter: RunFilter) -> Result<Vec<Run>>;

    /// Create a run with a freshly generated unique share code.
    ///
    /// Name and description are trimmed; an empty name is rejected.
    async fn create_run(&self, name: &str, description: &str) -> Result<Run>;

    /// Find a public run by share code, case-insensitively.
    async fn find_run_by_code(&self, code: &str) -> Result<Run>;

    /// Watch a run's roster for changes.
    ///
    /// The callback carries no payload; it means "something changed,
    /// re-fetch". Writers hear their own writes. The registration lives
    /// until the returned handle is unsubscribed or dropped.
    fn subscribe(&self, run_id: &RunId, on_change: ChangeCallback) -> Subscription;
}

/// Check that a match record covers exactly the rows being written.
///
/// One row per participant: every updated id must be a participant, no id
/// may appear twice, and the counts must agree, so a duplicated row cannot
/// stand in for a dropped one.
pub(crate) fn check_match_batch(updated: &[Pokemon], record: &CageMatch) -> Result<()> {
    let mut seen: IndexSet<&PokemonId> = IndexSet::new();
    for pokemon in updated {
        if !record.participants.contains(&pokemon.id) {
            return Err(Error::Constraint(format!(
                "updated {} is not a participant of the match being recorded",
                pokemon.id
            )));
        }
        if !seen.insert(&pokemon.id) {
            return Err(Error::Constraint(format!(
                "the batch carries two rows for {}",
                pokemon.id
            )));
        }
    }
    if updated.len() != record.participants.len() {
        return Err(Error::Constraint(
            "match record does not cover every updated participant".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cagelocke_core::MatchId;
    use chrono::Utc;

    fn fighter(id: &str) -> Pokemon {
        let mut pokemon = Pokemon::new(RunId::local(), id, "", Utc::now()).unwrap();
        pokemon.id = PokemonId::new(id);
        pokemon
    }

    fn record(ids: &[&str]) -> CageMatch {
        CageMatch {
            id: MatchId::unassigned(),
            run_id: RunId::local(),
            participants: ids.iter().map(|s| PokemonId::new(*s)).collect(),
            winner: PokemonId::new(ids[0]),
            match_date: Utc::now(),
        }
    }

    #[test]
    fn test_scope_run_id() {
        assert_eq!(Scope::Local.run_id(), None);
        let id = RunId::new("r1");
        assert_eq!(Scope::Run(id.clone()).run_id(), Some(&id));
    }

    #[test]
    fn test_check_match_batch() {
        let batch = vec![fighter("a"), fighter("b")];
        assert!(check_match_batch(&batch, &record(&["a", "b"])).is_ok());

        // A row the record does not mention.
        assert!(check_match_batch(&batch, &record(&["a", "c"])).is_err());

        // A participant with no updated row.
        assert!(check_match_batch(&batch[..1].to_vec(), &record(&["a", "b"])).is_err());
    }

    #[test]
    fn test_check_match_batch_rejects_duplicate_rows() {
        // Two rows for "a" must not pass for the missing "b" row.
        let doubled = vec![fighter("a"), fighter("a")];
        assert!(check_match_batch(&doubled, &record(&["a", "b"])).is_err());
    }
}
