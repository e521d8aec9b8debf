//! Shared-store binding backed by an embedded database.
//!
//! Stands in for the hosted backend: run-owned rows, share-code lookup,
//! and change notifications, with the same row schema and the same write
//! granularity (one row per write, no cross-row transaction).

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::models::{
    from_micros, StoredCageMatch, StoredCageMatchKey, StoredPokemon, StoredPokemonKey, StoredRun,
    StoredRunKey,
};
use crate::port::{check_match_batch, RosterStore, RunDirectory, RunFilter, Scope};
use crate::subscription::{ChangeCallback, Subscription, Watchers};
use async_trait::async_trait;
use cagelocke_core::{
    CageMatch, MatchId, Pokemon, PokemonId, Run, RunId, ShareCode, SHARE_CODE_ALPHABET,
    SHARE_CODE_LEN,
};
use chrono::Utc;
use native_db::*;
use rand::Rng;
use std::path::Path;
use std::sync::{Arc, LazyLock};

// Static models for the database
static MODELS: LazyLock<Models> = LazyLock::new(|| {
    let mut models = Models::new();
    models.define::<StoredPokemon>().unwrap();
    models.define::<StoredRun>().unwrap();
    models.define::<StoredCageMatch>().unwrap();
    models
});

/// How often share-code generation retries before giving up.
const SHARE_CODE_ATTEMPTS: usize = 16;

/// Shared store binding.
///
/// Cloning shares the database and the watcher set, which is how several
/// clients of one run are modeled: every clone sees every write and every
/// clone's subscriptions hear about it.
#[derive(Clone)]
pub struct RemoteStore {
    db: Arc<Database<'static>>,
    watchers: Arc<Watchers>,
}

impl RemoteStore {
    /// Open or create a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Builder::new()
            .create(&MODELS, path.as_ref())
            .map_err(|e| Error::Transport(e.to_string()))?;
        Ok(Self {
            db: Arc::new(db),
            watchers: Arc::new(Watchers::default()),
        })
    }

    /// Open the store named by a configuration.
    ///
    /// Fails with a transport error when the configuration is incomplete,
    /// which is what an unconfigured deployment looks like to callers.
    pub fn connect(config: &StoreConfig) -> Result<Self> {
        if !config.is_configured() {
            return Err(Error::Transport(
                "shared store is not configured".to_string(),
            ));
        }
        Self::open(&config.url)
    }

    /// Create an in-memory store.
    pub fn in_memory() -> Result<Self> {
        let db = Builder::new()
            .create_in_memory(&MODELS)
            .map_err(|e| Error::Transport(e.to_string()))?;
        Ok(Self {
            db: Arc::new(db),
            watchers: Arc::new(Watchers::default()),
        })
    }

    fn put_pokemon(&self, mut pokemon: Pokemon) -> Result<Pokemon> {
        pokemon.validate()?;
        if pokemon.run_id.is_local() {
            return Err(Error::Unsupported(
                "the shared store only keeps run-owned rows".to_string(),
            ));
        }
        let rw = self.db.rw_transaction()?;
        let run: Option<StoredRun> = rw.get().primary(pokemon.run_id.as_str().to_string())?;
        if run.is_none() {
            return Err(Error::Constraint(format!(
                "{} does not name an existing run",
                pokemon.run_id
            )));
        }
        if pokemon.id.is_unassigned() {
            pokemon.id = PokemonId::new(mint_id());
            pokemon.created_at = Utc::now();
        } else {
            let existing: Option<StoredPokemon> =
                rw.get().primary(pokemon.id.as_str().to_string())?;
            if let Some(existing) = existing {
                if existing.run_id != pokemon.run_id.as_str() {
                    return Err(Error::Constraint(format!(
                        "{} cannot move to another run",
                        pokemon.id
                    )));
                }
                pokemon.created_at = from_micros(existing.created_at)?;
            }
        }
        rw.upsert(StoredPokemon::from_pokemon(&pokemon))?;
        rw.commit()?;
        self.watchers.notify(&pokemon.run_id);
        Ok(pokemon)
    }

    fn mark_released(&self, id: &PokemonId) -> Result<()> {
        let rw = self.db.rw_transaction()?;
        let row: Option<StoredPokemon> = rw.get().primary(id.as_str().to_string())?;
        let mut row = row.ok_or_else(|| Error::NotFound(format!("{id}")))?;
        row.is_alive = false;
        let run_id = RunId::new(row.run_id.clone());
        rw.upsert(row)?;
        rw.commit()?;
        self.watchers.notify(&run_id);
        Ok(())
    }

    fn pokemon_rows(&self, run_id: &RunId) -> Result<Vec<StoredPokemon>> {
        let r = self.db.r_transaction()?;
        let scan = r.scan().secondary::<StoredPokemon>(StoredPokemonKey::run_id)?;
        let iter = scan.start_with(run_id.as_str())?;
        let rows: std::result::Result<Vec<StoredPokemon>, _> = iter.collect();
        let mut rows = rows.map_err(|e| Error::Database(e.to_string()))?;
        // start_with is a prefix scan; keep exact owners only.
        rows.retain(|row| row.run_id == run_id.as_str());
        rows.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
        Ok(rows)
    }

    fn match_rows(&self, run_id: &RunId) -> Result<Vec<StoredCageMatch>> {
        let r = self.db.r_transaction()?;
        let scan = r
            .scan()
            .secondary::<StoredCageMatch>(StoredCageMatchKey::run_id)?;
        let iter = scan.start_with(run_id.as_str())?;
        let rows: std::result::Result<Vec<StoredCageMatch>, _> = iter.collect();
        let mut rows = rows.map_err(|e| Error::Database(e.to_string()))?;
        rows.retain(|row| row.run_id == run_id.as_str());
        rows.sort_by(|a, b| (a.match_date, &a.id).cmp(&(b.match_date, &b.id)));
        Ok(rows)
    }

    fn run_rows(&self) -> Result<Vec<StoredRun>> {
        let r = self.db.r_transaction()?;
        let scan = r.scan().primary::<StoredRun>()?;
        let iter = scan.all()?;
        let rows: std::result::Result<Vec<StoredRun>, _> = iter.collect();
        rows.map_err(|e| Error::Database(e.to_string()))
    }

    fn share_code_taken(&self, code: &ShareCode) -> Result<bool> {
        let r = self.db.r_transaction()?;
        let scan = r.scan().secondary::<StoredRun>(StoredRunKey::share_code)?;
        let iter = scan.start_with(code.as_str())?;
        for row in iter {
            let row = row.map_err(|e| Error::Database(e.to_string()))?;
            if row.share_code == code.as_str() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn generate_share_code(&self) -> Result<ShareCode> {
        let mut rng = rand::thread_rng();
        for _ in 0..SHARE_CODE_ATTEMPTS {
            let raw: String = (0..SHARE_CODE_LEN)
                .map(|_| {
                    let index = rng.gen_range(0..SHARE_CODE_ALPHABET.len());
                    SHARE_CODE_ALPHABET[index] as char
                })
                .collect();
            let code = ShareCode::parse(&raw)?;
            if !self.share_code_taken(&code)? {
                return Ok(code);
            }
        }
        Err(Error::Constraint(
            "could not allocate an unused share code".to_string(),
        ))
    }
}

#[async_trait]
impl RosterStore for RemoteStore {
    async fn load_pokemon(&self, scope: &Scope) -> Result<Vec<Pokemon>> {
        let run_id = require_run(scope)?;
        let rows = self.pokemon_rows(run_id)?;
        rows.iter().map(|row| row.to_pokemon()).collect()
    }

    async fn save_pokemon(&self, pokemon: Pokemon) -> Result<Pokemon> {
        self.put_pokemon(pokemon)
    }

    async fn release_pokemon(&self, id: &PokemonId) -> Result<()> {
        self.mark_released(id)
    }

    async fn load_matches(&self, scope: &Scope) -> Result<Vec<CageMatch>> {
        let run_id = require_run(scope)?;
        let rows = self.match_rows(run_id)?;
        rows.iter().map(|row| row.to_cage_match()).collect()
    }

    async fn record_match(&self, updated: Vec<Pokemon>, mut record: CageMatch) -> Result<CageMatch> {
        record.validate()?;
        check_match_batch(&updated, &record)?;
        // One row per write, like the backend: a mid-batch failure leaves
        // earlier rows written and surfaces to the caller.
        for pokemon in updated {
            self.put_pokemon(pokemon)?;
        }
        if record.id.is_unassigned() {
            record.id = MatchId::new(mint_id());
        }
        let rw = self.db.rw_transaction()?;
        rw.upsert(StoredCageMatch::from_cage_match(&record))?;
        rw.commit()?;
        Ok(record)
    }
}

#[async_trait]
impl RunDirectory for RemoteStore {
    async fn load_runs(&self, filter: RunFilter) -> Result<Vec<Run>> {
        let mut rows = self.run_rows()?;
        if filter == RunFilter::Public {
            rows.retain(|row| row.is_public);
        }
        rows.sort_by(|a, b| (b.created_at, &b.id).cmp(&(a.created_at, &a.id)));
        rows.iter().map(|row| row.to_run()).collect()
    }

    async fn create_run(&self, name: &str, description: &str) -> Result<Run> {
        let share_code = self.generate_share_code()?;
        let run = Run::new(
            RunId::new(mint_id()),
            name,
            description,
            share_code,
            Utc::now(),
        )?;
        let rw = self.db.rw_transaction()?;
        rw.upsert(StoredRun::from_run(&run))?;
        rw.commit()?;
        Ok(run)
    }

    async fn find_run_by_code(&self, code: &str) -> Result<Run> {
        let code = ShareCode::parse(code)?;
        let r = self.db.r_transaction()?;
        let scan = r.scan().secondary::<StoredRun>(StoredRunKey::share_code)?;
        let iter = scan.start_with(code.as_str())?;
        for row in iter {
            let row = row.map_err(|e| Error::Database(e.to_string()))?;
            if row.share_code == code.as_str() && row.is_public {
                return row.to_run();
            }
        }
        Err(Error::NotFound(format!("no public run with code {code}")))
    }

    fn subscribe(&self, run_id: &RunId, on_change: ChangeCallback) -> Subscription {
        Subscription::new(self.watchers.clone(), run_id.clone(), on_change)
    }
}

fn require_run(scope: &Scope) -> Result<&RunId> {
    scope
        .run_id()
        .ok_or_else(|| Error::Unsupported("the shared store only serves run scopes".to_string()))
}

fn mint_id() -> String {
    format!("{:032x}", rand::thread_rng().gen::<u128>())
}

impl From<native_db::db_type::Error> for Error {
    fn from(err: native_db::db_type::Error) -> Self {
        Error::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cagelocke_core::resolve_match;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn store_with_run() -> (RemoteStore, Run) {
        let store = RemoteStore::in_memory().unwrap();
        let run = store.create_run("Johto Cagelocke", "fresh start").await.unwrap();
        (store, run)
    }

    fn new_pokemon(run: &Run, name: &str) -> Pokemon {
        Pokemon::new(run.id.clone(), name, "", Utc::now()).unwrap()
    }

    #[tokio::test]
    async fn test_save_assigns_id_and_round_trips() {
        let (store, run) = store_with_run().await;

        let saved = store
            .save_pokemon(new_pokemon(&run, "Totodile"))
            .await
            .unwrap();
        assert!(!saved.id.is_unassigned());

        let roster = store
            .load_pokemon(&Scope::Run(run.id.clone()))
            .await
            .unwrap();
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0], saved);
    }

    #[tokio::test]
    async fn test_save_requires_existing_run() {
        let store = RemoteStore::in_memory().unwrap();
        let orphan = Pokemon::new(RunId::new("ghost"), "Totodile", "", Utc::now()).unwrap();

        assert!(matches!(
            store.save_pokemon(orphan).await,
            Err(Error::Constraint(_))
        ));
    }

    #[tokio::test]
    async fn test_update_keeps_created_at_and_run() {
        let (store, run) = store_with_run().await;
        let saved = store
            .save_pokemon(new_pokemon(&run, "Totodile"))
            .await
            .unwrap();
        let stamped = saved.created_at;

        let mut edited = saved.clone();
        edited.nickname = "Chompers".to_string();
        edited.created_at = Utc::now();
        let updated = store.save_pokemon(edited).await.unwrap();
        assert_eq!(updated.created_at, stamped);

        let other = store.create_run("Elsewhere", "").await.unwrap();
        let mut moved = saved;
        moved.run_id = other.id;
        assert!(matches!(
            store.save_pokemon(moved).await,
            Err(Error::Constraint(_))
        ));
    }

    #[tokio::test]
    async fn test_release_is_soft() {
        let (store, run) = store_with_run().await;
        let saved = store
            .save_pokemon(new_pokemon(&run, "Totodile"))
            .await
            .unwrap();

        store.release_pokemon(&saved.id).await.unwrap();

        // The row is still there, just fainted; a revive undoes the release.
        let roster = store
            .load_pokemon(&Scope::Run(run.id.clone()))
            .await
            .unwrap();
        assert_eq!(roster.len(), 1);
        assert!(!roster[0].is_alive);

        let mut revived = roster[0].clone();
        revived.revive();
        let revived = store.save_pokemon(revived).await.unwrap();
        assert!(revived.is_alive);
    }

    #[tokio::test]
    async fn test_release_unknown_is_not_found() {
        let store = RemoteStore::in_memory().unwrap();
        assert!(matches!(
            store.release_pokemon(&PokemonId::new("nope")).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_roster_loads_in_creation_order() {
        let (store, run) = store_with_run().await;
        store
            .save_pokemon(new_pokemon(&run, "Totodile"))
            .await
            .unwrap();
        store
            .save_pokemon(new_pokemon(&run, "Hoothoot"))
            .await
            .unwrap();
        store
            .save_pokemon(new_pokemon(&run, "Sentret"))
            .await
            .unwrap();

        let roster = store
            .load_pokemon(&Scope::Run(run.id.clone()))
            .await
            .unwrap();
        let names: Vec<&str> = roster.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Totodile", "Hoothoot", "Sentret"]);
    }

    #[tokio::test]
    async fn test_record_match_appends_history() {
        let (store, run) = store_with_run().await;
        let a = store
            .save_pokemon(new_pokemon(&run, "Totodile"))
            .await
            .unwrap();
        let b = store
            .save_pokemon(new_pokemon(&run, "Hoothoot"))
            .await
            .unwrap();

        let outcome = resolve_match(&[a.clone(), b], &a.id, Utc::now()).unwrap();
        store
            .record_match(outcome.pokemon, outcome.record)
            .await
            .unwrap();

        let history = store
            .load_matches(&Scope::Run(run.id.clone()))
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].winner, a.id);
    }

    #[tokio::test]
    async fn test_match_history_is_oldest_first() {
        let (store, run) = store_with_run().await;
        let a = store
            .save_pokemon(new_pokemon(&run, "Totodile"))
            .await
            .unwrap();
        let b = store
            .save_pokemon(new_pokemon(&run, "Hoothoot"))
            .await
            .unwrap();

        let later = Utc::now();
        let earlier = later - chrono::Duration::minutes(5);

        let first = resolve_match(&[a.clone(), b.clone()], &a.id, later).unwrap();
        let rows = first.pokemon.clone();
        store
            .record_match(first.pokemon, first.record)
            .await
            .unwrap();

        // Recorded second, dated first. History must sort by match date,
        // not by insertion.
        let second = resolve_match(&rows, &b.id, earlier).unwrap();
        store
            .record_match(second.pokemon, second.record)
            .await
            .unwrap();

        let history = store
            .load_matches(&Scope::Run(run.id.clone()))
            .await
            .unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].winner, b.id);
        assert_eq!(history[1].winner, a.id);
        assert!(history[0].match_date <= history[1].match_date);
    }

    #[tokio::test]
    async fn test_record_match_mid_batch_failure_keeps_earlier_rows() {
        let (store, run) = store_with_run().await;
        let a = store
            .save_pokemon(new_pokemon(&run, "Totodile"))
            .await
            .unwrap();
        let b = store
            .save_pokemon(new_pokemon(&run, "Hoothoot"))
            .await
            .unwrap();
        let c = store
            .save_pokemon(new_pokemon(&run, "Sentret"))
            .await
            .unwrap();

        let mut outcome =
            resolve_match(&[a.clone(), b.clone(), c.clone()], &a.id, Utc::now()).unwrap();
        // Poison the last row after resolution; the first two still land.
        outcome.pokemon[2].run_id = RunId::new("ghost");

        let err = store.record_match(outcome.pokemon, outcome.record).await;
        assert!(matches!(err, Err(Error::Constraint(_))));

        let roster = store
            .load_pokemon(&Scope::Run(run.id.clone()))
            .await
            .unwrap();
        let count_of = |id: &PokemonId| {
            roster
                .iter()
                .find(|p| &p.id == id)
                .map(|p| p.cage_match_count)
                .unwrap()
        };
        assert_eq!(count_of(&a.id), 1);
        assert_eq!(count_of(&b.id), 1);
        assert_eq!(count_of(&c.id), 0);

        // The failed batch never got its match record.
        assert!(store
            .load_matches(&Scope::Run(run.id.clone()))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_create_run_generates_distinct_codes() {
        let store = RemoteStore::in_memory().unwrap();
        let mut codes = Vec::new();
        for i in 0..20 {
            let run = store.create_run(&format!("Run {i}"), "").await.unwrap();
            codes.push(run.share_code.as_str().to_string());
        }
        let mut deduped = codes.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), codes.len());
    }

    #[tokio::test]
    async fn test_find_run_by_code_is_case_insensitive() {
        let (store, run) = store_with_run().await;
        let lower = run.share_code.as_str().to_ascii_lowercase();

        let found = store.find_run_by_code(&lower).await.unwrap();
        assert_eq!(found.id, run.id);

        let found = store.find_run_by_code(run.share_code.as_str()).await.unwrap();
        assert_eq!(found.id, run.id);
    }

    #[tokio::test]
    async fn test_find_run_by_code_misses() {
        let store = RemoteStore::in_memory().unwrap();
        assert!(matches!(
            store.find_run_by_code("QQQQ2222").await,
            Err(Error::NotFound(_))
        ));
        // Malformed input fails validation before any lookup.
        assert!(matches!(
            store.find_run_by_code("!!").await,
            Err(Error::Model(_))
        ));
    }

    #[tokio::test]
    async fn test_private_runs_are_hidden() {
        let (store, run) = store_with_run().await;

        // Unlist the run directly in the table.
        let rw = store.db.rw_transaction().unwrap();
        let mut row: StoredRun = rw
            .get()
            .primary(run.id.as_str().to_string())
            .unwrap()
            .unwrap();
        row.is_public = false;
        rw.upsert(row).unwrap();
        rw.commit().unwrap();

        assert!(matches!(
            store.find_run_by_code(run.share_code.as_str()).await,
            Err(Error::NotFound(_))
        ));
        assert!(store.load_runs(RunFilter::Public).await.unwrap().is_empty());
        assert_eq!(store.load_runs(RunFilter::All).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_public_runs_newest_first() {
        let store = RemoteStore::in_memory().unwrap();
        store.create_run("First", "").await.unwrap();
        store.create_run("Second", "").await.unwrap();

        let runs = store.load_runs(RunFilter::Public).await.unwrap();
        assert_eq!(runs.len(), 2);
        assert!(runs
            .windows(2)
            .all(|pair| pair[0].created_at >= pair[1].created_at));
    }

    #[tokio::test]
    async fn test_subscription_hears_run_writes_only() {
        let (store, run) = store_with_run().await;
        let other = store.create_run("Elsewhere", "").await.unwrap();

        let hits = Arc::new(AtomicUsize::new(0));
        let hits_in = hits.clone();
        let sub = store.subscribe(
            &run.id,
            Box::new(move || {
                hits_in.fetch_add(1, Ordering::SeqCst);
            }),
        );

        store
            .save_pokemon(new_pokemon(&run, "Totodile"))
            .await
            .unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        store
            .save_pokemon(new_pokemon(&other, "Rattata"))
            .await
            .unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        sub.unsubscribe();
        store
            .save_pokemon(new_pokemon(&run, "Hoothoot"))
            .await
            .unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_clone_shares_rows_and_watchers() {
        let (store, run) = store_with_run().await;
        let second_client = store.clone();

        let hits = Arc::new(AtomicUsize::new(0));
        let hits_in = hits.clone();
        let _sub = store.subscribe(
            &run.id,
            Box::new(move || {
                hits_in.fetch_add(1, Ordering::SeqCst);
            }),
        );

        second_client
            .save_pokemon(new_pokemon(&run, "Totodile"))
            .await
            .unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(
            store
                .load_pokemon(&Scope::Run(run.id.clone()))
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_local_scope_is_unsupported() {
        let store = RemoteStore::in_memory().unwrap();
        assert!(matches!(
            store.load_pokemon(&Scope::Local).await,
            Err(Error::Unsupported(_))
        ));
    }

    #[test]
    fn test_connect_unconfigured_is_transport_error() {
        let config = StoreConfig::default();
        assert!(matches!(
            RemoteStore::connect(&config),
            Err(Error::Transport(_))
        ));
    }

    #[test]
    fn test_mint_id_shape() {
        let id = mint_id();
        assert_eq!(id.len(), 32);
        assert!(id.bytes().all(|b| b.is_ascii_hexdigit()));
    }
}
