//! Session - mode and run selection
//!
//! A session owns the store handles and decides which scope trackers get.
//! Local sessions have no run directory, so everything run-related is
//! refused up front instead of failing somewhere inside a store call.

use crate::error::{Error, Result};
use crate::tracker::Tracker;
use cagelocke_core::Run;
use cagelocke_store::{
    ChangeCallback, LocalStore, RemoteStore, RosterStore, RunDirectory, RunFilter, Scope,
    Subscription,
};
use std::sync::Arc;

/// Coordinator for one player's session
///
/// Holds the roster store, the optional run directory, the selected run,
/// and at most one roster watch. Trackers are handed out per scope and
/// stay valid after the session moves on.
///
/// ```no_run
/// use cagelocke_session::Session;
/// use cagelocke_store::LocalStore;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let session = Session::local(LocalStore::open("/tmp/cagelocke")?);
/// let tracker = session.tracker()?;
/// assert!(tracker.selection().is_empty());
/// # Ok(())
/// # }
/// ```
pub struct Session {
    /// Store serving roster reads and writes
    roster: Arc<dyn RosterStore>,
    /// Run directory, present in online sessions only
    directory: Option<Arc<dyn RunDirectory>>,
    /// The run this session currently plays in
    current_run: Option<Run>,
    /// Public runs from the last refresh
    public_runs: Vec<Run>,
    /// Active roster watch, at most one
    watch: Option<Subscription>,
}

impl Session {
    /// Create a session from explicit store handles
    ///
    /// This is the seam the mode constructors go through; tests and
    /// alternative bindings can inject their own stores here.
    pub fn new(
        roster: Arc<dyn RosterStore>,
        directory: Option<Arc<dyn RunDirectory>>,
    ) -> Self {
        Self {
            roster,
            directory,
            current_run: None,
            public_runs: Vec::new(),
            watch: None,
        }
    }

    /// Create an offline session over the private JSON store
    pub fn local(store: LocalStore) -> Self {
        Self::new(Arc::new(store), None)
    }

    /// Create an online session over the shared store
    ///
    /// The store serves as both roster store and run directory; clones
    /// share rows and watchers, so two sessions over clones of one store
    /// model two players in the same run.
    pub fn online(store: RemoteStore) -> Self {
        Self::new(Arc::new(store.clone()), Some(Arc::new(store)))
    }

    /// Whether this session has a run directory
    pub fn is_online(&self) -> bool {
        self.directory.is_some()
    }

    /// The run this session currently plays in
    pub fn current_run(&self) -> Option<&Run> {
        self.current_run.as_ref()
    }

    /// Public runs from the last refresh
    pub fn public_runs(&self) -> &[Run] {
        &self.public_runs
    }

    /// Reload the public run listing, newest first
    pub async fn refresh_public_runs(&mut self) -> Result<&[Run]> {
        let directory = self.directory()?.clone();
        self.public_runs = directory.load_runs(RunFilter::Public).await?;
        Ok(&self.public_runs)
    }

    /// Create a run and make it current
    pub async fn create_run(&mut self, name: &str, description: &str) -> Result<Run> {
        let directory = self.directory()?.clone();
        let run = directory.create_run(name, description).await?;
        self.set_current_run(Some(run.clone()));
        Ok(run)
    }

    /// Join a public run by share code and make it current
    ///
    /// Codes are matched case-insensitively.
    pub async fn join_run(&mut self, code: &str) -> Result<Run> {
        let directory = self.directory()?.clone();
        let run = directory.find_run_by_code(code).await?;
        self.set_current_run(Some(run.clone()));
        Ok(run)
    }

    /// Select a run, or none
    ///
    /// Changing the selection drops any active roster watch; the caller
    /// re-watches once it cares about the new run.
    pub fn set_current_run(&mut self, run: Option<Run>) {
        if let Some(watch) = self.watch.take() {
            watch.unsubscribe();
        }
        self.current_run = run;
    }

    /// Watch the current run's roster for changes
    ///
    /// The callback fires on every write under the run until the watch
    /// is stopped or the run selection changes. A second call replaces
    /// the previous watch.
    pub fn watch_roster(&mut self, on_change: ChangeCallback) -> Result<()> {
        let directory = self.directory()?.clone();
        let run = self.current_run.as_ref().ok_or(Error::NoRunSelected)?;
        let subscription = directory.subscribe(&run.id, on_change);
        if let Some(previous) = self.watch.replace(subscription) {
            previous.unsubscribe();
        }
        Ok(())
    }

    /// Stop the active roster watch, if any
    pub fn stop_watching(&mut self) {
        if let Some(watch) = self.watch.take() {
            watch.unsubscribe();
        }
    }

    /// Whether a roster watch is active
    pub fn is_watching(&self) -> bool {
        self.watch.as_ref().map(Subscription::is_active).unwrap_or(false)
    }

    /// Hand out a tracker for the session's scope
    ///
    /// Offline sessions always track the local roster. Online sessions
    /// need a current run first.
    pub fn tracker(&self) -> Result<Tracker> {
        let scope = if self.is_online() {
            let run = self.current_run.as_ref().ok_or(Error::NoRunSelected)?;
            Scope::Run(run.id.clone())
        } else {
            Scope::Local
        };
        Ok(Tracker::new(self.roster.clone(), scope))
    }

    fn directory(&self) -> Result<&Arc<dyn RunDirectory>> {
        self.directory.as_ref().ok_or(Error::OnlineOnly)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("online", &self.is_online())
            .field(
                "current_run",
                &self.current_run.as_ref().map(|run| run.name.as_str()),
            )
            .field("public_runs", &self.public_runs.len())
            .field("watching", &self.is_watching())
            .finish()
    }
}
