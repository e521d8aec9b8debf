//! Persistence layer for the cagelocke tracker.
//!
//! Two bindings implement the same ports. [`LocalStore`] keeps a private
//! roster in JSON files with whole-collection atomic writes, which is what
//! offline play uses. [`RemoteStore`] keeps run-owned rows in a shared
//! database with share codes, public run listings, and change
//! notifications, one row per write. Session code talks to [`RosterStore`]
//! and [`RunDirectory`] and never to a binding directly, so either side
//! can be swapped or faked in tests.

mod config;
mod error;
mod local;
mod models;
mod port;
mod remote;
mod subscription;

pub use config::{StoreConfig, ENV_DB_KEY, ENV_DB_URL};
pub use error::{Error, Result};
pub use local::{LocalStore, MATCHES_KEY, POKEMON_KEY};
pub use port::{RosterStore, RunDirectory, RunFilter, Scope};
pub use remote::RemoteStore;
pub use subscription::{ChangeCallback, Subscription};
