//! Error types for cagelocke-session

use cagelocke_core::PokemonId;
use thiserror::Error;

/// Result type for session operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while coordinating a session
#[derive(Debug, Error)]
pub enum Error {
    /// The operation needs a run directory, which only online sessions have
    #[error("this operation needs an online session")]
    OnlineOnly,

    /// An online operation was attempted before selecting a run
    #[error("no run is selected")]
    NoRunSelected,

    /// A fainted pokemon was offered for selection
    #[error("{0} has fainted and cannot enter a cage match")]
    Fainted(PokemonId),

    /// A selected pokemon is no longer on the roster
    #[error("{0} is not on the roster")]
    UnknownPokemon(PokemonId),

    /// Domain rule violation
    #[error("rule violation: {0}")]
    Model(#[from] cagelocke_core::Error),

    /// Store failure
    #[error("store error: {0}")]
    Store(#[from] cagelocke_store::Error),
}

// Compile-time check that Error is Send + Sync for thread-safe propagation.
fn _assert_error_send_sync<T: Send + Sync>() {}
fn _error_is_send_sync() {
    _assert_error_send_sync::<Error>();
}
