//! Error types for cagelocke-core

use crate::identity::PokemonId;
use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("Required field is empty: {0}")]
    EmptyField(&'static str),

    #[error("Invalid share code: {0}")]
    InvalidShareCode(String),

    #[error("Match count mismatch for {id}: {count} matches != {wins} wins + {losses} losses")]
    CountMismatch {
        id: PokemonId,
        count: u32,
        wins: u32,
        losses: u32,
    },

    #[error("A cage match needs at least 2 participants, got {0}")]
    NotEnoughParticipants(usize),

    #[error("Duplicate participant: {0}")]
    DuplicateParticipant(PokemonId),

    #[error("Winner {0} is not among the participants")]
    WinnerNotInMatch(PokemonId),

    #[error("Winner {0} has fainted and must be revived first")]
    FaintedWinner(PokemonId),

    #[error("Participants belong to different runs")]
    MixedRuns,
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
