//! Cagelocke Core - Entity model and cage match resolution
//!
//! This crate provides the pure domain types for the Cagelocke tracker:
//! - Pokémon, run, and cage match records with their invariants
//! - Identifier newtypes and case-insensitive share codes
//! - The cage match engine: pure state transitions over roster values
//! - The standard perk catalog
//!
//! Everything here is side-effect free. Durable storage lives in
//! `cagelocke-store` behind the persistence traits, and the two must agree
//! on exactly one rule: fainting happens on a match loss and nowhere else.

mod cage_match;
mod engine;
mod error;
mod identity;
mod perks;
mod pokemon;
mod run;
mod share_code;

pub use cage_match::CageMatch;
pub use engine::{resolve_match, MatchOutcome, FAINT_LOSS_THRESHOLD};
pub use error::{Error, Result};
pub use identity::{MatchId, PokemonId, RunId};
pub use perks::{available_standard, partition_perks, standard_perk, PerkDef, STANDARD_PERKS};
pub use pokemon::Pokemon;
pub use run::Run;
pub use share_code::{ShareCode, SHARE_CODE_ALPHABET, SHARE_CODE_LEN};
