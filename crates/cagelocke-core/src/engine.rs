//! Cage match resolution
//!
//! The engine is a pure function over roster values: it never touches
//! storage and never mutates its inputs. Callers load the participants,
//! resolve, then hand the outcome to whatever store they use.

use crate::cage_match::CageMatch;
use crate::error::{Error, Result};
use crate::identity::{MatchId, PokemonId};
use crate::pokemon::Pokemon;
use chrono::{DateTime, Utc};
use indexmap::IndexSet;

/// Losses at which a Pokémon faints
pub const FAINT_LOSS_THRESHOLD: u32 = 3;

/// Everything a resolved match produced
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    /// Updated participant records, in selection order
    pub pokemon: Vec<Pokemon>,
    /// The match record to append to history
    pub record: CageMatch,
    /// Participants that fainted as a result of this match
    pub fainted: Vec<PokemonId>,
}

/// Resolve a cage match between the given participants
///
/// Every participant gains a fought match; the winner gains a win, everyone
/// else gains a loss. A loser whose losses reach [`FAINT_LOSS_THRESHOLD`]
/// faints here and nowhere else. The winner must be one of the participants
/// and must be alive; a fainted Pokémon has to be revived before it can win
/// a match it was selected into.
pub fn resolve_match(
    participants: &[Pokemon],
    winner: &PokemonId,
    match_date: DateTime<Utc>,
) -> Result<MatchOutcome> {
    if participants.len() < 2 {
        return Err(Error::NotEnoughParticipants(participants.len()));
    }
    let mut seen: IndexSet<&PokemonId> = IndexSet::new();
    for pokemon in participants {
        if !seen.insert(&pokemon.id) {
            return Err(Error::DuplicateParticipant(pokemon.id.clone()));
        }
    }
    let winner_record = participants
        .iter()
        .find(|p| &p.id == winner)
        .ok_or_else(|| Error::WinnerNotInMatch(winner.clone()))?;
    if !winner_record.is_alive {
        return Err(Error::FaintedWinner(winner.clone()));
    }
    let run_id = participants[0].run_id.clone();
    if participants.iter().any(|p| p.run_id != run_id) {
        return Err(Error::MixedRuns);
    }

    let mut updated = Vec::with_capacity(participants.len());
    let mut fainted = Vec::new();
    for pokemon in participants {
        let mut pokemon = pokemon.clone();
        pokemon.cage_match_count += 1;
        if &pokemon.id == winner {
            pokemon.wins += 1;
        } else {
            pokemon.losses += 1;
            if pokemon.losses >= FAINT_LOSS_THRESHOLD {
                pokemon.is_alive = false;
                fainted.push(pokemon.id.clone());
            }
        }
        updated.push(pokemon);
    }

    let record = CageMatch {
        id: MatchId::unassigned(),
        run_id,
        participants: participants.iter().map(|p| p.id.clone()).collect(),
        winner: winner.clone(),
        match_date,
    };

    Ok(MatchOutcome {
        pokemon: updated,
        record,
        fainted,
    })
}
