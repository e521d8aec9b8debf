//! The standard perk catalog
//!
//! Perks are plain strings on the Pokémon record; the catalog only names
//! the standard ones so callers can offer them before falling back to
//! custom text.

use crate::pokemon::Pokemon;

/// A perk from the standard catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerkDef {
    /// Stable catalog id
    pub id: &'static str,
    /// Perk name as stored on the Pokémon
    pub name: &'static str,
    /// What the perk unlocks
    pub description: &'static str,
}

/// The standard perks, in the order they are usually offered
pub const STANDARD_PERKS: [PerkDef; 4] = [
    PerkDef {
        id: "held-item",
        name: "Held Item",
        description: "This Pokémon can now hold an item in battle",
    },
    PerkDef {
        id: "tm",
        name: "TM Move",
        description: "This Pokémon can learn one move from its TM list",
    },
    PerkDef {
        id: "egg-move-nature",
        name: "Egg Move + Nature Change",
        description: "This Pokémon gains one egg move and can change its nature",
    },
    PerkDef {
        id: "egg-moves",
        name: "Egg Move #1",
        description: "This Pokémon gains its first egg move",
    },
];

/// Look up a standard perk by its stored name
pub fn standard_perk(name: &str) -> Option<&'static PerkDef> {
    STANDARD_PERKS.iter().find(|perk| perk.name == name.trim())
}

/// Standard perks this Pokémon has not earned yet
pub fn available_standard(pokemon: &Pokemon) -> Vec<&'static PerkDef> {
    STANDARD_PERKS
        .iter()
        .filter(|perk| !pokemon.has_perk(perk.name))
        .collect()
}

/// Split earned perks into (standard, custom), both in earned order
pub fn partition_perks(pokemon: &Pokemon) -> (Vec<&str>, Vec<&str>) {
    let mut standard = Vec::new();
    let mut custom = Vec::new();
    for perk in &pokemon.perks {
        if standard_perk(perk).is_some() {
            standard.push(perk.as_str());
        } else {
            custom.push(perk.as_str());
        }
    }
    (standard, custom)
}
