//! Cagelocke Tracker Demo
//!
//! A console walkthrough of a cagelocke run.
//! - Seeds a roster from a RON file
//! - Fights cage matches until somebody faints, then revives them
//! - Creates a shared run and joins it by share code from a second session
//! - Watches the shared roster for changes

use cagelocke_core::PokemonId;
use cagelocke_session::Session;
use cagelocke_store::{LocalStore, RemoteStore};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Starters loaded from the RON file
#[derive(serde::Deserialize)]
struct SeedRoster {
    starters: Vec<Starter>,
}

#[derive(serde::Deserialize)]
struct Starter {
    name: String,
    nickname: String,
    perks: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let seed = load_seed()?;

    println!("=== Offline: private roster ===");
    run_local(&seed).await?;

    println!();
    println!("=== Online: shared run ===");
    run_shared(&seed).await?;

    Ok(())
}

fn load_seed() -> Result<SeedRoster, Box<dyn std::error::Error>> {
    // Try multiple paths for the data file
    let paths = [
        "demos/tracker_demo/data/seed.ron",
        "data/seed.ron",
        "../data/seed.ron",
    ];

    for path in &paths {
        if Path::new(path).exists() {
            let content = std::fs::read_to_string(path)?;
            return Ok(ron::from_str(&content)?);
        }
    }

    Err("Could not find seed.ron file".into())
}

async fn run_local(seed: &SeedRoster) -> Result<(), Box<dyn std::error::Error>> {
    // Fresh directory per process so reruns start clean
    let dir = std::env::temp_dir().join(format!("cagelocke-demo-{}", std::process::id()));
    let session = Session::local(LocalStore::open(&dir)?);
    let mut tracker = session.tracker()?;

    for starter in &seed.starters {
        let mut pokemon = tracker
            .add_pokemon(&starter.name, &starter.nickname)
            .await?;
        for perk in &starter.perks {
            pokemon = tracker.add_perk(&pokemon, perk).await?;
        }
        println!("caught {} ({})", pokemon.nickname, pokemon.name);
    }

    // Pit the first two living pokemon against each other until one goes down
    let mut fainted: Option<PokemonId> = None;
    for round in 1.. {
        let roster = tracker.roster().await?;
        let alive: Vec<_> = roster.iter().filter(|p| p.is_alive).cloned().collect();
        if alive.len() < 2 {
            break;
        }
        let (winner, loser) = (&alive[0], &alive[1]);
        tracker.toggle_selection(winner)?;
        tracker.toggle_selection(loser)?;
        let outcome = tracker.execute_match(&winner.id).await?;
        println!("round {round}: {} beats {}", winner.nickname, loser.nickname);
        if let Some(id) = outcome.fainted.first() {
            fainted = Some(id.clone());
            break;
        }
    }

    if let Some(id) = fainted {
        let roster = tracker.roster().await?;
        if let Some(down) = roster.iter().find(|p| p.id == id) {
            println!("{} fainted after {} losses", down.nickname, down.losses);
            let revived = tracker.revive(down).await?;
            println!(
                "{} revived, record kept at {}-{}",
                revived.nickname, revived.wins, revived.losses
            );
        }
    }

    let history = tracker.match_history().await?;
    println!("local history: {} cage matches", history.len());
    Ok(())
}

async fn run_shared(seed: &SeedRoster) -> Result<(), Box<dyn std::error::Error>> {
    let store = RemoteStore::in_memory()?;

    let mut host = Session::online(store.clone());
    let run = host.create_run("Johto Cagelocke", "two friends, one cage").await?;
    println!("created {:?} with share code {}", run.name, run.share_code);

    let changes = Arc::new(AtomicUsize::new(0));
    let seen = changes.clone();
    host.watch_roster(Box::new(move || {
        seen.fetch_add(1, Ordering::SeqCst);
    }))?;

    let tracker = host.tracker()?;
    for starter in &seed.starters {
        tracker
            .add_pokemon(&starter.name, &starter.nickname)
            .await?;
    }
    println!(
        "roster writes seen by the watch: {}",
        changes.load(Ordering::SeqCst)
    );

    // A second player joins with the share code, lowercase and all
    let mut guest = Session::online(store);
    let code = run.share_code.as_str().to_ascii_lowercase();
    let joined = guest.join_run(&code).await?;
    println!("guest joined {:?} via code {code}", joined.name);

    let roster = guest.tracker()?.roster().await?;
    for pokemon in &roster {
        println!(
            "  {} ({}) {}-{}",
            pokemon.nickname, pokemon.name, pokemon.wins, pokemon.losses
        );
    }

    let runs = guest.refresh_public_runs().await?;
    println!("public runs: {}", runs.len());
    Ok(())
}
