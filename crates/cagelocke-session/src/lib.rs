//! Cagelocke Session - run and roster coordination
//!
//! This crate ties the domain rules and the persistence layer together
//! into the flows a player actually runs: pick a mode, pick a run, track
//! a roster, fight cage matches.
//!
//! ## Architecture
//!
//! ```text
//! Session (mode, current run, watch)
//!  │
//!  ├── Tracker ← roster operations for one scope
//!  │    └── RosterStore (trait) ← LocalStore or RemoteStore
//!  │
//!  └── RunDirectory (trait) ← online sessions only
//!       └── runs, share codes, subscriptions
//! ```
//!
//! ## Key Components
//!
//! - [`Session`]: Owns the store handles, the run selection, and the watch
//! - [`Tracker`]: Roster and cage-match operations for one scope
//!
//! ## Design Principles
//!
//! 1. **Stores are injected** - sessions take trait objects, bindings stay swappable
//! 2. **Mutations go through the tracker** - fainting and counting rules cannot be bypassed
//! 3. **Offline refuses early** - run operations fail before any store call

mod error;
mod session;
mod tracker;

pub use error::{Error, Result};
pub use session::Session;
pub use tracker::Tracker;
