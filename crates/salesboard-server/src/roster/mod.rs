//! Locally curated roster: entries, JSON persistence and media files.

mod error;
pub mod media;
pub mod models;
pub mod store;

pub use error::RosterError;
pub use media::{MediaKind, MediaStore};
pub use models::{assigned_goal_names, match_owner, MatchKind, Roster, RosterEntry, RosterMatch};
pub use store::{RosterStore, RosterTxn};
