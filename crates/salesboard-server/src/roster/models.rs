use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::warn;

/// Locally curated person, keyed by full name in the [`Roster`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    /// Label shown on the dashboard; sales are totalled per short name.
    #[serde(default)]
    pub short: String,
    #[serde(default)]
    pub file_id: String,
    #[serde(default)]
    pub goal_name: String,
    #[serde(default)]
    pub photo: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub video: String,
    /// CRM owner id; when set it takes precedence over name matching.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
}

/// Full name -> entry, in document order.
pub type Roster = IndexMap<String, RosterEntry>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    OwnerId,
    NameSubstring,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RosterMatch<'a> {
    pub full_name: &'a str,
    pub entry: &'a RosterEntry,
    pub kind: MatchKind,
}

/// Find the roster entry a CRM owner belongs to.
///
/// An entry carrying the owner's id wins. Otherwise the first entry, in
/// document order, whose full name contains the owner's display name
/// (case-insensitive) is taken. A blank display name matches nothing.
pub fn match_owner<'a>(roster: &'a Roster, owner_id: &str, owner_name: &str) -> Option<RosterMatch<'a>> {
    let by_id = roster
        .iter()
        .find(|(_, entry)| entry.owner_id.as_deref() == Some(owner_id));
    if let Some((full_name, entry)) = by_id {
        return Some(RosterMatch {
            full_name,
            entry,
            kind: MatchKind::OwnerId,
        });
    }

    let needle = owner_name.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }

    let mut candidates = roster
        .iter()
        .filter(|(full_name, _)| full_name.to_lowercase().contains(&needle));
    let (full_name, entry) = candidates.next()?;

    let others: Vec<&str> = candidates.map(|(name, _)| name.as_str()).collect();
    if !others.is_empty() {
        warn!(
            "Owner '{}' matches several roster entries; using '{}', ignoring {:?}",
            owner_name, full_name, others
        );
    }

    Some(RosterMatch {
        full_name,
        entry,
        kind: MatchKind::NameSubstring,
    })
}

/// Distinct non-empty goal names assigned across the roster.
pub fn assigned_goal_names(roster: &Roster) -> HashSet<&str> {
    roster
        .values()
        .map(|entry| entry.goal_name.as_str())
        .filter(|name| !name.is_empty())
        .collect()
}
