//! Player Identity Resolution
//!
//! Maps a raw feed name to a canonical roster `player_id`.
//!
//! Resolution is exact on the normalized name key after alias
//! substitution. When several players share a key, a preferred-team hint
//! may select one of them; otherwise the lookup fails as ambiguous. There
//! is no fuzzy fallback here: near-match ranking lives in [`suggest`] and
//! is only ever used to curate the alias table.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::Result;
use crate::types::RosterEntry;
use crate::utils::normalize_name;

pub mod suggest;

// =============================================================================
// ALIAS TABLE
// =============================================================================

/// Normalized-raw → normalized-canonical name substitutions.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    map: FxHashMap<String, String>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw/canonical pairs. Both sides are normalized.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: AsRef<str>,
    {
        let mut table = Self::new();
        for (raw, canon) in pairs {
            table.insert(raw.as_ref(), canon.as_ref());
        }
        table
    }

    /// Parse a JSON object of the form `{ "raw name": "canonical name" }`.
    pub fn from_json(content: &str) -> Result<Self> {
        let pairs: HashMap<String, String> = serde_json::from_str(content)?;
        Ok(Self::from_pairs(pairs))
    }

    pub fn insert(&mut self, raw: &str, canon: &str) {
        let raw_key = normalize_name(raw);
        let canon_key = normalize_name(canon);
        if raw_key.is_empty() || canon_key.is_empty() || raw_key == canon_key {
            return;
        }
        self.map.insert(raw_key, canon_key);
    }

    /// Substitute a normalized key, or return it unchanged.
    pub fn apply<'a>(&'a self, key: &'a str) -> &'a str {
        self.map.get(key).map(|s| s.as_str()).unwrap_or(key)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

// =============================================================================
// ROSTER INDEX
// =============================================================================

/// Immutable roster with a name-key lookup built once at construction.
#[derive(Debug, Clone, Default)]
pub struct RosterIndex {
    entries: Vec<RosterEntry>,
    by_key: FxHashMap<String, Vec<usize>>,
}

impl RosterIndex {
    /// Build from `(player_id, player_name, team_id)` rows.
    pub fn new<I, S>(rows: I) -> Self
    where
        I: IntoIterator<Item = (S, S, S)>,
        S: Into<String>,
    {
        let entries = rows
            .into_iter()
            .map(|(player_id, name, team_id)| {
                let display_name: String = name.into();
                RosterEntry {
                    player_id: player_id.into(),
                    name_key: normalize_name(&display_name),
                    display_name,
                    team_id: team_id.into(),
                }
            })
            .collect();
        Self::from_entries(entries)
    }

    pub fn from_entries(entries: Vec<RosterEntry>) -> Self {
        let mut by_key: FxHashMap<String, Vec<usize>> = FxHashMap::default();
        for (idx, entry) in entries.iter().enumerate() {
            if entry.name_key.is_empty() {
                continue;
            }
            by_key.entry(entry.name_key.clone()).or_default().push(idx);
        }
        Self { entries, by_key }
    }

    /// All roster rows sharing a normalized key.
    pub fn candidates(&self, key: &str) -> Vec<&RosterEntry> {
        self.by_key
            .get(key)
            .map(|idxs| idxs.iter().map(|&i| &self.entries[i]).collect())
            .unwrap_or_default()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.by_key.keys().map(|k| k.as_str())
    }

    pub fn contains_player(&self, player_id: &str) -> bool {
        self.entries.iter().any(|e| e.player_id == player_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// RESOLUTION
// =============================================================================

/// How a successful lookup was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMethod {
    /// Exactly one player carries the key
    Unique,
    /// Several players share the key; the team hint picked one
    TeamHint,
}

/// A successfully resolved player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPlayer {
    pub player_id: String,
    /// Team from the roster row that matched, when it is unambiguous.
    pub team_id: Option<String>,
    /// Key actually looked up (after alias substitution).
    pub name_key: String,
    pub method: ResolutionMethod,
}

/// Why a lookup failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    NotFound { name_key: String },
    Ambiguous { name_key: String, candidates: usize },
}

impl ResolveError {
    pub fn name_key(&self) -> &str {
        match self {
            ResolveError::NotFound { name_key } | ResolveError::Ambiguous { name_key, .. } => name_key,
        }
    }
}

/// Roster rows grouped by player, preserving roster order.
struct PlayerGroup<'a> {
    player_id: &'a str,
    teams: Vec<&'a str>,
}

fn group_by_player<'a>(rows: &[&'a RosterEntry]) -> Vec<PlayerGroup<'a>> {
    let mut groups: Vec<PlayerGroup<'a>> = Vec::new();
    for row in rows {
        match groups.iter_mut().find(|g| g.player_id == row.player_id) {
            Some(group) => {
                if !group.teams.contains(&row.team_id.as_str()) {
                    group.teams.push(&row.team_id);
                }
            }
            None => groups.push(PlayerGroup {
                player_id: &row.player_id,
                teams: vec![&row.team_id],
            }),
        }
    }
    groups
}

/// Resolves raw names against a roster and alias table.
///
/// Holds only shared references; cheap to copy into every game.
#[derive(Debug, Clone, Copy)]
pub struct NameResolver<'a> {
    roster: &'a RosterIndex,
    aliases: &'a AliasTable,
}

impl<'a> NameResolver<'a> {
    pub fn new(roster: &'a RosterIndex, aliases: &'a AliasTable) -> Self {
        Self { roster, aliases }
    }

    /// Normalized, alias-substituted key for a raw name.
    pub fn lookup_key(&self, raw_name: &str) -> String {
        let normalized = normalize_name(raw_name);
        self.aliases.apply(&normalized).to_string()
    }

    /// Resolve a raw name, optionally preferring a team.
    pub fn resolve(
        &self,
        raw_name: &str,
        preferred_team: Option<&str>,
    ) -> std::result::Result<ResolvedPlayer, ResolveError> {
        let name_key = self.lookup_key(raw_name);
        if name_key.is_empty() {
            return Err(ResolveError::NotFound { name_key });
        }

        let rows = self.roster.candidates(&name_key);
        let groups = group_by_player(&rows);
        let preferred_team = preferred_team.filter(|t| !t.is_empty());

        match groups.as_slice() {
            [] => Err(ResolveError::NotFound { name_key }),
            [only] => {
                let team_id = match preferred_team {
                    Some(team) if only.teams.contains(&team) => Some(team.to_string()),
                    _ if only.teams.len() == 1 => Some(only.teams[0].to_string()),
                    _ => None,
                };
                Ok(ResolvedPlayer {
                    player_id: only.player_id.to_string(),
                    team_id,
                    name_key,
                    method: ResolutionMethod::Unique,
                })
            }
            many => {
                let hinted: Vec<&PlayerGroup> = match preferred_team {
                    Some(team) => many.iter().filter(|g| g.teams.contains(&team)).collect(),
                    None => Vec::new(),
                };
                match (hinted.as_slice(), preferred_team) {
                    ([chosen], Some(team)) => Ok(ResolvedPlayer {
                        player_id: chosen.player_id.to_string(),
                        team_id: Some(team.to_string()),
                        name_key,
                        method: ResolutionMethod::TeamHint,
                    }),
                    _ => Err(ResolveError::Ambiguous {
                        candidates: many.len(),
                        name_key,
                    }),
                }
            }
        }
    }
}

// =============================================================================
// UNIT TESTS
// =============================================================================
