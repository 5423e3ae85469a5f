//! Near-match suggestions for names that failed to resolve.
//!
//! Diagnostic only. Output is meant for a human curating the alias table;
//! nothing here is consulted by [`NameResolver`](super::NameResolver).

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use strsim::jaro_winkler;

use super::{AliasTable, RosterIndex};
use crate::types::{Issue, IssueKind};
use crate::utils::normalize_name;

/// Minimum similarity for a key to be suggested.
pub const DEFAULT_SUGGESTION_CUTOFF: f64 = 0.86;

/// Maximum suggested keys per raw name.
pub const MAX_SUGGESTED_KEYS: usize = 5;

/// Maximum roster rows reported per suggested key.
pub const MAX_ROWS_PER_KEY: usize = 3;

/// One proposed alias target for an unresolved name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameSuggestion {
    pub raw_name: String,
    pub normalized_name: String,
    pub suggested_key: String,
    pub player_id: String,
    pub team_id: String,
    pub display_name: String,
    pub score: f64,
}

/// Similarity of two normalized keys in `[0, 1]`.
///
/// Best of the plain Jaro-Winkler score and the score over sorted tokens,
/// so "ionescu j" still lands near "j ionescu".
pub fn key_similarity(a: &str, b: &str) -> f64 {
    let direct = jaro_winkler(a, b);
    let sorted = |s: &str| {
        let mut tokens: Vec<&str> = s.split_whitespace().collect();
        tokens.sort_unstable();
        tokens.join(" ")
    };
    direct.max(jaro_winkler(&sorted(a), &sorted(b)))
}

/// Rank roster keys near a raw name.
pub fn suggest_names(
    raw_name: &str,
    roster: &RosterIndex,
    aliases: &AliasTable,
    cutoff: f64,
) -> Vec<NameSuggestion> {
    let normalized = normalize_name(raw_name);
    if normalized.is_empty() {
        return Vec::new();
    }
    let lookup = aliases.apply(&normalized);

    let mut scored: Vec<(f64, &str)> = roster
        .keys()
        .map(|key| (key_similarity(lookup, key), key))
        .filter(|(score, _)| *score >= cutoff)
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    scored.truncate(MAX_SUGGESTED_KEYS);

    let mut out = Vec::new();
    for (score, key) in scored {
        for entry in roster.candidates(key).into_iter().take(MAX_ROWS_PER_KEY) {
            out.push(NameSuggestion {
                raw_name: raw_name.to_string(),
                normalized_name: normalized.clone(),
                suggested_key: key.to_string(),
                player_id: entry.player_id.clone(),
                team_id: entry.team_id.clone(),
                display_name: entry.display_name.clone(),
                score,
            });
        }
    }
    out
}

/// Suggestions for every distinct `NOT_FOUND` name in an issue table.
pub fn suggest_for_issues(
    issues: &[Issue],
    roster: &RosterIndex,
    aliases: &AliasTable,
    cutoff: f64,
) -> Vec<NameSuggestion> {
    let unresolved: BTreeSet<&str> = issues
        .iter()
        .filter(|issue| issue.problem == IssueKind::NotFound)
        .map(|issue| issue.raw_text.as_str())
        .collect();

    unresolved
        .into_iter()
        .flat_map(|raw| suggest_names(raw, roster, aliases, cutoff))
        .collect()
}
