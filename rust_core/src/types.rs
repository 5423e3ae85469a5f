//! Input and output row types shared across the pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::classify::{Bucket, Role};

/// Which side of the scoreboard a team occupies in a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Home,
    Away,
}

impl Side {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "home" | "h" => Some(Side::Home),
            "away" | "a" | "visitor" => Some(Side::Away),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Home => "home",
            Side::Away => "away",
        }
    }
}

/// One row of the roster index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub player_id: String,
    pub display_name: String,
    pub team_id: String,
    /// Normalized form of `display_name`; may collide across players.
    pub name_key: String,
}

/// One event from the play-by-play feed, exactly as supplied.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    pub game_id: String,
    pub event_id: String,
    pub period_number: Option<u32>,
    pub event_number: Option<u32>,
    pub sequence: Option<u64>,
    /// Remaining time in the period, `MM:SS`.
    pub clock: Option<String>,
    /// Coarse feed category, e.g. `twopointmade`, `turnover`, `shootingfoul`.
    pub event_type: String,
    pub description: String,
    pub home_points: Option<i32>,
    pub away_points: Option<i32>,
    pub location_x: Option<f64>,
    pub location_y: Option<f64>,
    pub action_area: Option<String>,
    pub attribution_team_id: Option<String>,
    pub possession_team_id: Option<String>,
    pub turnover_type: Option<String>,
    pub qualifiers: Vec<String>,
}

impl RawEvent {
    /// Temporal sort key within a game.
    pub fn order_key(&self) -> (u32, u32, u64) {
        (
            self.period_number.unwrap_or(0),
            self.event_number.unwrap_or(0),
            self.sequence.unwrap_or(0),
        )
    }
}

/// Home/away team assignment for one game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameContext {
    pub game_id: String,
    pub home_team_id: String,
    pub away_team_id: String,
}

impl GameContext {
    pub fn team_for(&self, side: Side) -> &str {
        match side {
            Side::Home => &self.home_team_id,
            Side::Away => &self.away_team_id,
        }
    }
}

/// On-court players for one side, attached to one event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineupSnapshot {
    pub game_id: String,
    pub event_id: String,
    pub side: Side,
    pub team_id: Option<String>,
    pub players: BTreeSet<String>,
}

/// A contiguous interval with one unchanged on-court group for a team.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stint {
    pub game_id: String,
    pub team_id: Option<String>,
    pub side: Side,
    pub stint_id: u32,
    pub lineup_key: String,
    pub players: Vec<String>,
    /// Elapsed game seconds at the stint's first event.
    pub start_time: u32,
    /// Elapsed game seconds at the stint's last event.
    pub end_time: u32,
    pub duration_seconds: u32,
    pub points_for: Option<i32>,
    pub points_against: Option<i32>,
    /// False when fewer than five distinct players were on record.
    pub complete: bool,
}

/// Diagnostic category for a non-fatal failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueKind {
    /// Normalized name absent from the roster.
    NotFound,
    /// Several roster candidates and no disambiguating team hint.
    Ambiguous,
    /// Description inside a recognized category matched no rule.
    Unparsed,
    /// More than one "draws the foul" clause; the last one was used.
    MultipleDrawClauses,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::NotFound => "NOT_FOUND",
            IssueKind::Ambiguous => "AMBIGUOUS",
            IssueKind::Unparsed => "UNPARSED",
            IssueKind::MultipleDrawClauses => "MULTIPLE_DRAW_CLAUSES",
        }
    }
}

/// One resolution or parse failure. Always produced, never fatal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub bucket: Bucket,
    pub role: Option<Role>,
    /// The raw name for resolution failures, the full description otherwise.
    pub raw_text: String,
    pub normalized_name: Option<String>,
    pub game_id: String,
    pub event_id: String,
    pub problem: IssueKind,
    /// Number of roster candidates behind an `AMBIGUOUS` result.
    pub candidates: Option<usize>,
    pub description: String,
}
