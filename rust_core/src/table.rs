//! Tabular input contract
//!
//! Inputs arrive as header + string-cell tables. Required columns are
//! checked when a table is decoded, before any event is processed; that is
//! the only fatal failure in the pipeline. Optional columns are reported
//! once through [`Capabilities`] instead of being probed per row.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{PbpError, Result};
use crate::matching::{AliasTable, RosterIndex};
use crate::types::{GameContext, LineupSnapshot, RawEvent, Side};

pub const ROSTER_TABLE: &str = "roster";
pub const ALIAS_TABLE: &str = "alias";
pub const EVENT_TABLE: &str = "events";
pub const GAME_CONTEXT_TABLE: &str = "game_context";
pub const LINEUP_TABLE: &str = "lineups";

/// Separator used in the `qualifiers_joined` column.
pub const QUALIFIER_SEPARATOR: char = '|';

/// Header row plus string cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Build a table, rejecting rows whose width differs from the header.
    pub fn new(name: &'static str, headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        if let Some((idx, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != headers.len()) {
            return Err(PbpError::RaggedRow {
                table: name,
                row: idx,
                found: row.len(),
                expected: headers.len(),
            });
        }
        Ok(Self { headers, rows })
    }

    /// Convenience constructor for literal tables.
    pub fn from_str_rows(name: &'static str, headers: &[&str], rows: &[&[&str]]) -> Result<Self> {
        Self::new(
            name,
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }

    fn column(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == column)
    }

    fn require(&self, table: &'static str, column: &'static str) -> Result<usize> {
        self.column(column)
            .ok_or_else(|| PbpError::missing_column(table, column, &self.headers))
    }

    fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(|cells| Row { cells })
    }
}

/// Borrowed row with lenient typed accessors.
struct Row<'a> {
    cells: &'a [String],
}

impl<'a> Row<'a> {
    fn text(&self, idx: usize) -> &'a str {
        self.cells[idx].trim()
    }

    fn opt_text(&self, idx: Option<usize>) -> Option<String> {
        let value = self.text(idx?);
        if value.is_empty() || value.eq_ignore_ascii_case("nan") {
            None
        } else {
            Some(value.to_string())
        }
    }

    fn opt_f64(&self, idx: Option<usize>) -> Option<f64> {
        self.text(idx?).parse::<f64>().ok().filter(|v| v.is_finite())
    }

    /// Integer cell, also accepting whole floats such as `"12.0"`.
    fn opt_i64(&self, idx: Option<usize>) -> Option<i64> {
        let raw = self.text(idx?);
        raw.parse::<i64>().ok().or_else(|| {
            raw.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite() && v.fract() == 0.0)
                .map(|v| v as i64)
        })
    }

    fn opt_i32(&self, idx: Option<usize>) -> Option<i32> {
        self.opt_i64(idx).and_then(|v| i32::try_from(v).ok())
    }

    fn opt_u32(&self, idx: Option<usize>) -> Option<u32> {
        self.opt_i64(idx).and_then(|v| u32::try_from(v).ok())
    }

    fn opt_u64(&self, idx: Option<usize>) -> Option<u64> {
        self.opt_i64(idx).and_then(|v| u64::try_from(v).ok())
    }
}

// =============================================================================
// Capabilities
// =============================================================================

/// Which optional inputs are present, computed once at pipeline start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Capabilities {
    pub has_coordinates: bool,
    pub has_action_area: bool,
    pub has_attribution: bool,
    pub has_possession: bool,
    pub has_game_context: bool,
    pub has_lineups: bool,
}

impl Capabilities {
    pub fn all() -> Self {
        Self {
            has_coordinates: true,
            has_action_area: true,
            has_attribution: true,
            has_possession: true,
            has_game_context: true,
            has_lineups: true,
        }
    }

    pub fn detect(events: &Table, game_context: Option<&Table>, lineups: Option<&Table>) -> Self {
        Self {
            has_coordinates: events.has_column("loc_x") && events.has_column("loc_y"),
            has_action_area: events.has_column("action_area"),
            has_attribution: events.has_column("attribution_team_id"),
            has_possession: events.has_column("possession_team_id"),
            has_game_context: game_context.is_some_and(|t| !t.is_empty()),
            has_lineups: lineups.is_some_and(|t| !t.is_empty()),
        }
    }
}

// =============================================================================
// Decoders
// =============================================================================

/// Roster rows `(playerId, playerName, teamId)`; rows without an id are skipped.
pub fn decode_roster(table: &Table) -> Result<RosterIndex> {
    let id = table.require(ROSTER_TABLE, "playerId")?;
    let name = table.require(ROSTER_TABLE, "playerName")?;
    let team = table.require(ROSTER_TABLE, "teamId")?;

    let rows = table
        .rows()
        .filter(|row| !row.text(id).is_empty())
        .map(|row| (row.text(id), row.text(name), row.text(team)))
        .collect::<Vec<_>>();
    Ok(RosterIndex::new(rows))
}

/// Alias rows `(raw, canon)`.
pub fn decode_aliases(table: &Table) -> Result<AliasTable> {
    let raw = table.require(ALIAS_TABLE, "raw")?;
    let canon = table.require(ALIAS_TABLE, "canon")?;
    Ok(AliasTable::from_pairs(
        table.rows().map(|row| (row.text(raw), row.text(canon))),
    ))
}

pub fn decode_events(table: &Table) -> Result<Vec<RawEvent>> {
    let game_id = table.require(EVENT_TABLE, "game_id")?;
    let event_id = table.require(EVENT_TABLE, "event_id")?;
    let period = table.require(EVENT_TABLE, "period_number")?;
    let clock = table.require(EVENT_TABLE, "clock")?;
    let event_type = table.require(EVENT_TABLE, "event_type")?;
    let description = table.require(EVENT_TABLE, "description")?;

    let event_number = table.column("event_number");
    let sequence = table.column("sequence");
    let home_points = table.column("home_points");
    let away_points = table.column("away_points");
    let loc_x = table.column("loc_x");
    let loc_y = table.column("loc_y");
    let action_area = table.column("action_area");
    let attribution = table.column("attribution_team_id");
    let possession = table.column("possession_team_id");
    let turnover_type = table.column("turnover_type");
    let qualifiers = table.column("qualifiers_joined");

    Ok(table
        .rows()
        .map(|row| RawEvent {
            game_id: row.text(game_id).to_string(),
            event_id: row.text(event_id).to_string(),
            period_number: row.opt_u32(Some(period)),
            event_number: row.opt_u32(event_number),
            sequence: row.opt_u64(sequence),
            clock: row.opt_text(Some(clock)),
            event_type: row.text(event_type).to_string(),
            description: row.text(description).to_string(),
            home_points: row.opt_i32(home_points),
            away_points: row.opt_i32(away_points),
            location_x: row.opt_f64(loc_x),
            location_y: row.opt_f64(loc_y),
            action_area: row.opt_text(action_area),
            attribution_team_id: row.opt_text(attribution),
            possession_team_id: row.opt_text(possession),
            turnover_type: row.opt_text(turnover_type),
            qualifiers: row
                .opt_text(qualifiers)
                .map(|q| {
                    q.split(QUALIFIER_SEPARATOR)
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        })
        .collect())
}

/// Per-game home/away assignment keyed by game id. Incomplete rows are skipped.
pub fn decode_game_contexts(table: &Table) -> Result<FxHashMap<String, GameContext>> {
    let game_id = table.require(GAME_CONTEXT_TABLE, "game_id")?;
    let home = table.require(GAME_CONTEXT_TABLE, "home_team_id")?;
    let away = table.require(GAME_CONTEXT_TABLE, "away_team_id")?;

    Ok(table
        .rows()
        .filter(|row| [game_id, home, away].iter().all(|&i| !row.text(i).is_empty()))
        .map(|row| {
            let ctx = GameContext {
                game_id: row.text(game_id).to_string(),
                home_team_id: row.text(home).to_string(),
                away_team_id: row.text(away).to_string(),
            };
            (ctx.game_id.clone(), ctx)
        })
        .collect())
}

/// Long-format lineup rows grouped into one snapshot per `(game, event, side)`.
///
/// Rows with an unknown side or an empty player id are skipped. Snapshots
/// come back sorted by key.
pub fn decode_lineups(table: &Table) -> Result<Vec<LineupSnapshot>> {
    let game_id = table.require(LINEUP_TABLE, "game_id")?;
    let event_id = table.require(LINEUP_TABLE, "event_id")?;
    let side_col = table.require(LINEUP_TABLE, "side")?;
    let player_id = table.require(LINEUP_TABLE, "player_id")?;
    let team_id = table.column("lineup_team_id");

    let mut grouped: BTreeMap<(String, String, Side), LineupSnapshot> = BTreeMap::new();
    for row in table.rows() {
        let Some(side) = Side::parse(row.text(side_col)) else {
            continue;
        };
        let player = row.text(player_id);
        if player.is_empty() {
            continue;
        }
        let key = (row.text(game_id).to_string(), row.text(event_id).to_string(), side);
        let snapshot = grouped.entry(key).or_insert_with(|| LineupSnapshot {
            game_id: row.text(game_id).to_string(),
            event_id: row.text(event_id).to_string(),
            side,
            team_id: None,
            players: BTreeSet::new(),
        });
        if snapshot.team_id.is_none() {
            snapshot.team_id = row.opt_text(team_id);
        }
        snapshot.players.insert(player.to_string());
    }
    Ok(grouped.into_values().collect())
}

// =============================================================================
// UNIT TESTS
// =============================================================================
