//! Lineup Stint Segmentation
//!
//! Rebuilds, per side, the contiguous intervals during which one on-court
//! group was unchanged. Snapshots only ride on some events, so each side's
//! last known group is carried forward until the next snapshot.
//!
//! Events must already be in temporal order.

use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use tracing::debug;

use crate::types::{GameContext, LineupSnapshot, RawEvent, Side, Stint};
use crate::utils::{elapsed_game_seconds, parse_clock_seconds};

/// Players on a full lineup.
pub const FULL_LINEUP: usize = 5;

/// Separator between player ids in a lineup key.
pub const LINEUP_KEY_SEPARATOR: &str = "|";

/// Order-independent identity of an on-court group.
pub fn lineup_key<I, S>(players: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let sorted: BTreeSet<String> = players
        .into_iter()
        .map(|p| p.as_ref().to_string())
        .filter(|p| !p.is_empty())
        .collect();
    sorted.into_iter().collect::<Vec<_>>().join(LINEUP_KEY_SEPARATOR)
}

/// Elapsed game seconds at an event, if period and clock are readable.
pub fn event_elapsed_seconds(event: &RawEvent) -> Option<u32> {
    let period = event.period_number?;
    let remaining = parse_clock_seconds(event.clock.as_deref()?)?;
    elapsed_game_seconds(period, remaining)
}

/// One event that participates in a side's segmentation.
struct Sample<'a> {
    elapsed: u32,
    players: &'a BTreeSet<String>,
    home_points: Option<i32>,
    away_points: Option<i32>,
}

impl Sample<'_> {
    fn score(&self, side: Side) -> Option<(i32, i32)> {
        let (home, away) = (self.home_points?, self.away_points?);
        Some(match side {
            Side::Home => (home, away),
            Side::Away => (away, home),
        })
    }
}

/// Own/opponent score deltas, only for non-null, non-decreasing scores.
fn score_deltas(first: &Sample, last: &Sample, side: Side) -> Option<(i32, i32)> {
    let (own_start, opp_start) = first.score(side)?;
    let (own_end, opp_end) = last.score(side)?;
    if own_end < own_start || opp_end < opp_start {
        return None;
    }
    Some((own_end - own_start, opp_end - opp_start))
}

/// Segment one game's stints for both sides.
///
/// Snapshots belonging to other games are ignored.
pub fn segment_stints<'e, 's, E, S>(
    game_id: &str,
    events: E,
    snapshots: S,
    game: Option<&GameContext>,
) -> Vec<Stint>
where
    E: IntoIterator<Item = &'e RawEvent>,
    S: IntoIterator<Item = &'s LineupSnapshot>,
{
    let events: Vec<&RawEvent> = events.into_iter().collect();
    let mut by_event: FxHashMap<(&str, Side), &LineupSnapshot> = FxHashMap::default();
    for snap in snapshots.into_iter().filter(|s| s.game_id == game_id) {
        if !snap.players.is_empty() {
            by_event.insert((snap.event_id.as_str(), snap.side), snap);
        }
    }

    let mut stints = Vec::new();
    for side in [Side::Home, Side::Away] {
        let side_stints = segment_side(game_id, side, &events, &by_event, game);
        debug!(
            "Game {}: {} {} stints",
            game_id,
            side_stints.len(),
            side.as_str()
        );
        stints.extend(side_stints);
    }
    stints
}

fn segment_side(
    game_id: &str,
    side: Side,
    events: &[&RawEvent],
    by_event: &FxHashMap<(&str, Side), &LineupSnapshot>,
    game: Option<&GameContext>,
) -> Vec<Stint> {
    let mut current: Option<&BTreeSet<String>> = None;
    let mut snapshot_team: Option<&str> = None;
    let mut samples: Vec<Sample> = Vec::new();

    for &event in events {
        if let Some(snap) = by_event.get(&(event.event_id.as_str(), side)) {
            current = Some(&snap.players);
            if snapshot_team.is_none() {
                snapshot_team = snap.team_id.as_deref().filter(|t| !t.is_empty());
            }
        }
        let (Some(players), Some(elapsed)) = (current, event_elapsed_seconds(event)) else {
            continue;
        };
        samples.push(Sample {
            elapsed,
            players,
            home_points: event.home_points,
            away_points: event.away_points,
        });
    }

    let team_id = game
        .map(|g| g.team_for(side).to_string())
        .filter(|t| !t.is_empty())
        .or_else(|| snapshot_team.map(str::to_string));

    let mut stints = Vec::new();
    let mut start = 0;
    while start < samples.len() {
        let mut end = start;
        while end + 1 < samples.len() && samples[end + 1].players == samples[start].players {
            end += 1;
        }
        let (first, last) = (&samples[start], &samples[end]);
        let players: Vec<String> = first.players.iter().cloned().collect();
        let deltas = score_deltas(first, last, side);

        stints.push(Stint {
            game_id: game_id.to_string(),
            team_id: team_id.clone(),
            side,
            stint_id: stints.len() as u32 + 1,
            lineup_key: lineup_key(&players),
            complete: players.len() >= FULL_LINEUP,
            players,
            start_time: first.elapsed,
            end_time: last.elapsed,
            duration_seconds: last.elapsed.saturating_sub(first.elapsed),
            points_for: deltas.map(|d| d.0),
            points_against: deltas.map(|d| d.1),
        });
        start = end + 1;
    }
    stints
}

// =============================================================================
// UNIT TESTS
// =============================================================================
