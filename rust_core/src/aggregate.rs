//! Aggregation
//!
//! Rolls attributed actions (and stints, for lineup summaries) into
//! per-player and per-lineup tables. Every rate is `None` on a zero
//! denominator rather than zero.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};

use crate::models::{Action, AttributedAction, MarginBucket, Zone};
use crate::types::Stint;
use crate::utils::clock::REGULATION_PERIODS;

/// Free-throw weight in the possession estimate.
const FTA_POSSESSION_WEIGHT: f64 = 0.44;

/// Minutes in a regulation game, the per-40 scale.
const PER_MINUTES: f64 = 40.0;

fn ratio(num: u32, den: u32) -> Option<f64> {
    (den > 0).then(|| num as f64 / den as f64)
}

fn mean(values: impl Iterator<Item = f64>, n: usize) -> f64 {
    values.sum::<f64>() / n as f64
}

fn per_minutes(value: f64, minutes: f64) -> Option<f64> {
    (minutes > 0.0).then(|| value / minutes * PER_MINUTES)
}

// =============================================================================
// Counting
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCounts {
    pub fga: u32,
    pub fgm: u32,
    pub two_pa: u32,
    pub two_pm: u32,
    pub three_pa: u32,
    pub three_pm: u32,
    pub fta: u32,
    pub ftm: u32,
    pub points: u32,
    pub ast: u32,
    pub tov: u32,
    pub orb: u32,
    pub drb: u32,
    pub stl: u32,
    pub blk: u32,
    pub pf_committed: u32,
    pub pf_drawn: u32,
}

impl ActionCounts {
    pub fn add(&mut self, action: &Action) {
        let made = action.is_made();
        if made {
            self.points += action.points_value().map(u32::from).unwrap_or(0);
        }
        match action {
            Action::TwoPa { .. } => {
                self.fga += 1;
                self.two_pa += 1;
                self.fgm += made as u32;
                self.two_pm += made as u32;
            }
            Action::ThreePa { .. } => {
                self.fga += 1;
                self.three_pa += 1;
                self.fgm += made as u32;
                self.three_pm += made as u32;
            }
            Action::Fta { .. } => {
                self.fta += 1;
                self.ftm += made as u32;
            }
            Action::Assist => self.ast += 1,
            Action::Turnover { .. } => self.tov += 1,
            Action::Orb => self.orb += 1,
            Action::Drb => self.drb += 1,
            Action::Steal => self.stl += 1,
            Action::Block => self.blk += 1,
            Action::FoulCommitted => self.pf_committed += 1,
            Action::FoulDrawn => self.pf_drawn += 1,
        }
    }

    /// Possessions used: FGA + 0.44·FTA + TOV.
    pub fn possessions(&self) -> f64 {
        self.fga as f64 + FTA_POSSESSION_WEIGHT * self.fta as f64 + self.tov as f64
    }
}

/// Field-goal attempts and makes per zone, for every attempt with a zone.
///
/// Serializes flat as `zone_<zone>_att` / `zone_<zone>_made` for all zones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ZoneCounts {
    attempts: [u32; Zone::ALL.len()],
    made: [u32; Zone::ALL.len()],
}

impl ZoneCounts {
    pub fn add(&mut self, zone: Zone, made: bool) {
        self.attempts[zone.index()] += 1;
        self.made[zone.index()] += made as u32;
    }

    pub fn attempts(&self, zone: Zone) -> u32 {
        self.attempts[zone.index()]
    }

    pub fn made(&self, zone: Zone) -> u32 {
        self.made[zone.index()]
    }
}

impl Serialize for ZoneCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Zone::ALL.len() * 2))?;
        for zone in Zone::ALL {
            map.serialize_entry(&format!("zone_{}_att", zone.as_str()), &self.attempts(zone))?;
            map.serialize_entry(&format!("zone_{}_made", zone.as_str()), &self.made(zone))?;
        }
        map.end()
    }
}

/// Column key for a feed turnover subtype: `tov_bad_pass`, `tov_lost_ball`,
/// otherwise the subtype slugged to `[a-z0-9_]`.
pub fn turnover_subtype_key(subtype: &str) -> Option<String> {
    let lower = subtype.trim().to_lowercase();
    let slug = if lower.contains("bad") && lower.contains("pass") {
        "bad_pass".to_string()
    } else if lower.contains("lost") && lower.contains("ball") {
        "lost_ball".to_string()
    } else {
        lower
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("_")
    };
    (!slug.is_empty()).then(|| format!("tov_{}", slug))
}

// =============================================================================
// Player action rates
// =============================================================================

/// Season totals and shooting/usage rates for one player.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerActionRates {
    pub player_id: String,
    /// Team the player was most often credited with.
    pub team_id: Option<String>,
    pub games: u32,
    #[serde(flatten)]
    pub counts: ActionCounts,
    /// Made field goals with a credited assist in the same event.
    pub assisted_fgm: u32,
    pub unassisted_fgm: u32,
    pub clutch_fga: u32,
    pub clutch_fta: u32,
    pub clutch_tov: u32,
    pub trans_fga: u32,
    pub clutch_fga_share: Option<f64>,
    pub trans_fga_share: Option<f64>,
    pub fg_pct: Option<f64>,
    pub three_pct: Option<f64>,
    pub ft_pct: Option<f64>,
    pub three_rate: Option<f64>,
    pub fta_rate: Option<f64>,
    pub tov_per_fga: Option<f64>,
    pub ast_to_ratio: Option<f64>,
    #[serde(flatten)]
    pub zones: ZoneCounts,
    /// Turnovers per feed subtype, keyed by [`turnover_subtype_key`].
    #[serde(flatten)]
    pub turnover_types: BTreeMap<String, u32>,
}

#[derive(Default)]
struct PlayerAccumulator<'a> {
    counts: ActionCounts,
    games: BTreeSet<&'a str>,
    teams: BTreeMap<&'a str, u32>,
    assisted_fgm: u32,
    unassisted_fgm: u32,
    clutch_fga: u32,
    clutch_fta: u32,
    clutch_tov: u32,
    trans_fga: u32,
    zones: ZoneCounts,
    turnover_types: BTreeMap<String, u32>,
}

impl<'a> PlayerAccumulator<'a> {
    fn add(&mut self, row: &'a AttributedAction, assisted: bool) {
        self.counts.add(&row.action);
        self.games.insert(&row.game_id);
        if let Some(team) = row.team_id.as_deref() {
            *self.teams.entry(team).or_default() += 1;
        }
        let fga = row.action.is_field_goal_attempt();
        if fga {
            if let Some(zone) = row.zone {
                self.zones.add(zone, row.action.is_made());
            }
            if row.action.is_made() {
                if assisted {
                    self.assisted_fgm += 1;
                } else {
                    self.unassisted_fgm += 1;
                }
            }
        }
        if let Action::Turnover { subtype: Some(subtype) } = &row.action {
            if let Some(key) = turnover_subtype_key(subtype) {
                *self.turnover_types.entry(key).or_default() += 1;
            }
        }
        if row.clutch {
            self.clutch_fga += fga as u32;
            self.clutch_fta += matches!(row.action, Action::Fta { .. }) as u32;
            self.clutch_tov += matches!(row.action, Action::Turnover { .. }) as u32;
        }
        if row.transition && fga {
            self.trans_fga += 1;
        }
    }

    /// Most frequent team; ties go to the smallest id.
    fn primary_team(&self) -> Option<String> {
        self.teams
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(team, _)| team.to_string())
    }

    fn finish(self, player_id: &str) -> PlayerActionRates {
        let c = self.counts;
        PlayerActionRates {
            player_id: player_id.to_string(),
            team_id: self.primary_team(),
            games: self.games.len() as u32,
            counts: c,
            assisted_fgm: self.assisted_fgm,
            unassisted_fgm: self.unassisted_fgm,
            clutch_fga: self.clutch_fga,
            clutch_fta: self.clutch_fta,
            clutch_tov: self.clutch_tov,
            trans_fga: self.trans_fga,
            clutch_fga_share: ratio(self.clutch_fga, c.fga),
            trans_fga_share: ratio(self.trans_fga, c.fga),
            fg_pct: ratio(c.fgm, c.fga),
            three_pct: ratio(c.three_pm, c.three_pa),
            ft_pct: ratio(c.ftm, c.fta),
            three_rate: ratio(c.three_pa, c.fga),
            fta_rate: ratio(c.fta, c.fga),
            tov_per_fga: ratio(c.tov, c.fga),
            ast_to_ratio: ratio(c.ast, c.tov),
            zones: self.zones,
            turnover_types: self.turnover_types,
        }
    }
}

/// One row per player, ordered by player id.
///
/// A made field goal counts as assisted when the same event also credited
/// an assist to a resolved player.
pub fn player_action_rates(actions: &[AttributedAction]) -> Vec<PlayerActionRates> {
    let assisted_events: BTreeSet<(&str, &str)> = actions
        .iter()
        .filter(|row| row.action == Action::Assist)
        .map(|row| (row.game_id.as_str(), row.event_id.as_str()))
        .collect();

    let mut players: BTreeMap<&str, PlayerAccumulator> = BTreeMap::new();
    for row in actions {
        let assisted = assisted_events.contains(&(row.game_id.as_str(), row.event_id.as_str()));
        players.entry(&row.player_id).or_default().add(row, assisted);
    }
    players
        .into_iter()
        .map(|(player_id, acc)| acc.finish(player_id))
        .collect()
}

// =============================================================================
// Context splits
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitKind {
    Clutch,
    MarginBucket,
    Quarter,
}

impl SplitKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SplitKind::Clutch => "clutch",
            SplitKind::MarginBucket => "margin_bucket",
            SplitKind::Quarter => "quarter",
        }
    }
}

/// Counts for one player under one situational split value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextSplit {
    pub player_id: String,
    pub split: SplitKind,
    /// `clutch`/`non_clutch`, a margin bucket name, or `q1`..`q4`.
    pub value: String,
    #[serde(flatten)]
    pub counts: ActionCounts,
    pub fg_pct: Option<f64>,
}

/// Long-format situational splits, ordered by player, split, value.
///
/// Margin buckets use the team-perspective margin, falling back to the
/// home margin. Quarter splits cover regulation only.
pub fn context_splits(actions: &[AttributedAction]) -> Vec<ContextSplit> {
    let mut groups: BTreeMap<(&str, SplitKind, String), ActionCounts> = BTreeMap::new();
    for row in actions {
        let clutch = if row.clutch { "clutch" } else { "non_clutch" };
        let bucket = MarginBucket::from_margin(row.split_margin());

        let mut keys = vec![
            (SplitKind::Clutch, clutch.to_string()),
            (SplitKind::MarginBucket, bucket.as_str().to_string()),
        ];
        if let Some(q) = row.period_number.filter(|p| (1..=REGULATION_PERIODS).contains(p)) {
            keys.push((SplitKind::Quarter, format!("q{}", q)));
        }
        for (kind, value) in keys {
            groups
                .entry((row.player_id.as_str(), kind, value))
                .or_default()
                .add(&row.action);
        }
    }

    groups
        .into_iter()
        .map(|((player_id, split, value), counts)| ContextSplit {
            player_id: player_id.to_string(),
            split,
            value,
            fg_pct: ratio(counts.fgm, counts.fga),
            counts,
        })
        .collect()
}

// =============================================================================
// Spatial profile
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneProfile {
    pub zone: Zone,
    pub attempts: u32,
    pub made: u32,
    pub fg_pct: Option<f64>,
    /// Share of the player's located attempts.
    pub share: Option<f64>,
}

/// Shot-location profile from located field-goal attempts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialProfile {
    pub player_id: String,
    pub fga: u32,
    pub fgm: u32,
    pub avg_distance: Option<f64>,
    /// Sample standard deviation; `None` below two shots.
    pub sd_distance: Option<f64>,
    pub avg_hx: Option<f64>,
    pub avg_hy: Option<f64>,
    pub zones: Vec<ZoneProfile>,
}

/// One profile per player with at least one located attempt.
pub fn spatial_profiles(actions: &[AttributedAction]) -> Vec<SpatialProfile> {
    let mut shots: BTreeMap<&str, Vec<(f64, f64, bool, Option<Zone>)>> = BTreeMap::new();
    for row in actions.iter().filter(|r| r.action.is_field_goal_attempt()) {
        if let (Some(hx), Some(hy)) = (row.hx, row.hy) {
            shots
                .entry(&row.player_id)
                .or_default()
                .push((hx, hy, row.action.is_made(), row.zone));
        }
    }

    shots
        .into_iter()
        .map(|(player_id, list)| {
            let n = list.len();
            let fga = n as u32;
            let fgm = list.iter().filter(|s| s.2).count() as u32;
            let dists: Vec<f64> = list.iter().map(|s| s.0.hypot(s.1)).collect();
            let avg_distance = mean(dists.iter().copied(), n);
            let sd_distance = (n >= 2).then(|| {
                let var = dists.iter().map(|d| (d - avg_distance).powi(2)).sum::<f64>()
                    / (n - 1) as f64;
                var.sqrt()
            });

            let zones = Zone::SHOT_ZONES
                .iter()
                .map(|&zone| {
                    let in_zone = list.iter().filter(|s| s.3 == Some(zone));
                    let attempts = in_zone.clone().count() as u32;
                    let made = in_zone.filter(|s| s.2).count() as u32;
                    ZoneProfile {
                        zone,
                        attempts,
                        made,
                        fg_pct: ratio(made, attempts),
                        share: ratio(attempts, fga),
                    }
                })
                .collect();

            SpatialProfile {
                player_id: player_id.to_string(),
                fga,
                fgm,
                avg_distance: Some(avg_distance),
                sd_distance,
                avg_hx: Some(mean(list.iter().map(|s| s.0), n)),
                avg_hy: Some(mean(list.iter().map(|s| s.1), n)),
                zones,
            }
        })
        .collect()
}

// =============================================================================
// Lineups and minutes
// =============================================================================

/// Totals for one five-player group across all its stints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineupSummary {
    pub team_id: Option<String>,
    pub lineup_key: String,
    pub minutes: f64,
    pub stints: u32,
    pub points_for: i32,
    pub points_against: i32,
    pub net_points: i32,
    pub off_per40: Option<f64>,
    pub def_per40: Option<f64>,
    pub net_per40: Option<f64>,
    /// Team pace (possessions per minute) applied to the lineup's minutes.
    pub poss_est: Option<f64>,
    pub off_rating: Option<f64>,
    pub def_rating: Option<f64>,
    pub net_rating: Option<f64>,
}

/// Team possessions per minute on record: actions over stint minutes.
fn team_pace(stints: &[Stint], actions: &[AttributedAction]) -> BTreeMap<String, f64> {
    let mut possessions: BTreeMap<&str, ActionCounts> = BTreeMap::new();
    for row in actions {
        if let Some(team) = row.team_id.as_deref() {
            possessions.entry(team).or_default().add(&row.action);
        }
    }
    let mut minutes: BTreeMap<&str, f64> = BTreeMap::new();
    for stint in stints {
        if let Some(team) = stint.team_id.as_deref() {
            *minutes.entry(team).or_default() += stint.duration_seconds as f64 / 60.0;
        }
    }
    minutes
        .into_iter()
        .filter(|(_, m)| *m > 0.0)
        .map(|(team, m)| {
            let poss = possessions.get(team).map(|c| c.possessions()).unwrap_or(0.0);
            (team.to_string(), poss / m)
        })
        .collect()
}

/// Lineups with at least `min_minutes` together, best net per 40 first
/// within each team.
pub fn lineup_summaries(
    stints: &[Stint],
    actions: &[AttributedAction],
    min_minutes: f64,
) -> Vec<LineupSummary> {
    let pace = team_pace(stints, actions);

    let mut groups: BTreeMap<(Option<&str>, &str), (f64, u32, i32, i32)> = BTreeMap::new();
    for stint in stints.iter().filter(|s| !s.lineup_key.is_empty()) {
        let entry = groups
            .entry((stint.team_id.as_deref(), stint.lineup_key.as_str()))
            .or_default();
        entry.0 += stint.duration_seconds as f64 / 60.0;
        entry.1 += 1;
        entry.2 += stint.points_for.unwrap_or(0);
        entry.3 += stint.points_against.unwrap_or(0);
    }

    let mut out: Vec<LineupSummary> = groups
        .into_iter()
        .filter(|(_, (minutes, ..))| *minutes >= min_minutes)
        .map(|((team, key), (minutes, count, pf, pa))| {
            let net = pf - pa;
            let poss_est = team
                .and_then(|t| pace.get(t))
                .map(|rate| rate * minutes)
                .filter(|p| *p > 0.0);
            let rating = |points: i32| poss_est.map(|p| points as f64 / p * 100.0);
            let (off_rating, def_rating) = (rating(pf), rating(pa));
            LineupSummary {
                team_id: team.map(str::to_string),
                lineup_key: key.to_string(),
                minutes,
                stints: count,
                points_for: pf,
                points_against: pa,
                net_points: net,
                off_per40: per_minutes(pf as f64, minutes),
                def_per40: per_minutes(pa as f64, minutes),
                net_per40: per_minutes(net as f64, minutes),
                poss_est,
                off_rating,
                def_rating,
                net_rating: off_rating.zip(def_rating).map(|(o, d)| o - d),
            }
        })
        .collect();

    out.sort_by(|a, b| {
        a.team_id
            .cmp(&b.team_id)
            .then_with(|| {
                b.net_per40
                    .unwrap_or(f64::NEG_INFINITY)
                    .total_cmp(&a.net_per40.unwrap_or(f64::NEG_INFINITY))
            })
            .then_with(|| b.minutes.total_cmp(&a.minutes))
            .then_with(|| a.lineup_key.cmp(&b.lineup_key))
    });
    out
}

/// On-court minutes estimated from stints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerMinutes {
    pub player_id: String,
    pub team_id: Option<String>,
    pub games: u32,
    pub stints: u32,
    pub minutes: f64,
}

pub fn player_minutes(stints: &[Stint]) -> Vec<PlayerMinutes> {
    let mut acc: BTreeMap<(&str, Option<&str>), (BTreeSet<&str>, u32, u32)> = BTreeMap::new();
    for stint in stints {
        for player in &stint.players {
            let entry = acc
                .entry((player.as_str(), stint.team_id.as_deref()))
                .or_default();
            entry.0.insert(&stint.game_id);
            entry.1 += 1;
            entry.2 += stint.duration_seconds;
        }
    }
    acc.into_iter()
        .map(|((player_id, team_id), (games, count, seconds))| PlayerMinutes {
            player_id: player_id.to_string(),
            team_id: team_id.map(str::to_string),
            games: games.len() as u32,
            stints: count,
            minutes: seconds as f64 / 60.0,
        })
        .collect()
}

// =============================================================================
// Report
// =============================================================================

/// Every aggregate table for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregateReport {
    pub player_rates: Vec<PlayerActionRates>,
    pub context_splits: Vec<ContextSplit>,
    pub spatial_profiles: Vec<SpatialProfile>,
    pub lineup_summaries: Vec<LineupSummary>,
    pub player_minutes: Vec<PlayerMinutes>,
}

impl AggregateReport {
    pub fn build(actions: &[AttributedAction], stints: &[Stint], lineup_min_minutes: f64) -> Self {
        Self {
            player_rates: player_action_rates(actions),
            context_splits: context_splits(actions),
            spatial_profiles: spatial_profiles(actions),
            lineup_summaries: lineup_summaries(stints, actions, lineup_min_minutes),
            player_minutes: player_minutes(stints),
        }
    }
}

// =============================================================================
// UNIT TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ActionResult;
    use crate::types::Side;

    fn row(player: &str, team: &str, action: Action) -> AttributedAction {
        AttributedAction {
            player_id: player.to_string(),
            team_id: Some(team.to_string()),
            game_id: "g1".to_string(),
            event_id: "e".to_string(),
            period_number: Some(1),
            clock_seconds: Some(500),
            result: action.result(),
            points_value: action.points_value(),
            action,
            margin_home: Some(0),
            margin_for_team: Some(0),
            state: None,
            clutch: false,
            margin_bucket: MarginBucket::Tied,
            transition: false,
            hx: None,
            hy: None,
            zone: None,
        }
    }

    fn stint(team: &str, key: &str, seconds: u32, pf: Option<i32>, pa: Option<i32>) -> Stint {
        Stint {
            game_id: "g1".to_string(),
            team_id: Some(team.to_string()),
            side: Side::Home,
            stint_id: 1,
            lineup_key: key.to_string(),
            players: key.split('|').map(str::to_string).collect(),
            start_time: 0,
            end_time: seconds,
            duration_seconds: seconds,
            points_for: pf,
            points_against: pa,
            complete: true,
        }
    }

    #[test]
    fn test_player_rates() {
        let mut clutch_three = row("p1", "NYL", Action::ThreePa { made: true });
        clutch_three.clutch = true;
        clutch_three.transition = true;
        let actions = vec![
            row("p1", "NYL", Action::TwoPa { made: true }),
            row("p1", "NYL", Action::TwoPa { made: false }),
            clutch_three,
            row("p1", "NYL", Action::Fta { made: true }),
            row("p1", "NYL", Action::Fta { made: false }),
            row("p1", "NYL", Action::Assist),
            row("p1", "NYL", Action::Turnover { subtype: None }),
            row("p2", "LVA", Action::Drb),
        ];
        let rates = player_action_rates(&actions);
        assert_eq!(rates.len(), 2);

        let p1 = &rates[0];
        assert_eq!(p1.player_id, "p1");
        assert_eq!(p1.team_id.as_deref(), Some("NYL"));
        assert_eq!(p1.counts.fga, 3);
        assert_eq!(p1.counts.fgm, 2);
        assert_eq!(p1.counts.points, 6);
        assert_eq!(p1.fg_pct, Some(2.0 / 3.0));
        assert_eq!(p1.three_pct, Some(1.0));
        assert_eq!(p1.ft_pct, Some(0.5));
        assert_eq!(p1.fta_rate, Some(2.0 / 3.0));
        assert_eq!(p1.ast_to_ratio, Some(1.0));
        assert_eq!(p1.clutch_fga, 1);
        assert_eq!(p1.trans_fga, 1);

        assert_eq!(p1.clutch_fga_share, Some(1.0 / 3.0));
        assert_eq!(p1.trans_fga_share, Some(1.0 / 3.0));

        let p2 = &rates[1];
        assert_eq!(p2.counts.drb, 1);
        assert_eq!(p2.fg_pct, None);
        assert_eq!(p2.ast_to_ratio, None);
        assert_eq!(p2.clutch_fga_share, None);
    }

    #[test]
    fn test_assisted_and_unassisted_makes() {
        let mut assisted = row("p1", "NYL", Action::TwoPa { made: true });
        assisted.event_id = "e1".to_string();
        let mut assist = row("p2", "NYL", Action::Assist);
        assist.event_id = "e1".to_string();
        let mut solo = row("p1", "NYL", Action::ThreePa { made: true });
        solo.event_id = "e2".to_string();
        let mut miss = row("p1", "NYL", Action::TwoPa { made: false });
        miss.event_id = "e3".to_string();
        // an assist in another game does not count for e2
        let mut other_game = row("p2", "NYL", Action::Assist);
        other_game.game_id = "g2".to_string();
        other_game.event_id = "e2".to_string();

        let rates = player_action_rates(&[assisted, assist, solo, miss, other_game]);
        let p1 = &rates[0];
        assert_eq!(p1.assisted_fgm, 1);
        assert_eq!(p1.unassisted_fgm, 1);
        assert_eq!(p1.assisted_fgm + p1.unassisted_fgm, p1.counts.fgm);
        assert_eq!(rates[1].assisted_fgm, 0);
    }

    #[test]
    fn test_zone_totals_include_area_only_shots() {
        // zone from the feed's area text, no hoop-relative coordinates
        let mut area_only = row("p1", "NYL", Action::ThreePa { made: true });
        area_only.zone = Some(Zone::Corner3);
        let mut located = row("p1", "NYL", Action::TwoPa { made: false });
        located.hx = Some(0.0);
        located.hy = Some(30.0);
        located.zone = Some(Zone::Rim);
        let mut unknown = row("p1", "NYL", Action::TwoPa { made: true });
        unknown.zone = Some(Zone::Unknown);
        let no_zone = row("p1", "NYL", Action::Assist);

        let actions = vec![area_only, located, unknown, no_zone];
        let p1 = &player_action_rates(&actions)[0];
        assert_eq!(p1.zones.attempts(Zone::Corner3), 1);
        assert_eq!(p1.zones.made(Zone::Corner3), 1);
        assert_eq!(p1.zones.attempts(Zone::Rim), 1);
        assert_eq!(p1.zones.made(Zone::Rim), 0);
        assert_eq!(p1.zones.attempts(Zone::Unknown), 1);
        let total: u32 = Zone::ALL.iter().map(|&z| p1.zones.attempts(z)).sum();
        assert_eq!(total, p1.counts.fga);

        // the spatial profile still only sees the located attempt
        assert_eq!(spatial_profiles(&actions)[0].fga, 1);

        let json = serde_json::to_value(p1).unwrap();
        assert_eq!(json["zone_corner3_att"], 1);
        assert_eq!(json["zone_corner3_made"], 1);
        assert_eq!(json["zone_mid_att"], 0);
    }

    #[test]
    fn test_turnover_subtype_counts() {
        let actions = vec![
            row("p1", "NYL", Action::Turnover { subtype: Some("Bad Pass".to_string()) }),
            row("p1", "NYL", Action::Turnover { subtype: Some("lost ball".to_string()) }),
            row("p1", "NYL", Action::Turnover { subtype: Some("Offensive Foul".to_string()) }),
            row("p1", "NYL", Action::Turnover { subtype: Some("offensive foul".to_string()) }),
            row("p1", "NYL", Action::Turnover { subtype: None }),
        ];
        let p1 = &player_action_rates(&actions)[0];
        assert_eq!(p1.counts.tov, 5);
        assert_eq!(p1.turnover_types.get("tov_bad_pass"), Some(&1));
        assert_eq!(p1.turnover_types.get("tov_lost_ball"), Some(&1));
        assert_eq!(p1.turnover_types.get("tov_offensive_foul"), Some(&2));
        assert_eq!(p1.turnover_types.len(), 3);

        let json = serde_json::to_value(p1).unwrap();
        assert_eq!(json["tov_offensive_foul"], 2);
    }

    #[test]
    fn test_turnover_subtype_key() {
        assert_eq!(turnover_subtype_key("bad pass").as_deref(), Some("tov_bad_pass"));
        assert_eq!(turnover_subtype_key("Lost Ball").as_deref(), Some("tov_lost_ball"));
        assert_eq!(turnover_subtype_key("3-second violation").as_deref(), Some("tov_3_second_violation"));
        assert_eq!(turnover_subtype_key("  "), None);
    }

    #[test]
    fn test_primary_team_is_most_frequent() {
        let actions = vec![
            row("p1", "ATL", Action::Assist),
            row("p1", "CHI", Action::Assist),
            row("p1", "CHI", Action::Drb),
        ];
        assert_eq!(player_action_rates(&actions)[0].team_id.as_deref(), Some("CHI"));
    }

    #[test]
    fn test_context_splits() {
        let mut late = row("p1", "NYL", Action::TwoPa { made: true });
        late.period_number = Some(5);
        late.clutch = true;
        late.margin_for_team = None;
        late.margin_home = Some(-12);
        let actions = vec![row("p1", "NYL", Action::TwoPa { made: false }), late];

        let splits = context_splits(&actions);
        let find = |kind: SplitKind, value: &str| {
            splits
                .iter()
                .find(|s| s.split == kind && s.value == value)
                .map(|s| s.counts.fga)
        };
        assert_eq!(find(SplitKind::Clutch, "clutch"), Some(1));
        assert_eq!(find(SplitKind::Clutch, "non_clutch"), Some(1));
        assert_eq!(find(SplitKind::MarginBucket, "tied"), Some(1));
        assert_eq!(find(SplitKind::MarginBucket, "trail_10plus"), Some(1));
        assert_eq!(find(SplitKind::Quarter, "q1"), Some(1));
        // overtime has no quarter split
        assert_eq!(splits.iter().filter(|s| s.split == SplitKind::Quarter).count(), 1);
    }

    #[test]
    fn test_spatial_profile() {
        let mut a = row("p1", "NYL", Action::TwoPa { made: true });
        a.hx = Some(0.0);
        a.hy = Some(30.0);
        a.zone = Some(Zone::Rim);
        let mut b = row("p1", "NYL", Action::ThreePa { made: false });
        b.hx = Some(0.0);
        b.hy = Some(250.0);
        b.zone = Some(Zone::Ab3);
        let unlocated = row("p1", "NYL", Action::TwoPa { made: true });

        let profiles = spatial_profiles(&[a, b, unlocated]);
        assert_eq!(profiles.len(), 1);
        let p = &profiles[0];
        assert_eq!(p.fga, 2);
        assert_eq!(p.fgm, 1);
        assert_eq!(p.avg_distance, Some(140.0));
        let sd = p.sd_distance.unwrap();
        assert!((sd - 155.563_491_861).abs() < 1e-6);

        let rim = p.zones.iter().find(|z| z.zone == Zone::Rim).unwrap();
        assert_eq!((rim.attempts, rim.made, rim.share), (1, 1, Some(0.5)));
        let mid = p.zones.iter().find(|z| z.zone == Zone::Mid).unwrap();
        assert_eq!(mid.fg_pct, None);
    }

    #[test]
    fn test_lineup_summaries_filter_and_rate() {
        let stints = vec![
            stint("NYL", "a|b|c|d|e", 600, Some(20), Some(10)),
            stint("NYL", "a|b|c|d|e", 600, Some(4), None),
            stint("NYL", "a|b|c|d|f", 120, Some(6), Some(0)),
        ];
        let actions: Vec<AttributedAction> = (0..44)
            .map(|_| row("a", "NYL", Action::TwoPa { made: false }))
            .collect();
        let out = lineup_summaries(&stints, &actions, 10.0);
        assert_eq!(out.len(), 1);
        let l = &out[0];
        assert_eq!(l.minutes, 20.0);
        assert_eq!(l.stints, 2);
        assert_eq!(l.points_for, 24);
        assert_eq!(l.points_against, 10);
        assert_eq!(l.net_points, 14);
        assert_eq!(l.net_per40, Some(28.0));
        // 44 possessions over 22 team minutes
        assert_eq!(l.poss_est, Some(40.0));
        assert_eq!(l.off_rating, Some(60.0));
    }

    #[test]
    fn test_player_minutes() {
        let stints = vec![
            stint("NYL", "a|b|c|d|e", 600, None, None),
            stint("NYL", "a|b|c|d|f", 300, None, None),
        ];
        let minutes = player_minutes(&stints);
        let a = minutes.iter().find(|m| m.player_id == "a").unwrap();
        assert_eq!(a.minutes, 15.0);
        assert_eq!(a.stints, 2);
        assert_eq!(a.games, 1);
        let f = minutes.iter().find(|m| m.player_id == "f").unwrap();
        assert_eq!(f.minutes, 5.0);
    }

    #[test]
    fn test_counts_result_labels() {
        assert_eq!(Action::Assist.result(), ActionResult::Credited);
        let mut c = ActionCounts::default();
        c.add(&Action::Fta { made: true });
        c.add(&Action::Turnover { subtype: None });
        assert_eq!(c.points, 1);
        assert!((c.possessions() - 1.44).abs() < 1e-12);
    }
}
