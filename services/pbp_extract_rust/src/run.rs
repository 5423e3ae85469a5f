//! One extraction run: load tables, attribute, aggregate, write outputs.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use pbp_rust_core::aggregate::{AggregateReport, SpatialProfile};
use pbp_rust_core::matching::suggest::suggest_for_issues;
use pbp_rust_core::matching::AliasTable;
use pbp_rust_core::models::Zone;
use pbp_rust_core::table::{
    decode_aliases, decode_events, decode_game_contexts, decode_lineups, decode_roster,
    ALIAS_TABLE, EVENT_TABLE, GAME_CONTEXT_TABLE, LINEUP_TABLE, ROSTER_TABLE,
};
use pbp_rust_core::{Capabilities, IssueKind, Pipeline};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::config::ServiceConfig;
use crate::io::{read_optional_table, read_table, write_rows, CsvRecord};

pub const ACTIONS_OUTPUT: &str = "player_actions.csv";
pub const ISSUES_OUTPUT: &str = "issues.csv";
pub const STINTS_OUTPUT: &str = "stints.csv";
pub const PLAYER_RATES_OUTPUT: &str = "player_rates.csv";
pub const CONTEXT_SPLITS_OUTPUT: &str = "context_splits.csv";
pub const SPATIAL_PROFILE_OUTPUT: &str = "spatial_profile.csv";
pub const SPATIAL_ZONES_OUTPUT: &str = "spatial_zones.csv";
pub const LINEUP_SUMMARY_OUTPUT: &str = "lineup_summary.csv";
pub const PLAYER_MINUTES_OUTPUT: &str = "player_minutes.csv";
pub const SUGGESTIONS_OUTPUT: &str = "name_suggestions.csv";
pub const SUMMARY_OUTPUT: &str = "run_summary.json";

/// Counts and settings for one run, written next to the outputs.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub games: usize,
    pub events: usize,
    pub actions: usize,
    pub issues: usize,
    pub not_found: usize,
    pub ambiguous: usize,
    pub unparsed: usize,
    pub multiple_draw_clauses: usize,
    pub stints: usize,
    pub suggestions: usize,
    pub capabilities: Capabilities,
    pub outputs: Vec<String>,
}

/// Profile row without the nested zone list.
#[derive(Serialize)]
struct SpatialProfileRow<'a> {
    player_id: &'a str,
    fga: u32,
    fgm: u32,
    avg_distance: Option<f64>,
    sd_distance: Option<f64>,
    avg_hx: Option<f64>,
    avg_hy: Option<f64>,
}

#[derive(Serialize)]
struct SpatialZoneRow<'a> {
    player_id: &'a str,
    zone: Zone,
    attempts: u32,
    made: u32,
    fg_pct: Option<f64>,
    share: Option<f64>,
}

impl CsvRecord for SpatialProfileRow<'_> {
    fn columns() -> Vec<&'static str> {
        vec!["player_id", "fga", "fgm", "avg_distance", "sd_distance", "avg_hx", "avg_hy"]
    }
}

impl CsvRecord for SpatialZoneRow<'_> {
    fn columns() -> Vec<&'static str> {
        vec!["player_id", "zone", "attempts", "made", "fg_pct", "share"]
    }
}

fn spatial_rows(profiles: &[SpatialProfile]) -> (Vec<SpatialProfileRow<'_>>, Vec<SpatialZoneRow<'_>>) {
    let mut zones = Vec::new();
    let rows = profiles
        .iter()
        .map(|p| {
            zones.extend(p.zones.iter().map(|z| SpatialZoneRow {
                player_id: &p.player_id,
                zone: z.zone,
                attempts: z.attempts,
                made: z.made,
                fg_pct: z.fg_pct,
                share: z.share,
            }));
            SpatialProfileRow {
                player_id: &p.player_id,
                fga: p.fga,
                fgm: p.fgm,
                avg_distance: p.avg_distance,
                sd_distance: p.sd_distance,
                avg_hx: p.avg_hx,
                avg_hy: p.avg_hy,
            }
        })
        .collect();
    (rows, zones)
}

fn load_aliases(path: &Path) -> Result<AliasTable> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        if !path.exists() {
            return Ok(AliasTable::new());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read alias file: {}", path.display()))?;
        return Ok(AliasTable::from_json(&content)?);
    }
    match read_optional_table(ALIAS_TABLE, path)? {
        Some(table) => Ok(decode_aliases(&table)?),
        None => Ok(AliasTable::new()),
    }
}

/// Run the whole extraction described by `config`.
///
/// Every input table is decoded before any event is processed, so a
/// missing required column fails the run without partial output.
pub fn run(config: &ServiceConfig) -> Result<RunSummary> {
    let started_at = Utc::now();

    // Inputs
    let roster = decode_roster(&read_table(ROSTER_TABLE, &config.roster_path)?)?;
    let aliases = load_aliases(&config.aliases_path)?;
    let events_table = read_table(EVENT_TABLE, &config.events_path)?;
    let events = decode_events(&events_table)?;
    let context_table = read_optional_table(GAME_CONTEXT_TABLE, &config.game_context_path)?;
    let games = match &context_table {
        Some(table) => decode_game_contexts(table)?,
        None => Default::default(),
    };
    let lineup_table = read_optional_table(LINEUP_TABLE, &config.lineups_path)?;
    let snapshots = match &lineup_table {
        Some(table) => decode_lineups(table)?,
        None => Vec::new(),
    };

    let capabilities = Capabilities::detect(&events_table, context_table.as_ref(), lineup_table.as_ref());
    info!(
        "Loaded {} roster rows, {} aliases, {} events, {} game contexts, {} lineup snapshots",
        roster.len(),
        aliases.len(),
        events.len(),
        games.len(),
        snapshots.len()
    );
    info!("Capabilities: {:?}", capabilities);
    if roster.is_empty() {
        warn!("Roster is empty; every name will be reported as not found");
    }

    // Attribution
    let pipeline = Pipeline::new(&roster, &aliases, &games, &config.pipeline, capabilities);
    let output = pipeline.process_batch(&events, &snapshots);
    let report = AggregateReport::build(&output.actions, &output.stints, config.pipeline.lineup_min_minutes);
    let suggestions = suggest_for_issues(&output.issues, &roster, &aliases, config.pipeline.suggestion_cutoff);

    // Outputs
    fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("Failed to create output dir: {}", config.output_dir.display()))?;
    let out = |name: &str| config.output_dir.join(name);

    write_rows(&out(ACTIONS_OUTPUT), &output.actions)?;
    write_rows(&out(ISSUES_OUTPUT), &output.issues)?;
    write_rows(&out(PLAYER_RATES_OUTPUT), &report.player_rates)?;
    write_rows(&out(CONTEXT_SPLITS_OUTPUT), &report.context_splits)?;
    let (profile_rows, zone_rows) = spatial_rows(&report.spatial_profiles);
    write_rows(&out(SPATIAL_PROFILE_OUTPUT), &profile_rows)?;
    write_rows(&out(SPATIAL_ZONES_OUTPUT), &zone_rows)?;
    write_rows(&out(SUGGESTIONS_OUTPUT), &suggestions)?;
    if !capabilities.has_lineups {
        info!("No lineup table; stints, lineup summaries and minutes are header-only");
    }
    write_rows(&out(STINTS_OUTPUT), &output.stints)?;
    write_rows(&out(LINEUP_SUMMARY_OUTPUT), &report.lineup_summaries)?;
    write_rows(&out(PLAYER_MINUTES_OUTPUT), &report.player_minutes)?;

    let outputs: Vec<String> = [
        ACTIONS_OUTPUT,
        ISSUES_OUTPUT,
        PLAYER_RATES_OUTPUT,
        CONTEXT_SPLITS_OUTPUT,
        SPATIAL_PROFILE_OUTPUT,
        SPATIAL_ZONES_OUTPUT,
        SUGGESTIONS_OUTPUT,
        STINTS_OUTPUT,
        LINEUP_SUMMARY_OUTPUT,
        PLAYER_MINUTES_OUTPUT,
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    let games_seen: BTreeSet<&str> = events.iter().map(|e| e.game_id.as_str()).collect();
    let summary = RunSummary {
        started_at,
        finished_at: Utc::now(),
        games: games_seen.len(),
        events: events.len(),
        actions: output.actions.len(),
        issues: output.issues.len(),
        not_found: output.issue_count(IssueKind::NotFound),
        ambiguous: output.issue_count(IssueKind::Ambiguous),
        unparsed: output.issue_count(IssueKind::Unparsed),
        multiple_draw_clauses: output.issue_count(IssueKind::MultipleDrawClauses),
        stints: output.stints.len(),
        suggestions: suggestions.len(),
        capabilities,
        outputs,
    };

    let summary_path = out(SUMMARY_OUTPUT);
    let file = fs::File::create(&summary_path)
        .with_context(|| format!("Failed to create {}", summary_path.display()))?;
    serde_json::to_writer_pretty(file, &summary).context("Failed to write run summary")?;

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pbp_rust_core::aggregate::ZoneProfile;

    #[test]
    fn test_spatial_rows_flatten_zones() {
        let profile = SpatialProfile {
            player_id: "p1".to_string(),
            fga: 3,
            fgm: 2,
            avg_distance: Some(50.0),
            sd_distance: Some(10.0),
            avg_hx: Some(20.0),
            avg_hy: Some(40.0),
            zones: vec![
                ZoneProfile {
                    zone: Zone::Rim,
                    attempts: 2,
                    made: 2,
                    fg_pct: Some(1.0),
                    share: Some(2.0 / 3.0),
                },
                ZoneProfile {
                    zone: Zone::Mid,
                    attempts: 1,
                    made: 0,
                    fg_pct: Some(0.0),
                    share: Some(1.0 / 3.0),
                },
            ],
        };
        let profiles = vec![profile];
        let (rows, zones) = spatial_rows(&profiles);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].fga, 3);
        assert_eq!(zones.len(), 2);
        assert!(zones.iter().all(|z| z.player_id == "p1"));
        assert_eq!(zones[1].zone, Zone::Mid);
    }

    #[test]
    fn test_missing_json_aliases_is_empty() {
        let aliases = load_aliases(Path::new("/nonexistent/aliases.json")).unwrap();
        assert!(aliases.is_empty());
        let aliases = load_aliases(Path::new("/nonexistent/aliases.csv")).unwrap();
        assert!(aliases.is_empty());
    }
}
