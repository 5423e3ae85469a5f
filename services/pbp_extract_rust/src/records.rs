//! Output header per row type.
//!
//! Column lists follow each type's serialized field order. Flattened
//! payloads (action fields, counts, zone counts) sit where serde writes
//! them. Keys that only exist at run time, such as `tov_<subtype>`, are
//! appended by the writer after these.

use pbp_rust_core::aggregate::{ContextSplit, LineupSummary, PlayerActionRates, PlayerMinutes};
use pbp_rust_core::matching::suggest::NameSuggestion;
use pbp_rust_core::models::AttributedAction;
use pbp_rust_core::{Issue, Stint};

use crate::io::CsvRecord;

/// Flattened `ActionCounts` fields.
const COUNT_COLUMNS: &[&str] = &[
    "fga",
    "fgm",
    "two_pa",
    "two_pm",
    "three_pa",
    "three_pm",
    "fta",
    "ftm",
    "points",
    "ast",
    "tov",
    "orb",
    "drb",
    "stl",
    "blk",
    "pf_committed",
    "pf_drawn",
];

/// Flattened `ZoneCounts`, every zone in declaration order.
const ZONE_COLUMNS: &[&str] = &[
    "zone_rim_att",
    "zone_rim_made",
    "zone_paint_att",
    "zone_paint_made",
    "zone_mid_att",
    "zone_mid_made",
    "zone_corner3_att",
    "zone_corner3_made",
    "zone_ab3_att",
    "zone_ab3_made",
    "zone_three_unknown_att",
    "zone_three_unknown_made",
    "zone_unknown_att",
    "zone_unknown_made",
];

impl CsvRecord for AttributedAction {
    fn columns() -> Vec<&'static str> {
        vec![
            "player_id",
            "team_id",
            "game_id",
            "event_id",
            "period_number",
            "clock_seconds",
            "action",
            "made",
            "subtype",
            "result",
            "points_value",
            "margin_home",
            "margin_for_team",
            "state",
            "clutch",
            "margin_bucket",
            "transition",
            "hx",
            "hy",
            "zone",
        ]
    }
}

impl CsvRecord for Issue {
    fn columns() -> Vec<&'static str> {
        vec![
            "bucket",
            "role",
            "raw_text",
            "normalized_name",
            "game_id",
            "event_id",
            "problem",
            "candidates",
            "description",
        ]
    }
}

impl CsvRecord for Stint {
    fn columns() -> Vec<&'static str> {
        vec![
            "game_id",
            "team_id",
            "side",
            "stint_id",
            "lineup_key",
            "players",
            "start_time",
            "end_time",
            "duration_seconds",
            "points_for",
            "points_against",
            "complete",
        ]
    }
}

impl CsvRecord for PlayerActionRates {
    fn columns() -> Vec<&'static str> {
        let mut columns = vec!["player_id", "team_id", "games"];
        columns.extend_from_slice(COUNT_COLUMNS);
        columns.extend_from_slice(&[
            "assisted_fgm",
            "unassisted_fgm",
            "clutch_fga",
            "clutch_fta",
            "clutch_tov",
            "trans_fga",
            "clutch_fga_share",
            "trans_fga_share",
            "fg_pct",
            "three_pct",
            "ft_pct",
            "three_rate",
            "fta_rate",
            "tov_per_fga",
            "ast_to_ratio",
        ]);
        columns.extend_from_slice(ZONE_COLUMNS);
        columns
    }
}

impl CsvRecord for ContextSplit {
    fn columns() -> Vec<&'static str> {
        let mut columns = vec!["player_id", "split", "value"];
        columns.extend_from_slice(COUNT_COLUMNS);
        columns.push("fg_pct");
        columns
    }
}

impl CsvRecord for LineupSummary {
    fn columns() -> Vec<&'static str> {
        vec![
            "team_id",
            "lineup_key",
            "minutes",
            "stints",
            "points_for",
            "points_against",
            "net_points",
            "off_per40",
            "def_per40",
            "net_per40",
            "poss_est",
            "off_rating",
            "def_rating",
            "net_rating",
        ]
    }
}

impl CsvRecord for PlayerMinutes {
    fn columns() -> Vec<&'static str> {
        vec!["player_id", "team_id", "games", "stints", "minutes"]
    }
}

impl CsvRecord for NameSuggestion {
    fn columns() -> Vec<&'static str> {
        vec![
            "raw_name",
            "normalized_name",
            "suggested_key",
            "player_id",
            "team_id",
            "display_name",
            "score",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pbp_rust_core::aggregate::{context_splits, player_action_rates, player_minutes};
    use pbp_rust_core::models::{Action, MarginBucket, Zone};
    use pbp_rust_core::{Bucket, IssueKind, Role, Side};
    use serde_json::Value;

    /// Every serialized key is a declared column, in declared order.
    fn assert_columns_cover<T: CsvRecord>(row: &T) {
        let columns = T::columns();
        let value = serde_json::to_value(row).unwrap();
        let Value::Object(map) = value else {
            panic!("row is not an object");
        };
        let mut last = None;
        for key in map.keys().filter(|k| !k.starts_with("tov_")) {
            let pos = columns
                .iter()
                .position(|c| c == key)
                .unwrap_or_else(|| panic!("{} missing from columns", key));
            assert!(last.map_or(true, |l| pos > l), "{} out of order", key);
            last = Some(pos);
        }
    }

    fn action(action: Action) -> AttributedAction {
        AttributedAction {
            player_id: "p1".to_string(),
            team_id: Some("NYL".to_string()),
            game_id: "g1".to_string(),
            event_id: "e1".to_string(),
            period_number: Some(4),
            clock_seconds: Some(90),
            result: action.result(),
            points_value: action.points_value(),
            action,
            margin_home: Some(2),
            margin_for_team: Some(2),
            state: None,
            clutch: true,
            margin_bucket: MarginBucket::Lead1To3,
            transition: false,
            hx: Some(10.0),
            hy: Some(20.0),
            zone: Some(Zone::Rim),
        }
    }

    #[test]
    fn test_action_columns() {
        assert_columns_cover(&action(Action::TwoPa { made: true }));
        assert_columns_cover(&action(Action::Turnover {
            subtype: Some("bad pass".to_string()),
        }));
        assert_columns_cover(&action(Action::Steal));
    }

    #[test]
    fn test_aggregate_columns() {
        let rows = vec![
            action(Action::ThreePa { made: true }),
            action(Action::Turnover {
                subtype: Some("lost ball".to_string()),
            }),
        ];
        for rate in player_action_rates(&rows) {
            assert_columns_cover(&rate);
        }
        for split in context_splits(&rows) {
            assert_columns_cover(&split);
        }
    }

    #[test]
    fn test_issue_stint_and_minutes_columns() {
        assert_columns_cover(&Issue {
            bucket: Bucket::Shot,
            role: Some(Role::Shooter),
            raw_text: "Zed".to_string(),
            normalized_name: Some("zed".to_string()),
            game_id: "g1".to_string(),
            event_id: "e1".to_string(),
            problem: IssueKind::NotFound,
            candidates: None,
            description: "Zed makes two point shot".to_string(),
        });

        let stint = Stint {
            game_id: "g1".to_string(),
            team_id: Some("NYL".to_string()),
            side: Side::Home,
            stint_id: 1,
            lineup_key: "a|b".to_string(),
            players: vec!["a".to_string(), "b".to_string()],
            start_time: 0,
            end_time: 60,
            duration_seconds: 60,
            points_for: Some(2),
            points_against: Some(0),
            complete: false,
        };
        assert_columns_cover(&stint);
        for minutes in player_minutes(&[stint]) {
            assert_columns_cover(&minutes);
        }
    }
}
