// Shared output models for the play-by-play pipeline
use serde::{Deserialize, Serialize};

pub mod action;

pub use action::{Action, ActionResult};

// ============================================================================
// Situational context enums
// ============================================================================

/// Coarse court region of a field-goal attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    Rim,
    Paint,
    Mid,
    #[serde(rename = "corner3")]
    Corner3,
    /// Above-the-break three
    #[serde(rename = "ab3")]
    Ab3,
    /// A three whose side could not be determined from the feed's area text
    ThreeUnknown,
    Unknown,
}

impl Zone {
    pub const SHOT_ZONES: [Zone; 5] = [Zone::Rim, Zone::Paint, Zone::Mid, Zone::Corner3, Zone::Ab3];

    /// Every zone in declaration order; `index` is the position here.
    pub const ALL: [Zone; 7] = [
        Zone::Rim,
        Zone::Paint,
        Zone::Mid,
        Zone::Corner3,
        Zone::Ab3,
        Zone::ThreeUnknown,
        Zone::Unknown,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Zone::Rim => "rim",
            Zone::Paint => "paint",
            Zone::Mid => "mid",
            Zone::Corner3 => "corner3",
            Zone::Ab3 => "ab3",
            Zone::ThreeUnknown => "three_unknown",
            Zone::Unknown => "unknown",
        }
    }
}

/// Team-perspective score margin, bucketed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarginBucket {
    #[serde(rename = "trail_10plus")]
    Trail10Plus,
    #[serde(rename = "trail_4_9")]
    Trail4To9,
    #[serde(rename = "trail_1_3")]
    Trail1To3,
    Tied,
    #[serde(rename = "lead_1_3")]
    Lead1To3,
    #[serde(rename = "lead_4_9")]
    Lead4To9,
    #[serde(rename = "lead_10plus")]
    Lead10Plus,
    Unknown,
}

impl MarginBucket {
    pub fn from_margin(margin: Option<i32>) -> Self {
        match margin {
            None => MarginBucket::Unknown,
            Some(m) if m <= -10 => MarginBucket::Trail10Plus,
            Some(m) if m <= -4 => MarginBucket::Trail4To9,
            Some(m) if m < 0 => MarginBucket::Trail1To3,
            Some(0) => MarginBucket::Tied,
            Some(m) if m < 4 => MarginBucket::Lead1To3,
            Some(m) if m < 10 => MarginBucket::Lead4To9,
            Some(_) => MarginBucket::Lead10Plus,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MarginBucket::Trail10Plus => "trail_10plus",
            MarginBucket::Trail4To9 => "trail_4_9",
            MarginBucket::Trail1To3 => "trail_1_3",
            MarginBucket::Tied => "tied",
            MarginBucket::Lead1To3 => "lead_1_3",
            MarginBucket::Lead4To9 => "lead_4_9",
            MarginBucket::Lead10Plus => "lead_10plus",
            MarginBucket::Unknown => "unknown",
        }
    }
}

/// Sign of the team-perspective margin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreState {
    Winning,
    Trailing,
    Tied,
}

impl ScoreState {
    pub fn from_margin(margin: i32) -> Self {
        match margin {
            m if m > 0 => ScoreState::Winning,
            m if m < 0 => ScoreState::Trailing,
            _ => ScoreState::Tied,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreState::Winning => "winning",
            ScoreState::Trailing => "trailing",
            ScoreState::Tied => "tied",
        }
    }
}

// ============================================================================
// Attributed action row
// ============================================================================

/// One player-attributed fact with its situational context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributedAction {
    pub player_id: String,
    pub team_id: Option<String>,
    pub game_id: String,
    pub event_id: String,
    pub period_number: Option<u32>,
    pub clock_seconds: Option<u32>,
    #[serde(flatten)]
    pub action: Action,
    pub result: ActionResult,
    pub points_value: Option<u8>,
    pub margin_home: Option<i32>,
    pub margin_for_team: Option<i32>,
    pub state: Option<ScoreState>,
    pub clutch: bool,
    pub margin_bucket: MarginBucket,
    pub transition: bool,
    /// Hoop-relative coordinates, field-goal attempts only.
    pub hx: Option<f64>,
    pub hy: Option<f64>,
    /// Shot zone, field-goal attempts only.
    pub zone: Option<Zone>,
}

impl AttributedAction {
    /// Margin used for situational splits: team perspective when known,
    /// otherwise home perspective.
    pub fn split_margin(&self) -> Option<i32> {
        self.margin_for_team.or(self.margin_home)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_margin_bucket_boundaries() {
        assert_eq!(MarginBucket::from_margin(Some(-7)), MarginBucket::Trail4To9);
        assert_eq!(MarginBucket::from_margin(Some(0)), MarginBucket::Tied);
        assert_eq!(MarginBucket::from_margin(Some(12)), MarginBucket::Lead10Plus);

        assert_eq!(MarginBucket::from_margin(Some(-10)), MarginBucket::Trail10Plus);
        assert_eq!(MarginBucket::from_margin(Some(-9)), MarginBucket::Trail4To9);
        assert_eq!(MarginBucket::from_margin(Some(-4)), MarginBucket::Trail4To9);
        assert_eq!(MarginBucket::from_margin(Some(-3)), MarginBucket::Trail1To3);
        assert_eq!(MarginBucket::from_margin(Some(-1)), MarginBucket::Trail1To3);
        assert_eq!(MarginBucket::from_margin(Some(1)), MarginBucket::Lead1To3);
        assert_eq!(MarginBucket::from_margin(Some(3)), MarginBucket::Lead1To3);
        assert_eq!(MarginBucket::from_margin(Some(4)), MarginBucket::Lead4To9);
        assert_eq!(MarginBucket::from_margin(Some(9)), MarginBucket::Lead4To9);
        assert_eq!(MarginBucket::from_margin(Some(10)), MarginBucket::Lead10Plus);
        assert_eq!(MarginBucket::from_margin(None), MarginBucket::Unknown);
    }

    #[test]
    fn test_score_state_from_sign() {
        assert_eq!(ScoreState::from_margin(5), ScoreState::Winning);
        assert_eq!(ScoreState::from_margin(-1), ScoreState::Trailing);
        assert_eq!(ScoreState::from_margin(0), ScoreState::Tied);
    }

    #[test]
    fn test_zone_serde_names() {
        assert_eq!(serde_json::to_value(Zone::Corner3).unwrap(), "corner3");
        assert_eq!(serde_json::to_value(Zone::Ab3).unwrap(), "ab3");
        assert_eq!(serde_json::to_value(Zone::ThreeUnknown).unwrap(), "three_unknown");
    }

    #[test]
    fn test_zone_index_matches_all() {
        for (i, zone) in Zone::ALL.iter().enumerate() {
            assert_eq!(zone.index(), i);
        }
    }
}
