//! Context Enrichment
//!
//! Pure per-event derived fields: clock, margins, clutch, court location.
//! Nothing here fails; malformed inputs degrade the affected field to
//! `None` (or `Unknown` for zones).

use crate::config::{CourtGeometry, PipelineConfig, ZoneThresholds};
use crate::models::{MarginBucket, ScoreState, Zone};
use crate::table::Capabilities;
use crate::types::{GameContext, RawEvent};
use crate::utils::clock::REGULATION_PERIODS;
use crate::utils::parse_clock_seconds;

/// Clutch window at the end of the final regulation period.
pub const CLUTCH_WINDOW_SECONDS: u32 = 120;

const TRANSITION_MARKERS: &[&str] = &["transition", "fast break", "fastbreak"];

// =============================================================================
// Scalar rules
// =============================================================================

/// Home minus away; `None` if either score is missing.
pub fn margin_home(home_points: Option<i32>, away_points: Option<i32>) -> Option<i32> {
    Some(home_points? - away_points?)
}

/// Home margin seen from `team_id`'s side.
pub fn margin_for_team(
    margin_home: Option<i32>,
    team_id: Option<&str>,
    game: Option<&GameContext>,
) -> Option<i32> {
    let margin = margin_home?;
    let game = game?;
    let team_id = team_id?;
    if team_id == game.home_team_id {
        Some(margin)
    } else if team_id == game.away_team_id {
        Some(-margin)
    } else {
        None
    }
}

/// Final two minutes of regulation, or any overtime.
///
/// Overtime is clutch even without a readable clock.
pub fn is_clutch(period: Option<u32>, clock_seconds: Option<u32>) -> bool {
    match period {
        Some(p) if p > REGULATION_PERIODS => true,
        Some(REGULATION_PERIODS) => clock_seconds.is_some_and(|s| s <= CLUTCH_WINDOW_SECONDS),
        _ => false,
    }
}

/// Fold raw coordinates to a hoop-relative, non-negative `(hx, hy)`.
///
/// The horizontal axis is centred on the court midpoint. The far half of
/// the vertical axis is mirrored onto the near half.
pub fn fold_coordinates(x: f64, y: f64, court: &CourtGeometry) -> (f64, f64) {
    let hx = (x - court.mid_x()).abs();
    let hy = if y <= court.mid_y() { y } else { court.height - y };
    (hx, hy.abs())
}

/// Zone from folded coordinates.
pub fn zone_for(hx: f64, hy: f64, thresholds: &ZoneThresholds) -> Zone {
    let distance = hx.hypot(hy);
    if distance <= thresholds.rim_max {
        Zone::Rim
    } else if distance <= thresholds.paint_max {
        Zone::Paint
    } else if distance < thresholds.three_min {
        Zone::Mid
    } else if hx.abs() >= thresholds.corner_min_x {
        Zone::Corner3
    } else {
        Zone::Ab3
    }
}

/// Zone from the feed's free-text area label, for events without coordinates.
pub fn zone_from_action_area(area: &str) -> Zone {
    let a = area.trim().to_lowercase();
    if a.is_empty() {
        Zone::Unknown
    } else if a.contains("restricted") || a.contains("rim") {
        Zone::Rim
    } else if a.contains("paint") {
        Zone::Paint
    } else if a.contains("mid") {
        Zone::Mid
    } else if a.contains("corner") && a.contains('3') {
        Zone::Corner3
    } else if a.contains("above") || a.contains("break") {
        Zone::Ab3
    } else if a.contains('3') || a.contains("three") {
        Zone::ThreeUnknown
    } else {
        Zone::Unknown
    }
}

/// Transition / fast-break play, from qualifiers or description.
pub fn is_transition(event: &RawEvent) -> bool {
    let mentions = |text: &str| {
        let lower = text.to_lowercase();
        TRANSITION_MARKERS.iter().any(|m| lower.contains(m))
    };
    event.qualifiers.iter().any(|q| mentions(q)) || mentions(&event.description)
}

// =============================================================================
// Enricher
// =============================================================================

/// Derived fields shared by every action of one event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventContext {
    pub clock_seconds: Option<u32>,
    pub margin_home: Option<i32>,
    pub clutch: bool,
    pub transition: bool,
}

/// Team-dependent derived fields for one action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TeamContext {
    pub margin_for_team: Option<i32>,
    pub state: Option<ScoreState>,
    pub margin_bucket: MarginBucket,
}

/// Folded location and zone of a field-goal attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShotLocation {
    pub hx: Option<f64>,
    pub hy: Option<f64>,
    pub zone: Zone,
}

#[derive(Debug, Clone, Copy)]
pub struct ContextEnricher {
    zones: ZoneThresholds,
    court: CourtGeometry,
    capabilities: Capabilities,
}

impl ContextEnricher {
    pub fn new(config: &PipelineConfig, capabilities: Capabilities) -> Self {
        Self {
            zones: config.zones,
            court: config.court,
            capabilities,
        }
    }

    pub fn event_context(&self, event: &RawEvent) -> EventContext {
        let clock_seconds = event.clock.as_deref().and_then(parse_clock_seconds);
        EventContext {
            clock_seconds,
            margin_home: margin_home(event.home_points, event.away_points),
            clutch: is_clutch(event.period_number, clock_seconds),
            transition: is_transition(event),
        }
    }

    pub fn team_context(
        &self,
        margin_home: Option<i32>,
        team_id: Option<&str>,
        game: Option<&GameContext>,
    ) -> TeamContext {
        let game = game.filter(|_| self.capabilities.has_game_context);
        let margin_for_team = margin_for_team(margin_home, team_id, game);
        TeamContext {
            margin_for_team,
            state: margin_for_team.map(ScoreState::from_margin),
            margin_bucket: MarginBucket::from_margin(margin_for_team),
        }
    }

    /// Coordinates first, then the area label, else unknown.
    pub fn shot_location(&self, event: &RawEvent) -> ShotLocation {
        if self.capabilities.has_coordinates {
            let finite = |v: Option<f64>| v.filter(|f| f.is_finite());
            if let (Some(x), Some(y)) = (finite(event.location_x), finite(event.location_y)) {
                let (hx, hy) = fold_coordinates(x, y, &self.court);
                return ShotLocation {
                    hx: Some(hx),
                    hy: Some(hy),
                    zone: zone_for(hx, hy, &self.zones),
                };
            }
        }
        let zone = match (self.capabilities.has_action_area, event.action_area.as_deref()) {
            (true, Some(area)) => zone_from_action_area(area),
            _ => Zone::Unknown,
        };
        ShotLocation {
            hx: None,
            hy: None,
            zone,
        }
    }
}

// =============================================================================
// UNIT TESTS
// =============================================================================
