//! Event Classification
//!
//! Turns one play-by-play description into candidate actions. Each
//! candidate still carries a *raw* name; identity resolution happens later,
//! one candidate at a time.
//!
//! Categories are mutually exclusive. The classifier walks an ordered list
//! of [`PatternRule`]s and the first rule whose gate accepts the event owns
//! it, whether or not its patterns then match.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::Action;
use crate::types::RawEvent;

pub mod rules;

pub use rules::{
    BlockRule, FoulRule, FreeThrowRule, PatternRule, ReboundRule, ShotRule, StealRule,
    TurnoverRule,
};

/// Category bucket that owns an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Shot,
    FreeThrow,
    Rebound,
    Turnover,
    Foul,
    Steal,
    Block,
}

impl Bucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Shot => "shot",
            Bucket::FreeThrow => "free_throw",
            Bucket::Rebound => "rebound",
            Bucket::Turnover => "turnover",
            Bucket::Foul => "foul",
            Bucket::Steal => "steal",
            Bucket::Block => "block",
        }
    }
}

/// Part a named player plays in an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Shooter,
    Assister,
    Rebounder,
    TurnoverPlayer,
    Fouler,
    Drawer,
    Stealer,
    Blocker,
}

impl Role {
    /// Whether the event's acting team narrows down this player.
    ///
    /// Fouls, steals and blocks can come from either side, so their
    /// players are resolved without a team hint.
    pub fn uses_team_hint(&self) -> bool {
        matches!(
            self,
            Role::Shooter | Role::Assister | Role::Rebounder | Role::TurnoverPlayer
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Shooter => "shooter",
            Role::Assister => "assister",
            Role::Rebounder => "rebounder",
            Role::TurnoverPlayer => "turnover_player",
            Role::Fouler => "fouler",
            Role::Drawer => "drawer",
            Role::Stealer => "stealer",
            Role::Blocker => "blocker",
        }
    }
}

/// One not-yet-resolved action extracted from a description.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub role: Role,
    pub raw_name: String,
    pub action: Action,
}

impl Candidate {
    pub fn new(role: Role, raw_name: impl Into<String>, action: Action) -> Self {
        Self {
            role,
            raw_name: raw_name.into(),
            action,
        }
    }
}

/// What a rule extracted from an event it owns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub candidates: Vec<Candidate>,
    /// More than one "draws the foul" clause was present.
    pub multiple_draw_clauses: bool,
}

impl Extraction {
    pub fn of(candidates: Vec<Candidate>) -> Self {
        Self {
            candidates,
            multiple_draw_clauses: false,
        }
    }
}

/// Classifier verdict for one event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    /// Owning bucket; `None` when no gate accepted the event.
    pub bucket: Option<Bucket>,
    pub candidates: Vec<Candidate>,
    /// Owned by a bucket but no pattern matched.
    pub unparsed: bool,
    pub multiple_draw_clauses: bool,
}

/// Ordered, first-gate-wins list of pattern rules.
pub struct EventClassifier {
    rules: Vec<Box<dyn PatternRule>>,
}

impl Default for EventClassifier {
    fn default() -> Self {
        Self::new(vec![
            Box::new(ShotRule),
            Box::new(FreeThrowRule),
            Box::new(ReboundRule),
            Box::new(TurnoverRule),
            Box::new(FoulRule),
            Box::new(StealRule),
            Box::new(BlockRule),
        ])
    }
}

impl EventClassifier {
    pub fn new(rules: Vec<Box<dyn PatternRule>>) -> Self {
        Self { rules }
    }

    /// Buckets in evaluation order.
    pub fn buckets(&self) -> Vec<Bucket> {
        self.rules.iter().map(|r| r.bucket()).collect()
    }

    pub fn classify(&self, event: &RawEvent) -> Classification {
        let Some(rule) = self.rules.iter().find(|r| r.gate(event)) else {
            return Classification::default();
        };

        match rule.extract(event) {
            Some(extraction) => {
                if extraction.multiple_draw_clauses {
                    warn!(
                        "Multiple draw clauses in game {} event {}; using the last: {}",
                        event.game_id, event.event_id, event.description
                    );
                }
                Classification {
                    bucket: Some(rule.bucket()),
                    candidates: extraction.candidates,
                    unparsed: false,
                    multiple_draw_clauses: extraction.multiple_draw_clauses,
                }
            }
            None => Classification {
                bucket: Some(rule.bucket()),
                candidates: Vec::new(),
                unparsed: true,
                multiple_draw_clauses: false,
            },
        }
    }
}

// =============================================================================
// UNIT TESTS
// =============================================================================
