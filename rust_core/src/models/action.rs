//! Action vocabulary
//!
//! The closed set of statistical facts a play-by-play event can yield.
//! Each variant carries only the payload that makes sense for it, so
//! derived attributes (result, point value) are computed rather than
//! stored as free-form fields.

use serde::{Deserialize, Serialize};

/// A single attributed statistical fact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Two-point field-goal attempt
    TwoPa { made: bool },
    /// Three-point field-goal attempt
    ThreePa { made: bool },
    /// Free-throw attempt
    Fta { made: bool },
    Assist,
    /// Offensive rebound
    Orb,
    /// Defensive rebound
    Drb,
    Turnover {
        /// Feed-supplied subtype (`bad pass`, `lost ball`, ...), if any.
        subtype: Option<String>,
    },
    FoulCommitted,
    FoulDrawn,
    Steal,
    Block,
}

/// Outcome label carried on every attributed action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionResult {
    Made,
    Missed,
    Credited,
    Secured,
    Committed,
    Called,
    Drawn,
}

impl Action {
    pub fn result(&self) -> ActionResult {
        match self {
            Action::TwoPa { made } | Action::ThreePa { made } | Action::Fta { made } => {
                if *made {
                    ActionResult::Made
                } else {
                    ActionResult::Missed
                }
            }
            Action::Assist | Action::Steal | Action::Block => ActionResult::Credited,
            Action::Orb | Action::Drb => ActionResult::Secured,
            Action::Turnover { .. } => ActionResult::Committed,
            Action::FoulCommitted => ActionResult::Called,
            Action::FoulDrawn => ActionResult::Drawn,
        }
    }

    /// Points at stake for scoring attempts; `None` for everything else.
    pub fn points_value(&self) -> Option<u8> {
        match self {
            Action::TwoPa { .. } => Some(2),
            Action::ThreePa { .. } => Some(3),
            Action::Fta { .. } => Some(1),
            _ => None,
        }
    }

    pub fn is_made(&self) -> bool {
        matches!(
            self,
            Action::TwoPa { made: true } | Action::ThreePa { made: true } | Action::Fta { made: true }
        )
    }

    /// Two- or three-point attempt.
    pub fn is_field_goal_attempt(&self) -> bool {
        matches!(self, Action::TwoPa { .. } | Action::ThreePa { .. })
    }
}

impl ActionResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionResult::Made => "made",
            ActionResult::Missed => "missed",
            ActionResult::Credited => "credited",
            ActionResult::Secured => "secured",
            ActionResult::Committed => "committed",
            ActionResult::Called => "called",
            ActionResult::Drawn => "drawn",
        }
    }
}
