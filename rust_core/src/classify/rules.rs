//! Pattern rules, one per category bucket.
//!
//! A rule has a cheap gate (does this event belong to my bucket?) and an
//! extractor that runs its patterns in order. `extract` returning `None`
//! means the event is owned but unparsed.

use regex::Regex;
use std::sync::OnceLock;

use super::{Bucket, Candidate, Extraction, Role};
use crate::models::Action;
use crate::types::RawEvent;

pub trait PatternRule: Send + Sync {
    fn bucket(&self) -> Bucket;

    fn gate(&self, event: &RawEvent) -> bool;

    fn extract(&self, event: &RawEvent) -> Option<Extraction>;
}

// =============================================================================
// Patterns
// =============================================================================

fn compiled(slot: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    slot.get_or_init(|| Regex::new(pattern).expect("static pattern compiles"))
}

macro_rules! pattern {
    ($name:ident, $re:expr) => {
        fn $name() -> &'static Regex {
            static SLOT: OnceLock<Regex> = OnceLock::new();
            compiled(&SLOT, $re)
        }
    };
}

pattern!(shot_re, r"(?i)^(.+?)\s+(makes|misses)\s+(two point|three point)\b");
pattern!(free_throw_re, r"(?i)^(.+?)\s+(makes|misses)\s+.*free throw\b");
pattern!(free_throw_loose_re, r"(?i)^(.+?)\s+(makes|misses)\b");
pattern!(assist_re, r"(?i)\(([^()]+?)\s+assists\)");
pattern!(rebound_re, r"(?i)^(.+?)\s+(offensive|defensive)\s+rebound\b");
pattern!(turnover_lead_re, r"(?i)^(.+?)\s+turnover\b");
pattern!(turnover_by_re, r"(?i)turnover\s+by\s+(.+?)(?:\(|$)");
pattern!(steal_paren_re, r"(?i)\(([^()]+?)\s+steals\)");
pattern!(steal_by_re, r"(?i)steal\s+by\s+([^()]+?)(?:\)|\(|$)");
pattern!(block_paren_re, r"(?i)\(([^()]+?)\s+blocks\)");
pattern!(blocked_by_re, r"(?i)blocked\s+by\s+([^()]+?)(?:\)|\(|$)");
pattern!(
    foul_lead_re,
    r"(?i)^(.+?)\s+(?:shooting|personal|offensive|technical|flagrant|loose ball|clear path)\s+foul\b"
);
pattern!(foul_by_re, r"(?i)foul\s+(?:by|on)\s+([^(,]+?)(?:\(|,|$)");
pattern!(foul_word_re, r"(?i)\bfoul\b");
pattern!(parens_re, r"\(([^()]*)\)");
pattern!(draws_re, r"(?i)^(.+?)\s+draws?\s+the\s+foul\b");
pattern!(drawn_by_re, r"(?i)drawn\s+by\s+([^()]+?)(?:\)|\(|$)");

/// Trimmed first capture group, if non-empty.
fn capture_name(re: &Regex, text: &str) -> Option<String> {
    let name = re.captures(text)?.get(1)?.as_str().trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// First name captured by an ordered list of patterns.
fn first_name(patterns: &[&Regex], text: &str) -> Option<String> {
    patterns.iter().find_map(|re| capture_name(re, text))
}

fn type_mentions(event: &RawEvent, needles: &[&str]) -> bool {
    let et = event.event_type.to_lowercase();
    needles.iter().any(|n| et.contains(n))
}

fn text_mentions(event: &RawEvent, needles: &[&str]) -> bool {
    let desc = event.description.to_lowercase();
    needles.iter().any(|n| desc.contains(n))
}

fn stealer(text: &str) -> Option<String> {
    first_name(&[steal_paren_re(), steal_by_re()], text)
}

fn blocker(text: &str) -> Option<String> {
    first_name(&[block_paren_re(), blocked_by_re()], text)
}

// =============================================================================
// Rules
// =============================================================================

/// Two- and three-point field goals, with assist or block credit.
pub struct ShotRule;

impl PatternRule for ShotRule {
    fn bucket(&self) -> Bucket {
        Bucket::Shot
    }

    fn gate(&self, event: &RawEvent) -> bool {
        type_mentions(event, &["twopoint", "threepoint", "fieldgoal"])
            || text_mentions(event, &["two point", "three point"])
    }

    fn extract(&self, event: &RawEvent) -> Option<Extraction> {
        let desc = &event.description;
        let caps = shot_re().captures(desc)?;
        let shooter = caps.get(1)?.as_str().trim();
        if shooter.is_empty() {
            return None;
        }
        let made = caps[2].eq_ignore_ascii_case("makes");
        let action = if caps[3].to_lowercase().starts_with("three") {
            Action::ThreePa { made }
        } else {
            Action::TwoPa { made }
        };

        let mut candidates = vec![Candidate::new(Role::Shooter, shooter, action)];
        if made {
            if let Some(passer) = capture_name(assist_re(), desc) {
                candidates.push(Candidate::new(Role::Assister, passer, Action::Assist));
            }
        } else if let Some(name) = blocker(desc) {
            candidates.push(Candidate::new(Role::Blocker, name, Action::Block));
        }
        Some(Extraction::of(candidates))
    }
}

/// Free throws. The loose fallback still needs "free throw" in the text.
pub struct FreeThrowRule;

impl PatternRule for FreeThrowRule {
    fn bucket(&self) -> Bucket {
        Bucket::FreeThrow
    }

    fn gate(&self, event: &RawEvent) -> bool {
        type_mentions(event, &["freethrow", "free_throw"]) || text_mentions(event, &["free throw"])
    }

    fn extract(&self, event: &RawEvent) -> Option<Extraction> {
        let desc = &event.description;
        let caps = free_throw_re().captures(desc).or_else(|| {
            if text_mentions(event, &["free throw"]) {
                free_throw_loose_re().captures(desc)
            } else {
                None
            }
        })?;
        let shooter = caps.get(1)?.as_str().trim();
        if shooter.is_empty() {
            return None;
        }
        let made = caps[2].eq_ignore_ascii_case("makes");
        Some(Extraction::of(vec![Candidate::new(
            Role::Shooter,
            shooter,
            Action::Fta { made },
        )]))
    }
}

pub struct ReboundRule;

impl PatternRule for ReboundRule {
    fn bucket(&self) -> Bucket {
        Bucket::Rebound
    }

    fn gate(&self, event: &RawEvent) -> bool {
        type_mentions(event, &["rebound"]) || text_mentions(event, &["rebound"])
    }

    fn extract(&self, event: &RawEvent) -> Option<Extraction> {
        let caps = rebound_re().captures(&event.description)?;
        let name = caps.get(1)?.as_str().trim();
        if name.is_empty() {
            return None;
        }
        let action = if caps[2].eq_ignore_ascii_case("offensive") {
            Action::Orb
        } else {
            Action::Drb
        };
        Some(Extraction::of(vec![Candidate::new(Role::Rebounder, name, action)]))
    }
}

/// Subject words that mark a team or clock violation rather than a player.
const TEAM_TURNOVER_WORDS: &[&str] = &[
    "team", "shot", "clock", "second", "seconds", "backcourt", "delay", "violation", "inbound",
];

/// A turnover subject names a player: two or more tokens, none of them a
/// team-violation word or a bare number ("5 second", "8-second").
fn is_player_subject(name: &str) -> bool {
    let tokens: Vec<String> = name
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect();
    tokens.len() > 1
        && !tokens.iter().any(|t| {
            TEAM_TURNOVER_WORDS.contains(&t.as_str()) || t.chars().all(|c| c.is_ascii_digit())
        })
}

/// Turnovers, with steal credit.
///
/// Never unparsed: a turnover without a player name (a one-word team
/// nickname, or a clock violation such as "Shot clock turnover") is a team
/// turnover and carries no player.
pub struct TurnoverRule;

impl PatternRule for TurnoverRule {
    fn bucket(&self) -> Bucket {
        Bucket::Turnover
    }

    fn gate(&self, event: &RawEvent) -> bool {
        type_mentions(event, &["turnover"]) || text_mentions(event, &["turnover"])
    }

    fn extract(&self, event: &RawEvent) -> Option<Extraction> {
        let desc = &event.description;
        let mut candidates = Vec::new();

        let subject = first_name(&[turnover_lead_re(), turnover_by_re()], desc)
            .filter(|name| is_player_subject(name));
        if let Some(name) = subject {
            let subtype = event
                .turnover_type
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string);
            candidates.push(Candidate::new(
                Role::TurnoverPlayer,
                name,
                Action::Turnover { subtype },
            ));
        }
        if let Some(name) = stealer(desc) {
            candidates.push(Candidate::new(Role::Stealer, name, Action::Steal));
        }
        Some(Extraction::of(candidates))
    }
}

/// Fouls: independent fouler and drawer.
pub struct FoulRule;

impl FoulRule {
    /// Drawer names from every parenthesized "draws the foul" clause.
    fn draw_clauses(desc: &str) -> Vec<String> {
        parens_re()
            .captures_iter(desc)
            .filter_map(|caps| caps.get(1))
            .map(|chunk| chunk.as_str().trim())
            .filter(|chunk| {
                let lower = chunk.to_lowercase();
                lower.contains("draw") && lower.contains("foul")
            })
            .filter_map(|chunk| capture_name(draws_re(), chunk))
            .collect()
    }
}

impl PatternRule for FoulRule {
    fn bucket(&self) -> Bucket {
        Bucket::Foul
    }

    fn gate(&self, event: &RawEvent) -> bool {
        type_mentions(event, &["foul", "flagrant"]) || foul_word_re().is_match(&event.description)
    }

    fn extract(&self, event: &RawEvent) -> Option<Extraction> {
        let desc = &event.description;
        let fouler = first_name(&[foul_lead_re(), foul_by_re()], desc);

        let mut drawers = Self::draw_clauses(desc);
        if drawers.is_empty() {
            drawers.extend(capture_name(drawn_by_re(), desc));
        }
        let multiple_draw_clauses = drawers.len() > 1;
        let drawer = drawers.pop();

        if fouler.is_none() && drawer.is_none() {
            return None;
        }

        let mut candidates = Vec::new();
        if let Some(name) = fouler {
            candidates.push(Candidate::new(Role::Fouler, name, Action::FoulCommitted));
        }
        if let Some(name) = drawer {
            candidates.push(Candidate::new(Role::Drawer, name, Action::FoulDrawn));
        }
        Some(Extraction {
            candidates,
            multiple_draw_clauses,
        })
    }
}

/// Standalone steal events.
pub struct StealRule;

impl PatternRule for StealRule {
    fn bucket(&self) -> Bucket {
        Bucket::Steal
    }

    fn gate(&self, event: &RawEvent) -> bool {
        type_mentions(event, &["steal"])
    }

    fn extract(&self, event: &RawEvent) -> Option<Extraction> {
        let name = stealer(&event.description)?;
        Some(Extraction::of(vec![Candidate::new(Role::Stealer, name, Action::Steal)]))
    }
}

/// Standalone block events.
pub struct BlockRule;

impl PatternRule for BlockRule {
    fn bucket(&self) -> Bucket {
        Bucket::Block
    }

    fn gate(&self, event: &RawEvent) -> bool {
        type_mentions(event, &["block"])
    }

    fn extract(&self, event: &RawEvent) -> Option<Extraction> {
        let name = blocker(&event.description)?;
        Some(Extraction::of(vec![Candidate::new(Role::Blocker, name, Action::Block)]))
    }
}
