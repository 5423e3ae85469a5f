//! Per-game attribution pipeline
//!
//! Wires classification, identity resolution, context enrichment and stint
//! segmentation together. Games are independent; the batch entry point
//! fans them out with rayon and merges results in ascending game-id order.

use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::classify::{Bucket, Candidate, EventClassifier, Role};
use crate::config::PipelineConfig;
use crate::context::{ContextEnricher, EventContext};
use crate::matching::{AliasTable, NameResolver, ResolveError, RosterIndex};
use crate::models::AttributedAction;
use crate::stints::segment_stints;
use crate::table::Capabilities;
use crate::types::{GameContext, Issue, IssueKind, LineupSnapshot, RawEvent, Stint};

/// Everything produced for one game or a whole batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineOutput {
    pub actions: Vec<AttributedAction>,
    pub issues: Vec<Issue>,
    pub stints: Vec<Stint>,
}

impl PipelineOutput {
    fn extend(&mut self, other: PipelineOutput) {
        self.actions.extend(other.actions);
        self.issues.extend(other.issues);
        self.stints.extend(other.stints);
    }

    pub fn issue_count(&self, kind: IssueKind) -> usize {
        self.issues.iter().filter(|i| i.problem == kind).count()
    }
}

pub struct Pipeline<'a> {
    resolver: NameResolver<'a>,
    classifier: EventClassifier,
    enricher: ContextEnricher,
    games: &'a FxHashMap<String, GameContext>,
    capabilities: Capabilities,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        roster: &'a RosterIndex,
        aliases: &'a AliasTable,
        games: &'a FxHashMap<String, GameContext>,
        config: &PipelineConfig,
        capabilities: Capabilities,
    ) -> Self {
        Self {
            resolver: NameResolver::new(roster, aliases),
            classifier: EventClassifier::default(),
            enricher: ContextEnricher::new(config, capabilities),
            games,
            capabilities,
        }
    }

    /// Process one game. Events and snapshots of other games are ignored.
    pub fn process_game(
        &self,
        game_id: &str,
        events: &[RawEvent],
        snapshots: &[LineupSnapshot],
    ) -> PipelineOutput {
        let events: Vec<&RawEvent> = events.iter().filter(|e| e.game_id == game_id).collect();
        let snapshots: Vec<&LineupSnapshot> =
            snapshots.iter().filter(|s| s.game_id == game_id).collect();
        self.run_game(game_id, events, snapshots)
    }

    /// Process every game in the batch in parallel.
    pub fn process_batch(&self, events: &[RawEvent], snapshots: &[LineupSnapshot]) -> PipelineOutput {
        let mut games: BTreeMap<&str, (Vec<&RawEvent>, Vec<&LineupSnapshot>)> = BTreeMap::new();
        for event in events {
            games.entry(event.game_id.as_str()).or_default().0.push(event);
        }
        for snap in snapshots {
            if let Some(entry) = games.get_mut(snap.game_id.as_str()) {
                entry.1.push(snap);
            }
        }

        let games: Vec<(&str, (Vec<&RawEvent>, Vec<&LineupSnapshot>))> = games.into_iter().collect();
        let per_game: Vec<PipelineOutput> = games
            .into_par_iter()
            .map(|(game_id, (events, snapshots))| self.run_game(game_id, events, snapshots))
            .collect();

        let game_count = per_game.len();
        let mut output = PipelineOutput::default();
        for game in per_game {
            output.extend(game);
        }

        info!(
            "Processed {} games: {} actions, {} issues ({} not found, {} ambiguous, {} unparsed), {} stints",
            game_count,
            output.actions.len(),
            output.issues.len(),
            output.issue_count(IssueKind::NotFound),
            output.issue_count(IssueKind::Ambiguous),
            output.issue_count(IssueKind::Unparsed),
            output.stints.len()
        );
        output
    }

    fn run_game(
        &self,
        game_id: &str,
        mut events: Vec<&RawEvent>,
        snapshots: Vec<&LineupSnapshot>,
    ) -> PipelineOutput {
        events.sort_by_key(|e| e.order_key());
        let game = self.games.get(game_id);

        let mut output = PipelineOutput::default();
        for &event in &events {
            self.attribute_event(event, game, &mut output);
        }

        if self.capabilities.has_lineups {
            let game = game.filter(|_| self.capabilities.has_game_context);
            output.stints = segment_stints(game_id, events.iter().copied(), snapshots, game);
        }

        debug!(
            "Game {}: {} events, {} actions, {} issues, {} stints",
            game_id,
            events.len(),
            output.actions.len(),
            output.issues.len(),
            output.stints.len()
        );
        output
    }

    /// Acting team: attribution team, falling back to possession team.
    fn team_hint<'e>(&self, event: &'e RawEvent) -> Option<&'e str> {
        let attribution = event
            .attribution_team_id
            .as_deref()
            .filter(|_| self.capabilities.has_attribution);
        let possession = event
            .possession_team_id
            .as_deref()
            .filter(|_| self.capabilities.has_possession);
        attribution.or(possession).filter(|t| !t.is_empty())
    }

    fn attribute_event(&self, event: &RawEvent, game: Option<&GameContext>, output: &mut PipelineOutput) {
        let classification = self.classifier.classify(event);
        let Some(bucket) = classification.bucket else {
            return;
        };

        if classification.unparsed {
            output.issues.push(issue(event, bucket, None, &event.description, None, IssueKind::Unparsed, None));
            return;
        }
        if classification.multiple_draw_clauses {
            output.issues.push(issue(
                event,
                bucket,
                None,
                &event.description,
                None,
                IssueKind::MultipleDrawClauses,
                None,
            ));
        }

        let context = self.enricher.event_context(event);
        let hint = self.team_hint(event);
        for candidate in classification.candidates {
            let preferred = hint.filter(|_| candidate.role.uses_team_hint());
            match self.resolver.resolve(&candidate.raw_name, preferred) {
                Ok(resolved) => {
                    let team_id = resolved.team_id.or_else(|| preferred.map(str::to_string));
                    output
                        .actions
                        .push(self.build_action(event, game, &context, resolved.player_id, team_id, candidate));
                }
                Err(err) => {
                    let (kind, candidates) = match &err {
                        ResolveError::NotFound { .. } => (IssueKind::NotFound, None),
                        ResolveError::Ambiguous { candidates, .. } => (IssueKind::Ambiguous, Some(*candidates)),
                    };
                    output.issues.push(issue(
                        event,
                        bucket,
                        Some(candidate.role),
                        &candidate.raw_name,
                        Some(err.name_key().to_string()),
                        kind,
                        candidates,
                    ));
                }
            }
        }
    }

    fn build_action(
        &self,
        event: &RawEvent,
        game: Option<&GameContext>,
        context: &EventContext,
        player_id: String,
        team_id: Option<String>,
        candidate: Candidate,
    ) -> AttributedAction {
        let team = self
            .enricher
            .team_context(context.margin_home, team_id.as_deref(), game);
        let location = candidate
            .action
            .is_field_goal_attempt()
            .then(|| self.enricher.shot_location(event));

        AttributedAction {
            player_id,
            team_id,
            game_id: event.game_id.clone(),
            event_id: event.event_id.clone(),
            period_number: event.period_number,
            clock_seconds: context.clock_seconds,
            result: candidate.action.result(),
            points_value: candidate.action.points_value(),
            action: candidate.action,
            margin_home: context.margin_home,
            margin_for_team: team.margin_for_team,
            state: team.state,
            clutch: context.clutch,
            margin_bucket: team.margin_bucket,
            transition: context.transition,
            hx: location.and_then(|l| l.hx),
            hy: location.and_then(|l| l.hy),
            zone: location.map(|l| l.zone),
        }
    }
}

fn issue(
    event: &RawEvent,
    bucket: Bucket,
    role: Option<Role>,
    raw_text: &str,
    normalized_name: Option<String>,
    problem: IssueKind,
    candidates: Option<usize>,
) -> Issue {
    Issue {
        bucket,
        role,
        raw_text: raw_text.to_string(),
        normalized_name,
        game_id: event.game_id.clone(),
        event_id: event.event_id.clone(),
        problem,
        candidates,
        description: event.description.clone(),
    }
}

// =============================================================================
// UNIT TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Role;
    use crate::models::{Action, MarginBucket, ScoreState, Zone};
    use crate::types::Side;

    fn roster() -> RosterIndex {
        RosterIndex::new(vec![
            ("p-ionescu", "Sabrina Ionescu", "NYL"),
            ("p-stewart", "Breanna Stewart", "NYL"),
            ("p-wilson", "A'ja Wilson", "LVA"),
            ("p-plum", "Kelsey Plum", "LVA"),
            // homonyms on opposite teams
            ("p-jones-nyl", "Jonquel Jones", "NYL"),
            ("p-jones-lva", "Jonquel Jones", "LVA"),
        ])
    }

    fn aliases() -> AliasTable {
        AliasTable::from_pairs(vec![
            ("s ionescu", "sabrina ionescu"),
            ("b stewart", "breanna stewart"),
            ("a wilson", "a'ja wilson"),
            ("k plum", "kelsey plum"),
            ("j jones", "jonquel jones"),
        ])
    }

    fn games() -> FxHashMap<String, GameContext> {
        let mut games = FxHashMap::default();
        games.insert(
            "g1".to_string(),
            GameContext {
                game_id: "g1".to_string(),
                home_team_id: "NYL".to_string(),
                away_team_id: "LVA".to_string(),
            },
        );
        games
    }

    fn event(id: u32, event_type: &str, description: &str, team: Option<&str>) -> RawEvent {
        RawEvent {
            game_id: "g1".to_string(),
            event_id: format!("e{}", id),
            period_number: Some(4),
            event_number: Some(id),
            clock: Some("1:45".to_string()),
            event_type: event_type.to_string(),
            description: description.to_string(),
            home_points: Some(70),
            away_points: Some(77),
            attribution_team_id: team.map(str::to_string),
            ..Default::default()
        }
    }

    fn run(events: &[RawEvent]) -> PipelineOutput {
        let roster = roster();
        let aliases = aliases();
        let games = games();
        let pipeline = Pipeline::new(&roster, &aliases, &games, &PipelineConfig::default(), Capabilities::all());
        pipeline.process_game("g1", events, &[])
    }

    #[test]
    fn test_made_shot_with_assist_attributes_both() {
        let out = run(&[event(
            1,
            "twopointmade",
            "S Ionescu makes two point layup (B Stewart assists)",
            Some("NYL"),
        )]);
        assert!(out.issues.is_empty());
        assert_eq!(out.actions.len(), 2);

        let shot = &out.actions[0];
        assert_eq!(shot.player_id, "p-ionescu");
        assert_eq!(shot.team_id.as_deref(), Some("NYL"));
        assert_eq!(shot.action, Action::TwoPa { made: true });
        assert_eq!(shot.points_value, Some(2));
        assert_eq!(shot.clock_seconds, Some(105));
        assert!(shot.clutch);
        // home trails 70-77
        assert_eq!(shot.margin_home, Some(-7));
        assert_eq!(shot.margin_for_team, Some(-7));
        assert_eq!(shot.state, Some(ScoreState::Trailing));
        assert_eq!(shot.margin_bucket, MarginBucket::Trail4To9);
        assert_eq!(shot.zone, Some(Zone::Unknown));

        let assist = &out.actions[1];
        assert_eq!(assist.player_id, "p-stewart");
        assert_eq!(assist.action, Action::Assist);
        assert_eq!(assist.zone, None);
    }

    #[test]
    fn test_away_team_margin_is_flipped() {
        let out = run(&[event(1, "threepointmiss", "K Plum misses three point jump shot", Some("LVA"))]);
        assert_eq!(out.actions[0].margin_for_team, Some(7));
        assert_eq!(out.actions[0].margin_bucket, MarginBucket::Lead4To9);
    }

    #[test]
    fn test_foul_attributes_fouler_and_drawer() {
        let out = run(&[event(
            1,
            "shootingfoul",
            "B Stewart shooting foul (A Wilson draws the foul)",
            Some("NYL"),
        )]);
        let kinds: Vec<(&str, Action)> = out
            .actions
            .iter()
            .map(|a| (a.player_id.as_str(), a.action.clone()))
            .collect();
        assert_eq!(
            kinds,
            vec![("p-stewart", Action::FoulCommitted), ("p-wilson", Action::FoulDrawn)]
        );
        // drawer team comes from the roster, not the hint
        assert_eq!(out.actions[1].team_id.as_deref(), Some("LVA"));
    }

    #[test]
    fn test_homonym_resolved_by_hint() {
        let out = run(&[event(1, "offensiverebound", "J Jones offensive rebound", Some("LVA"))]);
        assert!(out.issues.is_empty());
        assert_eq!(out.actions[0].player_id, "p-jones-lva");
        assert_eq!(out.actions[0].action, Action::Orb);
    }

    #[test]
    fn test_homonym_without_hint_is_ambiguous() {
        let out = run(&[event(1, "offensiverebound", "J Jones offensive rebound", None)]);
        assert!(out.actions.is_empty());
        assert_eq!(out.issues.len(), 1);
        let issue = &out.issues[0];
        assert_eq!(issue.problem, IssueKind::Ambiguous);
        assert_eq!(issue.role, Some(Role::Rebounder));
        assert_eq!(issue.candidates, Some(2));
        assert_eq!(issue.normalized_name.as_deref(), Some("jonquel jones"));
    }

    #[test]
    fn test_hint_is_not_used_for_blockers() {
        // the hint names the shooting team; the blocker plays for the other side
        let out = run(&[event(
            1,
            "twopointmiss",
            "K Plum misses two point layup (J Jones blocks)",
            Some("LVA"),
        )]);
        assert_eq!(out.actions.len(), 1);
        assert_eq!(out.issues.len(), 1);
        assert_eq!(out.issues[0].problem, IssueKind::Ambiguous);
        assert_eq!(out.issues[0].role, Some(Role::Blocker));
    }

    #[test]
    fn test_unknown_name_and_unparsed_become_issues() {
        let out = run(&[
            event(1, "twopointmade", "Z Nobody makes two point shot", Some("NYL")),
            event(2, "twopointmade", "Two point shot by somebody", Some("NYL")),
            event(3, "timeout", "Liberty timeout", None),
        ]);
        assert!(out.actions.is_empty());
        assert_eq!(out.issues.len(), 2);
        assert_eq!(out.issues[0].problem, IssueKind::NotFound);
        assert_eq!(out.issues[0].raw_text, "Z Nobody");
        assert_eq!(out.issues[0].bucket, Bucket::Shot);
        assert_eq!(out.issues[1].problem, IssueKind::Unparsed);
        assert_eq!(out.issues[1].raw_text, "Two point shot by somebody");
        assert_eq!(out.issues[1].role, None);
    }

    #[test]
    fn test_team_turnover_keeps_steal() {
        let out = run(&[event(1, "turnover", "Liberty turnover (A Wilson steals)", Some("NYL"))]);
        assert!(out.issues.is_empty());
        assert_eq!(out.actions.len(), 1);
        assert_eq!(out.actions[0].action, Action::Steal);
        assert_eq!(out.actions[0].team_id.as_deref(), Some("LVA"));
    }

    #[test]
    fn test_multiple_draw_clauses_flagged() {
        let out = run(&[event(
            1,
            "personalfoul",
            "B Stewart personal foul (K Plum draws the foul) (A Wilson draws the foul)",
            Some("NYL"),
        )]);
        assert_eq!(out.issue_count(IssueKind::MultipleDrawClauses), 1);
        assert_eq!(out.actions[1].player_id, "p-wilson");
    }

    #[test]
    fn test_events_processed_in_order_key_order() {
        let mut late = event(2, "defensiverebound", "A Wilson defensive rebound", Some("LVA"));
        late.period_number = Some(2);
        let mut early = event(9, "defensiverebound", "K Plum defensive rebound", Some("LVA"));
        early.period_number = Some(1);
        let out = run(&[late, early]);
        let ids: Vec<&str> = out.actions.iter().map(|a| a.player_id.as_str()).collect();
        assert_eq!(ids, vec!["p-plum", "p-wilson"]);
    }

    #[test]
    fn test_shot_location_from_coordinates() {
        let mut shot = event(1, "twopointmade", "A Wilson makes two point layup", Some("LVA"));
        shot.location_x = Some(564.0 + 20.0);
        shot.location_y = Some(30.0);
        let out = run(&[shot]);
        let action = &out.actions[0];
        assert_eq!(action.hx, Some(20.0));
        assert_eq!(action.hy, Some(30.0));
        assert_eq!(action.zone, Some(Zone::Rim));
    }

    #[test]
    fn test_missing_capabilities_disable_hint_and_coordinates() {
        let roster = roster();
        let aliases = aliases();
        let games = games();
        let pipeline = Pipeline::new(
            &roster,
            &aliases,
            &games,
            &PipelineConfig::default(),
            Capabilities::default(),
        );
        let mut shot = event(1, "twopointmade", "J Jones makes two point layup", Some("LVA"));
        shot.location_x = Some(600.0);
        shot.location_y = Some(30.0);
        let out = pipeline.process_game("g1", &[shot], &[]);
        assert!(out.actions.is_empty());
        assert_eq!(out.issues[0].problem, IssueKind::Ambiguous);

        let plain = event(2, "twopointmade", "A Wilson makes two point layup", Some("LVA"));
        let out = pipeline.process_game("g1", &[plain], &[]);
        assert_eq!(out.actions[0].hx, None);
        assert_eq!(out.actions[0].zone, Some(Zone::Unknown));
        // no game context: no team perspective
        assert_eq!(out.actions[0].margin_for_team, None);
        assert_eq!(out.actions[0].margin_bucket, MarginBucket::Unknown);
    }

    #[test]
    fn test_batch_merges_games_in_id_order() {
        let roster = roster();
        let aliases = aliases();
        let games = games();
        let pipeline = Pipeline::new(&roster, &aliases, &games, &PipelineConfig::default(), Capabilities::all());

        let mut g2 = event(1, "defensiverebound", "K Plum defensive rebound", Some("LVA"));
        g2.game_id = "g2".to_string();
        let g1 = event(1, "defensiverebound", "A Wilson defensive rebound", Some("LVA"));
        let snap = LineupSnapshot {
            game_id: "g1".to_string(),
            event_id: "e1".to_string(),
            side: Side::Away,
            team_id: None,
            players: ["p-wilson", "p-plum"].iter().map(|p| p.to_string()).collect(),
        };

        let out = pipeline.process_batch(&[g2, g1], &[snap]);
        let games: Vec<&str> = out.actions.iter().map(|a| a.game_id.as_str()).collect();
        assert_eq!(games, vec!["g1", "g2"]);
        assert_eq!(out.stints.len(), 1);
        assert_eq!(out.stints[0].team_id.as_deref(), Some("LVA"));
        assert!(!out.stints[0].complete);
    }
}
