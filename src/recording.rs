//! Match recording workflow
//!
//! Validates a submission, computes the Elo outcome from current ratings and
//! commits the match, the four updated players and their history rows as a
//! single unit. A commit that loses a race with another submission touching
//! the same players is recomputed from fresh ratings a bounded number of
//! times before the conflict is reported.

use crate::error::{LadderError, Result};
use crate::metrics::LadderMetrics;
use crate::rating::{apply_delta, round_rating, EloCalculator, MatchOutcome};
use crate::storage::{LadderStore, MatchCommit, PlayerUpdate};
use crate::types::{Match, Player, RatingChangeRecord, Team, TeamEntry};
use crate::utils::current_timestamp;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Default number of commit attempts per submission
pub const DEFAULT_MAX_COMMIT_ATTEMPTS: u32 = 3;

/// One team as entered by the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSubmission {
    pub players: [String; 2],
    /// Free-text score; `None` when no score was recorded
    pub score: Option<String>,
}

impl TeamSubmission {
    pub fn new(player1: impl Into<String>, player2: impl Into<String>) -> Self {
        Self {
            players: [player1.into(), player2.into()],
            score: None,
        }
    }

    pub fn with_score(mut self, score: impl Into<String>) -> Self {
        self.score = Some(score.into());
        self
    }
}

/// A match result as entered by the user, before validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSubmission {
    pub team1: TeamSubmission,
    pub team2: TeamSubmission,
    /// 1 or 2
    pub winning_team: u8,
    pub match_date: NaiveDate,
}

impl MatchSubmission {
    pub fn team(&self, team: Team) -> &TeamSubmission {
        match team {
            Team::Team1 => &self.team1,
            Team::Team2 => &self.team2,
        }
    }

    /// The four names in slot order: team 1 then team 2
    pub fn names(&self) -> [&str; 4] {
        [
            self.team1.players[0].as_str(),
            self.team1.players[1].as_str(),
            self.team2.players[0].as_str(),
            self.team2.players[1].as_str(),
        ]
    }
}

/// Everything produced by a successful recording
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedMatch {
    pub record: Match,
    pub outcome: MatchOutcome,
    /// Updated players in slot order
    pub players: Vec<Player>,
    /// History rows in slot order
    pub history: Vec<RatingChangeRecord>,
}

impl RecordedMatch {
    pub fn match_score(&self) -> String {
        self.record.match_score()
    }
}

/// Orchestrates one match submission end to end
#[derive(Clone)]
pub struct MatchRecorder {
    store: Arc<dyn LadderStore>,
    calculator: EloCalculator,
    max_commit_attempts: u32,
    metrics: Option<Arc<LadderMetrics>>,
}

impl MatchRecorder {
    pub fn new(store: Arc<dyn LadderStore>, calculator: EloCalculator) -> Self {
        Self {
            store,
            calculator,
            max_commit_attempts: DEFAULT_MAX_COMMIT_ATTEMPTS,
            metrics: None,
        }
    }

    /// Set how many times a conflicting commit is attempted (at least once)
    pub fn with_max_commit_attempts(mut self, attempts: u32) -> Self {
        self.max_commit_attempts = attempts.max(1);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<LadderMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn calculator(&self) -> &EloCalculator {
        &self.calculator
    }

    /// Validate, compute and persist one match
    pub fn record(&self, submission: &MatchSubmission) -> Result<RecordedMatch> {
        let winner = self.validate(submission)?;

        let mut last_conflict = Uuid::nil();
        for attempt in 1..=self.max_commit_attempts {
            let players = self.resolve_players(submission)?;
            let (commit, outcome) = self.prepare_commit(submission, winner, &players)?;

            match self.store.commit_match(commit) {
                Ok(committed) => {
                    let changes: Vec<i64> =
                        committed.history.iter().map(|r| r.rating_change).collect();
                    if let Some(metrics) = &self.metrics {
                        metrics.record_match(&changes);
                    }

                    info!(
                        "Recorded match {} on {}: {} & {} vs {} & {}, {} won ({}), changes {:?}",
                        committed.record.id,
                        committed.record.match_date,
                        players[0].name,
                        players[1].name,
                        players[2].name,
                        players[3].name,
                        winner,
                        committed.record.match_score(),
                        changes
                    );

                    return Ok(RecordedMatch {
                        record: committed.record,
                        outcome,
                        players: committed.players,
                        history: committed.history,
                    });
                }
                Err(err) => {
                    let conflict = match err.downcast_ref::<LadderError>() {
                        Some(LadderError::ConcurrencyConflict { player_id, .. }) => Some(*player_id),
                        _ => None,
                    };
                    let Some(player_id) = conflict else {
                        return Err(err);
                    };

                    warn!(
                        "Commit attempt {}/{} conflicted on player {}",
                        attempt, self.max_commit_attempts, player_id
                    );
                    if let Some(metrics) = &self.metrics {
                        metrics.commit_conflicts_total.inc();
                    }
                    last_conflict = player_id;
                }
            }
        }

        Err(LadderError::ConcurrencyConflict {
            player_id: last_conflict,
            attempts: self.max_commit_attempts,
        }
        .into())
    }

    /// Input checks that need no storage access, in reporting order
    fn validate(&self, submission: &MatchSubmission) -> Result<Team> {
        let winner = Team::try_from(submission.winning_team).map_err(|e| {
            self.reject("winning_team");
            e
        })?;

        let names = submission.names();
        let distinct: HashSet<&str> = names.iter().copied().collect();
        if distinct.len() < names.len() {
            self.reject("duplicate_player");
            return Err(
                LadderError::validation("a player cannot appear twice in the same match").into(),
            );
        }

        Ok(winner)
    }

    /// Look up all four players, reporting every unknown name at once
    fn resolve_players(&self, submission: &MatchSubmission) -> Result<Vec<Player>> {
        let mut players = Vec::with_capacity(4);
        let mut missing = Vec::new();

        for name in submission.names() {
            match self.store.get_player_by_name(name)? {
                Some(player) => players.push(player),
                None => missing.push(name),
            }
        }

        if !missing.is_empty() {
            self.reject("unknown_player");
            return Err(LadderError::validation(format!(
                "players not found: {}",
                missing.join(", ")
            ))
            .into());
        }

        Ok(players)
    }

    fn prepare_commit(
        &self,
        submission: &MatchSubmission,
        winner: Team,
        players: &[Player],
    ) -> Result<(MatchCommit, MatchOutcome)> {
        let outcome = self.calculator.match_outcome(
            players[0].current_rating as f64,
            players[1].current_rating as f64,
            players[2].current_rating as f64,
            players[3].current_rating as f64,
            winner == Team::Team1,
        );
        debug!(
            "Outcome: team ratings {:.1} vs {:.1}, expected {:.4} vs {:.4}, deltas {:.3} / {:.3}",
            outcome.team1_rating,
            outcome.team2_rating,
            outcome.team1_expected,
            outcome.team2_expected,
            outcome.team1_delta,
            outcome.team2_delta
        );

        let team_entry = |team: Team, pair: &[Player]| TeamEntry {
            players: [pair[0].id, pair[1].id],
            avg_rating_before: round_rating(outcome.team_rating(team)),
            score: submission.team(team).score.clone(),
        };

        let record = Match {
            id: Uuid::nil(),
            match_date: submission.match_date,
            team1: team_entry(Team::Team1, &players[..2]),
            team2: team_entry(Team::Team2, &players[2..]),
            winning_team: winner,
            created_at: current_timestamp(),
        };

        let player_updates = players
            .iter()
            .enumerate()
            .map(|(slot, player)| {
                let team = if slot < 2 { Team::Team1 } else { Team::Team2 };
                let (new_rating, rating_change) =
                    apply_delta(player.current_rating, outcome.delta(team))?;

                let mut updated = player.clone();
                updated.apply_result(new_rating, team == winner);

                Ok(PlayerUpdate {
                    player: updated,
                    old_rating: player.current_rating,
                    rating_change,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok((
            MatchCommit {
                record,
                player_updates,
            },
            outcome,
        ))
    }

    fn reject(&self, reason: &str) {
        debug!("Rejected match submission: {}", reason);
        if let Some(metrics) = &self.metrics {
            metrics.record_validation_failure(reason);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rating::EloConfig;
    use crate::storage::{HistoryLimit, HistoryStore, InMemoryLadderStore, PlayerStore};

    fn setup(ratings: [i64; 4]) -> (Arc<InMemoryLadderStore>, MatchRecorder) {
        let store = Arc::new(InMemoryLadderStore::new());
        for (name, rating) in ["A", "B", "C", "D"].iter().zip(ratings) {
            store.create_player(Player::new(*name, rating)).unwrap();
        }
        let recorder = MatchRecorder::new(
            store.clone(),
            EloCalculator::new(EloConfig::default()).unwrap(),
        );
        (store, recorder)
    }

    fn submission(winning_team: u8) -> MatchSubmission {
        MatchSubmission {
            team1: TeamSubmission::new("A", "B"),
            team2: TeamSubmission::new("C", "D"),
            winning_team,
            match_date: NaiveDate::from_ymd_opt(2025, 12, 17).unwrap(),
        }
    }

    fn player(store: &InMemoryLadderStore, name: &str) -> Player {
        store.get_player_by_name(name).unwrap().unwrap()
    }

    fn validation_reason(err: &anyhow::Error) -> String {
        match err.downcast_ref::<LadderError>() {
            Some(LadderError::Validation { reason }) => reason.clone(),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_even_match_team1_wins() {
        let (store, recorder) = setup([1500; 4]);
        let recorded = recorder.record(&submission(1)).unwrap();

        assert_eq!(recorded.outcome.team1_expected, 0.5);
        assert_eq!(recorded.outcome.team1_delta, 16.0);
        assert_eq!(recorded.outcome.team2_delta, -16.0);
        assert_eq!(recorded.record.team1.avg_rating_before, 1500);
        assert_eq!(recorded.record.team2.avg_rating_before, 1500);
        assert_eq!(recorded.record.winning_team, Team::Team1);

        for name in ["A", "B"] {
            let p = player(&store, name);
            assert_eq!(p.current_rating, 1516);
            assert_eq!((p.games_played, p.wins, p.losses), (1, 1, 0));
        }
        for name in ["C", "D"] {
            let p = player(&store, name);
            assert_eq!(p.current_rating, 1484);
            assert_eq!((p.games_played, p.wins, p.losses), (1, 0, 1));
        }
    }

    #[test]
    fn test_unequal_teams_favourite_wins() {
        let (store, recorder) = setup([1650, 1550, 1450, 1350]);
        let recorded = recorder.record(&submission(1)).unwrap();

        assert!((recorded.outcome.team1_expected - 0.7597469266479578).abs() < 1e-9);
        assert!((recorded.outcome.team1_delta - 7.688098347265349).abs() < 1e-9);
        assert!((recorded.outcome.team2_delta + 7.688098347265347).abs() < 1e-9);
        assert_eq!(recorded.record.team1.avg_rating_before, 1600);
        assert_eq!(recorded.record.team2.avg_rating_before, 1400);

        assert_eq!(player(&store, "A").current_rating, 1658);
        assert_eq!(player(&store, "B").current_rating, 1558);
        assert_eq!(player(&store, "C").current_rating, 1442);
        assert_eq!(player(&store, "D").current_rating, 1342);
        assert!(recorded.history.iter().all(|r| r.rating_change.abs() == 8));
    }

    #[test]
    fn test_team2_win_and_history_rows() {
        let (store, recorder) = setup([1500; 4]);
        let recorded = recorder.record(&submission(2)).unwrap();

        assert_eq!(recorded.history.len(), 4);
        assert!(recorded
            .history
            .iter()
            .all(|r| r.match_id == recorded.record.id && r.is_consistent()));
        assert_eq!(recorded.history[0].rating_change, -16);
        assert_eq!(recorded.history[2].rating_change, 16);

        let c = player(&store, "C");
        assert_eq!((c.current_rating, c.wins), (1516, 1));
        let rows = store
            .get_history_by_player(&c.id, HistoryLimit::default())
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!((rows[0].old_rating, rows[0].new_rating), (1500, 1516));
    }

    #[test]
    fn test_scores_formatted_winner_first() {
        let (_, recorder) = setup([1500; 4]);
        let mut sub = submission(2);
        sub.team1 = sub.team1.with_score("4-6 4-6");
        sub.team2 = sub.team2.with_score("6-4 6-4");

        let recorded = recorder.record(&sub).unwrap();
        assert_eq!(recorded.match_score(), "6-4 6-4 - 4-6 4-6");

        let (_, recorder) = setup([1500; 4]);
        let recorded = recorder.record(&submission(1)).unwrap();
        assert_eq!(recorded.match_score(), "N/A");
    }

    #[test]
    fn test_invalid_winning_team() {
        let (store, recorder) = setup([1500; 4]);
        let before = store.snapshot().unwrap();

        for team in [0, 3] {
            let err = recorder.record(&submission(team)).unwrap_err();
            assert!(validation_reason(&err).contains("winning team"));
        }
        assert_eq!(store.snapshot().unwrap(), before);
    }

    #[test]
    fn test_duplicate_player_persists_nothing() {
        let (store, recorder) = setup([1500; 4]);
        let before = store.snapshot().unwrap();

        let mut sub = submission(1);
        sub.team2.players[1] = "A".to_string();
        let err = recorder.record(&sub).unwrap_err();

        assert!(validation_reason(&err).contains("twice"));
        assert_eq!(store.snapshot().unwrap(), before);
    }

    #[test]
    fn test_winning_team_checked_before_duplicates() {
        let (_, recorder) = setup([1500; 4]);
        let mut sub = submission(7);
        sub.team1.players[1] = "A".to_string();

        let err = recorder.record(&sub).unwrap_err();
        assert!(validation_reason(&err).contains("winning team"));
    }

    #[test]
    fn test_duplicates_checked_before_missing_players() {
        let (store, recorder) = setup([1500; 4]);
        let mut sub = submission(1);
        sub.team1.players[1] = "Ghost".to_string();
        sub.team2.players[1] = "Ghost".to_string();

        let err = recorder.record(&sub).unwrap_err();
        let reason = validation_reason(&err);
        assert!(reason.contains("twice"));
        assert!(!reason.contains("not found"));
        assert!(store.snapshot().unwrap().matches.is_empty());
    }

    #[test]
    fn test_rating_overflow_rejected_without_writes() {
        let (store, recorder) = setup([i64::MAX - 4; 4]);
        let before = store.snapshot().unwrap();

        // Even teams, so the winners gain 16 and pass i64::MAX
        let err = recorder.record(&submission(1)).unwrap_err();
        assert!(validation_reason(&err).contains("out of range"));
        assert_eq!(store.snapshot().unwrap(), before);
    }

    #[test]
    fn test_recorder_uses_configured_calculator() {
        let (_, recorder) = setup([1500; 4]);
        assert_eq!(recorder.calculator().k_factor(), 32.0);
    }

    #[test]
    fn test_missing_players_all_listed() {
        let (store, recorder) = setup([1500; 4]);
        let mut sub = submission(1);
        sub.team1.players[1] = "Ghost".to_string();
        sub.team2.players[0] = "Phantom".to_string();

        let err = recorder.record(&sub).unwrap_err();
        let reason = validation_reason(&err);
        assert!(reason.contains("Ghost"));
        assert!(reason.contains("Phantom"));
        assert!(store.snapshot().unwrap().matches.is_empty());
    }

    #[test]
    fn test_games_played_grows_by_four() {
        let (store, recorder) = setup([1500; 4]);
        let total = |store: &InMemoryLadderStore| -> u32 {
            store
                .get_all_players()
                .unwrap()
                .iter()
                .map(|p| p.games_played)
                .sum()
        };

        assert_eq!(total(&store), 0);
        recorder.record(&submission(1)).unwrap();
        assert_eq!(total(&store), 4);
        recorder.record(&submission(2)).unwrap();
        assert_eq!(total(&store), 8);

        for p in store.get_all_players().unwrap() {
            assert_eq!(p.games_played, p.wins + p.losses);
        }
    }

    #[test]
    fn test_max_commit_attempts_at_least_one() {
        let (_, recorder) = setup([1500; 4]);
        let recorder = recorder.with_max_commit_attempts(0);
        assert!(recorder.record(&submission(1)).is_ok());
    }

    #[test]
    fn test_metrics_recorded() {
        let (_, recorder) = setup([1500; 4]);
        let metrics = Arc::new(LadderMetrics::new().unwrap());
        let recorder = recorder.with_metrics(metrics.clone());

        recorder.record(&submission(1)).unwrap();
        let _ = recorder.record(&submission(5));

        assert_eq!(metrics.matches_recorded_total.get(), 1);
        assert_eq!(
            metrics
                .validation_failures_total
                .with_label_values(&["winning_team"])
                .get(),
            1
        );
    }
}
