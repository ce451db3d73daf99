//! Test fixtures and store wrappers for integration testing

#![allow(dead_code)]

use chrono::NaiveDate;
use padel_ladder::error::Result;
use padel_ladder::metrics::LadderMetrics;
use padel_ladder::rating::{EloCalculator, EloConfig};
use padel_ladder::recording::{MatchRecorder, MatchSubmission, TeamSubmission};
use padel_ladder::storage::{
    CommittedMatch, HistoryLimit, HistoryStore, InMemoryLadderStore, LadderStore, MatchCommit,
    MatchStore, PlayerStore,
};
use padel_ladder::types::{Match, MatchId, Player, PlayerId, Rating, RatingChangeRecord};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// In-memory store with the given players already registered
pub fn seeded_store(players: &[(&str, Rating)]) -> Arc<InMemoryLadderStore> {
    let store = Arc::new(InMemoryLadderStore::new());
    for (name, rating) in players {
        store
            .create_player(Player::new(*name, *rating))
            .expect("seed player");
    }
    store
}

/// Recorder with the default Elo configuration
pub fn recorder(store: Arc<dyn LadderStore>) -> MatchRecorder {
    MatchRecorder::new(
        store,
        EloCalculator::new(EloConfig::default()).expect("default config is valid"),
    )
}

pub fn recorder_with_metrics(
    store: Arc<dyn LadderStore>,
    attempts: u32,
) -> (MatchRecorder, Arc<LadderMetrics>) {
    let metrics = Arc::new(LadderMetrics::new().expect("metrics registry"));
    let recorder = recorder(store)
        .with_max_commit_attempts(attempts)
        .with_metrics(metrics.clone());
    (recorder, metrics)
}

pub fn match_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 12, 17).expect("valid date")
}

/// Submission for `a & b` against `c & d`
pub fn submission(a: &str, b: &str, c: &str, d: &str, winning_team: u8) -> MatchSubmission {
    MatchSubmission {
        team1: TeamSubmission::new(a, b),
        team2: TeamSubmission::new(c, d),
        winning_team,
        match_date: match_date(),
    }
}

pub fn rating_of(store: &dyn LadderStore, name: &str) -> Rating {
    store
        .get_player_by_name(name)
        .expect("store read")
        .expect("player exists")
        .current_rating
}

/// Store wrapper that lets another writer touch one of the match's players
/// right before each of the first `conflicts` commits, so those commits see
/// a stale version.
pub struct ConflictInjectingStore {
    inner: Arc<InMemoryLadderStore>,
    conflicts_remaining: AtomicU32,
    commits_attempted: AtomicU32,
}

impl ConflictInjectingStore {
    pub fn new(inner: Arc<InMemoryLadderStore>, conflicts: u32) -> Self {
        Self {
            inner,
            conflicts_remaining: AtomicU32::new(conflicts),
            commits_attempted: AtomicU32::new(0),
        }
    }

    /// Every commit conflicts
    pub fn always(inner: Arc<InMemoryLadderStore>) -> Self {
        Self::new(inner, u32::MAX)
    }

    pub fn inner(&self) -> &InMemoryLadderStore {
        &self.inner
    }

    pub fn commits_attempted(&self) -> u32 {
        self.commits_attempted.load(Ordering::SeqCst)
    }

    fn interfere(&self, commit: &MatchCommit) -> Result<()> {
        let remaining = self.conflicts_remaining.load(Ordering::SeqCst);
        if remaining == 0 {
            return Ok(());
        }
        self.conflicts_remaining
            .store(remaining - 1, Ordering::SeqCst);

        // A competing write that only bumps the version
        if let Some(update) = commit.player_updates.first() {
            if let Some(current) = self.inner.get_player(&update.player.id)? {
                self.inner.update_player(current)?;
            }
        }
        Ok(())
    }
}

impl PlayerStore for ConflictInjectingStore {
    fn create_player(&self, player: Player) -> Result<Player> {
        self.inner.create_player(player)
    }

    fn get_player_by_name(&self, name: &str) -> Result<Option<Player>> {
        self.inner.get_player_by_name(name)
    }

    fn get_player(&self, player_id: &PlayerId) -> Result<Option<Player>> {
        self.inner.get_player(player_id)
    }

    fn get_all_players(&self) -> Result<Vec<Player>> {
        self.inner.get_all_players()
    }

    fn update_player(&self, player: Player) -> Result<Player> {
        self.inner.update_player(player)
    }

    fn delete_player(&self, player_id: &PlayerId) -> Result<bool> {
        self.inner.delete_player(player_id)
    }
}

impl MatchStore for ConflictInjectingStore {
    fn create_match(&self, record: Match) -> Result<Match> {
        self.inner.create_match(record)
    }

    fn get_match(&self, match_id: &MatchId) -> Result<Option<Match>> {
        self.inner.get_match(match_id)
    }

    fn get_all_matches(&self) -> Result<Vec<Match>> {
        self.inner.get_all_matches()
    }

    fn get_matches_by_player(&self, player_id: &PlayerId) -> Result<Vec<Match>> {
        self.inner.get_matches_by_player(player_id)
    }
}

impl HistoryStore for ConflictInjectingStore {
    fn append_history(&self, record: RatingChangeRecord) -> Result<RatingChangeRecord> {
        self.inner.append_history(record)
    }

    fn get_history_by_player(
        &self,
        player_id: &PlayerId,
        limit: HistoryLimit,
    ) -> Result<Vec<RatingChangeRecord>> {
        self.inner.get_history_by_player(player_id, limit)
    }
}

impl LadderStore for ConflictInjectingStore {
    fn commit_match(&self, commit: MatchCommit) -> Result<CommittedMatch> {
        self.commits_attempted.fetch_add(1, Ordering::SeqCst);
        self.interfere(&commit)?;
        self.inner.commit_match(commit)
    }
}
