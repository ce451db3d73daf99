//! Persistence boundary for players, matches and rating history
//!
//! The workflow only talks to these traits. Every backend must provide the
//! same contract: ids and timestamps are assigned on insert, player updates
//! are version-checked, and [`LadderStore::commit_match`] writes a match
//! together with its player updates and history rows as one unit.

pub mod json_file;
pub mod memory;

use crate::error::Result;
use crate::types::{Match, MatchId, Player, PlayerId, Rating, RatingChangeRecord};
use serde::{Deserialize, Serialize};

pub use json_file::JsonFileLadderStore;
pub use memory::{InMemoryLadderStore, LadderTables};

/// Number of history rows returned when no limit is given
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// How many history rows to return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryLimit {
    /// At most this many of the most recent rows
    Recent(usize),
    /// Every row, for trajectory reconstruction
    All,
}

impl Default for HistoryLimit {
    fn default() -> Self {
        HistoryLimit::Recent(DEFAULT_HISTORY_LIMIT)
    }
}

impl HistoryLimit {
    pub fn truncate<T>(self, rows: &mut Vec<T>) {
        if let HistoryLimit::Recent(limit) = self {
            rows.truncate(limit);
        }
    }
}

/// Player table operations
pub trait PlayerStore: Send + Sync {
    /// Insert a new player, assigning its id. Fails on a duplicate name.
    fn create_player(&self, player: Player) -> Result<Player>;

    /// Exact-match lookup by display name
    fn get_player_by_name(&self, name: &str) -> Result<Option<Player>>;

    fn get_player(&self, player_id: &PlayerId) -> Result<Option<Player>>;

    /// All players in creation order
    fn get_all_players(&self) -> Result<Vec<Player>>;

    /// Overwrite rating and aggregates if `player.version` is current.
    /// Returns the stored player with its bumped version.
    fn update_player(&self, player: Player) -> Result<Player>;

    /// Remove a player with no recorded matches
    fn delete_player(&self, player_id: &PlayerId) -> Result<bool>;
}

/// Match table operations
pub trait MatchStore: Send + Sync {
    /// Insert a match, assigning its id and creation timestamp
    fn create_match(&self, record: Match) -> Result<Match>;

    fn get_match(&self, match_id: &MatchId) -> Result<Option<Match>>;

    /// All matches, latest match date first
    fn get_all_matches(&self) -> Result<Vec<Match>>;

    /// Matches where the player occupies any of the four slots, latest first
    fn get_matches_by_player(&self, player_id: &PlayerId) -> Result<Vec<Match>>;
}

/// Rating history operations. Rows are never updated or deleted.
pub trait HistoryStore: Send + Sync {
    /// Append a row, assigning its id and `recorded_at`
    fn append_history(&self, record: RatingChangeRecord) -> Result<RatingChangeRecord>;

    /// Rows for a player, most recent first
    fn get_history_by_player(
        &self,
        player_id: &PlayerId,
        limit: HistoryLimit,
    ) -> Result<Vec<RatingChangeRecord>>;
}

/// New state for one participant of a match being committed
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerUpdate {
    /// Updated player; `version` must still be the version that was read
    pub player: Player,
    pub old_rating: Rating,
    pub rating_change: Rating,
}

/// Everything written when a match is recorded
#[derive(Debug, Clone, PartialEq)]
pub struct MatchCommit {
    /// The match row; id and `created_at` are assigned by the store
    pub record: Match,
    pub player_updates: Vec<PlayerUpdate>,
}

/// Rows written by a successful commit
#[derive(Debug, Clone, PartialEq)]
pub struct CommittedMatch {
    pub record: Match,
    pub players: Vec<Player>,
    pub history: Vec<RatingChangeRecord>,
}

/// Full storage capability consumed by the recording workflow
pub trait LadderStore: PlayerStore + MatchStore + HistoryStore {
    /// Atomically insert the match, apply every player update and append one
    /// history row per update linked to the new match id. If any player's
    /// version is stale, fails with `ConcurrencyConflict` and writes nothing.
    fn commit_match(&self, commit: MatchCommit) -> Result<CommittedMatch>;
}
