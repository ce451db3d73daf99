//! In-memory ladder storage
//!
//! [`LadderTables`] holds the three tables and implements the storage
//! contract against plain vectors; the file-backed store reuses it.

use super::{
    CommittedMatch, HistoryLimit, HistoryStore, LadderStore, MatchCommit, MatchStore, PlayerStore,
};
use crate::error::{LadderError, Result};
use crate::types::{Match, MatchId, Player, PlayerId, RatingChangeRecord};
use crate::utils::{current_timestamp, generate_history_id, generate_match_id, generate_player_id};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::RwLock;
use tracing::debug;

/// The ladder's tables, each kept in insertion order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LadderTables {
    pub players: Vec<Player>,
    pub matches: Vec<Match>,
    pub history: Vec<RatingChangeRecord>,
}

impl LadderTables {
    pub fn insert_player(&mut self, mut player: Player) -> Result<Player> {
        if self.players.iter().any(|p| p.name == player.name) {
            return Err(LadderError::DuplicateName { name: player.name }.into());
        }

        player.id = generate_player_id();
        player.created_at = current_timestamp();
        player.version = 0;
        self.players.push(player.clone());

        Ok(player)
    }

    pub fn player_by_name(&self, name: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.name == name)
    }

    pub fn player(&self, player_id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| &p.id == player_id)
    }

    /// Check that `player` exists and carries the stored version
    fn check_version(&self, player: &Player) -> Result<usize> {
        let index = self
            .players
            .iter()
            .position(|p| p.id == player.id)
            .ok_or_else(|| LadderError::PlayerNotFound {
                name: player.name.clone(),
            })?;

        if self.players[index].version != player.version {
            return Err(LadderError::ConcurrencyConflict {
                player_id: player.id,
                attempts: 1,
            }
            .into());
        }

        Ok(index)
    }

    fn write_player(&mut self, index: usize, player: &Player) -> Player {
        let stored = &mut self.players[index];
        stored.current_rating = player.current_rating;
        stored.games_played = player.games_played;
        stored.wins = player.wins;
        stored.losses = player.losses;
        stored.version += 1;
        stored.clone()
    }

    pub fn update_player(&mut self, player: Player) -> Result<Player> {
        let index = self.check_version(&player)?;
        Ok(self.write_player(index, &player))
    }

    pub fn delete_player(&mut self, player_id: &PlayerId) -> Result<bool> {
        if self.matches.iter().any(|m| m.involves(*player_id)) {
            return Err(LadderError::validation(format!(
                "player {} has recorded matches and cannot be deleted",
                player_id
            ))
            .into());
        }

        let before = self.players.len();
        self.players.retain(|p| &p.id != player_id);
        Ok(self.players.len() != before)
    }

    pub fn insert_match(&mut self, mut record: Match) -> Match {
        record.id = generate_match_id();
        record.created_at = current_timestamp();
        self.matches.push(record.clone());
        record
    }

    pub fn matches_latest_first(&self, filter: impl Fn(&Match) -> bool) -> Vec<Match> {
        let mut matches: Vec<Match> = self.matches.iter().filter(|m| filter(m)).cloned().collect();
        // Stable ascending sort then reverse: equal dates end up newest insert first
        matches.sort_by_key(|m| m.match_date);
        matches.reverse();
        matches
    }

    /// Append a standalone row. The row must be internally consistent and
    /// reference an existing match that the player took part in.
    pub fn append_history(&mut self, mut record: RatingChangeRecord) -> Result<RatingChangeRecord> {
        if !record.is_consistent() {
            return Err(LadderError::validation(format!(
                "history row is inconsistent: {} + {} != {}",
                record.old_rating, record.rating_change, record.new_rating
            ))
            .into());
        }

        if self.player(&record.player_id).is_none() {
            return Err(LadderError::validation(format!(
                "history row references unknown player {}",
                record.player_id
            ))
            .into());
        }

        let Some(linked) = self.matches.iter().find(|m| m.id == record.match_id) else {
            return Err(LadderError::validation(format!(
                "history row references unknown match {}",
                record.match_id
            ))
            .into());
        };
        if !linked.involves(record.player_id) {
            return Err(LadderError::validation(format!(
                "player {} did not play match {}",
                record.player_id, record.match_id
            ))
            .into());
        }

        record.id = generate_history_id();
        record.recorded_at = current_timestamp();
        self.history.push(record.clone());
        Ok(record)
    }

    pub fn history_for(&self, player_id: &PlayerId, limit: HistoryLimit) -> Vec<RatingChangeRecord> {
        let mut rows: Vec<RatingChangeRecord> = self
            .history
            .iter()
            .filter(|r| &r.player_id == player_id)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.recorded_at);
        rows.reverse();
        limit.truncate(&mut rows);
        rows
    }

    /// Validate every precondition, then write the match, players and history
    pub fn commit_match(&mut self, commit: MatchCommit) -> Result<CommittedMatch> {
        let distinct: HashSet<PlayerId> = commit.record.player_ids().into_iter().collect();
        if distinct.len() != 4 {
            return Err(LadderError::validation("a player cannot appear twice in the same match").into());
        }

        let updated: HashSet<PlayerId> = commit
            .player_updates
            .iter()
            .map(|u| u.player.id)
            .collect();
        if commit.player_updates.len() != 4 || updated != distinct {
            return Err(LadderError::validation(
                "a match commit must update each of its four players exactly once",
            )
            .into());
        }

        let mut indices = Vec::with_capacity(commit.player_updates.len());
        for update in &commit.player_updates {
            indices.push(self.check_version(&update.player)?);
        }

        // Match row first so every history row can reference its id
        let record = self.insert_match(commit.record);
        let recorded_at = current_timestamp();

        let mut players = Vec::with_capacity(indices.len());
        let mut history = Vec::with_capacity(indices.len());
        for (index, update) in indices.into_iter().zip(commit.player_updates) {
            let stored = self.write_player(index, &update.player);

            let row = RatingChangeRecord {
                id: generate_history_id(),
                player_id: stored.id,
                match_id: record.id,
                old_rating: update.old_rating,
                new_rating: stored.current_rating,
                rating_change: update.rating_change,
                recorded_at,
            };
            self.history.push(row.clone());

            players.push(stored);
            history.push(row);
        }

        debug!(
            "Committed match {} with {} player updates",
            record.id,
            players.len()
        );

        Ok(CommittedMatch {
            record,
            players,
            history,
        })
    }
}

/// Thread-safe in-memory ladder storage
#[derive(Debug, Default)]
pub struct InMemoryLadderStore {
    tables: RwLock<LadderTables>,
}

impl InMemoryLadderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from previously loaded tables
    pub fn with_tables(tables: LadderTables) -> Self {
        Self {
            tables: RwLock::new(tables),
        }
    }

    /// Copy of the current tables
    pub fn snapshot(&self) -> Result<LadderTables> {
        self.read(|tables| Ok(tables.clone()))
    }

    fn read<T>(&self, f: impl FnOnce(&LadderTables) -> Result<T>) -> Result<T> {
        let tables = self
            .tables
            .read()
            .map_err(|_| LadderError::lock_poisoned("ladder tables read"))?;
        f(&tables)
    }

    fn write<T>(&self, f: impl FnOnce(&mut LadderTables) -> Result<T>) -> Result<T> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| LadderError::lock_poisoned("ladder tables write"))?;
        f(&mut tables)
    }
}

impl PlayerStore for InMemoryLadderStore {
    fn create_player(&self, player: Player) -> Result<Player> {
        self.write(|tables| tables.insert_player(player))
    }

    fn get_player_by_name(&self, name: &str) -> Result<Option<Player>> {
        self.read(|tables| Ok(tables.player_by_name(name).cloned()))
    }

    fn get_player(&self, player_id: &PlayerId) -> Result<Option<Player>> {
        self.read(|tables| Ok(tables.player(player_id).cloned()))
    }

    fn get_all_players(&self) -> Result<Vec<Player>> {
        self.read(|tables| Ok(tables.players.clone()))
    }

    fn update_player(&self, player: Player) -> Result<Player> {
        self.write(|tables| tables.update_player(player))
    }

    fn delete_player(&self, player_id: &PlayerId) -> Result<bool> {
        self.write(|tables| tables.delete_player(player_id))
    }
}

impl MatchStore for InMemoryLadderStore {
    fn create_match(&self, record: Match) -> Result<Match> {
        self.write(|tables| Ok(tables.insert_match(record)))
    }

    fn get_match(&self, match_id: &MatchId) -> Result<Option<Match>> {
        self.read(|tables| Ok(tables.matches.iter().find(|m| &m.id == match_id).cloned()))
    }

    fn get_all_matches(&self) -> Result<Vec<Match>> {
        self.read(|tables| Ok(tables.matches_latest_first(|_| true)))
    }

    fn get_matches_by_player(&self, player_id: &PlayerId) -> Result<Vec<Match>> {
        self.read(|tables| Ok(tables.matches_latest_first(|m| m.involves(*player_id))))
    }
}

impl HistoryStore for InMemoryLadderStore {
    fn append_history(&self, record: RatingChangeRecord) -> Result<RatingChangeRecord> {
        self.write(|tables| tables.append_history(record))
    }

    fn get_history_by_player(
        &self,
        player_id: &PlayerId,
        limit: HistoryLimit,
    ) -> Result<Vec<RatingChangeRecord>> {
        self.read(|tables| Ok(tables.history_for(player_id, limit)))
    }
}

impl LadderStore for InMemoryLadderStore {
    fn commit_match(&self, commit: MatchCommit) -> Result<CommittedMatch> {
        self.write(|tables| tables.commit_match(commit))
    }
}
