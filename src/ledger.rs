//! Append-only rating history
//!
//! Every recorded match leaves one row per participant. Rows are never
//! updated or deleted, so a player's rating can always be rebuilt by
//! replaying them from the initial rating.

use crate::error::Result;
use crate::storage::LadderStore;
use crate::types::{PlayerId, Rating, RatingChangeRecord};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use crate::storage::HistoryLimit;

/// One point of a rating chart
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    pub at: DateTime<Utc>,
    pub rating: Rating,
}

/// Read and append access to the rating history
#[derive(Clone)]
pub struct HistoryLedger {
    store: Arc<dyn LadderStore>,
    initial_rating: Rating,
}

impl HistoryLedger {
    pub fn new(store: Arc<dyn LadderStore>, initial_rating: Rating) -> Self {
        Self {
            store,
            initial_rating,
        }
    }

    /// Store one history row outside of a match commit
    pub fn append(&self, record: RatingChangeRecord) -> Result<RatingChangeRecord> {
        self.store.append_history(record)
    }

    /// Rows for a player, most recent first. Unknown players yield no rows.
    pub fn history_for_player(
        &self,
        player_id: &PlayerId,
        limit: HistoryLimit,
    ) -> Result<Vec<RatingChangeRecord>> {
        self.store.get_history_by_player(player_id, limit)
    }

    /// Rating chart for a player: a seed point at the initial rating one day
    /// before the first match, then each row's new rating in recording order.
    pub fn trajectory(&self, player_id: &PlayerId) -> Result<Vec<TrajectoryPoint>> {
        let records = self.history_for_player(player_id, HistoryLimit::All)?;
        Ok(build_trajectory(records, self.initial_rating))
    }

    /// Rating obtained by replaying every row of a player's history
    pub fn replay(&self, player_id: &PlayerId) -> Result<Rating> {
        let records = self.history_for_player(player_id, HistoryLimit::All)?;
        Ok(replay_rating(&records, self.initial_rating))
    }
}

/// Sort rows oldest first and turn them into chart points
pub fn build_trajectory(mut records: Vec<RatingChangeRecord>, seed: Rating) -> Vec<TrajectoryPoint> {
    if records.is_empty() {
        return Vec::new();
    }

    // Rows arrive newest first; reverse before the stable sort so equal
    // timestamps stay in insertion order.
    records.reverse();
    records.sort_by_key(|r| r.recorded_at);

    let mut points = Vec::with_capacity(records.len() + 1);
    points.push(TrajectoryPoint {
        at: records[0].recorded_at - Duration::days(1),
        rating: seed,
    });
    points.extend(records.iter().map(|r| TrajectoryPoint {
        at: r.recorded_at,
        rating: r.new_rating,
    }));
    points
}

/// Apply each row's change to the seed, in any order
pub fn replay_rating(records: &[RatingChangeRecord], seed: Rating) -> Rating {
    seed + records.iter().map(|r| r.rating_change).sum::<Rating>()
}
