//! Common types used throughout the ladder

use crate::error::LadderError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for players
pub type PlayerId = Uuid;

/// Unique identifier for recorded matches
pub type MatchId = Uuid;

/// Unique identifier for rating history rows
pub type HistoryId = Uuid;

/// Stored skill rating. Always an integer once persisted.
pub type Rating = i64;

/// Sentinel score shown when either team's score was not recorded
pub const SCORE_NOT_AVAILABLE: &str = "N/A";

/// One side of a doubles match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    Team1,
    Team2,
}

impl Team {
    pub fn opposite(self) -> Self {
        match self {
            Team::Team1 => Team::Team2,
            Team::Team2 => Team::Team1,
        }
    }

    /// The 1-based team number used by submissions and displays
    pub fn number(self) -> u8 {
        match self {
            Team::Team1 => 1,
            Team::Team2 => 2,
        }
    }
}

impl TryFrom<u8> for Team {
    type Error = LadderError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Team::Team1),
            2 => Ok(Team::Team2),
            other => Err(LadderError::validation(format!(
                "winning team must be 1 or 2, got {}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Team {}", self.number())
    }
}

/// A registered player and their running aggregates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub current_rating: Rating,
    pub games_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub created_at: DateTime<Utc>,
    /// Optimistic concurrency token, bumped by the store on every update
    pub version: u64,
}

impl Player {
    /// Create a fresh player with no games at the given rating.
    /// The id is provisional until the store assigns one.
    pub fn new(name: impl Into<String>, initial_rating: Rating) -> Self {
        Self {
            id: Uuid::nil(),
            name: name.into(),
            current_rating: initial_rating,
            games_played: 0,
            wins: 0,
            losses: 0,
            created_at: Utc::now(),
            version: 0,
        }
    }

    pub fn win_rate(&self) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        self.wins as f64 / self.games_played as f64
    }

    /// Apply one match result to the aggregates
    pub fn apply_result(&mut self, new_rating: Rating, won: bool) {
        self.current_rating = new_rating;
        self.games_played += 1;
        if won {
            self.wins += 1;
        } else {
            self.losses += 1;
        }
    }
}

impl std::fmt::Display for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (Elo: {}, Wins: {}, Losses: {}, Win Rate: {:.2}%)",
            self.name,
            self.current_rating,
            self.wins,
            self.losses,
            self.win_rate() * 100.0
        )
    }
}

/// A team's side of a recorded match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamEntry {
    pub players: [PlayerId; 2],
    /// Rounded team average captured before the rating update
    pub avg_rating_before: Rating,
    pub score: Option<String>,
}

/// An immutable record of one doubles match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub match_date: NaiveDate,
    pub team1: TeamEntry,
    pub team2: TeamEntry,
    pub winning_team: Team,
    pub created_at: DateTime<Utc>,
}

impl Match {
    pub fn team(&self, team: Team) -> &TeamEntry {
        match team {
            Team::Team1 => &self.team1,
            Team::Team2 => &self.team2,
        }
    }

    /// All four participants, team 1 first
    pub fn player_ids(&self) -> [PlayerId; 4] {
        [
            self.team1.players[0],
            self.team1.players[1],
            self.team2.players[0],
            self.team2.players[1],
        ]
    }

    pub fn involves(&self, player_id: PlayerId) -> bool {
        self.player_ids().contains(&player_id)
    }

    /// The team a player was on, if they took part
    pub fn team_of(&self, player_id: PlayerId) -> Option<Team> {
        if self.team1.players.contains(&player_id) {
            Some(Team::Team1)
        } else if self.team2.players.contains(&player_id) {
            Some(Team::Team2)
        } else {
            None
        }
    }

    /// Score formatted winner first, or `N/A` when either side is missing
    pub fn match_score(&self) -> String {
        let winner = self.team(self.winning_team).score.as_deref();
        let loser = self.team(self.winning_team.opposite()).score.as_deref();

        match (winner, loser) {
            (Some(winner), Some(loser)) => format!("{} - {}", winner, loser),
            _ => SCORE_NOT_AVAILABLE.to_string(),
        }
    }
}

/// One append-only rating history row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingChangeRecord {
    pub id: HistoryId,
    pub player_id: PlayerId,
    pub match_id: MatchId,
    pub old_rating: Rating,
    pub new_rating: Rating,
    pub rating_change: Rating,
    pub recorded_at: DateTime<Utc>,
}

impl RatingChangeRecord {
    pub fn is_consistent(&self) -> bool {
        self.new_rating == self.old_rating + self.rating_change
    }
}
