//! Paired-comparison Elo engine for 2v2 matches
//!
//! Pure arithmetic: no I/O and no state beyond the validated configuration.
//! Results stay in `f64`; rounding to stored integer ratings happens at
//! persistence time (see [`crate::rating::rounding`]).

use crate::error::LadderError;
use crate::types::{Rating, Team};
use serde::{Deserialize, Serialize};

/// Rating scale divisor of the logistic curve
pub const ELO_SCALE: f64 = 400.0;

/// Largest accepted k-factor
pub const MAX_K_FACTOR: f64 = 1000.0;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EloConfig {
    /// Maximum rating swing per match
    pub k_factor: f64,
    /// Rating assigned to new players
    pub initial_rating: Rating,
}

impl Default for EloConfig {
    fn default() -> Self {
        Self {
            k_factor: 32.0,
            initial_rating: 1500,
        }
    }
}

impl EloConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> crate::error::Result<()> {
        if !self.k_factor.is_finite() || self.k_factor <= 0.0 {
            return Err(LadderError::Configuration {
                message: format!("K-factor must be positive, got {}", self.k_factor),
            }
            .into());
        }

        if self.k_factor > MAX_K_FACTOR {
            return Err(LadderError::Configuration {
                message: format!(
                    "K-factor must be at most {}, got {}",
                    MAX_K_FACTOR, self.k_factor
                ),
            }
            .into());
        }

        Ok(())
    }
}

/// Everything computed for one match, before rounding
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub team1_rating: f64,
    pub team2_rating: f64,
    pub team1_expected: f64,
    pub team2_expected: f64,
    pub team1_delta: f64,
    pub team2_delta: f64,
}

impl MatchOutcome {
    pub fn team_rating(&self, team: Team) -> f64 {
        match team {
            Team::Team1 => self.team1_rating,
            Team::Team2 => self.team2_rating,
        }
    }

    /// Delta applied to both players of `team`
    pub fn delta(&self, team: Team) -> f64 {
        match team {
            Team::Team1 => self.team1_delta,
            Team::Team2 => self.team2_delta,
        }
    }
}

/// Elo calculator with a fixed, validated k-factor
#[derive(Debug, Clone)]
pub struct EloCalculator {
    config: EloConfig,
}

impl EloCalculator {
    /// Create a new calculator, rejecting non-positive k-factors
    pub fn new(config: EloConfig) -> crate::error::Result<Self> {
        config.validate()?;

        Ok(Self { config })
    }

    pub fn config(&self) -> &EloConfig {
        &self.config
    }

    pub fn k_factor(&self) -> f64 {
        self.config.k_factor
    }

    pub fn initial_rating(&self) -> Rating {
        self.config.initial_rating
    }

    /// Win probability of a side rated `rating_a` against `rating_b`
    pub fn expected_score(&self, rating_a: f64, rating_b: f64) -> f64 {
        expected_score(rating_a, rating_b)
    }

    /// Team strength as the mean of its two players
    pub fn team_rating(&self, player1: f64, player2: f64) -> f64 {
        (player1 + player2) / 2.0
    }

    /// `k * (actual - expected)`; `actual_score` is 1.0 for a win, 0.0 for a loss
    pub fn rating_delta(&self, current_rating: f64, opponent_rating: f64, actual_score: f64) -> f64 {
        self.config.k_factor * (actual_score - self.expected_score(current_rating, opponent_rating))
    }

    /// Compute team ratings, expectations and the team-uniform deltas
    pub fn match_outcome(
        &self,
        team1_player1: f64,
        team1_player2: f64,
        team2_player1: f64,
        team2_player2: f64,
        team1_won: bool,
    ) -> MatchOutcome {
        let team1_rating = self.team_rating(team1_player1, team1_player2);
        let team2_rating = self.team_rating(team2_player1, team2_player2);

        let team1_actual = if team1_won { 1.0 } else { 0.0 };
        let team2_actual = 1.0 - team1_actual;

        MatchOutcome {
            team1_rating,
            team2_rating,
            team1_expected: self.expected_score(team1_rating, team2_rating),
            team2_expected: self.expected_score(team2_rating, team1_rating),
            team1_delta: self.rating_delta(team1_rating, team2_rating, team1_actual),
            team2_delta: self.rating_delta(team2_rating, team1_rating, team2_actual),
        }
    }
}

/// Logistic expected score `1 / (1 + 10^((b - a) / 400))`
pub fn expected_score(rating_a: f64, rating_b: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf((rating_b - rating_a) / ELO_SCALE))
}
