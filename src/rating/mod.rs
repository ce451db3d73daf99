//! Elo rating engine for doubles matches
//!
//! This module holds the pure expected-score and delta arithmetic plus the
//! rounding rules used when deltas become stored integer ratings.

pub mod elo;
pub mod rounding;

// Re-export commonly used types
pub use elo::{expected_score, EloCalculator, EloConfig, MatchOutcome, MAX_K_FACTOR};
pub use rounding::{apply_delta, round_delta, round_rating};
