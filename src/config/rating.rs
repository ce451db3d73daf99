//! Rating system configuration

use crate::rating::EloConfig;
use crate::types::Rating;
use serde::{Deserialize, Serialize};

/// Elo parameters as loaded from the environment or a config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingConfig {
    pub k_factor: f64,
    pub initial_rating: Rating,
}

impl Default for RatingConfig {
    fn default() -> Self {
        let elo = EloConfig::default();
        Self {
            k_factor: elo.k_factor,
            initial_rating: elo.initial_rating,
        }
    }
}

impl From<&RatingConfig> for EloConfig {
    fn from(config: &RatingConfig) -> Self {
        Self {
            k_factor: config.k_factor,
            initial_rating: config.initial_rating,
        }
    }
}
