//! Player registration and lookup
//!
//! Names are unique and matched exactly. New players start at the
//! configured initial rating with no games.

use crate::error::{LadderError, Result};
use crate::storage::LadderStore;
use crate::types::{Player, Rating};
use std::sync::Arc;
use tracing::info;

/// Player registry on top of the persistence boundary
#[derive(Clone)]
pub struct PlayerRegistry {
    store: Arc<dyn LadderStore>,
    initial_rating: Rating,
}

impl PlayerRegistry {
    pub fn new(store: Arc<dyn LadderStore>, initial_rating: Rating) -> Self {
        Self {
            store,
            initial_rating,
        }
    }

    pub fn initial_rating(&self) -> Rating {
        self.initial_rating
    }

    /// Register a new player at the initial rating
    pub fn add_player(&self, name: &str) -> Result<Player> {
        if name.trim().is_empty() {
            return Err(LadderError::validation("player name cannot be empty").into());
        }

        if self.store.get_player_by_name(name)?.is_some() {
            return Err(LadderError::DuplicateName {
                name: name.to_string(),
            }
            .into());
        }

        let player = self
            .store
            .create_player(Player::new(name, self.initial_rating))?;
        info!("Registered player {} at {}", player.name, player.current_rating);

        Ok(player)
    }

    /// Exact-match lookup by name
    pub fn find_by_name(&self, name: &str) -> Result<Option<Player>> {
        self.store.get_player_by_name(name)
    }

    /// Lookup that treats an unknown name as an error
    pub fn require(&self, name: &str) -> Result<Player> {
        self.find_by_name(name)?.ok_or_else(|| {
            LadderError::PlayerNotFound {
                name: name.to_string(),
            }
            .into()
        })
    }

    /// All players by rating, highest first. Equal ratings keep creation
    /// order, so the earlier-registered player gets the better rank number.
    pub fn list_ranked(&self) -> Result<Vec<Player>> {
        let mut players = self.store.get_all_players()?;
        players.sort_by(|a, b| b.current_rating.cmp(&a.current_rating));
        Ok(players)
    }

    /// The top `limit` players of [`list_ranked`](Self::list_ranked)
    pub fn top(&self, limit: usize) -> Result<Vec<Player>> {
        let mut players = self.list_ranked()?;
        players.truncate(limit);
        Ok(players)
    }
}
