//! Ladder service facade
//!
//! Wires the store, the Elo engine, the registry, the history ledger and the
//! recording workflow together from one [`AppConfig`], and enforces the
//! caller's role on writes.

use crate::config::AppConfig;
use crate::context::RequestContext;
use crate::display::{history_rows, ranking_rows, HistoryRow, MatchRow, RankingRow};
use crate::error::Result;
use crate::ledger::{HistoryLedger, HistoryLimit, TrajectoryPoint};
use crate::metrics::LadderMetrics;
use crate::rating::{EloCalculator, EloConfig};
use crate::recording::{MatchRecorder, MatchSubmission, RecordedMatch};
use crate::registry::PlayerRegistry;
use crate::storage::{InMemoryLadderStore, LadderStore};
use crate::types::{Match, Player, PlayerId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Everything needed to serve ladder requests
#[derive(Clone)]
pub struct LadderService {
    config: AppConfig,
    store: Arc<dyn LadderStore>,
    registry: PlayerRegistry,
    ledger: HistoryLedger,
    recorder: MatchRecorder,
    metrics: Arc<LadderMetrics>,
}

impl LadderService {
    /// Build the service on top of an existing store
    pub fn new(
        config: AppConfig,
        store: Arc<dyn LadderStore>,
        metrics: Arc<LadderMetrics>,
    ) -> Result<Self> {
        info!(
            "Initializing {} (k={}, initial rating {})",
            config.service.name, config.rating.k_factor, config.rating.initial_rating
        );

        let calculator = EloCalculator::new(EloConfig::from(&config.rating))?;
        let initial_rating = calculator.initial_rating();

        let registry = PlayerRegistry::new(store.clone(), initial_rating);
        let ledger = HistoryLedger::new(store.clone(), initial_rating);
        let recorder = MatchRecorder::new(store.clone(), calculator)
            .with_max_commit_attempts(config.recording.max_commit_attempts)
            .with_metrics(metrics.clone());

        Ok(Self {
            config,
            store,
            registry,
            ledger,
            recorder,
            metrics,
        })
    }

    /// Service backed by a fresh in-memory store and private metrics registry
    pub fn in_memory(config: AppConfig) -> Result<Self> {
        let metrics = Arc::new(LadderMetrics::new()?);
        Self::new(config, Arc::new(InMemoryLadderStore::new()), metrics)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn metrics(&self) -> Arc<LadderMetrics> {
        self.metrics.clone()
    }

    /// Register a player. Admin only.
    pub fn add_player(&self, ctx: &RequestContext, name: &str) -> Result<Player> {
        self.authorize(ctx, "add_player")?;

        let player = self.registry.add_player(name)?;
        self.metrics.players_registered_total.inc();
        Ok(player)
    }

    /// Exact-match lookup by name
    pub fn player(&self, name: &str) -> Result<Option<Player>> {
        self.registry.find_by_name(name)
    }

    /// Leaderboard rows, optionally cut to the top `limit`
    pub fn rankings(&self, limit: Option<usize>) -> Result<Vec<RankingRow>> {
        let players = match limit {
            Some(limit) => self.registry.top(limit)?,
            None => self.registry.list_ranked()?,
        };
        Ok(ranking_rows(&players))
    }

    /// Record a match result. Admin only.
    pub fn record_match(
        &self,
        ctx: &RequestContext,
        submission: &MatchSubmission,
    ) -> Result<RecordedMatch> {
        self.authorize(ctx, "record_match")?;
        self.recorder.record(submission)
    }

    /// Most recent history rows for a named player; `None` uses the
    /// configured default limit
    pub fn player_history(&self, name: &str, limit: Option<HistoryLimit>) -> Result<Vec<HistoryRow>> {
        let player = self.registry.require(name)?;
        let limit =
            limit.unwrap_or(HistoryLimit::Recent(self.config.recording.history_limit));
        let records = self.ledger.history_for_player(&player.id, limit)?;
        Ok(history_rows(&records))
    }

    pub fn trajectory(&self, name: &str) -> Result<Vec<TrajectoryPoint>> {
        let player = self.registry.require(name)?;
        self.ledger.trajectory(&player.id)
    }

    /// Matches the named player took part in, latest first
    pub fn matches_for(&self, name: &str) -> Result<Vec<MatchRow>> {
        let player = self.registry.require(name)?;
        let matches = self.store.get_matches_by_player(&player.id)?;
        self.match_rows(&matches)
    }

    /// Every match, latest first
    pub fn all_matches(&self) -> Result<Vec<MatchRow>> {
        let matches = self.store.get_all_matches()?;
        self.match_rows(&matches)
    }

    fn match_rows(&self, matches: &[Match]) -> Result<Vec<MatchRow>> {
        let names: HashMap<PlayerId, String> = self
            .store
            .get_all_players()?
            .into_iter()
            .map(|p| (p.id, p.name))
            .collect();

        Ok(matches
            .iter()
            .map(|m| {
                MatchRow::new(m, |id| {
                    names.get(id).cloned().unwrap_or_else(|| id.to_string())
                })
            })
            .collect())
    }

    fn authorize(&self, ctx: &RequestContext, operation: &str) -> Result<()> {
        ctx.require_admin().map_err(|e| {
            warn!("Denied {} for {}", operation, ctx.actor);
            e
        })
    }
}
