//! Metrics collection using Prometheus

use anyhow::Result;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Main metrics collector for the ladder
#[derive(Clone)]
pub struct LadderMetrics {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Matches committed to storage
    pub matches_recorded_total: IntCounter,

    /// Players added to the ladder
    pub players_registered_total: IntCounter,

    /// Commit attempts rejected because a player changed underneath
    pub commit_conflicts_total: IntCounter,

    /// Rejected submissions by reason
    pub validation_failures_total: IntCounterVec,

    /// Absolute rounded rating change per player per match
    pub rating_change_points: Histogram,
}

impl LadderMetrics {
    /// Create a new metrics collector with its own registry
    pub fn new() -> Result<Self> {
        Self::with_registry(Arc::new(Registry::new()))
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let matches_recorded_total = IntCounter::with_opts(Opts::new(
            "ladder_matches_recorded_total",
            "Total number of matches recorded",
        ))?;
        registry.register(Box::new(matches_recorded_total.clone()))?;

        let players_registered_total = IntCounter::with_opts(Opts::new(
            "ladder_players_registered_total",
            "Total number of players registered",
        ))?;
        registry.register(Box::new(players_registered_total.clone()))?;

        let commit_conflicts_total = IntCounter::with_opts(Opts::new(
            "ladder_commit_conflicts_total",
            "Match commits retried after a concurrent player update",
        ))?;
        registry.register(Box::new(commit_conflicts_total.clone()))?;

        let validation_failures_total = IntCounterVec::new(
            Opts::new(
                "ladder_validation_failures_total",
                "Rejected match submissions by reason",
            ),
            &["reason"],
        )?;
        registry.register(Box::new(validation_failures_total.clone()))?;

        let rating_change_points = Histogram::with_opts(
            HistogramOpts::new(
                "ladder_rating_change_points",
                "Absolute rating change applied to a player",
            )
            .buckets(vec![1.0, 2.0, 4.0, 8.0, 12.0, 16.0, 24.0, 32.0, 48.0]),
        )?;
        registry.register(Box::new(rating_change_points.clone()))?;

        Ok(Self {
            registry,
            matches_recorded_total,
            players_registered_total,
            commit_conflicts_total,
            validation_failures_total,
            rating_change_points,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    pub fn record_validation_failure(&self, reason: &str) {
        self.validation_failures_total
            .with_label_values(&[reason])
            .inc();
    }

    pub fn record_match(&self, rating_changes: &[i64]) {
        self.matches_recorded_total.inc();
        for change in rating_changes {
            self.rating_change_points.observe(change.unsigned_abs() as f64);
        }
    }

    /// Render every registered metric in the Prometheus text format
    pub fn encode_text(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let metrics = LadderMetrics::new().unwrap();
        assert_eq!(metrics.matches_recorded_total.get(), 0);
        assert_eq!(metrics.commit_conflicts_total.get(), 0);

        let families = metrics.registry().gather();
        assert!(families
            .iter()
            .any(|f| f.get_name() == "ladder_matches_recorded_total"));
    }

    #[test]
    fn test_record_match() {
        let metrics = LadderMetrics::new().unwrap();
        metrics.record_match(&[16, 16, -16, -16]);

        assert_eq!(metrics.matches_recorded_total.get(), 1);
        assert_eq!(metrics.rating_change_points.get_sample_count(), 4);
        assert_eq!(metrics.rating_change_points.get_sample_sum(), 64.0);
    }

    #[test]
    fn test_encode_text() {
        let metrics = LadderMetrics::new().unwrap();
        metrics.record_validation_failure("duplicate_player");

        let text = metrics.encode_text().unwrap();
        assert!(text.contains("ladder_validation_failures_total{reason=\"duplicate_player\"} 1"));
        assert!(text.contains("ladder_matches_recorded_total 0"));
    }

    #[test]
    fn test_shared_registry_rejects_second_collector() {
        let registry = Arc::new(Registry::new());
        assert!(LadderMetrics::with_registry(registry.clone()).is_ok());
        assert!(LadderMetrics::with_registry(registry).is_err());
    }
}
