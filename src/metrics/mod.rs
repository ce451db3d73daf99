//! Metrics for the ladder
//!
//! Counters and histograms collected while players are registered and
//! matches are recorded, exposed in the Prometheus text format.

pub mod collector;

pub use collector::LadderMetrics;
