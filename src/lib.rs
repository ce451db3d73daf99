//! Padel Ladder - Elo rankings for a doubles padel club
//!
//! This crate records 2v2 match results, updates player ratings with a
//! team-averaged Elo model, and keeps an append-only history of every
//! rating change so rankings and rating charts can be rebuilt at any time.

pub mod config;
pub mod context;
pub mod display;
pub mod error;
pub mod ledger;
pub mod metrics;
pub mod rating;
pub mod recording;
pub mod registry;
pub mod service;
pub mod storage;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{LadderError, Result};
pub use types::*;

// Re-export key components
pub use context::{RequestContext, Role};
pub use ledger::{HistoryLedger, HistoryLimit};
pub use rating::{EloCalculator, EloConfig};
pub use recording::{MatchRecorder, MatchSubmission, RecordedMatch, TeamSubmission};
pub use registry::PlayerRegistry;
pub use service::LadderService;
pub use storage::{InMemoryLadderStore, JsonFileLadderStore, LadderStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
