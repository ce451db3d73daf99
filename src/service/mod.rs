//! Service layer for the padel ladder
//!
//! This module contains the facade that coordinates the registry, the
//! recording workflow and the history ledger over one store.

pub mod app;

pub use app::LadderService;
