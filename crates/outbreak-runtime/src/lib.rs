//! Session runtime for the outbreak dashboard.
//!
//! Loads and cleans the source once per session, then recomputes every view
//! concurrently whenever the filter selection changes.

pub mod data_manager;
pub mod orchestrator;

pub use outbreak_core as core;
pub use outbreak_data as data;
