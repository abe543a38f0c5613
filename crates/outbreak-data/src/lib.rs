//! Data pipeline for the outbreak dashboard.
//!
//! Loads the outbreak CSV, cleans it into a canonical table, narrows it by a
//! filter selection, and computes the summary views a dashboard renders.

pub mod aggregator;
pub mod cleaner;
pub mod filter;
pub mod reader;
pub mod summary;

pub use outbreak_core as core;
