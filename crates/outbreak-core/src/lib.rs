//! Shared types for the outbreak dashboard.
//!
//! Record and table models, the calendar [`models::Month`] enum, the static
//! state-code table, error types, CLI settings and number formatting.

pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod state_codes;

pub use error::{OutbreakError, Result};
