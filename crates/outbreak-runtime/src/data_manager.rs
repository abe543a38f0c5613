//! Load-once cache of the canonical outbreak table.
//!
//! The source is downloaded and cleaned on the first request of a session and
//! shared as an immutable [`Arc`] afterwards. A failed load is not retried;
//! the error is returned to the caller and remembered for display.

use std::sync::Arc;
use std::time::{Duration, Instant};

use outbreak_core::models::OutbreakTable;
use outbreak_core::{OutbreakError, Result};
use outbreak_data::cleaner::{clean_with_report, CleaningReport};
use outbreak_data::filter::FilterOptions;
use outbreak_data::reader::load_raw_table;

/// The canonical table together with what was learned while building it.
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub table: Arc<OutbreakTable>,
    pub report: CleaningReport,
    pub options: FilterOptions,
}

/// Session-scoped holder for the canonical table.
///
/// # Example
/// ```no_run
/// use outbreak_runtime::data_manager::DataManager;
///
/// # async fn run() -> outbreak_core::Result<()> {
/// let mut mgr = DataManager::new("outbreaks.csv");
/// let loaded = mgr.get_table(false).await?;
/// println!("{} outbreaks", loaded.table.len());
/// # Ok(())
/// # }
/// ```
pub struct DataManager {
    source: String,
    cache: Option<LoadedTable>,
    loaded_at: Option<Instant>,
    last_error: Option<String>,
}

impl DataManager {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            cache: None,
            loaded_at: None,
            last_error: None,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Return the canonical table, loading it on first use.
    ///
    /// With `force_refresh` the source is fetched again even when a table is
    /// cached. On failure any previously cached table is kept.
    pub async fn get_table(&mut self, force_refresh: bool) -> Result<LoadedTable> {
        if !force_refresh {
            if let Some(cached) = &self.cache {
                tracing::debug!("returning cached canonical table");
                return Ok(cached.clone());
            }
        }

        match self.load().await {
            Ok(loaded) => {
                self.cache = Some(loaded.clone());
                self.loaded_at = Some(Instant::now());
                self.last_error = None;
                Ok(loaded)
            }
            Err(e) => {
                tracing::error!(error = %e, source = %self.source, "failed to load outbreak data");
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Drop the cached table so the next request reloads the source.
    pub fn invalidate(&mut self) {
        self.cache = None;
        self.loaded_at = None;
        tracing::debug!("canonical table invalidated");
    }

    /// Time since the cached table was loaded.
    pub fn cache_age(&self) -> Option<Duration> {
        self.loaded_at.map(|ts| ts.elapsed())
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    async fn load(&self) -> Result<LoadedTable> {
        let started = Instant::now();
        let raw = load_raw_table(&self.source).await?;

        let (table, report) = tokio::task::spawn_blocking(move || clean_with_report(&raw))
            .await
            .map_err(|e| OutbreakError::Other(e.into()))?;
        let options = FilterOptions::from_table(&table);

        tracing::info!(
            rows = table.len(),
            years = options.years.len(),
            states = options.states.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "canonical table ready"
        );

        Ok(LoadedTable {
            table: Arc::new(table),
            report,
            options,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
