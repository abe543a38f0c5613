//! Concurrent view computation for one dashboard session.
//!
//! Each [`DashboardSession::refresh`] narrows the canonical table by a
//! selection and fans the views out over blocking worker tasks that share one
//! immutable [`FilteredView`]. Every refresh takes a new generation number; a
//! run that finishes after a newer one has started is discarded.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use outbreak_core::models::{OutbreakRecord, OutbreakTable, RawTable};
use outbreak_core::{OutbreakError, Result};
use outbreak_data::aggregator::{AggregationEngine, DashboardViews};
use outbreak_data::cleaner::CleaningReport;
use outbreak_data::filter::{FilterOptions, FilterSelection, FilteredView};
use outbreak_data::summary::{describe, preview, ColumnSummary};
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::data_manager::LoadedTable;

// ── Public types ──────────────────────────────────────────────────────────────

/// Everything a presentation layer needs for one selection.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub metadata: SnapshotMetadata,
    pub views: DashboardViews,
    /// Head of the canonical table.
    pub preview: RawTable,
    /// Column summary of the canonical table.
    pub describe: Vec<ColumnSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SnapshotMetadata {
    pub generated_at: DateTime<Utc>,
    pub generation: u64,
    pub canonical_rows: usize,
    pub filtered_rows: usize,
    pub selection: FilterSelection,
    pub cleaning: CleaningReport,
    pub compute_time_seconds: f64,
}

// ── DashboardSession ──────────────────────────────────────────────────────────

/// One user's view of a loaded canonical table.
pub struct DashboardSession {
    table: Arc<OutbreakTable>,
    report: CleaningReport,
    options: FilterOptions,
    engine: AggregationEngine,
    preview: Arc<RawTable>,
    describe: Arc<Vec<ColumnSummary>>,
    generation: AtomicU64,
}

impl DashboardSession {
    /// Start a session over `loaded`. The preview and column summary of the
    /// canonical table are computed once here.
    pub async fn open(
        loaded: LoadedTable,
        engine: AggregationEngine,
        preview_rows: usize,
    ) -> Result<Self> {
        let table = Arc::clone(&loaded.table);
        let (head, summary) = tokio::task::spawn_blocking(move || {
            (preview(&table, preview_rows), describe(&table))
        })
        .await
        .map_err(join_error)?;

        Ok(Self {
            table: loaded.table,
            report: loaded.report,
            options: loaded.options,
            engine,
            preview: Arc::new(head),
            describe: Arc::new(summary),
            generation: AtomicU64::new(0),
        })
    }

    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    pub fn table(&self) -> &Arc<OutbreakTable> {
        &self.table
    }

    /// Generation of the most recently started refresh.
    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// The selection that keeps every row with all keys present, if the table
    /// has any years.
    pub fn default_selection(&self) -> Option<FilterSelection> {
        FilterSelection::all(&self.options)
    }

    /// Compute every view for `selection`.
    ///
    /// Returns `Ok(None)` when a newer refresh started before this one
    /// finished; its results are stale and dropped.
    pub async fn refresh(
        &self,
        selection: &FilterSelection,
    ) -> Result<Option<DashboardSnapshot>> {
        let generation = self.begin_generation();
        self.refresh_as(generation, selection).await
    }

    /// Claim the next generation number, superseding every earlier one.
    pub fn begin_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Compute the views for `selection` under an already claimed
    /// `generation`. `Ok(None)` when that generation is no longer current.
    pub async fn refresh_as(
        &self,
        generation: u64,
        selection: &FilterSelection,
    ) -> Result<Option<DashboardSnapshot>> {
        let started = Instant::now();

        let view = Arc::new(selection.apply(&self.table));
        let views = compute_views(self.engine, &view).await?;

        if self.current_generation() != generation {
            tracing::debug!(
                generation,
                current = self.current_generation(),
                "discarding superseded refresh"
            );
            return Ok(None);
        }

        let compute_time_seconds = started.elapsed().as_secs_f64();
        tracing::debug!(
            generation,
            filtered_rows = view.len(),
            compute_time_seconds,
            "views computed"
        );

        Ok(Some(DashboardSnapshot {
            metadata: SnapshotMetadata {
                generated_at: Utc::now(),
                generation,
                canonical_rows: self.table.len(),
                filtered_rows: view.len(),
                selection: selection.clone(),
                cleaning: self.report.clone(),
                compute_time_seconds,
            },
            views,
            preview: (*self.preview).clone(),
            describe: (*self.describe).clone(),
        }))
    }
}

// ── Private helpers ───────────────────────────────────────────────────────────

fn join_error(e: tokio::task::JoinError) -> OutbreakError {
    OutbreakError::Other(e.into())
}

/// Run `f` over the view's records on a blocking worker.
fn spawn_view<T, F>(view: &Arc<FilteredView>, f: F) -> JoinHandle<T>
where
    T: Send + 'static,
    F: FnOnce(&[OutbreakRecord]) -> T + Send + 'static,
{
    let view = Arc::clone(view);
    tokio::task::spawn_blocking(move || f(view.records()))
}

async fn compute_views(
    engine: AggregationEngine,
    view: &Arc<FilteredView>,
) -> Result<DashboardViews> {
    let (
        yearly_trend,
        yearly_outcomes,
        location_breakdown,
        state_map,
        top_pathogens,
        top_foods,
        pathogen_severity,
        pathogen_fatalities,
        monthly_by_year,
        monthly_average,
        outcome_points,
    ) = tokio::try_join!(
        spawn_view(view, move |r| engine.yearly_trend(r)),
        spawn_view(view, move |r| engine.yearly_outcomes(r)),
        spawn_view(view, move |r| engine.location_breakdown(r)),
        spawn_view(view, move |r| engine.state_map(r)),
        spawn_view(view, move |r| engine.top_pathogens(r)),
        spawn_view(view, move |r| engine.top_foods(r)),
        spawn_view(view, move |r| engine.pathogen_severity(r)),
        spawn_view(view, move |r| engine.pathogen_fatalities(r)),
        spawn_view(view, move |r| engine.monthly_by_year(r)),
        spawn_view(view, move |r| engine.monthly_average(r)),
        spawn_view(view, move |r| engine.outcome_points(r)),
    )
    .map_err(join_error)?;

    Ok(DashboardViews {
        yearly_trend,
        yearly_outcomes,
        location_breakdown,
        state_map,
        top_pathogens,
        top_foods,
        pathogen_severity,
        pathogen_fatalities,
        monthly_by_year,
        monthly_average,
        outcome_points,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
