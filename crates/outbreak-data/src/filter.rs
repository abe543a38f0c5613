//! Filter options and conjunctive filter selections.

use std::collections::BTreeSet;

use outbreak_core::models::{OutbreakRecord, OutbreakTable};
use outbreak_core::{OutbreakError, Result};
use serde::Serialize;

// ── FilterOptions ─────────────────────────────────────────────────────────────

/// The choices available to a selection UI, derived from a canonical table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    /// Distinct years, ascending.
    pub years: Vec<i32>,
    /// Distinct states, sorted case-insensitively.
    pub states: Vec<String>,
    /// Distinct pathogens, sorted case-insensitively.
    pub species: Vec<String>,
    /// Distinct exposure locations, sorted case-insensitively.
    pub locations: Vec<String>,
}

impl FilterOptions {
    pub fn from_table(table: &OutbreakTable) -> Self {
        let records = table.records();
        let years: BTreeSet<i32> = records.iter().filter_map(|r| r.year).collect();
        Self {
            years: years.into_iter().collect(),
            states: distinct_sorted(records, |r| r.state.as_deref()),
            species: distinct_sorted(records, |r| r.species.as_deref()),
            locations: distinct_sorted(records, |r| r.location.as_deref()),
        }
    }

    /// `(earliest, latest)` year, or `None` for a table without years.
    pub fn year_range(&self) -> Option<(i32, i32)> {
        Some((*self.years.first()?, *self.years.last()?))
    }
}

fn distinct_sorted<'a>(
    records: &'a [OutbreakRecord],
    key: impl Fn(&'a OutbreakRecord) -> Option<&'a str>,
) -> Vec<String> {
    let distinct: BTreeSet<&str> = records.iter().filter_map(key).collect();
    let mut values: Vec<String> = distinct.into_iter().map(str::to_string).collect();
    // Stable on top of the byte order from the set, so equal-when-lowered
    // values keep a deterministic order.
    values.sort_by_key(|v| v.to_lowercase());
    values
}

// ── FilterSelection ───────────────────────────────────────────────────────────

/// A user's filter choice. Every predicate must hold for a record to be kept;
/// an empty set matches nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterSelection {
    year_min: i32,
    year_max: i32,
    states: BTreeSet<String>,
    species: BTreeSet<String>,
    locations: BTreeSet<String>,
}

impl FilterSelection {
    /// Build a selection with inclusive year bounds.
    ///
    /// # Errors
    ///
    /// [`OutbreakError::InvalidSelection`] when `year_min > year_max`.
    pub fn new(
        year_min: i32,
        year_max: i32,
        states: impl IntoIterator<Item = String>,
        species: impl IntoIterator<Item = String>,
        locations: impl IntoIterator<Item = String>,
    ) -> Result<Self> {
        if year_min > year_max {
            return Err(OutbreakError::InvalidSelection { year_min, year_max });
        }
        Ok(Self {
            year_min,
            year_max,
            states: states.into_iter().collect(),
            species: species.into_iter().collect(),
            locations: locations.into_iter().collect(),
        })
    }

    /// Select everything in `options`. `None` when there are no years.
    pub fn all(options: &FilterOptions) -> Option<Self> {
        let (year_min, year_max) = options.year_range()?;
        Some(Self {
            year_min,
            year_max,
            states: options.states.iter().cloned().collect(),
            species: options.species.iter().cloned().collect(),
            locations: options.locations.iter().cloned().collect(),
        })
    }

    /// Replace the year bounds.
    pub fn with_years(self, year_min: i32, year_max: i32) -> Result<Self> {
        if year_min > year_max {
            return Err(OutbreakError::InvalidSelection { year_min, year_max });
        }
        Ok(Self {
            year_min,
            year_max,
            ..self
        })
    }

    pub fn with_states(self, states: impl IntoIterator<Item = String>) -> Self {
        Self {
            states: states.into_iter().collect(),
            ..self
        }
    }

    pub fn with_species(self, species: impl IntoIterator<Item = String>) -> Self {
        Self {
            species: species.into_iter().collect(),
            ..self
        }
    }

    pub fn with_locations(self, locations: impl IntoIterator<Item = String>) -> Self {
        Self {
            locations: locations.into_iter().collect(),
            ..self
        }
    }

    pub fn year_min(&self) -> i32 {
        self.year_min
    }

    pub fn year_max(&self) -> i32 {
        self.year_max
    }

    pub fn states(&self) -> &BTreeSet<String> {
        &self.states
    }

    pub fn species(&self) -> &BTreeSet<String> {
        &self.species
    }

    pub fn locations(&self) -> &BTreeSet<String> {
        &self.locations
    }

    /// `true` when `record` satisfies all four predicates.
    pub fn matches(&self, record: &OutbreakRecord) -> bool {
        let in_set = |set: &BTreeSet<String>, value: &Option<String>| {
            value.as_ref().is_some_and(|v| set.contains(v))
        };
        record
            .year
            .is_some_and(|y| (self.year_min..=self.year_max).contains(&y))
            && in_set(&self.states, &record.state)
            && in_set(&self.species, &record.species)
            && in_set(&self.locations, &record.location)
    }

    /// Narrow `table` to the matching records. `table` is left untouched.
    pub fn apply(&self, table: &OutbreakTable) -> FilteredView {
        let records: Vec<OutbreakRecord> = table
            .records()
            .iter()
            .filter(|r| self.matches(r))
            .cloned()
            .collect();
        tracing::debug!(
            canonical_rows = table.len(),
            filtered_rows = records.len(),
            "selection applied"
        );
        FilteredView {
            table: table.with_records(records),
            selection: self.clone(),
        }
    }
}

// ── FilteredView ──────────────────────────────────────────────────────────────

/// The canonical table narrowed by one selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilteredView {
    table: OutbreakTable,
    selection: FilterSelection,
}

impl FilteredView {
    pub fn table(&self) -> &OutbreakTable {
        &self.table
    }

    pub fn records(&self) -> &[OutbreakRecord] {
        self.table.records()
    }

    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
