//! Summary views over a filtered set of outbreak records.
//!
//! Every view is a pure function of the records it is given: group, sum or
//! average, sort, and optionally keep the top N. Groups are formed in the
//! ascending order of their key and rankings use a stable descending sort,
//! so tied groups keep their key order. Sums saturate at `u64::MAX`.

use std::collections::BTreeMap;

use outbreak_core::models::{Month, OutbreakRecord};
use outbreak_core::state_codes::state_code;
use serde::Serialize;

use crate::cleaner::is_sentinel_null;

/// Default number of rows kept by the top-N rankings.
pub const DEFAULT_TOP_N: usize = 10;

// ── View rows ─────────────────────────────────────────────────────────────────

/// Total illnesses for one year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearTotal {
    pub year: i32,
    pub illnesses: u64,
}

/// Kind of outcome counted in the long-form yearly outcomes view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum OutcomeKind {
    Illnesses,
    Hospitalizations,
    Fatalities,
}

impl OutcomeKind {
    pub const ALL: [OutcomeKind; 3] = [
        OutcomeKind::Illnesses,
        OutcomeKind::Hospitalizations,
        OutcomeKind::Fatalities,
    ];

    pub fn label(self) -> &'static str {
        match self {
            OutcomeKind::Illnesses => "Illnesses",
            OutcomeKind::Hospitalizations => "Hospitalizations",
            OutcomeKind::Fatalities => "Fatalities",
        }
    }

    fn count(self, record: &OutbreakRecord) -> Option<u64> {
        match self {
            OutcomeKind::Illnesses => record.illnesses,
            OutcomeKind::Hospitalizations => record.hospitalizations,
            OutcomeKind::Fatalities => record.fatalities,
        }
    }
}

/// One `(year, outcome kind, count)` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutcomeCount {
    pub year: i32,
    pub kind: OutcomeKind,
    pub count: u64,
}

/// A labelled total, used by every ranking over a categorical column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    pub label: String,
    pub total: u64,
}

/// Choropleth value for one state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateValue {
    pub state: String,
    pub code: &'static str,
    pub illnesses: u64,
}

/// Hospitalization rate (percent of illnesses) for one pathogen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeverityRate {
    pub species: String,
    pub illnesses: u64,
    pub hospitalizations: u64,
    pub rate: f64,
}

/// Month × year cross tabulation of illness sums.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MonthlyMatrix {
    /// Column keys, ascending.
    pub years: Vec<i32>,
    /// One row per month present, in calendar order.
    pub rows: Vec<MonthlyRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyRow {
    pub month: Month,
    /// Aligned with [`MonthlyMatrix::years`]; `None` where no record exists.
    pub values: Vec<Option<u64>>,
}

impl MonthlyMatrix {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Illness sum for one cell, if the cell has data.
    pub fn get(&self, month: Month, year: i32) -> Option<u64> {
        let col = self.years.iter().position(|y| *y == year)?;
        self.rows
            .iter()
            .find(|r| r.month == month)
            .and_then(|r| r.values[col])
    }
}

/// Mean illnesses per outbreak for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyAverage {
    pub month: Month,
    /// `None` when no record in this month reports illnesses.
    pub mean: Option<f64>,
}

/// One record's outcomes for a scatter plot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutcomePoint {
    pub year: Option<i32>,
    pub state: Option<String>,
    pub location: Option<String>,
    pub species: Option<String>,
    pub illnesses: u64,
    pub hospitalizations: u64,
    pub fatalities: u64,
}

/// Every named view for one filtered view.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardViews {
    pub yearly_trend: Vec<YearTotal>,
    pub yearly_outcomes: Vec<OutcomeCount>,
    pub location_breakdown: Vec<CategoryTotal>,
    pub state_map: Vec<StateValue>,
    pub top_pathogens: Vec<CategoryTotal>,
    pub top_foods: Vec<CategoryTotal>,
    pub pathogen_severity: Vec<SeverityRate>,
    pub pathogen_fatalities: Vec<CategoryTotal>,
    pub monthly_by_year: MonthlyMatrix,
    pub monthly_average: Vec<MonthlyAverage>,
    pub outcome_points: Vec<OutcomePoint>,
}

// ── AggregationEngine ─────────────────────────────────────────────────────────

/// Computes the dashboard views. `top_n` bounds every ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregationEngine {
    top_n: usize,
}

impl Default for AggregationEngine {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_N)
    }
}

impl AggregationEngine {
    pub fn new(top_n: usize) -> Self {
        Self { top_n }
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }

    /// Compute every view sequentially.
    pub fn compute_all(&self, records: &[OutbreakRecord]) -> DashboardViews {
        DashboardViews {
            yearly_trend: self.yearly_trend(records),
            yearly_outcomes: self.yearly_outcomes(records),
            location_breakdown: self.location_breakdown(records),
            state_map: self.state_map(records),
            top_pathogens: self.top_pathogens(records),
            top_foods: self.top_foods(records),
            pathogen_severity: self.pathogen_severity(records),
            pathogen_fatalities: self.pathogen_fatalities(records),
            monthly_by_year: self.monthly_by_year(records),
            monthly_average: self.monthly_average(records),
            outcome_points: self.outcome_points(records),
        }
    }

    /// Illnesses per year, ascending by year.
    pub fn yearly_trend(&self, records: &[OutbreakRecord]) -> Vec<YearTotal> {
        sum_by(records, |r| r.year, |r| r.illnesses)
            .into_iter()
            .map(|(year, illnesses)| YearTotal { year, illnesses })
            .collect()
    }

    /// Illness, hospitalization and fatality sums per year in long form:
    /// all illness rows first, then hospitalizations, then fatalities, each
    /// ascending by year.
    pub fn yearly_outcomes(&self, records: &[OutbreakRecord]) -> Vec<OutcomeCount> {
        let mut totals: BTreeMap<i32, [u64; 3]> = BTreeMap::new();
        for record in records {
            let Some(year) = record.year else { continue };
            let entry = totals.entry(year).or_default();
            for (slot, kind) in entry.iter_mut().zip(OutcomeKind::ALL) {
                *slot = slot.saturating_add(kind.count(record).unwrap_or(0));
            }
        }

        OutcomeKind::ALL
            .into_iter()
            .enumerate()
            .flat_map(|(i, kind)| {
                totals.iter().map(move |(&year, counts)| OutcomeCount {
                    year,
                    kind,
                    count: counts[i],
                })
            })
            .collect()
    }

    /// Illnesses per exposure location, descending.
    pub fn location_breakdown(&self, records: &[OutbreakRecord]) -> Vec<CategoryTotal> {
        rank_descending(
            sum_by(records, |r| r.location.clone(), |r| r.illnesses),
            None,
        )
    }

    /// Illnesses per state joined with postal codes; states without a code
    /// are left out.
    pub fn state_map(&self, records: &[OutbreakRecord]) -> Vec<StateValue> {
        sum_by(records, |r| r.state.clone(), |r| r.illnesses)
            .into_iter()
            .filter_map(|(state, illnesses)| {
                let code = state_code(&state)?;
                Some(StateValue {
                    state,
                    code,
                    illnesses,
                })
            })
            .collect()
    }

    /// The `top_n` pathogens by illnesses.
    pub fn top_pathogens(&self, records: &[OutbreakRecord]) -> Vec<CategoryTotal> {
        rank_descending(
            sum_by(records, |r| label(&r.species), |r| r.illnesses),
            Some(self.top_n),
        )
    }

    /// The `top_n` foods by illnesses.
    pub fn top_foods(&self, records: &[OutbreakRecord]) -> Vec<CategoryTotal> {
        rank_descending(
            sum_by(records, |r| label(&r.food), |r| r.illnesses),
            Some(self.top_n),
        )
    }

    /// The `top_n` pathogens by hospitalization rate.
    ///
    /// Only records reporting both illnesses and hospitalizations count.
    /// Pathogens whose illness sum is zero have no defined rate and are left
    /// out before ranking.
    pub fn pathogen_severity(&self, records: &[OutbreakRecord]) -> Vec<SeverityRate> {
        let mut sums: BTreeMap<String, (u64, u64)> = BTreeMap::new();
        for record in records {
            let (Some(species), Some(ill), Some(hosp)) =
                (label(&record.species), record.illnesses, record.hospitalizations)
            else {
                continue;
            };
            let entry = sums.entry(species).or_default();
            entry.0 = entry.0.saturating_add(ill);
            entry.1 = entry.1.saturating_add(hosp);
        }

        let mut rates: Vec<SeverityRate> = sums
            .into_iter()
            .filter(|(_, (ill, _))| *ill > 0)
            .map(|(species, (illnesses, hospitalizations))| SeverityRate {
                species,
                illnesses,
                hospitalizations,
                rate: hospitalizations as f64 / illnesses as f64 * 100.0,
            })
            .collect();

        rates.sort_by(|a, b| b.rate.total_cmp(&a.rate));
        rates.truncate(self.top_n);
        rates
    }

    /// The `top_n` pathogens by fatalities.
    pub fn pathogen_fatalities(&self, records: &[OutbreakRecord]) -> Vec<CategoryTotal> {
        rank_descending(
            sum_by(records, |r| label(&r.species), |r| r.fatalities),
            Some(self.top_n),
        )
    }

    /// Month × year illness sums over records with a month and an illness
    /// count.
    pub fn monthly_by_year(&self, records: &[OutbreakRecord]) -> MonthlyMatrix {
        let mut cells: BTreeMap<(Month, i32), u64> = BTreeMap::new();
        for record in records {
            let (Some(year), Some(month), Some(ill)) = (record.year, record.month, record.illnesses)
            else {
                continue;
            };
            let cell = cells.entry((month, year)).or_insert(0);
            *cell = cell.saturating_add(ill);
        }

        let mut years: Vec<i32> = cells.keys().map(|(_, y)| *y).collect();
        years.sort_unstable();
        years.dedup();

        let mut rows: Vec<MonthlyRow> = Vec::new();
        for (&(month, year), &total) in &cells {
            if rows.last().map(|r| r.month) != Some(month) {
                rows.push(MonthlyRow {
                    month,
                    values: vec![None; years.len()],
                });
            }
            let col = years.partition_point(|y| *y < year);
            if let Some(row) = rows.last_mut() {
                row.values[col] = Some(total);
            }
        }

        MonthlyMatrix { years, rows }
    }

    /// Mean illnesses per outbreak for each calendar month, January first.
    /// Empty when no record has both a month and an illness count.
    pub fn monthly_average(&self, records: &[OutbreakRecord]) -> Vec<MonthlyAverage> {
        let mut sums = [(0u64, 0u64); 12];
        let mut any = false;
        for record in records {
            let (Some(month), Some(ill)) = (record.month, record.illnesses) else {
                continue;
            };
            let slot = &mut sums[month.index()];
            slot.0 = slot.0.saturating_add(ill);
            slot.1 += 1;
            any = true;
        }
        if !any {
            return Vec::new();
        }

        Month::ALL
            .into_iter()
            .map(|month| {
                let (sum, count) = sums[month.index()];
                MonthlyAverage {
                    month,
                    mean: (count > 0).then(|| sum as f64 / count as f64),
                }
            })
            .collect()
    }

    /// Scatter points for records reporting all three outcomes.
    pub fn outcome_points(&self, records: &[OutbreakRecord]) -> Vec<OutcomePoint> {
        records
            .iter()
            .filter_map(|r| {
                Some(OutcomePoint {
                    year: r.year,
                    state: r.state.clone(),
                    location: r.location.clone(),
                    species: r.species.clone(),
                    illnesses: r.illnesses?,
                    hospitalizations: r.hospitalizations?,
                    fatalities: r.fatalities?,
                })
            })
            .collect()
    }
}

// ── Private helpers ───────────────────────────────────────────────────────────

/// A categorical value usable as a ranking key.
fn label(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !is_sentinel_null(v)).cloned()
}

/// Group by `key` (records with no key are skipped) and sum `value`,
/// treating a missing value as contributing nothing. Sums saturate.
fn sum_by<K: Ord>(
    records: &[OutbreakRecord],
    key: impl Fn(&OutbreakRecord) -> Option<K>,
    value: impl Fn(&OutbreakRecord) -> Option<u64>,
) -> BTreeMap<K, u64> {
    let mut groups: BTreeMap<K, u64> = BTreeMap::new();
    for record in records {
        if let Some(k) = key(record) {
            let total = groups.entry(k).or_insert(0);
            *total = total.saturating_add(value(record).unwrap_or(0));
        }
    }
    groups
}

/// Stable descending sort of grouped totals, optionally truncated.
fn rank_descending(groups: BTreeMap<String, u64>, limit: Option<usize>) -> Vec<CategoryTotal> {
    let mut ranked: Vec<CategoryTotal> = groups
        .into_iter()
        .map(|(label, total)| CategoryTotal { label, total })
        .collect();
    ranked.sort_by(|a, b| b.total.cmp(&a.total));
    if let Some(n) = limit {
        ranked.truncate(n);
    }
    ranked
}

// ── Tests ─────────────────────────────────────────────────────────────────────
