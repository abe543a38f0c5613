//! Raw data preview and per-column descriptive statistics.

use std::collections::HashMap;

use outbreak_core::models::{Column, OutbreakTable, RawTable};
use serde::Serialize;

/// Summary statistics for one column.
///
/// Numeric columns fill the moment and quantile fields; text columns fill
/// `unique`, `top` and `freq`. `count` is the number of non-null cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub unique: Option<usize>,
    pub top: Option<String>,
    pub freq: Option<usize>,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

impl ColumnSummary {
    pub fn is_numeric(&self) -> bool {
        self.unique.is_none()
    }
}

/// The first `n` records of `table` as untyped rows.
pub fn preview(table: &OutbreakTable, n: usize) -> RawTable {
    let head = table.records().iter().take(n).cloned().collect();
    table.with_records(head).to_raw()
}

/// Describe every retained column of `table`, in column order.
pub fn describe(table: &OutbreakTable) -> Vec<ColumnSummary> {
    table
        .columns()
        .iter()
        .map(|column| match column {
            Column::Known(field) if field.is_numeric() => {
                let values: Vec<f64> = table
                    .records()
                    .iter()
                    .filter_map(|r| r.number(*field))
                    .collect();
                describe_numeric(column.name(), values)
            }
            _ => {
                let values: Vec<String> = table
                    .records()
                    .iter()
                    .filter_map(|r| table.cell(r, column))
                    .collect();
                describe_text(column.name(), &values)
            }
        })
        .collect()
}

/// `p`-th percentile of a sorted slice with linear interpolation between
/// closest ranks. `None` for an empty slice.
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let rank = (p / 100.0) * last as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Some(sorted[lo] + frac * (sorted[hi] - sorted[lo]))
}

fn describe_numeric(name: &str, mut values: Vec<f64>) -> ColumnSummary {
    values.sort_by(f64::total_cmp);
    let count = values.len();
    let mean = (count > 0).then(|| values.iter().sum::<f64>() / count as f64);
    // Sample standard deviation; undefined below two observations.
    let std = mean.filter(|_| count > 1).map(|m| {
        let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
        (ss / (count - 1) as f64).sqrt()
    });

    ColumnSummary {
        column: name.to_string(),
        count,
        mean,
        std,
        min: values.first().copied(),
        q25: percentile(&values, 25.0),
        median: percentile(&values, 50.0),
        q75: percentile(&values, 75.0),
        max: values.last().copied(),
        ..Default::default()
    }
}

fn describe_text(name: &str, values: &[String]) -> ColumnSummary {
    // (count, first position) per value; ties for `top` go to the earliest.
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (pos, value) in values.iter().enumerate() {
        counts.entry(value.as_str()).or_insert((0, pos)).0 += 1;
    }
    let top = counts
        .iter()
        .max_by(|a, b| a.1 .0.cmp(&b.1 .0).then(b.1 .1.cmp(&a.1 .1)))
        .map(|(value, (freq, _))| (value.to_string(), *freq));

    ColumnSummary {
        column: name.to_string(),
        count: values.len(),
        unique: Some(counts.len()),
        top: top.as_ref().map(|(v, _)| v.clone()),
        freq: top.map(|(_, f)| f),
        ..Default::default()
    }
}
