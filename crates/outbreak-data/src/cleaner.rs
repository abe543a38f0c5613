//! Cleaning pipeline: raw CSV rows → canonical outbreak table.
//!
//! The steps run in a fixed order:
//!
//! 1. the literal `"None"` (and empty cells) become null in every column;
//! 2. columns that are null in every row are dropped;
//! 3. `Year`, `Illnesses`, `Hospitalizations`, `Fatalities` are coerced to
//!    numbers, with unparsable text becoming null;
//! 4. categorical text is trimmed and title-cased, sentinel nulls removed;
//! 5. exact duplicate rows are collapsed (first occurrence kept);
//! 6. rows without a positive outcome count are dropped;
//! 7. rows before [`MIN_YEAR`] (or without a year) are dropped.
//!
//! A final pass prunes any column left without a single value, so that
//! cleaning a cleaned table is a no-op.

use std::collections::HashSet;

use outbreak_core::models::{Column, Field, Month, OutbreakRecord, OutbreakTable, RawTable};
use serde::Serialize;
use tracing::{debug, info};

/// Earliest outbreak year kept in the canonical table.
pub const MIN_YEAR: i32 = 1980;

/// Textual placeholders that mean "no value" in categorical columns.
pub const SENTINEL_NULLS: [&str; 5] = ["None", "NaN", "Unspecified", "Unk", ""];

// ── CleaningReport ────────────────────────────────────────────────────────────

/// Row and column counts observed while cleaning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleaningReport {
    pub input_rows: usize,
    /// Headers removed because no row carried a value for them.
    pub dropped_columns: Vec<String>,
    /// Non-empty cells that could not be coerced to their column's type.
    pub coercion_failures: usize,
    pub duplicates_removed: usize,
    pub without_outcome_removed: usize,
    pub before_min_year_removed: usize,
    pub output_rows: usize,
}

// ── Text helpers ──────────────────────────────────────────────────────────────

/// `true` when `text` is a sentinel null (case-insensitive, whitespace-trimmed).
pub fn is_sentinel_null(text: &str) -> bool {
    let trimmed = text.trim();
    SENTINEL_NULLS
        .iter()
        .any(|s| s.eq_ignore_ascii_case(trimmed))
}

/// Upper-case the first letter of every run of letters and lower-case the rest.
///
/// ```
/// use outbreak_data::cleaner::title_case;
///
/// assert_eq!(title_case("private home/residence"), "Private Home/Residence");
/// assert_eq!(title_case("E. COLI"), "E. Coli");
/// ```
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

/// Trim and title-case a categorical label; sentinel nulls become `None`.
pub fn normalize_label(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if is_sentinel_null(trimmed) {
        None
    } else {
        Some(title_case(trimmed))
    }
}

/// Parse a non-negative whole number from arbitrary text.
///
/// Accepts integer or decimal/exponent spellings with a zero fractional part
/// (`"12"`, `" 12.0 "`, `"1e2"`). Anything else is `None`.
pub fn coerce_count(text: &str) -> Option<u64> {
    let trimmed = text.trim();
    if let Ok(n) = trimmed.parse::<u64>() {
        return Some(n);
    }
    let value = trimmed.parse::<f64>().ok()?;
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value < u64::MAX as f64 {
        Some(value as u64)
    } else {
        None
    }
}

/// Parse a calendar year from arbitrary text, with the same leniency as
/// [`coerce_count`].
pub fn coerce_year(text: &str) -> Option<i32> {
    let trimmed = text.trim();
    if let Ok(n) = trimmed.parse::<i32>() {
        return Some(n);
    }
    let value = trimmed.parse::<f64>().ok()?;
    if value.is_finite()
        && value.fract() == 0.0
        && value >= f64::from(i32::MIN)
        && value <= f64::from(i32::MAX)
    {
        Some(value as i32)
    } else {
        None
    }
}

// ── Pipeline ──────────────────────────────────────────────────────────────────

/// Clean `raw` into the canonical table.
///
/// Malformed cells never fail; they become null. A required column absent
/// from `raw` is treated as null in every row (the reader rejects such
/// sources before they get here).
pub fn clean(raw: &RawTable) -> OutbreakTable {
    clean_with_report(raw).0
}

/// Same as [`clean`], also returning the per-step counts.
pub fn clean_with_report(raw: &RawTable) -> (OutbreakTable, CleaningReport) {
    let mut report = CleaningReport {
        input_rows: raw.len(),
        ..Default::default()
    };

    // Step 1: sentinel "None" → null.
    let rows: Vec<Vec<Option<&str>>> = raw
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| cell.as_deref().filter(|s| *s != "None" && !s.is_empty()))
                .collect()
        })
        .collect();

    // Step 2: drop all-null columns.
    let mut kept: Vec<(usize, Column)> = Vec::new();
    for (idx, header) in raw.columns.iter().enumerate() {
        if !rows.iter().any(|row| row.get(idx).copied().flatten().is_some()) {
            report.dropped_columns.push(header.clone());
            continue;
        }
        let column = match Field::from_header(header) {
            Some(field) if !kept.iter().any(|(_, c)| *c == Column::Known(field)) => {
                Column::Known(field)
            }
            _ => Column::Extra(header.clone()),
        };
        kept.push((idx, column));
    }

    // Steps 3 and 4: typed records.
    let mut records: Vec<OutbreakRecord> = rows
        .iter()
        .map(|row| build_record(row, &kept, &mut report.coercion_failures))
        .collect();

    // Step 5: exact duplicates.
    let mut seen: HashSet<OutbreakRecord> = HashSet::with_capacity(records.len());
    let before = records.len();
    records.retain(|r| seen.insert(r.clone()));
    report.duplicates_removed = before - records.len();

    // Step 6: positive outcome.
    let before = records.len();
    records.retain(OutbreakRecord::has_positive_outcome);
    report.without_outcome_removed = before - records.len();

    // Step 7: year floor.
    let before = records.len();
    records.retain(|r| r.year.is_some_and(|y| y >= MIN_YEAR));
    report.before_min_year_removed = before - records.len();

    let columns: Vec<Column> = kept.into_iter().map(|(_, c)| c).collect();
    let table = prune_empty_columns(columns, records, &mut report.dropped_columns);
    report.output_rows = table.len();

    debug!(?report, "cleaning steps complete");
    info!(
        input_rows = report.input_rows,
        output_rows = report.output_rows,
        "canonical table built"
    );

    (table, report)
}

/// Coerce one raw row into a record using the retained column mapping.
fn build_record(
    row: &[Option<&str>],
    kept: &[(usize, Column)],
    failures: &mut usize,
) -> OutbreakRecord {
    let mut record = OutbreakRecord::default();
    for (idx, column) in kept {
        let cell = row.get(*idx).copied().flatten();
        match column {
            Column::Extra(_) => record.extra.push(cell.map(str::to_string)),
            Column::Known(field) => {
                let Some(text) = cell else { continue };
                let parsed = assign_field(&mut record, *field, text);
                if !parsed && !is_sentinel_null(text) {
                    *failures += 1;
                }
            }
        }
    }
    record
}

/// Store `text` into `field` of `record`. Returns `false` when the value was
/// discarded as null.
fn assign_field(record: &mut OutbreakRecord, field: Field, text: &str) -> bool {
    match field {
        Field::Year => {
            record.year = coerce_year(text);
            record.year.is_some()
        }
        Field::Month => {
            record.month = Month::parse(text);
            record.month.is_some()
        }
        Field::Illnesses => {
            record.illnesses = coerce_count(text);
            record.illnesses.is_some()
        }
        Field::Hospitalizations => {
            record.hospitalizations = coerce_count(text);
            record.hospitalizations.is_some()
        }
        Field::Fatalities => {
            record.fatalities = coerce_count(text);
            record.fatalities.is_some()
        }
        Field::State => set_label(&mut record.state, text),
        Field::Location => set_label(&mut record.location, text),
        Field::Food => set_label(&mut record.food, text),
        Field::Ingredient => set_label(&mut record.ingredient, text),
        Field::Species => set_label(&mut record.species, text),
    }
}

fn set_label(slot: &mut Option<String>, text: &str) -> bool {
    *slot = normalize_label(text);
    slot.is_some()
}

/// Drop columns that no surviving record has a value for.
fn prune_empty_columns(
    columns: Vec<Column>,
    mut records: Vec<OutbreakRecord>,
    dropped: &mut Vec<String>,
) -> OutbreakTable {
    let probe = OutbreakTable::new(columns.clone(), Vec::new());
    let mut keep_columns = Vec::with_capacity(columns.len());
    let mut keep_extra = Vec::new();
    let mut extra_idx = 0usize;

    for column in columns {
        let has_value = records.iter().any(|r| probe.cell(r, &column).is_some());
        if let Column::Extra(_) = column {
            if has_value {
                keep_extra.push(extra_idx);
            }
            extra_idx += 1;
        }
        if has_value {
            keep_columns.push(column);
        } else {
            dropped.push(column.name().to_string());
        }
    }

    if keep_extra.len() != extra_idx {
        for record in &mut records {
            let extra = std::mem::take(&mut record.extra);
            record.extra = keep_extra
                .iter()
                .map(|&i| extra.get(i).cloned().flatten())
                .collect();
        }
    }

    OutbreakTable::new(keep_columns, records)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const COLUMNS: [&str; 10] = [
        "Year",
        "Month",
        "State",
        "Location",
        "Food",
        "Ingredient",
        "Species",
        "Illnesses",
        "Hospitalizations",
        "Fatalities",
    ];

    fn raw(rows: &[[&str; 10]]) -> RawTable {
        let mut table = RawTable::new(COLUMNS.iter().map(|c| c.to_string()).collect());
        for row in rows {
            table.push_row(
                row.iter()
                    .map(|c| if c.is_empty() { None } else { Some(c.to_string()) })
                    .collect(),
            );
        }
        table
    }

    // ── text helpers ──────────────────────────────────────────────────────────

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("california"), "California");
        assert_eq!(title_case("NEW YORK"), "New York");
        assert_eq!(title_case("salmonella enterica"), "Salmonella Enterica");
        assert_eq!(title_case("o'brien's deli"), "O'Brien'S Deli");
        assert_eq!(title_case("3rd street"), "3Rd Street");
    }

    #[test]
    fn test_title_case_is_idempotent() {
        for text in ["Restaurant; Private Home", "e. coli o157:h7", "Fast-food"] {
            let once = title_case(text);
            assert_eq!(title_case(&once), once);
        }
    }

    #[test]
    fn test_sentinel_nulls() {
        for text in ["None", "nan", "UNSPECIFIED", " unk ", "", "   "] {
            assert!(is_sentinel_null(text), "{text:?} should be a sentinel");
            assert_eq!(normalize_label(text), None);
        }
        assert!(!is_sentinel_null("Unknown"));
        assert_eq!(normalize_label("  california "), Some("California".to_string()));
    }

    #[test]
    fn test_coerce_count() {
        assert_eq!(coerce_count("12"), Some(12));
        assert_eq!(coerce_count(" 7 "), Some(7));
        assert_eq!(coerce_count("12.0"), Some(12));
        assert_eq!(coerce_count("1e2"), Some(100));
        assert_eq!(coerce_count("2.5"), None);
        assert_eq!(coerce_count("-3"), None);
        assert_eq!(coerce_count("many"), None);
        assert_eq!(coerce_count("inf"), None);
        assert_eq!(coerce_count("NaN"), None);
    }

    #[test]
    fn test_coerce_year() {
        assert_eq!(coerce_year("2005"), Some(2005));
        assert_eq!(coerce_year("2005.0"), Some(2005));
        assert_eq!(coerce_year("20O5"), None);
    }

    // ── pipeline ──────────────────────────────────────────────────────────────

    #[test]
    fn test_clean_drops_rows_without_positive_outcome() {
        let table = clean(&raw(&[
            ["2005", "May", "Ohio", "Restaurant", "", "", "Salmonella", "0", "0", "0"],
            ["2005", "May", "Ohio", "Restaurant", "", "", "Norovirus", "4", "0", "0"],
            ["2005", "May", "Ohio", "Restaurant", "", "", "Listeria", "", "", ""],
        ]));
        assert_eq!(table.len(), 1);
        assert_eq!(table.records()[0].species.as_deref(), Some("Norovirus"));
    }

    #[test]
    fn test_clean_null_outcomes_do_not_remove_row_by_themselves() {
        let table = clean(&raw(&[[
            "2005", "May", "Ohio", "Restaurant", "", "", "Listeria", "", "2", "",
        ]]));
        assert_eq!(table.len(), 1);
        assert_eq!(table.records()[0].illnesses, None);
        assert_eq!(table.records()[0].hospitalizations, Some(2));
    }

    #[test]
    fn test_clean_year_floor() {
        let table = clean(&raw(&[
            ["1979", "May", "Ohio", "Home", "", "", "Salmonella", "4", "0", "0"],
            ["1980", "May", "Ohio", "Home", "", "", "Salmonella", "4", "0", "0"],
            ["", "May", "Ohio", "Home", "", "", "Salmonella", "5", "0", "0"],
            ["year?", "May", "Ohio", "Home", "", "", "Salmonella", "6", "0", "0"],
        ]));
        assert_eq!(table.len(), 1);
        assert_eq!(table.records()[0].year, Some(1980));
    }

    #[test]
    fn test_clean_coercion_precedes_outcome_filter() {
        // Text counts must be parsed before positivity is checked.
        let table = clean(&raw(&[
            ["2010", "June", "Texas", "Home", "", "", "Salmonella", " 15 ", "0", "0"],
            ["2010", "June", "Texas", "Home", "", "", "Norovirus", "lots", "0", "0"],
        ]));
        assert_eq!(table.len(), 1);
        assert_eq!(table.records()[0].illnesses, Some(15));
    }

    #[test]
    fn test_clean_normalizes_and_deduplicates() {
        let (table, report) = clean_with_report(&raw(&[
            ["2001", "July", "california ", "restaurant", "", "", "salmonella", "3", "1", "0"],
            ["2001", "July", "  CALIFORNIA", "Restaurant", "", "", "Salmonella", "3", "1", "0"],
            ["2001", "July", "California", "Restaurant", "", "", "Salmonella", "4", "1", "0"],
        ]));
        assert_eq!(report.duplicates_removed, 1);
        assert_eq!(table.len(), 2);
        assert!(table
            .records()
            .iter()
            .all(|r| r.state.as_deref() == Some("California")));
    }

    #[test]
    fn test_clean_sentinel_text_becomes_null() {
        let table = clean(&raw(&[[
            "2001", "July", "Unk", "None", "NaN", "Unspecified", "Norovirus", "3", "1", "0",
        ]]));
        let record = &table.records()[0];
        assert_eq!(record.state, None);
        assert_eq!(record.location, None);
        assert_eq!(record.food, None);
        assert_eq!(record.ingredient, None);
    }

    #[test]
    fn test_clean_drops_all_null_columns() {
        let (table, report) = clean_with_report(&raw(&[
            ["2001", "July", "Ohio", "Home", "", "", "Norovirus", "3", "1", "0"],
            ["2002", "July", "Ohio", "Home", "", "None", "Norovirus", "3", "1", "0"],
        ]));
        assert!(report.dropped_columns.contains(&"Food".to_string()));
        assert!(report.dropped_columns.contains(&"Ingredient".to_string()));
        assert!(!table.has_field(Field::Food));
        assert!(table.has_field(Field::Species));
    }

    #[test]
    fn test_clean_prunes_columns_emptied_by_row_filters() {
        // Ingredient only appears on a row removed by the year floor.
        let table = clean(&raw(&[
            ["1975", "July", "Ohio", "Home", "", "Eggs", "Norovirus", "3", "1", "0"],
            ["2002", "July", "Ohio", "Home", "", "", "Norovirus", "3", "1", "0"],
        ]));
        assert!(!table.has_field(Field::Ingredient));
    }

    #[test]
    fn test_clean_extra_columns_participate_in_dedup() {
        let mut table = RawTable::new(
            COLUMNS
                .iter()
                .map(|c| c.to_string())
                .chain(["Status".to_string(), "Notes".to_string()])
                .collect(),
        );
        let base: Vec<Option<String>> = ["2001", "July", "Ohio", "Home", "Eggs", "", "Norovirus", "3", "1", "0"]
            .iter()
            .map(|c| if c.is_empty() { None } else { Some(c.to_string()) })
            .collect();
        for status in ["Confirmed", "Suspected", "Confirmed"] {
            let mut row = base.clone();
            row.push(Some(status.to_string()));
            row.push(None);
            table.push_row(row);
        }

        let cleaned = clean(&table);
        assert_eq!(cleaned.len(), 2);
        assert_eq!(cleaned.extra_columns(), ["Status".to_string()]);
        assert_eq!(cleaned.records()[1].extra, vec![Some("Suspected".to_string())]);
    }

    #[test]
    fn test_clean_unparsable_month_becomes_null() {
        let (table, report) = clean_with_report(&raw(&[
            ["2001", "Julember", "Ohio", "Home", "", "", "Norovirus", "3", "1", "0"],
            ["2001", "aug", "Ohio", "Home", "", "", "Norovirus", "3", "1", "0"],
        ]));
        assert_eq!(table.records()[0].month, None);
        assert_eq!(table.records()[1].month, Some(Month::August));
        assert_eq!(report.coercion_failures, 1);
    }

    #[test]
    fn test_clean_is_idempotent() {
        let once = clean(&raw(&[
            ["2001", "July", "california", "restaurant", "Eggs", "", "salmonella", "3", "1", "0"],
            ["2001", "July", "California", "Restaurant", "Eggs", "", "Salmonella", "3", "1", "0"],
            ["1999", "", "Unk", "Home", "", "", "Norovirus", "12.0", "", "1"],
            ["1970", "May", "Ohio", "Home", "", "", "Norovirus", "3", "1", "0"],
            ["2010", "Smarch", "Texas", "Unspecified", "Fish", "", "", "0", "0", "2"],
        ]));
        let twice = clean(&once.to_raw());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_clean_invariants_hold() {
        let table = clean(&raw(&[
            ["2001", "July", "Ohio", "Home", "", "", "Norovirus", "3", "1", "0"],
            ["2001", "July", "Ohio", "Home", "", "", "Norovirus", "3", "1", "0"],
            ["1960", "July", "Ohio", "Home", "", "", "Norovirus", "3", "1", "0"],
            ["2003", "July", "Ohio", "Home", "", "", "Norovirus", "0", "", "0"],
            ["2004", "July", "Ohio", "Home", "", "", "Norovirus", "", "", "1"],
        ]));
        let unique: HashSet<&OutbreakRecord> = table.records().iter().collect();
        assert_eq!(unique.len(), table.len());
        for record in table.records() {
            assert!(record.year.unwrap() >= MIN_YEAR);
            assert!(record.has_positive_outcome());
        }
    }

    #[test]
    fn test_clean_tolerates_absent_columns() {
        let mut table = RawTable::new(vec!["Year".into(), "Illnesses".into()]);
        table.push_row(vec![Some("2001".into()), Some("4".into())]);
        let cleaned = clean(&table);
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned.records()[0].illnesses, Some(4));
        assert_eq!(cleaned.records()[0].species, None);
        assert!(!cleaned.has_field(Field::Species));
    }
}
