//! Plain-text and JSON rendering of dashboard views.
//!
//! Text output is a titled, column-aligned table per view. Widths are measured
//! in terminal cells with `unicode-width` so labels with wide characters
//! still line up.

use outbreak_core::formatting::{format_count, format_optional, format_percent, NO_VALUE};
use outbreak_data::aggregator::CategoryTotal;
use outbreak_data::filter::FilterOptions;
use outbreak_runtime::orchestrator::DashboardSnapshot;
use serde_json::{Map, Value};
use unicode_width::UnicodeWidthStr;

/// Line printed in place of a table with no rows.
pub const NO_DATA: &str = "no data";

/// Views in the order `all` prints them.
pub const ALL_VIEWS: [&str; 13] = [
    "summary",
    "options",
    "yearly",
    "outcomes",
    "locations",
    "states",
    "pathogens",
    "foods",
    "severity",
    "fatalities",
    "monthly",
    "monthly-average",
    "scatter",
];

// ── TextTable ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

/// A simple aligned table.
#[derive(Debug, Clone)]
pub struct TextTable {
    headers: Vec<String>,
    align: Vec<Align>,
    rows: Vec<Vec<String>>,
}

impl TextTable {
    /// `align` gives each column's alignment; missing entries align left.
    pub fn new(headers: &[&str], align: &[Align]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            align: (0..headers.len())
                .map(|i| align.get(i).copied().unwrap_or(Align::Left))
                .collect(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn render(&self) -> String {
        if self.rows.is_empty() {
            return format!("{NO_DATA}\n");
        }

        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.width()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate().take(widths.len()) {
                widths[i] = widths[i].max(cell.width());
            }
        }

        let mut out = String::new();
        self.render_line(&mut out, &self.headers, &widths);
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        out.push_str(rule.join("  ").trim_end());
        out.push('\n');
        for row in &self.rows {
            self.render_line(&mut out, row, &widths);
        }
        out
    }

    fn render_line(&self, out: &mut String, cells: &[String], widths: &[usize]) {
        let mut line = String::new();
        for (i, width) in widths.iter().enumerate() {
            let cell = cells.get(i).map(String::as_str).unwrap_or("");
            let pad = " ".repeat(width.saturating_sub(cell.width()));
            if i > 0 {
                line.push_str("  ");
            }
            match self.align[i] {
                Align::Left => {
                    line.push_str(cell);
                    line.push_str(&pad);
                }
                Align::Right => {
                    line.push_str(&pad);
                    line.push_str(cell);
                }
            }
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
}

// ── Text rendering ────────────────────────────────────────────────────────────

/// Render `view` (or every view for `"all"`) as text.
pub fn render_text(view: &str, snapshot: &DashboardSnapshot, options: &FilterOptions) -> String {
    if view == "all" {
        return ALL_VIEWS
            .iter()
            .map(|v| render_text(v, snapshot, options))
            .collect::<Vec<_>>()
            .join("\n");
    }

    let views = &snapshot.views;
    let (title, body) = match view {
        "summary" => ("Summary", render_summary(snapshot)),
        "options" => ("Filter options", render_options(options)),
        "yearly" => {
            let mut t = TextTable::new(&["Year", "Illnesses"], &[Align::Left, Align::Right]);
            for row in &views.yearly_trend {
                t.push(vec![row.year.to_string(), format_count(row.illnesses)]);
            }
            ("Illnesses per year", t.render())
        }
        "outcomes" => {
            let mut t = TextTable::new(
                &["Year", "Outcome", "Count"],
                &[Align::Left, Align::Left, Align::Right],
            );
            for row in &views.yearly_outcomes {
                t.push(vec![
                    row.year.to_string(),
                    row.kind.label().to_string(),
                    format_count(row.count),
                ]);
            }
            ("Outcomes per year", t.render())
        }
        "locations" => (
            "Illnesses by exposure location",
            category_table("Location", "Illnesses", &views.location_breakdown),
        ),
        "states" => {
            let mut t = TextTable::new(
                &["State", "Code", "Illnesses"],
                &[Align::Left, Align::Left, Align::Right],
            );
            for row in &views.state_map {
                t.push(vec![
                    row.state.clone(),
                    row.code.to_string(),
                    format_count(row.illnesses),
                ]);
            }
            ("Illnesses by state", t.render())
        }
        "pathogens" => (
            "Top pathogens by illnesses",
            category_table("Species", "Illnesses", &views.top_pathogens),
        ),
        "foods" => (
            "Top foods by illnesses",
            category_table("Food", "Illnesses", &views.top_foods),
        ),
        "severity" => {
            let mut t = TextTable::new(
                &["Species", "Illnesses", "Hospitalizations", "Hospitalization rate"],
                &[Align::Left, Align::Right, Align::Right, Align::Right],
            );
            for row in &views.pathogen_severity {
                t.push(vec![
                    row.species.clone(),
                    format_count(row.illnesses),
                    format_count(row.hospitalizations),
                    format_percent(row.rate, 1),
                ]);
            }
            ("Pathogen severity", t.render())
        }
        "fatalities" => (
            "Top pathogens by fatalities",
            category_table("Species", "Fatalities", &views.pathogen_fatalities),
        ),
        "monthly" => ("Illnesses by month and year", render_monthly(snapshot)),
        "monthly-average" => {
            let mut t =
                TextTable::new(&["Month", "Mean illnesses"], &[Align::Left, Align::Right]);
            for row in &views.monthly_average {
                t.push(vec![row.month.to_string(), format_optional(row.mean, 1)]);
            }
            ("Average illnesses per outbreak by month", t.render())
        }
        "scatter" => {
            let mut t = TextTable::new(
                &[
                    "Year",
                    "State",
                    "Location",
                    "Species",
                    "Illnesses",
                    "Hospitalizations",
                    "Fatalities",
                ],
                &[
                    Align::Left,
                    Align::Left,
                    Align::Left,
                    Align::Left,
                    Align::Right,
                    Align::Right,
                    Align::Right,
                ],
            );
            for p in &views.outcome_points {
                t.push(vec![
                    p.year.map(|y| y.to_string()).unwrap_or_else(|| NO_VALUE.to_string()),
                    or_dash(&p.state),
                    or_dash(&p.location),
                    or_dash(&p.species),
                    format_count(p.illnesses),
                    format_count(p.hospitalizations),
                    format_count(p.fatalities),
                ]);
            }
            ("Outcomes per outbreak", t.render())
        }
        other => ("Unknown view", format!("no view named {other:?}\n")),
    };

    format!("== {title} ==\n{body}")
}

fn or_dash(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| NO_VALUE.to_string())
}

fn category_table(
    label: &str,
    value: &str,
    rows: &[CategoryTotal],
) -> String {
    let mut t = TextTable::new(&[label, value], &[Align::Left, Align::Right]);
    for row in rows {
        t.push(vec![row.label.clone(), format_count(row.total)]);
    }
    t.render()
}

fn render_monthly(snapshot: &DashboardSnapshot) -> String {
    let matrix = &snapshot.views.monthly_by_year;
    let year_headers: Vec<String> = matrix.years.iter().map(|y| y.to_string()).collect();
    let mut headers = vec!["Month"];
    headers.extend(year_headers.iter().map(String::as_str));
    let mut align = vec![Align::Left];
    align.extend(std::iter::repeat(Align::Right).take(matrix.years.len()));

    let mut t = TextTable::new(&headers, &align);
    for row in &matrix.rows {
        let mut cells = vec![row.month.to_string()];
        cells.extend(
            row.values
                .iter()
                .map(|v| v.map(format_count).unwrap_or_else(|| NO_VALUE.to_string())),
        );
        t.push(cells);
    }
    t.render()
}

fn render_summary(snapshot: &DashboardSnapshot) -> String {
    let meta = &snapshot.metadata;
    let mut out = format!(
        "{} outbreaks after cleaning ({} read), {} in selection\n\n",
        format_count(meta.canonical_rows as u64),
        format_count(meta.cleaning.input_rows as u64),
        format_count(meta.filtered_rows as u64),
    );

    let preview = &snapshot.preview;
    let headers: Vec<&str> = preview.columns.iter().map(String::as_str).collect();
    let mut head = TextTable::new(&headers, &[]);
    for row in &preview.rows {
        head.push(
            row.iter()
                .map(|c| c.clone().unwrap_or_else(|| NO_VALUE.to_string()))
                .collect(),
        );
    }
    out.push_str(&head.render());
    out.push('\n');

    let mut describe = TextTable::new(
        &[
            "Column", "Count", "Unique", "Top", "Freq", "Mean", "Std", "Min", "25%", "50%", "75%",
            "Max",
        ],
        &[
            Align::Left,
            Align::Right,
            Align::Right,
            Align::Left,
            Align::Right,
            Align::Right,
            Align::Right,
            Align::Right,
            Align::Right,
            Align::Right,
            Align::Right,
            Align::Right,
        ],
    );
    let count = |v: Option<usize>| {
        v.map(|n| format_count(n as u64))
            .unwrap_or_else(|| NO_VALUE.to_string())
    };
    for c in &snapshot.describe {
        describe.push(vec![
            c.column.clone(),
            format_count(c.count as u64),
            count(c.unique),
            or_dash(&c.top),
            count(c.freq),
            format_optional(c.mean, 2),
            format_optional(c.std, 2),
            format_optional(c.min, 0),
            format_optional(c.q25, 2),
            format_optional(c.median, 2),
            format_optional(c.q75, 2),
            format_optional(c.max, 0),
        ]);
    }
    out.push_str(&describe.render());
    out
}

fn render_options(options: &FilterOptions) -> String {
    let years = match options.year_range() {
        Some((first, last)) => format!("{first}-{last}"),
        None => NO_VALUE.to_string(),
    };
    let mut t = TextTable::new(&["Filter", "Choices", "Values"], &[Align::Left, Align::Right]);
    t.push(vec!["Years".into(), options.years.len().to_string(), years]);
    for (name, values) in [
        ("States", &options.states),
        ("Species", &options.species),
        ("Locations", &options.locations),
    ] {
        t.push(vec![name.into(), values.len().to_string(), values.join(", ")]);
    }
    t.render()
}

// ── JSON rendering ────────────────────────────────────────────────────────────

/// JSON value for `view`. `"all"` yields the whole snapshot plus filter
/// options.
pub fn render_json(
    view: &str,
    snapshot: &DashboardSnapshot,
    options: &FilterOptions,
) -> serde_json::Result<Value> {
    let views = &snapshot.views;
    let value = match view {
        "all" => object([
            ("options", serde_json::to_value(options)?),
            ("snapshot", serde_json::to_value(snapshot)?),
        ]),
        "summary" => object([
            ("metadata", serde_json::to_value(&snapshot.metadata)?),
            ("preview", serde_json::to_value(&snapshot.preview)?),
            ("describe", serde_json::to_value(&snapshot.describe)?),
        ]),
        "options" => serde_json::to_value(options)?,
        "yearly" => serde_json::to_value(&views.yearly_trend)?,
        "outcomes" => serde_json::to_value(&views.yearly_outcomes)?,
        "locations" => serde_json::to_value(&views.location_breakdown)?,
        "states" => serde_json::to_value(&views.state_map)?,
        "pathogens" => serde_json::to_value(&views.top_pathogens)?,
        "foods" => serde_json::to_value(&views.top_foods)?,
        "severity" => serde_json::to_value(&views.pathogen_severity)?,
        "fatalities" => serde_json::to_value(&views.pathogen_fatalities)?,
        "monthly" => serde_json::to_value(&views.monthly_by_year)?,
        "monthly-average" => serde_json::to_value(&views.monthly_average)?,
        "scatter" => serde_json::to_value(&views.outcome_points)?,
        _ => Value::Null,
    };
    Ok(value)
}

fn object<const N: usize>(entries: [(&str, Value); N]) -> Value {
    Value::Object(
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect::<Map<String, Value>>(),
    )
}

// ── Tests ─────────────────────────────────────────────────────────────────────
