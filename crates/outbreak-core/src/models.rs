use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ── Month ─────────────────────────────────────────────────────────────────────

/// Calendar month. Ordering follows the calendar, not the alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl Month {
    /// All twelve months in calendar order.
    pub const ALL: [Month; 12] = [
        Month::January,
        Month::February,
        Month::March,
        Month::April,
        Month::May,
        Month::June,
        Month::July,
        Month::August,
        Month::September,
        Month::October,
        Month::November,
        Month::December,
    ];

    /// Full English month name, e.g. `"January"`.
    pub fn name(self) -> &'static str {
        match self {
            Month::January => "January",
            Month::February => "February",
            Month::March => "March",
            Month::April => "April",
            Month::May => "May",
            Month::June => "June",
            Month::July => "July",
            Month::August => "August",
            Month::September => "September",
            Month::October => "October",
            Month::November => "November",
            Month::December => "December",
        }
    }

    /// Zero-based position in the calendar (January = 0).
    pub fn index(self) -> usize {
        self as usize
    }

    /// Parse a month from its full name or three-letter abbreviation,
    /// ignoring case and surrounding whitespace.
    pub fn parse(text: &str) -> Option<Month> {
        let needle = text.trim().to_lowercase();
        if needle.len() < 3 {
            return None;
        }
        Month::ALL.into_iter().find(|m| {
            let name = m.name().to_lowercase();
            name == needle || (needle.len() == 3 && name.starts_with(&needle))
        })
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Month {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Month::parse(s).ok_or_else(|| format!("unknown month: {s}"))
    }
}

// ── Field ─────────────────────────────────────────────────────────────────────

/// One of the required source columns of the outbreak CSV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    Year,
    Month,
    State,
    Location,
    Food,
    Ingredient,
    Species,
    Illnesses,
    Hospitalizations,
    Fatalities,
}

impl Field {
    /// Every column the source must provide.
    pub const REQUIRED: [Field; 10] = [
        Field::Year,
        Field::Month,
        Field::State,
        Field::Location,
        Field::Food,
        Field::Ingredient,
        Field::Species,
        Field::Illnesses,
        Field::Hospitalizations,
        Field::Fatalities,
    ];

    /// Columns coerced to numbers during cleaning.
    pub const NUMERIC: [Field; 4] = [
        Field::Year,
        Field::Illnesses,
        Field::Hospitalizations,
        Field::Fatalities,
    ];

    /// Canonical CSV header for this field.
    pub fn header(self) -> &'static str {
        match self {
            Field::Year => "Year",
            Field::Month => "Month",
            Field::State => "State",
            Field::Location => "Location",
            Field::Food => "Food",
            Field::Ingredient => "Ingredient",
            Field::Species => "Species",
            Field::Illnesses => "Illnesses",
            Field::Hospitalizations => "Hospitalizations",
            Field::Fatalities => "Fatalities",
        }
    }

    /// Match a CSV header to a field (case-insensitive, whitespace-trimmed).
    pub fn from_header(header: &str) -> Option<Field> {
        let header = header.trim();
        Field::REQUIRED
            .into_iter()
            .find(|f| f.header().eq_ignore_ascii_case(header))
    }

    pub fn is_numeric(self) -> bool {
        Field::NUMERIC.contains(&self)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

// ── Column ────────────────────────────────────────────────────────────────────

/// A column retained in a cleaned table: either a known field or an
/// additional pass-through column identified by its header.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Column {
    Known(Field),
    Extra(String),
}

impl Column {
    pub fn name(&self) -> &str {
        match self {
            Column::Known(field) => field.header(),
            Column::Extra(name) => name,
        }
    }
}

// ── RawTable ──────────────────────────────────────────────────────────────────

/// Untyped table as read from the source. `None` marks an empty cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row, padding or truncating it to the column count.
    pub fn push_row(&mut self, mut row: Vec<Option<String>>) {
        row.resize(self.columns.len(), None);
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Required fields with no matching header.
    pub fn missing_fields(&self) -> Vec<Field> {
        Field::REQUIRED
            .into_iter()
            .filter(|f| !self.columns.iter().any(|c| Field::from_header(c) == Some(*f)))
            .collect()
    }
}

// ── OutbreakRecord ────────────────────────────────────────────────────────────

/// One reported outbreak event after type coercion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutbreakRecord {
    pub year: Option<i32>,
    pub month: Option<Month>,
    pub state: Option<String>,
    pub location: Option<String>,
    pub food: Option<String>,
    pub ingredient: Option<String>,
    pub species: Option<String>,
    pub illnesses: Option<u64>,
    pub hospitalizations: Option<u64>,
    pub fatalities: Option<u64>,
    /// Values of the table's extra columns, in the table's column order.
    #[serde(default)]
    pub extra: Vec<Option<String>>,
}

impl OutbreakRecord {
    /// `true` when at least one outcome count is strictly positive.
    pub fn has_positive_outcome(&self) -> bool {
        [self.illnesses, self.hospitalizations, self.fatalities]
            .into_iter()
            .any(|v| v.is_some_and(|n| n > 0))
    }

    /// Text value of a categorical field; `None` for numeric fields.
    pub fn text(&self, field: Field) -> Option<&str> {
        let value = match field {
            Field::State => &self.state,
            Field::Location => &self.location,
            Field::Food => &self.food,
            Field::Ingredient => &self.ingredient,
            Field::Species => &self.species,
            _ => return None,
        };
        value.as_deref()
    }

    /// Outcome count of a count field; `None` for every other field.
    pub fn count(&self, field: Field) -> Option<u64> {
        match field {
            Field::Illnesses => self.illnesses,
            Field::Hospitalizations => self.hospitalizations,
            Field::Fatalities => self.fatalities,
            _ => None,
        }
    }

    /// Numeric value of a numeric field; `None` for text fields.
    pub fn number(&self, field: Field) -> Option<f64> {
        match field {
            Field::Year => self.year.map(f64::from),
            f => self.count(f).map(|n| n as f64),
        }
    }

    /// Render one field the way it would appear in a CSV cell.
    pub fn field_text(&self, field: Field) -> Option<String> {
        match field {
            Field::Month => self.month.map(|m| m.name().to_string()),
            Field::Year => self.year.map(|y| y.to_string()),
            f if f.is_numeric() => self.count(f).map(|n| n.to_string()),
            f => self.text(f).map(str::to_string),
        }
    }
}

// ── OutbreakTable ─────────────────────────────────────────────────────────────

/// A typed table of outbreak records with the schema that survived cleaning.
///
/// Produced once by the cleaning pipeline (the canonical table) and narrowed
/// by filter selections; never mutated after construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OutbreakTable {
    columns: Vec<Column>,
    extra_columns: Vec<String>,
    records: Vec<OutbreakRecord>,
}

impl OutbreakTable {
    /// Build a table. `extra_columns` must list the [`Column::Extra`] names of
    /// `columns` in order; each record's `extra` is aligned with it.
    pub fn new(columns: Vec<Column>, records: Vec<OutbreakRecord>) -> Self {
        let extra_columns = columns
            .iter()
            .filter_map(|c| match c {
                Column::Extra(name) => Some(name.clone()),
                Column::Known(_) => None,
            })
            .collect();
        Self {
            columns,
            extra_columns,
            records,
        }
    }

    /// A table with the same schema and a different set of records.
    pub fn with_records(&self, records: Vec<OutbreakRecord>) -> Self {
        Self {
            columns: self.columns.clone(),
            extra_columns: self.extra_columns.clone(),
            records,
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn extra_columns(&self) -> &[String] {
        &self.extra_columns
    }

    pub fn records(&self) -> &[OutbreakRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// `true` when `field` survived the empty-column drop.
    pub fn has_field(&self, field: Field) -> bool {
        self.columns.contains(&Column::Known(field))
    }

    /// Text of `column` for `record`, as it would appear in a CSV cell.
    pub fn cell(&self, record: &OutbreakRecord, column: &Column) -> Option<String> {
        match column {
            Column::Known(field) => record.field_text(*field),
            Column::Extra(name) => {
                let idx = self.extra_columns.iter().position(|c| c == name)?;
                record.extra.get(idx).cloned().flatten()
            }
        }
    }

    /// Serialise back into an untyped table with the retained columns.
    pub fn to_raw(&self) -> RawTable {
        let mut raw = RawTable::new(self.columns.iter().map(|c| c.name().to_string()).collect());
        for record in &self.records {
            let row = self.columns.iter().map(|c| self.cell(record, c)).collect();
            raw.push_row(row);
        }
        raw
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
