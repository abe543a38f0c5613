//! Source loading for the outbreak CSV.
//!
//! Fetches the table from an http(s) URL or reads it from a local path and
//! parses it into an untyped [`RawTable`]. This is the only place the pipeline
//! performs I/O; it either yields the whole table or fails.

use std::io::Read;
use std::path::Path;

use outbreak_core::models::RawTable;
use outbreak_core::{OutbreakError, Result};
use tracing::{debug, info, warn};

/// Cell spellings the CSV reader treats as an empty cell.
const READ_NA_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-NaN", "-nan", "<NA>", "N/A", "NA", "NULL", "NaN", "n/a",
    "nan", "null",
];

// ── Public API ────────────────────────────────────────────────────────────────

/// `true` when `source` names a remote http(s) resource.
pub fn is_remote(source: &str) -> bool {
    let lower = source.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Load the raw outbreak table from a URL or a local file path.
///
/// # Errors
///
/// Returns an ingestion failure when the source cannot be reached, is not a
/// CSV table, or lacks any required column.
pub async fn load_raw_table(source: &str) -> Result<RawTable> {
    let bytes = if is_remote(source) {
        fetch_url(source.trim()).await?
    } else {
        read_file(Path::new(source)).await?
    };
    debug!(bytes = bytes.len(), source, "source downloaded");

    let table = parse_csv(bytes.as_slice())?;
    info!(rows = table.len(), columns = table.columns.len(), source, "raw table loaded");
    Ok(table)
}

/// Download `url` in a single GET request.
pub async fn fetch_url(url: &str) -> Result<Vec<u8>> {
    let fetch_error = |message: String| OutbreakError::Fetch {
        url: url.to_string(),
        message,
    };

    let response = reqwest::get(url)
        .await
        .map_err(|e| fetch_error(e.to_string()))?;
    let response = response
        .error_for_status()
        .map_err(|e| fetch_error(e.to_string()))?;
    let bytes = response
        .bytes()
        .await
        .map_err(|e| fetch_error(e.to_string()))?;
    Ok(bytes.to_vec())
}

/// Read a local source file.
pub async fn read_file(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .map_err(|source| OutbreakError::FileRead {
            path: path.to_path_buf(),
            source,
        })
}

/// Parse CSV text with a header row into a [`RawTable`].
///
/// Rows with fewer or more cells than the header are padded or truncated;
/// invalid UTF-8 is replaced rather than rejected.
pub fn parse_csv<R: Read>(input: R) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(input);

    let headers: Vec<String> = reader
        .byte_headers()
        .map_err(|e| OutbreakError::Unparsable(e.to_string()))?
        .iter()
        .map(|h| String::from_utf8_lossy(h).trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(OutbreakError::Unparsable(
            "CSV input contains no header row".to_string(),
        ));
    }

    let mut table = RawTable::new(headers);
    let missing = table.missing_fields();
    if !missing.is_empty() {
        return Err(OutbreakError::MissingColumns(
            missing.iter().map(|f| f.header().to_string()).collect(),
        ));
    }

    let mut ragged_rows = 0usize;
    for result in reader.byte_records() {
        let record = result.map_err(|e| OutbreakError::Unparsable(e.to_string()))?;
        if record.len() != table.columns.len() {
            ragged_rows += 1;
        }
        let row = record
            .iter()
            .map(|cell| {
                let text = String::from_utf8_lossy(cell);
                if READ_NA_VALUES.contains(&text.as_ref()) {
                    None
                } else {
                    Some(text.into_owned())
                }
            })
            .collect();
        table.push_row(row);
    }

    if ragged_rows > 0 {
        warn!(ragged_rows, "rows with a cell count different from the header");
    }

    Ok(table)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use outbreak_core::models::Field;

    fn field_index(table: &RawTable, field: Field) -> Option<usize> {
        table
            .columns
            .iter()
            .position(|c| Field::from_header(c) == Some(field))
    }

    const HEADER: &str =
        "Year,Month,State,Location,Food,Ingredient,Species,Serotype/Genotype,Status,Illnesses,Hospitalizations,Fatalities";

    fn sample_csv() -> String {
        format!(
            "{HEADER}\n\
             1998,January,California,Restaurant,Custard,,Salmonella enterica,Enteritidis,Confirmed,20,0,0\n\
             1998,January,California,,Fish,,Norovirus,,,112,0,\n"
        )
    }

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://example.org/outbreaks.csv"));
        assert!(is_remote("HTTP://example.org/outbreaks.csv"));
        assert!(!is_remote("/tmp/outbreaks.csv"));
        assert!(!is_remote("outbreaks.csv"));
    }

    #[test]
    fn test_parse_csv_basic() {
        let table = parse_csv(sample_csv().as_bytes()).unwrap();
        assert_eq!(table.columns.len(), 12);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0][0].as_deref(), Some("1998"));
        assert_eq!(table.rows[0][6].as_deref(), Some("Salmonella enterica"));
    }

    #[test]
    fn test_parse_csv_empty_cells_become_null() {
        let table = parse_csv(sample_csv().as_bytes()).unwrap();
        let location = field_index(&table, Field::Location).unwrap();
        let fatalities = field_index(&table, Field::Fatalities).unwrap();
        assert_eq!(table.rows[1][location], None);
        assert_eq!(table.rows[1][fatalities], None);
    }

    #[test]
    fn test_parse_csv_keeps_literal_none_for_cleaning() {
        let csv = format!("{HEADER}\n2001,May,Ohio,None,Eggs,,Unk,,,3,0,0\n");
        let table = parse_csv(csv.as_bytes()).unwrap();
        let location = field_index(&table, Field::Location).unwrap();
        assert_eq!(table.rows[0][location].as_deref(), Some("None"));
    }

    #[test]
    fn test_parse_csv_missing_columns() {
        let err = parse_csv("Year,State,Illnesses\n2000,Ohio,3\n".as_bytes()).unwrap_err();
        match err {
            OutbreakError::MissingColumns(cols) => {
                assert!(cols.contains(&"Species".to_string()));
                assert!(!cols.contains(&"Year".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_csv_empty_input() {
        let err = parse_csv("".as_bytes()).unwrap_err();
        assert!(err.is_ingestion_failure());
    }

    #[test]
    fn test_parse_csv_ragged_rows_are_padded() {
        let csv = format!("{HEADER}\n2001,May,Ohio\n");
        let table = parse_csv(csv.as_bytes()).unwrap();
        assert_eq!(table.rows[0].len(), 12);
        assert_eq!(table.rows[0][11], None);
    }

    #[test]
    fn test_parse_csv_header_case_and_bom() {
        let csv = "\u{feff}year,MONTH,state,location,food,ingredient,species,illnesses,hospitalizations,fatalities\n\
                   2001,May,Ohio,Home,Eggs,,Salmonella,3,0,0\n";
        let table = parse_csv(csv.as_bytes()).unwrap();
        assert_eq!(field_index(&table, Field::Year), Some(0));
        assert_eq!(table.len(), 1);
    }

    #[tokio::test]
    async fn test_load_raw_table_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("outbreaks.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "{}", sample_csv()).unwrap();

        let table = load_raw_table(path.to_str().unwrap()).await.unwrap();
        assert_eq!(table.len(), 2);
    }

    #[tokio::test]
    async fn test_load_raw_table_missing_file_is_ingestion_failure() {
        let err = load_raw_table("/tmp/does-not-exist-outbreaks-xyz.csv")
            .await
            .unwrap_err();
        assert!(matches!(err, OutbreakError::FileRead { .. }));
        assert!(err.is_ingestion_failure());
    }
}
