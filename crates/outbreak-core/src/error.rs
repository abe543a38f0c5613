use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the outbreak dashboard.
#[derive(Error, Debug)]
pub enum OutbreakError {
    /// A local source file could not be opened or read.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A remote source could not be fetched.
    #[error("Failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },

    /// The source was reachable but is not readable as a CSV table.
    #[error("Source is not a readable table: {0}")]
    Unparsable(String),

    /// The CSV header lacks one or more required columns.
    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// A filter selection was constructed with reversed year bounds.
    #[error("Invalid selection: year_min {year_min} is greater than year_max {year_max}")]
    InvalidSelection { year_min: i32, year_max: i32 },

    /// A JSON document could not be parsed or written.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl OutbreakError {
    /// `true` for the fatal class of errors raised while loading the source
    /// table (unreachable, unparsable, or missing required columns).
    pub fn is_ingestion_failure(&self) -> bool {
        matches!(
            self,
            Self::FileRead { .. } | Self::Fetch { .. } | Self::Unparsable(_) | Self::MissingColumns(_)
        )
    }
}

/// Convenience alias used throughout the outbreak crates.
pub type Result<T> = std::result::Result<T, OutbreakError>;
