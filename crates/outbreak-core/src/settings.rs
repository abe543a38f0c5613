use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Public CSV of CDC-reported foodborne outbreaks used when no source is given.
pub const DEFAULT_SOURCE_URL: &str =
    "https://raw.githubusercontent.com/Aliidaher/Healthcare-Project/main/outbreaks.csv";

/// Default size of every top-N ranking.
pub const DEFAULT_TOP_N: u32 = 10;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Explore U.S. foodborne illness outbreak records
#[derive(Parser, Debug, Clone)]
#[command(
    name = "outbreak-dashboard",
    about = "Explore U.S. foodborne illness outbreak records",
    version
)]
pub struct Settings {
    /// CSV source: an http(s) URL or a local file path
    #[arg(long, default_value = DEFAULT_SOURCE_URL)]
    pub source: String,

    /// View to display
    #[arg(long, default_value = "all", value_parser = [
        "all", "summary", "options", "yearly", "outcomes", "locations", "states",
        "pathogens", "foods", "severity", "fatalities", "monthly", "monthly-average", "scatter",
    ])]
    pub view: String,

    /// Output format
    #[arg(long, default_value = "table", value_parser = ["table", "json"])]
    pub format: String,

    /// Number of rows kept by every top-N ranking (1-100)
    #[arg(long, default_value_t = DEFAULT_TOP_N, value_parser = clap::value_parser!(u32).range(1..=100))]
    pub top_n: u32,

    /// First year of the selection (defaults to the earliest available)
    #[arg(long)]
    pub year_min: Option<i32>,

    /// Last year of the selection (defaults to the latest available)
    #[arg(long)]
    pub year_max: Option<i32>,

    /// State to include (repeatable; defaults to all)
    #[arg(long = "state")]
    pub states: Vec<String>,

    /// Pathogen to include (repeatable; defaults to all)
    #[arg(long = "species")]
    pub species: Vec<String>,

    /// Exposure location to include (repeatable; defaults to all)
    #[arg(long = "location")]
    pub locations: Vec<String>,

    /// Rows shown in the raw data preview
    #[arg(long, default_value = "5")]
    pub preview_rows: usize,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.outbreak-dashboard/last_used.json`.
///
/// Filter arguments are not persisted; every run starts from the full
/// available selection unless narrowed on the command line.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_n: Option<u32>,
}

impl LastUsedParams {
    /// Default path to the persisted config file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &std::path::Path) -> PathBuf {
        base_dir.join(".outbreak-dashboard").join("last_used.json")
    }

    /// Load persisted params from an explicit path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load_from(path: &std::path::Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable last-used params");
            Self::default()
        })
    }

    /// Atomically write params to an explicit path.
    pub fn save_to(&self, path: &std::path::Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &std::path::Path) -> crate::Result<()> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit CLI
    /// value was provided, and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Same as [`Settings::load_with_last_used`] with explicit arguments and
    /// config path so tests can redirect to a temporary directory.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &std::path::Path,
    ) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            if let Err(e) = LastUsedParams::clear_at(config_path) {
                tracing::warn!(error = %e, "failed to clear last-used params");
            }
            return settings.resolved();
        }

        let last = LastUsedParams::load_from(config_path);

        // CLI always wins over persisted values.
        if !is_arg_explicitly_set(&matches, "source") {
            if let Some(v) = last.source {
                settings.source = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "view") {
            if let Some(v) = last.view {
                settings.view = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "format") {
            if let Some(v) = last.format {
                settings.format = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "top_n") {
            if let Some(v) = last.top_n.filter(|n| (1..=100).contains(n)) {
                settings.top_n = v;
            }
        }

        settings = settings.resolved();

        if let Err(e) = LastUsedParams::from(&settings).save_to(config_path) {
            tracing::warn!(error = %e, "failed to persist last-used params");
        }

        settings
    }

    /// Apply the `--debug` flag.
    fn resolved(mut self) -> Self {
        if self.debug {
            self.log_level = "DEBUG".to_string();
        }
        self
    }

    /// `true` when any filter argument narrows the default selection.
    pub fn has_filters(&self) -> bool {
        self.year_min.is_some()
            || self.year_max.is_some()
            || !self.states.is_empty()
            || !self.species.is_empty()
            || !self.locations.is_empty()
    }
}

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            source: Some(s.source.clone()),
            view: Some(s.view.clone()),
            format: Some(s.format.clone()),
            top_n: Some(s.top_n),
        }
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tmp_config_path(tmp: &TempDir) -> PathBuf {
        LastUsedParams::config_path_in(tmp.path())
    }

    #[test]
    fn test_last_used_params_save_load() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        let params = LastUsedParams {
            source: Some("/data/outbreaks.csv".to_string()),
            view: Some("severity".to_string()),
            format: Some("json".to_string()),
            top_n: Some(5),
        };
        params.save_to(&path).expect("save");

        let loaded = LastUsedParams::load_from(&path);
        assert_eq!(loaded.source.as_deref(), Some("/data/outbreaks.csv"));
        assert_eq!(loaded.view.as_deref(), Some("severity"));
        assert_eq!(loaded.format.as_deref(), Some("json"));
        assert_eq!(loaded.top_n, Some(5));
    }

    #[test]
    fn test_last_used_params_default_when_missing_or_corrupt() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        assert!(LastUsedParams::load_from(&path).view.is_none());

        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{not json").unwrap();
        assert!(LastUsedParams::load_from(&path).view.is_none());
    }

    #[test]
    fn test_last_used_params_clear() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        LastUsedParams::default().save_to(&path).expect("save");
        assert!(path.exists());

        LastUsedParams::clear_at(&path).expect("clear");
        assert!(!path.exists());
    }

    #[test]
    fn test_last_used_params_save_reports_io_error() {
        let tmp = TempDir::new().expect("tempdir");
        // A regular file where the config directory should be.
        let blocker = tmp.path().join(".outbreak-dashboard");
        std::fs::write(&blocker, "").unwrap();

        let err = LastUsedParams::default()
            .save_to(&tmp_config_path(&tmp))
            .unwrap_err();
        assert!(matches!(err, crate::OutbreakError::Io(_)));
    }

    #[test]
    fn test_settings_default_values() {
        let settings = Settings::parse_from(["outbreak-dashboard"]);

        assert_eq!(settings.source, DEFAULT_SOURCE_URL);
        assert_eq!(settings.view, "all");
        assert_eq!(settings.format, "table");
        assert_eq!(settings.top_n, 10);
        assert!(settings.year_min.is_none());
        assert!(settings.states.is_empty());
        assert_eq!(settings.preview_rows, 5);
        assert_eq!(settings.log_level, "INFO");
        assert!(!settings.has_filters());
    }

    #[test]
    fn test_settings_repeatable_filters() {
        let settings = Settings::parse_from([
            "outbreak-dashboard",
            "--state",
            "California",
            "--state",
            "Texas",
            "--species",
            "Salmonella Enterica",
            "--year-min",
            "2000",
        ]);
        assert_eq!(settings.states, vec!["California", "Texas"]);
        assert_eq!(settings.species, vec!["Salmonella Enterica"]);
        assert_eq!(settings.year_min, Some(2000));
        assert!(settings.has_filters());
    }

    #[test]
    fn test_settings_rejects_out_of_range_top_n() {
        let result = Settings::try_parse_from(["outbreak-dashboard", "--top-n", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_with_last_used_merges_persisted_view() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        LastUsedParams {
            view: Some("foods".to_string()),
            top_n: Some(3),
            ..Default::default()
        }
        .save_to(&config_path)
        .expect("save");

        let settings =
            Settings::load_with_last_used_impl(vec!["outbreak-dashboard".into()], &config_path);
        assert_eq!(settings.view, "foods");
        assert_eq!(settings.top_n, 3);
    }

    #[test]
    fn test_load_with_last_used_cli_overrides_persisted() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        LastUsedParams {
            view: Some("foods".to_string()),
            ..Default::default()
        }
        .save_to(&config_path)
        .expect("save");

        let settings = Settings::load_with_last_used_impl(
            vec!["outbreak-dashboard".into(), "--view".into(), "states".into()],
            &config_path,
        );
        assert_eq!(settings.view, "states");
    }

    #[test]
    fn test_load_with_last_used_clear_removes_file() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        LastUsedParams::default().save_to(&config_path).expect("save");

        Settings::load_with_last_used_impl(
            vec!["outbreak-dashboard".into(), "--clear".into()],
            &config_path,
        );
        assert!(!config_path.exists());
    }

    #[test]
    fn test_load_with_last_used_debug_overrides_log_level() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        let settings = Settings::load_with_last_used_impl(
            vec!["outbreak-dashboard".into(), "--debug".into()],
            &config_path,
        );
        assert_eq!(settings.log_level, "DEBUG");
    }

    #[test]
    fn test_load_with_last_used_does_not_persist_filters() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        Settings::load_with_last_used_impl(
            vec![
                "outbreak-dashboard".into(),
                "--state".into(),
                "Ohio".into(),
                "--format".into(),
                "json".into(),
            ],
            &config_path,
        );

        let content = std::fs::read_to_string(&config_path).expect("persisted");
        assert!(!content.contains("Ohio"));
        let loaded = LastUsedParams::load_from(&config_path);
        assert_eq!(loaded.format.as_deref(), Some("json"));
    }
}
