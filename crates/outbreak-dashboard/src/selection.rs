//! Turn command-line filter arguments into a [`FilterSelection`].

use outbreak_core::settings::Settings;
use outbreak_data::cleaner::{normalize_label, MIN_YEAR};
use outbreak_data::filter::{FilterOptions, FilterSelection};

/// Build the selection for this run.
///
/// Omitted arguments select everything available. Requested labels are
/// normalised the way the cleaner normalises the data, so `--state ohio`
/// matches `Ohio`.
pub fn build_selection(
    settings: &Settings,
    options: &FilterOptions,
) -> outbreak_core::Result<FilterSelection> {
    let (first, last) = options.year_range().unwrap_or((MIN_YEAR, MIN_YEAR));
    FilterSelection::new(
        settings.year_min.unwrap_or(first),
        settings.year_max.unwrap_or(last),
        pick("state", &settings.states, &options.states),
        pick("species", &settings.species, &options.species),
        pick("location", &settings.locations, &options.locations),
    )
}

fn pick(kind: &str, requested: &[String], available: &[String]) -> Vec<String> {
    if requested.is_empty() {
        return available.to_vec();
    }
    requested
        .iter()
        .filter_map(|value| {
            let label = normalize_label(value)?;
            if !available.contains(&label) {
                tracing::warn!(kind, value = %label, "requested value not present in the data");
            }
            Some(label)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn options() -> FilterOptions {
        FilterOptions {
            years: vec![1998, 2004, 2015],
            states: vec!["California".into(), "Ohio".into()],
            species: vec!["Norovirus".into(), "Salmonella".into()],
            locations: vec!["Restaurant".into()],
        }
    }

    fn settings(args: &[&str]) -> Settings {
        let mut argv = vec!["outbreak-dashboard"];
        argv.extend_from_slice(args);
        Settings::parse_from(argv)
    }

    #[test]
    fn test_defaults_select_everything() {
        let selection = build_selection(&settings(&[]), &options()).unwrap();
        assert_eq!(selection.year_min(), 1998);
        assert_eq!(selection.year_max(), 2015);
        assert_eq!(selection.states().len(), 2);
        assert_eq!(selection.species().len(), 2);
        assert_eq!(selection.locations().len(), 1);
    }

    #[test]
    fn test_requested_labels_are_normalised() {
        let selection = build_selection(
            &settings(&["--state", " ohio ", "--species", "SALMONELLA", "--year-min", "2000"]),
            &options(),
        )
        .unwrap();
        assert_eq!(selection.year_min(), 2000);
        assert!(selection.states().contains("Ohio"));
        assert_eq!(selection.states().len(), 1);
        assert!(selection.species().contains("Salmonella"));
    }

    #[test]
    fn test_sentinel_request_selects_nothing() {
        let selection = build_selection(&settings(&["--location", "Unk"]), &options()).unwrap();
        assert!(selection.locations().is_empty());
    }

    #[test]
    fn test_reversed_years_are_rejected() {
        let err = build_selection(
            &settings(&["--year-min", "2010", "--year-max", "2000"]),
            &options(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            outbreak_core::OutbreakError::InvalidSelection { .. }
        ));
    }

    #[test]
    fn test_empty_options_fall_back_to_min_year() {
        let selection = build_selection(&settings(&[]), &FilterOptions::default()).unwrap();
        assert_eq!(selection.year_min(), MIN_YEAR);
        assert!(selection.states().is_empty());
    }
}
