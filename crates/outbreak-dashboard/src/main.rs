mod bootstrap;
mod selection;
mod table_view;

use anyhow::{Context, Result};
use outbreak_core::settings::Settings;
use outbreak_data::aggregator::AggregationEngine;
use outbreak_runtime::data_manager::DataManager;
use outbreak_runtime::orchestrator::DashboardSession;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("Outbreak Dashboard v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        source = %settings.source,
        view = %settings.view,
        format = %settings.format,
        top_n = settings.top_n,
        "settings resolved"
    );

    let mut data_manager = DataManager::new(settings.source.clone());
    let loaded = data_manager
        .get_table(false)
        .await
        .with_context(|| format!("could not load outbreak data from {}", settings.source))?;

    let engine = AggregationEngine::new(settings.top_n as usize);
    let session = DashboardSession::open(loaded, engine, settings.preview_rows).await?;

    let selection = selection::build_selection(&settings, session.options())?;
    if settings.has_filters() {
        tracing::info!(
            year_min = selection.year_min(),
            year_max = selection.year_max(),
            states = selection.states().len(),
            species = selection.species().len(),
            locations = selection.locations().len(),
            "selection narrowed from the command line"
        );
    }

    let Some(snapshot) = session.refresh(&selection).await? else {
        // Only one refresh runs per invocation, so it is always current.
        anyhow::bail!("dashboard refresh was superseded");
    };

    match settings.format.as_str() {
        "json" => {
            let value = table_view::render_json(&settings.view, &snapshot, session.options())?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        _ => {
            print!(
                "{}",
                table_view::render_text(&settings.view, &snapshot, session.options())
            );
        }
    }

    Ok(())
}
