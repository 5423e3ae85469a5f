use anyhow::Result;
use dotenv::dotenv;
use pbp_extract_rust::config::ServiceConfig;
use pbp_extract_rust::run::run;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    info!("Starting play-by-play extraction...");

    let config = ServiceConfig::from_env();
    info!(
        "Roster: {} | Events: {} | Output: {}",
        config.roster_path.display(),
        config.events_path.display(),
        config.output_dir.display()
    );

    let summary = run(&config)?;

    info!(
        "Done in {}ms: {} games, {} actions, {} issues ({} not found, {} ambiguous, {} unparsed), {} stints, {} suggestions",
        (summary.finished_at - summary.started_at).num_milliseconds(),
        summary.games,
        summary.actions,
        summary.issues,
        summary.not_found,
        summary.ambiguous,
        summary.unparsed,
        summary.stints,
        summary.suggestions
    );
    Ok(())
}
