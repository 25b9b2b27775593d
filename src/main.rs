use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::Result;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use pictor::domain::query::{PageSize, QueryState};
use pictor::infrastructure::{
    AppConfig, CatalogHttpClient, CliArgs, DesktopNotifier, StorageManager,
};
use pictor::presentation::App;

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    if let Some(log_path) = config.effective_log_path() {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();

        info!(path = %log_path.display(), "Logging initialized");
    } else {
        tracing_subscriber::registry().with(filter).init();
    }

    Ok(())
}

fn create_app() -> Result<App> {
    let cli = CliArgs::parse();

    let storage = StorageManager::new().ok();
    let config = storage
        .as_ref()
        .and_then(|s| s.load_config(cli.config.as_deref()).ok())
        .unwrap_or_default()
        .merge_cli(&cli);

    init_logging(&config)?;
    info!(version = pictor::VERSION, server = %config.server_url, "Starting Pictor");

    let client = Arc::new(CatalogHttpClient::new(
        config.server_url.as_str(),
        config.session_cookie.clone(),
    )?);
    let notifier = Arc::new(DesktopNotifier::new(config.enable_desktop_notifications));

    // Restore the last browsing location, then apply the configured size.
    let mut initial = storage
        .as_ref()
        .and_then(|s| s.load_view_state().ok())
        .and_then(|state| state.last_location)
        .map_or_else(QueryState::list, |location| QueryState::from_location(&location));
    if let Some(size) = config.page_size {
        initial = initial.with_page_size(PageSize::snap(size));
    }

    Ok(App::new(
        client.clone(),
        client,
        notifier,
        storage,
        initial,
        cli.files,
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();

    let app = create_app()?;

    let mut terminal = ratatui::init();

    let result = app.run(&mut terminal).await;

    ratatui::restore();

    result
}
