//! Campus Market Server
//!
//! REST JSON server for the student textbook and notes marketplace.

use std::net::SocketAddr;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use campus_market::{api, config::LoggingConfig, repository::Repository, AppConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = init_tracing(&config.logging);

    tracing::info!("Starting Campus Market v{}", env!("CARGO_PKG_VERSION"));

    let repository = Repository::connect(&config.database)
        .await
        .context("Failed to open the listing store")?;

    tokio::fs::create_dir_all(&config.media.root)
        .await
        .with_context(|| format!("Failed to create media root {}", config.media.root.display()))?;

    // Save server address before moving config
    let addr = SocketAddr::new(
        config
            .server
            .host
            .parse()
            .with_context(|| format!("Invalid host address {}", config.server.host))?,
        config.server.port,
    );

    let state = AppState::new(config, repository);
    let app = api::create_router(state);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Console logging in `pretty` or `json` format, plus an optional daily rolling file
fn init_tracing(logging: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("campus_market={},tower_http=debug", logging.level).into());

    let (json, pretty) = if logging.format.eq_ignore_ascii_case("json") {
        (Some(fmt::layer().json()), None)
    } else {
        (None, Some(fmt::layer()))
    };

    let (file, guard) = match logging.directory {
        Some(ref directory) => {
            let appender = tracing_appender::rolling::daily(directory, "campus-market.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(pretty)
        .with(file)
        .init();

    guard
}
