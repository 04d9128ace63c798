//! # podsb-api -- Binary Entry Point
//!
//! Loads configuration from the environment, prepares the cache directory,
//! and starts the Axum HTTP server.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use podsb_api::state::{AppConfig, AppState};
use podsb_api::youtube::YoutubeExistenceChecker;
use podsb_cache::{AcquisitionService, CacheStore, FetchToolConfig, MediaCache, YtDlpPipeline};
use podsb_core::ServiceConfig;
use podsb_youtube::{YoutubeApiConfig, YoutubeClient};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

/// Serve sponsor-free YouTube audio for podcast apps.
#[derive(Debug, Parser)]
#[command(name = "podsb-api", version, about)]
struct Cli {
    /// Address to bind.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: IpAddr,

    /// Port to bind.
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,

    /// Log output format.
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let config = ServiceConfig::from_env().map_err(|e| {
        tracing::error!("Configuration failed: {e}");
        e
    })?;
    log_config(&config);

    let youtube = YoutubeClient::new(YoutubeApiConfig::from_service(&config)?)?;

    let store = CacheStore::from_config(&config);
    store.ensure_layout().await?;
    let swept = store.sweep_staging().await?;
    if swept > 0 {
        tracing::info!(count = swept, "removed leftover staging directories");
    }

    let pipeline = YtDlpPipeline::new(FetchToolConfig::from_service(&config));
    let cache = MediaCache::new(
        store,
        Arc::new(pipeline),
        config.categories_to_remove.clone(),
    );
    let acquisition =
        AcquisitionService::new(Arc::new(YoutubeExistenceChecker::new(youtube)), cache);
    let state = AppState::new(AppConfig::from_service(&config), acquisition);

    let app = podsb_api::app(state);

    let addr = SocketAddr::new(cli.host, cli.port);
    tracing::info!("podsb API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// `RUST_LOG` wins; otherwise `LOG_LEVEL`; otherwise `info`.
fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .ok()
        .or_else(|| {
            std::env::var("LOG_LEVEL")
                .ok()
                .filter(|level| !level.trim().is_empty())
                .and_then(|level| EnvFilter::try_new(level.trim().to_ascii_lowercase()).ok())
        })
        .unwrap_or_else(|| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn log_config(config: &ServiceConfig) {
    let configured = |set: bool| if set { "(configured)" } else { "" };
    tracing::info!("Loaded configuration:");
    tracing::info!("  - Data path: {}", config.data_path.display());
    tracing::info!("  - Categories to remove: {:?}", config.categories_to_remove);
    tracing::info!("  - Fetch tool: {}", config.ytdlp_path.display());
    tracing::info!("  - YouTube API: {}", config.youtube_api_url);
    tracing::info!(
        "  - YouTube key: {}",
        configured(!config.youtube_api_key.is_empty())
    );
    tracing::info!("  - Auth key: {}", configured(config.auth_key.is_some()));
    tracing::info!(
        "  - Allow query parameter auth: {}",
        config.allow_query_param_auth
    );
}
