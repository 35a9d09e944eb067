//! mrv-dash - Movie review dashboard service
//!
//! Serves read-only JSON views over the review ingestion backend: source
//! rankings, movie and source browsing, workflow history and lineage, and
//! per-movie digests.

use anyhow::Result;
use clap::Parser;
use mrv_common::config::{self, CliOverrides, DashConfig};
use mrv_common::gateway::RestGateway;
use mrv_common::storage::RestObjectStore;
use mrv_dash::preferences::{DisplayPreferences, MemoryPreferenceStore, PreferenceStore, Theme, TomlPreferenceStore};
use mrv_dash::{build_router, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "mrv-dash", version, about = "Movie review dashboard service")]
struct Args {
    /// Backend base URL
    #[arg(long, env = config::ENV_BACKEND_URL)]
    backend_url: Option<String>,

    /// Backend API key
    #[arg(long, env = config::ENV_BACKEND_KEY, hide_env_values = true)]
    backend_key: Option<String>,

    /// Object storage bucket holding digest documents
    #[arg(long, env = config::ENV_STORAGE_BUCKET)]
    bucket: Option<String>,

    /// HTTP port
    #[arg(long, env = config::ENV_PORT)]
    port: Option<u16>,

    /// Config file path
    #[arg(long, env = config::ENV_CONFIG)]
    config: Option<PathBuf>,

    /// Theme used when no preference has been saved
    #[arg(long, default_value = "light")]
    system_theme: Theme,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Build identification first, before any backend traffic
    info!(
        "Starting mrv-dash v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();
    let overrides = CliOverrides {
        backend_url: args.backend_url,
        backend_key: args.backend_key,
        storage_bucket: args.bucket,
        port: args.port,
        config_path: args.config,
    };
    let config = DashConfig::resolve(&overrides)?;
    info!("Backend: {}", config.backend_url);
    info!("Storage bucket: {}", config.storage_bucket);

    let gateway = RestGateway::new(&config.backend_url, &config.backend_key)?;
    let store = RestObjectStore::new(&config.backend_url, &config.backend_key, &config.storage_bucket)?;

    let preference_store: Arc<dyn PreferenceStore> = match config::preferences_path() {
        Some(path) => {
            info!("Preferences: {}", path.display());
            Arc::new(TomlPreferenceStore::new(path))
        }
        None => {
            warn!("No config directory available; preferences will not persist");
            Arc::new(MemoryPreferenceStore::new())
        }
    };

    let state = AppState::new(Arc::new(gateway), Arc::new(store))
        .with_workflows(config.workflows.clone())
        .with_digest_naming(config.digests.clone())
        .with_preferences(DisplayPreferences::new(preference_store, args.system_theme));
    let app = build_router(state);

    let addr = format!("127.0.0.1:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("mrv-dash listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
