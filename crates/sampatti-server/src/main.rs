//! Sampatti Server Binary
//!
//! Runs the emergency-access HTTP API.

use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

use sampatti_core::OsCodeSource;
use sampatti_server::{create_router, AppConfig, AppState, MemoryStore, TracingAdvisory, VaultStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::from_env()?;

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .with_target(true)
        .with_thread_ids(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let store = open_store(&config).await?;
    let codec = config.token_codec()?;
    let secrets = Arc::new(config.secret_verifier()?);

    info!(
        port = config.port,
        access_ttl_minutes = config.jwt.access_ttl_minutes,
        persistent = config.database_url.is_some(),
        "Starting Sampatti server"
    );

    let state = Arc::new(AppState::new(
        store,
        codec,
        secrets,
        Arc::new(OsCodeSource),
        Arc::new(TracingAdvisory),
    ));

    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(addr = %addr, "Sampatti listening");

    // Peer address is the fallback for access-log IPs
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

#[cfg(feature = "postgres")]
async fn open_store(config: &AppConfig) -> Result<Arc<dyn VaultStore>, Box<dyn Error>> {
    match &config.database_url {
        Some(url) => Ok(Arc::new(sampatti_server::storage::PostgresStore::new(url).await?)),
        None => {
            info!("DATABASE_URL not set, using in-memory storage");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

#[cfg(not(feature = "postgres"))]
async fn open_store(config: &AppConfig) -> Result<Arc<dyn VaultStore>, Box<dyn Error>> {
    if config.database_url.is_some() {
        tracing::warn!("DATABASE_URL ignored: built without the postgres feature");
    }
    Ok(Arc::new(MemoryStore::new()))
}
