use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use benthic_api::clock::SystemClock;
use benthic_api::config::Config;
use benthic_api::db::create_pool;
use benthic_api::routes::build_router;
use benthic_api::state::AppState;
use benthic_api::store::PgStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("benthic_api={}", &config.rust_log))),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting benthic-api v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL and the aggregate store
    let db = create_pool(&config.database_url).await?;
    let store = Arc::new(PgStore::new(db));

    // Build app state
    let state = AppState {
        store,
        clock: Arc::new(SystemClock),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
