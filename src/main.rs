use axum::routing::{delete, get, post};
use axum::Router;
use tracing_subscriber::EnvFilter;

use doc_search::api;
use doc_search::config::Config;
use doc_search::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    tracing::info!("Data directory: {}", config.data_dir.display());
    tracing::info!(
        "Embedding provider: {} ({})",
        config.embedding.provider,
        config.embedding.base_url
    );

    let state = AppState::new(config.clone())?;
    tracing::info!("Chunk store loaded: {} chunks", state.store.len());

    let app = Router::new()
        .route("/api/query", post(api::query::query))
        .route("/api/documents", post(api::documents::ingest_document))
        .route("/api/documents", get(api::documents::list_documents))
        .route(
            "/api/documents/{vendor}/{document}",
            delete(api::documents::delete_document),
        )
        .route("/api/health", get(api::admin::health))
        .route("/api/analytics", get(api::admin::analytics))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
