use axum::extract::State;
use axum::Json;

use crate::models::HealthResponse;
use crate::session::AnalyticsReport;
use crate::state::AppState;

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        chunk_count: state.store.len(),
        embedding_model: state.config.embedding.model.clone(),
    })
}

/// GET /api/analytics
pub async fn analytics(State(state): State<AppState>) -> Json<AnalyticsReport> {
    let total_documents = state.store.document_summaries().len();
    Json(state.sessions.analytics(total_documents))
}
