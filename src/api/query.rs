use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::models::{QueryRequest, QueryResponse, SourceInfo};
use crate::state::AppState;

use super::map_retrieval_error;

/// POST /api/query - Hybrid retrieval, or vendor-scoped vector retrieval
/// when a vendor filter is present.
///
/// An empty result list is a valid success (nothing relevant indexed); only
/// genuine backend failures produce error statuses.
pub async fn query(
    State(state): State<AppState>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, (StatusCode, String)> {
    let question = req.question.trim().to_string();
    if question.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Question is required".to_string()));
    }
    let top_k = req.top_k.clamp(1, 50);

    let started = std::time::Instant::now();
    let session_id = req
        .session_id
        .unwrap_or_else(|| state.sessions.create_session());

    let (chunks, sources): (Vec<String>, Vec<SourceInfo>) = match req.vendor.as_deref() {
        Some(vendor) => {
            let hits = state
                .engine
                .vendor_query(&question, vendor, top_k)
                .await
                .map_err(map_retrieval_error)?;
            hits.into_iter()
                .map(|h| {
                    let source = SourceInfo {
                        vendor: h.metadata.vendor,
                        document: h.metadata.document,
                        page: h.metadata.page,
                        chunk: h.metadata.chunk_index,
                        // Report similarity so larger is better, as with
                        // fused scores.
                        score: 1.0 - h.distance,
                    };
                    (h.text, source)
                })
                .unzip()
        }
        None => {
            let hits = state
                .engine
                .hybrid_query(&question, top_k)
                .await
                .map_err(map_retrieval_error)?;
            hits.into_iter()
                .map(|h| {
                    let source = SourceInfo {
                        vendor: h.metadata.vendor,
                        document: h.metadata.document,
                        page: h.metadata.page,
                        chunk: h.metadata.chunk_index,
                        score: h.combined_score,
                    };
                    (h.text, source)
                })
                .unzip()
        }
    };

    state.sessions.add_message(&session_id, "user", &question);
    state.sessions.track_query(&question, started.elapsed());

    Ok(Json(QueryResponse {
        chunks,
        sources,
        session_id,
    }))
}
