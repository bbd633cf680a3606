use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::models::{DeleteResponse, DocumentListResponse, IngestRequest, IngestResponse};
use crate::state::AppState;

use super::map_retrieval_error;

/// POST /api/documents - Ingest one document's pre-extracted page texts.
pub async fn ingest_document(
    State(state): State<AppState>,
    Json(req): Json<IngestRequest>,
) -> Result<(StatusCode, Json<IngestResponse>), (StatusCode, String)> {
    let vendor = req.vendor.trim().to_string();
    let document = req.document.trim().to_string();
    if vendor.is_empty() || document.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Vendor and document are required".to_string(),
        ));
    }

    let chunks_added = state
        .pipeline
        .ingest(&vendor, &document, &req.pages)
        .await
        .map_err(|e| {
            tracing::error!("Ingestion failed for {vendor}/{document}: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    Ok((
        StatusCode::CREATED,
        Json(IngestResponse {
            vendor,
            document,
            chunks_added,
            total_chunks: state.store.len(),
        }),
    ))
}

/// GET /api/documents - List indexed documents with chunk and page counts.
pub async fn list_documents(State(state): State<AppState>) -> Json<DocumentListResponse> {
    Json(DocumentListResponse {
        documents: state.store.document_summaries(),
        total_chunks: state.store.len(),
    })
}

/// DELETE /api/documents/{vendor}/{document} - Remove a document from the
/// index. All-or-nothing: either every chunk goes and the indices are
/// invalidated, or 404 with nothing removed.
pub async fn delete_document(
    State(state): State<AppState>,
    Path((vendor, document)): Path<(String, String)>,
) -> Result<Json<DeleteResponse>, (StatusCode, String)> {
    let chunks_removed = state
        .pipeline
        .delete_document(&vendor, &document)
        .map_err(map_retrieval_error)?;

    Ok(Json(DeleteResponse {
        vendor,
        document,
        chunks_removed,
        total_remaining: state.store.len(),
    }))
}
