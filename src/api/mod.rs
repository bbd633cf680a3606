pub mod admin;
pub mod documents;
pub mod query;

use axum::http::StatusCode;

use crate::error::RetrievalError;

/// Map core errors to HTTP responses, preserving the original message for
/// diagnostics. A backend failure must stay distinguishable from an empty
/// "no match" result, so nothing here degrades an error into a 200.
pub(crate) fn map_retrieval_error(err: RetrievalError) -> (StatusCode, String) {
    let status = match &err {
        RetrievalError::NotFound { .. } => StatusCode::NOT_FOUND,
        RetrievalError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}
