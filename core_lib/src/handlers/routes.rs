//! Route table for the document upload API

use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};

use super::{documents, health::handle_health};
use crate::{models::ApiResponse, AppState};

pub fn create_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handle_health))
        .route("/api/uploads/policy", get(documents::upload_policy))
        .route(
            "/api/documents",
            get(documents::list_documents).post(documents::upload_document),
        )
        .route("/api/uploads/validate", post(documents::validate_document))
        .route(
            "/api/documents/:id",
            get(documents::get_document).delete(documents::delete_document),
        )
        .route("/api/documents/:id/download", get(documents::download_document))
        .route("/api/documents/:id/status", put(documents::update_document_status))
        .fallback(handle_not_found)
}

async fn handle_not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::<()>::error("Route not found".to_string())),
    )
}
