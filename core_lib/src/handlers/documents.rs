use axum::{
    body::Bytes,
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    files::{allow_list, Document, DocumentListQuery, DocumentUpload, ProcessingStatus, RejectionReason},
    models::ApiResponse,
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct DocumentUploadQuery {
    pub user_id: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct DocumentUploadResponse {
    pub success: bool,
    pub document_id: String,
    pub message: String,
    pub document: Document,
}

#[derive(Debug, Serialize)]
pub struct DocumentListResponse {
    pub documents: Vec<Document>,
    pub total: u64,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct ValidationReport {
    pub accepted: bool,
    pub reason: Option<RejectionReason>,
    pub message: String,
    pub mime_type: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: ProcessingStatus,
}

#[derive(Debug, Serialize)]
pub struct AllowedType {
    pub mime_type: &'static str,
    pub extension: &'static str,
}

#[derive(Debug, Serialize)]
pub struct UploadPolicy {
    pub max_file_size_bytes: u64,
    pub max_filename_length: usize,
    pub allowed_types: Vec<AllowedType>,
}

struct UploadedFile {
    filename: String,
    content_type: Option<String>,
    data: Bytes,
}

/// Pulls the `file` field out of the form, skipping anything else.
async fn read_file_field(multipart: &mut Multipart) -> Result<Option<UploadedFile>> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        AppError::BadRequest(format!("Failed to read multipart field: {}", e))
    })? {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .ok_or_else(|| AppError::BadRequest("Missing filename".to_string()))?
            .to_string();

        let content_type = field.content_type().map(str::to_string);

        let data = field.bytes().await.map_err(|e| {
            AppError::BadRequest(format!("Failed to read file data: {}", e))
        })?;

        return Ok(Some(UploadedFile {
            filename,
            content_type,
            data,
        }));
    }

    Ok(None)
}

pub async fn upload_document(
    State(state): State<AppState>,
    Query(query): Query<DocumentUploadQuery>,
    mut multipart: Multipart,
) -> Result<Json<DocumentUploadResponse>> {
    let file = read_file_field(&mut multipart)
        .await?
        .ok_or_else(|| AppError::BadRequest("No file provided".to_string()))?;

    let upload = DocumentUpload {
        original_filename: file.filename,
        content_type_hint: file.content_type,
        data: file.data.to_vec(),
        user_id: query.user_id.unwrap_or(0),
    };

    let document = state.documents.store_document(upload).await?;

    Ok(Json(DocumentUploadResponse {
        success: true,
        document_id: document.id.to_string(),
        message: "Document uploaded successfully. Please send parsed data to complete profile."
            .to_string(),
        document,
    }))
}

/// Dry run: reports the validator's verdict without storing the file.
pub async fn validate_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ValidationReport>> {
    let file = read_file_field(&mut multipart)
        .await?
        .ok_or_else(|| AppError::BadRequest("No file provided".to_string()))?;

    let report = match state.documents.check_upload(
        &file.filename,
        file.content_type.as_deref(),
        &file.data,
    ) {
        Ok(accepted) => ValidationReport {
            accepted: true,
            reason: None,
            message: "File accepted".to_string(),
            mime_type: Some(accepted.mime_type),
        },
        Err(e) => {
            info!(filename = %file.filename, reason = %e.reason(), "Dry-run upload rejected");
            ValidationReport {
                accepted: false,
                reason: Some(e.reason()),
                message: e.to_string(),
                mime_type: None,
            }
        }
    };

    Ok(Json(report))
}

pub async fn upload_policy(State(state): State<AppState>) -> impl IntoResponse {
    let limits = state.documents.validator().config();

    let allowed_types = allow_list::ALLOWED_FILE_TYPES
        .iter()
        .map(|&(mime_type, extension)| AllowedType {
            mime_type,
            extension,
        })
        .collect();

    Json(ApiResponse::success(UploadPolicy {
        max_file_size_bytes: limits.max_file_size,
        max_filename_length: limits.max_filename_length,
        allowed_types,
    }))
}

pub async fn list_documents(
    State(state): State<AppState>,
    Query(query): Query<DocumentListQuery>,
) -> Result<Json<DocumentListResponse>> {
    let documents = state.documents.list_documents(&query).await?;
    let total = state.documents.count_documents(&query).await?;

    Ok(Json(DocumentListResponse {
        documents,
        total,
        limit: query.limit,
        offset: query.offset,
    }))
}

pub async fn get_document(
    State(state): State<AppState>,
    Path(document_id): Path<Uuid>,
) -> Result<Json<Document>> {
    let document = state
        .documents
        .get_document(document_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Document not found".to_string()))?;

    Ok(Json(document))
}

pub async fn download_document(
    State(state): State<AppState>,
    Path(document_id): Path<Uuid>,
) -> Result<Response> {
    let (document, data) = state
        .documents
        .get_document_data(document_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Document not found".to_string()))?;

    let mut headers = HeaderMap::new();

    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&document.content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );

    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(data.len()));

    // Original names may hold characters a header cannot carry.
    let disposition = format!(
        "attachment; filename=\"{}\"",
        document.original_filename.replace('"', "\\\"")
    );
    let fallback = format!("attachment; filename=\"{}\"", document.filename);
    let disposition = HeaderValue::from_str(&disposition)
        .or_else(|_| HeaderValue::from_str(&fallback))
        .map_err(|_| AppError::InternalServerError)?;
    headers.insert(header::CONTENT_DISPOSITION, disposition);

    Ok((StatusCode::OK, headers, data).into_response())
}

pub async fn update_document_status(
    State(state): State<AppState>,
    Path(document_id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<ApiResponse<Document>>> {
    let document = state
        .documents
        .update_status(document_id, request.status)
        .await?;

    info!(document_id = %document.id, status = ?document.processing_status, "Document status updated");

    Ok(Json(ApiResponse::success(document)))
}

pub async fn delete_document(
    State(state): State<AppState>,
    Path(document_id): Path<Uuid>,
) -> Result<StatusCode> {
    state.documents.delete_document(document_id).await?;

    info!(document_id = %document_id, "Document deleted");

    Ok(StatusCode::NO_CONTENT)
}
