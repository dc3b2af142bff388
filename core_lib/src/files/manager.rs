use chrono::{Datelike, Utc};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs as async_fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AppError, Result};
use super::models::{Document, DocumentListQuery, DocumentUpload, ProcessingStatus};
use super::repository::{DocumentRepository, DocumentRepositoryTrait};
use super::validation::{AcceptedUpload, FileValidationConfig, FileValidator, UploadCandidate, ValidationError};

#[derive(Debug, Clone)]
pub struct DocumentManagerConfig {
    pub storage_path: PathBuf,
    pub validation: FileValidationConfig,
    pub create_subdirectories: bool,
}

impl Default for DocumentManagerConfig {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from("uploads"),
            validation: FileValidationConfig::default(),
            create_subdirectories: true,
        }
    }
}

/// Validates uploads and stores accepted ones unchanged.
#[derive(Clone)]
pub struct DocumentManager {
    config: DocumentManagerConfig,
    repository: Arc<dyn DocumentRepositoryTrait>,
    validator: FileValidator,
}

impl DocumentManager {
    pub fn new(config: DocumentManagerConfig, repository: Arc<dyn DocumentRepositoryTrait>) -> Self {
        let validator = FileValidator::new(config.validation.clone());

        Self {
            config,
            repository,
            validator,
        }
    }

    pub fn in_memory(config: DocumentManagerConfig) -> Self {
        Self::new(config, Arc::new(DocumentRepository::new()))
    }

    pub fn validator(&self) -> &FileValidator {
        &self.validator
    }

    pub async fn initialize(&self) -> Result<()> {
        if !self.config.storage_path.exists() {
            async_fs::create_dir_all(&self.config.storage_path).await?;
        }
        Ok(())
    }

    /// Runs the validator without storing anything.
    pub fn check_upload(
        &self,
        filename: &str,
        content_type_hint: Option<&str>,
        data: &[u8],
    ) -> std::result::Result<AcceptedUpload, ValidationError> {
        let mut reader = Cursor::new(data);
        let mut candidate = UploadCandidate::from_reader(
            filename,
            data.len() as u64,
            &mut reader,
            self.validator.config().sample_size,
        )?;
        candidate.content_type_hint = content_type_hint.map(str::to_string);

        self.validator.validate(&candidate)
    }

    pub async fn store_document(&self, upload: DocumentUpload) -> Result<Document> {
        let accepted = match self.check_upload(
            &upload.original_filename,
            upload.content_type_hint.as_deref(),
            &upload.data,
        ) {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!(
                    filename = %upload.original_filename,
                    user_id = upload.user_id,
                    reason = %e.reason(),
                    "File validation failed: {}",
                    e
                );
                return Err(e.into());
            }
        };

        let document_id = Uuid::new_v4();
        let filename = format!("{}{}", document_id, accepted.extension);

        let storage_path = if self.config.create_subdirectories {
            let now = Utc::now();
            let subdir = format!("{}/{:02}", now.year(), now.month());
            let full_subdir = self.config.storage_path.join(&subdir);

            if !full_subdir.exists() {
                async_fs::create_dir_all(&full_subdir).await?;
            }

            full_subdir.join(&filename)
        } else {
            self.config.storage_path.join(&filename)
        };

        if let Err(e) = write_file(&storage_path, &upload.data).await {
            discard_file(&storage_path).await;
            return Err(e.into());
        }

        let record = Document {
            id: document_id,
            user_id: upload.user_id,
            filename,
            original_filename: upload.original_filename,
            content_type: accepted.mime_type.to_string(),
            size: upload.data.len() as u64,
            path: storage_path.to_string_lossy().to_string(),
            processing_status: ProcessingStatus::Uploaded,
            uploaded_at: Utc::now(),
            processed_at: None,
        };

        let stored = match self.repository.create(&record).await {
            Ok(stored) => stored,
            Err(e) => {
                discard_file(&storage_path).await;
                return Err(e);
            }
        };

        info!(
            document_id = %stored.id,
            user_id = stored.user_id,
            content_type = %stored.content_type,
            size = stored.size,
            "Document uploaded successfully"
        );

        Ok(stored)
    }

    pub async fn get_document(&self, document_id: Uuid) -> Result<Option<Document>> {
        self.repository.get_by_id(document_id).await
    }

    pub async fn get_document_data(&self, document_id: Uuid) -> Result<Option<(Document, Vec<u8>)>> {
        match self.repository.get_by_id(document_id).await? {
            Some(document) => {
                let data = async_fs::read(Path::new(&document.path)).await.map_err(|e| {
                    tracing::error!("Failed to read document {}: {}", document.path, e);
                    AppError::InternalServerError
                })?;

                Ok(Some((document, data)))
            }
            None => Ok(None),
        }
    }

    pub async fn list_documents(&self, query: &DocumentListQuery) -> Result<Vec<Document>> {
        self.repository.list(query).await
    }

    pub async fn count_documents(&self, query: &DocumentListQuery) -> Result<u64> {
        self.repository.count(query).await
    }

    /// Terminal statuses stamp `processed_at`; moving back clears it.
    pub async fn update_status(&self, document_id: Uuid, status: ProcessingStatus) -> Result<Document> {
        let mut document = self
            .repository
            .get_by_id(document_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Document not found".to_string()))?;

        document.processing_status = status;
        document.processed_at = if status.is_terminal() {
            Some(Utc::now())
        } else {
            None
        };

        self.repository.update(&document).await
    }

    pub async fn delete_document(&self, document_id: Uuid) -> Result<()> {
        let document = self
            .repository
            .get_by_id(document_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Document not found".to_string()))?;

        if Path::new(&document.path).exists() {
            async_fs::remove_file(&document.path).await.map_err(|e| {
                tracing::error!("Failed to delete document {}: {}", document.path, e);
                AppError::InternalServerError
            })?;
        }

        self.repository.delete(document_id).await
    }
}

async fn write_file(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = async_fs::File::create(path).await?;
    file.write_all(data).await?;
    file.sync_all().await
}

/// Best-effort removal of a file that never got a record.
async fn discard_file(path: &Path) {
    if let Err(e) = async_fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Failed to remove orphaned upload {}: {}", path.display(), e);
        }
    }
}
