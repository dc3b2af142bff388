use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Uploaded,
    Processing,
    Completed,
    Failed,
}

impl ProcessingStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProcessingStatus::Completed | ProcessingStatus::Failed)
    }
}

/// An accepted upload as recorded against its owner.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub id: Uuid,
    pub user_id: u64,
    pub filename: String,
    pub original_filename: String,
    pub content_type: String,
    pub size: u64,
    #[serde(skip_serializing)]
    pub path: String,
    pub processing_status: ProcessingStatus,
    pub uploaded_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub struct DocumentUpload {
    pub original_filename: String,
    pub content_type_hint: Option<String>,
    pub data: Vec<u8>,
    pub user_id: u64,
}

/// Missing paging fields fall back to the `Default` page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentListQuery {
    pub user_id: Option<u64>,
    pub status: Option<ProcessingStatus>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl Default for DocumentListQuery {
    fn default() -> Self {
        Self {
            user_id: None,
            status: None,
            limit: Some(50),
            offset: Some(0),
        }
    }
}

impl DocumentListQuery {
    pub fn for_user(user_id: u64) -> Self {
        Self {
            user_id: Some(user_id),
            ..Default::default()
        }
    }

    pub fn matches(&self, document: &Document) -> bool {
        self.user_id.map_or(true, |user_id| document.user_id == user_id)
            && self.status.map_or(true, |status| document.processing_status == status)
    }
}
