use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use super::models::{Document, DocumentListQuery};

#[async_trait]
pub trait DocumentRepositoryTrait: Send + Sync {
    async fn create(&self, document: &Document) -> Result<Document>;
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Document>>;
    async fn update(&self, document: &Document) -> Result<Document>;
    async fn delete(&self, id: Uuid) -> Result<()>;
    async fn list(&self, query: &DocumentListQuery) -> Result<Vec<Document>>;
    async fn count(&self, query: &DocumentListQuery) -> Result<u64>;
}

/// In-process document index. Clones share the same map.
#[derive(Clone, Default)]
pub struct DocumentRepository {
    documents: Arc<RwLock<HashMap<Uuid, Document>>>,
}

impl DocumentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentRepositoryTrait for DocumentRepository {
    async fn create(&self, document: &Document) -> Result<Document> {
        let mut documents = self.documents.write();

        if documents.contains_key(&document.id) {
            return Err(AppError::BadRequest("Document already exists".to_string()));
        }

        documents.insert(document.id, document.clone());
        Ok(document.clone())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Document>> {
        Ok(self.documents.read().get(&id).cloned())
    }

    async fn update(&self, document: &Document) -> Result<Document> {
        let mut documents = self.documents.write();

        let existing = documents
            .get_mut(&document.id)
            .ok_or_else(|| AppError::NotFound("Document not found".to_string()))?;

        *existing = document.clone();
        Ok(document.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.documents
            .write()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound("Document not found".to_string()))
    }

    async fn list(&self, query: &DocumentListQuery) -> Result<Vec<Document>> {
        let documents = self.documents.read();

        let mut matching: Vec<Document> = documents
            .values()
            .filter(|document| query.matches(document))
            .cloned()
            .collect();

        matching.sort_by(|a, b| {
            b.uploaded_at
                .cmp(&a.uploaded_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        let offset = query.offset.unwrap_or(0) as usize;
        let limit = query.limit.map(|l| l as usize).unwrap_or(matching.len());

        Ok(matching.into_iter().skip(offset).take(limit).collect())
    }

    async fn count(&self, query: &DocumentListQuery) -> Result<u64> {
        let documents = self.documents.read();
        Ok(documents.values().filter(|document| query.matches(document)).count() as u64)
    }
}
