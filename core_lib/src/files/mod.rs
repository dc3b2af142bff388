pub mod allow_list;
pub mod manager;
pub mod models;
pub mod repository;
pub mod validation;

pub use manager::{DocumentManager, DocumentManagerConfig};
pub use models::{Document, DocumentListQuery, DocumentUpload, ProcessingStatus};
pub use repository::{DocumentRepository, DocumentRepositoryTrait};
pub use validation::{
    read_sample, AcceptedUpload, FileValidationConfig, FileValidator, RejectionReason,
    UploadCandidate, ValidationError,
};
