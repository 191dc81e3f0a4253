use thiserror::Error;

pub type ScanWorkerResult<T> = Result<T, ScanWorkerError>;

#[derive(Debug, Error)]
pub enum ScanWorkerError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("message not found: {0}")]
    NotFound(String),
    #[error("dependency failure: {0}")]
    Dependency(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ScanWorkerError> for docflow_common::ApiError {
    fn from(err: ScanWorkerError) -> Self {
        match err {
            ScanWorkerError::Validation(message) => docflow_common::ApiError::validation(message),
            ScanWorkerError::NotFound(message) => docflow_common::ApiError::not_found(message),
            ScanWorkerError::Dependency(message) => docflow_common::ApiError::dependency(message),
            ScanWorkerError::Internal(message) => docflow_common::ApiError::internal(message),
        }
    }
}

impl From<docflow_object_store::ObjectStoreError> for ScanWorkerError {
    fn from(err: docflow_object_store::ObjectStoreError) -> Self {
        ScanWorkerError::Dependency(err.to_string())
    }
}

impl From<docflow_metadata_store::MetadataStoreError> for ScanWorkerError {
    fn from(err: docflow_metadata_store::MetadataStoreError) -> Self {
        ScanWorkerError::Dependency(err.to_string())
    }
}

impl From<docflow_search_indexer::IndexerError> for ScanWorkerError {
    fn from(err: docflow_search_indexer::IndexerError) -> Self {
        ScanWorkerError::Dependency(err.to_string())
    }
}
