use thiserror::Error;

pub type MetadataStoreResult<T> = Result<T, MetadataStoreError>;

#[derive(Debug, Error)]
pub enum MetadataStoreError {
    #[error("resource not found: {0}")]
    NotFound(String),
    #[error("resource conflict: {0}")]
    Conflict(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<MetadataStoreError> for docflow_common::ApiError {
    fn from(err: MetadataStoreError) -> Self {
        match err {
            MetadataStoreError::NotFound(message) => docflow_common::ApiError::not_found(message),
            MetadataStoreError::Conflict(message) => docflow_common::ApiError::conflict(message),
            MetadataStoreError::Validation(message) => {
                docflow_common::ApiError::validation(message)
            }
            MetadataStoreError::Internal(message) => docflow_common::ApiError::internal(message),
        }
    }
}
