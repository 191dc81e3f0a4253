use thiserror::Error;

pub type IndexerResult<T> = Result<T, IndexerError>;

#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("indexer dependency failure: {0}")]
    Dependency(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<IndexerError> for docflow_common::ApiError {
    fn from(err: IndexerError) -> Self {
        match err {
            IndexerError::Validation(message) => docflow_common::ApiError::validation(message),
            IndexerError::Dependency(message) => docflow_common::ApiError::dependency(message),
            IndexerError::Internal(message) => docflow_common::ApiError::internal(message),
        }
    }
}
