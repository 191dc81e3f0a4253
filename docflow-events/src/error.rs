use thiserror::Error;

pub type EventsResult<T> = Result<T, EventsError>;

#[derive(Debug, Error)]
pub enum EventsError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("broker unavailable: {0}")]
    Dependency(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<EventsError> for docflow_common::ApiError {
    fn from(err: EventsError) -> Self {
        match err {
            EventsError::Validation(message) => docflow_common::ApiError::validation(message),
            EventsError::Dependency(message) => docflow_common::ApiError::dependency(message),
            EventsError::Internal(message) => docflow_common::ApiError::internal(message),
        }
    }
}

impl From<docflow_metadata_store::MetadataStoreError> for EventsError {
    fn from(err: docflow_metadata_store::MetadataStoreError) -> Self {
        match err {
            docflow_metadata_store::MetadataStoreError::NotFound(message) => {
                EventsError::Internal(message)
            }
            docflow_metadata_store::MetadataStoreError::Conflict(message) => {
                EventsError::Internal(message)
            }
            docflow_metadata_store::MetadataStoreError::Validation(message) => {
                EventsError::Validation(message)
            }
            docflow_metadata_store::MetadataStoreError::Internal(message) => {
                EventsError::Internal(message)
            }
        }
    }
}
