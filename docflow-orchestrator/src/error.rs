use thiserror::Error;

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("resource not found: {0}")]
    NotFound(String),
    #[error("resource conflict: {0}")]
    Conflict(String),
    #[error("authorization error: {0}")]
    Authorization(String),
    #[error("dependency failure: {0}")]
    Dependency(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<OrchestratorError> for docflow_common::ApiError {
    fn from(err: OrchestratorError) -> Self {
        match err {
            OrchestratorError::Validation(message) => docflow_common::ApiError::validation(message),
            OrchestratorError::NotFound(message) => docflow_common::ApiError::not_found(message),
            OrchestratorError::Conflict(message) => docflow_common::ApiError::conflict(message),
            OrchestratorError::Authorization(message) => {
                docflow_common::ApiError::authorization(message)
            }
            OrchestratorError::Dependency(message) => docflow_common::ApiError::dependency(message),
            OrchestratorError::Internal(message) => docflow_common::ApiError::internal(message),
        }
    }
}

impl From<docflow_metadata_store::MetadataStoreError> for OrchestratorError {
    fn from(err: docflow_metadata_store::MetadataStoreError) -> Self {
        match err {
            docflow_metadata_store::MetadataStoreError::NotFound(message) => {
                OrchestratorError::NotFound(message)
            }
            docflow_metadata_store::MetadataStoreError::Conflict(message) => {
                OrchestratorError::Conflict(message)
            }
            docflow_metadata_store::MetadataStoreError::Validation(message) => {
                OrchestratorError::Validation(message)
            }
            docflow_metadata_store::MetadataStoreError::Internal(message) => {
                OrchestratorError::Internal(message)
            }
        }
    }
}

impl From<docflow_object_store::ObjectStoreError> for OrchestratorError {
    fn from(err: docflow_object_store::ObjectStoreError) -> Self {
        match err {
            docflow_object_store::ObjectStoreError::NotFound(message) => {
                OrchestratorError::NotFound(message)
            }
            docflow_object_store::ObjectStoreError::Validation(message) => {
                OrchestratorError::Validation(message)
            }
            docflow_object_store::ObjectStoreError::Security(message) => {
                OrchestratorError::Authorization(message)
            }
            docflow_object_store::ObjectStoreError::Dependency(message) => {
                OrchestratorError::Dependency(message)
            }
        }
    }
}

impl From<docflow_search_indexer::IndexerError> for OrchestratorError {
    fn from(err: docflow_search_indexer::IndexerError) -> Self {
        match err {
            docflow_search_indexer::IndexerError::Validation(message) => {
                OrchestratorError::Validation(message)
            }
            docflow_search_indexer::IndexerError::Dependency(message) => {
                OrchestratorError::Dependency(message)
            }
            docflow_search_indexer::IndexerError::Internal(message) => {
                OrchestratorError::Internal(message)
            }
        }
    }
}

impl From<docflow_events::EventsError> for OrchestratorError {
    fn from(err: docflow_events::EventsError) -> Self {
        match err {
            docflow_events::EventsError::Validation(message) => {
                OrchestratorError::Validation(message)
            }
            docflow_events::EventsError::Dependency(message) => {
                OrchestratorError::Dependency(message)
            }
            docflow_events::EventsError::Internal(message) => OrchestratorError::Internal(message),
        }
    }
}

impl From<docflow_scan_worker::ScanWorkerError> for OrchestratorError {
    fn from(err: docflow_scan_worker::ScanWorkerError) -> Self {
        match err {
            docflow_scan_worker::ScanWorkerError::Validation(message) => {
                OrchestratorError::Validation(message)
            }
            docflow_scan_worker::ScanWorkerError::NotFound(message) => {
                OrchestratorError::NotFound(message)
            }
            docflow_scan_worker::ScanWorkerError::Dependency(message) => {
                OrchestratorError::Dependency(message)
            }
            docflow_scan_worker::ScanWorkerError::Internal(message) => {
                OrchestratorError::Internal(message)
            }
        }
    }
}

impl From<docflow_tenancy::TenancyError> for OrchestratorError {
    fn from(err: docflow_tenancy::TenancyError) -> Self {
        match err {
            docflow_tenancy::TenancyError::NotFound(message) => OrchestratorError::NotFound(message),
            docflow_tenancy::TenancyError::Conflict(message) => OrchestratorError::Conflict(message),
            docflow_tenancy::TenancyError::Validation(message) => {
                OrchestratorError::Validation(message)
            }
            docflow_tenancy::TenancyError::Rejected(message) => {
                OrchestratorError::Authorization(message)
            }
            docflow_tenancy::TenancyError::Internal(message) => {
                OrchestratorError::Internal(message)
            }
        }
    }
}
