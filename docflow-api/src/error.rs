use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use docflow_common::ApiError;

/// Newtype so this crate, not `docflow-common`, owns the `IntoResponse`
/// impl for the shared error taxonomy. Every handler returns
/// `Result<_, HttpError>`; a `?` on any collaborator's error converts
/// through its own `From<_> for ApiError` and then through this wrapper.
pub struct HttpError(pub ApiError);

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        HttpError(err)
    }
}

impl From<docflow_orchestrator::OrchestratorError> for HttpError {
    fn from(err: docflow_orchestrator::OrchestratorError) -> Self {
        HttpError(err.into())
    }
}

impl From<docflow_search_indexer::IndexerError> for HttpError {
    fn from(err: docflow_search_indexer::IndexerError) -> Self {
        HttpError(err.into())
    }
}

impl From<docflow_tenancy::TenancyError> for HttpError {
    fn from(err: docflow_tenancy::TenancyError) -> Self {
        HttpError(err.into())
    }
}

impl From<docflow_metadata_store::MetadataStoreError> for HttpError {
    fn from(err: docflow_metadata_store::MetadataStoreError) -> Self {
        HttpError(err.into())
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let envelope = self.0.to_envelope();
        let status =
            StatusCode::from_u16(envelope.error.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(envelope)).into_response()
    }
}

pub type HttpResult<T> = Result<T, HttpError>;
