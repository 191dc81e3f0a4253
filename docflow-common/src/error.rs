use std::collections::HashMap;

use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;
use thiserror::Error;

/// The one error taxonomy threaded through every layer.
///
/// Wrapping a lower-layer error into `ApiError` must preserve its
/// classification; only a layer that genuinely changes the meaning of a
/// failure (e.g. a repository `NotFound` becoming an `Authorization`
/// failure to avoid leaking cross-tenant existence) should reclassify.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation error: {message}")]
    Validation {
        message: String,
        fields: HashMap<String, String>,
    },
    #[error("authentication error: {message}")]
    Authentication { message: String },
    #[error("authorization error: {message}")]
    Authorization { message: String },
    #[error("not found: {message}")]
    NotFound { message: String },
    #[error("conflict: {message}")]
    Conflict { message: String },
    #[error("payload too large: {message}")]
    Payload { message: String },
    #[error("unsupported media type: {message}")]
    Unsupported { message: String },
    #[error("rate limited: {message}")]
    RateLimited {
        message: String,
        retry_after_secs: u64,
    },
    #[error("internal error: {message}")]
    Internal {
        message: String,
        correlation_id: String,
    },
    #[error("dependency error: {message}")]
    Dependency { message: String },
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation {
            message: message.into(),
            fields: HashMap::new(),
        }
    }

    pub fn validation_fields(
        message: impl Into<String>,
        fields: HashMap<String, String>,
    ) -> Self {
        ApiError::Validation {
            message: message.into(),
            fields,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict {
            message: message.into(),
        }
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        ApiError::Authorization {
            message: message.into(),
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        ApiError::Authentication {
            message: message.into(),
        }
    }

    pub fn dependency(message: impl Into<String>) -> Self {
        ApiError::Dependency {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal {
            message: message.into(),
            correlation_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ApiErrorKind {
        match self {
            ApiError::Validation { .. } => ApiErrorKind::Validation,
            ApiError::Authentication { .. } => ApiErrorKind::Authentication,
            ApiError::Authorization { .. } => ApiErrorKind::Authorization,
            ApiError::NotFound { .. } => ApiErrorKind::NotFound,
            ApiError::Conflict { .. } => ApiErrorKind::Conflict,
            ApiError::Payload { .. } => ApiErrorKind::Payload,
            ApiError::Unsupported { .. } => ApiErrorKind::Unsupported,
            ApiError::RateLimited { .. } => ApiErrorKind::RateLimited,
            ApiError::Internal { .. } => ApiErrorKind::Internal,
            ApiError::Dependency { .. } => ApiErrorKind::Dependency,
        }
    }

    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ApiErrorKind::Validation => 400,
            ApiErrorKind::Authentication => 401,
            ApiErrorKind::Authorization => 403,
            ApiErrorKind::NotFound => 404,
            ApiErrorKind::Conflict => 409,
            ApiErrorKind::Payload => 413,
            ApiErrorKind::Unsupported => 415,
            ApiErrorKind::RateLimited => 429,
            ApiErrorKind::Internal => 500,
            ApiErrorKind::Dependency => 503,
        }
    }

    /// `true` for errors the caller may retry after backing off.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ApiErrorKind::Dependency)
    }

    /// Renders the HTTP-facing envelope:
    /// `{success:false, timestamp, error:{type, message, status_code}, validation_errors?}`.
    #[must_use]
    pub fn to_envelope(&self) -> ErrorEnvelope {
        let validation_errors = match self {
            ApiError::Validation { fields, .. } if !fields.is_empty() => Some(fields.clone()),
            _ => None,
        };
        ErrorEnvelope {
            success: false,
            timestamp: Utc::now(),
            error: ErrorBody {
                error_type: self.kind().as_str().to_string(),
                message: self.to_string(),
                status_code: self.status_code(),
            },
            validation_errors,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    Validation,
    Authentication,
    Authorization,
    NotFound,
    Conflict,
    Payload,
    Unsupported,
    RateLimited,
    Internal,
    Dependency,
}

impl ApiErrorKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ApiErrorKind::Validation => "Validation",
            ApiErrorKind::Authentication => "Authentication",
            ApiErrorKind::Authorization => "Authorization",
            ApiErrorKind::NotFound => "NotFound",
            ApiErrorKind::Conflict => "Conflict",
            ApiErrorKind::Payload => "Payload",
            ApiErrorKind::Unsupported => "Unsupported",
            ApiErrorKind::RateLimited => "RateLimited",
            ApiErrorKind::Internal => "Internal",
            ApiErrorKind::Dependency => "Dependency",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
    pub status_code: u16,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub timestamp: DateTime<Utc>,
    pub error: ErrorBody,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_errors: Option<HashMap<String, String>>,
}

pub type ApiResult<T> = Result<T, ApiError>;
