use std::collections::HashMap;

use serde::Deserialize;
use serde::Serialize;

/// Maximum accepted upload size: 100 MiB.
pub const MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

/// The explicit allow-list of accepted MIME types. Anything else is
/// rejected as `415` before any storage write.
pub const ALLOWED_CONTENT_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-powerpoint",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    "image/png",
    "image/jpeg",
    "image/gif",
    "image/webp",
    "image/tiff",
    "image/bmp",
    "image/svg+xml",
    "text/plain",
    "text/csv",
    "text/markdown",
    "application/zip",
    "application/json",
    "application/xml",
];

#[must_use]
pub fn is_allowed_content_type(content_type: &str) -> bool {
    ALLOWED_CONTENT_TYPES.contains(&content_type)
}

/// The JSON part of a multipart upload, alongside the file part.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadMetadata {
    pub folder_id: String,
    pub name: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadAccepted {
    pub id: String,
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentSearchRequest {
    pub query: String,
    #[serde(flatten)]
    pub page: docflow_common::PageRequest,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetadataSearchRequest {
    pub metadata: HashMap<String, String>,
    #[serde(flatten)]
    pub page: docflow_common::PageRequest,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CombinedSearchRequest {
    pub query: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(flatten)]
    pub page: docflow_common::PageRequest,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FolderSearchRequest {
    pub folder_id: String,
    pub query: String,
    #[serde(flatten)]
    pub page: docflow_common::PageRequest,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResultDto {
    pub document_ids: Vec<String>,
    pub total: i64,
    pub page: i64,
    pub page_size: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateFolderRequest {
    #[serde(default)]
    pub parent_id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MoveFolderRequest {
    #[serde(default)]
    pub new_parent_id: Option<String>,
}

/// One operation in a `POST /documents/batch` request. Upload isn't
/// representable without a file part, so batch upload is out of scope
/// here just as it is in the representative endpoint table — batch
/// covers delete, the operation that needs no payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum BatchOperation {
    Delete { document_id: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchRequest {
    pub operations: Vec<BatchOperation>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchItemResult {
    pub document_id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchResponse {
    pub results: Vec<BatchItemResult>,
}
