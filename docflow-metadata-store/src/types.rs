use std::fmt::Display;

use chrono::DateTime;
use chrono::Utc;
use docflow_common::DocumentId;
use docflow_common::FolderId;
use docflow_common::TagId;
use docflow_common::TenantId;
use docflow_common::UserId;
use docflow_common::VersionId;
use docflow_tenancy::Permission as PermissionKind;
use serde::Serialize;

/// `processing -> available | quarantined | failed`, `available ->
/// deleted` (soft).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Processing,
    Available,
    Quarantined,
    Failed,
    Deleted,
}

impl Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            DocumentStatus::Processing => "processing",
            DocumentStatus::Available => "available",
            DocumentStatus::Quarantined => "quarantined",
            DocumentStatus::Failed => "failed",
            DocumentStatus::Deleted => "deleted",
        };
        write!(f, "{label}")
    }
}

/// Versions add a `scanning` state between `pending` and `available`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionStatus {
    Pending,
    Scanning,
    Available,
    Quarantined,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub id: DocumentId,
    pub tenant_id: TenantId,
    pub folder_id: FolderId,
    pub name: String,
    pub content_type: String,
    pub size: u64,
    pub status: DocumentStatus,
    pub owner_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentVersion {
    pub id: VersionId,
    pub document_id: DocumentId,
    pub version_number: u32,
    pub storage_path: String,
    pub checksum: String,
    pub size: u64,
    pub content_type: String,
    pub status: VersionStatus,
    pub created_at: DateTime<Utc>,
    pub created_by: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentMetadataEntry {
    pub id: String,
    pub document_id: DocumentId,
    pub key: String,
    pub value: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Folder {
    pub id: FolderId,
    pub tenant_id: TenantId,
    pub parent_id: Option<FolderId>,
    pub name: String,
    pub path: String,
    pub owner_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub id: TagId,
    pub tenant_id: TenantId,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Document,
    Folder,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionGrant {
    pub id: String,
    pub tenant_id: TenantId,
    pub role: docflow_tenancy::Role,
    pub resource_type: ResourceType,
    pub resource_id: String,
    pub permission_type: PermissionKind,
    pub inherited: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventRecord {
    pub id: docflow_common::EventId,
    pub tenant_id: TenantId,
    #[serde(rename = "type")]
    pub event_type: String,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub published: bool,
}
