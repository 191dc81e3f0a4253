use async_trait::async_trait;
use docflow_common::DocumentId;
use docflow_common::FolderId;
use docflow_common::Paginated;
use docflow_common::TagId;
use docflow_common::TenantId;
use docflow_common::ValidPage;
use docflow_common::VersionId;

use crate::error::MetadataStoreResult;
use crate::types::Document;
use crate::types::DocumentMetadataEntry;
use crate::types::DocumentStatus;
use crate::types::DocumentVersion;
use crate::types::EventRecord;
use crate::types::Folder;
use crate::types::PermissionGrant;
use crate::types::ResourceType;
use crate::types::Tag;
use crate::types::VersionStatus;

#[derive(Debug, Clone, Default)]
pub struct DocumentFilter {
    pub folder_id: Option<FolderId>,
    pub status: Option<DocumentStatus>,
}

#[derive(Debug, Clone)]
pub struct NewDocument {
    pub folder_id: FolderId,
    pub name: String,
    pub content_type: String,
    pub size: u64,
    pub owner_id: docflow_common::UserId,
}

/// Every method takes a tenant id so a tenant-scoped query can never be
/// issued without one.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    async fn get(&self, tenant_id: &TenantId, id: &DocumentId) -> MetadataStoreResult<Document>;

    async fn list(
        &self,
        tenant_id: &TenantId,
        filter: DocumentFilter,
        page: ValidPage,
    ) -> MetadataStoreResult<Paginated<Document>>;

    async fn soft_delete(
        &self,
        tenant_id: &TenantId,
        id: &DocumentId,
    ) -> MetadataStoreResult<Document>;
}

#[async_trait]
pub trait VersionRepository: Send + Sync {
    async fn get(
        &self,
        tenant_id: &TenantId,
        id: &VersionId,
    ) -> MetadataStoreResult<DocumentVersion>;

    async fn list_for_document(
        &self,
        tenant_id: &TenantId,
        document_id: &DocumentId,
    ) -> MetadataStoreResult<Vec<DocumentVersion>>;
}

#[async_trait]
pub trait MetadataKvRepository: Send + Sync {
    async fn upsert(
        &self,
        tenant_id: &TenantId,
        document_id: &DocumentId,
        key: String,
        value: String,
    ) -> MetadataStoreResult<DocumentMetadataEntry>;

    async fn list_for_document(
        &self,
        tenant_id: &TenantId,
        document_id: &DocumentId,
    ) -> MetadataStoreResult<Vec<DocumentMetadataEntry>>;
}

#[derive(Debug, Clone)]
pub struct NewFolder {
    pub parent_id: Option<FolderId>,
    pub name: String,
    pub owner_id: docflow_common::UserId,
}

#[async_trait]
pub trait FolderRepository: Send + Sync {
    async fn create(
        &self,
        tenant_id: &TenantId,
        request: NewFolder,
    ) -> MetadataStoreResult<Folder>;

    async fn get(&self, tenant_id: &TenantId, id: &FolderId) -> MetadataStoreResult<Folder>;

    async fn list_children(
        &self,
        tenant_id: &TenantId,
        parent_id: Option<&FolderId>,
        page: ValidPage,
    ) -> MetadataStoreResult<Paginated<Folder>>;

    /// Rejects with `Conflict` if `new_parent_id` is `id` itself or a
    /// descendant of `id`.
    async fn move_folder(
        &self,
        tenant_id: &TenantId,
        id: &FolderId,
        new_parent_id: Option<FolderId>,
    ) -> MetadataStoreResult<Folder>;
}

#[async_trait]
pub trait TagRepository: Send + Sync {
    async fn create(&self, tenant_id: &TenantId, name: String) -> MetadataStoreResult<Tag>;

    /// Deletes the tag and every `document_tag` join referencing it.
    async fn delete(&self, tenant_id: &TenantId, id: &TagId) -> MetadataStoreResult<()>;

    async fn attach(
        &self,
        tenant_id: &TenantId,
        document_id: &DocumentId,
        tag_id: &TagId,
    ) -> MetadataStoreResult<()>;

    async fn list_for_document(
        &self,
        tenant_id: &TenantId,
        document_id: &DocumentId,
    ) -> MetadataStoreResult<Vec<Tag>>;
}

#[async_trait]
pub trait PermissionRepository: Send + Sync {
    async fn grant(
        &self,
        tenant_id: &TenantId,
        grant: PermissionGrant,
    ) -> MetadataStoreResult<PermissionGrant>;

    async fn list_for_resource(
        &self,
        tenant_id: &TenantId,
        resource_type: ResourceType,
        resource_id: &str,
    ) -> MetadataStoreResult<Vec<PermissionGrant>>;
}

#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn append(
        &self,
        tenant_id: &TenantId,
        event_type: String,
        payload: serde_json::Value,
    ) -> MetadataStoreResult<EventRecord>;

    async fn list_unpublished(&self, limit: usize) -> MetadataStoreResult<Vec<EventRecord>>;

    async fn mark_published(&self, id: &docflow_common::EventId) -> MetadataStoreResult<()>;
}

/// The outcome of an idempotency-keyed ingestion transition. Each
/// transition is keyed by `(document_id, target_state)` so duplicate
/// delivery from the scan queue cannot re-execute side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    Applied(Document, DocumentVersion),
    AlreadyApplied(Document, DocumentVersion),
}

/// The only way the orchestrator mutates a document and its version
/// together, so the transaction boundary is enforced at the type level
/// rather than by caller discipline.
#[async_trait]
pub trait IngestionTransaction: Send + Sync {
    /// `document_id`/`version_id` are minted by the caller, not here: an
    /// upload path needs the object-store key before the row exists, and
    /// that key is built from these same ids.
    async fn create_document_and_version(
        &self,
        tenant_id: &TenantId,
        document_id: DocumentId,
        version_id: VersionId,
        document: NewDocument,
        storage_path: String,
        created_by: docflow_common::UserId,
    ) -> MetadataStoreResult<(Document, DocumentVersion)>;

    async fn transition(
        &self,
        tenant_id: &TenantId,
        document_id: &DocumentId,
        version_id: &VersionId,
        target_document_status: DocumentStatus,
        target_version_status: VersionStatus,
        storage_path: Option<String>,
        checksum: Option<String>,
    ) -> MetadataStoreResult<TransitionOutcome>;
}
