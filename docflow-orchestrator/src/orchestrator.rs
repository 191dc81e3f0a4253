use std::sync::Arc;

use docflow_common::DocumentId;
use docflow_common::FolderId;
use docflow_common::TenantId;
use docflow_events::EventPublisher;
use docflow_metadata_store::Document;
use docflow_metadata_store::DocumentRepository;
use docflow_metadata_store::DocumentStatus;
use docflow_metadata_store::IngestionTransaction;
use docflow_metadata_store::NewDocument;
use docflow_metadata_store::VersionRepository;
use docflow_object_store::Bucket;
use docflow_object_store::ObjectKey;
use docflow_object_store::ObjectStoreAdapter;
use docflow_object_store::PutRequest;
use docflow_scan_worker::ScanMessage;
use docflow_scan_worker::ScanQueue;
use docflow_search_indexer::SearchIndexer;
use docflow_tenancy::Permission;
use docflow_tenancy::TenantContext;
use tracing::warn;

use crate::error::OrchestratorError;
use crate::error::OrchestratorResult;
use crate::transition;

/// Bytes plus the declared metadata a caller submits for upload.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub folder_id: FolderId,
    pub name: String,
    pub content_type: String,
    pub payload: Vec<u8>,
    pub sse_key_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadPreference {
    Stream,
    Presigned { ttl_secs: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadResponse {
    Stream {
        content_type: String,
        payload: Vec<u8>,
    },
    Presigned {
        url: String,
    },
}

/// Composes C1-C5 on upload, download, and delete — the document-status
/// edges outside the scan worker's `processing -> available|quarantined`
/// transitions and its own dead-letter reaper. Every mutation funnels
/// through [`IngestionTransaction::transition`] or
/// [`DocumentRepository::soft_delete`] so a duplicate call can never
/// re-run a transition's side effects.
pub struct Orchestrator {
    documents: Arc<dyn DocumentRepository>,
    versions: Arc<dyn VersionRepository>,
    transactions: Arc<dyn IngestionTransaction>,
    object_store: Arc<dyn ObjectStoreAdapter>,
    scan_queue: Arc<dyn ScanQueue>,
    indexer: Arc<dyn SearchIndexer>,
    publisher: Arc<EventPublisher>,
}

impl Orchestrator {
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        documents: Arc<dyn DocumentRepository>,
        versions: Arc<dyn VersionRepository>,
        transactions: Arc<dyn IngestionTransaction>,
        object_store: Arc<dyn ObjectStoreAdapter>,
        scan_queue: Arc<dyn ScanQueue>,
        indexer: Arc<dyn SearchIndexer>,
        publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            documents,
            versions,
            transactions,
            object_store,
            scan_queue,
            indexer,
            publisher,
        }
    }

    /// Creates Document+Version in `processing`/`pending`, stages the
    /// bytes in the temp bucket, enqueues the scan job, and emits
    /// `document.uploaded`. Returns once all four have happened — the
    /// caller gets back a document already past the point where a crash
    /// could lose the upload.
    pub async fn upload(
        &self,
        context: &TenantContext,
        tenant_id: &TenantId,
        request: UploadRequest,
    ) -> OrchestratorResult<Document> {
        context.require_tenant(tenant_id)?;
        context.require_permission(Permission::Write)?;

        let document_id = docflow_common::generate_id();
        let version_id = docflow_common::generate_id();
        let key = ObjectKey::new(tenant_id.clone(), document_id.clone(), version_id.clone());

        let (document, version) = self
            .transactions
            .create_document_and_version(
                tenant_id,
                document_id,
                version_id,
                NewDocument {
                    folder_id: request.folder_id,
                    name: request.name,
                    content_type: request.content_type.clone(),
                    size: request.payload.len() as u64,
                    owner_id: context.subject_id.clone(),
                },
                key.path(),
                context.subject_id.clone(),
            )
            .await?;

        self.object_store
            .put(
                tenant_id,
                PutRequest {
                    key: key.clone(),
                    bucket: Bucket::Temp,
                    payload: request.payload,
                    content_type: request.content_type,
                    sse_key_id: request.sse_key_id,
                },
            )
            .await?;

        self.scan_queue
            .enqueue(ScanMessage {
                document_id: document.id.clone(),
                version_id: version.id,
                tenant_id: tenant_id.clone(),
                storage_path: key.path(),
                enqueued_at: chrono::Utc::now(),
            })
            .await?;

        self.publish(tenant_id, &document.id, "document.uploaded").await;
        Ok(document)
    }

    /// Authorizes, fetches the document row, and — only if it is
    /// `available` — either streams the permanent object or hands back a
    /// presigned URL, per the caller's preference, then emits
    /// `document.downloaded`. Any other status is reported as
    /// `NotFound`, matching the "cross-tenant access is indistinguishable
    /// from a miss" rule applied to "not yet readable" documents too.
    pub async fn download(
        &self,
        context: &TenantContext,
        tenant_id: &TenantId,
        document_id: &DocumentId,
        preference: DownloadPreference,
    ) -> OrchestratorResult<DownloadResponse> {
        context.require_tenant(tenant_id)?;
        context.require_permission(Permission::Read)?;

        let document = self.documents.get(tenant_id, document_id).await?;
        if document.status != DocumentStatus::Available {
            return Err(OrchestratorError::NotFound(format!(
                "document {document_id} is not available for download"
            )));
        }

        let key = self.current_object_key(tenant_id, document_id).await?;
        let response = match preference {
            DownloadPreference::Stream => {
                let stored = self.object_store.get(tenant_id, Bucket::Permanent, &key).await?;
                DownloadResponse::Stream {
                    content_type: stored.content_type,
                    payload: stored.payload,
                }
            }
            DownloadPreference::Presigned { ttl_secs } => {
                let presigned = self
                    .object_store
                    .presign(tenant_id, Bucket::Permanent, &key, ttl_secs)
                    .await?;
                DownloadResponse::Presigned { url: presigned.url }
            }
        };

        self.publish(tenant_id, document_id, "document.downloaded").await;
        Ok(response)
    }

    /// Soft-deletes an `available` or `quarantined` document: removes its
    /// index entry (if any), deletes the underlying object, flips the
    /// row to `deleted`, and emits `document.deleted`. Any other current
    /// status is rejected before any side effect runs.
    pub async fn delete(
        &self,
        context: &TenantContext,
        tenant_id: &TenantId,
        document_id: &DocumentId,
    ) -> OrchestratorResult<()> {
        context.require_tenant(tenant_id)?;
        context.require_permission(Permission::Delete)?;

        let document = self.documents.get(tenant_id, document_id).await?;
        if !transition::is_allowed(document.status, DocumentStatus::Deleted) {
            return Err(OrchestratorError::Validation(format!(
                "document {document_id} cannot be deleted from status {}",
                document.status
            )));
        }

        let key = self.current_object_key(tenant_id, document_id).await?;
        let bucket = match document.status {
            DocumentStatus::Available => Bucket::Permanent,
            DocumentStatus::Quarantined => Bucket::Quarantine,
            _ => unreachable!("validated by transition::is_allowed above"),
        };

        if document.status == DocumentStatus::Available {
            self.indexer.remove(tenant_id, document_id).await?;
        }
        self.object_store.delete(tenant_id, bucket, &key).await?;
        self.documents.soft_delete(tenant_id, document_id).await?;
        self.publish(tenant_id, document_id, "document.deleted").await;
        Ok(())
    }

    async fn current_object_key(
        &self,
        tenant_id: &TenantId,
        document_id: &DocumentId,
    ) -> OrchestratorResult<ObjectKey> {
        let versions = self.versions.list_for_document(tenant_id, document_id).await?;
        let current = versions
            .into_iter()
            .max_by_key(|version| version.version_number)
            .ok_or_else(|| {
                OrchestratorError::Internal(format!("document {document_id} has no versions"))
            })?;
        ObjectKey::parse(&current.storage_path).ok_or_else(|| {
            OrchestratorError::Internal(format!(
                "malformed storage path for document {document_id}"
            ))
        })
    }

    async fn publish(&self, tenant_id: &TenantId, document_id: &DocumentId, event_type: &str) {
        let payload = serde_json::json!({ "document_id": document_id });
        if let Err(err) = self
            .publisher
            .publish(tenant_id, document_id, event_type, payload)
            .await
        {
            warn!(error = %err, event_type, "failed to publish event, left for outbox poller");
        }
    }
}
