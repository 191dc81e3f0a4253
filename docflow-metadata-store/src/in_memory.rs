use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use docflow_common::generate_id;
use docflow_common::DocumentId;
use docflow_common::FolderId;
use docflow_common::Paginated;
use docflow_common::TagId;
use docflow_common::TenantId;
use docflow_common::UserId;
use docflow_common::ValidPage;
use docflow_common::VersionId;
use tokio::sync::Mutex;
use tokio::sync::RwLock;

use crate::error::MetadataStoreError;
use crate::error::MetadataStoreResult;
use crate::repository::DocumentFilter;
use crate::repository::DocumentRepository;
use crate::repository::EventRepository;
use crate::repository::FolderRepository;
use crate::repository::IngestionTransaction;
use crate::repository::MetadataKvRepository;
use crate::repository::NewDocument;
use crate::repository::NewFolder;
use crate::repository::PermissionRepository;
use crate::repository::TagRepository;
use crate::repository::TransitionOutcome;
use crate::repository::VersionRepository;
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

#[derive(Default)]
struct Store {
    documents: HashMap<DocumentId, Document>,
    versions: HashMap<VersionId, DocumentVersion>,
    metadata: HashMap<DocumentId, Vec<DocumentMetadataEntry>>,
    folders: HashMap<FolderId, Folder>,
    tags: HashMap<TagId, Tag>,
    document_tags: HashMap<DocumentId, Vec<TagId>>,
    permissions: Vec<PermissionGrant>,
    events: Vec<EventRecord>,
    applied_transitions: std::collections::HashSet<(DocumentId, String)>,
}

/// A single in-process reference store backing every repository trait.
/// One `RwLock` guards bulk state; a per-document `Mutex` set
/// serializes the multi-entity ingestion transitions so two concurrent
/// scan results for the same document cannot interleave.
pub struct InMemoryMetadataStore {
    state: Arc<RwLock<Store>>,
    document_locks: Arc<Mutex<HashMap<DocumentId, Arc<Mutex<()>>>>>,
}

impl Default for InMemoryMetadataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(Store::default())),
            document_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    async fn lock_for(&self, document_id: &DocumentId) -> Arc<Mutex<()>> {
        let mut locks = self.document_locks.lock().await;
        locks
            .entry(document_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn folder_path(store: &Store, parent_id: Option<&FolderId>, name: &str) -> String {
        match parent_id {
            None => format!("/{name}"),
            Some(parent_id) => match store.folders.get(parent_id) {
                Some(parent) => format!("{}/{name}", parent.path),
                None => format!("/{name}"),
            },
        }
    }

    fn is_descendant(store: &Store, candidate: &FolderId, ancestor: &FolderId) -> bool {
        let mut current = store.folders.get(candidate).and_then(|f| f.parent_id.clone());
        while let Some(parent_id) = current {
            if &parent_id == ancestor {
                return true;
            }
            current = store.folders.get(&parent_id).and_then(|f| f.parent_id.clone());
        }
        false
    }
}

#[async_trait]
impl DocumentRepository for InMemoryMetadataStore {
    async fn get(&self, tenant_id: &TenantId, id: &DocumentId) -> MetadataStoreResult<Document> {
        let store = self.state.read().await;
        store
            .documents
            .get(id)
            .filter(|document| &document.tenant_id == tenant_id)
            .cloned()
            .ok_or_else(|| MetadataStoreError::NotFound(format!("document {id}")))
    }

    async fn list(
        &self,
        tenant_id: &TenantId,
        filter: DocumentFilter,
        page: ValidPage,
    ) -> MetadataStoreResult<Paginated<Document>> {
        let store = self.state.read().await;
        let mut matches: Vec<Document> = store
            .documents
            .values()
            .filter(|document| &document.tenant_id == tenant_id)
            .filter(|document| {
                filter
                    .folder_id
                    .as_ref()
                    .is_none_or(|folder_id| &document.folder_id == folder_id)
            })
            .filter(|document| filter.status.is_none_or(|status| document.status == status))
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(Paginated::slice(matches.drain(..).collect(), page))
    }

    async fn soft_delete(
        &self,
        tenant_id: &TenantId,
        id: &DocumentId,
    ) -> MetadataStoreResult<Document> {
        let mut store = self.state.write().await;
        let document = store
            .documents
            .get_mut(id)
            .filter(|document| &document.tenant_id == tenant_id)
            .ok_or_else(|| MetadataStoreError::NotFound(format!("document {id}")))?;
        document.status = DocumentStatus::Deleted;
        document.updated_at = Utc::now();
        Ok(document.clone())
    }
}

#[async_trait]
impl VersionRepository for InMemoryMetadataStore {
    async fn get(
        &self,
        tenant_id: &TenantId,
        id: &VersionId,
    ) -> MetadataStoreResult<DocumentVersion> {
        let store = self.state.read().await;
        let version = store
            .versions
            .get(id)
            .ok_or_else(|| MetadataStoreError::NotFound(format!("version {id}")))?;
        store
            .documents
            .get(&version.document_id)
            .filter(|document| &document.tenant_id == tenant_id)
            .ok_or_else(|| MetadataStoreError::NotFound(format!("version {id}")))?;
        Ok(version.clone())
    }

    async fn list_for_document(
        &self,
        tenant_id: &TenantId,
        document_id: &DocumentId,
    ) -> MetadataStoreResult<Vec<DocumentVersion>> {
        let store = self.state.read().await;
        store
            .documents
            .get(document_id)
            .filter(|document| &document.tenant_id == tenant_id)
            .ok_or_else(|| MetadataStoreError::NotFound(format!("document {document_id}")))?;
        let mut versions: Vec<DocumentVersion> = store
            .versions
            .values()
            .filter(|version| &version.document_id == document_id)
            .cloned()
            .collect();
        versions.sort_by_key(|version| version.version_number);
        Ok(versions)
    }
}

#[async_trait]
impl MetadataKvRepository for InMemoryMetadataStore {
    async fn upsert(
        &self,
        tenant_id: &TenantId,
        document_id: &DocumentId,
        key: String,
        value: String,
    ) -> MetadataStoreResult<DocumentMetadataEntry> {
        let mut store = self.state.write().await;
        store
            .documents
            .get(document_id)
            .filter(|document| &document.tenant_id == tenant_id)
            .ok_or_else(|| MetadataStoreError::NotFound(format!("document {document_id}")))?;
        let now = Utc::now();
        let entries = store.metadata.entry(document_id.clone()).or_default();
        if let Some(existing) = entries.iter_mut().find(|entry| entry.key == key) {
            existing.value = value;
            existing.updated_at = now;
            return Ok(existing.clone());
        }
        let entry = DocumentMetadataEntry {
            id: generate_id(),
            document_id: document_id.clone(),
            key,
            value,
            created_at: now,
            updated_at: now,
        };
        entries.push(entry.clone());
        Ok(entry)
    }

    async fn list_for_document(
        &self,
        tenant_id: &TenantId,
        document_id: &DocumentId,
    ) -> MetadataStoreResult<Vec<DocumentMetadataEntry>> {
        let store = self.state.read().await;
        store
            .documents
            .get(document_id)
            .filter(|document| &document.tenant_id == tenant_id)
            .ok_or_else(|| MetadataStoreError::NotFound(format!("document {document_id}")))?;
        Ok(store.metadata.get(document_id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl FolderRepository for InMemoryMetadataStore {
    async fn create(
        &self,
        tenant_id: &TenantId,
        request: NewFolder,
    ) -> MetadataStoreResult<Folder> {
        let mut store = self.state.write().await;
        if let Some(parent_id) = &request.parent_id {
            store
                .folders
                .get(parent_id)
                .filter(|folder| &folder.tenant_id == tenant_id)
                .ok_or_else(|| MetadataStoreError::NotFound(format!("folder {parent_id}")))?;
        }
        let path = Self::folder_path(&store, request.parent_id.as_ref(), &request.name);
        let now = Utc::now();
        let folder = Folder {
            id: generate_id(),
            tenant_id: tenant_id.clone(),
            parent_id: request.parent_id,
            name: request.name,
            path,
            owner_id: request.owner_id,
            created_at: now,
            updated_at: now,
        };
        store.folders.insert(folder.id.clone(), folder.clone());
        Ok(folder)
    }

    async fn get(&self, tenant_id: &TenantId, id: &FolderId) -> MetadataStoreResult<Folder> {
        let store = self.state.read().await;
        store
            .folders
            .get(id)
            .filter(|folder| &folder.tenant_id == tenant_id)
            .cloned()
            .ok_or_else(|| MetadataStoreError::NotFound(format!("folder {id}")))
    }

    async fn list_children(
        &self,
        tenant_id: &TenantId,
        parent_id: Option<&FolderId>,
        page: ValidPage,
    ) -> MetadataStoreResult<Paginated<Folder>> {
        let store = self.state.read().await;
        let mut children: Vec<Folder> = store
            .folders
            .values()
            .filter(|folder| &folder.tenant_id == tenant_id)
            .filter(|folder| folder.parent_id.as_ref() == parent_id)
            .cloned()
            .collect();
        children.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(Paginated::slice(children, page))
    }

    async fn move_folder(
        &self,
        tenant_id: &TenantId,
        id: &FolderId,
        new_parent_id: Option<FolderId>,
    ) -> MetadataStoreResult<Folder> {
        let mut store = self.state.write().await;
        store
            .folders
            .get(id)
            .filter(|folder| &folder.tenant_id == tenant_id)
            .ok_or_else(|| MetadataStoreError::NotFound(format!("folder {id}")))?;
        if let Some(new_parent_id) = &new_parent_id {
            if new_parent_id == id {
                return Err(MetadataStoreError::Conflict(
                    "a folder cannot become its own parent".into(),
                ));
            }
            store
                .folders
                .get(new_parent_id)
                .filter(|folder| &folder.tenant_id == tenant_id)
                .ok_or_else(|| MetadataStoreError::NotFound(format!("folder {new_parent_id}")))?;
            if Self::is_descendant(&store, new_parent_id, id) {
                return Err(MetadataStoreError::Conflict(
                    "move would create a folder cycle".into(),
                ));
            }
        }
        let name = store
            .folders
            .get(id)
            .map(|folder| folder.name.clone())
            .unwrap_or_default();
        let path = Self::folder_path(&store, new_parent_id.as_ref(), &name);
        let folder = store.folders.get_mut(id).expect("checked above");
        folder.parent_id = new_parent_id;
        folder.path = path;
        folder.updated_at = Utc::now();
        Ok(folder.clone())
    }
}

#[async_trait]
impl TagRepository for InMemoryMetadataStore {
    async fn create(&self, tenant_id: &TenantId, name: String) -> MetadataStoreResult<Tag> {
        let mut store = self.state.write().await;
        if store
            .tags
            .values()
            .any(|tag| &tag.tenant_id == tenant_id && tag.name == name)
        {
            return Err(MetadataStoreError::Conflict(format!(
                "tag {name} already exists"
            )));
        }
        let tag = Tag {
            id: generate_id(),
            tenant_id: tenant_id.clone(),
            name,
        };
        store.tags.insert(tag.id.clone(), tag.clone());
        Ok(tag)
    }

    async fn delete(&self, tenant_id: &TenantId, id: &TagId) -> MetadataStoreResult<()> {
        let mut store = self.state.write().await;
        store
            .tags
            .get(id)
            .filter(|tag| &tag.tenant_id == tenant_id)
            .ok_or_else(|| MetadataStoreError::NotFound(format!("tag {id}")))?;
        store.tags.remove(id);
        for tags in store.document_tags.values_mut() {
            tags.retain(|tag_id| tag_id != id);
        }
        Ok(())
    }

    async fn attach(
        &self,
        tenant_id: &TenantId,
        document_id: &DocumentId,
        tag_id: &TagId,
    ) -> MetadataStoreResult<()> {
        let mut store = self.state.write().await;
        store
            .documents
            .get(document_id)
            .filter(|document| &document.tenant_id == tenant_id)
            .ok_or_else(|| MetadataStoreError::NotFound(format!("document {document_id}")))?;
        store
            .tags
            .get(tag_id)
            .filter(|tag| &tag.tenant_id == tenant_id)
            .ok_or_else(|| MetadataStoreError::NotFound(format!("tag {tag_id}")))?;
        let tags = store.document_tags.entry(document_id.clone()).or_default();
        if !tags.contains(tag_id) {
            tags.push(tag_id.clone());
        }
        Ok(())
    }

    async fn list_for_document(
        &self,
        tenant_id: &TenantId,
        document_id: &DocumentId,
    ) -> MetadataStoreResult<Vec<Tag>> {
        let store = self.state.read().await;
        store
            .documents
            .get(document_id)
            .filter(|document| &document.tenant_id == tenant_id)
            .ok_or_else(|| MetadataStoreError::NotFound(format!("document {document_id}")))?;
        let tag_ids = store.document_tags.get(document_id).cloned().unwrap_or_default();
        Ok(tag_ids
            .iter()
            .filter_map(|tag_id| store.tags.get(tag_id).cloned())
            .collect())
    }
}

#[async_trait]
impl PermissionRepository for InMemoryMetadataStore {
    async fn grant(
        &self,
        tenant_id: &TenantId,
        mut grant: PermissionGrant,
    ) -> MetadataStoreResult<PermissionGrant> {
        let mut store = self.state.write().await;
        grant.tenant_id = tenant_id.clone();
        grant.id = generate_id();
        store.permissions.push(grant.clone());
        Ok(grant)
    }

    async fn list_for_resource(
        &self,
        tenant_id: &TenantId,
        resource_type: ResourceType,
        resource_id: &str,
    ) -> MetadataStoreResult<Vec<PermissionGrant>> {
        let store = self.state.read().await;
        Ok(store
            .permissions
            .iter()
            .filter(|grant| {
                &grant.tenant_id == tenant_id
                    && grant.resource_type == resource_type
                    && grant.resource_id == resource_id
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl EventRepository for InMemoryMetadataStore {
    async fn append(
        &self,
        tenant_id: &TenantId,
        event_type: String,
        payload: serde_json::Value,
    ) -> MetadataStoreResult<EventRecord> {
        let mut store = self.state.write().await;
        let event = EventRecord {
            id: generate_id(),
            tenant_id: tenant_id.clone(),
            event_type,
            payload,
            created_at: Utc::now(),
            published: false,
        };
        store.events.push(event.clone());
        Ok(event)
    }

    async fn list_unpublished(&self, limit: usize) -> MetadataStoreResult<Vec<EventRecord>> {
        let store = self.state.read().await;
        Ok(store
            .events
            .iter()
            .filter(|event| !event.published)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn mark_published(&self, id: &docflow_common::EventId) -> MetadataStoreResult<()> {
        let mut store = self.state.write().await;
        let event = store
            .events
            .iter_mut()
            .find(|event| &event.id == id)
            .ok_or_else(|| MetadataStoreError::NotFound(format!("event {id}")))?;
        event.published = true;
        Ok(())
    }
}

#[async_trait]
impl IngestionTransaction for InMemoryMetadataStore {
    async fn create_document_and_version(
        &self,
        tenant_id: &TenantId,
        document_id: DocumentId,
        version_id: VersionId,
        document: NewDocument,
        storage_path: String,
        created_by: UserId,
    ) -> MetadataStoreResult<(Document, DocumentVersion)> {
        let mut store = self.state.write().await;
        store
            .folders
            .get(&document.folder_id)
            .filter(|folder| &folder.tenant_id == tenant_id)
            .ok_or_else(|| MetadataStoreError::NotFound(format!("folder {}", document.folder_id)))?;
        let now = Utc::now();
        let new_document = Document {
            id: document_id.clone(),
            tenant_id: tenant_id.clone(),
            folder_id: document.folder_id,
            name: document.name,
            content_type: document.content_type.clone(),
            size: document.size,
            status: DocumentStatus::Processing,
            owner_id: document.owner_id,
            created_at: now,
            updated_at: now,
        };
        let version = DocumentVersion {
            id: version_id.clone(),
            document_id: document_id.clone(),
            version_number: 1,
            storage_path,
            checksum: String::new(),
            size: document.size,
            content_type: document.content_type,
            status: VersionStatus::Pending,
            created_at: now,
            created_by,
        };
        store.documents.insert(document_id, new_document.clone());
        store.versions.insert(version_id, version.clone());
        Ok((new_document, version))
    }

    async fn transition(
        &self,
        tenant_id: &TenantId,
        document_id: &DocumentId,
        version_id: &VersionId,
        target_document_status: DocumentStatus,
        target_version_status: VersionStatus,
        storage_path: Option<String>,
        checksum: Option<String>,
    ) -> MetadataStoreResult<TransitionOutcome> {
        let lock = self.lock_for(document_id).await;
        let _guard = lock.lock().await;

        let idempotency_key = (document_id.clone(), format!("{target_document_status}"));
        let mut store = self.state.write().await;

        if store.applied_transitions.contains(&idempotency_key) {
            let document = store
                .documents
                .get(document_id)
                .cloned()
                .ok_or_else(|| MetadataStoreError::NotFound(format!("document {document_id}")))?;
            let version = store
                .versions
                .get(version_id)
                .cloned()
                .ok_or_else(|| MetadataStoreError::NotFound(format!("version {version_id}")))?;
            return Ok(TransitionOutcome::AlreadyApplied(document, version));
        }

        let document = store
            .documents
            .get_mut(document_id)
            .filter(|document| &document.tenant_id == tenant_id)
            .ok_or_else(|| MetadataStoreError::NotFound(format!("document {document_id}")))?;
        document.status = target_document_status;
        document.updated_at = Utc::now();
        let document = document.clone();

        let version = store
            .versions
            .get_mut(version_id)
            .ok_or_else(|| MetadataStoreError::NotFound(format!("version {version_id}")))?;
        version.status = target_version_status;
        if let Some(storage_path) = storage_path {
            version.storage_path = storage_path;
        }
        if let Some(checksum) = checksum {
            version.checksum = checksum;
        }
        let version = version.clone();

        store.applied_transitions.insert(idempotency_key);
        Ok(TransitionOutcome::Applied(document, version))
    }
}

#[cfg(test)]
mod tests {
    use docflow_tenancy::Permission;
    use docflow_tenancy::Role;
    use pretty_assertions::assert_eq;

    use super::*;

    fn tenant() -> TenantId {
        "tenant-a".to_string()
    }

    async fn seed_folder(store: &InMemoryMetadataStore) -> FolderId {
        store
            .create(
                &tenant(),
                NewFolder {
                    parent_id: None,
                    name: "root".into(),
                    owner_id: "user-1".into(),
                },
            )
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn creates_document_in_processing_state() {
        let store = InMemoryMetadataStore::new();
        let folder_id = seed_folder(&store).await;
        let (document, version) = store
            .create_document_and_version(
                &tenant(),
                generate_id(),
                generate_id(),
                NewDocument {
                    folder_id,
                    name: "invoice.pdf".into(),
                    content_type: "application/pdf".into(),
                    size: 1024,
                    owner_id: "user-1".into(),
                },
                "temp/invoice.pdf".into(),
                "user-1".into(),
            )
            .await
            .unwrap();
        assert_eq!(document.status, DocumentStatus::Processing);
        assert_eq!(version.version_number, 1);
        assert_eq!(version.status, VersionStatus::Pending);
    }

    #[tokio::test]
    async fn transition_is_idempotent_per_target_state() {
        let store = InMemoryMetadataStore::new();
        let folder_id = seed_folder(&store).await;
        let (document, version) = store
            .create_document_and_version(
                &tenant(),
                generate_id(),
                generate_id(),
                NewDocument {
                    folder_id,
                    name: "report.pdf".into(),
                    content_type: "application/pdf".into(),
                    size: 2048,
                    owner_id: "user-1".into(),
                },
                "temp/report.pdf".into(),
                "user-1".into(),
            )
            .await
            .unwrap();

        let first = store
            .transition(
                &tenant(),
                &document.id,
                &version.id,
                DocumentStatus::Available,
                VersionStatus::Available,
                Some("permanent/report.pdf".into()),
                Some("deadbeef".into()),
            )
            .await
            .unwrap();
        assert!(matches!(first, TransitionOutcome::Applied(_, _)));

        let second = store
            .transition(
                &tenant(),
                &document.id,
                &version.id,
                DocumentStatus::Available,
                VersionStatus::Available,
                Some("permanent/report.pdf".into()),
                Some("deadbeef".into()),
            )
            .await
            .unwrap();
        assert!(matches!(second, TransitionOutcome::AlreadyApplied(_, _)));
    }

    #[tokio::test]
    async fn folder_move_rejects_cycle() {
        let store = InMemoryMetadataStore::new();
        let root_id = seed_folder(&store).await;
        let child = store
            .create(
                &tenant(),
                NewFolder {
                    parent_id: Some(root_id.clone()),
                    name: "child".into(),
                    owner_id: "user-1".into(),
                },
            )
            .await
            .unwrap();

        let result = store.move_folder(&tenant(), &root_id, Some(child.id)).await;
        assert!(matches!(result, Err(MetadataStoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn deleting_tag_removes_document_join() {
        let store = InMemoryMetadataStore::new();
        let folder_id = seed_folder(&store).await;
        let (document, _version) = store
            .create_document_and_version(
                &tenant(),
                generate_id(),
                generate_id(),
                NewDocument {
                    folder_id,
                    name: "notes.txt".into(),
                    content_type: "text/plain".into(),
                    size: 10,
                    owner_id: "user-1".into(),
                },
                "temp/notes.txt".into(),
                "user-1".into(),
            )
            .await
            .unwrap();
        let tag = store.create(&tenant(), "important".into()).await.unwrap();
        store.attach(&tenant(), &document.id, &tag.id).await.unwrap();
        assert_eq!(
            store.list_for_document(&tenant(), &document.id).await.unwrap().len(),
            1
        );

        store.delete(&tenant(), &tag.id).await.unwrap();
        assert_eq!(
            store.list_for_document(&tenant(), &document.id).await.unwrap().len(),
            0
        );
    }

    #[tokio::test]
    async fn permission_grant_is_scoped_to_tenant() {
        let store = InMemoryMetadataStore::new();
        let grant = store
            .grant(
                &tenant(),
                PermissionGrant {
                    id: String::new(),
                    tenant_id: String::new(),
                    role: Role::Editor,
                    resource_type: ResourceType::Folder,
                    resource_id: "folder-1".into(),
                    permission_type: Permission::Write,
                    inherited: false,
                },
            )
            .await
            .unwrap();
        assert_eq!(grant.tenant_id, tenant());
        let grants = store
            .list_for_resource(&tenant(), ResourceType::Folder, "folder-1")
            .await
            .unwrap();
        assert_eq!(grants.len(), 1);
    }

    #[tokio::test]
    async fn outbox_events_are_marked_published() {
        let store = InMemoryMetadataStore::new();
        let event = store
            .append(&tenant(), "document.created".into(), serde_json::json!({}))
            .await
            .unwrap();
        assert_eq!(store.list_unpublished(10).await.unwrap().len(), 1);
        store.mark_published(&event.id).await.unwrap();
        assert_eq!(store.list_unpublished(10).await.unwrap().len(), 0);
    }
}
