#![deny(clippy::print_stdout, clippy::print_stderr)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Duration as ChronoDuration;
use chrono::Utc;
use docflow_common::DocumentId;
use docflow_common::TenantId;
use docflow_common::VersionId;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

pub type ObjectStoreResult<T> = Result<T, ObjectStoreError>;

#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("security policy violation: {0}")]
    Security(String),
    #[error("dependency failure: {0}")]
    Dependency(String),
}

impl From<ObjectStoreError> for docflow_common::ApiError {
    fn from(err: ObjectStoreError) -> Self {
        match err {
            ObjectStoreError::NotFound(message) => docflow_common::ApiError::not_found(message),
            ObjectStoreError::Validation(message) => docflow_common::ApiError::validation(message),
            ObjectStoreError::Security(message) => {
                docflow_common::ApiError::authorization(message)
            }
            ObjectStoreError::Dependency(message) => docflow_common::ApiError::dependency(message),
        }
    }
}

/// The three logical buckets objects can live in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    Temp,
    Permanent,
    Quarantine,
}

impl Bucket {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Bucket::Temp => "temp",
            Bucket::Permanent => "permanent",
            Bucket::Quarantine => "quarantine",
        }
    }
}

/// Builds the tenant-prefixed key scheme
/// `{tenant-id}/{document-id}/{version-id}/{uuid}`. Keys never contain
/// user-supplied strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectKey {
    pub tenant_id: TenantId,
    pub document_id: DocumentId,
    pub version_id: VersionId,
    pub unique: String,
}

impl ObjectKey {
    #[must_use]
    pub fn new(tenant_id: TenantId, document_id: DocumentId, version_id: VersionId) -> Self {
        Self {
            tenant_id,
            document_id,
            version_id,
            unique: Uuid::new_v4().to_string(),
        }
    }

    #[must_use]
    pub fn path(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.tenant_id, self.document_id, self.version_id, self.unique
        )
    }

    /// Reconstructs a key from a previously built path, e.g. one carried
    /// on a scan message. Returns `None` if `path` doesn't have the
    /// `{tenant}/{document}/{version}/{uuid}` shape.
    #[must_use]
    pub fn parse(path: &str) -> Option<Self> {
        let mut segments = path.splitn(4, '/');
        let tenant_id = segments.next()?.to_string();
        let document_id = segments.next()?.to_string();
        let version_id = segments.next()?.to_string();
        let unique = segments.next()?.to_string();
        Some(Self {
            tenant_id,
            document_id,
            version_id,
            unique,
        })
    }
}

/// Server-side encryption context handed to a tenant-scoped key wrapper.
/// Every `put` specifies encryption with a tenant-scoped key reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptionContext {
    pub tenant_id: TenantId,
    pub key_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptionEnvelope {
    pub key_id: String,
    pub algorithm: EncryptionAlgorithm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncryptionAlgorithm {
    SseKms,
}

#[async_trait]
pub trait EnvelopeEncryptor: Send + Sync {
    async fn wrap(&self, context: &EncryptionContext) -> ObjectStoreResult<EncryptionEnvelope>;
}

#[derive(Debug, Clone)]
pub struct PutRequest {
    pub key: ObjectKey,
    pub bucket: Bucket,
    pub payload: Vec<u8>,
    pub content_type: String,
    pub sse_key_id: String,
}

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub payload: Vec<u8>,
    pub content_type: String,
    pub envelope: EncryptionEnvelope,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectHead {
    pub size: u64,
    pub sse_key_id_present: bool,
}

/// Tenant-scoped put/get/copy/delete/presign/head across the three
/// logical buckets. Every method takes `tenant_id` as a parameter
/// independent of `key`, exactly as `DocumentRepository`/`SearchIndexer`
/// do, so an implementation validates the caller's tenant against the
/// key rather than trusting the key to vouch for itself.
#[async_trait]
pub trait ObjectStoreAdapter: Send + Sync {
    async fn put(&self, tenant_id: &TenantId, request: PutRequest) -> ObjectStoreResult<()>;

    async fn get(
        &self,
        tenant_id: &TenantId,
        bucket: Bucket,
        key: &ObjectKey,
    ) -> ObjectStoreResult<StoredObject>;

    async fn copy(
        &self,
        tenant_id: &TenantId,
        src_bucket: Bucket,
        dst_bucket: Bucket,
        key: &ObjectKey,
    ) -> ObjectStoreResult<()>;

    async fn delete(&self, tenant_id: &TenantId, bucket: Bucket, key: &ObjectKey) -> ObjectStoreResult<()>;

    async fn presign(
        &self,
        tenant_id: &TenantId,
        bucket: Bucket,
        key: &ObjectKey,
        ttl_secs: u64,
    ) -> ObjectStoreResult<PresignedUrl>;

    async fn head(&self, tenant_id: &TenantId, bucket: Bucket, key: &ObjectKey) -> ObjectStoreResult<ObjectHead>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignedUrl {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

const PRESIGN_MIN_SECS: u64 = 60;
const PRESIGN_MAX_SECS: u64 = 3600;

/// Clamps a caller-requested presign TTL into `[60, 3600]` seconds.
#[must_use]
pub fn clamp_presign_ttl(requested_secs: u64) -> u64 {
    requested_secs.clamp(PRESIGN_MIN_SECS, PRESIGN_MAX_SECS)
}

/// Checks the caller-supplied `tenant_id` against `key.tenant_id`
/// independently of how `key` itself was constructed, so a forged or
/// stale key can never be used to reach another tenant's object.
fn require_tenant_prefix(tenant_id: &TenantId, key: &ObjectKey) -> ObjectStoreResult<()> {
    if &key.tenant_id != tenant_id {
        // Cross-tenant reads are indistinguishable from a true miss.
        return Err(ObjectStoreError::NotFound(key.path()));
    }
    Ok(())
}

#[derive(Clone)]
pub struct InMemoryObjectStore {
    state: Arc<RwLock<HashMap<(Bucket, String), StoredObject>>>,
    encryptor: Arc<dyn EnvelopeEncryptor>,
}

impl InMemoryObjectStore {
    #[must_use]
    pub fn new(encryptor: Arc<dyn EnvelopeEncryptor>) -> Self {
        Self {
            state: Arc::new(RwLock::new(HashMap::new())),
            encryptor,
        }
    }
}

#[async_trait]
impl ObjectStoreAdapter for InMemoryObjectStore {
    async fn put(&self, tenant_id: &TenantId, request: PutRequest) -> ObjectStoreResult<()> {
        require_tenant_prefix(tenant_id, &request.key)?;
        if request.sse_key_id.trim().is_empty() {
            return Err(ObjectStoreError::Security(
                "refusing unencrypted write: no SSE key id supplied".into(),
            ));
        }
        let envelope = self
            .encryptor
            .wrap(&EncryptionContext {
                tenant_id: request.key.tenant_id.clone(),
                key_id: request.sse_key_id.clone(),
            })
            .await?;

        let stored = StoredObject {
            payload: request.payload,
            content_type: request.content_type,
            envelope,
        };
        let mut guard = self.state.write().await;
        guard.insert((request.bucket, request.key.path()), stored);
        Ok(())
    }

    async fn get(&self, tenant_id: &TenantId, bucket: Bucket, key: &ObjectKey) -> ObjectStoreResult<StoredObject> {
        require_tenant_prefix(tenant_id, key)?;
        let guard = self.state.read().await;
        guard
            .get(&(bucket, key.path()))
            .cloned()
            .ok_or_else(|| ObjectStoreError::NotFound(key.path()))
    }

    async fn copy(
        &self,
        tenant_id: &TenantId,
        src_bucket: Bucket,
        dst_bucket: Bucket,
        key: &ObjectKey,
    ) -> ObjectStoreResult<()> {
        let object = self.get(tenant_id, src_bucket, key).await?;
        let mut guard = self.state.write().await;
        guard.insert((dst_bucket, key.path()), object);
        Ok(())
    }

    async fn delete(&self, tenant_id: &TenantId, bucket: Bucket, key: &ObjectKey) -> ObjectStoreResult<()> {
        require_tenant_prefix(tenant_id, key)?;
        let mut guard = self.state.write().await;
        guard
            .remove(&(bucket, key.path()))
            .map(|_| ())
            .ok_or_else(|| ObjectStoreError::NotFound(key.path()))
    }

    async fn presign(
        &self,
        tenant_id: &TenantId,
        bucket: Bucket,
        key: &ObjectKey,
        ttl_secs: u64,
    ) -> ObjectStoreResult<PresignedUrl> {
        require_tenant_prefix(tenant_id, key)?;
        let clamped = clamp_presign_ttl(ttl_secs);
        Ok(PresignedUrl {
            url: format!("https://mock-object-store/{}/{}", bucket.name(), key.path()),
            expires_at: Utc::now() + ChronoDuration::seconds(clamped as i64),
        })
    }

    async fn head(&self, tenant_id: &TenantId, bucket: Bucket, key: &ObjectKey) -> ObjectStoreResult<ObjectHead> {
        let object = self.get(tenant_id, bucket, key).await?;
        Ok(ObjectHead {
            size: object.payload.len() as u64,
            sse_key_id_present: true,
        })
    }
}

#[derive(Default)]
pub struct MockEnvelopeEncryptor;

#[async_trait]
impl EnvelopeEncryptor for MockEnvelopeEncryptor {
    async fn wrap(&self, context: &EncryptionContext) -> ObjectStoreResult<EncryptionEnvelope> {
        Ok(EncryptionEnvelope {
            key_id: format!("mock-kms:{}:{}", context.tenant_id, context.key_id),
            algorithm: EncryptionAlgorithm::SseKms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> InMemoryObjectStore {
        InMemoryObjectStore::new(Arc::new(MockEnvelopeEncryptor))
    }

    fn sample_key(tenant: &str) -> ObjectKey {
        ObjectKey::new(tenant.to_string(), "doc-1".into(), "v1".into())
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let store = store();
        let key = sample_key("tenant-a");
        store
            .put(
                &"tenant-a".to_string(),
                PutRequest {
                    key: key.clone(),
                    bucket: Bucket::Temp,
                    payload: vec![1, 2, 3],
                    content_type: "application/pdf".into(),
                    sse_key_id: "kms-key-1".into(),
                },
            )
            .await
            .expect("put");

        let fetched = store
            .get(&"tenant-a".to_string(), Bucket::Temp, &key)
            .await
            .expect("get");
        assert_eq!(fetched.payload, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn refuses_unencrypted_write() {
        let store = store();
        let key = sample_key("tenant-a");
        let err = store
            .put(
                &"tenant-a".to_string(),
                PutRequest {
                    key,
                    bucket: Bucket::Temp,
                    payload: vec![1],
                    content_type: "application/pdf".into(),
                    sse_key_id: String::new(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ObjectStoreError::Security(_)));
    }

    #[tokio::test]
    async fn put_rejects_a_key_outside_the_caller_supplied_tenant() {
        let store = store();
        let key = sample_key("tenant-a");
        let err = store
            .put(
                &"tenant-b".to_string(),
                PutRequest {
                    key,
                    bucket: Bucket::Temp,
                    payload: vec![1],
                    content_type: "text/plain".into(),
                    sse_key_id: "kms-key".into(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ObjectStoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn cross_tenant_read_is_not_found() {
        let store = store();
        let key = sample_key("tenant-a");
        store
            .put(
                &"tenant-a".to_string(),
                PutRequest {
                    key: key.clone(),
                    bucket: Bucket::Temp,
                    payload: vec![1],
                    content_type: "text/plain".into(),
                    sse_key_id: "kms-key".into(),
                },
            )
            .await
            .expect("put");

        // Same key, but a caller asserting a different tenant id must be
        // rejected independently of what the key itself carries.
        let err = store
            .get(&"tenant-b".to_string(), Bucket::Temp, &key)
            .await
            .unwrap_err();
        assert!(matches!(err, ObjectStoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn copy_moves_object_between_buckets() {
        let store = store();
        let key = sample_key("tenant-a");
        store
            .put(
                &"tenant-a".to_string(),
                PutRequest {
                    key: key.clone(),
                    bucket: Bucket::Temp,
                    payload: vec![9, 9],
                    content_type: "text/plain".into(),
                    sse_key_id: "kms-key".into(),
                },
            )
            .await
            .expect("put");

        store
            .copy(&"tenant-a".to_string(), Bucket::Temp, Bucket::Permanent, &key)
            .await
            .expect("copy");

        let fetched = store
            .get(&"tenant-a".to_string(), Bucket::Permanent, &key)
            .await
            .expect("get copy");
        assert_eq!(fetched.payload, vec![9, 9]);
    }

    #[test]
    fn presign_ttl_clamped_to_bounds() {
        assert_eq!(clamp_presign_ttl(10), PRESIGN_MIN_SECS);
        assert_eq!(clamp_presign_ttl(999_999), PRESIGN_MAX_SECS);
        assert_eq!(clamp_presign_ttl(120), 120);
    }

    #[test]
    fn object_key_path_matches_tenant_document_version_uuid_scheme() {
        let key = ObjectKey::new("tenant-a".into(), "doc-1".into(), "v1".into());
        let segments: Vec<&str> = key.path().split('/').collect();
        assert_eq!(segments.len(), 4);
        assert_eq!(segments[0], "tenant-a");
        assert_eq!(segments[1], "doc-1");
        assert_eq!(segments[2], "v1");
    }
}
