use std::sync::Arc;
use std::time::Duration;

use docflow_common::DocumentId;
use docflow_common::TenantId;
use docflow_events::EventPublisher;
use docflow_metadata_store::Document;
use docflow_metadata_store::DocumentRepository;
use docflow_metadata_store::DocumentStatus;
use docflow_metadata_store::IngestionTransaction;
use docflow_metadata_store::MetadataKvRepository;
use docflow_metadata_store::TransitionOutcome;
use docflow_metadata_store::VersionStatus;
use docflow_object_store::Bucket;
use docflow_object_store::ObjectKey;
use docflow_object_store::ObjectStoreAdapter;
use docflow_search_indexer::IndexedDocument;
use docflow_search_indexer::SearchIndexer;
use sha2::Digest;
use sha2::Sha256;
use tokio::sync::Semaphore;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::av_engine::AvEngine;
use crate::av_engine::ScanVerdict;
use crate::content_extractor::ContentExtractor;
use crate::error::ScanWorkerError;
use crate::error::ScanWorkerResult;
use crate::queue::ReceivedMessage;
use crate::queue::ScanMessage;
use crate::queue::ScanQueue;

/// How many messages a single poll round dequeues and how hard a
/// dependency failure presses the brakes before the next round.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub batch_size: usize,
    pub concurrency: usize,
    pub scan_timeout: Duration,
    pub poll_interval: Duration,
    pub cooldown: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            concurrency: 4,
            scan_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(250),
            cooldown: Duration::from_secs(5),
        }
    }
}

/// Drives the scan queue: fetch from temp storage, scan, and either
/// promote the version to `available` and index it, or quarantine it.
/// Every branch funnels through [`IngestionTransaction::transition`], so
/// the worker never mutates document state outside that one idempotent
/// entry point. `Clone` is cheap — every field is an `Arc` — so a fresh
/// handle can be moved into each spawned per-message task.
#[derive(Clone)]
pub struct Worker {
    queue: Arc<dyn ScanQueue>,
    av_engine: Arc<dyn AvEngine>,
    content_extractor: Arc<dyn ContentExtractor>,
    object_store: Arc<dyn ObjectStoreAdapter>,
    documents: Arc<dyn DocumentRepository>,
    transactions: Arc<dyn IngestionTransaction>,
    metadata_kv: Arc<dyn MetadataKvRepository>,
    indexer: Arc<dyn SearchIndexer>,
    publisher: Arc<EventPublisher>,
    config: WorkerConfig,
}

impl Worker {
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        queue: Arc<dyn ScanQueue>,
        av_engine: Arc<dyn AvEngine>,
        content_extractor: Arc<dyn ContentExtractor>,
        object_store: Arc<dyn ObjectStoreAdapter>,
        documents: Arc<dyn DocumentRepository>,
        transactions: Arc<dyn IngestionTransaction>,
        metadata_kv: Arc<dyn MetadataKvRepository>,
        indexer: Arc<dyn SearchIndexer>,
        publisher: Arc<EventPublisher>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            queue,
            av_engine,
            content_extractor,
            object_store,
            documents,
            transactions,
            metadata_kv,
            indexer,
            publisher,
            config,
        }
    }

    /// Runs until `shutdown` resolves, draining whatever is already
    /// in-flight before returning.
    pub async fn run(&self, mut shutdown: tokio::sync::oneshot::Receiver<()>) {
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("scan worker shutting down");
                    return;
                }
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }

            let received = match self.queue.receive(self.config.batch_size).await {
                Ok(messages) => messages,
                Err(err) => {
                    error!(error = %err, "failed to receive from scan queue");
                    tokio::time::sleep(self.config.cooldown).await;
                    continue;
                }
            };
            if received.is_empty() {
                continue;
            }

            let mut handles = Vec::with_capacity(received.len());
            for item in received {
                let permit = Arc::clone(&semaphore)
                    .acquire_owned()
                    .await
                    .expect("semaphore is never closed");
                let worker = self.clone();
                handles.push(tokio::spawn(async move {
                    let _permit = permit;
                    worker.process(item).await
                }));
            }

            let mut hit_dependency_error = false;
            for handle in handles {
                match handle.await {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => {
                        warn!(error = %err, "scan message processing failed");
                        if matches!(err, ScanWorkerError::Dependency(_)) {
                            hit_dependency_error = true;
                        }
                    }
                    Err(join_err) => error!(error = %join_err, "scan worker task panicked"),
                }
            }
            if hit_dependency_error {
                tokio::time::sleep(self.config.cooldown).await;
            }
        }
    }

    async fn process(&self, item: ReceivedMessage) -> ScanWorkerResult<()> {
        let ReceivedMessage { handle, message, .. } = item;

        match self.process_message(&message).await {
            Ok(()) => {
                self.queue.ack(&handle).await?;
                Ok(())
            }
            Err(ScanWorkerError::Dependency(reason)) => {
                self.queue.nack(&handle).await?;
                Err(ScanWorkerError::Dependency(reason))
            }
            Err(err) => {
                // Not retryable: malformed message. Nack it anyway so its
                // receive count still climbs toward the dead-letter queue
                // rather than blocking the partition forever.
                error!(document_id = %message.document_id, error = %err, "scan message is not retryable");
                self.queue.nack(&handle).await?;
                Err(err)
            }
        }
    }

    async fn process_message(&self, message: &ScanMessage) -> ScanWorkerResult<()> {
        // A document past `processing` has already been through this exact
        // transition under a prior delivery of the same message; the
        // object it would scan may no longer even be in temp storage.
        let document = self.documents.get(&message.tenant_id, &message.document_id).await?;
        if !matches!(document.status, DocumentStatus::Processing) {
            info!(document_id = %message.document_id, status = %document.status, "skipping redelivered scan message for a document past processing");
            return Ok(());
        }

        let key = ObjectKey::parse(&message.storage_path).ok_or_else(|| {
            ScanWorkerError::Validation(format!("malformed storage path: {}", message.storage_path))
        })?;

        let stored = self.object_store.get(&message.tenant_id, Bucket::Temp, &key).await?;

        let verdict = match tokio::time::timeout(self.config.scan_timeout, self.av_engine.scan(&stored.payload)).await
        {
            Ok(result) => result?,
            Err(_) => ScanVerdict::Error,
        };

        match verdict {
            ScanVerdict::Clean => {
                self.handle_clean(message, &document, &key, &stored.content_type, &stored.payload)
                    .await
            }
            ScanVerdict::Infected => self.handle_infected(message, &key).await,
            ScanVerdict::Error => Err(ScanWorkerError::Dependency(
                "av engine returned a transient error".into(),
            )),
        }
    }

    /// Performs every side effect (copy, content extraction, indexing)
    /// before calling the authoritative transition, and only after it
    /// succeeds. A crash before `transition` leaves the document in
    /// `processing`, so redelivery simply redoes these idempotent steps;
    /// a crash after it would let a redelivered message slip past the
    /// `processing`-only guard in [`Self::process_message`], reversing
    /// order instead would leave the document marked `available` with no
    /// object copied and nothing indexed and no way to retry.
    async fn handle_clean(
        &self,
        message: &ScanMessage,
        document: &Document,
        key: &ObjectKey,
        content_type: &str,
        payload: &[u8],
    ) -> ScanWorkerResult<()> {
        self.object_store
            .copy(&message.tenant_id, Bucket::Temp, Bucket::Permanent, key)
            .await?;

        let content = match self.content_extractor.extract(content_type, payload).await {
            Ok(content) => content,
            Err(ScanWorkerError::Validation(reason)) => {
                warn!(document_id = %message.document_id, reason, "skipping content extraction");
                String::new()
            }
            Err(err) => return Err(err),
        };

        let metadata_entries = self
            .metadata_kv
            .list_for_document(&message.tenant_id, &document.id)
            .await?;
        let metadata = metadata_entries
            .into_iter()
            .map(|entry| (entry.key, entry.value))
            .collect();

        self.indexer
            .index(
                &message.tenant_id,
                IndexedDocument {
                    document_id: document.id.clone(),
                    folder_id: document.folder_id.clone(),
                    name: document.name.clone(),
                    content_type: document.content_type.clone(),
                    size: document.size,
                    status: document.status.to_string(),
                    content,
                    metadata,
                    created_at: document.created_at,
                    updated_at: document.updated_at,
                },
            )
            .await?;

        let checksum = format!("{:x}", Sha256::digest(payload));
        let outcome = self
            .transactions
            .transition(
                &message.tenant_id,
                &message.document_id,
                &message.version_id,
                DocumentStatus::Available,
                VersionStatus::Available,
                None,
                Some(checksum),
            )
            .await?;

        if matches!(outcome, TransitionOutcome::Applied(..)) {
            self.publish(&message.tenant_id, &document.id, "document.processed")
                .await;
        }
        self.cleanup_temp(&message.tenant_id, key).await;
        Ok(())
    }

    async fn handle_infected(&self, message: &ScanMessage, key: &ObjectKey) -> ScanWorkerResult<()> {
        self.object_store
            .copy(&message.tenant_id, Bucket::Temp, Bucket::Quarantine, key)
            .await?;

        let outcome = self
            .transactions
            .transition(
                &message.tenant_id,
                &message.document_id,
                &message.version_id,
                DocumentStatus::Quarantined,
                VersionStatus::Quarantined,
                None,
                None,
            )
            .await?;

        if matches!(outcome, TransitionOutcome::Applied(..)) {
            self.publish(&message.tenant_id, &message.document_id, "document.quarantined")
                .await;
        }
        self.cleanup_temp(&message.tenant_id, key).await;
        Ok(())
    }

    /// Drains the queue's dead-letter list and drives each document
    /// still stuck in `processing` to `failed`. The worker is the
    /// natural home for this rather than a standalone reaper process: it
    /// already owns the queue's receive-count bookkeeping, so no second
    /// component needs to learn when a message has exhausted its
    /// retries.
    pub async fn reap_dead_letters(&self) -> usize {
        let dead_letters = self.queue.dead_letters().await;
        let mut reaped = 0;
        for message in dead_letters {
            match self.fail_document(&message).await {
                Ok(()) => reaped += 1,
                Err(err) => {
                    error!(document_id = %message.document_id, error = %err, "failed to reap dead-lettered scan message");
                }
            }
        }
        reaped
    }

    async fn fail_document(&self, message: &ScanMessage) -> ScanWorkerResult<()> {
        let outcome = self
            .transactions
            .transition(
                &message.tenant_id,
                &message.document_id,
                &message.version_id,
                DocumentStatus::Failed,
                VersionStatus::Failed,
                None,
                None,
            )
            .await?;

        if matches!(outcome, TransitionOutcome::AlreadyApplied(..)) {
            return Ok(());
        }

        if let Some(key) = ObjectKey::parse(&message.storage_path) {
            self.cleanup_temp(&message.tenant_id, &key).await;
        } else {
            warn!(storage_path = %message.storage_path, "dead-lettered message carries an unparsable storage path");
        }

        self.publish(&message.tenant_id, &message.document_id, "document.failed")
            .await;
        Ok(())
    }

    /// Best-effort: the object may already be gone if a prior attempt at
    /// this same transition got as far as deleting it before crashing.
    async fn cleanup_temp(&self, tenant_id: &TenantId, key: &ObjectKey) {
        if let Err(err) = self.object_store.delete(tenant_id, Bucket::Temp, key).await {
            warn!(error = %err, "failed to clean up temp object after move");
        }
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

#[cfg(test)]
mod tests {
    use docflow_events::InMemoryEventBroker;
    use docflow_metadata_store::InMemoryMetadataStore;
    use docflow_metadata_store::NewDocument;
    use docflow_metadata_store::NewFolder;
    use docflow_metadata_store::VersionRepository;
    use docflow_object_store::EncryptionAlgorithm;
    use docflow_object_store::EncryptionContext;
    use docflow_object_store::EncryptionEnvelope;
    use docflow_object_store::EnvelopeEncryptor;
    use docflow_object_store::InMemoryObjectStore;
    use docflow_object_store::ObjectStoreResult;
    use docflow_object_store::PutRequest;
    use docflow_common::PageRequest;
    use docflow_search_indexer::InMemorySearchIndexer;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::av_engine::MockAvEngine;
    use crate::content_extractor::PlainTextExtractor;
    use crate::queue::InMemoryScanQueue;

    struct NoopEncryptor;

    #[async_trait::async_trait]
    impl EnvelopeEncryptor for NoopEncryptor {
        async fn wrap(&self, context: &EncryptionContext) -> ObjectStoreResult<EncryptionEnvelope> {
            Ok(EncryptionEnvelope {
                key_id: context.key_id.clone(),
                algorithm: EncryptionAlgorithm::SseKms,
            })
        }
    }

    struct Harness {
        worker: Worker,
        queue: Arc<InMemoryScanQueue>,
        metadata: Arc<InMemoryMetadataStore>,
        object_store: Arc<InMemoryObjectStore>,
        indexer: Arc<InMemorySearchIndexer>,
        av_engine: Arc<MockAvEngine>,
    }

    fn harness() -> Harness {
        let queue = Arc::new(InMemoryScanQueue::default());
        let av_engine = Arc::new(MockAvEngine::default());
        let content_extractor = Arc::new(PlainTextExtractor::default());
        let object_store = Arc::new(InMemoryObjectStore::new(Arc::new(NoopEncryptor)));
        let metadata = Arc::new(InMemoryMetadataStore::new());
        let indexer = Arc::new(InMemorySearchIndexer::new("docs"));
        let broker = Arc::new(InMemoryEventBroker::default());
        let publisher = Arc::new(EventPublisher::new(metadata.clone(), broker));

        let worker = Worker::new(
            queue.clone(),
            av_engine.clone(),
            content_extractor,
            object_store.clone(),
            metadata.clone(),
            metadata.clone(),
            metadata.clone(),
            indexer.clone(),
            publisher,
            WorkerConfig {
                scan_timeout: Duration::from_millis(200),
                ..WorkerConfig::default()
            },
        );
        Harness {
            worker,
            queue,
            metadata,
            object_store,
            indexer,
            av_engine,
        }
    }

    async fn seed(metadata: &InMemoryMetadataStore, object_store: &InMemoryObjectStore, tenant: &str, payload: &[u8]) -> ScanMessage {
        let folder = metadata
            .create(
                &tenant.to_string(),
                NewFolder {
                    parent_id: None,
                    name: "root".into(),
                    owner_id: "user-1".into(),
                },
            )
            .await
            .unwrap();

        let document_id = docflow_common::generate_id();
        let version_id = docflow_common::generate_id();
        let key = ObjectKey::new(tenant.to_string(), document_id.clone(), version_id.clone());

        let (document, version) = metadata
            .create_document_and_version(
                &tenant.to_string(),
                document_id,
                version_id,
                NewDocument {
                    folder_id: folder.id,
                    name: "report.txt".into(),
                    content_type: "text/plain".into(),
                    size: payload.len() as u64,
                    owner_id: "user-1".into(),
                },
                key.path(),
                "user-1".into(),
            )
            .await
            .unwrap();
        object_store
            .put(
                &tenant.to_string(),
                PutRequest {
                    key: key.clone(),
                    bucket: Bucket::Temp,
                    payload: payload.to_vec(),
                    content_type: "text/plain".into(),
                    sse_key_id: "kms-key-1".into(),
                },
            )
            .await
            .unwrap();

        ScanMessage {
            document_id: document.id,
            version_id: version.id,
            tenant_id: tenant.to_string(),
            storage_path: key.path(),
            enqueued_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn clean_document_is_promoted_copied_and_indexed() {
        let h = harness();
        let message = seed(&h.metadata, &h.object_store, "tenant-a", b"hello world").await;
        let key = ObjectKey::parse(&message.storage_path).unwrap();
        h.queue.enqueue(message.clone()).await.unwrap();

        let received = h.queue.receive(1).await.unwrap();
        h.worker.process(received.into_iter().next().unwrap()).await.unwrap();

        let document = h.metadata.get(&"tenant-a".to_string(), &message.document_id).await.unwrap();
        assert_eq!(document.status, DocumentStatus::Available);

        let version = VersionRepository::get(&*h.metadata, &"tenant-a".to_string(), &message.version_id)
            .await
            .unwrap();
        assert_eq!(version.checksum, format!("{:x}", Sha256::digest(b"hello world")));

        assert!(h.object_store.get(&"tenant-a".to_string(), Bucket::Permanent, &key).await.is_ok());
        assert!(h.object_store.get(&"tenant-a".to_string(), Bucket::Temp, &key).await.is_err());

        let results = h
            .indexer
            .search_content(&"tenant-a".to_string(), "hello", PageRequest::new(1, 20).validated().unwrap())
            .await
            .unwrap();
        assert_eq!(results.document_ids, vec![message.document_id]);
    }

    #[tokio::test]
    async fn clean_document_carries_its_metadata_kv_entries_into_the_index() {
        let h = harness();
        let message = seed(&h.metadata, &h.object_store, "tenant-a", b"hello world").await;
        h.metadata
            .upsert(
                &"tenant-a".to_string(),
                &message.document_id,
                "department".to_string(),
                "finance".to_string(),
            )
            .await
            .unwrap();
        h.queue.enqueue(message.clone()).await.unwrap();

        let received = h.queue.receive(1).await.unwrap();
        h.worker.process(received.into_iter().next().unwrap()).await.unwrap();

        let mut kv = std::collections::HashMap::new();
        kv.insert("department".to_string(), "finance".to_string());
        let results = h
            .indexer
            .search_metadata(&"tenant-a".to_string(), kv, PageRequest::new(1, 20).validated().unwrap())
            .await
            .unwrap();
        assert_eq!(results.document_ids, vec![message.document_id]);
    }

    #[tokio::test]
    async fn infected_document_is_quarantined() {
        let h = harness();
        let message = seed(&h.metadata, &h.object_store, "tenant-a", b"eicar-signature").await;
        let key = ObjectKey::parse(&message.storage_path).unwrap();
        h.av_engine.mark_infected(b"eicar-signature".to_vec()).await;
        h.queue.enqueue(message.clone()).await.unwrap();

        let received = h.queue.receive(1).await.unwrap();
        h.worker.process(received.into_iter().next().unwrap()).await.unwrap();

        let document = h.metadata.get(&"tenant-a".to_string(), &message.document_id).await.unwrap();
        assert_eq!(document.status, DocumentStatus::Quarantined);
        assert!(h.object_store.get(&"tenant-a".to_string(), Bucket::Quarantine, &key).await.is_ok());
    }

    #[tokio::test]
    async fn av_error_leaves_message_for_redelivery() {
        let h = harness();
        let message = seed(&h.metadata, &h.object_store, "tenant-a", b"hello").await;
        h.av_engine.force_error_next_n(1).await;
        h.queue.enqueue(message.clone()).await.unwrap();

        let received = h.queue.receive(1).await.unwrap();
        let handle = received[0].handle.clone();
        let err = h.worker.process(received.into_iter().next().unwrap()).await.unwrap_err();
        assert!(matches!(err, ScanWorkerError::Dependency(_)));

        assert!(h.queue.ack(&handle).await.is_err());
        let redelivered = h.queue.receive(1).await.unwrap();
        assert_eq!(redelivered.len(), 1);
        assert_eq!(redelivered[0].message.document_id, message.document_id);
    }

    #[tokio::test]
    async fn duplicate_delivery_of_an_applied_transition_is_a_noop() {
        let h = harness();
        let message = seed(&h.metadata, &h.object_store, "tenant-a", b"hello").await;
        h.queue.enqueue(message.clone()).await.unwrap();

        let first = h.queue.receive(1).await.unwrap();
        h.worker.process(first.into_iter().next().unwrap()).await.unwrap();

        // Simulate redelivery of the same message after the first ack was
        // lost in transit: re-enqueue it and process it a second time.
        h.queue.enqueue(message.clone()).await.unwrap();
        let second = h.queue.receive(1).await.unwrap();
        h.worker.process(second.into_iter().next().unwrap()).await.unwrap();

        let document = h.metadata.get(&"tenant-a".to_string(), &message.document_id).await.unwrap();
        assert_eq!(document.status, DocumentStatus::Available);
    }

    #[tokio::test]
    async fn reap_dead_letters_fails_documents_exhausted_on_retries() {
        let h = harness();
        let message = seed(&h.metadata, &h.object_store, "tenant-a", b"hello").await;
        h.queue.enqueue(message.clone()).await.unwrap();

        for _ in 0..crate::queue::MAX_RECEIVE_COUNT {
            let received = h.queue.receive(1).await.unwrap();
            h.queue.nack(&received[0].handle).await.unwrap();
        }
        assert_eq!(h.queue.dead_letters().await.len(), 1);

        assert_eq!(h.worker.reap_dead_letters().await, 1);

        let document = h.metadata.get(&"tenant-a".to_string(), &message.document_id).await.unwrap();
        assert_eq!(document.status, DocumentStatus::Failed);
    }
}
