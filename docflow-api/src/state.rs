use std::sync::Arc;

use docflow_metadata_store::DocumentRepository;
use docflow_metadata_store::FolderRepository;
use docflow_metadata_store::MetadataKvRepository;
use docflow_orchestrator::Orchestrator;
use docflow_search_indexer::SearchIndexer;
use docflow_tenancy::AuthGuard;

/// Everything a handler needs, assembled once at startup and shared via
/// `axum::extract::State`. The router delegates immediately to these
/// collaborators rather than owning any business logic itself; the one
/// exception is read-only metadata lookup, which talks to the document
/// repository directly since the orchestrator only exposes the
/// stateful upload/download/delete operations.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub documents: Arc<dyn DocumentRepository>,
    pub folders: Arc<dyn FolderRepository>,
    pub metadata_kv: Arc<dyn MetadataKvRepository>,
    pub indexer: Arc<dyn SearchIndexer>,
    pub auth: Arc<dyn AuthGuard>,
    /// SSE key id applied to every object put through this front door;
    /// config-level, never accepted from a caller.
    pub sse_key_id: String,
}

impl AppState {
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        orchestrator: Arc<Orchestrator>,
        documents: Arc<dyn DocumentRepository>,
        folders: Arc<dyn FolderRepository>,
        metadata_kv: Arc<dyn MetadataKvRepository>,
        indexer: Arc<dyn SearchIndexer>,
        auth: Arc<dyn AuthGuard>,
        sse_key_id: String,
    ) -> Self {
        Self {
            orchestrator,
            documents,
            folders,
            metadata_kv,
            indexer,
            auth,
            sse_key_id,
        }
    }
}
