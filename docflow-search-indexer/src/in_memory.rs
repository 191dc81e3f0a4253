use std::collections::HashMap;

use async_trait::async_trait;
use docflow_common::DocumentId;
use docflow_common::FolderId;
use docflow_common::TenantId;
use docflow_common::ValidPage;
use tokio::sync::RwLock;

use crate::error::IndexerError;
use crate::error::IndexerResult;
use crate::query::content_query_score;
use crate::query::metadata_query_matches;
use crate::types::IndexedDocument;
use crate::types::SearchPage;

#[async_trait]
pub trait SearchIndexer: Send + Sync {
    /// Idempotent upsert keyed by `document_id`.
    async fn index(&self, tenant_id: &TenantId, document: IndexedDocument) -> IndexerResult<()>;

    async fn remove(&self, tenant_id: &TenantId, document_id: &DocumentId) -> IndexerResult<()>;

    async fn search_content(
        &self,
        tenant_id: &TenantId,
        query: &str,
        page: ValidPage,
    ) -> IndexerResult<SearchPage>;

    async fn search_metadata(
        &self,
        tenant_id: &TenantId,
        kv: HashMap<String, String>,
        page: ValidPage,
    ) -> IndexerResult<SearchPage>;

    async fn search_combined(
        &self,
        tenant_id: &TenantId,
        query: &str,
        kv: HashMap<String, String>,
        page: ValidPage,
    ) -> IndexerResult<SearchPage>;

    async fn search_in_folder(
        &self,
        tenant_id: &TenantId,
        folder_id: &FolderId,
        query: &str,
        page: ValidPage,
    ) -> IndexerResult<SearchPage>;
}

fn index_name(prefix: &str, tenant_id: &TenantId) -> String {
    format!("{prefix}-{tenant_id}")
}

fn require_tenant(tenant_id: &TenantId) -> IndexerResult<()> {
    if tenant_id.trim().is_empty() {
        return Err(IndexerError::Validation(
            "a query missing the tenant filter is rejected before dispatch".into(),
        ));
    }
    Ok(())
}

fn paginate(mut scored: Vec<(f32, IndexedDocument)>, page: ValidPage) -> SearchPage {
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    let total = scored.len() as i64;
    let offset = page.offset().max(0) as usize;
    let ids = if offset >= scored.len() {
        Vec::new()
    } else {
        let end = (offset + page.limit() as usize).min(scored.len());
        scored[offset..end]
            .iter()
            .map(|(_, document)| document.document_id.clone())
            .collect()
    };
    SearchPage {
        document_ids: ids,
        total,
    }
}

/// One inverted map per tenant index, named `{prefix}-{tenant-id}`.
/// Tenant isolation is enforced both by this per-index partitioning AND
/// by a hard tenant-id check on every query path, matching the
/// defense-in-depth requirement.
pub struct InMemorySearchIndexer {
    prefix: String,
    indices: RwLock<HashMap<String, HashMap<DocumentId, IndexedDocument>>>,
}

impl InMemorySearchIndexer {
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            indices: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl SearchIndexer for InMemorySearchIndexer {
    async fn index(&self, tenant_id: &TenantId, document: IndexedDocument) -> IndexerResult<()> {
        require_tenant(tenant_id)?;
        let mut indices = self.indices.write().await;
        let index = indices
            .entry(index_name(&self.prefix, tenant_id))
            .or_default();
        index.insert(document.document_id.clone(), document);
        Ok(())
    }

    async fn remove(&self, tenant_id: &TenantId, document_id: &DocumentId) -> IndexerResult<()> {
        require_tenant(tenant_id)?;
        let mut indices = self.indices.write().await;
        if let Some(index) = indices.get_mut(&index_name(&self.prefix, tenant_id)) {
            index.remove(document_id);
        }
        Ok(())
    }

    async fn search_content(
        &self,
        tenant_id: &TenantId,
        query: &str,
        page: ValidPage,
    ) -> IndexerResult<SearchPage> {
        require_tenant(tenant_id)?;
        let indices = self.indices.read().await;
        let Some(index) = indices.get(&index_name(&self.prefix, tenant_id)) else {
            return Ok(SearchPage {
                document_ids: Vec::new(),
                total: 0,
            });
        };
        let scored: Vec<(f32, IndexedDocument)> = index
            .values()
            .filter_map(|document| {
                content_query_score(query, document).map(|score| (score, document.clone()))
            })
            .collect();
        Ok(paginate(scored, page))
    }

    async fn search_metadata(
        &self,
        tenant_id: &TenantId,
        kv: HashMap<String, String>,
        page: ValidPage,
    ) -> IndexerResult<SearchPage> {
        require_tenant(tenant_id)?;
        let indices = self.indices.read().await;
        let Some(index) = indices.get(&index_name(&self.prefix, tenant_id)) else {
            return Ok(SearchPage {
                document_ids: Vec::new(),
                total: 0,
            });
        };
        let matched: Vec<(f32, IndexedDocument)> = index
            .values()
            .filter(|document| metadata_query_matches(&kv, document))
            .map(|document| (1.0, document.clone()))
            .collect();
        Ok(paginate(matched, page))
    }

    async fn search_combined(
        &self,
        tenant_id: &TenantId,
        query: &str,
        kv: HashMap<String, String>,
        page: ValidPage,
    ) -> IndexerResult<SearchPage> {
        require_tenant(tenant_id)?;
        let indices = self.indices.read().await;
        let Some(index) = indices.get(&index_name(&self.prefix, tenant_id)) else {
            return Ok(SearchPage {
                document_ids: Vec::new(),
                total: 0,
            });
        };
        let scored: Vec<(f32, IndexedDocument)> = index
            .values()
            .filter(|document| metadata_query_matches(&kv, document))
            .filter_map(|document| {
                content_query_score(query, document).map(|score| (score, document.clone()))
            })
            .collect();
        Ok(paginate(scored, page))
    }

    async fn search_in_folder(
        &self,
        tenant_id: &TenantId,
        folder_id: &FolderId,
        query: &str,
        page: ValidPage,
    ) -> IndexerResult<SearchPage> {
        require_tenant(tenant_id)?;
        let indices = self.indices.read().await;
        let Some(index) = indices.get(&index_name(&self.prefix, tenant_id)) else {
            return Ok(SearchPage {
                document_ids: Vec::new(),
                total: 0,
            });
        };
        let scored: Vec<(f32, IndexedDocument)> = index
            .values()
            .filter(|document| &document.folder_id == folder_id)
            .filter_map(|document| {
                content_query_score(query, document).map(|score| (score, document.clone()))
            })
            .collect();
        Ok(paginate(scored, page))
    }
}
