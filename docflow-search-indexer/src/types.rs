use std::collections::HashMap;

use chrono::DateTime;
use chrono::Utc;
use docflow_common::DocumentId;
use docflow_common::FolderId;

/// What gets submitted to the indexer after a document's content is
/// available. Mirrors the indexed fields of a document without owning
/// persistence — the index is fully reconstructable from the object store
/// and metadata store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedDocument {
    pub document_id: DocumentId,
    pub folder_id: FolderId,
    pub name: String,
    pub content_type: String,
    pub size: u64,
    pub status: String,
    pub content: String,
    pub metadata: HashMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPage {
    pub document_ids: Vec<DocumentId>,
    pub total: i64,
}
