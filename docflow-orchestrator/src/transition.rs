use docflow_metadata_store::DocumentStatus;

/// The document-status edges this orchestrator is allowed to drive
/// directly. `processing -> available|quarantined` and `processing ->
/// failed` are both driven by the scan worker through the same
/// `IngestionTransaction::transition` entry point and never revisited
/// here; listing them would let this table lie about who owns those
/// edges.
const ALLOWED_EDGES: &[(DocumentStatus, DocumentStatus)] = &[
    (DocumentStatus::Available, DocumentStatus::Deleted),
    (DocumentStatus::Quarantined, DocumentStatus::Deleted),
];

#[must_use]
pub fn is_allowed(from: DocumentStatus, to: DocumentStatus) -> bool {
    ALLOWED_EDGES.contains(&(from, to))
}
