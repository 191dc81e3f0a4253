#![deny(clippy::print_stdout, clippy::print_stderr)]

mod error;
mod in_memory;
mod repository;
mod types;

pub use error::MetadataStoreError;
pub use error::MetadataStoreResult;
pub use in_memory::InMemoryMetadataStore;
pub use repository::DocumentFilter;
pub use repository::DocumentRepository;
pub use repository::EventRepository;
pub use repository::FolderRepository;
pub use repository::IngestionTransaction;
pub use repository::MetadataKvRepository;
pub use repository::NewDocument;
pub use repository::NewFolder;
pub use repository::PermissionRepository;
pub use repository::TagRepository;
pub use repository::TransitionOutcome;
pub use repository::VersionRepository;
pub use types::Document;
pub use types::DocumentMetadataEntry;
pub use types::DocumentStatus;
pub use types::DocumentVersion;
pub use types::EventRecord;
pub use types::Folder;
pub use types::PermissionGrant;
pub use types::ResourceType;
pub use types::Tag;
pub use types::VersionStatus;
