#![deny(clippy::print_stdout, clippy::print_stderr)]

mod error;
mod in_memory;
mod query;
mod types;

pub use error::IndexerError;
pub use error::IndexerResult;
pub use in_memory::InMemorySearchIndexer;
pub use in_memory::SearchIndexer;
pub use types::IndexedDocument;
pub use types::SearchPage;
