#![deny(clippy::print_stdout, clippy::print_stderr)]

mod error;
mod ids;
mod pagination;
mod retry;

pub use error::ApiError;
pub use error::ApiErrorKind;
pub use error::ApiResult;
pub use error::ErrorBody;
pub use error::ErrorEnvelope;
pub use ids::DocumentId;
pub use ids::EventId;
pub use ids::FolderId;
pub use ids::TagId;
pub use ids::TenantId;
pub use ids::UserId;
pub use ids::VersionId;
pub use ids::generate_id;
pub use pagination::DEFAULT_PAGE_SIZE;
pub use pagination::MAX_PAGE_SIZE;
pub use pagination::PageRequest;
pub use pagination::Paginated;
pub use pagination::ValidPage;
pub use retry::RetryPolicy;
