#![deny(clippy::print_stdout, clippy::print_stderr)]

mod error;
mod orchestrator;
mod transition;

pub use error::OrchestratorError;
pub use error::OrchestratorResult;
pub use orchestrator::DownloadPreference;
pub use orchestrator::DownloadResponse;
pub use orchestrator::Orchestrator;
pub use orchestrator::UploadRequest;
pub use transition::is_allowed;
