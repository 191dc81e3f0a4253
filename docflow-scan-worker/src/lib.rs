#![deny(clippy::print_stdout, clippy::print_stderr)]

mod av_engine;
mod content_extractor;
mod error;
mod queue;
mod worker;

pub use av_engine::AvEngine;
pub use av_engine::MockAvEngine;
pub use av_engine::ScanVerdict;
pub use content_extractor::ContentExtractor;
pub use content_extractor::PlainTextExtractor;
pub use error::ScanWorkerError;
pub use error::ScanWorkerResult;
pub use queue::InMemoryScanQueue;
pub use queue::ReceiptHandle;
pub use queue::ReceivedMessage;
pub use queue::ScanMessage;
pub use queue::ScanQueue;
pub use queue::DEFAULT_VISIBILITY_TIMEOUT;
pub use queue::MAX_RECEIVE_COUNT;
pub use worker::Worker;
pub use worker::WorkerConfig;
