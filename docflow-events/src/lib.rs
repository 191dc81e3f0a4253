#![deny(clippy::print_stdout, clippy::print_stderr)]

mod broker;
mod error;
mod publisher;
mod topic;

pub use broker::EventBroker;
pub use broker::EventEnvelope;
pub use broker::InMemoryEventBroker;
pub use broker::PublishedMessage;
pub use error::EventsError;
pub use error::EventsResult;
pub use publisher::EventPublisher;
pub use publisher::OutboxPoller;
pub use topic::topic_for;
pub use topic::DOCUMENT_EVENTS_TOPIC;
pub use topic::FOLDER_EVENTS_TOPIC;
pub use topic::GENERAL_EVENTS_TOPIC;
pub use topic::SUPPORTED_EVENT_TYPES;
