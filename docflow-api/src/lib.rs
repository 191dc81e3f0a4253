#![deny(clippy::print_stdout, clippy::print_stderr)]

mod auth;
mod config;
mod dto;
mod error;
mod handlers;
mod routes;
mod state;


pub use config::AntivirusConfig;
pub use config::AuthConfig;
pub use config::DatabaseConfig;
pub use config::DocFlowConfig;
pub use config::EventBrokerConfig;
pub use config::IndexerConfig;
pub use config::ObjectStoreConfig;
pub use config::QueueConfig;
pub use config::ServerConfig;
pub use error::HttpError;
pub use error::HttpResult;
pub use routes::build_router;
pub use state::AppState;
