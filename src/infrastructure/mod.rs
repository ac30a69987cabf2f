//! Infrastructure layer with external service adapters.

/// Gallery backend client.
pub mod api;
/// Response caching.
pub mod cache;
/// Application configuration.
pub mod config;
/// HTTP request pipeline.
pub mod http;
/// Upload preview rendering.
pub mod preview;
/// Token storage adapters.
pub mod storage;

pub use api::{ApiOptions, ApiService, Session};
pub use cache::ResponseCache;
pub use config::{AppConfig, CliArgs, Command, LogLevel, StorageManager};
pub use http::{HttpClient, HttpClientConfig, RetryPolicy};
pub use preview::ThumbnailPreviewer;
pub use storage::KeyringTokenStorage;
