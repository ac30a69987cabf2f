//! Ports implemented by the infrastructure layer.

mod auth_port;
mod image_api_port;
mod preview_port;
mod token_storage_port;

pub use auth_port::AuthPort;
pub use image_api_port::{ImageApiPort, ProgressCallback, UploadRequest};
pub use preview_port::PreviewPort;
pub use token_storage_port::{MemoryTokenStorage, TokenStoragePort};

/// Mock ports for unit tests.
#[cfg(test)]
pub mod mocks {
    pub use super::auth_port::MockAuthPort;
    pub use super::image_api_port::MockImageApiPort;
    pub use super::preview_port::MockPreviewPort;
}
