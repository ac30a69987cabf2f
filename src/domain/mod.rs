//! Domain layer with core entities, errors, and port definitions.

/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// Port definitions.
pub mod ports;
/// Serde utilities.
pub mod serde_utils;

pub use entities::{AuthToken, ImageId, ImageRecord, UploadItem, UploadStatus};
pub use errors::{AuthError, HttpError, UploadError, ValidationError};
pub use ports::{ImageApiPort, TokenStoragePort};
