//! Domain error types.

mod auth_error;
mod http_error;
mod upload_error;

pub use auth_error::AuthError;
pub use http_error::HttpError;
pub use upload_error::{UploadError, ValidationError};
