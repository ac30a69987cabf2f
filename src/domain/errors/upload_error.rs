//! Upload validation and submission errors.

use thiserror::Error;

use super::HttpError;

/// Reason a file was refused before entering the upload queue.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum ValidationError {
    #[error("{name}: unsupported file type {mime}, expected JPEG, PNG, GIF or WebP")]
    UnsupportedType { name: String, mime: String },

    #[error("{name}: file is {size} bytes, the limit is {max} bytes")]
    TooLarge { name: String, size: u64, max: u64 },

    #[error("{name}: file is empty")]
    Empty { name: String },

    #[error("{name}: cannot read file: {message}")]
    Unreadable { name: String, message: String },
}

impl ValidationError {
    /// Whether the file was refused for its type.
    #[must_use]
    pub const fn is_type_error(&self) -> bool {
        matches!(self, Self::UnsupportedType { .. })
    }

    /// Whether the file was refused for its size.
    #[must_use]
    pub const fn is_size_error(&self) -> bool {
        matches!(self, Self::TooLarge { .. } | Self::Empty { .. })
    }
}

/// Terminal failure of one queued upload.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum UploadError {
    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("upload item {id} not found")]
    UnknownItem { id: String },

    #[error("upload item {id} is being uploaded")]
    InProgress { id: String },
}

impl UploadError {
    /// Underlying HTTP failure, if the backend refused the upload.
    #[must_use]
    pub const fn http(&self) -> Option<&HttpError> {
        match self {
            Self::Http(e) => Some(e),
            _ => None,
        }
    }
}
