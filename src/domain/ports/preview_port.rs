//! Port for rendering upload previews.

use async_trait::async_trait;

use crate::domain::entities::{Preview, SourceFile};

/// Renders a small preview of a file about to be uploaded.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PreviewPort: Send + Sync {
    /// Returns `None` when the file cannot be rendered.
    async fn generate(&self, file: &SourceFile) -> Option<Preview>;
}
