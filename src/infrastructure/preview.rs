//! Thumbnail previews for queued uploads.

use std::io::Cursor;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::ImageFormat;
use tracing::{debug, warn};

use crate::domain::entities::{Preview, SourceFile};
use crate::domain::ports::PreviewPort;

/// Longest edge of a generated preview, in pixels.
pub const PREVIEW_EDGE: u32 = 200;

/// Decodes the file and renders a PNG thumbnail as a data URL.
#[derive(Debug, Clone, Copy)]
pub struct ThumbnailPreviewer {
    max_edge: u32,
}

impl ThumbnailPreviewer {
    /// Creates a previewer bounded by [`PREVIEW_EDGE`].
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_edge: PREVIEW_EDGE,
        }
    }
}

impl Default for ThumbnailPreviewer {
    fn default() -> Self {
        Self::new()
    }
}

fn render(bytes: &[u8], max_edge: u32) -> Result<Preview, image::ImageError> {
    let decoded = image::load_from_memory(bytes)?;
    let thumbnail = if decoded.width() > max_edge || decoded.height() > max_edge {
        decoded.thumbnail(max_edge, max_edge)
    } else {
        decoded
    };

    let mut png = Vec::new();
    thumbnail.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

    Ok(Preview {
        data_url: format!("data:image/png;base64,{}", STANDARD.encode(&png)),
        width: thumbnail.width(),
        height: thumbnail.height(),
    })
}

#[async_trait]
impl PreviewPort for ThumbnailPreviewer {
    async fn generate(&self, file: &SourceFile) -> Option<Preview> {
        let bytes = file.bytes.clone();
        let max_edge = self.max_edge;

        match tokio::task::spawn_blocking(move || render(&bytes, max_edge)).await {
            Ok(Ok(preview)) => {
                debug!(file = %file.name, width = preview.width, height = preview.height, "Preview rendered");
                Some(preview)
            }
            Ok(Err(e)) => {
                debug!(file = %file.name, error = %e, "Preview unavailable");
                None
            }
            Err(e) => {
                warn!(error = %e, "Preview task panicked");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = image::DynamicImage::new_rgb8(width, height);
        let mut out = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    #[tokio::test]
    async fn test_preview_is_scaled_to_edge() {
        let file = SourceFile::from_name("wide.png", png_bytes(400, 300));

        let preview = ThumbnailPreviewer::new().generate(&file).await.unwrap();

        assert_eq!(preview.width, 200);
        assert_eq!(preview.height, 150);
        assert!(preview.data_url.starts_with("data:image/png;base64,"));
    }

    #[tokio::test]
    async fn test_small_image_keeps_size() {
        let file = SourceFile::from_name("icon.png", png_bytes(32, 16));
        let preview = ThumbnailPreviewer::new().generate(&file).await.unwrap();
        assert_eq!((preview.width, preview.height), (32, 16));
    }

    #[tokio::test]
    async fn test_undecodable_file_has_no_preview() {
        let file = SourceFile::from_name("broken.png", b"not an image".to_vec());
        assert!(ThumbnailPreviewer::new().generate(&file).await.is_none());
    }
}
