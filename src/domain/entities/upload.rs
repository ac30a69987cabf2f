//! Client-side upload queue entries.

use std::fmt;
use std::path::Path;

use bytes::Bytes;
use uuid::Uuid;

use crate::domain::errors::UploadError;

/// Generated identifier of a queued upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UploadId(Uuid);

impl UploadId {
    /// Generates a fresh identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for UploadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Upload lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStatus {
    /// Queued, not yet submitted.
    Pending,
    /// Submission in progress.
    Uploading,
    /// Accepted by the backend (or simulated offline).
    Completed,
    /// Submission failed.
    Error,
}

impl UploadStatus {
    /// Lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Uploading => "uploading",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file offered for upload.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// File name including extension.
    pub name: String,
    /// Declared MIME type.
    pub mime: String,
    /// File contents.
    pub bytes: Bytes,
}

impl SourceFile {
    /// Creates a source file from raw parts.
    #[must_use]
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes: bytes.into(),
        }
    }

    /// Creates a source file, deriving the MIME type from the extension.
    #[must_use]
    pub fn from_name(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        let name = name.into();
        let mime = mime_from_extension(&name).to_string();
        Self::new(name, mime, bytes)
    }

    /// Size in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// File name without its extension.
    #[must_use]
    pub fn stem(&self) -> &str {
        Path::new(&self.name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.name)
    }
}

/// Best-effort MIME type for a file name.
#[must_use]
pub fn mime_from_extension(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Generated preview of a queued image.
#[derive(Clone, PartialEq, Eq)]
pub struct Preview {
    /// `data:` URL of a PNG thumbnail.
    pub data_url: String,
    /// Thumbnail width.
    pub width: u32,
    /// Thumbnail height.
    pub height: u32,
}

impl fmt::Debug for Preview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Preview")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("data_url_len", &self.data_url.len())
            .finish()
    }
}

/// User-editable metadata sent with an upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadMetadata {
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
    /// Tags.
    pub tags: Vec<String>,
}

impl UploadMetadata {
    /// Parses a comma separated tag list, dropping blanks.
    #[must_use]
    pub fn parse_tags(input: &str) -> Vec<String> {
        input
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(ToString::to_string)
            .collect()
    }
}

/// One entry of the upload queue.
#[derive(Debug, Clone)]
pub struct UploadItem {
    /// Queue identifier.
    pub id: UploadId,
    /// Source file.
    pub file: SourceFile,
    /// Optional preview.
    pub preview: Option<Preview>,
    /// Lifecycle state.
    pub status: UploadStatus,
    /// Progress percentage, 0 to 100.
    pub progress: u8,
    /// Why the item failed, when `status` is `Error`.
    pub error: Option<UploadError>,
    /// Metadata sent with the file.
    pub metadata: UploadMetadata,
}

impl UploadItem {
    /// Creates a pending item titled after the file stem.
    #[must_use]
    pub fn new(file: SourceFile, preview: Option<Preview>) -> Self {
        let metadata = UploadMetadata {
            title: file.stem().to_string(),
            ..UploadMetadata::default()
        };
        Self {
            id: UploadId::generate(),
            file,
            preview,
            status: UploadStatus::Pending,
            progress: 0,
            error: None,
            metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("photo.JPG", "image/jpeg" ; "upper_jpg")]
    #[test_case("photo.jpeg", "image/jpeg" ; "jpeg")]
    #[test_case("a.webp", "image/webp" ; "webp")]
    #[test_case("notes.txt", "text/plain" ; "text")]
    #[test_case("README", "application/octet-stream" ; "no_extension")]
    fn test_mime_from_extension(name: &str, expected: &str) {
        assert_eq!(mime_from_extension(name), expected);
    }

    #[test]
    fn test_new_item_uses_stem_as_title() {
        let item = UploadItem::new(SourceFile::from_name("holiday.png", vec![0u8; 4]), None);
        assert_eq!(item.metadata.title, "holiday");
        assert_eq!(item.status, UploadStatus::Pending);
        assert_eq!(item.progress, 0);
    }

    #[test]
    fn test_parse_tags() {
        assert_eq!(
            UploadMetadata::parse_tags(" a, b ,, c "),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
    }
}
