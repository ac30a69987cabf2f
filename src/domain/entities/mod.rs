//! Domain entities.

mod image;
mod token;
mod upload;
mod user;

pub use image::{
    DataSource, ImageId, ImagePage, ImagePatch, ImageRecord, ListQuery, SearchResults, SortKey,
    SortOrder, sort_records,
};
pub use token::AuthToken;
pub use upload::{
    Preview, SourceFile, UploadId, UploadItem, UploadMetadata, UploadStatus, mime_from_extension,
};
pub use user::{AuthResponse, Credentials, ProfilePatch, UserProfile};
