//! Gallery and upload state machines.

pub mod gallery;
pub mod upload_pipeline;

pub use gallery::{GalleryView, ViewState};
pub use upload_pipeline::{
    ALLOWED_TYPES, DEFAULT_MAX_BYTES, UploadEvent, UploadOutcome, UploadPipeline, UploadReport,
    UploadSettings,
};
