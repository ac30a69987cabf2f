//! Application layer with services, use cases and DTOs.

/// Data transfer objects.
pub mod dto;
/// Gallery and upload services.
pub mod services;
/// Use case implementations.
pub mod use_cases;

pub use dto::{LoginRequest, LoginResponse, TokenSource};
pub use services::{GalleryView, UploadEvent, UploadPipeline, UploadReport, UploadSettings, ViewState};
pub use use_cases::{LoginUseCase, RestoreSessionUseCase, RestoredSession};
