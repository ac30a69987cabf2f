//! Carousel - a terminal client for a self-hosted image gallery.
//!
//! The crate browses, searches, uploads and deletes gallery images over a
//! REST backend, with a response cache, retrying HTTP pipeline, keyring
//! token storage and sample data when the backend is unreachable.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Application layer containing services, use cases and DTOs.
pub mod application;
/// Domain layer containing entities, errors, and port definitions.
pub mod domain;
/// Infrastructure layer containing adapters for external services.
pub mod infrastructure;
/// Presentation layer containing the browse screen and command output.
pub mod presentation;

/// Current version of the application.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name.
pub const NAME: &str = "carousel";
