//! UI screens.

mod app;

pub use app::BrowseApp;
