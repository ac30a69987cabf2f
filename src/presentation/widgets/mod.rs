//! Reusable widgets.

mod gallery_table;
mod input;
mod status_bar;

pub use gallery_table::GalleryTable;
pub use input::TextInput;
pub use status_bar::{StatusBar, StatusLevel};
