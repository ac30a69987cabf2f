//! Gallery backend client.

mod fallback;
mod service;
mod session;

pub use service::{ApiOptions, ApiService};
pub use session::Session;
