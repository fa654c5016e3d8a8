//! Server core functionality
//!
//! HTTP server, route handlers and HTML rendering for the drive. Handlers only
//! translate requests; all path handling lives in `navigate` and `storage`.

pub mod core;
pub mod render;
pub mod routes;
pub mod upload;

pub use self::core::Server;
pub use routes::{AppState, build_router};
