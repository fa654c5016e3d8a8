//! Navigate module
//!
//! Turns untrusted, user-supplied paths into locations confined to the
//! storage root.

mod resolver;
mod results;

// Re-export public types and functions
pub use resolver::{PathResolver, is_within_root};
pub use results::ResolvedLocation;
