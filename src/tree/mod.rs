//! File tree description
//!
//! The nested file tree callers hand to the sync engine: leaf text content
//! keyed by path segment, directories nested as sub-mappings. Includes path
//! segment validation and local-directory ingestion.

pub mod node;
pub mod path;
pub mod walker;

pub use node::FileNode;
pub use walker::{Walker, WalkerConfig};
