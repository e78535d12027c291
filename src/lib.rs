//! Graft: Remote Git Tree Synchronization
//!
//! Converts a nested in-memory file/folder description into Git objects on
//! a hosted repository (blobs, a tree, a commit, a ref update) and performs
//! the inverse read. The object store is an abstract capability; the
//! reference binding speaks the GitHub REST API.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod store;
pub mod sync;
pub mod tree;
pub mod types;
