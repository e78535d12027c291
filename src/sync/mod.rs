//! Tree synchronization
//!
//! The write path flattens a nested file tree into blobs and a single tree
//! creation, then synthesizes a commit and advances the branch ref. The
//! read path materializes the remote branch back into a nested shape and
//! fetches individual file contents.

pub mod engine;
pub mod flatten;
pub mod materialize;

pub use engine::{RefUpdate, SyncEngine, SyncOptions, SyncReceipt};
pub use flatten::{flatten_tree, FlattenMode};
pub use materialize::{materialize, RepoNode};
