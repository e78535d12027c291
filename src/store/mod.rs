//! Object store abstraction
//!
//! The Git object database operations the sync engine needs: blob, tree,
//! and commit creation, ref reads and updates, tree listings, and file
//! content fetches. The hosted binding speaks the GitHub REST API; the
//! in-memory binding backs tests and dry-run planning.

pub mod github;
pub mod memory;

pub use github::GitHubStore;
pub use memory::InMemoryStore;

use crate::error::{StoreReadError, StoreWriteError};
use crate::types::{NewCommit, ObjectId, TreeEntry};
use async_trait::async_trait;

/// Object database capability the sync engine runs against.
///
/// Blobs, trees, and commits are immutable and content-addressed; the store
/// mints every identifier and the engine only threads them. A branch ref is
/// the single mutable pointer. Creating a blob whose content already exists
/// returns the existing identifier, so repeating a write is safe.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Resolve a branch name to its head commit.
    async fn branch_head(&self, branch: &str) -> Result<ObjectId, StoreReadError>;

    /// Resolve a commit to its root tree.
    async fn commit_tree(&self, commit: &ObjectId) -> Result<ObjectId, StoreReadError>;

    /// Create a content-addressed blob holding the given text.
    async fn create_blob(&self, content: &str) -> Result<ObjectId, StoreWriteError>;

    /// Create a tree from flattened full-path entries, layered over
    /// `base_tree`. Paths absent from `entries` keep their `base_tree`
    /// contents.
    async fn create_tree(
        &self,
        entries: &[TreeEntry],
        base_tree: &ObjectId,
    ) -> Result<ObjectId, StoreWriteError>;

    /// Create a commit object.
    async fn create_commit(&self, commit: &NewCommit) -> Result<ObjectId, StoreWriteError>;

    /// Point a branch at a commit. The commit must already exist.
    async fn update_branch(&self, branch: &str, commit: &ObjectId) -> Result<(), StoreWriteError>;

    /// List the entries of one tree object, in the store's own order.
    /// Entry paths are single segments relative to the listed tree.
    async fn read_tree(&self, tree: &ObjectId) -> Result<Vec<TreeEntry>, StoreReadError>;

    /// Fetch the decoded text content of one file at a branch head.
    async fn read_file(&self, branch: &str, path: &str) -> Result<String, StoreReadError>;
}
