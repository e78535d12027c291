//! Read-path materialization
//!
//! Rebuilds the remote branch as a nested tree of object metadata. Only
//! names, kinds, modes, and identifiers come back; file contents are
//! fetched separately, one path at a time.

use crate::error::StoreReadError;
use crate::store::ObjectStore;
use crate::tree::path;
use crate::types::{EntryKind, FileMode, ObjectId, TreeEntry};
use futures::future::{self, BoxFuture, FutureExt};
use serde::Serialize;
use tracing::debug;

/// A node of the materialized repository tree.
///
/// Subtrees hold their children in the order the store listed them. Gitlink
/// entries stay leaves; they are never traversed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RepoNode {
    Leaf {
        name: String,
        mode: FileMode,
        kind: EntryKind,
        id: ObjectId,
    },
    Tree {
        name: String,
        id: ObjectId,
        children: Vec<RepoNode>,
    },
}

impl RepoNode {
    pub fn name(&self) -> &str {
        match self {
            RepoNode::Leaf { name, .. } | RepoNode::Tree { name, .. } => name,
        }
    }

    pub fn id(&self) -> &ObjectId {
        match self {
            RepoNode::Leaf { id, .. } | RepoNode::Tree { id, .. } => id,
        }
    }

    /// Slash-joined paths of every blob leaf, in listing order.
    pub fn leaf_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        collect_leaf_paths(self, "", &mut paths);
        paths
    }

    /// Every node below this one with its slash-joined path, depth first.
    pub fn descendants(&self) -> Vec<(String, &RepoNode)> {
        let mut nodes = Vec::new();
        collect_descendants(self, "", &mut nodes);
        nodes
    }
}

fn collect_leaf_paths(node: &RepoNode, prefix: &str, out: &mut Vec<String>) {
    match node {
        RepoNode::Leaf { name, kind, .. } => {
            if *kind == EntryKind::Blob {
                out.push(path::join(prefix, name));
            }
        }
        RepoNode::Tree { name, children, .. } => {
            let joined = path::join(prefix, name);
            for child in children {
                collect_leaf_paths(child, &joined, out);
            }
        }
    }
}

fn collect_descendants<'n>(node: &'n RepoNode, prefix: &str, out: &mut Vec<(String, &'n RepoNode)>) {
    if let RepoNode::Tree { name, children, .. } = node {
        let joined = path::join(prefix, name);
        for child in children {
            out.push((path::join(&joined, child.name()), child));
            collect_descendants(child, &joined, out);
        }
    }
}

/// Materialize the branch head into a nested tree of object metadata.
///
/// Resolves branch to commit to root tree, then walks every subtree.
/// Sibling subtree fetches go out concurrently; child order still follows
/// the store's listing order. The root node carries an empty name.
pub async fn materialize<S: ObjectStore + ?Sized>(
    store: &S,
    branch: &str,
) -> Result<RepoNode, StoreReadError> {
    let head = store.branch_head(branch).await?;
    let root_tree = store.commit_tree(&head).await?;
    debug!(branch = %branch, head = %head, tree = %root_tree, "Materializing branch");
    fetch_subtree(store, String::new(), root_tree).await
}

// Async recursion needs the boxed form.
fn fetch_subtree<'a, S: ObjectStore + ?Sized>(
    store: &'a S,
    name: String,
    id: ObjectId,
) -> BoxFuture<'a, Result<RepoNode, StoreReadError>> {
    async move {
        let listing = store.read_tree(&id).await?;
        let children = future::try_join_all(
            listing
                .into_iter()
                .map(|entry| resolve_entry(store, entry)),
        )
        .await?;
        Ok(RepoNode::Tree { name, id, children })
    }
    .boxed()
}

async fn resolve_entry<S: ObjectStore + ?Sized>(
    store: &S,
    entry: TreeEntry,
) -> Result<RepoNode, StoreReadError> {
    match entry.kind {
        EntryKind::Tree => fetch_subtree(store, entry.path, entry.id).await,
        _ => Ok(RepoNode::Leaf {
            name: entry.path,
            mode: entry.mode,
            kind: entry.kind,
            id: entry.id,
        }),
    }
}
