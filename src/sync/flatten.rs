//! Write-path flattening
//!
//! Converts the nested file tree into the flat, full-path entry list a
//! single tree creation call wants, creating one content-addressed blob
//! per leaf file on the way.

use crate::error::StoreWriteError;
use crate::store::ObjectStore;
use crate::tree::node::FileNode;
use crate::tree::path;
use crate::types::TreeEntry;
use futures::future;
use tracing::debug;

/// How leaf blob creations are issued.
///
/// Leaves are independent, so they can go out as one concurrent batch; the
/// sequential mode exists for hosts that dislike bursts. Both produce the
/// same entries in the same order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlattenMode {
    Concurrent,
    Sequential,
}

/// Flatten `root` into full-path tree entries, creating one blob per leaf.
///
/// Entry order is the deterministic traversal order of the tree
/// (lexicographic within each level), independent of blob completion order.
/// On failure the error names the leaf path that failed; blobs already
/// created are content-addressed and harmless, so nothing is rolled back.
pub async fn flatten_tree<S: ObjectStore + ?Sized>(
    store: &S,
    root: &FileNode,
    mode: FlattenMode,
) -> Result<Vec<TreeEntry>, StoreWriteError> {
    let children = match root {
        FileNode::Directory(children) => children,
        FileNode::File(_) => {
            return Err(StoreWriteError::Rejected {
                context: "flattening tree".to_string(),
                detail: "root node must be a directory".to_string(),
            })
        }
    };

    let mut leaves = Vec::new();
    for (segment, child) in children {
        collect_leaves(child, segment.clone(), &mut leaves);
    }
    debug!(leaf_count = leaves.len(), ?mode, "Flattening file tree");

    match mode {
        FlattenMode::Concurrent => {
            let creations = leaves.into_iter().map(|(leaf_path, content)| async move {
                create_leaf_blob(store, leaf_path, content).await
            });
            future::try_join_all(creations).await
        }
        FlattenMode::Sequential => {
            let mut entries = Vec::with_capacity(leaves.len());
            for (leaf_path, content) in leaves {
                entries.push(create_leaf_blob(store, leaf_path, content).await?);
            }
            Ok(entries)
        }
    }
}

async fn create_leaf_blob<S: ObjectStore + ?Sized>(
    store: &S,
    leaf_path: String,
    content: &str,
) -> Result<TreeEntry, StoreWriteError> {
    match store.create_blob(content).await {
        Ok(id) => Ok(TreeEntry::blob(leaf_path, id)),
        Err(err) => Err(StoreWriteError::BlobCreate {
            path: leaf_path,
            detail: err.to_string(),
        }),
    }
}

fn collect_leaves<'t>(node: &'t FileNode, prefix: String, out: &mut Vec<(String, &'t str)>) {
    match node {
        FileNode::File(content) => out.push((prefix, content)),
        FileNode::Directory(children) => {
            for (segment, child) in children {
                collect_leaves(child, path::join(&prefix, segment), out);
            }
        }
    }
}
