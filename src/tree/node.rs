//! Nested file tree description
//!
//! The input shape of a sync: leaf string content keyed by path segment,
//! with directories as nested mappings. The JSON form is the natural
//! manifest shape, a bare string is a file, an object is a directory:
//!
//! ```json
//! { "a": { "x.txt": "hi" }, "y.txt": "bye" }
//! ```

use crate::error::GraftError;
use crate::tree::path;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A node in the caller-supplied file tree.
///
/// Sibling keys are unique by construction, and the ordered map gives every
/// traversal a deterministic order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FileNode {
    /// Leaf file with its full text content.
    File(String),
    /// Directory of child nodes keyed by path segment.
    Directory(BTreeMap<String, FileNode>),
}

impl FileNode {
    /// Empty directory node.
    pub fn dir() -> Self {
        FileNode::Directory(BTreeMap::new())
    }

    /// Leaf file node.
    pub fn file(content: impl Into<String>) -> Self {
        FileNode::File(content.into())
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, FileNode::Directory(_))
    }

    /// Insert a child under a directory node, replacing any existing child
    /// with the same segment.
    pub fn insert(
        &mut self,
        segment: impl Into<String>,
        node: FileNode,
    ) -> Result<(), GraftError> {
        let segment = segment.into();
        path::validate_segment(&segment)?;
        match self {
            FileNode::Directory(children) => {
                children.insert(segment, node);
                Ok(())
            }
            FileNode::File(_) => Err(GraftError::InvalidPath(format!(
                "cannot insert '{}' under a file node",
                segment
            ))),
        }
    }

    /// Fetch the node at a slash-joined path, if present.
    pub fn get(&self, joined: &str) -> Option<&FileNode> {
        let mut current = self;
        for segment in path::split(joined) {
            match current {
                FileNode::Directory(children) => current = children.get(segment)?,
                FileNode::File(_) => return None,
            }
        }
        Some(current)
    }

    /// Number of leaf files transitively reachable from this node.
    pub fn leaf_count(&self) -> usize {
        match self {
            FileNode::File(_) => 1,
            FileNode::Directory(children) => children.values().map(FileNode::leaf_count).sum(),
        }
    }

    /// Slash-joined paths of every leaf file, in traversal order.
    pub fn leaf_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        collect_paths(self, "", &mut paths);
        paths
    }

    /// Validate every segment in the tree.
    pub fn validate(&self) -> Result<(), GraftError> {
        if let FileNode::Directory(children) = self {
            for (segment, child) in children {
                path::validate_segment(segment)?;
                child.validate()?;
            }
        }
        Ok(())
    }

    /// Parse and validate a JSON manifest. The root must be a directory.
    pub fn from_manifest(json: &str) -> Result<FileNode, GraftError> {
        let node: FileNode = serde_json::from_str(json)?;
        if !node.is_dir() {
            return Err(GraftError::InvalidPath(
                "manifest root must be an object, not a bare string".to_string(),
            ));
        }
        node.validate()?;
        Ok(node)
    }
}

fn collect_paths(node: &FileNode, prefix: &str, out: &mut Vec<String>) {
    match node {
        FileNode::File(_) => {
            if !prefix.is_empty() {
                out.push(prefix.to_string());
            }
        }
        FileNode::Directory(children) => {
            for (segment, child) in children {
                let joined = path::join(prefix, segment);
                collect_paths(child, &joined, out);
            }
        }
    }
}
