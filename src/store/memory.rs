//! In-memory object store
//!
//! A miniature of the Git object database: content-addressed blobs, trees,
//! and commits keyed by the SHA-1 of their canonical encoding, plus named
//! branch refs. Backs tests and dry-run planning without touching the
//! network.

use crate::error::{StoreReadError, StoreWriteError};
use crate::store::ObjectStore;
use crate::tree::path;
use crate::types::{CommitAuthor, EntryKind, FileMode, NewCommit, ObjectId, TreeEntry};
use async_trait::async_trait;
use parking_lot::RwLock;
use sha1::{Digest, Sha1};
use std::collections::{BTreeMap, HashMap};

/// Stored commit object, exposed for test assertions.
#[derive(Debug, Clone)]
pub struct StoredCommit {
    pub message: String,
    pub parents: Vec<ObjectId>,
    pub tree: ObjectId,
    pub author: Option<CommitAuthor>,
}

/// Write-call counters, exposed for test assertions.
///
/// Counts successful API calls, not objects: one tree-creation call that
/// materializes three nested tree objects still counts once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteCounts {
    pub blobs: usize,
    pub trees: usize,
    pub commits: usize,
    pub ref_updates: usize,
}

#[derive(Default)]
struct State {
    blobs: HashMap<ObjectId, String>,
    trees: HashMap<ObjectId, Vec<TreeEntry>>,
    commits: HashMap<ObjectId, StoredCommit>,
    refs: HashMap<String, ObjectId>,
    counts: WriteCounts,
}

/// In-memory [`ObjectStore`] with git-style content addressing.
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    /// Store seeded with one branch pointing at an empty genesis commit,
    /// so the first sync has a head to parent on.
    pub fn new(branch: &str) -> Self {
        let mut state = State::default();

        let empty_tree = hash_object("tree", &[]);
        state.trees.insert(empty_tree.clone(), Vec::new());

        let genesis = put_commit(
            &mut state,
            StoredCommit {
                message: "initial commit".to_string(),
                parents: Vec::new(),
                tree: empty_tree,
                author: None,
            },
        );
        state.refs.insert(branch.to_string(), genesis);

        Self {
            state: RwLock::new(state),
        }
    }

    /// Snapshot of the write-call counters.
    pub fn counts(&self) -> WriteCounts {
        self.state.read().counts.clone()
    }

    /// Stored commit object, if present.
    pub fn commit(&self, id: &ObjectId) -> Option<StoredCommit> {
        self.state.read().commits.get(id).cloned()
    }

    /// Stored blob content, if present.
    pub fn blob(&self, id: &ObjectId) -> Option<String> {
        self.state.read().blobs.get(id).cloned()
    }
}

fn hash_object(kind: &str, body: &[u8]) -> ObjectId {
    let mut hasher = Sha1::new();
    hasher.update(kind.as_bytes());
    hasher.update(b" ");
    hasher.update(body.len().to_string().as_bytes());
    hasher.update([0u8]);
    hasher.update(body);
    ObjectId::new(hex::encode(hasher.finalize()))
}

fn put_commit(state: &mut State, commit: StoredCommit) -> ObjectId {
    let mut body = format!("tree {}\n", commit.tree);
    for parent in &commit.parents {
        body.push_str(&format!("parent {}\n", parent));
    }
    if let Some(author) = &commit.author {
        body.push_str(&format!(
            "author {} <{}> {}\n",
            author.name,
            author.email,
            author.timestamp.to_rfc3339()
        ));
    }
    body.push('\n');
    body.push_str(&commit.message);

    let id = hash_object("commit", body.as_bytes());
    state.commits.insert(id.clone(), commit);
    id
}

/// Git's binary tree encoding: `{mode} {name}\0{raw id bytes}` per entry.
fn put_tree(state: &mut State, entries: Vec<TreeEntry>) -> Result<ObjectId, StoreWriteError> {
    let mut body = Vec::new();
    for entry in &entries {
        body.extend_from_slice(entry.mode.as_wire().as_bytes());
        body.push(b' ');
        body.extend_from_slice(entry.path.as_bytes());
        body.push(0);
        let raw = hex::decode(entry.id.as_str()).map_err(|_| StoreWriteError::Rejected {
            context: "creating tree".to_string(),
            detail: format!("entry id '{}' is not hex", entry.id),
        })?;
        body.extend_from_slice(&raw);
    }

    let id = hash_object("tree", &body);
    state.trees.insert(id.clone(), entries);
    Ok(id)
}

/// Working shape for layering flat entries over a base tree.
enum NestedNode {
    Leaf {
        mode: FileMode,
        kind: EntryKind,
        id: ObjectId,
    },
    Dir(BTreeMap<String, NestedNode>),
}

fn empty_dir() -> NestedNode {
    NestedNode::Dir(BTreeMap::new())
}

fn load_nested(
    state: &State,
    tree: &ObjectId,
) -> Result<BTreeMap<String, NestedNode>, StoreWriteError> {
    let entries = state.trees.get(tree).ok_or_else(|| StoreWriteError::Rejected {
        context: "creating tree".to_string(),
        detail: format!("unknown base tree {}", tree),
    })?;

    let mut children = BTreeMap::new();
    for TreeEntry {
        path: name,
        mode,
        kind,
        id,
    } in entries.clone()
    {
        let node = match kind {
            EntryKind::Tree => NestedNode::Dir(load_nested(state, &id)?),
            _ => NestedNode::Leaf { mode, kind, id },
        };
        children.insert(name, node);
    }
    Ok(children)
}

fn overlay(children: &mut BTreeMap<String, NestedNode>, segments: &[&str], leaf: NestedNode) {
    match segments {
        [] => {}
        [last] => {
            children.insert(last.to_string(), leaf);
        }
        [head, rest @ ..] => {
            let child = children.entry(head.to_string()).or_insert_with(empty_dir);
            // A new directory path shadows any blob previously at this segment.
            if let NestedNode::Leaf { .. } = child {
                *child = empty_dir();
            }
            if let NestedNode::Dir(grandchildren) = child {
                overlay(grandchildren, rest, leaf);
            }
        }
    }
}

fn store_nested(
    state: &mut State,
    children: &BTreeMap<String, NestedNode>,
) -> Result<ObjectId, StoreWriteError> {
    let mut entries = Vec::with_capacity(children.len());
    for (name, node) in children {
        let entry = match node {
            NestedNode::Leaf { mode, kind, id } => TreeEntry {
                path: name.clone(),
                mode: *mode,
                kind: *kind,
                id: id.clone(),
            },
            NestedNode::Dir(grandchildren) => {
                let id = store_nested(state, grandchildren)?;
                TreeEntry {
                    path: name.clone(),
                    mode: FileMode::Directory,
                    kind: EntryKind::Tree,
                    id,
                }
            }
        };
        entries.push(entry);
    }
    put_tree(state, entries)
}

#[async_trait]
impl ObjectStore for InMemoryStore {
    async fn branch_head(&self, branch: &str) -> Result<ObjectId, StoreReadError> {
        let state = self.state.read();
        state
            .refs
            .get(branch)
            .cloned()
            .ok_or_else(|| StoreReadError::BranchNotFound(branch.to_string()))
    }

    async fn commit_tree(&self, commit: &ObjectId) -> Result<ObjectId, StoreReadError> {
        let state = self.state.read();
        state
            .commits
            .get(commit)
            .map(|c| c.tree.clone())
            .ok_or_else(|| StoreReadError::ObjectNotFound(commit.clone()))
    }

    async fn create_blob(&self, content: &str) -> Result<ObjectId, StoreWriteError> {
        let mut state = self.state.write();
        let id = hash_object("blob", content.as_bytes());
        state.blobs.insert(id.clone(), content.to_string());
        state.counts.blobs += 1;
        Ok(id)
    }

    async fn create_tree(
        &self,
        entries: &[TreeEntry],
        base_tree: &ObjectId,
    ) -> Result<ObjectId, StoreWriteError> {
        let mut state = self.state.write();
        let mut children = load_nested(&state, base_tree)?;

        for entry in entries {
            let segments: Vec<&str> = path::split(&entry.path).collect();
            if segments.is_empty() {
                return Err(StoreWriteError::Rejected {
                    context: "creating tree".to_string(),
                    detail: format!("empty entry path '{}'", entry.path),
                });
            }
            if entry.kind == EntryKind::Blob && !state.blobs.contains_key(&entry.id) {
                return Err(StoreWriteError::Rejected {
                    context: "creating tree".to_string(),
                    detail: format!("unknown blob {} at {}", entry.id, entry.path),
                });
            }
            let leaf = NestedNode::Leaf {
                mode: entry.mode,
                kind: entry.kind,
                id: entry.id.clone(),
            };
            overlay(&mut children, &segments, leaf);
        }

        let id = store_nested(&mut state, &children)?;
        state.counts.trees += 1;
        Ok(id)
    }

    async fn create_commit(&self, commit: &NewCommit) -> Result<ObjectId, StoreWriteError> {
        let mut state = self.state.write();
        if !state.trees.contains_key(&commit.tree) {
            return Err(StoreWriteError::Rejected {
                context: "creating commit".to_string(),
                detail: format!("unknown tree {}", commit.tree),
            });
        }
        for parent in &commit.parents {
            if !state.commits.contains_key(parent) {
                return Err(StoreWriteError::Rejected {
                    context: "creating commit".to_string(),
                    detail: format!("unknown parent commit {}", parent),
                });
            }
        }

        let id = put_commit(
            &mut state,
            StoredCommit {
                message: commit.message.clone(),
                parents: commit.parents.clone(),
                tree: commit.tree.clone(),
                author: commit.author.clone(),
            },
        );
        state.counts.commits += 1;
        Ok(id)
    }

    async fn update_branch(&self, branch: &str, commit: &ObjectId) -> Result<(), StoreWriteError> {
        let mut state = self.state.write();
        if !state.commits.contains_key(commit) {
            return Err(StoreWriteError::RefRejected {
                branch: branch.to_string(),
                detail: format!("unknown commit {}", commit),
            });
        }
        if !state.refs.contains_key(branch) {
            return Err(StoreWriteError::RefRejected {
                branch: branch.to_string(),
                detail: "branch does not exist".to_string(),
            });
        }
        state.refs.insert(branch.to_string(), commit.clone());
        state.counts.ref_updates += 1;
        Ok(())
    }

    async fn read_tree(&self, tree: &ObjectId) -> Result<Vec<TreeEntry>, StoreReadError> {
        let state = self.state.read();
        state
            .trees
            .get(tree)
            .cloned()
            .ok_or_else(|| StoreReadError::ObjectNotFound(tree.clone()))
    }

    async fn read_file(&self, branch: &str, file_path: &str) -> Result<String, StoreReadError> {
        let state = self.state.read();
        let head = state
            .refs
            .get(branch)
            .ok_or_else(|| StoreReadError::BranchNotFound(branch.to_string()))?;
        let commit = state
            .commits
            .get(head)
            .ok_or_else(|| StoreReadError::ObjectNotFound(head.clone()))?;

        let not_found = || StoreReadError::PathNotFound {
            path: file_path.to_string(),
            reference: branch.to_string(),
        };

        let segments: Vec<&str> = path::split(file_path).collect();
        if segments.is_empty() {
            return Err(not_found());
        }

        let mut tree_id = commit.tree.clone();
        for (i, segment) in segments.iter().enumerate() {
            let entries = state
                .trees
                .get(&tree_id)
                .ok_or_else(|| StoreReadError::ObjectNotFound(tree_id.clone()))?;
            let entry = entries
                .iter()
                .find(|e| e.path == *segment)
                .ok_or_else(not_found)?;

            let last = i + 1 == segments.len();
            match (last, entry.kind) {
                (true, EntryKind::Blob) => {
                    return state
                        .blobs
                        .get(&entry.id)
                        .cloned()
                        .ok_or_else(|| StoreReadError::ObjectNotFound(entry.id.clone()));
                }
                (false, EntryKind::Tree) => tree_id = entry.id.clone(),
                _ => return Err(not_found()),
            }
        }
        Err(not_found())
    }
}
