//! Core types shared across the sync engine and store bindings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Content-addressed object identifier, minted by the object store.
///
/// Always a lowercase hex digest. The engine never computes these itself;
/// it only threads identifiers the store handed back.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    pub fn new(hex: impl Into<String>) -> Self {
        ObjectId(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for logs and table output.
    pub fn short(&self) -> &str {
        let end = self.0.len().min(7);
        &self.0[..end]
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ObjectId {
    fn from(hex: String) -> Self {
        ObjectId(hex)
    }
}

/// Git filesystem mode recorded on a tree entry.
///
/// These five modes are the complete set Git accepts in tree objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileMode {
    /// Regular non-executable file.
    #[serde(rename = "100644")]
    Regular,
    /// Executable file.
    #[serde(rename = "100755")]
    Executable,
    /// Symbolic link; the blob holds the link target.
    #[serde(rename = "120000")]
    Symlink,
    /// Subdirectory.
    #[serde(rename = "040000")]
    Directory,
    /// Submodule pointer to a commit in another repository.
    #[serde(rename = "160000")]
    Gitlink,
}

impl FileMode {
    pub fn as_wire(&self) -> &'static str {
        match self {
            FileMode::Regular => "100644",
            FileMode::Executable => "100755",
            FileMode::Symlink => "120000",
            FileMode::Directory => "040000",
            FileMode::Gitlink => "160000",
        }
    }

    pub fn from_wire(mode: &str) -> Option<Self> {
        match mode {
            "100644" => Some(FileMode::Regular),
            "100755" => Some(FileMode::Executable),
            "120000" => Some(FileMode::Symlink),
            // Some hosts drop the leading zero on directory modes.
            "040000" | "40000" => Some(FileMode::Directory),
            "160000" => Some(FileMode::Gitlink),
            _ => None,
        }
    }
}

impl fmt::Display for FileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// Object type a tree entry points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Blob,
    Tree,
    /// Submodule gitlink. Treated as a leaf; never traversed.
    Commit,
}

impl EntryKind {
    pub fn as_wire(&self) -> &'static str {
        match self {
            EntryKind::Blob => "blob",
            EntryKind::Tree => "tree",
            EntryKind::Commit => "commit",
        }
    }

    pub fn from_wire(kind: &str) -> Option<Self> {
        match kind {
            "blob" => Some(EntryKind::Blob),
            "tree" => Some(EntryKind::Tree),
            "commit" => Some(EntryKind::Commit),
            _ => None,
        }
    }
}

/// One tree entry, either headed to the store or read back from it.
///
/// `path` is a full slash-joined path when handed to tree creation, and a
/// single path segment when listing one tree object. Both directions carry
/// the same four fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    pub mode: FileMode,
    pub kind: EntryKind,
    pub id: ObjectId,
}

impl TreeEntry {
    /// Entry for a regular file blob at `path`.
    pub fn blob(path: impl Into<String>, id: ObjectId) -> Self {
        TreeEntry {
            path: path.into(),
            mode: FileMode::Regular,
            kind: EntryKind::Blob,
            id,
        }
    }
}

/// Commit author identity, supplied when the caller wants to override the
/// identity the host infers from the credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitAuthor {
    pub name: String,
    pub email: String,
    pub timestamp: DateTime<Utc>,
}

impl CommitAuthor {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        CommitAuthor {
            name: name.into(),
            email: email.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Commit creation request.
///
/// The parent list is fixed before the call; the sync engine always supplies
/// exactly one parent, the branch head it read at the start of the run.
#[derive(Debug, Clone)]
pub struct NewCommit {
    pub message: String,
    pub parents: Vec<ObjectId>,
    pub tree: ObjectId,
    pub author: Option<CommitAuthor>,
}
