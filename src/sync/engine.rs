//! Sync engine
//!
//! Orchestrates one synchronization run: read the branch head, flatten the
//! file tree over the head's tree, synthesize a commit with that head as
//! its only parent, and advance the branch ref.

use crate::error::{GraftError, StoreReadError, StoreWriteError};
use crate::store::ObjectStore;
use crate::sync::flatten::{flatten_tree, FlattenMode};
use crate::sync::materialize::{materialize as materialize_branch, RepoNode};
use crate::tree::node::FileNode;
use crate::types::{CommitAuthor, NewCommit, ObjectId};
use serde::Serialize;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{info, instrument};

/// Engine tuning for one branch.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Branch the engine reads and advances
    pub branch: String,
    /// Whole-operation deadline (None = wait indefinitely)
    pub deadline: Option<Duration>,
    /// How leaf blobs are issued during flattening
    pub flatten_mode: FlattenMode,
}

impl SyncOptions {
    pub fn new(branch: impl Into<String>) -> Self {
        Self {
            branch: branch.into(),
            deadline: None,
            flatten_mode: FlattenMode::Concurrent,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_flatten_mode(mut self, mode: FlattenMode) -> Self {
        self.flatten_mode = mode;
        self
    }
}

/// How the branch pointer moved at the end of a sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RefUpdate {
    /// The branch already pointed at the target commit; no write was issued.
    Unchanged { at: ObjectId },
    /// The branch advanced with a single pointer write.
    Advanced { from: ObjectId, to: ObjectId },
}

/// Outcome of a push: the objects created and how the ref moved.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReceipt {
    pub commit: ObjectId,
    pub tree: ObjectId,
    pub entry_count: usize,
    pub ref_update: RefUpdate,
}

/// Drives one branch of one remote repository.
pub struct SyncEngine<S> {
    store: S,
    options: SyncOptions,
}

impl<S: ObjectStore> SyncEngine<S> {
    pub fn new(store: S, options: SyncOptions) -> Self {
        Self { store, options }
    }

    pub fn branch(&self) -> &str {
        &self.options.branch
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Synchronize `tree` to the branch as one new commit.
    ///
    /// The commit's parent is the branch head read at the start of the run,
    /// and its tree layers the flattened entries over that head's tree, so
    /// paths outside `tree` survive untouched.
    #[instrument(skip(self, tree, author), fields(branch = %self.options.branch))]
    pub async fn push(
        &self,
        tree: &FileNode,
        message: &str,
        author: Option<CommitAuthor>,
    ) -> Result<SyncReceipt, GraftError> {
        tree.validate()?;
        self.with_deadline(self.push_inner(tree, message, author), |seconds| {
            StoreWriteError::Deadline {
                context: "synchronizing tree".to_string(),
                seconds,
            }
            .into()
        })
        .await
    }

    async fn push_inner(
        &self,
        tree: &FileNode,
        message: &str,
        author: Option<CommitAuthor>,
    ) -> Result<SyncReceipt, GraftError> {
        let start = Instant::now();
        let branch = &self.options.branch;
        info!("Starting tree sync");

        // Step 1: resolve the head this commit will parent on.
        let head = self.store.branch_head(branch).await?;
        let base_tree = self.store.commit_tree(&head).await?;

        // Step 2: flatten the description into blobs and flat entries.
        let entries = flatten_tree(&self.store, tree, self.options.flatten_mode).await?;

        // Step 3: one tree creation over the base. An empty description
        // commits the parent's tree unchanged.
        let new_tree = if entries.is_empty() {
            base_tree.clone()
        } else {
            self.store.create_tree(&entries, &base_tree).await?
        };

        // Step 4: the commit parents on exactly the head from step 1.
        let commit = self
            .store
            .create_commit(&NewCommit {
                message: message.to_string(),
                parents: vec![head.clone()],
                tree: new_tree.clone(),
                author,
            })
            .await?;

        // Step 5: advance the ref.
        let ref_update = self.update_ref(&commit).await?;

        info!(
            commit = %commit.short(),
            entries = entries.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Tree sync complete"
        );

        Ok(SyncReceipt {
            commit,
            tree: new_tree,
            entry_count: entries.len(),
            ref_update,
        })
    }

    /// Point the branch at `target`, skipping the write when it already
    /// does.
    ///
    /// This is a read-then-write without compare-and-swap: another writer
    /// can move the ref between the read and the update, and the last
    /// update wins. Callers sharing a branch must serialize their syncs.
    pub async fn update_ref(&self, target: &ObjectId) -> Result<RefUpdate, GraftError> {
        let branch = &self.options.branch;
        let current = self.store.branch_head(branch).await?;
        if current == *target {
            info!(at = %current.short(), "Ref already current; skipping update");
            return Ok(RefUpdate::Unchanged { at: current });
        }
        self.store.update_branch(branch, target).await?;
        Ok(RefUpdate::Advanced {
            from: current,
            to: target.clone(),
        })
    }

    /// Materialize the remote branch into a nested metadata tree.
    #[instrument(skip(self), fields(branch = %self.options.branch))]
    pub async fn snapshot(&self) -> Result<RepoNode, GraftError> {
        self.with_deadline(
            async { Ok(materialize_branch(&self.store, &self.options.branch).await?) },
            |seconds| {
                StoreReadError::Deadline {
                    context: "materializing branch".to_string(),
                    seconds,
                }
                .into()
            },
        )
        .await
    }

    /// Fetch one file's text content at the branch head.
    pub async fn fetch_file(&self, path: &str) -> Result<String, GraftError> {
        self.with_deadline(
            async {
                Ok(self
                    .store
                    .read_file(&self.options.branch, path)
                    .await?)
            },
            |seconds| {
                StoreReadError::Deadline {
                    context: "fetching file content".to_string(),
                    seconds,
                }
                .into()
            },
        )
        .await
    }

    async fn with_deadline<T, F>(
        &self,
        work: F,
        on_timeout: impl FnOnce(u64) -> GraftError,
    ) -> Result<T, GraftError>
    where
        F: Future<Output = Result<T, GraftError>>,
    {
        match self.options.deadline {
            Some(limit) => match tokio::time::timeout(limit, work).await {
                Ok(result) => result,
                Err(_) => Err(on_timeout(limit.as_secs())),
            },
            None => work.await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use crate::types::TreeEntry;
    use async_trait::async_trait;

    fn sample_tree() -> FileNode {
        let mut root = FileNode::dir();
        let mut a = FileNode::dir();
        a.insert("x.txt", FileNode::file("hi")).unwrap();
        root.insert("a", a).unwrap();
        root.insert("y.txt", FileNode::file("bye")).unwrap();
        root
    }

    fn engine() -> SyncEngine<InMemoryStore> {
        SyncEngine::new(InMemoryStore::new("main"), SyncOptions::new("main"))
    }

    #[tokio::test]
    async fn test_push_creates_commit_and_advances_ref() {
        let engine = engine();
        let genesis = engine.store().branch_head("main").await.unwrap();

        let receipt = engine.push(&sample_tree(), "sync files", None).await.unwrap();

        assert_eq!(receipt.entry_count, 2);
        assert_eq!(
            receipt.ref_update,
            RefUpdate::Advanced {
                from: genesis.clone(),
                to: receipt.commit.clone(),
            }
        );

        let stored = engine.store().commit(&receipt.commit).unwrap();
        assert_eq!(stored.parents, vec![genesis]);
        assert_eq!(stored.tree, receipt.tree);
        assert_eq!(stored.message, "sync files");

        let head = engine.store().branch_head("main").await.unwrap();
        assert_eq!(head, receipt.commit);
    }

    #[tokio::test]
    async fn test_update_ref_skips_write_when_current() {
        let engine = engine();
        let head = engine.store().branch_head("main").await.unwrap();

        let update = engine.update_ref(&head).await.unwrap();
        assert_eq!(update, RefUpdate::Unchanged { at: head });
        assert_eq!(engine.store().counts().ref_updates, 0);
    }

    #[tokio::test]
    async fn test_push_empty_tree_commits_parent_tree() {
        let engine = engine();
        let genesis = engine.store().branch_head("main").await.unwrap();
        let genesis_tree = engine.store().commit_tree(&genesis).await.unwrap();

        let receipt = engine.push(&FileNode::dir(), "empty sync", None).await.unwrap();

        assert_eq!(receipt.entry_count, 0);
        assert_eq!(receipt.tree, genesis_tree);
        // No tree creation call happened.
        assert_eq!(engine.store().counts().trees, 0);
        assert_ne!(receipt.commit, genesis);
    }

    #[tokio::test]
    async fn test_push_rejects_invalid_segments_before_any_write() {
        let engine = engine();
        let mut children = std::collections::BTreeMap::new();
        children.insert("a/b".to_string(), FileNode::file("x"));
        let tree = FileNode::Directory(children);

        let err = engine.push(&tree, "bad", None).await.unwrap_err();
        assert!(matches!(err, GraftError::InvalidPath(_)));
        assert_eq!(engine.store().counts(), Default::default());
    }

    #[tokio::test]
    async fn test_push_records_author() {
        let engine = engine();
        let author = CommitAuthor::new("Mona", "mona@example.com");
        let receipt = engine
            .push(&sample_tree(), "with author", Some(author.clone()))
            .await
            .unwrap();

        let stored = engine.store().commit(&receipt.commit).unwrap();
        assert_eq!(stored.author.unwrap().email, author.email);
    }

    /// Wraps a store and delays head resolution, for deadline tests.
    struct SlowStore {
        inner: InMemoryStore,
        delay: Duration,
    }

    #[async_trait]
    impl ObjectStore for SlowStore {
        async fn branch_head(&self, branch: &str) -> Result<ObjectId, StoreReadError> {
            tokio::time::sleep(self.delay).await;
            self.inner.branch_head(branch).await
        }
        async fn commit_tree(&self, commit: &ObjectId) -> Result<ObjectId, StoreReadError> {
            self.inner.commit_tree(commit).await
        }
        async fn create_blob(&self, content: &str) -> Result<ObjectId, StoreWriteError> {
            self.inner.create_blob(content).await
        }
        async fn create_tree(
            &self,
            entries: &[TreeEntry],
            base_tree: &ObjectId,
        ) -> Result<ObjectId, StoreWriteError> {
            self.inner.create_tree(entries, base_tree).await
        }
        async fn create_commit(&self, commit: &NewCommit) -> Result<ObjectId, StoreWriteError> {
            self.inner.create_commit(commit).await
        }
        async fn update_branch(
            &self,
            branch: &str,
            commit: &ObjectId,
        ) -> Result<(), StoreWriteError> {
            self.inner.update_branch(branch, commit).await
        }
        async fn read_tree(&self, tree: &ObjectId) -> Result<Vec<TreeEntry>, StoreReadError> {
            self.inner.read_tree(tree).await
        }
        async fn read_file(&self, branch: &str, path: &str) -> Result<String, StoreReadError> {
            self.inner.read_file(branch, path).await
        }
    }

    #[tokio::test]
    async fn test_push_deadline_exceeded() {
        let store = SlowStore {
            inner: InMemoryStore::new("main"),
            delay: Duration::from_millis(100),
        };
        let options = SyncOptions::new("main").with_deadline(Duration::from_millis(5));
        let engine = SyncEngine::new(store, options);

        let err = engine.push(&sample_tree(), "slow", None).await.unwrap_err();
        assert!(matches!(
            err,
            GraftError::Write(StoreWriteError::Deadline { .. })
        ));
    }

    #[tokio::test]
    async fn test_snapshot_deadline_exceeded() {
        let store = SlowStore {
            inner: InMemoryStore::new("main"),
            delay: Duration::from_millis(100),
        };
        let options = SyncOptions::new("main").with_deadline(Duration::from_millis(5));
        let engine = SyncEngine::new(store, options);

        let err = engine.snapshot().await.unwrap_err();
        assert!(matches!(
            err,
            GraftError::Read(StoreReadError::Deadline { .. })
        ));
    }
}
