//! Full sync cycles against the in-memory store: write path, read path,
//! and the ref-update no-op guarantee.

use graft::store::{InMemoryStore, ObjectStore};
use graft::sync::{flatten_tree, FlattenMode, RefUpdate, SyncEngine, SyncOptions};
use graft::tree::FileNode;
use graft::error::{GraftError, StoreReadError};

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
async fn test_flatten_scenario_has_both_paths_exactly_once() {
    let store = InMemoryStore::new("main");
    let entries = flatten_tree(&store, &sample_tree(), FlattenMode::Concurrent)
        .await
        .unwrap();

    let paths: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(paths.iter().filter(|p| **p == "a/x.txt").count(), 1);
    assert_eq!(paths.iter().filter(|p| **p == "y.txt").count(), 1);
    assert_eq!(entries.len(), 2);
}

#[tokio::test]
async fn test_push_then_materialize_round_trips_leaf_paths() {
    let engine = engine();
    let tree = sample_tree();

    engine.push(&tree, "sync files", None).await.unwrap();

    let root = engine.snapshot().await.unwrap();
    assert_eq!(root.leaf_paths(), tree.leaf_paths());
}

#[tokio::test]
async fn test_commit_has_exactly_one_parent() {
    let engine = engine();
    let head = engine.store().branch_head("main").await.unwrap();

    let receipt = engine.push(&sample_tree(), "sync files", None).await.unwrap();

    let commit = engine.store().commit(&receipt.commit).unwrap();
    assert_eq!(commit.parents, vec![head]);
}

#[tokio::test]
async fn test_sequential_identical_syncs_advance_ref_twice() {
    let engine = engine();
    let tree = sample_tree();

    let first = engine.push(&tree, "sync files", None).await.unwrap();
    let second = engine.push(&tree, "sync files", None).await.unwrap();

    // New commit objects are always created even for identical content.
    assert_ne!(first.commit, second.commit);
    // The identical tree is content-addressed to the same object.
    assert_eq!(first.tree, second.tree);
    // Without interleaving writers, neither update is skipped.
    assert!(matches!(first.ref_update, RefUpdate::Advanced { .. }));
    assert_eq!(
        second.ref_update,
        RefUpdate::Advanced {
            from: first.commit.clone(),
            to: second.commit.clone(),
        }
    );
    assert_eq!(engine.store().counts().ref_updates, 2);
}

#[tokio::test]
async fn test_fetch_file_round_trips_content() {
    let engine = engine();
    engine.push(&sample_tree(), "sync files", None).await.unwrap();

    assert_eq!(engine.fetch_file("a/x.txt").await.unwrap(), "hi");
    assert_eq!(engine.fetch_file("y.txt").await.unwrap(), "bye");
}

#[tokio::test]
async fn test_fetch_absent_path_fails_without_side_effects() {
    let engine = engine();
    engine.push(&sample_tree(), "sync files", None).await.unwrap();
    let counts_before = engine.store().counts();

    let err = engine.fetch_file("a/missing.txt").await.unwrap_err();
    assert!(matches!(
        err,
        GraftError::Read(StoreReadError::PathNotFound { .. })
    ));
    assert_eq!(engine.store().counts(), counts_before);
}

#[tokio::test]
async fn test_second_push_layers_over_first() {
    let engine = engine();
    engine.push(&sample_tree(), "first", None).await.unwrap();

    let mut update = FileNode::dir();
    update.insert("z.txt", FileNode::file("new")).unwrap();
    engine.push(&update, "second", None).await.unwrap();

    // Paths outside the second description survive the layering.
    let root = engine.snapshot().await.unwrap();
    assert_eq!(root.leaf_paths(), vec!["a/x.txt", "y.txt", "z.txt"]);
    assert_eq!(engine.fetch_file("a/x.txt").await.unwrap(), "hi");
}

#[tokio::test]
async fn test_materialized_ids_match_store_listing() {
    let store = InMemoryStore::new("main");
    let entries = flatten_tree(&store, &sample_tree(), FlattenMode::Sequential)
        .await
        .unwrap();
    let engine = SyncEngine::new(store, SyncOptions::new("main"));
    let receipt = engine.push(&sample_tree(), "sync files", None).await.unwrap();

    let root = engine.snapshot().await.unwrap();
    assert_eq!(root.id(), &receipt.tree);

    // Every blob leaf carries the id flattening produced for it.
    for (path, node) in root.descendants() {
        if let Some(entry) = entries.iter().find(|e| e.path == path) {
            assert_eq!(node.id(), &entry.id);
        }
    }
}
