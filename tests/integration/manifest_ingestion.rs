//! Manifest and directory ingestion produce the same file tree and the
//! same content-addressed objects.

use graft::store::InMemoryStore;
use graft::sync::{SyncEngine, SyncOptions};
use graft::tree::{FileNode, Walker};
use std::fs;
use tempfile::TempDir;

const MANIFEST: &str = r##"{
    "docs": {
        "guide.md": "# Guide\n",
        "notes.md": "remember\n"
    },
    "readme.md": "hello\n"
}"##;

fn equivalent_directory() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    fs::create_dir(root.join("docs")).unwrap();
    fs::write(root.join("docs").join("guide.md"), "# Guide\n").unwrap();
    fs::write(root.join("docs").join("notes.md"), "remember\n").unwrap();
    fs::write(root.join("readme.md"), "hello\n").unwrap();
    temp_dir
}

#[test]
fn test_manifest_and_directory_build_the_same_tree() {
    let from_manifest = FileNode::from_manifest(MANIFEST).unwrap();
    let dir = equivalent_directory();
    let from_disk = Walker::new(dir.path().to_path_buf()).walk().unwrap();

    assert_eq!(from_manifest, from_disk);
    assert_eq!(
        from_manifest.leaf_paths(),
        vec!["docs/guide.md", "docs/notes.md", "readme.md"]
    );
}

#[tokio::test]
async fn test_equivalent_sources_produce_the_same_tree_object() {
    let from_manifest = FileNode::from_manifest(MANIFEST).unwrap();
    let dir = equivalent_directory();
    let from_disk = Walker::new(dir.path().to_path_buf()).walk().unwrap();

    let first = SyncEngine::new(InMemoryStore::new("main"), SyncOptions::new("main"));
    let second = SyncEngine::new(InMemoryStore::new("main"), SyncOptions::new("main"));

    let manifest_receipt = first.push(&from_manifest, "sync", None).await.unwrap();
    let disk_receipt = second.push(&from_disk, "sync", None).await.unwrap();

    // Content addressing makes the tree id independent of the source.
    assert_eq!(manifest_receipt.tree, disk_receipt.tree);
    assert_eq!(manifest_receipt.entry_count, 3);
}

#[test]
fn test_manifest_rejects_invalid_segments() {
    assert!(FileNode::from_manifest(r#"{"a/b.txt": "x"}"#).is_err());
    assert!(FileNode::from_manifest(r#"{"..": {"x.txt": "x"}}"#).is_err());
    assert!(FileNode::from_manifest(r#""bare string""#).is_err());
}

#[test]
fn test_manifest_serialization_round_trips_object_literal_shape() {
    let tree = FileNode::from_manifest(MANIFEST).unwrap();
    let json = serde_json::to_string(&tree).unwrap();
    let reparsed = FileNode::from_manifest(&json).unwrap();
    assert_eq!(tree, reparsed);
}
