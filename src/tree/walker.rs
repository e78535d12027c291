//! Local directory ingestion into a file tree

use crate::error::GraftError;
use crate::tree::node::FileNode;
use crate::tree::path;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Ingestion configuration
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// Whether to follow symbolic links (default: false for determinism)
    pub follow_symlinks: bool,
    /// Directory or file names to skip entirely
    pub ignore_patterns: Vec<String>,
    /// Whether to include dot-prefixed entries (default: false)
    pub include_hidden: bool,
    /// Maximum depth to traverse (None = unlimited)
    pub max_depth: Option<usize>,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            follow_symlinks: false,
            ignore_patterns: vec![
                ".git".to_string(),
                "target".to_string(),
                "node_modules".to_string(),
            ],
            include_hidden: false,
            max_depth: None,
        }
    }
}

/// Reads a directory from disk into the nested [`FileNode`] shape.
///
/// Only UTF-8 text files become leaves. Directories appear implicitly under
/// their files; an empty directory has no representation in the remote tree
/// and is dropped.
pub struct Walker {
    root: PathBuf,
    config: WalkerConfig,
}

impl Walker {
    /// Create a new walker for the given root path
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            config: WalkerConfig::default(),
        }
    }

    /// Create a walker with custom configuration
    pub fn with_config(root: PathBuf, config: WalkerConfig) -> Self {
        Self { root, config }
    }

    /// Walk the filesystem and build the file tree.
    ///
    /// The resulting tree is deterministic for a given directory state; the
    /// ordered mapping absorbs whatever order the filesystem yields.
    pub fn walk(&self) -> Result<FileNode, GraftError> {
        if !self.root.is_dir() {
            return Err(GraftError::InvalidPath(format!(
                "{} is not a directory",
                self.root.display()
            )));
        }

        let mut tree = FileNode::dir();

        let walker = WalkDir::new(&self.root)
            .follow_links(self.config.follow_symlinks)
            .max_depth(self.config.max_depth.unwrap_or(usize::MAX));

        for entry in walker {
            let entry = entry.map_err(|e| {
                GraftError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    format!("Failed to walk directory: {}", e),
                ))
            })?;

            // Skip the root directory itself (we only want its contents)
            if entry.path() == self.root {
                continue;
            }

            // Ignore patterns and hidden entries match against the path
            // relative to the root, so a hidden parent of the root itself
            // does not suppress everything.
            let rel = entry
                .path()
                .strip_prefix(&self.root)
                .map_err(|_| GraftError::InvalidPath(format!(
                    "{} escaped the walk root",
                    entry.path().display()
                )))?;
            if self.should_skip(rel) {
                continue;
            }

            // Directories are created implicitly when a file below them is
            // inserted. Symlinks are skipped when not following them.
            if !entry.file_type().is_file() {
                continue;
            }

            let content = read_text_file(entry.path())?;
            let segments = rel_segments(rel)?;
            insert_file(&mut tree, &segments, content)?;
        }

        Ok(tree)
    }

    fn should_skip(&self, rel: &Path) -> bool {
        for component in rel.components() {
            if let std::path::Component::Normal(name) = component {
                let name = name.to_string_lossy();
                if !self.config.include_hidden && name.starts_with('.') {
                    return true;
                }
                if self.config.ignore_patterns.iter().any(|p| p == &name) {
                    return true;
                }
            }
        }
        false
    }
}

fn read_text_file(path: &Path) -> Result<String, GraftError> {
    std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::InvalidData {
            GraftError::InvalidPath(format!("{} is not UTF-8 text", path.display()))
        } else {
            GraftError::Io(e)
        }
    })
}

fn rel_segments(rel: &Path) -> Result<Vec<String>, GraftError> {
    rel.components()
        .map(|component| match component {
            std::path::Component::Normal(name) => name
                .to_str()
                .map(str::to_string)
                .ok_or_else(|| {
                    GraftError::InvalidPath(format!("{} has a non-UTF-8 name", rel.display()))
                }),
            other => Err(GraftError::InvalidPath(format!(
                "unexpected path component {:?} in {}",
                other,
                rel.display()
            ))),
        })
        .collect()
}

fn insert_file(node: &mut FileNode, segments: &[String], content: String) -> Result<(), GraftError> {
    match segments {
        [] => Err(GraftError::InvalidPath(
            "file path has no components".to_string(),
        )),
        [leaf] => {
            path::validate_segment(leaf)?;
            node.insert(leaf.clone(), FileNode::file(content))
        }
        [dir, rest @ ..] => {
            path::validate_segment(dir)?;
            match node {
                FileNode::Directory(children) => {
                    let child = children
                        .entry(dir.clone())
                        .or_insert_with(FileNode::dir);
                    insert_file(child, rest, content)
                }
                FileNode::File(_) => Err(GraftError::InvalidPath(format!(
                    "'{}' is both a file and a directory",
                    dir
                ))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_walk_builds_nested_tree() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().to_path_buf();

        fs::create_dir(root.join("a")).unwrap();
        fs::write(root.join("a").join("x.txt"), "hi").unwrap();
        fs::write(root.join("y.txt"), "bye").unwrap();

        let tree = Walker::new(root).walk().unwrap();
        assert_eq!(tree.leaf_paths(), vec!["a/x.txt", "y.txt"]);
        assert_eq!(tree.get("a/x.txt"), Some(&FileNode::file("hi")));
    }

    #[test]
    fn test_walk_ignores_git_directory() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().to_path_buf();

        fs::write(root.join("file.txt"), "content").unwrap();
        fs::create_dir(root.join(".git")).unwrap();
        fs::write(root.join(".git").join("config"), "git config").unwrap();

        let tree = Walker::new(root).walk().unwrap();
        assert_eq!(tree.leaf_paths(), vec!["file.txt"]);
    }

    #[test]
    fn test_walk_skips_hidden_unless_configured() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().to_path_buf();

        fs::write(root.join("visible.txt"), "a").unwrap();
        fs::write(root.join(".hidden.txt"), "b").unwrap();

        let tree = Walker::new(root.clone()).walk().unwrap();
        assert_eq!(tree.leaf_paths(), vec!["visible.txt"]);

        let config = WalkerConfig {
            include_hidden: true,
            ..WalkerConfig::default()
        };
        let tree = Walker::with_config(root, config).walk().unwrap();
        assert_eq!(tree.leaf_paths(), vec![".hidden.txt", "visible.txt"]);
    }

    #[test]
    fn test_walk_drops_empty_directories() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().to_path_buf();

        fs::create_dir(root.join("empty")).unwrap();
        fs::write(root.join("file.txt"), "content").unwrap();

        let tree = Walker::new(root).walk().unwrap();
        assert_eq!(tree.leaf_paths(), vec!["file.txt"]);
        assert_eq!(tree.get("empty"), None);
    }

    #[test]
    fn test_walk_rejects_non_utf8_content() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().to_path_buf();

        fs::write(root.join("binary.bin"), [0xff, 0xfe, 0x00, 0x01]).unwrap();

        let err = Walker::new(root).walk().unwrap_err();
        assert!(matches!(err, GraftError::InvalidPath(_)));
    }

    #[test]
    fn test_walk_is_deterministic() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().to_path_buf();

        fs::write(root.join("z.txt"), "z").unwrap();
        fs::write(root.join("a.txt"), "a").unwrap();
        fs::create_dir(root.join("m")).unwrap();
        fs::write(root.join("m").join("n.txt"), "n").unwrap();

        let first = Walker::new(root.clone()).walk().unwrap();
        let second = Walker::new(root).walk().unwrap();
        assert_eq!(first, second);
        assert_eq!(first.leaf_paths(), vec!["a.txt", "m/n.txt", "z.txt"]);
    }

    #[test]
    fn test_walk_requires_directory_root() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("plain.txt");
        fs::write(&file, "content").unwrap();

        let err = Walker::new(file).walk().unwrap_err();
        assert!(matches!(err, GraftError::InvalidPath(_)));
    }
}
