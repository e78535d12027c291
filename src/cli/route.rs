//! CLI route: dispatches parsed commands to the sync engine.
//!
//! Every action here runs only because the user asked for it; nothing
//! synchronizes as a side effect of construction.

use crate::cli::parse::{Commands, OutputFormat};
use crate::cli::presentation;
use crate::config::{resolve_token, ConfigLoader, GraftConfig};
use crate::error::GraftError;
use crate::store::{GitHubStore, InMemoryStore};
use crate::sync::{FlattenMode, SyncEngine, SyncOptions};
use crate::tree::{FileNode, Walker};
use crate::types::CommitAuthor;
use std::path::{Path, PathBuf};

/// Loaded configuration plus command dispatch.
pub struct RunContext {
    config: GraftConfig,
}

impl RunContext {
    /// Load configuration for the workspace and apply CLI overrides.
    pub fn new(
        workspace: PathBuf,
        config_file: Option<PathBuf>,
        branch: Option<String>,
    ) -> Result<Self, GraftError> {
        let mut config = match config_file {
            Some(path) => ConfigLoader::load_from_file(&path)?,
            None => ConfigLoader::load(&workspace)?,
        };
        if let Some(branch) = branch {
            config.remote.branch = branch;
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &GraftConfig {
        &self.config
    }

    /// Execute one command and return its printable output.
    pub async fn execute(&self, command: &Commands) -> Result<String, GraftError> {
        match command {
            Commands::Push {
                source,
                message,
                dry_run,
                sequential,
                author_name,
                author_email,
                format,
            } => {
                let author = author_name
                    .as_deref()
                    .zip(author_email.as_deref())
                    .map(|(name, email)| CommitAuthor::new(name, email));
                self.push(source, message, *dry_run, *sequential, author, *format)
                    .await
            }
            Commands::Tree { format } => {
                let engine = self.remote_engine(FlattenMode::Concurrent)?;
                let root = engine.snapshot().await?;
                presentation::format_repo_tree(&root, *format)
            }
            Commands::Cat { path } => {
                let engine = self.remote_engine(FlattenMode::Concurrent)?;
                engine.fetch_file(path).await
            }
        }
    }

    async fn push(
        &self,
        source: &Path,
        message: &str,
        dry_run: bool,
        sequential: bool,
        author: Option<CommitAuthor>,
        format: OutputFormat,
    ) -> Result<String, GraftError> {
        let tree = load_source(source)?;
        let mode = if sequential {
            FlattenMode::Sequential
        } else {
            FlattenMode::Concurrent
        };

        if dry_run {
            let store = InMemoryStore::new(&self.config.remote.branch);
            let engine = SyncEngine::new(store, self.options(mode));
            let receipt = engine.push(&tree, message, author).await?;
            let mut out = presentation::format_receipt(&receipt, true, format)?;
            if format == OutputFormat::Text {
                out = format!("{}\n{}", presentation::format_file_tree(&tree), out);
            }
            return Ok(out);
        }

        let engine = self.remote_engine(mode)?;
        let receipt = engine.push(&tree, message, author).await?;
        presentation::format_receipt(&receipt, false, format)
    }

    fn options(&self, mode: FlattenMode) -> SyncOptions {
        let mut options =
            SyncOptions::new(&self.config.remote.branch).with_flatten_mode(mode);
        if let Some(deadline) = self.config.http.operation_deadline() {
            options = options.with_deadline(deadline);
        }
        options
    }

    fn remote_engine(&self, mode: FlattenMode) -> Result<SyncEngine<GitHubStore>, GraftError> {
        self.config.validate()?;
        let token = resolve_token()?;
        let store = GitHubStore::new(&self.config.remote, token, &self.config.http)?;
        Ok(SyncEngine::new(store, self.options(mode)))
    }
}

/// Build a file tree from a push source: a `.json` manifest file or a local
/// directory.
fn load_source(source: &Path) -> Result<FileNode, GraftError> {
    if source.is_file() {
        if source.extension().map_or(false, |ext| ext == "json") {
            let raw = std::fs::read_to_string(source)?;
            return FileNode::from_manifest(&raw);
        }
        return Err(GraftError::InvalidPath(format!(
            "{} is a file; push sources are directories or .json manifests",
            source.display()
        )));
    }
    Walker::new(source.to_path_buf()).walk()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn context(branch: &str) -> RunContext {
        let temp_dir = TempDir::new().unwrap();
        RunContext::new(
            temp_dir.path().to_path_buf(),
            None,
            Some(branch.to_string()),
        )
        .unwrap()
    }

    #[test]
    fn test_branch_override_wins() {
        let context = context("release");
        assert_eq!(context.config().remote.branch, "release");
    }

    #[tokio::test]
    async fn test_dry_run_push_from_manifest() {
        let temp_dir = TempDir::new().unwrap();
        let manifest = temp_dir.path().join("site.json");
        fs::write(&manifest, r#"{"a": {"x.txt": "hi"}, "y.txt": "bye"}"#).unwrap();

        let context = context("main");
        let output = context
            .execute(&Commands::Push {
                source: manifest,
                message: "sync files".to_string(),
                dry_run: true,
                sequential: false,
                author_name: None,
                author_email: None,
                format: OutputFormat::Text,
            })
            .await
            .unwrap();

        assert!(output.contains("Dry run"));
        assert!(output.contains("a/x.txt"));
        assert!(output.contains("Entries: 2"));
    }

    #[tokio::test]
    async fn test_dry_run_push_from_directory() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("site");
        fs::create_dir(&source).unwrap();
        fs::write(source.join("y.txt"), "bye").unwrap();

        let context = context("main");
        let output = context
            .execute(&Commands::Push {
                source,
                message: "sync files".to_string(),
                dry_run: true,
                sequential: true,
                author_name: None,
                author_email: None,
                format: OutputFormat::Json,
            })
            .await
            .unwrap();

        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json["dry_run"], true);
        assert_eq!(json["entries"], 1);
    }

    #[test]
    fn test_load_source_rejects_non_manifest_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("notes.txt");
        fs::write(&file, "plain").unwrap();

        let err = load_source(&file).unwrap_err();
        assert!(matches!(err, GraftError::InvalidPath(_)));
    }
}
