//! CLI parse: clap types for Graft. No behavior; definitions only.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Graft CLI - Remote Git tree synchronization
#[derive(Parser)]
#[command(name = "graft")]
#[command(about = "Synchronize nested file trees to a hosted Git repository")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory (where graft.toml is looked up)
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Branch to operate on (overrides configuration)
    #[arg(long)]
    pub branch: Option<String>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Push a file tree to the remote branch as one new commit
    Push {
        /// Local directory, or a .json manifest describing the tree
        source: PathBuf,

        /// Commit message
        #[arg(long, short)]
        message: String,

        /// Plan against an in-memory store; never touches the remote
        #[arg(long)]
        dry_run: bool,

        /// Issue blob creations one at a time instead of as a batch
        #[arg(long)]
        sequential: bool,

        /// Commit author name (host infers from the token when omitted)
        #[arg(long, requires = "author_email")]
        author_name: Option<String>,

        /// Commit author email
        #[arg(long, requires = "author_name")]
        author_email: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Materialize the remote branch as a nested tree listing
    Tree {
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Print one file's content at the branch head
    Cat {
        /// Slash-joined path of the file
        path: String,
    },
}
