//! CLI domain: parse, route, output, and presentation only.
//! No domain orchestration; single route table dispatches to the sync engine.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands, OutputFormat};
pub use presentation::{format_file_tree, format_receipt, format_repo_tree};
pub use route::RunContext;
