//! CLI presentation: result formatters for push, tree, and dry-run plans.

use crate::error::GraftError;
use crate::sync::{RefUpdate, RepoNode, SyncReceipt};
use crate::tree::FileNode;
use crate::types::EntryKind;
use comfy_table::Table;

use super::parse::OutputFormat;

/// Render a sync receipt.
pub fn format_receipt(
    receipt: &SyncReceipt,
    dry_run: bool,
    format: OutputFormat,
) -> Result<String, GraftError> {
    if format == OutputFormat::Json {
        let out = serde_json::json!({
            "dry_run": dry_run,
            "commit": receipt.commit,
            "tree": receipt.tree,
            "entries": receipt.entry_count,
            "ref_update": receipt.ref_update,
        });
        return Ok(serde_json::to_string_pretty(&out)?);
    }

    let mut s = if dry_run {
        String::from("Dry run (in-memory store; remote untouched):\n")
    } else {
        String::from("Pushed:\n")
    };
    s.push_str(&format!("  Commit:  {}\n", receipt.commit));
    s.push_str(&format!("  Tree:    {}\n", receipt.tree));
    s.push_str(&format!("  Entries: {}\n", receipt.entry_count));
    match &receipt.ref_update {
        RefUpdate::Unchanged { at } => {
            s.push_str(&format!("  Ref:     unchanged at {}", at.short()));
        }
        RefUpdate::Advanced { from, to } => {
            s.push_str(&format!("  Ref:     {} -> {}", from.short(), to.short()));
        }
    }
    Ok(s)
}

/// Render the leaf files of a local tree as a plan table.
pub fn format_file_tree(tree: &FileNode) -> String {
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Path", "Bytes"]);
    for path in tree.leaf_paths() {
        let bytes = match tree.get(&path) {
            Some(FileNode::File(content)) => content.len().to_string(),
            _ => "-".to_string(),
        };
        table.add_row(vec![path, bytes]);
    }
    table.to_string()
}

/// Render a materialized remote branch.
pub fn format_repo_tree(root: &RepoNode, format: OutputFormat) -> Result<String, GraftError> {
    if format == OutputFormat::Json {
        return Ok(serde_json::to_string_pretty(root)?);
    }

    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Path", "Kind", "Object"]);
    for (path, node) in root.descendants() {
        let kind = match node {
            RepoNode::Tree { .. } => "tree",
            RepoNode::Leaf { kind, .. } => match kind {
                EntryKind::Blob => "blob",
                EntryKind::Tree => "tree",
                EntryKind::Commit => "submodule",
            },
        };
        table.add_row(vec![path.as_str(), kind, node.id().short()]);
    }
    Ok(table.to_string())
}
