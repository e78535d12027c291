//! Workspace config file source: graft.toml at the workspace root

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::File;
use std::path::Path;

/// Add the workspace config file to the builder if it exists.
pub fn add_to_builder(
    mut builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let config_path = workspace_root.join("graft.toml");
    if config_path.exists() {
        if let Some(name) = config_path.to_str() {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }
    Ok(builder)
}
