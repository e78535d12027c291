//! Global config file source: ~/.config/graft/config.toml

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::File;
use std::path::PathBuf;

/// Path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(|home| {
        PathBuf::from(home)
            .join(".config")
            .join("graft")
            .join("config.toml")
    })
}

/// Add the global config file source to the builder if it exists.
pub fn add_to_builder(
    mut builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    if let Some(global_path) = global_config_path() {
        if global_path.exists() {
            let canonical_path = global_path
                .canonicalize()
                .unwrap_or_else(|_| global_path.clone());
            if let Some(name) = canonical_path.to_str() {
                builder = builder.add_source(File::with_name(name).required(false));
            }
        }
    }
    Ok(builder)
}
