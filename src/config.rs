//! Configuration System
//!
//! Layered configuration for the sync engine: built-in defaults, a global
//! file under `~/.config/graft/config.toml`, a workspace `graft.toml`, and
//! `GRAFT_*` environment overrides, merged in that order. The resulting
//! struct is passed explicitly into every entry point; nothing reads
//! configuration from process-wide state.
//!
//! The API token is deliberately NOT part of the file-based configuration.
//! It is resolved from the environment at client construction so it never
//! lands in a config file.

use crate::error::GraftError;
use crate::logging::LoggingConfig;
use crate::store::github::{HttpConfig, RemoteConfig};
use config::Environment;
use serde::{Deserialize, Serialize};
use std::path::Path;

mod merge;
mod sources;

pub use sources::global_file::global_config_path;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraftConfig {
    /// Remote repository coordinates
    #[serde(default)]
    pub remote: RemoteConfig,

    /// HTTP client tuning
    #[serde(default)]
    pub http: HttpConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GraftConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), GraftError> {
        self.remote.validate().map_err(GraftError::Config)
    }
}

/// Loads configuration from layered sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace.
    ///
    /// Precedence (lowest to highest): defaults, global
    /// `~/.config/graft/config.toml`, workspace `graft.toml`, then
    /// `GRAFT_*` environment variables (`GRAFT_REMOTE__OWNER`,
    /// `GRAFT_HTTP__REQUEST_TIMEOUT_SECS`, ...).
    pub fn load(workspace_root: &Path) -> Result<GraftConfig, GraftError> {
        let mut builder = merge::merge_policy::builder_with_defaults()?;
        builder = sources::global_file::add_to_builder(builder)?;
        builder = sources::workspace_file::add_to_builder(builder, workspace_root)?;
        builder = builder.add_source(
            Environment::with_prefix("GRAFT")
                .prefix_separator("_")
                .separator("__"),
        );

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Load configuration from a single explicit file, skipping the layered
    /// lookup. Environment overrides still apply.
    pub fn load_from_file(path: &Path) -> Result<GraftConfig, GraftError> {
        let file = path.to_str().ok_or_else(|| {
            GraftError::Config(format!("config path {} is not UTF-8", path.display()))
        })?;
        let builder = merge::merge_policy::builder_with_defaults()?
            .add_source(config::File::with_name(file))
            .add_source(
                Environment::with_prefix("GRAFT")
                    .prefix_separator("_")
                    .separator("__"),
            );

        Ok(builder.build()?.try_deserialize()?)
    }
}

/// Resolve the bearer token from the environment.
///
/// `GRAFT_TOKEN` wins; `GITHUB_TOKEN` is the fallback. Provisioning the
/// value (secret store, CI variable) is an external concern.
pub fn resolve_token() -> Result<String, GraftError> {
    std::env::var("GRAFT_TOKEN")
        .or_else(|_| std::env::var("GITHUB_TOKEN"))
        .map_err(|_| {
            GraftError::Config(
                "no API token found: set GRAFT_TOKEN or GITHUB_TOKEN".to_string(),
            )
        })
}
