//! Merge rules: defaults, override order, conflict handling.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("remote.owner", "")?
        .set_default("remote.repo", "")?
        .set_default("remote.branch", "main")?
        .set_default("remote.api_base", "https://api.github.com")
}
