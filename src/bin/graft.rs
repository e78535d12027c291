//! Graft CLI Binary
//!
//! Command-line interface for synchronizing file trees to a hosted Git
//! repository.

use anyhow::Context;
use clap::Parser;
use graft::cli::{map_error, Cli, RunContext};
use graft::config::ConfigLoader;
use graft::logging::{init_logging, LoggingConfig};
use std::process;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Build logging config from CLI args, env vars, and config file
    let logging_config = build_logging_config(&cli);

    init_logging(Some(&logging_config)).context("failed to initialize logging")?;

    info!("Graft CLI starting");

    let context = match RunContext::new(cli.workspace.clone(), cli.config.clone(), cli.branch.clone())
    {
        Ok(ctx) => ctx,
        Err(e) => {
            error!("Error loading configuration: {}", e);
            eprintln!("{}", map_error(&e));
            process::exit(1);
        }
    };

    match context.execute(&cli.command).await {
        Ok(output) => {
            info!("Command completed successfully");
            println!("{}", output);
            Ok(())
        }
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("{}", map_error(&e));
            process::exit(1);
        }
    }
}

/// Build logging configuration from CLI args, environment, and config file.
/// Precedence: CLI flags override config file override defaults.
fn build_logging_config(cli: &Cli) -> LoggingConfig {
    let mut config = if let Some(ref config_path) = cli.config {
        ConfigLoader::load_from_file(config_path)
            .ok()
            .map(|c| c.logging)
            .unwrap_or_default()
    } else {
        ConfigLoader::load(&cli.workspace)
            .ok()
            .map(|c| c.logging)
            .unwrap_or_default()
    };

    if cli.verbose {
        config.level = "debug".to_string();
    }
    if let Some(ref level) = cli.log_level {
        config.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        config.format = format.clone();
    }
    if let Some(ref output) = cli.log_output {
        config.output = output.clone();
    }
    if let Some(ref file) = cli.log_file {
        config.file = file.clone();
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_logging_config_default() {
        let temp = tempfile::tempdir().unwrap();
        let ws = temp.path().to_string_lossy();
        let cli = Cli::try_parse_from(["graft", "--workspace", ws.as_ref(), "tree"]).unwrap();
        let config = build_logging_config(&cli);
        assert_eq!(config.level, "info", "default level should be info");
        assert_eq!(config.output, "stderr", "default output should be stderr");
    }

    #[test]
    fn test_build_logging_config_verbose() {
        let temp = tempfile::tempdir().unwrap();
        let ws = temp.path().to_string_lossy();
        let cli =
            Cli::try_parse_from(["graft", "--workspace", ws.as_ref(), "--verbose", "tree"])
                .unwrap();
        let config = build_logging_config(&cli);
        assert_eq!(config.level, "debug", "verbose should set level to debug");
    }

    #[test]
    fn test_build_logging_config_explicit_flags_win() {
        let temp = tempfile::tempdir().unwrap();
        let ws = temp.path().to_string_lossy();
        let cli = Cli::try_parse_from([
            "graft",
            "--workspace",
            ws.as_ref(),
            "--verbose",
            "--log-level",
            "warn",
            "--log-format",
            "json",
            "tree",
        ])
        .unwrap();
        let config = build_logging_config(&cli);
        assert_eq!(config.level, "warn", "explicit --log-level should win");
        assert_eq!(config.format, "json");
    }
}
