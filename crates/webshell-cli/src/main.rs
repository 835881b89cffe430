//! Webshell CLI - host for the webshell plugin manager.
//!
//! Manages plugin enable flags in the user settings file and can boot the
//! plugin system headlessly to exercise plugins against a list of URLs.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use webshell_telemetry::{LogConfig, LogFormat, setup_logging};

mod commands;
pub mod config_bridge;
mod headless;
mod theme;

use commands::{Host, plugins, run};

/// Webshell - desktop webview shell
#[derive(Parser)]
#[command(name = "webshell")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file (defaults to the platform config directory)
    #[arg(short, long, global = true, env = "WEBSHELL_CONFIG")]
    config: Option<PathBuf>,

    /// Additional plugin directory (repeatable)
    #[arg(long = "plugin-dir", global = true)]
    plugin_dirs: Vec<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format: pretty, compact, json or full (overrides the settings file)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage plugins
    Plugins {
        #[command(subcommand)]
        command: PluginCommands,
    },

    /// Boot the plugin system and load pages without a window
    Run {
        /// Page URLs to load, in order
        #[arg(long = "url", required = true)]
        urls: Vec<String>,
    },
}

#[derive(Subcommand)]
enum PluginCommands {
    /// List discovered plugins and their enabled flags
    List,
    /// Enable a plugin
    Enable {
        /// Plugin name
        name: String,
    },
    /// Disable a plugin
    Disable {
        /// Plugin name
        name: String,
    },
    /// Load every plugin and report what happened
    Scan,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let host = Host::open(cli.config.as_deref(), &cli.plugin_dirs);

    // Set up logging from the settings file, with flag overrides.
    let mut log_config = match &host {
        Ok(host) => config_bridge::to_log_config(&host.config.log),
        // Fallback if the settings file is unusable; the error is reported below.
        Err(_) => LogConfig::new("info"),
    };
    if cli.verbose {
        "debug".clone_into(&mut log_config.level);
    }
    if let Some(format) = cli.log_format {
        log_config.format = format;
    }
    if let Err(e) = setup_logging(&log_config) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let mut host = host?;
    match cli.command {
        Commands::Plugins { command } => match command {
            PluginCommands::List => plugins::list_plugins(&host)?,
            PluginCommands::Enable { name } => plugins::enable_plugin(&mut host, &name)?,
            PluginCommands::Disable { name } => plugins::disable_plugin(&mut host, &name)?,
            PluginCommands::Scan => plugins::scan_plugins(&mut host)?,
        },
        Commands::Run { urls } => run::run_pages(&mut host, &urls)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "webshell",
            "plugins",
            "enable",
            "test",
            "--plugin-dir",
            "/a",
            "--plugin-dir",
            "/b",
            "--log-format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.plugin_dirs, vec![PathBuf::from("/a"), PathBuf::from("/b")]);
        assert_eq!(cli.log_format, Some(LogFormat::Json));
        assert!(matches!(
            cli.command,
            Commands::Plugins {
                command: PluginCommands::Enable { ref name }
            } if name == "test"
        ));
    }

    #[test]
    fn test_run_requires_url() {
        assert!(Cli::try_parse_from(["webshell", "run"]).is_err());
        let cli = Cli::try_parse_from(["webshell", "run", "--url", "a", "--url", "b"]).unwrap();
        assert!(matches!(cli.command, Commands::Run { ref urls } if urls.len() == 2));
    }
}
