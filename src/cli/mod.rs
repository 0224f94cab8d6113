//! CLI command definitions for task-store.
//!
//! This module defines the CLI structure using clap's derive macros.

use crate::config::{AuthMode, Config};
use clap::{Parser, Subcommand};

/// Task store REST server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (replaces the project and user tiers)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Path to database file (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Address to bind (overrides config)
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Port to bind (overrides config)
    #[arg(short, long, global = true)]
    pub port: Option<u16>,

    /// Serve tasks without accounts or tokens
    #[arg(long, global = true)]
    pub anonymous: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Start the HTTP server (default if no subcommand given)
    Serve,

    /// Create or migrate the database file, then exit
    InitDb,
}

impl Cli {
    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(db_path) = &self.database {
            config.server.db_path = db_path.into();
        }
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if self.anonymous {
            config.auth.mode = AuthMode::Anonymous;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn defaults_to_serve_on_stderr() {
        let cli = Cli::parse_from(["task-store"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.log, "2");
        assert!(!cli.anonymous);
    }

    #[test]
    fn overrides_replace_config_values() {
        let cli = Cli::parse_from([
            "task-store",
            "--database",
            "other.db",
            "--port",
            "8081",
            "--anonymous",
            "serve",
        ]);
        assert_eq!(cli.command, Some(Command::Serve));

        let mut config = Config::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.server.db_path, PathBuf::from("other.db"));
        assert_eq!(config.server.port, 8081);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.auth.mode, AuthMode::Anonymous);
    }

    #[test]
    fn init_db_subcommand() {
        let cli = Cli::parse_from(["task-store", "init-db", "-d", "fresh.db"]);
        assert_eq!(cli.command, Some(Command::InitDb));
        assert_eq!(cli.database.as_deref(), Some("fresh.db"));
    }
}
