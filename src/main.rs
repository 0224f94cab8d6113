//! Task Store Server
//!
//! A REST service for personal to-do lists, with accounts, bearer tokens and
//! per-user task scoping over SQLite.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use task_store::cli::{Cli, Command};
use task_store::config::{AuthMode, Config, ConfigLoader};
use task_store::db::Database;
use task_store::logging::{LogTarget, init_logging};
use task_store::server::{AppState, start_server};
use tracing::{debug, info, warn};

fn load_config(cli: &Cli) -> Result<Config> {
    let loader = match &cli.config {
        Some(path) => ConfigLoader::load_file(path)?,
        None => ConfigLoader::load()?,
    };
    if let Some(path) = loader.config_path() {
        debug!("Loaded config from {}", path.display());
    }

    let mut config = loader.into_config();
    cli.apply_overrides(&mut config);
    config.validate()?;
    Ok(config)
}

fn open_database(config: &Config) -> Result<Database> {
    config.ensure_db_dir()?;
    let path = &config.server.db_path;
    let db = Database::open(path)
        .with_context(|| format!("failed to open database {}", path.display()))?;
    info!("Database ready at {}", path.display());
    Ok(db)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&LogTarget::parse(&cli.log), cli.verbose)?;

    let config = load_config(&cli)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::InitDb => {
            open_database(&config)?;
        }
        Command::Serve => {
            let db = Arc::new(open_database(&config)?);

            match config.auth.mode {
                AuthMode::Token if config.auth.uses_default_secret() => {
                    warn!(
                        "Using the built-in development JWT secret; set TASK_STORE_JWT_SECRET \
                         before exposing this server"
                    );
                }
                AuthMode::Anonymous => {
                    warn!("Anonymous mode: every caller can read and modify every task");
                }
                AuthMode::Token => {}
            }

            let bind_addr = config.bind_addr();
            let state = AppState::new(db, config.auth);
            let handle = start_server(state, &bind_addr).await?;
            handle.run_until(shutdown_signal()).await?;
        }
    }

    Ok(())
}
