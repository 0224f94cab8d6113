//! Unified configuration system.
//!
//! Configuration comes from four tiers, merged key by key:
//! 1. **Defaults** - built in
//! 2. **Project** - `$CWD/task-store/config.yaml`
//! 3. **User** - `~/.task-store/config.yaml`
//! 4. **Environment** - see below
//!
//! CLI flags are applied last by the binary.
//!
//! ## Environment Variables
//! - `TASK_STORE_CONFIG_PATH` - Explicit config file (replaces tiers 1-3)
//! - `TASK_STORE_DB_PATH` - Database path
//! - `TASK_STORE_HOST` - Bind address
//! - `TASK_STORE_PORT` (or `PORT`) - Bind port
//! - `TASK_STORE_JWT_SECRET` (or `JWT_SECRET`) - Token signing secret
//! - `TASK_STORE_AUTH_MODE` - `token` or `anonymous`
//! - `TASK_STORE_PROJECT_DIR` / `TASK_STORE_USER_DIR` - Tier directories

mod loader;
mod merge;
mod types;

pub use loader::{ConfigLoader, ConfigPaths, ConfigTier};
pub use merge::{merge_into, merge_layers};
pub use types::*;
