use std::path::Path;
use std::time::Duration;

use anyhow::{Context, bail};
use symq_config::GeneralConfig;
use symq_db::{DbOptions, SymbolDb};

pub mod load;
pub mod query;

const MEMORY: &str = ":memory:";

#[must_use]
pub const fn db_options(general: &GeneralConfig) -> DbOptions {
    DbOptions {
        concurrent: general.concurrent,
        busy_timeout: Duration::from_millis(general.busy_timeout_ms),
    }
}

/// Open an index that must already exist.
///
/// # Errors
///
/// Fails with a hint when the file is missing, or with the engine error.
pub async fn open_existing(path: &str, general: &GeneralConfig) -> anyhow::Result<SymbolDb> {
    if path != MEMORY && !Path::new(path).is_file() {
        bail!("symbol database '{path}' does not exist; build it with symq-load or pass --db");
    }
    SymbolDb::open_local(path, db_options(general))
        .await
        .with_context(|| format!("failed to open symbol database '{path}'"))
}

/// Open an index for loading, creating the file and its directory.
///
/// # Errors
///
/// Fails if the directory cannot be created or the engine refuses the file.
pub async fn open_or_create(path: &str, general: &GeneralConfig) -> anyhow::Result<SymbolDb> {
    if path != MEMORY
        && let Some(parent) = Path::new(path).parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create '{}'", parent.display()))?;
    }
    SymbolDb::open_local(path, db_options(general))
        .await
        .with_context(|| format!("failed to open symbol database '{path}'"))
}
