//! General application configuration.

use serde::{Deserialize, Serialize};

fn default_database() -> String {
    String::from(".symq/index.db")
}

const fn default_busy_timeout_ms() -> u64 {
    5000
}

const fn default_concurrent() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// Path to the symbol database.
    #[serde(default = "default_database")]
    pub database: String,

    /// Default result limit; 0 means unlimited.
    #[serde(default)]
    pub default_limit: u32,

    /// Open the database in concurrent mode (WAL, relaxed fsync, busy timeout)
    /// so queries can run while an indexer writes.
    #[serde(default = "default_concurrent")]
    pub concurrent: bool,

    /// How long a locked database is retried by the engine before failing.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            default_limit: 0,
            concurrent: default_concurrent(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = GeneralConfig::default();
        assert_eq!(config.database, ".symq/index.db");
        assert_eq!(config.default_limit, 0);
        assert!(config.concurrent);
        assert_eq!(config.busy_timeout_ms, 5000);
    }
}
