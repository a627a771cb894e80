//! # symq-config
//!
//! Layered configuration loading for symq using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`SYMQ_*` prefix, `__` as separator)
//! 2. Project-level `.symq/config.toml`
//! 3. User-level `~/.config/symq/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `SYMQ_GENERAL__DATABASE` -> `general.database`,
//! `SYMQ_SEARCH__MIN_SYMBOL_LEN` -> `search.min_symbol_len`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use symq_config::SymqConfig;
//!
//! let config = SymqConfig::load_with_dotenv().expect("config");
//! println!("database: {}", config.general.database);
//! ```

mod error;
mod flags;
mod general;
mod search;

pub use error::ConfigError;
pub use flags::{FlagAliases, FlagDefaults, merge_flag_lines};
pub use general::GeneralConfig;
pub use search::SearchConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SymqConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub flags: FlagDefaults,
}

impl SymqConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy` -- use [`Self::load_with_dotenv`] for `.env` support.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Figment` if a source fails to parse or a value
    /// has the wrong type.
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment().extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration after reading a `.env` file from the current directory.
    ///
    /// # Errors
    ///
    /// See [`Self::load`].
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests can inspect the figment directly or add providers on top.
    #[must_use]
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(global_path));
        }

        // Layer 2: Project-local config
        let local_path = PathBuf::from(".symq/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // Layer 3: Environment variables (highest priority)
        figment.merge(Env::prefixed("SYMQ_").split("__"))
    }

    /// Reject values that parse but make no sense.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.general.database.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: String::from("general.database"),
                reason: String::from("must not be empty"),
            });
        }
        if self.search.toc_leader_width < 10 {
            return Err(ConfigError::InvalidValue {
                field: String::from("search.toc_leader_width"),
                reason: format!("{} is narrower than 10 columns", self.search.toc_leader_width),
            });
        }
        Ok(())
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("symq").join("config.toml"))
    }
}
