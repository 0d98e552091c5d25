//! # Configuration
//!
//! Settings are read from a TOML file whose path comes from the
//! `SMOOTHIE_CONFIG` environment variable (default `smoothie.toml`).
//! Every key is optional:
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1:8501"
//! title = "Smoothie Builder"
//!
//! [store]
//! path = "smoothies.db"
//! role = "SYSADMIN"
//! warehouse = "COMPUTE_WH"
//! catalog_table = "FRUIT_OPTIONS"
//! orders_table = "ORDERS"
//! create_schema = false
//! insert_mode = "bound"
//!
//! [catalog]
//! ttl_secs = 600
//! max_ingredients = 5
//! ```
//!
//! The store credentials are opaque to the rest of the service; they are
//! handed to the gateway untouched and never logged.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::order::InsertMode;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "SMOOTHIE_CONFIG";

/// File consulted when [`CONFIG_ENV`] is unset.
pub const DEFAULT_CONFIG_FILE: &str = "smoothie.toml";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind: String,
    pub title: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8501".to_string(),
            title: "Smoothie Builder".to_string(),
        }
    }
}

/// Connection target and credentials for the backing store.
#[derive(Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Database file, or `:memory:`.
    pub path: String,
    pub account: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub warehouse: Option<String>,
    pub schema: Option<String>,
    pub catalog_table: String,
    pub orders_table: String,
    /// Create both tables when missing. Also allows creating the file.
    pub create_schema: bool,
    pub insert_mode: InsertMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: "smoothies.db".to_string(),
            account: None,
            user: None,
            password: None,
            role: None,
            warehouse: None,
            schema: None,
            catalog_table: "FRUIT_OPTIONS".to_string(),
            orders_table: "ORDERS".to_string(),
            create_schema: false,
            insert_mode: InsertMode::default(),
        }
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("path", &self.path)
            .field("account", &self.account)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("role", &self.role)
            .field("warehouse", &self.warehouse)
            .field("schema", &self.schema)
            .field("catalog_table", &self.catalog_table)
            .field("orders_table", &self.orders_table)
            .field("create_schema", &self.create_schema)
            .field("insert_mode", &self.insert_mode)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    pub ttl_secs: u64,
    pub max_ingredients: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 600,
            max_ingredients: 5,
        }
    }
}

impl CatalogConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl AppConfig {
    /// Loads the file named by [`CONFIG_ENV`], or [`DEFAULT_CONFIG_FILE`].
    ///
    /// An explicitly named file must exist; a missing default file yields
    /// the built-in defaults.
    pub fn load() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_path(Path::new(&path)),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::from_path(path)
                } else {
                    info!("No config file found, using defaults");
                    let config = Self::default();
                    config.validate()?;
                    Ok(config)
                }
            }
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&raw)?;
        info!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        debug!(?config, "Parsed config");
        Ok(config)
    }

    /// Checks values that are interpolated into SQL or bound to limits.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, table) in [
            ("store.catalog_table", &self.store.catalog_table),
            ("store.orders_table", &self.store.orders_table),
        ] {
            if !is_table_name(table) {
                return Err(ConfigError::Invalid(format!("{key} is not a table name: {table:?}")));
            }
        }
        if self.catalog.max_ingredients == 0 {
            return Err(ConfigError::Invalid("catalog.max_ingredients must be at least 1".into()));
        }
        if self.store.path.trim().is_empty() {
            return Err(ConfigError::Invalid("store.path must not be empty".into()));
        }
        Ok(())
    }
}

/// Dot-qualified identifier made of ASCII letters, digits and underscores.
fn is_table_name(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|part| {
            !part.is_empty()
                && !part.starts_with(|c: char| c.is_ascii_digit())
                && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}
