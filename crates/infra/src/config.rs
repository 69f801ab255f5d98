//! Application configuration.
//!
//! Sources, lowest precedence first:
//! 1. built-in defaults
//! 2. `shelflife.toml` in the working directory (optional), or an explicit file
//! 3. `SHELFLIFE_*` environment variables, `__` separating nested keys
//!    (`SHELFLIFE_ALERTS__LOW_STOCK_AT=5`)

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use shelflife_inventory::{AlertThresholds, stock};
use shelflife_observability::LogSettings;

pub const DEFAULT_CONFIG_FILE: &str = "shelflife";
pub const DEFAULT_DATA_FILE: &str = "shelflife.json";
const ENV_PREFIX: &str = "SHELFLIFE";

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct ShelflifeConfig {
    pub store: StoreSettings,
    pub alerts: AlertSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Path of the JSON inventory file.
    pub data_file: PathBuf,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AlertSettings {
    pub expiring_within_days: i64,
    pub low_stock_at: u64,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            expiring_within_days: stock::DEFAULT_EXPIRING_WITHIN_DAYS,
            low_stock_at: stock::DEFAULT_LOW_STOCK_AT,
        }
    }
}

impl AlertSettings {
    pub fn thresholds(&self) -> AlertThresholds {
        AlertThresholds {
            expiring_within_days: self.expiring_within_days,
            low_stock_at: self.low_stock_at,
        }
    }
}

impl ShelflifeConfig {
    /// Load from `shelflife.toml` (if present) and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load with an explicit config file, which then must exist.
    pub fn load_from(file: Option<&Path>) -> Result<Self, ConfigError> {
        Self::build(file, env_source())
    }

    fn build(file: Option<&Path>, env: Environment) -> Result<Self, ConfigError> {
        let file_source = match file {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings: ShelflifeConfig = Config::builder()
            .add_source(file_source)
            .add_source(env)
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.alerts.expiring_within_days < 0 {
            return Err(ConfigError::Message(format!(
                "alerts.expiring_within_days must not be negative (got {})",
                self.alerts.expiring_within_days
            )));
        }
        if self.store.data_file.as_os_str().is_empty() {
            return Err(ConfigError::Message("store.data_file must not be empty".to_string()));
        }
        Ok(())
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}
