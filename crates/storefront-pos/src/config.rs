//! # Terminal Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                            │
//! │     STOREFRONT_TAX_BPS=500                                              │
//! │     STOREFRONT_DATA_DIR=/var/lib/storefront                             │
//! │                                                                         │
//! │  2. TOML Config File                                                    │
//! │     ~/.config/storefront-pos/pos.toml (Linux)                           │
//! │     ~/Library/Application Support/com.storefront.pos/pos.toml (macOS)   │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                    │
//! │     18% GST, 20 held sales, platform data directory                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # pos.toml
//! [store]
//! name = "Koramangala Counter"
//!
//! [pricing]
//! tax_rate_bps = 1800
//!
//! [held_sales]
//! capacity = 20
//!
//! [storage]
//! data_dir = "/var/lib/storefront"
//! database_file = "storefront.db"
//!
//! [realtime]
//! channel_capacity = 64
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use storefront_core::{TaxRate, DEFAULT_HELD_SALES_CAPACITY, DEFAULT_TAX_RATE_BPS};
use storefront_db::DbConfig;

use crate::error::{PosError, PosResult};

// =============================================================================
// Store
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Display name of the store.
    #[serde(default = "default_store_name")]
    pub name: String,
}

fn default_store_name() -> String {
    "Storefront".to_string()
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            name: default_store_name(),
        }
    }
}

// =============================================================================
// Pricing
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingSettings {
    /// GST in basis points (1800 = 18%).
    #[serde(default = "default_tax_rate_bps")]
    pub tax_rate_bps: u32,
}

fn default_tax_rate_bps() -> u32 {
    DEFAULT_TAX_RATE_BPS
}

impl Default for PricingSettings {
    fn default() -> Self {
        PricingSettings {
            tax_rate_bps: default_tax_rate_bps(),
        }
    }
}

// =============================================================================
// Held Sales
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeldSalesSettings {
    /// Oldest held sales beyond this are dropped.
    #[serde(default = "default_held_capacity")]
    pub capacity: usize,
}

fn default_held_capacity() -> usize {
    DEFAULT_HELD_SALES_CAPACITY
}

impl Default for HeldSalesSettings {
    fn default() -> Self {
        HeldSalesSettings {
            capacity: default_held_capacity(),
        }
    }
}

// =============================================================================
// Storage
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Root for the database and device key/value files.
    /// `None` uses the platform data directory.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    #[serde(default = "default_database_file")]
    pub database_file: String,
}

fn default_database_file() -> String {
    "storefront.db".to_string()
}

impl Default for StorageSettings {
    fn default() -> Self {
        StorageSettings {
            data_dir: None,
            database_file: default_database_file(),
        }
    }
}

// =============================================================================
// Realtime
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealtimeSettings {
    /// Events buffered per subscriber before it starts lagging.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_channel_capacity() -> usize {
    64
}

impl Default for RealtimeSettings {
    fn default() -> Self {
        RealtimeSettings {
            channel_capacity: default_channel_capacity(),
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PosConfig {
    #[serde(default)]
    pub store: StoreSettings,

    #[serde(default)]
    pub pricing: PricingSettings,

    #[serde(default)]
    pub held_sales: HeldSalesSettings,

    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub realtime: RealtimeSettings,
}

impl PosConfig {
    /// Loads defaults, then the config file, then environment overrides.
    pub fn load(config_path: Option<PathBuf>) -> PosResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading terminal config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load terminal config: {}. Using defaults.", e);
            Self::default()
        })
    }

    pub fn save(&self, config_path: Option<PathBuf>) -> PosResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| PosError::InvalidConfig("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Terminal config saved");
        Ok(())
    }

    pub fn validate(&self) -> PosResult<()> {
        if self.pricing.tax_rate_bps > 10_000 {
            return Err(PosError::InvalidConfig(format!(
                "tax_rate_bps must be at most 10000, got {}",
                self.pricing.tax_rate_bps
            )));
        }

        if self.held_sales.capacity == 0 {
            return Err(PosError::InvalidConfig(
                "held_sales.capacity must be greater than 0".into(),
            ));
        }

        if self.realtime.channel_capacity == 0 {
            return Err(PosError::InvalidConfig(
                "realtime.channel_capacity must be greater than 0".into(),
            ));
        }

        if self.storage.database_file.trim().is_empty() {
            return Err(PosError::InvalidConfig(
                "storage.database_file must not be empty".into(),
            ));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(name) = lookup("STOREFRONT_STORE_NAME") {
            self.store.name = name;
        }

        if let Some(bps) = lookup("STOREFRONT_TAX_BPS") {
            match bps.parse::<u32>() {
                Ok(bps) => {
                    debug!(bps, "Overriding tax rate from environment");
                    self.pricing.tax_rate_bps = bps;
                }
                Err(_) => warn!(value = %bps, "Ignoring non-numeric STOREFRONT_TAX_BPS"),
            }
        }

        if let Some(capacity) = lookup("STOREFRONT_HELD_CAPACITY") {
            if let Ok(c) = capacity.parse::<usize>() {
                self.held_sales.capacity = c;
            }
        }

        if let Some(dir) = lookup("STOREFRONT_DATA_DIR") {
            debug!(dir = %dir, "Overriding data directory from environment");
            self.storage.data_dir = Some(PathBuf::from(dir));
        }

        if let Some(file) = lookup("STOREFRONT_DATABASE_FILE") {
            self.storage.database_file = file;
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "storefront", "pos")
            .map(|dirs| dirs.config_dir().join("pos.toml"))
    }

    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.pricing.tax_rate_bps)
    }

    /// The configured data directory, else the platform one, else `./data`.
    pub fn data_dir(&self) -> PathBuf {
        self.storage
            .data_dir
            .clone()
            .or_else(|| {
                directories::ProjectDirs::from("com", "storefront", "pos")
                    .map(|dirs| dirs.data_dir().to_path_buf())
            })
            .unwrap_or_else(|| PathBuf::from("./data"))
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir().join(&self.storage.database_file)
    }

    /// Directory for the device key/value files.
    pub fn device_store_dir(&self) -> PathBuf {
        self.data_dir().join("device")
    }

    /// Creates the data directory and returns a pool config for it.
    pub fn db_config(&self) -> PosResult<DbConfig> {
        std::fs::create_dir_all(self.data_dir())?;
        Ok(DbConfig::new(self.database_path()))
    }
}
