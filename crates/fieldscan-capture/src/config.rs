//! # Application Configuration
//!
//! Configuration for scanning, enrichment and storage.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     FIELDSCAN_DB_PATH=/data/fieldscan.db                               │
//! │     FIELDSCAN_LOOKUP_ENABLED=false                                     │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/fieldscan/fieldscan.toml (Linux)                         │
//! │     ~/Library/Application Support/com.fieldscan.fieldscan/… (macOS)    │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     multi-scan on, 150 codes, no timeout, Open Food Facts lookup       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [scanner]
//! camera = "rear"
//! enable_multi_scan = true
//! max_multi_scan_count = 150
//! multi_scan_timeout_ms = 0
//!
//! [enrichment]
//! enabled = true
//! base_url = "https://world.openfoodfacts.org"
//! timeout_secs = 10
//!
//! [storage]
//! database_path = "/var/lib/fieldscan/fieldscan.db"
//!
//! [context]
//! store_id = "S1"
//! event_id = "E1"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};
use url::Url;

use fieldscan_core::{ScanConfig, ScanContext, DEFAULT_MAX_MULTI_SCAN_COUNT};

use crate::camera::DEFAULT_CAMERA;
use crate::error::{ConfigError, ConfigResult};
use crate::lookup::DEFAULT_LOOKUP_URL;

const CONFIG_FILE_NAME: &str = "fieldscan.toml";
const DATABASE_FILE_NAME: &str = "fieldscan.db";

// =============================================================================
// Scanner Settings
// =============================================================================

/// Defaults for new scan sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerSettings {
    /// Camera device name.
    #[serde(default = "default_camera")]
    pub camera: String,

    #[serde(default = "default_true")]
    pub enable_multi_scan: bool,

    #[serde(default = "default_max_scan_count")]
    pub max_multi_scan_count: usize,

    /// 0 = no timeout.
    #[serde(default)]
    pub multi_scan_timeout_ms: u64,
}

fn default_camera() -> String {
    DEFAULT_CAMERA.to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_scan_count() -> usize {
    DEFAULT_MAX_MULTI_SCAN_COUNT
}

impl Default for ScannerSettings {
    fn default() -> Self {
        ScannerSettings {
            camera: default_camera(),
            enable_multi_scan: true,
            max_multi_scan_count: default_max_scan_count(),
            multi_scan_timeout_ms: 0,
        }
    }
}

impl ScannerSettings {
    /// Session configuration built from these settings.
    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            enable_multi_scan: self.enable_multi_scan,
            max_multi_scan_count: self.max_multi_scan_count,
            multi_scan_timeout_ms: self.multi_scan_timeout_ms,
        }
    }
}

// =============================================================================
// Enrichment Settings
// =============================================================================

/// Product lookup settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Root of an Open Food Facts-compatible service.
    #[serde(default = "default_lookup_url")]
    pub base_url: String,

    /// Per-request timeout (seconds).
    #[serde(default = "default_lookup_timeout")]
    pub timeout_secs: u64,
}

fn default_lookup_url() -> String {
    DEFAULT_LOOKUP_URL.to_string()
}

fn default_lookup_timeout() -> u64 {
    10
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        EnrichmentSettings {
            enabled: true,
            base_url: default_lookup_url(),
            timeout_secs: default_lookup_timeout(),
        }
    }
}

// =============================================================================
// Storage & Context Settings
// =============================================================================

/// Local storage settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageSettings {
    /// SQLite file. Defaults to the platform data directory.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
}

/// Store and event used when a command does not name one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextSettings {
    #[serde(default)]
    pub store_id: Option<String>,

    #[serde(default)]
    pub event_id: Option<String>,
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete FieldScan configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub scanner: ScannerSettings,

    #[serde(default)]
    pub enrichment: EnrichmentSettings,

    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub context: ContextSettings,
}

impl AppConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (fieldscan.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
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

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ConfigResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or(ConfigError::NoConfigPath)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        self.scanner
            .scan_config()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if self.scanner.camera.trim().is_empty() {
            return Err(ConfigError::Invalid("scanner.camera must not be empty".into()));
        }

        if self.enrichment.enabled {
            Url::parse(&self.enrichment.base_url).map_err(|e| {
                ConfigError::Invalid(format!(
                    "enrichment.base_url '{}': {}",
                    self.enrichment.base_url, e
                ))
            })?;

            if self.enrichment.timeout_secs == 0 {
                return Err(ConfigError::Invalid(
                    "enrichment.timeout_secs must be greater than 0".into(),
                ));
            }
        }

        if let (Some(store), Some(event)) = (&self.context.store_id, &self.context.event_id) {
            ScanContext::new(store, event).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(path) = var("FIELDSCAN_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.storage.database_path = Some(PathBuf::from(path));
        }

        if let Some(url) = var("FIELDSCAN_LOOKUP_URL") {
            debug!(url = %url, "Overriding lookup URL from environment");
            self.enrichment.base_url = url;
        }

        if let Some(value) = var("FIELDSCAN_LOOKUP_ENABLED") {
            match parse_flag(&value) {
                Some(enabled) => self.enrichment.enabled = enabled,
                None => warn!(value = %value, "Ignoring FIELDSCAN_LOOKUP_ENABLED"),
            }
        }

        if let Some(value) = var("FIELDSCAN_MULTI_SCAN") {
            match parse_flag(&value) {
                Some(enabled) => self.scanner.enable_multi_scan = enabled,
                None => warn!(value = %value, "Ignoring FIELDSCAN_MULTI_SCAN"),
            }
        }

        if let Some(value) = var("FIELDSCAN_MAX_SCAN_COUNT") {
            match value.parse() {
                Ok(count) => self.scanner.max_multi_scan_count = count,
                Err(_) => warn!(value = %value, "Ignoring FIELDSCAN_MAX_SCAN_COUNT"),
            }
        }

        if let Some(value) = var("FIELDSCAN_SCAN_TIMEOUT_MS") {
            match value.parse() {
                Ok(ms) => self.scanner.multi_scan_timeout_ms = ms,
                Err(_) => warn!(value = %value, "Ignoring FIELDSCAN_SCAN_TIMEOUT_MS"),
            }
        }

        if let Some(id) = var("FIELDSCAN_STORE_ID") {
            self.context.store_id = Some(id);
        }

        if let Some(id) = var("FIELDSCAN_EVENT_ID") {
            self.context.event_id = Some(id);
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// SQLite file to open.
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .or_else(|| project_dirs().map(|dirs| dirs.data_dir().join(DATABASE_FILE_NAME)))
            .unwrap_or_else(|| PathBuf::from(DATABASE_FILE_NAME))
    }

    /// Session configuration for new scans.
    pub fn scan_config(&self) -> ScanConfig {
        self.scanner.scan_config()
    }

    /// The configured default context, if both ids are set.
    pub fn default_context(&self) -> Option<ScanContext> {
        let store = self.context.store_id.as_deref()?;
        let event = self.context.event_id.as_deref()?;
        ScanContext::new(store, event).ok()
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "fieldscan", "fieldscan")
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
