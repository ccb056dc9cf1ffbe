//! Configuration infrastructure
//!
//! Application settings are kept in a single JSON file in the user config
//! directory and organized in four sections:
//! 1. `search` - collection budget, timeouts and delays
//! 2. `http` - HTTP session settings
//! 3. `logging` - log level, outputs and retention
//! 4. `sites` - the allow-list of searchable sites and their selectors

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{info, warn};

use super::http_client::HttpClientConfig;
use super::parsing::SiteSelectors;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub http: HttpClientConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Sites a request may target; the first one is the default
    #[serde(default = "default_sites")]
    pub sites: Vec<SiteProfile>,
}

/// Collection budget and timing for one search
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Soft cap on collected items per request
    pub max_items: usize,

    /// Maximum result pages visited per request
    pub max_pages: usize,

    /// Size of the cheapest-records summary
    pub top_n: usize,

    /// How long a locator waits for an element to show up
    pub locator_timeout_ms: u64,

    /// Interval between document probes while waiting
    pub poll_interval_ms: u64,

    /// Pause after an interaction that reloads results
    pub settle_delay_ms: u64,
}

impl SearchConfig {
    pub fn locator_timeout(&self) -> Duration {
        Duration::from_millis(self.locator_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted logs
    pub json_format: bool,

    /// Enable console output (stderr)
    pub console_output: bool,

    /// Enable file output
    pub file_output: bool,

    /// Log file name inside the log directory
    pub file_name: String,

    /// Number of log files to keep (older files will be deleted)
    pub max_files: u32,

    /// Enable automatic log cleanup on startup
    pub auto_cleanup_logs: bool,

    /// Module-specific log level filters (e.g., "reqwest": "warn")
    pub module_filters: HashMap<String, String>,
}

/// A searchable site and how to drive it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteProfile {
    pub name: String,
    pub start_url: String,
    pub currency_symbol: String,

    /// Visible text of the category to pick before searching
    pub category_option: String,

    /// Value of the sort option applied to results
    pub sort_option_value: String,

    #[serde(default)]
    pub selectors: SiteSelectors,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            search: SearchConfig::default(),
            http: HttpClientConfig::default(),
            logging: LoggingConfig::default(),
            sites: default_sites(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_items: defaults::MAX_ITEMS,
            max_pages: defaults::MAX_PAGES,
            top_n: defaults::TOP_N,
            locator_timeout_ms: defaults::LOCATOR_TIMEOUT_MS,
            poll_interval_ms: defaults::POLL_INTERVAL_MS,
            settle_delay_ms: defaults::SETTLE_DELAY_MS,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: defaults::LOG_JSON_FORMAT,
            console_output: defaults::LOG_CONSOLE_OUTPUT,
            file_output: defaults::LOG_FILE_OUTPUT,
            file_name: defaults::LOG_FILE_NAME.to_string(),
            max_files: defaults::LOG_MAX_FILES,
            auto_cleanup_logs: defaults::LOG_AUTO_CLEANUP,
            module_filters: HashMap::from([
                ("reqwest".to_string(), "warn".to_string()),
                ("hyper".to_string(), "warn".to_string()),
                ("html5ever".to_string(), "warn".to_string()),
            ]),
        }
    }
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            name: defaults::SITE_NAME.to_string(),
            start_url: defaults::SITE_START_URL.to_string(),
            currency_symbol: defaults::CURRENCY_SYMBOL.to_string(),
            category_option: defaults::CATEGORY_OPTION.to_string(),
            sort_option_value: defaults::SORT_OPTION_VALUE.to_string(),
            selectors: SiteSelectors::default(),
        }
    }
}

fn default_sites() -> Vec<SiteProfile> {
    vec![SiteProfile::default()]
}

impl AppConfig {
    /// Names of the sites a request may target
    pub fn allowed_sites(&self) -> Vec<&str> {
        self.sites.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn site(&self, name: &str) -> Option<&SiteProfile> {
        self.sites.iter().find(|s| s.name == name)
    }

    pub fn default_site(&self) -> Option<&SiteProfile> {
        self.sites.first()
    }
}

/// Configuration manager for loading and saving settings
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Get the application configuration directory
    pub fn get_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get user config directory")?
            .join(defaults::APP_DIR_NAME);

        Ok(config_dir)
    }

    /// Configuration manager for the default location
    pub fn new() -> Result<Self> {
        let config_dir = Self::get_config_dir()?;
        Ok(Self::with_path(config_dir.join(defaults::CONFIG_FILE_NAME)))
    }

    /// Configuration manager for an explicit file
    pub fn with_path(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    /// Load configuration from file, creating default if it doesn't exist
    pub async fn load_config(&self) -> Result<AppConfig> {
        if !self.config_path.exists() {
            info!("Configuration file not found, creating default: {:?}", self.config_path);
            let default_config = AppConfig::default();
            self.save_config(&default_config).await?;
            return Ok(default_config);
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .context("Failed to read configuration file")?;

        match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => {
                info!("Loaded configuration from: {:?}", self.config_path);
                Ok(config)
            }
            Err(parse_error) => {
                warn!("Configuration file does not parse: {}", parse_error);
                warn!("Resetting to default configuration");

                let backup_path = self.config_path.with_extension("json.corrupted");
                if let Err(e) = fs::copy(&self.config_path, &backup_path).await {
                    warn!("Failed to create backup of corrupted config: {}", e);
                } else {
                    info!("Backed up corrupted config to: {:?}", backup_path);
                }

                let default_config = AppConfig::default();
                self.save_config(&default_config)
                    .await
                    .context("Failed to save default configuration")?;
                Ok(default_config)
            }
        }
    }

    /// Save configuration to file
    pub async fn save_config(&self, config: &AppConfig) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create config directory")?;
        }

        let content =
            serde_json::to_string_pretty(config).context("Failed to serialize configuration")?;

        fs::write(&self.config_path, content)
            .await
            .context("Failed to write configuration file")?;

        info!("Saved configuration to: {:?}", self.config_path);
        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}

/// Default configuration values
pub mod defaults {
    pub const APP_DIR_NAME: &str = "book-price-finder";
    pub const CONFIG_FILE_NAME: &str = "book_price_finder_config.json";

    /// Soft cap on collected items per request
    pub const MAX_ITEMS: usize = 30;

    /// Result pages visited per request
    pub const MAX_PAGES: usize = 3;

    /// Cheapest records listed in the summary
    pub const TOP_N: usize = 3;

    pub const LOCATOR_TIMEOUT_MS: u64 = 10_000;
    pub const POLL_INTERVAL_MS: u64 = 250;
    pub const SETTLE_DELAY_MS: u64 = 2_000;

    pub const SITE_NAME: &str = "amazon.in";
    pub const SITE_START_URL: &str = "https://www.amazon.in/";
    pub const CURRENCY_SYMBOL: &str = "₹";
    pub const CATEGORY_OPTION: &str = "Books";

    /// "Avg. Customer Review"
    pub const SORT_OPTION_VALUE: &str = "review-rank";

    // Log configuration defaults
    pub const LOG_LEVEL: &str = "info";
    pub const LOG_JSON_FORMAT: bool = false;
    pub const LOG_CONSOLE_OUTPUT: bool = true;
    pub const LOG_FILE_OUTPUT: bool = true;
    pub const LOG_FILE_NAME: &str = "book-price-finder.log";
    pub const LOG_MAX_FILES: u32 = 5;
    pub const LOG_AUTO_CLEANUP: bool = true;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_first_load_writes_defaults() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(dir.path().join("nested").join("config.json"));

        let config = manager.load_config().await.unwrap();
        assert_eq!(config.search.max_items, 30);
        assert_eq!(config.search.max_pages, 3);
        assert_eq!(config.allowed_sites(), vec!["amazon.in"]);
        assert!(manager.config_path().exists());
    }

    #[tokio::test]
    async fn test_partial_file_fills_missing_sections() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "search": { "max_pages": 5 } }"#).unwrap();

        let config = ConfigManager::with_path(&path).load_config().await.unwrap();
        assert_eq!(config.search.max_pages, 5);
        assert_eq!(config.search.top_n, 3);
        assert_eq!(config.sites.len(), 1);
        assert_eq!(config.logging.level, "info");
    }

    #[tokio::test]
    async fn test_corrupted_file_is_backed_up_and_reset() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let config = ConfigManager::with_path(&path).load_config().await.unwrap();
        assert_eq!(config.search.max_items, 30);
        assert!(path.with_extension("json.corrupted").exists());

        let rewritten = std::fs::read_to_string(&path).unwrap();
        assert!(serde_json::from_str::<AppConfig>(&rewritten).is_ok());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(dir.path().join("config.json"));

        let mut config = AppConfig::default();
        config.search.settle_delay_ms = 0;
        config.sites[0].currency_symbol = "$".to_string();
        manager.save_config(&config).await.unwrap();

        let loaded = manager.load_config().await.unwrap();
        assert_eq!(loaded.search.settle_delay(), Duration::ZERO);
        assert_eq!(loaded.site("amazon.in").unwrap().currency_symbol, "$");
    }
}
