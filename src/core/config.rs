use crate::core::address::Address;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

fn default_minimum_contribution() -> u64 {
    50
}

fn default_yahoo_base_url() -> String {
    "https://query1.finance.yahoo.com".to_string()
}

fn default_yahoo_symbol() -> String {
    "ETH-USD".to_string()
}

/// Where the ledger reads its exchange rate from.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PriceFeedConfig {
    /// Local development feed with a fixed answer.
    Mock { decimals: u8, answer: i64 },
    Http { base_url: String, pair: String },
    Yahoo {
        #[serde(default = "default_yahoo_base_url")]
        base_url: String,
        #[serde(default = "default_yahoo_symbol")]
        symbol: String,
    },
}

impl Default for PriceFeedConfig {
    fn default() -> Self {
        PriceFeedConfig::Mock {
            decimals: 8,
            answer: 2000_00000000,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub owner: Address,
    /// Whole reference-currency units a single contribution must be worth.
    #[serde(default = "default_minimum_contribution")]
    pub minimum_contribution: u64,
    pub max_rate_age_secs: Option<u64>,
    #[serde(default)]
    pub price_feed: PriceFeedConfig,
    pub data_path: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("org", "fundme", "fundme")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("org", "fundme", "fundme")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
