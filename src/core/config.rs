use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

pub const CMC_API_KEY_ENV: &str = "CMC_API_KEY";
pub const COINGECKO_API_KEY_ENV: &str = "COINGECKO_API_KEY";
pub const COINGECKO_DEMO_API_KEY_ENV: &str = "COINGECKO_DEMO_API_KEY";

fn default_timeout_secs() -> u64 {
    10
}

fn default_broker_timeout_secs() -> u64 {
    5
}

fn default_cmc_base_url() -> String {
    "https://pro-api.coinmarketcap.com".to_string()
}

fn default_coingecko_base_url() -> String {
    "https://api.coingecko.com".to_string()
}

fn default_coingecko_pro_base_url() -> String {
    "https://pro-api.coingecko.com".to_string()
}

fn default_broker_base_url() -> String {
    "https://worldtimeapi.org".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CoinMarketCapConfig {
    #[serde(default = "default_cmc_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for CoinMarketCapConfig {
    fn default() -> Self {
        CoinMarketCapConfig {
            base_url: default_cmc_base_url(),
            api_key: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CoinGeckoConfig {
    /// Public and demo-tier endpoint.
    #[serde(default = "default_coingecko_base_url")]
    pub base_url: String,
    #[serde(default = "default_coingecko_pro_base_url")]
    pub pro_base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub demo_api_key: Option<String>,
}

impl Default for CoinGeckoConfig {
    fn default() -> Self {
        CoinGeckoConfig {
            base_url: default_coingecko_base_url(),
            pro_base_url: default_coingecko_pro_base_url(),
            api_key: None,
            demo_api_key: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    /// Per-provider request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub coinmarketcap: CoinMarketCapConfig,
    #[serde(default)]
    pub coingecko: CoinGeckoConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            timeout_secs: default_timeout_secs(),
            coinmarketcap: CoinMarketCapConfig::default(),
            coingecko: CoinGeckoConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BrokerConfig {
    #[serde(default = "default_broker_base_url")]
    pub base_url: String,
    #[serde(default = "default_broker_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        BrokerConfig {
            base_url: default_broker_base_url(),
            timeout_secs: default_broker_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub broker: BrokerConfig,
    pub data_path: Option<String>,
}

impl AppConfig {
    /// Loads the config at `path`, or the default location. A missing default file yields
    /// the built-in defaults. Credentials from the environment are applied last.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::load_from_path(path)?,
            None => {
                let default_path = Self::default_config_path()?;
                if default_path.exists() {
                    Self::load_from_path(&default_path)?
                } else {
                    debug!("No config at {}, using defaults", default_path.display());
                    Self::default()
                }
            }
        };
        Ok(config.with_env_overrides(|key| std::env::var(key).ok()))
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "coinpayroll", "coinpayroll")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("io", "coinpayroll", "coinpayroll")
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

    /// Replaces provider keys with non-blank values returned by `lookup`.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(key) = read(CMC_API_KEY_ENV) {
            self.providers.coinmarketcap.api_key = Some(key);
        }
        if let Some(key) = read(COINGECKO_API_KEY_ENV) {
            self.providers.coingecko.api_key = Some(key);
        }
        if let Some(key) = read(COINGECKO_DEMO_API_KEY_ENV) {
            self.providers.coingecko.demo_api_key = Some(key);
        }
        self
    }
}
